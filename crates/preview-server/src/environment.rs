// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Preview environments as they exist on disk.
//!
//! Nothing about an environment is held in memory between requests. Its
//! directory, logs and state file under the servers directory are re-read on
//! every access.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

const MAIN_KEY: &str = "MAIN";
const PR_PREFIX: &str = "PR-";

/// `MAIN` or `PR-<number>`.
///
/// Keys are canonical: the directory name is exactly what `Display` writes,
/// so `PR-007` is not a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnvKey {
	Main,
	Pr(u64),
}

impl fmt::Display for EnvKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EnvKey::Main => f.write_str(MAIN_KEY),
			EnvKey::Pr(number) => write!(f, "{PR_PREFIX}{number}"),
		}
	}
}

impl FromStr for EnvKey {
	type Err = StoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == MAIN_KEY {
			return Ok(EnvKey::Main);
		}
		s.strip_prefix(PR_PREFIX)
			.and_then(parse_pr_number)
			.map(EnvKey::Pr)
			.ok_or_else(|| StoreError::InvalidKey(s.to_string()))
	}
}

/// Parses the digits of a PR key. Leading zeros are rejected so the number
/// always formats back to the same digits.
pub fn parse_pr_number(digits: &str) -> Option<u64> {
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	if digits.len() > 1 && digits.starts_with('0') {
		return None;
	}
	digits.parse().ok()
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("not an environment key: {0}")]
	InvalidKey(String),

	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Paths of everything belonging to an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLayout {
	servers_dir: PathBuf,
	save_dir: PathBuf,
}

impl EnvironmentLayout {
	pub fn new(servers_dir: impl Into<PathBuf>, save_dir: impl Into<PathBuf>) -> Self {
		Self {
			servers_dir: servers_dir.into(),
			save_dir: save_dir.into(),
		}
	}

	pub fn servers_dir(&self) -> &Path {
		&self.servers_dir
	}

	pub fn env_dir(&self, key: EnvKey) -> PathBuf {
		self.servers_dir.join(key.to_string())
	}

	pub fn server_log(&self, key: EnvKey) -> PathBuf {
		self.env_dir(key).join("server.log")
	}

	pub fn state_file(&self, key: EnvKey) -> PathBuf {
		self.env_dir(key).join("state.json")
	}

	/// Output of the lifecycle scripts, next to the environment directory.
	pub fn lifecycle_log(&self, key: EnvKey) -> PathBuf {
		self.servers_dir.join(format!("{key}.log"))
	}

	/// Saved client error reports of the main deployment.
	pub fn error_details_dir(&self) -> PathBuf {
		self.save_dir.join(MAIN_KEY).join("errors")
	}
}

/// Read access to the environment tree.
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
	/// Names of all entries in the servers directory that are directories.
	async fn list_environment_dirs(&self) -> Result<Vec<String>, StoreError>;

	/// Modification time of the environment's server log.
	async fn last_activity(&self, key: EnvKey) -> Result<SystemTime, StoreError>;

	/// Contents of `state.json`, trimmed.
	async fn read_state(&self, key: EnvKey) -> Result<String, StoreError>;

	async fn read_server_log(&self, key: EnvKey) -> Result<String, StoreError>;
}

pub struct FsEnvironmentStore {
	layout: EnvironmentLayout,
}

impl FsEnvironmentStore {
	pub fn new(layout: EnvironmentLayout) -> Self {
		Self { layout }
	}
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
	move |source| StoreError::Io {
		path: path.to_path_buf(),
		source,
	}
}

#[async_trait]
impl EnvironmentStore for FsEnvironmentStore {
	async fn list_environment_dirs(&self) -> Result<Vec<String>, StoreError> {
		let dir = self.layout.servers_dir();
		let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error(dir))?;
		let mut names = Vec::new();

		while let Some(entry) = entries.next_entry().await.map_err(io_error(dir))? {
			let is_dir = entry
				.file_type()
				.await
				.map(|t| t.is_dir())
				.unwrap_or(false);
			if !is_dir {
				continue;
			}
			if let Some(name) = entry.file_name().to_str() {
				names.push(name.to_string());
			}
		}

		names.sort();
		Ok(names)
	}

	async fn last_activity(&self, key: EnvKey) -> Result<SystemTime, StoreError> {
		let path = self.layout.server_log(key);
		let metadata = tokio::fs::metadata(&path).await.map_err(io_error(&path))?;
		metadata.modified().map_err(io_error(&path))
	}

	async fn read_state(&self, key: EnvKey) -> Result<String, StoreError> {
		let path = self.layout.state_file(key);
		let content = tokio::fs::read_to_string(&path)
			.await
			.map_err(io_error(&path))?;
		Ok(content.trim().to_string())
	}

	async fn read_server_log(&self, key: EnvKey) -> Result<String, StoreError> {
		let path = self.layout.server_log(key);
		tokio::fs::read_to_string(&path)
			.await
			.map_err(io_error(&path))
	}
}

/// Source of the current time.
pub trait Clock: Send + Sync {
	fn now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> SystemTime {
		SystemTime::now()
	}
}
