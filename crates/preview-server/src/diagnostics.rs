// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shell commands behind the history and status pages.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::render::HistoryEntry;

/// Host overview shown on the admin page. Globs need a shell.
pub const STATUS_SCRIPT: &str = "df -h .; echo; free -h; echo; \
	ls -ld servers/*/ common/*/*/; echo; \
	tail -n 100 servers/*/*log puppeteer.log; echo; \
	ps axf -o pid,start,args";

#[derive(Debug, Error)]
pub enum CommandError {
	#[error("failed to run {program} in {dir}: {source}")]
	Spawn {
		program: &'static str,
		dir: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{program} exited with {status}: {stderr}")]
	Exit {
		program: &'static str,
		status: ExitStatus,
		stderr: String,
	},
}

/// Commits of the checkout in `dir`, newest first.
pub async fn git_history(dir: &Path) -> Result<Vec<HistoryEntry>, CommandError> {
	let output = Command::new("git")
		.args(["log", "--pretty=format:%h %ad %s", "--date=short"])
		.current_dir(dir)
		.output()
		.await
		.map_err(|source| CommandError::Spawn {
			program: "git",
			dir: dir.to_path_buf(),
			source,
		})?;

	if !output.status.success() {
		return Err(CommandError::Exit {
			program: "git",
			status: output.status,
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		});
	}

	let stdout = String::from_utf8_lossy(&output.stdout);
	let entries: Vec<HistoryEntry> = stdout
		.lines()
		.filter(|line| !line.is_empty())
		.filter_map(HistoryEntry::parse)
		.collect();

	debug!(commits = entries.len(), "Read git history");
	Ok(entries)
}

/// Output of [`STATUS_SCRIPT`] run in `base_dir`.
///
/// Parts of the script routinely fail (missing globs, no `free` on the host),
/// so only a failure to start the shell is an error.
pub async fn server_status(base_dir: &Path) -> Result<String, CommandError> {
	let output = Command::new("sh")
		.args(["-c", STATUS_SCRIPT])
		.current_dir(base_dir)
		.output()
		.await
		.map_err(|source| CommandError::Spawn {
			program: "sh",
			dir: base_dir.to_path_buf(),
			source,
		})?;

	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
