// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runs lifecycle scripts in the background.
//!
//! A launch returns immediately. The script's stdout and stderr are appended
//! to the action's log file, and failures only surface through the
//! [`Alerter`]. Launches for the same environment wait for each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use preview_server_notify::Alerter;
use thiserror::Error;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::environment::EnvKey;
use crate::lifecycle::LifecycleAction;

#[derive(Debug, Error)]
pub enum LaunchError {
	#[error("failed to open log {path}: {source}")]
	Log {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to spawn {program}: {source}")]
	Spawn {
		program: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed waiting for {program}: {source}")]
	Wait {
		program: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{program} exited with {status}")]
	Exit { program: PathBuf, status: ExitStatus },

	#[error("{program} did not finish within {timeout:?}")]
	TimedOut { program: PathBuf, timeout: Duration },

	#[error("{program} was cancelled")]
	Cancelled { program: PathBuf },

	#[error("launch task failed: {0}")]
	Join(#[source] tokio::task::JoinError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
	/// `None` waits for the script however long it runs.
	pub timeout: Option<Duration>,
}

/// A running launch. Dropping the handle does not stop the script.
pub struct LaunchHandle {
	cancel: CancellationToken,
	join: JoinHandle<Result<ExitStatus, LaunchError>>,
}

impl LaunchHandle {
	pub fn new(cancel: CancellationToken, join: JoinHandle<Result<ExitStatus, LaunchError>>) -> Self {
		Self { cancel, join }
	}

	/// Kill the script if it is still running.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub async fn wait(self) -> Result<ExitStatus, LaunchError> {
		self.join.await.map_err(LaunchError::Join)?
	}
}

pub trait Launcher: Send + Sync {
	fn launch(&self, action: LifecycleAction, options: LaunchOptions) -> LaunchHandle;
}

type KeyLocks = HashMap<EnvKey, Arc<tokio::sync::Mutex<()>>>;

pub struct ScriptLauncher {
	scripts_dir: PathBuf,
	alerter: Alerter,
	locks: Arc<parking_lot::Mutex<KeyLocks>>,
}

impl ScriptLauncher {
	pub fn new(scripts_dir: impl Into<PathBuf>, alerter: Alerter) -> Self {
		Self {
			scripts_dir: scripts_dir.into(),
			alerter,
			locks: Arc::new(parking_lot::Mutex::new(HashMap::new())),
		}
	}

	fn lock_for(&self, key: EnvKey) -> Arc<tokio::sync::Mutex<()>> {
		Arc::clone(self.locks.lock().entry(key).or_default())
	}
}

/// Drops the key's lock once no launch holds or waits on it.
fn release_lock(
	locks: &parking_lot::Mutex<KeyLocks>,
	key: EnvKey,
	lock: Arc<tokio::sync::Mutex<()>>,
) {
	drop(lock);
	let mut locks = locks.lock();
	if locks.get(&key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
		locks.remove(&key);
	}
}

impl Launcher for ScriptLauncher {
	fn launch(&self, action: LifecycleAction, options: LaunchOptions) -> LaunchHandle {
		let cancel = CancellationToken::new();
		let program = action.program(&self.scripts_dir);
		let lock = self.lock_for(action.key);
		let locks = Arc::clone(&self.locks);
		let alerter = self.alerter.clone();
		let token = cancel.clone();

		info!(
			key = %action.key,
			script = %action.script,
			log = %action.log_path.display(),
			"Launching lifecycle script"
		);

		let join = tokio::spawn(async move {
			let result = {
				let _guard = lock.lock().await;
				run_script(&program, &action, &options, &token).await
			};
			release_lock(&locks, action.key, lock);
			if let Err(e) = &result {
				alerter.error(format!("{} for {}: {e}", action.script, action.key));
			}
			result
		});

		LaunchHandle::new(cancel, join)
	}
}

enum Outcome {
	Exited(std::io::Result<ExitStatus>),
	Cancelled,
	TimedOut,
}

#[instrument(skip(action, options, cancel), fields(key = %action.key, script = %action.script))]
async fn run_script(
	program: &Path,
	action: &LifecycleAction,
	options: &LaunchOptions,
	cancel: &CancellationToken,
) -> Result<ExitStatus, LaunchError> {
	let (stdout, stderr) = open_log(&action.log_path).await?;

	let mut child = Command::new(program)
		.args(action.args.iter().map(|arg| arg.expose()))
		.stdin(Stdio::null())
		.stdout(stdout)
		.stderr(stderr)
		.kill_on_drop(false)
		.spawn()
		.map_err(|source| LaunchError::Spawn {
			program: program.to_path_buf(),
			source,
		})?;

	let timeout = async {
		match options.timeout {
			Some(timeout) => tokio::time::sleep(timeout).await,
			None => std::future::pending().await,
		}
	};

	let outcome = tokio::select! {
		status = child.wait() => Outcome::Exited(status),
		_ = cancel.cancelled() => Outcome::Cancelled,
		_ = timeout => Outcome::TimedOut,
	};

	let status = match outcome {
		Outcome::Exited(status) => status.map_err(|source| LaunchError::Wait {
			program: program.to_path_buf(),
			source,
		})?,
		Outcome::Cancelled => {
			kill(&mut child).await;
			return Err(LaunchError::Cancelled {
				program: program.to_path_buf(),
			});
		}
		Outcome::TimedOut => {
			kill(&mut child).await;
			return Err(LaunchError::TimedOut {
				program: program.to_path_buf(),
				timeout: options.timeout.unwrap_or_default(),
			});
		}
	};

	if !status.success() {
		return Err(LaunchError::Exit {
			program: program.to_path_buf(),
			status,
		});
	}

	info!(%status, "Lifecycle script finished");
	Ok(status)
}

async fn kill(child: &mut tokio::process::Child) {
	if let Err(e) = child.kill().await {
		warn!(error = %e, "Failed to kill lifecycle script");
	}
}

async fn open_log(path: &Path) -> Result<(Stdio, Stdio), LaunchError> {
	let log_error = |source: std::io::Error| LaunchError::Log {
		path: path.to_path_buf(),
		source,
	};

	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await.map_err(log_error)?;
	}
	let file = tokio::fs::OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.await
		.map_err(log_error)?
		.into_std()
		.await;
	let stderr = file.try_clone().map_err(log_error)?;

	Ok((Stdio::from(file), Stdio::from(stderr)))
}
