// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use preview_server_jobs::{Job, JobContext, JobError, JobOutput};
use preview_server_notify::Alerter;
use tracing::{debug, info, instrument};

use crate::environment::{Clock, EnvKey, EnvironmentStore};
use crate::launcher::{LaunchOptions, Launcher};
use crate::lifecycle::LifecycleRouter;

/// Stops PR environments whose server log has not been written to for
/// longer than the threshold.
pub struct IdleReaperJob {
	store: Arc<dyn EnvironmentStore>,
	clock: Arc<dyn Clock>,
	launcher: Arc<dyn Launcher>,
	router: Arc<LifecycleRouter>,
	alerter: Alerter,
	threshold: Duration,
	launch_options: LaunchOptions,
}

impl IdleReaperJob {
	pub fn new(
		store: Arc<dyn EnvironmentStore>,
		clock: Arc<dyn Clock>,
		launcher: Arc<dyn Launcher>,
		router: Arc<LifecycleRouter>,
		alerter: Alerter,
		threshold: Duration,
	) -> Self {
		Self {
			store,
			clock,
			launcher,
			router,
			alerter,
			threshold,
			launch_options: LaunchOptions::default(),
		}
	}

	pub fn with_launch_options(mut self, options: LaunchOptions) -> Self {
		self.launch_options = options;
		self
	}
}

#[async_trait]
impl Job for IdleReaperJob {
	fn id(&self) -> &str {
		"idle-reaper"
	}

	fn name(&self) -> &str {
		"Idle Reaper"
	}

	fn description(&self) -> &str {
		"Stop PR preview environments with no recent server log activity"
	}

	#[instrument(skip(self, ctx), fields(job_id = "idle-reaper"))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let dirs = match self.store.list_environment_dirs().await {
			Ok(dirs) => dirs,
			Err(e) => {
				self.alerter.error(format!("Idle reaper could not list environments: {e}"));
				return Err(JobError::failed(e.to_string()));
			}
		};

		let now = self.clock.now();
		let mut scanned = 0usize;
		let mut stopped = Vec::new();
		let mut errors = 0usize;

		for dir in dirs {
			let Ok(EnvKey::Pr(number)) = dir.parse::<EnvKey>() else {
				continue;
			};
			scanned += 1;

			let last_activity = match self.store.last_activity(EnvKey::Pr(number)).await {
				Ok(time) => time,
				Err(e) => {
					errors += 1;
					self.alerter.error(format!("Idle reaper could not check {dir}: {e}"));
					continue;
				}
			};

			// A modification time in the future counts as active.
			let idle = now.duration_since(last_activity).unwrap_or_default();
			if idle <= self.threshold {
				debug!(env = %dir, idle_secs = idle.as_secs(), "Environment is active");
				continue;
			}

			info!(
				env = %dir,
				idle_secs = idle.as_secs(),
				"Stopping idle environment"
			);
			self.launcher
				.launch(self.router.pr_stop(number), self.launch_options.clone());
			stopped.push(number);
		}

		info!(scanned, stopped = stopped.len(), errors, "Idle reaper completed");
		Ok(JobOutput {
			message: format!("Stopped {} of {scanned} PR environments", stopped.len()),
			metadata: Some(serde_json::json!({
				"scanned": scanned,
				"stopped": stopped,
				"errors": errors,
			})),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::environment::{EnvironmentLayout, FsEnvironmentStore, StoreError};
	use crate::launcher::LaunchHandle;
	use crate::lifecycle::{LifecycleAction, Script};
	use parking_lot::Mutex;
	use preview_server_config::ServerConfig;
	use preview_server_jobs::{CancellationToken, TriggerSource};
	use preview_server_notify::MemoryNotifier;
	use std::collections::HashMap;
	use std::path::PathBuf;
	use std::time::SystemTime;

	const NOW_SECS: u64 = 1_700_000_000;

	struct FixedClock(SystemTime);

	impl Clock for FixedClock {
		fn now(&self) -> SystemTime {
			self.0
		}
	}

	#[derive(Default)]
	struct FakeStore {
		dirs: Vec<String>,
		activity: HashMap<EnvKey, SystemTime>,
	}

	#[async_trait]
	impl EnvironmentStore for FakeStore {
		async fn list_environment_dirs(&self) -> Result<Vec<String>, StoreError> {
			Ok(self.dirs.clone())
		}

		async fn last_activity(&self, key: EnvKey) -> Result<SystemTime, StoreError> {
			self.activity.get(&key).copied().ok_or_else(|| StoreError::Io {
				path: PathBuf::from(format!("servers/{key}/server.log")),
				source: std::io::Error::from(std::io::ErrorKind::NotFound),
			})
		}

		async fn read_state(&self, _key: EnvKey) -> Result<String, StoreError> {
			unreachable!()
		}

		async fn read_server_log(&self, _key: EnvKey) -> Result<String, StoreError> {
			unreachable!()
		}
	}

	#[derive(Default)]
	struct RecordingLauncher {
		actions: Mutex<Vec<LifecycleAction>>,
	}

	impl Launcher for RecordingLauncher {
		fn launch(&self, action: LifecycleAction, _options: LaunchOptions) -> LaunchHandle {
			self.actions.lock().push(action);
			let join = tokio::spawn(async { Ok(std::process::ExitStatus::default()) });
			LaunchHandle::new(tokio_util::sync::CancellationToken::new(), join)
		}
	}

	fn minutes_ago(minutes: u64) -> SystemTime {
		SystemTime::UNIX_EPOCH + Duration::from_secs(NOW_SECS - minutes * 60)
	}

	fn context() -> JobContext {
		JobContext {
			run_id: "run-1".to_string(),
			triggered_by: TriggerSource::Schedule,
			cancellation_token: CancellationToken::new(),
		}
	}

	fn job(store: FakeStore) -> (IdleReaperJob, Arc<RecordingLauncher>, Arc<MemoryNotifier>) {
		let launcher = Arc::new(RecordingLauncher::default());
		let memory = Arc::new(MemoryNotifier::new());
		let job = IdleReaperJob::new(
			Arc::new(store),
			Arc::new(FixedClock(SystemTime::UNIX_EPOCH + Duration::from_secs(NOW_SECS))),
			launcher.clone(),
			Arc::new(LifecycleRouter::from_config(&ServerConfig::default())),
			Alerter::new(memory.clone(), "Preview Controller Error"),
			Duration::from_secs(3600),
		);
		(job, launcher, memory)
	}

	#[tokio::test]
	async fn test_stops_only_idle_pr_environments() {
		let store = FakeStore {
			dirs: ["PR-1", "PR-2", "MAIN", "common", "PR-x", "PR-3"]
				.iter()
				.map(|d| d.to_string())
				.collect(),
			activity: HashMap::from([
				(EnvKey::Pr(1), minutes_ago(61)),
				(EnvKey::Pr(2), minutes_ago(59)),
				(EnvKey::Pr(3), minutes_ago(600)),
				(EnvKey::Main, minutes_ago(600)),
			]),
		};
		let (job, launcher, memory) = job(store);

		let output = job.run(&context()).await.unwrap();

		let actions = launcher.actions.lock();
		let stopped: Vec<EnvKey> = actions.iter().map(|a| a.key).collect();
		assert_eq!(stopped, vec![EnvKey::Pr(1), EnvKey::Pr(3)]);
		assert!(actions.iter().all(|a| a.script == Script::PrStop));
		assert_eq!(output.metadata.unwrap()["scanned"], 3);
		assert!(memory.sent().is_empty());
	}

	#[tokio::test]
	async fn test_future_mtime_is_active() {
		let store = FakeStore {
			dirs: vec!["PR-4".to_string()],
			activity: HashMap::from([(
				EnvKey::Pr(4),
				SystemTime::UNIX_EPOCH + Duration::from_secs(NOW_SECS + 60),
			)]),
		};
		let (job, launcher, _memory) = job(store);

		job.run(&context()).await.unwrap();
		assert!(launcher.actions.lock().is_empty());
	}

	#[tokio::test]
	async fn test_missing_log_is_alerted_and_skipped() {
		let store = FakeStore {
			dirs: vec!["PR-8".to_string(), "PR-9".to_string()],
			activity: HashMap::from([(EnvKey::Pr(9), minutes_ago(120))]),
		};
		let (job, launcher, memory) = job(store);

		let output = job.run(&context()).await.unwrap();
		for _ in 0..5 {
			tokio::task::yield_now().await;
		}

		assert_eq!(launcher.actions.lock().len(), 1);
		assert_eq!(output.metadata.unwrap()["errors"], 1);
		let sent = memory.sent();
		assert_eq!(sent.len(), 1);
		assert!(sent[0].message.contains("PR-8"));
	}

	#[tokio::test]
	async fn test_zero_padded_dirs_are_skipped_on_disk() {
		let dir = tempfile::tempdir().unwrap();
		let servers = dir.path().join("servers");
		for name in ["PR-007", "PR-8"] {
			std::fs::create_dir_all(servers.join(name)).unwrap();
			std::fs::write(servers.join(name).join("server.log"), "up\n").unwrap();
		}

		let launcher = Arc::new(RecordingLauncher::default());
		let memory = Arc::new(MemoryNotifier::new());
		let job = IdleReaperJob::new(
			Arc::new(FsEnvironmentStore::new(EnvironmentLayout::new(
				&servers,
				dir.path().join("save"),
			))),
			Arc::new(FixedClock(SystemTime::now() + Duration::from_secs(7200))),
			launcher.clone(),
			Arc::new(LifecycleRouter::from_config(&ServerConfig::default())),
			Alerter::new(memory.clone(), "Preview Controller Error"),
			Duration::from_secs(3600),
		);

		let output = job.run(&context()).await.unwrap();
		for _ in 0..5 {
			tokio::task::yield_now().await;
		}

		let keys: Vec<EnvKey> = launcher.actions.lock().iter().map(|a| a.key).collect();
		assert_eq!(keys, vec![EnvKey::Pr(8)]);
		let metadata = output.metadata.unwrap();
		assert_eq!(metadata["scanned"], 1);
		assert_eq!(metadata["errors"], 0);
		assert!(memory.sent().is_empty());
	}

	#[tokio::test]
	async fn test_cancelled_job_does_nothing() {
		let (job, launcher, _memory) = job(FakeStore::default());
		let ctx = context();
		ctx.cancellation_token.cancel();

		assert!(matches!(job.run(&ctx).await, Err(JobError::Cancelled)));
		assert!(launcher.actions.lock().is_empty());
	}
}
