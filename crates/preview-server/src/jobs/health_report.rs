// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use preview_incident_core::{tail_lines, DetailStore, Extractor, IncidentCounts};
use preview_server_jobs::{Job, JobContext, JobError, JobOutput};
use preview_server_notify::{Alerter, Notification};
use tracing::{info, instrument};

use crate::environment::{EnvKey, EnvironmentStore};

pub const HEALTH_ALERT_TITLE: &str = "Error Alert";

/// Counts incidents in the tail of the MAIN server log and alerts when any
/// are present. The same incidents are reported again on every run until
/// they scroll out of the window.
pub struct HealthReportJob {
	store: Arc<dyn EnvironmentStore>,
	details: Arc<dyn DetailStore>,
	extractor: Extractor,
	alerter: Alerter,
	tail: usize,
}

impl HealthReportJob {
	pub fn new(
		store: Arc<dyn EnvironmentStore>,
		details: Arc<dyn DetailStore>,
		extractor: Extractor,
		alerter: Alerter,
		tail: usize,
	) -> Self {
		Self {
			store,
			details,
			extractor,
			alerter,
			tail,
		}
	}
}

pub fn summary(counts: &IncidentCounts) -> String {
	format!(
		"Errors detected on {}:\n{} client errors\n{} runtime crashes",
		EnvKey::Main,
		counts.client_errors,
		counts.runtime_crashes
	)
}

#[async_trait]
impl Job for HealthReportJob {
	fn id(&self) -> &str {
		"health-report"
	}

	fn name(&self) -> &str {
		"Health Report"
	}

	fn description(&self) -> &str {
		"Alert on client errors and crashes in the main deployment log"
	}

	#[instrument(skip(self, ctx), fields(job_id = "health-report"))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let log = match self.store.read_server_log(EnvKey::Main).await {
			Ok(log) => log,
			Err(e) => {
				self.alerter.error(format!("Health report could not read the MAIN log: {e}"));
				return Err(JobError::failed(e.to_string()));
			}
		};

		let extractor = self.extractor.clone();
		let details = Arc::clone(&self.details);
		let tail = self.tail;
		let counts = tokio::task::spawn_blocking(move || {
			let incidents = extractor.extract(tail_lines(&log, tail), details.as_ref());
			IncidentCounts::from_incidents(&incidents)
		})
		.await
		.map_err(|e| JobError::failed(format!("extraction task failed: {e}")))?;

		info!(
			client_errors = counts.client_errors,
			runtime_crashes = counts.runtime_crashes,
			"Health report completed"
		);

		if !counts.is_empty() {
			self.alerter
				.notify(Notification::high(HEALTH_ALERT_TITLE, summary(&counts)));
		}

		Ok(JobOutput {
			message: format!(
				"{} client errors, {} runtime crashes",
				counts.client_errors, counts.runtime_crashes
			),
			metadata: Some(serde_json::json!({
				"client_errors": counts.client_errors,
				"runtime_crashes": counts.runtime_crashes,
			})),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::environment::StoreError;
	use preview_incident_core::MemoryDetailStore;
	use preview_server_jobs::{CancellationToken, TriggerSource};
	use preview_server_notify::{MemoryNotifier, Priority};
	use std::path::PathBuf;
	use std::time::SystemTime;

	struct LogOnlyStore(Option<String>);

	#[async_trait]
	impl EnvironmentStore for LogOnlyStore {
		async fn list_environment_dirs(&self) -> Result<Vec<String>, StoreError> {
			Ok(Vec::new())
		}

		async fn last_activity(&self, _key: EnvKey) -> Result<SystemTime, StoreError> {
			Ok(SystemTime::now())
		}

		async fn read_state(&self, _key: EnvKey) -> Result<String, StoreError> {
			Ok(String::new())
		}

		async fn read_server_log(&self, _key: EnvKey) -> Result<String, StoreError> {
			self.0.clone().ok_or_else(|| StoreError::Io {
				path: PathBuf::from("servers/MAIN/server.log"),
				source: std::io::Error::from(std::io::ErrorKind::NotFound),
			})
		}
	}

	fn context() -> JobContext {
		JobContext {
			run_id: "run-1".to_string(),
			triggered_by: TriggerSource::Schedule,
			cancellation_token: CancellationToken::new(),
		}
	}

	fn job(log: Option<&str>, tail: usize) -> (HealthReportJob, Arc<MemoryNotifier>) {
		let mut details = MemoryDetailStore::new();
		details.insert("abc", r#"{"message":"boom","error":"TypeError"}"#);
		let memory = Arc::new(MemoryNotifier::new());
		let job = HealthReportJob::new(
			Arc::new(LogOnlyStore(log.map(str::to_string))),
			Arc::new(details),
			Extractor::default(),
			Alerter::new(memory.clone(), "Preview Controller Error"),
			tail,
		);
		(job, memory)
	}

	async fn settle() {
		for _ in 0..5 {
			tokio::task::yield_now().await;
		}
	}

	const LOG: &str = "2024-01-01T00:00:00.000Z server started\n\
		2024-01-01T00:00:01.000Z ERROR: Client error abc: boom\n\
		2024-01-01T00:00:02.000Z request\n\
		Error: exploded\n\
		    at run (file:///srv/MAIN/server.mjs:1:1)\n\
		2024-01-01T00:00:03.000Z recovered\n";

	#[tokio::test]
	async fn test_alerts_with_counts() {
		let (job, memory) = job(Some(LOG), 1000);

		let output = job.run(&context()).await.unwrap();
		settle().await;

		assert_eq!(output.metadata.unwrap()["client_errors"], 1);
		let sent = memory.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].title, HEALTH_ALERT_TITLE);
		assert_eq!(sent[0].priority, Priority::High);
		assert_eq!(
			sent[0].message,
			"Errors detected on MAIN:\n1 client errors\n1 runtime crashes"
		);
	}

	#[tokio::test]
	async fn test_quiet_log_sends_nothing() {
		let (job, memory) = job(Some("2024-01-01T00:00:00.000Z all good\n"), 1000);

		job.run(&context()).await.unwrap();
		settle().await;

		assert!(memory.sent().is_empty());
	}

	#[tokio::test]
	async fn test_only_tail_is_scanned() {
		let (job, memory) = job(Some(LOG), 1);

		job.run(&context()).await.unwrap();
		settle().await;

		assert!(memory.sent().is_empty());
	}

	#[tokio::test]
	async fn test_unreadable_log_fails_and_alerts() {
		let (job, memory) = job(None, 1000);

		let result = job.run(&context()).await;
		settle().await;

		assert!(matches!(result, Err(JobError::Failed { .. })));
		assert_eq!(memory.sent()[0].title, "Preview Controller Error");
	}
}
