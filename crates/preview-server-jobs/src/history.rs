// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded in-memory record of job runs.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use parking_lot::Mutex;

use crate::types::{JobRun, JobStatus};

const DEFAULT_RUNS_PER_JOB: usize = 50;

/// Keeps the most recent runs of each job, newest at the back.
pub struct RunHistory {
	runs: Mutex<HashMap<String, VecDeque<JobRun>>>,
	capacity: usize,
}

impl RunHistory {
	pub fn new() -> Self {
		Self::with_capacity(DEFAULT_RUNS_PER_JOB)
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			runs: Mutex::new(HashMap::new()),
			capacity: capacity.max(1),
		}
	}

	pub fn record_start(&self, run: JobRun) {
		let mut runs = self.runs.lock();
		let entries = runs.entry(run.job_id.clone()).or_default();
		if entries.len() == self.capacity {
			entries.pop_front();
		}
		entries.push_back(run);
	}

	pub fn record_complete(
		&self,
		job_id: &str,
		run_id: &str,
		status: JobStatus,
		error_message: Option<String>,
		metadata: Option<serde_json::Value>,
	) {
		let mut runs = self.runs.lock();
		let Some(entries) = runs.get_mut(job_id) else {
			return;
		};
		if let Some(run) = entries.iter_mut().rev().find(|r| r.id == run_id) {
			let now = Utc::now();
			run.status = status;
			run.completed_at = Some(now);
			run.duration_ms = Some((now - run.started_at).num_milliseconds());
			run.error_message = error_message;
			run.metadata = metadata;
		}
	}

	pub fn last_run(&self, job_id: &str) -> Option<JobRun> {
		self.runs.lock().get(job_id).and_then(|r| r.back().cloned())
	}

	/// Failed runs since the most recent run that did not fail.
	pub fn consecutive_failures(&self, job_id: &str) -> u32 {
		self.runs
			.lock()
			.get(job_id)
			.map(|runs| {
				runs.iter()
					.rev()
					.filter(|r| r.status != JobStatus::Running)
					.take_while(|r| r.status == JobStatus::Failed)
					.count() as u32
			})
			.unwrap_or(0)
	}

	pub fn runs(&self, job_id: &str) -> Vec<JobRun> {
		self.runs
			.lock()
			.get(job_id)
			.map(|r| r.iter().cloned().collect())
			.unwrap_or_default()
	}
}

impl Default for RunHistory {
	fn default() -> Self {
		Self::new()
	}
}
