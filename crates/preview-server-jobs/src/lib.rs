// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job scheduler for the preview controller.
//!
//! Periodic jobs (the idle reaper and the error health report) run on their
//! own interval tasks. Every run is recorded in a bounded in-memory history
//! that feeds the `/health` endpoint. Failed runs are not retried; the next
//! tick re-derives everything from disk.

pub mod context;
pub mod error;
pub mod health;
pub mod history;
pub mod job;
pub mod scheduler;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use history::RunHistory;
pub use job::Job;
pub use scheduler::JobScheduler;
pub use types::{JobOutput, JobRun, JobStatus, JobType, TriggerSource};
