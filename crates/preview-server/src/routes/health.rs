// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use preview_server_jobs::{HealthState, JobHealthStatus};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: HealthState,
	pub timestamp: String,
	pub version: &'static str,
	pub notifier: &'static str,
	pub jobs: Vec<JobHealthStatus>,
}

/// GET /health - background job health.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let (status, jobs) = match state.scheduler.as_ref() {
		Some(scheduler) => {
			let health = scheduler.health_status();
			(health.status, health.jobs)
		}
		None => (HealthState::Healthy, Vec::new()),
	};

	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		version: env!("CARGO_PKG_VERSION"),
		notifier: state.alerter.notifier_name(),
		jobs,
	};

	let http_status = match status {
		HealthState::Healthy | HealthState::Degraded => StatusCode::OK,
		HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}
