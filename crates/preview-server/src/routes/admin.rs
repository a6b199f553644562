// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator pages under the configured admin path.

use std::sync::Arc;

use axum::{
	extract::State,
	http::header,
	response::{Html, IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::api::AppState;
use crate::diagnostics::server_status;
use crate::environment::EnvKey;
use crate::error::ServerError;
use crate::render::{render_incidents, render_status};

/// GET {prefix}{admin_path} - host and process overview.
#[instrument(skip(state))]
pub async fn status_page(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
	match server_status(&state.config.paths.base_dir).await {
		Ok(output) => Ok(Html(render_status(&output))),
		Err(e) => {
			state.alerter.error(format!("Collecting server status failed: {e}"));
			Err(e.into())
		}
	}
}

/// GET {prefix}{admin_path}/errors - incidents in the full MAIN log.
#[instrument(skip(state))]
pub async fn errors_page(State(state): State<AppState>) -> Result<Response, ServerError> {
	let log = match state.store.read_server_log(EnvKey::Main).await {
		Ok(log) => log,
		Err(e) => {
			state.alerter.error(format!("Reading the MAIN log failed: {e}"));
			return Err(e.into());
		}
	};

	let extractor = state.extractor.clone();
	let details = Arc::clone(&state.details);
	let incidents = tokio::task::spawn_blocking(move || extractor.extract(&log, details.as_ref()))
		.await
		.map_err(|e| ServerError::Io {
			path: state.router.layout().server_log(EnvKey::Main),
			source: std::io::Error::other(e),
		})?;

	info!(incidents = incidents.len(), "Rendered incident list");
	Ok((
		[(header::CONTENT_TYPE, "text/html; charset=utf-8")],
		render_incidents(&incidents),
	)
		.into_response())
}
