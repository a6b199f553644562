// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Start and state requests sent by the "environment is starting" page.

use axum::{
	body::Bytes,
	extract::State,
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
	pub url: String,
}

/// Bodies are parsed as JSON whatever their content type. The starter page
/// posts plain strings.
fn parse_request(body: &[u8]) -> Result<UrlRequest, ServerError> {
	serde_json::from_slice(body)
		.map_err(|e| ServerError::BadRequest(format!("Invalid request body: {e}")))
}

/// POST {prefix}/start
#[instrument(skip(state, body))]
pub async fn start_environment(State(state): State<AppState>, body: Bytes) -> StatusCode {
	let request = match parse_request(&body) {
		Ok(request) => request,
		Err(e) => {
			warn!(error = %e, "Ignoring start request");
			return StatusCode::OK;
		}
	};

	match state.router.route_start(&request.url) {
		Some(action) => {
			info!(key = %action.key, url = %request.url, "Manual start requested");
			state.launcher.launch(action, state.launch_options.clone());
		}
		None => info!(url = %request.url, "Start request matched no environment"),
	}
	StatusCode::OK
}

/// POST {prefix}/state
#[instrument(skip(state, body))]
pub async fn environment_state(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Response, ServerError> {
	let request = parse_request(&body)?;
	let key = state
		.router
		.classify_url(&request.url)
		.key()
		.ok_or(ServerError::NotFound)?;

	match state.store.read_state(key).await {
		Ok(content) => {
			Ok(([(header::CONTENT_TYPE, "application/json")], content).into_response())
		}
		Err(e) => {
			state.alerter.error(format!("Reading state of {key} failed: {e}"));
			Err(e.into())
		}
	}
}
