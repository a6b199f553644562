// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub webhook receiver.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
};
use preview_common_webhook::{verify_signature_header, SIGNATURE_HEADER};
use tracing::{info, instrument, warn};

use crate::api::AppState;
use crate::error::ServerError;
use crate::lifecycle::{WebhookEvent, WebhookPayload};

const EVENT_HEADER: &str = "x-github-event";

pub const SIGNED_BODY: &str = "Request body was signed";
pub const UNSIGNED_BODY: &str = "Request body was not signed";

/// POST {prefix}/webhook
///
/// The signature is checked over the raw body before anything is parsed.
/// Unverified deliveries get a 404 so the endpoint looks absent.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn receive_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Response, ServerError> {
	let signature = headers
		.get(SIGNATURE_HEADER)
		.and_then(|value| value.to_str().ok());

	let verified = match (state.config.github.webhook_secret.as_ref(), signature) {
		(Some(secret), Some(signature)) => {
			verify_signature_header(secret.expose().as_bytes(), &body, signature)
		}
		_ => false,
	};

	if !verified {
		warn!(
			has_signature = signature.is_some(),
			"Rejected webhook with invalid signature"
		);
		return Ok((StatusCode::NOT_FOUND, UNSIGNED_BODY).into_response());
	}

	let event_type = headers
		.get(EVENT_HEADER)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default();

	let payload: WebhookPayload = serde_json::from_slice(&body)
		.map_err(|e| ServerError::BadRequest(format!("Invalid webhook payload: {e}")))?;
	let event = WebhookEvent::new(event_type, payload);

	info!(
		event = %event.event_type,
		action = event.payload.action.as_deref().unwrap_or(""),
		number = event.payload.number,
		git_ref = event.payload.git_ref.as_deref().unwrap_or(""),
		"Received webhook"
	);

	if let Some(action) = state.router.route_webhook(&event) {
		state.launcher.launch(action, state.launch_options.clone());
	}

	Ok((StatusCode::OK, SIGNED_BODY).into_response())
}
