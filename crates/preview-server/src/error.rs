// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};

use crate::diagnostics::CommandError;
use crate::environment::StoreError;

pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Request body was well-formed HTTP but not a usable payload.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Not found")]
	NotFound,

	#[error("Environment store error: {0}")]
	Store(#[from] StoreError),

	#[error("Command error: {0}")]
	Command(#[from] CommandError),

	#[error("I/O error on {path}: {source}")]
	Io {
		path: std::path::PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self {
			ServerError::BadRequest(message) => (
				StatusCode::BAD_REQUEST,
				[(header::CONTENT_TYPE, "text/plain")],
				message,
			)
				.into_response(),
			ServerError::NotFound => StatusCode::NOT_FOUND.into_response(),
			other => {
				tracing::error!(error = %other, "request failed");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					[(header::CONTENT_TYPE, "text/plain")],
					INTERNAL_ERROR_BODY,
				)
					.into_response()
			}
		}
	}
}
