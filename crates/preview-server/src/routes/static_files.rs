// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static assets, the starter page and the fallback.

use std::io::ErrorKind;
use std::path::{Component, Path as FsPath};

use axum::{
	extract::{Path, State},
	http::{header, StatusCode},
	response::{Html, IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::api::AppState;
use crate::error::ServerError;

pub const NOT_FOUND_BODY: &str =
	"404 Not Found - if this is supposed to work, report on our Discord server";

const STARTER_PAGE: &str = "server-starter.htm";

pub fn content_type(path: &FsPath) -> &'static str {
	match path.extension().and_then(|ext| ext.to_str()) {
		Some("js") => "application/javascript",
		Some("css") => "text/css",
		Some("htm") | Some("html") => "text/html",
		Some("png") => "image/png",
		Some("svg") => "image/svg+xml",
		Some("json") => "application/json",
		Some("webm") => "video/webm",
		_ => "text/plain",
	}
}

/// Only plain relative paths stay inside the static directory.
fn is_contained(path: &FsPath) -> bool {
	path.components().count() > 0
		&& path
			.components()
			.all(|component| matches!(component, Component::Normal(_)))
}

/// GET /static/{*path}
#[instrument(skip(state))]
pub async fn static_file(
	State(state): State<AppState>,
	Path(path): Path<String>,
) -> Result<Response, ServerError> {
	let relative = FsPath::new(&path);
	if !is_contained(relative) {
		debug!("Rejected static path");
		return Ok(not_found_response());
	}

	let full = state.config.paths.static_dir.join(relative);
	match tokio::fs::read(&full).await {
		Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(relative))], bytes).into_response()),
		Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
			Ok(not_found_response())
		}
		Err(source) => Err(ServerError::Io { path: full, source }),
	}
}

/// GET /502 - served by the reverse proxy while an environment starts.
#[instrument(skip(state))]
pub async fn starter_page(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
	let path = state.config.paths.base_dir.join(STARTER_PAGE);
	match tokio::fs::read_to_string(&path).await {
		Ok(page) => Ok(Html(page)),
		Err(source) => {
			state
				.alerter
				.error(format!("Reading {} failed: {source}", path.display()));
			Err(ServerError::Io { path, source })
		}
	}
}

pub fn not_found_response() -> Response {
	(
		StatusCode::NOT_FOUND,
		[(header::CONTENT_TYPE, "text/plain")],
		NOT_FOUND_BODY,
	)
		.into_response()
}

/// Fallback for every unmatched path.
pub async fn not_found() -> Response {
	not_found_response()
}
