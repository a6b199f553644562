// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::api::AppState;
use crate::diagnostics::git_history;
use crate::environment::EnvKey;
use crate::error::ServerError;
use crate::render::render_history;

/// GET {prefix}/history - commit log of the main checkout.
#[instrument(skip(state))]
pub async fn commit_history(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
	let checkout = state.router.layout().env_dir(EnvKey::Main);

	match git_history(&checkout).await {
		Ok(entries) => Ok(Html(render_history(
			&entries,
			&state.config.deploy.preview_base_url,
		))),
		Err(e) => {
			state.alerter.error(format!("Reading history failed: {e}"));
			Err(e.into())
		}
	}
}
