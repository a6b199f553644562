// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::{
	routing::{get, post},
	Router,
};
use preview_incident_core::{DetailStore, ExtractOptions, Extractor, FsDetailStore};
use preview_server_config::{NotifyConfig, ServerConfig};
use preview_server_jobs::JobScheduler;
use preview_server_notify::{Alerter, LogNotifier, Notifier, NotifyError, NtfyNotifier};

use crate::environment::{EnvironmentStore, FsEnvironmentStore};
use crate::launcher::{LaunchOptions, Launcher, ScriptLauncher};
use crate::lifecycle::LifecycleRouter;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
	pub config: Arc<ServerConfig>,
	pub router: Arc<LifecycleRouter>,
	pub launcher: Arc<dyn Launcher>,
	pub launch_options: LaunchOptions,
	pub store: Arc<dyn EnvironmentStore>,
	pub details: Arc<dyn DetailStore>,
	pub extractor: Extractor,
	pub alerter: Alerter,
	pub scheduler: Option<Arc<JobScheduler>>,
}

impl AppState {
	/// Filesystem-backed state with a caller-supplied launcher.
	pub fn with_launcher(config: ServerConfig, launcher: Arc<dyn Launcher>, alerter: Alerter) -> Self {
		let router = LifecycleRouter::from_config(&config);
		let store = FsEnvironmentStore::new(router.layout().clone());
		let details = FsDetailStore::new(router.layout().error_details_dir());
		let extractor = Extractor::new(ExtractOptions {
			project_root_marker: config.deploy.project_root_marker.clone(),
		});

		Self {
			config: Arc::new(config),
			router: Arc::new(router),
			launcher,
			launch_options: LaunchOptions::default(),
			store: Arc::new(store),
			details: Arc::new(details),
			extractor,
			alerter,
			scheduler: None,
		}
	}
}

/// State for the running server: lifecycle scripts are executed from the
/// configured scripts directory.
pub fn create_app_state(config: ServerConfig, alerter: Alerter) -> AppState {
	let launcher = ScriptLauncher::new(&config.paths.scripts_dir, alerter.clone());
	AppState::with_launcher(config, Arc::new(launcher), alerter)
}

/// Alerts go to ntfy when a URL is configured and to the log otherwise.
pub fn create_alerter(config: &NotifyConfig) -> Result<Alerter, NotifyError> {
	let notifier: Arc<dyn Notifier> = match config.ntfy_url.as_deref() {
		Some(url) => Arc::new(NtfyNotifier::new(
			url,
			Duration::from_secs(config.timeout_secs),
		)?),
		None => Arc::new(LogNotifier),
	};
	Ok(Alerter::new(notifier, config.title.clone()))
}

pub fn create_router(state: AppState) -> Router {
	let prefix = state.config.http.route_prefix.clone();
	let admin = format!("{prefix}{}", state.config.deploy.admin_path);

	Router::new()
		.route(
			&format!("{prefix}/webhook"),
			post(routes::webhook::receive_webhook),
		)
		.route(
			&format!("{prefix}/start"),
			post(routes::manual::start_environment),
		)
		.route(
			&format!("{prefix}/state"),
			post(routes::manual::environment_state),
		)
		.route(
			&format!("{prefix}/history"),
			get(routes::history::commit_history),
		)
		.route(&admin, get(routes::admin::status_page))
		.route(&format!("{admin}/errors"), get(routes::admin::errors_page))
		.route("/static/{*path}", get(routes::static_files::static_file))
		.route("/502", get(routes::static_files::starter_page))
		.route("/health", get(routes::health::health_check))
		.fallback(routes::static_files::not_found)
		.with_state(state)
}
