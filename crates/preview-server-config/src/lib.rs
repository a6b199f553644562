// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the preview controller.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`PREVIEW_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use preview_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info, warn};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub paths: PathsConfig,
	pub github: GithubConfig,
	pub deploy: DeployConfig,
	pub notify: NotifyConfig,
	pub jobs: JobsConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PREVIEW_SERVER_*`)
/// 2. Config file (`/etc/preview/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let paths = layer.paths.unwrap_or_default().finalize();
	let github = layer.github.unwrap_or_default().finalize();
	let deploy = layer.deploy.unwrap_or_default().finalize();
	let notify = layer.notify.unwrap_or_default().finalize();
	let jobs = layer.jobs.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&http, &deploy, &jobs)?;

	if github.webhook_secret.is_none() {
		warn!("no webhook secret configured; every webhook delivery will be rejected");
	}

	info!(
		host = %http.host,
		port = http.port,
		route_prefix = %http.route_prefix,
		base_dir = %paths.base_dir.display(),
		webhook_secret_configured = github.webhook_secret.is_some(),
		ntfy_configured = notify.ntfy_url.is_some(),
		idle_reaper_enabled = jobs.idle_reaper_enabled,
		health_report_enabled = jobs.health_report_enabled,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		paths,
		github,
		deploy,
		notify,
		jobs,
		logging,
	})
}

/// Validate cross-field configuration rules.
/// Routes the admin pages must not shadow.
const RESERVED_PATHS: [&str; 7] = [
	"/webhook", "/start", "/state", "/history", "/static", "/502", "/health",
];

fn validate_config(
	http: &HttpConfig,
	deploy: &DeployConfig,
	jobs: &JobsConfig,
) -> Result<(), ConfigError> {
	if !deploy.admin_path.starts_with('/') || deploy.admin_path == "/" {
		return Err(ConfigError::Validation(format!(
			"PREVIEW_SERVER_ADMIN_PATH must be a non-root path starting with '/', got '{}'",
			deploy.admin_path
		)));
	}

	if RESERVED_PATHS.contains(&deploy.admin_path.as_str()) {
		return Err(ConfigError::Validation(format!(
			"PREVIEW_SERVER_ADMIN_PATH '{}' collides with a built-in route",
			deploy.admin_path
		)));
	}

	if !http.route_prefix.is_empty() && !http.route_prefix.starts_with('/') {
		return Err(ConfigError::Validation(format!(
			"PREVIEW_SERVER_ROUTE_PREFIX must start with '/', got '{}'",
			http.route_prefix
		)));
	}

	if jobs.idle_reaper_enabled && jobs.idle_reaper_interval_secs == 0 {
		return Err(ConfigError::InvalidValue {
			key: "PREVIEW_SERVER_IDLE_REAPER_INTERVAL_SECS".to_string(),
			message: "interval must be greater than zero".to_string(),
		});
	}

	if jobs.health_report_enabled && jobs.health_report_interval_secs == 0 {
		return Err(ConfigError::InvalidValue {
			key: "PREVIEW_SERVER_HEALTH_REPORT_INTERVAL_SECS".to_string(),
			message: "interval must be greater than zero".to_string(),
		});
	}

	Ok(())
}
