// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use preview_common_secret::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DeployConfigLayer, GithubConfigLayer, HttpConfigLayer, JobsConfigLayer, LoggingConfigLayer,
	NotifyConfigLayer, PathsConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/preview/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PREVIEW_SERVER_<FIELD>. Secrets also accept `<NAME>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			paths: Some(load_paths_from_env()),
			github: Some(load_github_from_env()?),
			deploy: Some(load_deploy_from_env()),
			notify: Some(load_notify_from_env()?),
			jobs: Some(load_jobs_from_env()?),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("PREVIEW_SERVER_HOST"),
		port: env_u16("PREVIEW_SERVER_PORT")?,
		route_prefix: env_var("PREVIEW_SERVER_ROUTE_PREFIX"),
	})
}

fn load_paths_from_env() -> PathsConfigLayer {
	PathsConfigLayer {
		base_dir: env_var("PREVIEW_SERVER_BASE_DIR").map(PathBuf::from),
		servers_dir: env_var("PREVIEW_SERVER_SERVERS_DIR").map(PathBuf::from),
		save_dir: env_var("PREVIEW_SERVER_SAVE_DIR").map(PathBuf::from),
		static_dir: env_var("PREVIEW_SERVER_STATIC_DIR").map(PathBuf::from),
		scripts_dir: env_var("PREVIEW_SERVER_SCRIPTS_DIR").map(PathBuf::from),
	}
}

fn load_github_from_env() -> Result<GithubConfigLayer, ConfigError> {
	Ok(GithubConfigLayer {
		webhook_secret: load_secret_env("PREVIEW_SERVER_GITHUB_WEBHOOK_SECRET")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
		token: load_secret_env("PREVIEW_SERVER_GITHUB_TOKEN")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
	})
}

fn load_deploy_from_env() -> DeployConfigLayer {
	DeployConfigLayer {
		template_path: env_var("PREVIEW_SERVER_TEMPLATE_PATH"),
		admin_path: env_var("PREVIEW_SERVER_ADMIN_PATH"),
		main_site_url: env_var("PREVIEW_SERVER_MAIN_SITE_URL"),
		preview_base_url: env_var("PREVIEW_SERVER_PREVIEW_BASE_URL"),
		project_root_marker: env_var("PREVIEW_SERVER_PROJECT_ROOT_MARKER"),
	}
}

fn load_notify_from_env() -> Result<NotifyConfigLayer, ConfigError> {
	Ok(NotifyConfigLayer {
		ntfy_url: env_var("PREVIEW_SERVER_NTFY_URL"),
		title: env_var("PREVIEW_SERVER_NTFY_TITLE"),
		timeout_secs: env_u64("PREVIEW_SERVER_NTFY_TIMEOUT_SECS")?,
	})
}

fn load_jobs_from_env() -> Result<JobsConfigLayer, ConfigError> {
	Ok(JobsConfigLayer {
		idle_reaper_enabled: env_bool("PREVIEW_SERVER_IDLE_REAPER_ENABLED"),
		idle_reaper_interval_secs: env_u64("PREVIEW_SERVER_IDLE_REAPER_INTERVAL_SECS")?,
		idle_threshold_secs: env_u64("PREVIEW_SERVER_IDLE_THRESHOLD_SECS")?,
		health_report_enabled: env_bool("PREVIEW_SERVER_HEALTH_REPORT_ENABLED"),
		health_report_interval_secs: env_u64("PREVIEW_SERVER_HEALTH_REPORT_INTERVAL_SECS")?,
		health_tail_lines: env_usize("PREVIEW_SERVER_HEALTH_TAIL_LINES")?,
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("PREVIEW_SERVER_LOG_LEVEL"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.github.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[notify]\nntfy_url = \"https://ntfy.example/topic\"").unwrap();
		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.notify.unwrap().ntfy_url.as_deref(),
			Some("https://ntfy.example/topic")
		);
	}

	#[test]
	fn test_toml_source_invalid_file_is_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = ").unwrap();
		let result = TomlSource::new(file.path()).load();
		assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
	}

	#[test]
	fn test_env_u64_rejects_garbage() {
		let var = "PREVIEW_SERVER_TEST_U64_GARBAGE_5521";
		std::env::set_var(var, "five minutes");
		let result = env_u64(var);
		std::env::remove_var(var);
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_env_bool_accepts_one_and_true() {
		let var = "PREVIEW_SERVER_TEST_BOOL_5521";
		std::env::set_var(var, "1");
		assert_eq!(env_bool(var), Some(true));
		std::env::set_var(var, "TRUE");
		assert_eq!(env_bool(var), Some(true));
		std::env::set_var(var, "no");
		assert_eq!(env_bool(var), Some(false));
		std::env::remove_var(var);
		assert_eq!(env_bool(var), None);
	}
}
