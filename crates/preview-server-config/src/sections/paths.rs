// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem layout of the controller.
//!
//! Everything hangs off `base_dir` unless overridden:
//! - `servers/` holds one directory per environment plus `<key>.log` lifecycle logs
//! - `save/` holds per-environment saved data, including client error reports
//! - `static/` is served under `/static/`
//! - lifecycle scripts (`pr-start.sh`, ...) live directly in `base_dir`

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub base_dir: Option<PathBuf>,
	#[serde(default)]
	pub servers_dir: Option<PathBuf>,
	#[serde(default)]
	pub save_dir: Option<PathBuf>,
	#[serde(default)]
	pub static_dir: Option<PathBuf>,
	#[serde(default)]
	pub scripts_dir: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.base_dir.is_some() {
			self.base_dir = other.base_dir;
		}
		if other.servers_dir.is_some() {
			self.servers_dir = other.servers_dir;
		}
		if other.save_dir.is_some() {
			self.save_dir = other.save_dir;
		}
		if other.static_dir.is_some() {
			self.static_dir = other.static_dir;
		}
		if other.scripts_dir.is_some() {
			self.scripts_dir = other.scripts_dir;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		let base_dir = self.base_dir.unwrap_or_else(|| PathBuf::from("."));
		PathsConfig {
			servers_dir: self.servers_dir.unwrap_or_else(|| base_dir.join("servers")),
			save_dir: self.save_dir.unwrap_or_else(|| base_dir.join("save")),
			static_dir: self.static_dir.unwrap_or_else(|| base_dir.join("static")),
			scripts_dir: self.scripts_dir.unwrap_or_else(|| base_dir.clone()),
			base_dir,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
	pub base_dir: PathBuf,
	pub servers_dir: PathBuf,
	pub save_dir: PathBuf,
	pub static_dir: PathBuf,
	pub scripts_dir: PathBuf,
}

impl PathsConfig {
	/// Layout rooted at a single directory, as used by tests and simple installs.
	pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
		PathsConfigLayer {
			base_dir: Some(base_dir.into()),
			..Default::default()
		}
		.finalize()
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		PathsConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_derive_from_base_dir() {
		let config = PathsConfig::rooted_at("/srv/preview");
		assert_eq!(config.servers_dir, PathBuf::from("/srv/preview/servers"));
		assert_eq!(config.save_dir, PathBuf::from("/srv/preview/save"));
		assert_eq!(config.static_dir, PathBuf::from("/srv/preview/static"));
		assert_eq!(config.scripts_dir, PathBuf::from("/srv/preview"));
	}

	#[test]
	fn test_explicit_override_wins() {
		let config = PathsConfigLayer {
			base_dir: Some(PathBuf::from("/srv/preview")),
			servers_dir: Some(PathBuf::from("/var/lib/servers")),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.servers_dir, PathBuf::from("/var/lib/servers"));
		assert_eq!(config.save_dir, PathBuf::from("/srv/preview/save"));
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let layer: PathsConfigLayer = toml::from_str(r#"base_dir = "/opt/preview""#).unwrap();
		assert_eq!(layer.base_dir, Some(PathBuf::from("/opt/preview")));
		assert!(layer.servers_dir.is_none());
	}
}
