// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deployment parameters passed to the lifecycle scripts and used to classify URLs.

use serde::Deserialize;

fn default_template_path() -> String {
	"./template".to_string()
}

fn default_admin_path() -> String {
	"/admin".to_string()
}

fn default_main_site_url() -> String {
	"https://virtualtabletop.io/".to_string()
}

fn default_preview_base_url() -> String {
	"https://test.virtualtabletop.io".to_string()
}

fn default_project_root_marker() -> String {
	"MAIN/".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DeployConfigLayer {
	#[serde(default)]
	pub template_path: Option<String>,
	#[serde(default)]
	pub admin_path: Option<String>,
	#[serde(default)]
	pub main_site_url: Option<String>,
	#[serde(default)]
	pub preview_base_url: Option<String>,
	#[serde(default)]
	pub project_root_marker: Option<String>,
}

impl DeployConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.template_path.is_some() {
			self.template_path = other.template_path;
		}
		if other.admin_path.is_some() {
			self.admin_path = other.admin_path;
		}
		if other.main_site_url.is_some() {
			self.main_site_url = other.main_site_url;
		}
		if other.preview_base_url.is_some() {
			self.preview_base_url = other.preview_base_url;
		}
		if other.project_root_marker.is_some() {
			self.project_root_marker = other.project_root_marker;
		}
	}

	pub fn finalize(self) -> DeployConfig {
		DeployConfig {
			template_path: self.template_path.unwrap_or_else(default_template_path),
			admin_path: self.admin_path.unwrap_or_else(default_admin_path),
			main_site_url: self.main_site_url.unwrap_or_else(default_main_site_url),
			preview_base_url: self
				.preview_base_url
				.unwrap_or_else(default_preview_base_url)
				.trim_end_matches('/')
				.to_string(),
			project_root_marker: self
				.project_root_marker
				.unwrap_or_else(default_project_root_marker),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
	/// Template checkout handed to `pr-start.sh` and `pr-stop.sh`.
	pub template_path: String,
	/// Unlisted path of the admin status page; also handed to the scripts.
	pub admin_path: String,
	/// URLs containing this are treated as the main site.
	pub main_site_url: String,
	/// Host serving preview environments, used to link history entries.
	pub preview_base_url: String,
	/// Path component after which in-project stack frame paths are shown.
	pub project_root_marker: String,
}

impl Default for DeployConfig {
	fn default() -> Self {
		DeployConfigLayer::default().finalize()
	}
}
