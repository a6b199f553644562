// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push notification (ntfy) configuration section.

use serde::Deserialize;

fn default_title() -> String {
	"Preview Controller Error".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NotifyConfigLayer {
	#[serde(default)]
	pub ntfy_url: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl NotifyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.ntfy_url.is_some() {
			self.ntfy_url = other.ntfy_url;
		}
		if other.title.is_some() {
			self.title = other.title;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	pub fn finalize(self) -> NotifyConfig {
		NotifyConfig {
			ntfy_url: self.ntfy_url,
			title: self.title.unwrap_or_else(default_title),
			timeout_secs: self.timeout_secs.unwrap_or(10),
		}
	}
}

/// When `ntfy_url` is unset, alerts only reach the error log.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
	pub ntfy_url: Option<String>,
	pub title: String,
	pub timeout_secs: u64,
}

impl NotifyConfig {
	/// Value handed to the lifecycle scripts, which post their own alerts.
	pub fn script_arg(&self) -> String {
		self.ntfy_url.clone().unwrap_or_default()
	}
}

impl Default for NotifyConfig {
	fn default() -> Self {
		NotifyConfigLayer::default().finalize()
	}
}
