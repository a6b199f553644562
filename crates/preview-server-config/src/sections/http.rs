// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server configuration.

use serde::Deserialize;

const DEFAULT_ROUTE_PREFIX: &str = "/puppeteer";

/// HTTP server configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Prefix for the controller endpoints (`{prefix}/webhook`, ...). May be empty.
	pub route_prefix: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub route_prefix: Option<String>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.route_prefix.is_some() {
			self.route_prefix = other.route_prefix;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let route_prefix = self
			.route_prefix
			.unwrap_or_else(|| DEFAULT_ROUTE_PREFIX.to_string())
			.trim_end_matches('/')
			.to_string();

		HttpConfig {
			host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
			port: self.port.unwrap_or(8080),
			route_prefix,
		}
	}
}
