// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub credentials: the webhook signing secret and the token handed to
//! `pr-open.sh`.

use preview_common_secret::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GithubConfigLayer {
	#[serde(default)]
	pub webhook_secret: Option<SecretString>,
	#[serde(default)]
	pub token: Option<SecretString>,
}

impl GithubConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.webhook_secret.is_some() {
			self.webhook_secret = other.webhook_secret;
		}
		if other.token.is_some() {
			self.token = other.token;
		}
	}

	pub fn finalize(self) -> GithubConfig {
		GithubConfig {
			webhook_secret: self.webhook_secret,
			token: self.token.unwrap_or_else(|| SecretString::from("")),
		}
	}
}

/// Without a webhook secret every delivery fails verification.
#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
	pub webhook_secret: Option<SecretString>,
	pub token: SecretString,
}

impl Default for GithubConfig {
	fn default() -> Self {
		GithubConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_has_no_webhook_secret() {
		let config = GithubConfig::default();
		assert!(config.webhook_secret.is_none());
		assert_eq!(config.token.expose(), "");
	}

	#[test]
	fn test_deserialize_secrets() {
		let layer: GithubConfigLayer = toml::from_str(
			r#"
webhook_secret = "s3cret"
token = "ghp_abc"
"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.webhook_secret.unwrap().expose(), "s3cret");
		assert_eq!(config.token.expose(), "ghp_abc");
	}

	#[test]
	fn test_debug_never_prints_secret() {
		let config = GithubConfigLayer {
			webhook_secret: Some(SecretString::from("s3cret")),
			token: Some(SecretString::from("ghp_abc")),
		}
		.finalize();
		let output = format!("{config:?}");
		assert!(!output.contains("s3cret"));
		assert!(!output.contains("ghp_abc"));
	}
}
