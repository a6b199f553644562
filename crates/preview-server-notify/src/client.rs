// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client configuration.

use reqwest::{Client, ClientBuilder};

/// Client builder with the controller's User-Agent header.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Format: `preview-server/{version}`
pub fn user_agent() -> String {
	format!("preview-server/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "preview-server");
	}

	#[test]
	fn builder_builds() {
		assert!(builder().build().is_ok());
	}
}
