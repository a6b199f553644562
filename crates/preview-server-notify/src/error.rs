// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error("notification request failed: {0}")]
	Request(#[source] reqwest::Error),

	#[error("notification endpoint returned {status}")]
	Status { status: reqwest::StatusCode },
}
