// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for client error detail lookups.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetailError {
	#[error("error detail {id} not found")]
	NotFound { id: String },

	#[error("failed to read error detail {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed error detail {id}: {source}")]
	Parse {
		id: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("error detail {id} is not a JSON object")]
	NotAnObject { id: String },
}

pub type Result<T> = std::result::Result<T, DetailError>;
