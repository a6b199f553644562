// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Incident records derived from log text.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// A single problem found in a server log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncidentRecord {
	ClientError {
		timestamp: String,
		id: String,
		message: Option<String>,
		error: Option<String>,
		user_agent: Option<String>,
		player_name: Option<String>,
		/// Remaining detail fields, without `html` and `widgetsState`.
		details: Map<String, Value>,
	},
	RuntimeCrash {
		/// Empty when no timestamped line precedes the crash.
		timestamp: String,
		error: String,
		frames: Vec<Frame>,
	},
}

impl IncidentRecord {
	pub fn kind(&self) -> IncidentKind {
		match self {
			IncidentRecord::ClientError { .. } => IncidentKind::ClientError,
			IncidentRecord::RuntimeCrash { .. } => IncidentKind::RuntimeCrash,
		}
	}

	pub fn timestamp(&self) -> &str {
		match self {
			IncidentRecord::ClientError { timestamp, .. }
			| IncidentRecord::RuntimeCrash { timestamp, .. } => timestamp,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
	ClientError,
	RuntimeCrash,
}

impl fmt::Display for IncidentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ClientError => write!(f, "client_error"),
			Self::RuntimeCrash => write!(f, "runtime_crash"),
		}
	}
}

/// One `at ...` line of a crash trace, with the `at ` prefix removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
	pub text: String,
	pub location: FrameLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLocation {
	/// Loaded from a `file://` URL; the path up to the project root is stripped.
	InProject,
	/// Node internals and dependencies.
	External,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentCounts {
	pub client_errors: usize,
	pub runtime_crashes: usize,
}

impl IncidentCounts {
	pub fn from_incidents(incidents: &[IncidentRecord]) -> Self {
		incidents
			.iter()
			.fold(Self::default(), |mut counts, incident| {
				match incident.kind() {
					IncidentKind::ClientError => counts.client_errors += 1,
					IncidentKind::RuntimeCrash => counts.runtime_crashes += 1,
				}
				counts
			})
	}

	pub fn is_empty(&self) -> bool {
		self.client_errors == 0 && self.runtime_crashes == 0
	}
}
