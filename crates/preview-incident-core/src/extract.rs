// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Line classifier turning server log text into incident records.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::error;

use crate::detail::DetailStore;
use crate::incident::{Frame, FrameLocation, IncidentRecord};

const CLIENT_ERROR_MARKER: &str = "ERROR: Client error";
const CRASH_PREFIX: &str = "Error:";
const FRAME_PREFIX: &str = "at ";
const FILE_URL_PREFIX: &str = "file:///";

/// Fields dropped from client error details before display.
const STRIPPED_DETAIL_FIELDS: [&str; 2] = ["html", "widgetsState"];

static CLIENT_ERROR_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(\S+) ERROR: Client error (\w+):").unwrap());

static TIMESTAMP_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}.\d{3}Z").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
	/// Path component ending the prefix stripped from in-project frames.
	pub project_root_marker: String,
}

impl Default for ExtractOptions {
	fn default() -> Self {
		Self {
			project_root_marker: "MAIN/".to_string(),
		}
	}
}

/// Two-state classifier over log lines.
///
/// While scanning, each line is a client error report, the start of a crash,
/// or noise. After a crash line the classifier collects `at ` frames; the
/// first line that is not a frame ends the crash and is classified again.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
	options: ExtractOptions,
}

enum State<'a> {
	Scanning,
	InCrashFrames(PendingCrash<'a>),
}

struct PendingCrash<'a> {
	timestamp: &'a str,
	error: &'a str,
	frames: Vec<Frame>,
}

impl Extractor {
	pub fn new(options: ExtractOptions) -> Self {
		Self { options }
	}

	/// Incidents found in `text`, most recent first.
	pub fn extract(&self, text: &str, details: &dyn DetailStore) -> Vec<IncidentRecord> {
		let mut incidents = Vec::new();
		let mut last_timestamp = "";
		let mut state = State::Scanning;

		for line in text.split('\n') {
			let trimmed = line.trim();

			if let State::InCrashFrames(crash) = &mut state {
				if let Some(frame) = trimmed.strip_prefix(FRAME_PREFIX) {
					crash.frames.push(self.frame(frame));
					continue;
				}
				if let State::InCrashFrames(crash) = std::mem::replace(&mut state, State::Scanning) {
					incidents.push(crash.finish());
				}
			}

			if line.contains(CLIENT_ERROR_MARKER) {
				if let Some(incident) = client_error(line, details) {
					incidents.push(incident);
				}
			} else if trimmed.starts_with(CRASH_PREFIX) {
				state = State::InCrashFrames(PendingCrash {
					timestamp: last_timestamp,
					error: trimmed,
					frames: Vec::new(),
				});
			}

			if TIMESTAMP_REGEX.is_match(trimmed) {
				last_timestamp = trimmed.split(' ').next().unwrap_or_default();
			}
		}

		if let State::InCrashFrames(crash) = state {
			incidents.push(crash.finish());
		}

		incidents.reverse();
		incidents
	}

	fn frame(&self, text: &str) -> Frame {
		if text.contains("file://") {
			Frame {
				text: strip_project_prefix(text, &self.options.project_root_marker),
				location: FrameLocation::InProject,
			}
		} else {
			Frame {
				text: text.to_string(),
				location: FrameLocation::External,
			}
		}
	}
}

impl PendingCrash<'_> {
	fn finish(self) -> IncidentRecord {
		IncidentRecord::RuntimeCrash {
			timestamp: self.timestamp.to_string(),
			error: self.error.to_string(),
			frames: self.frames,
		}
	}
}

fn client_error(line: &str, details: &dyn DetailStore) -> Option<IncidentRecord> {
	let captures = CLIENT_ERROR_REGEX.captures(line)?;
	let timestamp = &captures[1];
	let id = &captures[2];

	let mut detail = match details.load(id) {
		Ok(detail) => detail,
		Err(e) => {
			error!(id = %id, error = %e, "Dropping client error with unreadable detail");
			return None;
		}
	};

	let message = take_text(&mut detail, "message");
	let error = take_text(&mut detail, "error");
	let user_agent = take_text(&mut detail, "userAgent");
	let player_name = take_text(&mut detail, "playerName");
	for field in STRIPPED_DETAIL_FIELDS {
		detail.remove(field);
	}

	Some(IncidentRecord::ClientError {
		timestamp: timestamp.to_string(),
		id: id.to_string(),
		message,
		error,
		user_agent,
		player_name,
		details: detail,
	})
}

fn take_text(detail: &mut Map<String, Value>, key: &str) -> Option<String> {
	match detail.remove(key)? {
		Value::Null => None,
		Value::String(s) => Some(s),
		other => Some(other.to_string()),
	}
}

/// Remove every `file:///...<marker>` span, matching the shortest span each time.
fn strip_project_prefix(text: &str, marker: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;

	while let Some(start) = rest.find(FILE_URL_PREFIX) {
		let after_prefix = start + FILE_URL_PREFIX.len();
		let Some(offset) = rest[after_prefix..].find(marker) else {
			break;
		};
		out.push_str(&rest[..start]);
		rest = &rest[after_prefix + offset + marker.len()..];
	}

	out.push_str(rest);
	out
}

/// The last `n` newline-separated lines of `text`.
///
/// A trailing newline yields an empty final line, which counts toward `n`.
pub fn tail_lines(text: &str, n: usize) -> &str {
	if n == 0 {
		return "";
	}
	match text.rmatch_indices('\n').nth(n - 1) {
		Some((idx, _)) => &text[idx + 1..],
		None => text,
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use crate::detail::MemoryDetailStore;
	use crate::incident::IncidentCounts;
	use proptest::prelude::*;

	const LINES: [&str; 5] = [
		"Error: boom",
		"    at f (file:///srv/MAIN/a.js:1:1)",
		"    at node:internal/main:1:1",
		"2024-01-01T00:00:00.000Z INFO ok",
		"plain output",
	];

	proptest! {
		#[test]
		fn prop_every_crash_line_yields_one_crash(
			picks in proptest::collection::vec(0usize..LINES.len(), 0..200)
		) {
			let text = picks.iter().map(|i| LINES[*i]).collect::<Vec<_>>().join("\n");
			let store = MemoryDetailStore::new();
			let extractor = Extractor::default();

			let incidents = extractor.extract(&text, &store);
			let expected = picks.iter().filter(|i| **i == 0).count();
			prop_assert_eq!(IncidentCounts::from_incidents(&incidents).runtime_crashes, expected);
			prop_assert_eq!(&incidents, &extractor.extract(&text, &store));
		}
	}
}
