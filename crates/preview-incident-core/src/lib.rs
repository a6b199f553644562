// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Incident extraction for preview server logs.
//!
//! Server logs mix ordinary output with two kinds of trouble worth surfacing:
//! - client error reports, one log line per report, whose details were saved
//!   as a JSON file named after the report id
//! - runtime crashes, an `Error:` line followed by `at ...` stack frames
//!
//! [`Extractor`] turns log text into [`IncidentRecord`]s, most recent first.
//! Nothing is persisted; every call re-derives the incidents from the text.

pub mod detail;
pub mod error;
pub mod extract;
pub mod incident;

pub use detail::{DetailStore, FsDetailStore, MemoryDetailStore};
pub use error::{DetailError, Result};
pub use extract::{tail_lines, ExtractOptions, Extractor};
pub use incident::{Frame, FrameLocation, IncidentCounts, IncidentKind, IncidentRecord};
