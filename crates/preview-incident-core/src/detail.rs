// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lookup of saved client error details by report id.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{DetailError, Result};

/// Source of the JSON object saved for each client error report.
pub trait DetailStore: Send + Sync {
	fn load(&self, id: &str) -> Result<Map<String, Value>>;
}

/// Reads `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FsDetailStore {
	dir: PathBuf,
}

impl FsDetailStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}
}

impl DetailStore for FsDetailStore {
	fn load(&self, id: &str) -> Result<Map<String, Value>> {
		let path = self.dir.join(format!("{id}.json"));
		let content = match std::fs::read_to_string(&path) {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				return Err(DetailError::NotFound { id: id.to_string() })
			}
			Err(source) => return Err(DetailError::Io { path, source }),
		};
		parse_detail(id, &content)
	}
}

/// In-memory store keyed by report id, holding raw JSON text.
#[derive(Debug, Clone, Default)]
pub struct MemoryDetailStore {
	entries: HashMap<String, String>,
}

impl MemoryDetailStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: impl Into<String>, json: impl Into<String>) {
		self.entries.insert(id.into(), json.into());
	}
}

impl DetailStore for MemoryDetailStore {
	fn load(&self, id: &str) -> Result<Map<String, Value>> {
		let content = self
			.entries
			.get(id)
			.ok_or_else(|| DetailError::NotFound { id: id.to_string() })?;
		parse_detail(id, content)
	}
}

fn parse_detail(id: &str, content: &str) -> Result<Map<String, Value>> {
	let value: Value = serde_json::from_str(content).map_err(|source| DetailError::Parse {
		id: id.to_string(),
		source,
	})?;
	match value {
		Value::Object(map) => Ok(map),
		_ => Err(DetailError::NotAnObject { id: id.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fs_store_reads_object() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("abc123.json"), r#"{"message":"hi"}"#).unwrap();
		let store = FsDetailStore::new(dir.path());
		let detail = store.load("abc123").unwrap();
		assert_eq!(detail["message"], "hi");
	}

	#[test]
	fn test_fs_store_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let store = FsDetailStore::new(dir.path());
		assert!(matches!(
			store.load("missing"),
			Err(DetailError::NotFound { .. })
		));
	}

	#[test]
	fn test_malformed_json() {
		let mut store = MemoryDetailStore::new();
		store.insert("bad", "{not json");
		assert!(matches!(store.load("bad"), Err(DetailError::Parse { .. })));
	}

	#[test]
	fn test_non_object_rejected() {
		let mut store = MemoryDetailStore::new();
		store.insert("list", "[1, 2, 3]");
		assert!(matches!(
			store.load("list"),
			Err(DetailError::NotAnObject { .. })
		));
	}
}
