// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTML pages served on the admin and history routes.

use preview_incident_core::{FrameLocation, IncidentRecord};
use serde_json::Value;

/// First synthetic preview number, assigned to the oldest commit.
pub const HISTORY_FIRST_NUMBER: u64 = 10001;

const FRAME_INDENT: &str = "                ";

pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

fn field(value: &Option<String>) -> String {
	escape_html(value.as_deref().unwrap_or("undefined"))
}

pub fn render_incidents(incidents: &[IncidentRecord]) -> String {
	let mut out = String::from("<pre>");

	for incident in incidents {
		match incident {
			IncidentRecord::ClientError {
				timestamp,
				message,
				error,
				user_agent,
				player_name,
				details,
				..
			} => {
				let json = serde_json::to_string_pretty(&Value::Object(details.clone()))
					.unwrap_or_default();
				out.push_str("<b>🖥️ Client Error</b>\n");
				out.push_str(&format!("<b>🕒 Timestamp:</b>   {}\n", escape_html(timestamp)));
				out.push_str(&format!("<b>💬 Message:</b>     {}\n", field(message)));
				out.push_str(&format!("<b>❌ Error:</b>       {}\n", field(error)));
				out.push_str(&format!("<b>🌐 User Agent:</b>  {}\n", field(user_agent)));
				out.push_str(&format!("<b>👤 Player Name:</b> {}\n", field(player_name)));
				out.push_str(&format!(
					"<details><summary>Detailed JSON (click to expand)</summary><pre>{}</pre></details>\n\n",
					escape_html(&json),
				));
			}
			IncidentRecord::RuntimeCrash {
				timestamp,
				error,
				frames,
			} => {
				out.push_str("<b>💥 NodeJS Crash</b>\n");
				out.push_str(&format!("<b>🕒 Timestamp:</b>   {}\n", escape_html(timestamp)));
				out.push_str(&format!("<b>❌ Error:</b>       {}\n", escape_html(error)));
				out.push_str("<b>📚 Stack Trace:</b>\n");
				for frame in frames {
					let text = escape_html(&frame.text);
					match frame.location {
						FrameLocation::InProject => {
							out.push_str(&format!("{FRAME_INDENT}{text}\n"));
						}
						FrameLocation::External => {
							out.push_str(&format!(
								"{FRAME_INDENT}<span style=\"opacity: 0.3;\">{text}</span>\n"
							));
						}
					}
				}
				out.push('\n');
			}
		}
	}

	out.push_str("</pre>");
	out
}

/// One line of `git log --pretty=format:'%h %ad %s' --date=short`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
	pub hash: String,
	pub date: String,
	pub subject: String,
}

impl HistoryEntry {
	pub fn parse(line: &str) -> Option<Self> {
		let mut parts = line.splitn(3, ' ');
		let hash = parts.next().filter(|h| !h.is_empty())?;
		let date = parts.next()?;
		let subject = parts.next().unwrap_or("");
		Some(Self {
			hash: hash.to_string(),
			date: date.to_string(),
			subject: subject.to_string(),
		})
	}

	fn month(&self) -> &str {
		self.date.get(..7).unwrap_or(&self.date)
	}
}

/// Render commits given newest-first, as `git log` prints them.
///
/// Numbers count up from [`HISTORY_FIRST_NUMBER`] starting at the oldest
/// commit, so a commit keeps its number as history grows.
pub fn render_history(entries: &[HistoryEntry], preview_base_url: &str) -> String {
	let total = entries.len() as u64;
	let mut lines = Vec::with_capacity(entries.len());
	let mut previous_month: Option<&str> = None;

	for (index, entry) in entries.iter().enumerate() {
		let number = HISTORY_FIRST_NUMBER + total - 1 - index as u64;
		let separator = match previous_month {
			Some(month) if month != entry.month() => "\n",
			_ => "",
		};
		lines.push(format!(
			"{separator}<a href=\"{preview_base_url}/PR-{number}/\">{}</a> {} {}",
			escape_html(&entry.hash),
			escape_html(&entry.date),
			escape_html(&entry.subject),
		));
		previous_month = Some(entry.month());
	}

	format!("<base target=_blank><pre>{}</pre>", lines.join("\n"))
}

pub fn render_status(output: &str) -> String {
	format!("<pre>{}</pre>", escape_html(output))
}

#[cfg(test)]
mod tests {
	use super::*;
	use preview_incident_core::Frame;
	use serde_json::{json, Map};

	#[test]
	fn test_escape_html() {
		assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
		assert_eq!(escape_html("plain"), "plain");
	}

	#[test]
	fn test_render_crash_marks_external_frames() {
		let incidents = vec![IncidentRecord::RuntimeCrash {
			timestamp: "2024-01-01T00:00:00.000Z".to_string(),
			error: "Error: boom".to_string(),
			frames: vec![
				Frame {
					text: "server/game.mjs:10:5".to_string(),
					location: FrameLocation::InProject,
				},
				Frame {
					text: "node:internal/timers:573:17".to_string(),
					location: FrameLocation::External,
				},
			],
		}];

		let html = render_incidents(&incidents);
		assert_eq!(
			html,
			"<pre><b>💥 NodeJS Crash</b>\n\
			 <b>🕒 Timestamp:</b>   2024-01-01T00:00:00.000Z\n\
			 <b>❌ Error:</b>       Error: boom\n\
			 <b>📚 Stack Trace:</b>\n                server/game.mjs:10:5\n                \
			 <span style=\"opacity: 0.3;\">node:internal/timers:573:17</span>\n\n</pre>"
		);
	}

	#[test]
	fn test_render_client_error_escapes_fields() {
		let mut details = Map::new();
		details.insert("url".to_string(), json!("/room"));
		let incidents = vec![IncidentRecord::ClientError {
			timestamp: "2024-01-01T00:00:00.000Z".to_string(),
			id: "abc".to_string(),
			message: Some("<script>".to_string()),
			error: None,
			user_agent: Some("Firefox".to_string()),
			player_name: Some("Ann".to_string()),
			details,
		}];

		let html = render_incidents(&incidents);
		assert!(html.contains("<b>🖥️ Client Error</b>"));
		assert!(html.contains("<b>💬 Message:</b>     &lt;script&gt;\n"));
		assert!(html.contains("<b>❌ Error:</b>       undefined\n"));
		assert!(html.contains(
			"(click to expand)</summary><pre>{\n  \"url\": \"/room\"\n}</pre></details>\n\n"
		));
	}

	#[test]
	fn test_render_client_error_layout() {
		let incidents = vec![IncidentRecord::ClientError {
			timestamp: "2024-01-01T00:00:00.000Z".to_string(),
			id: "abc".to_string(),
			message: Some("lost".to_string()),
			error: Some("TypeError".to_string()),
			user_agent: None,
			player_name: Some("Ann".to_string()),
			details: Map::new(),
		}];

		assert_eq!(
			render_incidents(&incidents),
			"<pre><b>🖥️ Client Error</b>\n\
			 <b>🕒 Timestamp:</b>   2024-01-01T00:00:00.000Z\n\
			 <b>💬 Message:</b>     lost\n\
			 <b>❌ Error:</b>       TypeError\n\
			 <b>🌐 User Agent:</b>  undefined\n\
			 <b>👤 Player Name:</b> Ann\n\
			 <details><summary>Detailed JSON (click to expand)</summary><pre>{}</pre></details>\n\n\
			 </pre>"
		);
	}

	#[test]
	fn test_render_no_incidents() {
		assert_eq!(render_incidents(&[]), "<pre></pre>");
	}

	#[test]
	fn test_parse_history_entry() {
		let entry = HistoryEntry::parse("abc1234 2024-03-05 Fix the <thing> now").unwrap();
		assert_eq!(entry.hash, "abc1234");
		assert_eq!(entry.date, "2024-03-05");
		assert_eq!(entry.subject, "Fix the <thing> now");
		assert!(HistoryEntry::parse("").is_none());
		assert!(HistoryEntry::parse("abc1234").is_none());
	}

	#[test]
	fn test_render_history_numbers_and_months() {
		let entries: Vec<HistoryEntry> = [
			"ccc 2024-04-02 Third",
			"bbb 2024-03-20 Second",
			"aaa 2024-03-01 First & only",
		]
		.iter()
		.filter_map(|line| HistoryEntry::parse(line))
		.collect();

		let html = render_history(&entries, "https://preview.example.com");
		assert_eq!(
			html,
			"<base target=_blank><pre>\
			 <a href=\"https://preview.example.com/PR-10003/\">ccc</a> 2024-04-02 Third\n\
			 \n<a href=\"https://preview.example.com/PR-10002/\">bbb</a> 2024-03-20 Second\n\
			 <a href=\"https://preview.example.com/PR-10001/\">aaa</a> 2024-03-01 First &amp; only\
			 </pre>"
		);
	}

	#[test]
	fn test_render_status_escapes() {
		assert_eq!(render_status("a<b"), "<pre>a&lt;b</pre>");
	}
}
