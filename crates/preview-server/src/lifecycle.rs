// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decides which lifecycle script, if any, an event or manual request runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use preview_common_secret::SecretString;
use preview_server_config::ServerConfig;
use regex::Regex;
use serde::Deserialize;

use crate::environment::{parse_pr_number, EnvKey, EnvironmentLayout};

static PR_URL_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"/PR-(\d+)(/|$)").unwrap());

const MAIN_BRANCH_REF: &str = "refs/heads/main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
	MainUpdate,
	PrOpen,
	PrStop,
	PrStart,
}

impl Script {
	pub fn file_name(&self) -> &'static str {
		match self {
			Script::MainUpdate => "main-update.sh",
			Script::PrOpen => "pr-open.sh",
			Script::PrStop => "pr-stop.sh",
			Script::PrStart => "pr-start.sh",
		}
	}
}

impl fmt::Display for Script {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.file_name())
	}
}

/// A script argument. Secret arguments are redacted in `Debug` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptArg {
	Plain(String),
	Secret(SecretString),
}

impl ScriptArg {
	pub fn expose(&self) -> &str {
		match self {
			ScriptArg::Plain(value) => value,
			ScriptArg::Secret(secret) => secret.expose(),
		}
	}
}

impl From<&str> for ScriptArg {
	fn from(value: &str) -> Self {
		ScriptArg::Plain(value.to_string())
	}
}

impl From<String> for ScriptArg {
	fn from(value: String) -> Self {
		ScriptArg::Plain(value)
	}
}

/// One script invocation with its ordered arguments and output log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleAction {
	pub key: EnvKey,
	pub script: Script,
	pub args: Vec<ScriptArg>,
	pub log_path: PathBuf,
}

/// Fields of a GitHub delivery the router looks at.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct WebhookPayload {
	#[serde(default)]
	pub action: Option<String>,
	#[serde(default)]
	pub number: Option<u64>,
	#[serde(default, rename = "ref")]
	pub git_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
	pub event_type: String,
	pub payload: WebhookPayload,
}

impl WebhookEvent {
	pub fn new(event_type: impl Into<String>, payload: WebhookPayload) -> Self {
		Self {
			event_type: event_type.into(),
			payload,
		}
	}
}

/// What a URL submitted to `/start` or `/state` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlTarget {
	Pr(u64),
	Main,
	Unknown,
}

impl UrlTarget {
	pub fn key(&self) -> Option<EnvKey> {
		match self {
			UrlTarget::Pr(number) => Some(EnvKey::Pr(*number)),
			UrlTarget::Main => Some(EnvKey::Main),
			UrlTarget::Unknown => None,
		}
	}
}

pub struct LifecycleRouter {
	layout: EnvironmentLayout,
	template_path: String,
	admin_path: String,
	main_site_url: String,
	ntfy_url: String,
	github_token: SecretString,
}

impl LifecycleRouter {
	pub fn from_config(config: &ServerConfig) -> Self {
		Self {
			layout: EnvironmentLayout::new(&config.paths.servers_dir, &config.paths.save_dir),
			template_path: config.deploy.template_path.clone(),
			admin_path: config.deploy.admin_path.clone(),
			main_site_url: config.deploy.main_site_url.clone(),
			ntfy_url: config.notify.script_arg().to_string(),
			github_token: config.github.token.clone(),
		}
	}

	pub fn layout(&self) -> &EnvironmentLayout {
		&self.layout
	}

	pub fn route_webhook(&self, event: &WebhookEvent) -> Option<LifecycleAction> {
		let payload = &event.payload;
		match event.event_type.as_str() {
			"push" => {
				(payload.git_ref.as_deref() == Some(MAIN_BRANCH_REF)).then(|| self.main_update())
			}
			"pull_request" => {
				let action = payload.action.as_deref()?;
				let number = payload.number?;
				if action.contains("opened") {
					Some(self.pr_open(number))
				} else if action == "synchronize" || action == "closed" {
					Some(self.pr_stop(number))
				} else {
					None
				}
			}
			_ => None,
		}
	}

	pub fn route_start(&self, url: &str) -> Option<LifecycleAction> {
		match self.classify_url(url) {
			UrlTarget::Pr(number) => Some(self.pr_start(number)),
			UrlTarget::Main => Some(self.main_update()),
			UrlTarget::Unknown => None,
		}
	}

	/// A PR path segment wins over the main site base.
	pub fn classify_url(&self, url: &str) -> UrlTarget {
		if let Some(captures) = PR_URL_REGEX.captures(url) {
			return match parse_pr_number(&captures[1]) {
				Some(number) => UrlTarget::Pr(number),
				None => UrlTarget::Unknown,
			};
		}
		if url.contains(&self.main_site_url) {
			return UrlTarget::Main;
		}
		UrlTarget::Unknown
	}

	pub fn main_update(&self) -> LifecycleAction {
		self.action(
			EnvKey::Main,
			Script::MainUpdate,
			vec![
				ScriptArg::from(self.admin_path.as_str()),
				ScriptArg::from(self.ntfy_url.as_str()),
			],
		)
	}

	pub fn pr_open(&self, number: u64) -> LifecycleAction {
		self.action(
			EnvKey::Pr(number),
			Script::PrOpen,
			vec![
				ScriptArg::Secret(self.github_token.clone()),
				ScriptArg::from(number.to_string()),
			],
		)
	}

	pub fn pr_stop(&self, number: u64) -> LifecycleAction {
		self.action(
			EnvKey::Pr(number),
			Script::PrStop,
			vec![
				ScriptArg::from(self.template_path.as_str()),
				ScriptArg::from(number.to_string()),
			],
		)
	}

	pub fn pr_start(&self, number: u64) -> LifecycleAction {
		self.action(
			EnvKey::Pr(number),
			Script::PrStart,
			vec![
				ScriptArg::from(self.template_path.as_str()),
				ScriptArg::from(number.to_string()),
				ScriptArg::from(self.admin_path.as_str()),
				ScriptArg::from(self.ntfy_url.as_str()),
			],
		)
	}

	fn action(&self, key: EnvKey, script: Script, args: Vec<ScriptArg>) -> LifecycleAction {
		LifecycleAction {
			key,
			script,
			args,
			log_path: self.layout.lifecycle_log(key),
		}
	}
}

impl LifecycleAction {
	pub fn program(&self, scripts_dir: &Path) -> PathBuf {
		scripts_dir.join(self.script.file_name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use preview_server_config::{GithubConfig, NotifyConfig, PathsConfig};

	fn router() -> LifecycleRouter {
		let config = ServerConfig {
			paths: PathsConfig::rooted_at("/srv/vtt"),
			github: GithubConfig {
				webhook_secret: None,
				token: SecretString::from("ghp_token"),
			},
			notify: NotifyConfig {
				ntfy_url: Some("https://ntfy.sh/vtt".to_string()),
				..Default::default()
			},
			..Default::default()
		};
		LifecycleRouter::from_config(&config)
	}

	fn push(git_ref: &str) -> WebhookEvent {
		WebhookEvent::new(
			"push",
			WebhookPayload {
				git_ref: Some(git_ref.to_string()),
				..Default::default()
			},
		)
	}

	fn pull_request(action: &str, number: u64) -> WebhookEvent {
		WebhookEvent::new(
			"pull_request",
			WebhookPayload {
				action: Some(action.to_string()),
				number: Some(number),
				..Default::default()
			},
		)
	}

	fn args(action: &LifecycleAction) -> Vec<&str> {
		action.args.iter().map(ScriptArg::expose).collect()
	}

	#[test]
	fn test_push_to_main_updates_main() {
		let action = router().route_webhook(&push("refs/heads/main")).unwrap();
		assert_eq!(action.script, Script::MainUpdate);
		assert_eq!(action.key, EnvKey::Main);
		assert_eq!(args(&action), vec!["/admin", "https://ntfy.sh/vtt"]);
		assert_eq!(action.log_path, PathBuf::from("/srv/vtt/servers/MAIN.log"));
	}

	#[test]
	fn test_push_to_other_ref_is_ignored() {
		let router = router();
		assert!(router.route_webhook(&push("refs/heads/dev")).is_none());
		assert!(router.route_webhook(&push("refs/tags/v1")).is_none());
		assert!(router
			.route_webhook(&WebhookEvent::new("push", WebhookPayload::default()))
			.is_none());
	}

	#[test]
	fn test_opened_pr_opens_environment() {
		let action = router().route_webhook(&pull_request("opened", 42)).unwrap();
		assert_eq!(action.script, Script::PrOpen);
		assert_eq!(action.key, EnvKey::Pr(42));
		assert_eq!(args(&action), vec!["ghp_token", "42"]);
		assert_eq!(action.log_path, PathBuf::from("/srv/vtt/servers/PR-42.log"));
	}

	#[test]
	fn test_reopened_pr_opens_environment() {
		let action = router().route_webhook(&pull_request("reopened", 7)).unwrap();
		assert_eq!(action.script, Script::PrOpen);
	}

	#[test]
	fn test_synchronize_and_closed_stop_environment() {
		for event in ["synchronize", "closed"] {
			let action = router().route_webhook(&pull_request(event, 9)).unwrap();
			assert_eq!(action.script, Script::PrStop);
			assert_eq!(args(&action), vec!["./template", "9"]);
		}
	}

	#[test]
	fn test_other_pr_actions_and_events_are_ignored() {
		let router = router();
		assert!(router.route_webhook(&pull_request("labeled", 9)).is_none());
		assert!(router
			.route_webhook(&WebhookEvent::new("issues", WebhookPayload::default()))
			.is_none());
		let without_number = WebhookEvent::new(
			"pull_request",
			WebhookPayload {
				action: Some("opened".to_string()),
				..Default::default()
			},
		);
		assert!(router.route_webhook(&without_number).is_none());
	}

	#[test]
	fn test_token_is_redacted_in_debug() {
		let action = router().route_webhook(&pull_request("opened", 1)).unwrap();
		let output = format!("{action:?}");
		assert!(!output.contains("ghp_token"));
	}

	#[test]
	fn test_classify_urls() {
		let router = router();
		assert_eq!(
			router.classify_url("https://site/PR-17/board"),
			UrlTarget::Pr(17)
		);
		assert_eq!(router.classify_url("https://site/PR-17"), UrlTarget::Pr(17));
		assert_eq!(
			router.classify_url("https://virtualtabletop.io/"),
			UrlTarget::Main
		);
		assert_eq!(
			router.classify_url("https://virtualtabletop.io/game"),
			UrlTarget::Main
		);
		assert_eq!(
			router.classify_url("https://example.com/"),
			UrlTarget::Unknown
		);
		assert_eq!(
			router.classify_url("https://site/PR-17x/board"),
			UrlTarget::Unknown
		);
		assert_eq!(
			router.classify_url("https://site/PR-99999999999999999999999/"),
			UrlTarget::Unknown
		);
		assert_eq!(
			router.classify_url("https://site/PR-017/"),
			UrlTarget::Unknown
		);
	}

	#[test]
	fn test_manual_start() {
		let router = router();
		let action = router.route_start("https://test.virtualtabletop.io/PR-17/").unwrap();
		assert_eq!(action.script, Script::PrStart);
		assert_eq!(
			args(&action),
			vec!["./template", "17", "/admin", "https://ntfy.sh/vtt"]
		);
		assert_eq!(
			router.route_start("https://virtualtabletop.io/").unwrap().script,
			Script::MainUpdate
		);
		assert!(router.route_start("https://example.com/").is_none());
	}

	#[test]
	fn test_missing_ntfy_url_passes_empty_arg() {
		let router = LifecycleRouter::from_config(&ServerConfig::default());
		let action = router.main_update();
		assert_eq!(args(&action), vec!["/admin", ""]);
	}

	#[test]
	fn test_program_path() {
		let action = router().pr_stop(3);
		assert_eq!(
			action.program(Path::new("/srv/vtt")),
			PathBuf::from("/srv/vtt/pr-stop.sh")
		);
	}
}
