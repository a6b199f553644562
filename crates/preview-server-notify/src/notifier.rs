// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{instrument, warn};

use crate::client::builder;
use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
	Min,
	Low,
	Default,
	High,
	Urgent,
}

impl Priority {
	/// Value of the ntfy `Priority` header.
	pub fn as_str(&self) -> &'static str {
		match self {
			Priority::Min => "min",
			Priority::Low => "low",
			Priority::Default => "default",
			Priority::High => "high",
			Priority::Urgent => "urgent",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub title: String,
	pub message: String,
	pub priority: Priority,
}

impl Notification {
	pub fn high(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			message: message.into(),
			priority: Priority::High,
		}
	}
}

#[async_trait]
pub trait Notifier: Send + Sync {
	fn name(&self) -> &'static str;
	async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts the message body to an ntfy topic URL.
pub struct NtfyNotifier {
	client: Client,
	url: String,
}

impl NtfyNotifier {
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
		let client = builder()
			.timeout(timeout)
			.build()
			.map_err(NotifyError::Client)?;
		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl Notifier for NtfyNotifier {
	fn name(&self) -> &'static str {
		"ntfy"
	}

	#[instrument(skip(self, notification), fields(title = %notification.title))]
	async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
		let response = self
			.client
			.post(&self.url)
			.header("Title", &notification.title)
			.header("Priority", notification.priority.as_str())
			.body(notification.message.clone())
			.send()
			.await
			.map_err(NotifyError::Request)?;

		let status = response.status();
		if !status.is_success() {
			return Err(NotifyError::Status { status });
		}
		Ok(())
	}
}

/// Used when no ntfy URL is configured; the alert only reaches the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
	fn name(&self) -> &'static str {
		"log"
	}

	async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
		warn!(
			title = %notification.title,
			priority = notification.priority.as_str(),
			message = %notification.message,
			"No notification endpoint configured"
		);
		Ok(())
	}
}

/// Records notifications in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
	sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sent(&self) -> Vec<Notification> {
		self.sent.lock().clone()
	}
}

#[async_trait]
impl Notifier for MemoryNotifier {
	fn name(&self) -> &'static str {
		"memory"
	}

	async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
		self.sent.lock().push(notification.clone());
		Ok(())
	}
}
