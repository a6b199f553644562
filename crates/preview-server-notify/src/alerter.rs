// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use crate::notifier::{Notification, Notifier};

/// Logs errors and forwards them to a [`Notifier`] without blocking the caller.
#[derive(Clone)]
pub struct Alerter {
	notifier: Arc<dyn Notifier>,
	title: String,
}

impl Alerter {
	pub fn new(notifier: Arc<dyn Notifier>, title: impl Into<String>) -> Self {
		Self {
			notifier,
			title: title.into(),
		}
	}

	pub fn notifier_name(&self) -> &'static str {
		self.notifier.name()
	}

	/// Log `message` at error level and push it with high priority.
	///
	/// Must be called from within a tokio runtime. The returned handle may be
	/// dropped; delivery failures are only logged.
	pub fn error(&self, message: impl Into<String>) -> JoinHandle<()> {
		let message = message.into();
		error!(alert = %message, "Controller error");
		self.dispatch(Notification::high(self.title.clone(), message))
	}

	/// Push a notification that is not an error log entry.
	pub fn notify(&self, notification: Notification) -> JoinHandle<()> {
		self.dispatch(notification)
	}

	fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
		let notifier = Arc::clone(&self.notifier);
		tokio::spawn(async move {
			if let Err(e) = notifier.send(&notification).await {
				error!(
					notifier = notifier.name(),
					error = %e,
					"Failed to send notification"
				);
			}
		})
	}
}
