// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Out-of-band alerting for the preview controller.
//!
//! Failures that never reach an HTTP caller (lifecycle scripts exiting
//! non-zero, unreadable logs, error spikes on MAIN) are pushed to an ntfy
//! topic. Components receive an [`Alerter`] instead of talking to ntfy
//! directly, so tests can capture alerts with a [`MemoryNotifier`].

mod alerter;
mod client;
mod error;
mod notifier;

pub use alerter::Alerter;
pub use client::{builder, user_agent};
pub use error::NotifyError;
pub use notifier::{
	LogNotifier, MemoryNotifier, Notification, Notifier, NtfyNotifier, Priority,
};
