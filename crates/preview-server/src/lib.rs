// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Preview deployment controller.
//!
//! Receives GitHub webhooks and manual requests, runs the lifecycle scripts
//! that start and stop per-PR preview environments, stops environments that
//! have gone idle, and turns the main deployment's log into an incident list
//! and periodic alerts.

pub mod api;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod jobs;
pub mod launcher;
pub mod lifecycle;
pub mod render;
pub mod routes;

pub use api::{create_alerter, create_app_state, create_router, AppState};
pub use environment::{
	Clock, EnvKey, EnvironmentLayout, EnvironmentStore, FsEnvironmentStore, StoreError, SystemClock,
};
pub use error::ServerError;
pub use launcher::{LaunchError, LaunchHandle, LaunchOptions, Launcher, ScriptLauncher};
pub use lifecycle::{
	LifecycleAction, LifecycleRouter, Script, ScriptArg, UrlTarget, WebhookEvent, WebhookPayload,
};
