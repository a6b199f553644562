// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for preview-server.

pub mod deploy;
pub mod github;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod notify;
pub mod paths;

pub use deploy::{DeployConfig, DeployConfigLayer};
pub use github::{GithubConfig, GithubConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use notify::{NotifyConfig, NotifyConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
