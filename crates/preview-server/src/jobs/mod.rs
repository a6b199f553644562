// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod health_report;
mod idle_reaper;

pub use health_report::HealthReportJob;
pub use idle_reaper::IdleReaperJob;
