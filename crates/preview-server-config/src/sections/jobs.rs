// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background sweep configuration: idle reaping and error health reports.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobsConfigLayer {
	pub idle_reaper_enabled: Option<bool>,
	pub idle_reaper_interval_secs: Option<u64>,
	pub idle_threshold_secs: Option<u64>,
	pub health_report_enabled: Option<bool>,
	pub health_report_interval_secs: Option<u64>,
	pub health_tail_lines: Option<usize>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.idle_reaper_enabled.is_some() {
			self.idle_reaper_enabled = other.idle_reaper_enabled;
		}
		if other.idle_reaper_interval_secs.is_some() {
			self.idle_reaper_interval_secs = other.idle_reaper_interval_secs;
		}
		if other.idle_threshold_secs.is_some() {
			self.idle_threshold_secs = other.idle_threshold_secs;
		}
		if other.health_report_enabled.is_some() {
			self.health_report_enabled = other.health_report_enabled;
		}
		if other.health_report_interval_secs.is_some() {
			self.health_report_interval_secs = other.health_report_interval_secs;
		}
		if other.health_tail_lines.is_some() {
			self.health_tail_lines = other.health_tail_lines;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		let defaults = JobsConfig::default();
		JobsConfig {
			idle_reaper_enabled: self
				.idle_reaper_enabled
				.unwrap_or(defaults.idle_reaper_enabled),
			idle_reaper_interval_secs: self
				.idle_reaper_interval_secs
				.unwrap_or(defaults.idle_reaper_interval_secs),
			idle_threshold_secs: self
				.idle_threshold_secs
				.unwrap_or(defaults.idle_threshold_secs),
			health_report_enabled: self
				.health_report_enabled
				.unwrap_or(defaults.health_report_enabled),
			health_report_interval_secs: self
				.health_report_interval_secs
				.unwrap_or(defaults.health_report_interval_secs),
			health_tail_lines: self.health_tail_lines.unwrap_or(defaults.health_tail_lines),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
	pub idle_reaper_enabled: bool,
	pub idle_reaper_interval_secs: u64,
	pub idle_threshold_secs: u64,
	pub health_report_enabled: bool,
	pub health_report_interval_secs: u64,
	pub health_tail_lines: usize,
}

impl Default for JobsConfig {
	fn default() -> Self {
		Self {
			idle_reaper_enabled: true,
			idle_reaper_interval_secs: 300, // 5 minutes
			idle_threshold_secs: 3600,      // 1 hour
			health_report_enabled: true,
			health_report_interval_secs: 300, // 5 minutes
			health_tail_lines: 1000,
		}
	}
}
