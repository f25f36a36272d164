// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured callback: the path hit on the target app and the 5-field
/// schedule it runs on. Identified by `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
	pub path: String,
	pub schedule: String,
}

impl Job {
	pub fn new(path: impl Into<String>, schedule: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			schedule: schedule.into(),
		}
	}
}

/// Parsed form of the config file. Rebuilt on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
	pub crons: Vec<Job>,
}

impl JobConfig {
	/// First job whose path matches exactly.
	pub fn find(&self, path: &str) -> Option<&Job> {
		self.crons.iter().find(|job| job.path == path)
	}
}

/// Outcome of a single dispatch attempt.
///
/// `status_code` is absent when no HTTP response was obtained; `error` is only
/// set in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
	pub path: String,
	pub schedule: String,
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status_code: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub timestamp: DateTime<Utc>,
	#[serde(rename = "duration")]
	pub duration_ms: u64,
}

/// Snapshot of the runner's aggregate counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerStats {
	/// Only set by watch-mode start; one-shot runs leave it untouched.
	pub total_jobs: usize,
	pub successful_executions: u64,
	pub failed_executions: u64,
	pub last_execution: Option<DateTime<Utc>>,
}

/// How much the dispatcher logs. Each level includes everything below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
	/// Failures only.
	#[default]
	Quiet,
	/// Failures and successes.
	Basic,
	/// Adds request headers, response bodies and error detail.
	Extended,
}

impl Verbosity {
	/// Maps a `-v` count onto a level; anything above 2 is `Extended`.
	pub fn from_level(level: u8) -> Self {
		match level {
			0 => Self::Quiet,
			1 => Self::Basic,
			_ => Self::Extended,
		}
	}

	pub fn level(self) -> u8 {
		match self {
			Self::Quiet => 0,
			Self::Basic => 1,
			Self::Extended => 2,
		}
	}

	/// Default `tracing` directive for this level when `RUST_LOG` is unset.
	pub fn log_directive(self) -> &'static str {
		match self {
			Self::Quiet => "warn",
			Self::Basic => "info",
			Self::Extended => "debug",
		}
	}
}
