// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide dispatch counters.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use vercron_core::{DispatchResult, RunnerStats};

const NEVER: i64 = i64::MIN;

/// Lock-free counters shared by every dispatch. Concurrent timer firings
/// update it without losing increments.
#[derive(Debug)]
pub struct StatsAggregator {
	total_jobs: AtomicUsize,
	successful: AtomicU64,
	failed: AtomicU64,
	/// Milliseconds since the epoch, or `NEVER`.
	last_execution_ms: AtomicI64,
}

impl StatsAggregator {
	pub fn new() -> Self {
		Self {
			total_jobs: AtomicUsize::new(0),
			successful: AtomicU64::new(0),
			failed: AtomicU64::new(0),
			last_execution_ms: AtomicI64::new(NEVER),
		}
	}

	pub fn record(&self, result: &DispatchResult) {
		if result.success {
			self.successful.fetch_add(1, Ordering::SeqCst);
		} else {
			self.failed.fetch_add(1, Ordering::SeqCst);
		}
		self.last_execution_ms
			.fetch_max(Utc::now().timestamp_millis(), Ordering::SeqCst);
	}

	pub fn set_total_jobs(&self, total: usize) {
		self.total_jobs.store(total, Ordering::SeqCst);
	}

	pub fn snapshot(&self) -> RunnerStats {
		let last = self.last_execution_ms.load(Ordering::SeqCst);
		RunnerStats {
			total_jobs: self.total_jobs.load(Ordering::SeqCst),
			successful_executions: self.successful.load(Ordering::SeqCst),
			failed_executions: self.failed.load(Ordering::SeqCst),
			last_execution: (last != NEVER)
				.then(|| DateTime::from_timestamp_millis(last))
				.flatten(),
		}
	}
}

impl Default for StatsAggregator {
	fn default() -> Self {
		Self::new()
	}
}
