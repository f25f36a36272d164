// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One periodic timer task per watched job, keyed by job path.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vercron_core::schedule::{self, CronSchedule};
use vercron_core::Job;

#[derive(Default)]
pub struct TimerRegistry {
	timers: HashMap<String, JoinHandle<()>>,
}

impl TimerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Spawns a timer that runs `on_fire` each time `schedule` matures.
	///
	/// Each firing is spawned as its own task, so a slow callback never delays
	/// the next tick or any other timer. Registering a path that already has a
	/// timer replaces it. Must be called from within a Tokio runtime.
	pub fn register<F, Fut>(&mut self, job: &Job, schedule: CronSchedule, on_fire: F)
	where
		F: Fn() -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let handle = tokio::spawn(run_timer(job.path.clone(), schedule, on_fire));
		if let Some(previous) = self.timers.insert(job.path.clone(), handle) {
			warn!(path = %job.path, "Replacing existing timer for cron job");
			previous.abort();
		}
	}

	/// Stops every timer and empties the registry. Callbacks already spawned
	/// by earlier firings are left to finish. Returns how many timers were
	/// stopped.
	pub fn stop_all(&mut self) -> usize {
		let count = self.timers.len();
		for (path, handle) in self.timers.drain() {
			debug!(path = %path, "Stopping cron timer");
			handle.abort();
		}
		count
	}

	pub fn len(&self) -> usize {
		self.timers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.timers.is_empty()
	}

	pub fn contains(&self, path: &str) -> bool {
		self.timers.contains_key(path)
	}
}

impl Drop for TimerRegistry {
	fn drop(&mut self) {
		for handle in self.timers.values() {
			handle.abort();
		}
	}
}

async fn run_timer<F, Fut>(path: String, schedule: CronSchedule, on_fire: F)
where
	F: Fn() -> Fut + Send + 'static,
	Fut: Future<Output = ()> + Send + 'static,
{
	// The cursor only moves forward, so an early wake-up can't fire the same
	// instant twice, and a late one skips instants already in the past.
	let mut cursor = Utc::now();
	loop {
		let Some(next) = schedule::next_after(&schedule, cursor) else {
			warn!(path = %path, "Schedule has no future fire times; timer stopped");
			return;
		};

		let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
		tokio::time::sleep(wait).await;

		cursor = next.max(Utc::now());
		debug!(path = %path, scheduled_for = %next, "Cron timer fired");
		tokio::spawn(on_fire());
	}
}
