// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduling and dispatch engine for vercron.
//!
//! [`CronRunner`] loads jobs through `vercron-core`, keeps one timer per job
//! while watching, and sends each firing through a [`Transport`] as an HTTP
//! GET with an optional bearer secret.
//!
//! ```no_run
//! use vercron_runner::{CronRunner, RunnerOptions};
//!
//! # async fn run() -> vercron_runner::Result<()> {
//! let mut runner = CronRunner::new(RunnerOptions::new("http://localhost:3000"))?;
//! for result in runner.execute_all().await? {
//! 	println!("{} -> {}", result.path, result.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod runner;
pub mod stats;
pub mod timers;
pub mod transport;

pub use dispatcher::{capture_body, Dispatcher, BODY_CAPTURE_LIMIT};
pub use runner::{CronRunner, RunnerOptions, CRON_SECRET_ENV};
pub use stats::StatsAggregator;
pub use timers::TimerRegistry;
pub use transport::{
	ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
	UNKNOWN_ERROR,
};
pub use vercron_core::{CronsError, DispatchResult, Job, Result, RunnerStats, Verbosity};
