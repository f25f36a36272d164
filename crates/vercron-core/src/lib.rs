// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for vercron, a local runner for `vercel.json` cron jobs.
//!
//! This crate covers everything that happens before a request goes out:
//! - [`ConfigStore`]: loading and shape-checking the job list
//! - [`PathFilter`]: wildcard selection of jobs by path
//! - [`schedule`]: 5-field cron validation and next fire calculation
//! - The shared data model ([`Job`], [`DispatchResult`], [`RunnerStats`])
//!   and error taxonomy ([`CronsError`])

pub mod config;
pub mod error;
pub mod filter;
pub mod schedule;
pub mod types;

pub use config::{parse_config, ConfigStore, DEFAULT_CONFIG_PATH};
pub use error::{CronsError, Result};
pub use filter::PathFilter;
pub use schedule::CronSchedule;
pub use types::{DispatchResult, Job, JobConfig, RunnerStats, Verbosity};
