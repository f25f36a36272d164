// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The engine callers drive: watch mode, one-shot execution and read views.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};
use url::Url;
use vercron_common_secret::{load_secret_env, SecretString};
use vercron_core::{
	schedule, ConfigStore, CronsError, DispatchResult, Job, JobConfig, PathFilter, Result,
	RunnerStats, Verbosity,
};

use crate::dispatcher::Dispatcher;
use crate::stats::StatsAggregator;
use crate::timers::TimerRegistry;
use crate::transport::{ReqwestTransport, Transport};

/// Environment variable consulted when no secret is passed explicitly.
pub const CRON_SECRET_ENV: &str = "CRON_SECRET";

#[derive(Debug, Clone)]
pub struct RunnerOptions {
	/// Prefix for every job path. Must parse as a URL.
	pub base_url: String,
	pub cron_secret: Option<SecretString>,
	/// Variable (and its `_FILE` twin) read once at construction when
	/// `cron_secret` is unset. `None` disables the fallback.
	pub secret_env_var: Option<String>,
	/// Defaults to `./vercel.json`.
	pub config_path: Option<PathBuf>,
	pub verbosity: Verbosity,
	pub filter: Option<String>,
	/// Whole-request timeout applied by the default transport.
	pub request_timeout: Option<Duration>,
}

impl RunnerOptions {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			cron_secret: None,
			secret_env_var: Some(CRON_SECRET_ENV.to_string()),
			config_path: None,
			verbosity: Verbosity::default(),
			filter: None,
			request_timeout: None,
		}
	}

	pub fn cron_secret(mut self, secret: impl Into<SecretString>) -> Self {
		self.cron_secret = Some(secret.into());
		self
	}

	pub fn secret_env_var(mut self, var: Option<String>) -> Self {
		self.secret_env_var = var;
		self
	}

	pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.config_path = Some(path.into());
		self
	}

	pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
		self.verbosity = verbosity;
		self
	}

	pub fn filter(mut self, pattern: impl Into<String>) -> Self {
		self.filter = Some(pattern.into());
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}
}

/// Runs the jobs declared in a config file against a base URL.
///
/// Idle until [`start`](Self::start) registers timers; [`stop`](Self::stop)
/// returns it to idle. One-shot execution works in either state. Every
/// operation except [`list_jobs`](Self::list_jobs) re-reads the config file.
pub struct CronRunner {
	store: ConfigStore,
	filter: PathFilter,
	dispatcher: Arc<Dispatcher>,
	stats: Arc<StatsAggregator>,
	timers: TimerRegistry,
	config: Option<JobConfig>,
	verbosity: Verbosity,
}

impl CronRunner {
	/// Uses the shared reqwest client.
	pub fn new(options: RunnerOptions) -> Result<Self> {
		let transport = match options.request_timeout {
			Some(timeout) => ReqwestTransport::with_timeout(timeout),
			None => ReqwestTransport::new(),
		}
		.map_err(|e| CronsError::HttpClient(e.to_string()))?;

		Self::with_transport(options, Arc::new(transport))
	}

	pub fn with_transport(options: RunnerOptions, transport: Arc<dyn Transport>) -> Result<Self> {
		Url::parse(&options.base_url)
			.map_err(|e| CronsError::invalid_base_url(&options.base_url, e.to_string()))?;

		let secret = match options.cron_secret {
			Some(secret) => Some(secret),
			None => match options.secret_env_var.as_deref() {
				Some(var) => load_secret_env(var)?,
				None => None,
			},
		}
		.and_then(SecretString::non_empty);

		let filter = PathFilter::new(options.filter.as_deref())?;
		let stats = Arc::new(StatsAggregator::new());
		let dispatcher = Dispatcher::new(
			transport,
			options.base_url.clone(),
			secret.as_ref(),
			options.verbosity,
			Arc::clone(&stats),
		)?;

		info!(
			base_url = %options.base_url,
			authenticated = secret.is_some(),
			filter = ?filter.pattern(),
			"Cron runner initialized"
		);

		Ok(Self {
			store: ConfigStore::new(options.config_path),
			filter,
			dispatcher: Arc::new(dispatcher),
			stats,
			timers: TimerRegistry::new(),
			config: None,
			verbosity: options.verbosity,
		})
	}

	/// Enters watch mode: one timer per filtered job.
	///
	/// Every schedule is validated before any timer is registered, so an
	/// invalid schedule leaves the runner idle. Returns the number of timers.
	/// Must be called from within a Tokio runtime.
	#[instrument(skip(self))]
	pub fn start(&mut self) -> Result<usize> {
		if self.is_watching() {
			return Err(CronsError::AlreadyWatching);
		}

		let jobs = self.load_filtered_jobs()?;
		let scheduled = schedule::parse_all(&jobs)?;

		for (job, cron_schedule) in scheduled {
			let dispatcher = Arc::clone(&self.dispatcher);
			let fired = job.clone();
			self.timers.register(&job, cron_schedule, move || {
				let dispatcher = Arc::clone(&dispatcher);
				let job = fired.clone();
				async move {
					dispatcher.dispatch(&job).await;
				}
			});

			if self.verbosity >= Verbosity::Basic {
				info!(path = %job.path, schedule = %job.schedule, "Scheduled cron job");
			}
		}

		self.stats.set_total_jobs(jobs.len());
		info!(count = self.timers.len(), "Watching cron jobs");
		Ok(self.timers.len())
	}

	/// Leaves watch mode. Safe to call when idle. Stats are kept.
	pub fn stop(&mut self) -> usize {
		let stopped = self.timers.stop_all();
		if stopped > 0 {
			info!(count = stopped, "Stopped cron timers");
		}
		stopped
	}

	/// Dispatches every filtered job once, in config order.
	#[instrument(skip(self))]
	pub async fn execute_all(&mut self) -> Result<Vec<DispatchResult>> {
		let jobs = self.load_filtered_jobs()?;

		let mut results = Vec::with_capacity(jobs.len());
		for job in &jobs {
			results.push(self.dispatcher.dispatch(job).await);
		}
		Ok(results)
	}

	/// Dispatches the job with exactly this path. The filter does not apply.
	#[instrument(skip(self))]
	pub async fn execute_one(&mut self, path: &str) -> Result<DispatchResult> {
		let config = self.reload()?;
		let job = config
			.find(path)
			.cloned()
			.ok_or_else(|| CronsError::JobNotFound {
				path: path.to_string(),
			})?;

		Ok(self.dispatcher.dispatch(&job).await)
	}

	/// Filtered job list. Reuses the last loaded config if there is one.
	pub fn list_jobs(&mut self) -> Result<Vec<Job>> {
		let config = match &self.config {
			Some(config) => config.clone(),
			None => self.reload()?,
		};
		Ok(self.filter.apply(config.crons))
	}

	pub fn stats(&self) -> RunnerStats {
		self.stats.snapshot()
	}

	pub fn is_watching(&self) -> bool {
		!self.timers.is_empty()
	}

	pub fn active_timers(&self) -> usize {
		self.timers.len()
	}

	pub fn filter_pattern(&self) -> Option<&str> {
		self.filter.pattern()
	}

	fn reload(&mut self) -> Result<JobConfig> {
		let config = self.store.load()?;
		self.config = Some(config.clone());
		Ok(config)
	}

	fn load_filtered_jobs(&mut self) -> Result<Vec<Job>> {
		let config = self.reload()?;
		let jobs = self.filter.apply(config.crons);
		if jobs.is_empty() {
			return Err(CronsError::NoMatchingJobs {
				filter: self.filter.pattern().map(str::to_string),
			});
		}
		Ok(jobs)
	}
}
