// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `vercron` binary: runs the cron jobs declared in a `vercel.json` against a
//! local server.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vercron_core::Verbosity;
use vercron_runner::{CronRunner, RunnerOptions};

/// Run vercel.json cron jobs locally
#[derive(Parser, Debug)]
#[command(name = "vercron", version)]
struct Args {
	/// Base URL the job paths are appended to, e.g. http://localhost:3000
	#[arg(long, env = "VERCRON_URL")]
	url: String,

	/// Sent as `Authorization: Bearer <secret>` [default: $CRON_SECRET_FILE or $CRON_SECRET]
	#[arg(long)]
	secret: Option<String>,

	/// Path to the config file
	#[arg(long, env = "VERCRON_CONFIG", default_value = vercron_core::DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	/// Only run jobs whose path matches this pattern (`*` matches anything)
	#[arg(long)]
	filter: Option<String>,

	/// Increase log detail (-v successes, -vv headers and bodies)
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,

	/// Give up on a request after this many seconds
	#[arg(long)]
	timeout_secs: Option<u64>,

	/// Print results as JSON
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Fire jobs on their schedules until interrupted
	Watch,
	/// Run every job once
	RunAll,
	/// Run the job with this exact path once
	Run {
		/// Job path, e.g. /api/crons/cleanup
		path: String,
	},
	/// List configured jobs
	List,
}

impl Args {
	fn verbosity(&self) -> Verbosity {
		Verbosity::from_level(self.verbose)
	}

	fn runner_options(&self) -> RunnerOptions {
		let mut options = RunnerOptions::new(&self.url)
			.config_path(&self.config)
			.verbosity(self.verbosity());
		if let Some(secret) = &self.secret {
			options = options.cron_secret(secret.as_str());
		}
		if let Some(filter) = &self.filter {
			options = options.filter(filter);
		}
		if let Some(secs) = self.timeout_secs {
			options = options.request_timeout(Duration::from_secs(secs));
		}
		options
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(args.verbosity().log_directive())),
		)
		.with_writer(std::io::stderr)
		.init();

	match run(args).await {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(e) => {
			eprintln!("Error: {e:#}");
			ExitCode::FAILURE
		}
	}
}

/// Returns whether every dispatched job succeeded.
async fn run(args: Args) -> anyhow::Result<bool> {
	let mut runner =
		CronRunner::new(args.runner_options()).context("failed to initialize cron runner")?;

	match args.command {
		Command::Watch => {
			let count = runner.start()?;
			if !args.json {
				println!("Watching {count} cron job(s). Press Ctrl-C to stop.");
			}

			shutdown_signal().await;
			info!("Received shutdown signal");
			runner.stop();

			output::print_stats(&runner.stats(), args.json)?;
			Ok(true)
		}
		Command::RunAll => {
			let results = runner.execute_all().await?;
			output::print_results(&results, args.json)?;
			Ok(results.iter().all(|r| r.success))
		}
		Command::Run { path } => {
			let result = runner.execute_one(&path).await?;
			let success = result.success;
			output::print_results(std::slice::from_ref(&result), args.json)?;
			Ok(success)
		}
		Command::List => {
			let jobs = runner.list_jobs()?;
			output::print_jobs(&jobs, args.json)?;
			Ok(true)
		}
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "Failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}
}
