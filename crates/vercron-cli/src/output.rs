// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use vercron_core::{DispatchResult, Job, RunnerStats};

pub fn print_results(results: &[DispatchResult], json: bool) -> serde_json::Result<()> {
	if json {
		return print_json(&results);
	}

	for result in results {
		println!("{}", format_result(result));
	}
	println!("{}", format_summary(results));
	Ok(())
}

pub fn print_jobs(jobs: &[Job], json: bool) -> serde_json::Result<()> {
	if json {
		return print_json(&jobs);
	}

	if jobs.is_empty() {
		println!("No cron jobs found.");
		return Ok(());
	}
	let width = jobs.iter().map(|j| j.path.len()).max().unwrap_or(0);
	for job in jobs {
		println!("{:<width$}  {}", job.path, job.schedule);
	}
	Ok(())
}

pub fn print_stats(stats: &RunnerStats, json: bool) -> serde_json::Result<()> {
	if json {
		return print_json(stats);
	}

	println!("{}", format_stats(stats));
	Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

fn format_result(result: &DispatchResult) -> String {
	let mark = if result.success { '✓' } else { '✗' };
	let outcome = match (&result.status_code, &result.error) {
		(Some(status), _) => status.to_string(),
		(None, Some(error)) => error.clone(),
		(None, None) => "no response".to_string(),
	};
	format!("{mark} {} {outcome} ({}ms)", result.path, result.duration_ms)
}

fn format_summary(results: &[DispatchResult]) -> String {
	let succeeded = results.iter().filter(|r| r.success).count();
	format!(
		"{succeeded}/{} succeeded, {} failed",
		results.len(),
		results.len() - succeeded
	)
}

fn format_stats(stats: &RunnerStats) -> String {
	let last = stats
		.last_execution
		.map(|t| t.to_rfc3339())
		.unwrap_or_else(|| "never".to_string());
	format!(
		"Jobs: {}, succeeded: {}, failed: {}, last run: {last}",
		stats.total_jobs, stats.successful_executions, stats.failed_executions
	)
}
