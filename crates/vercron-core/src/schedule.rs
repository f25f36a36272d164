// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schedule validation and next fire calculation.
//!
//! Jobs use the standard 5-field Unix format:
//! minute hour day-of-month month day-of-week
//!
//! The `cron` crate expects a leading seconds field, an optional trailing
//! year, and numbers weekdays 1-7 starting on Sunday. Expressions are
//! rewritten into that dialect before parsing; numeric weekdays become names
//! so that `0` and `7` both mean Sunday as they do in Unix cron.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::{CronsError, Result};
use crate::types::Job;

pub type CronSchedule = Schedule;

const FIELD_COUNT: usize = 5;
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Parse a 5-field expression. Anything with a different field count is
/// rejected.
pub fn parse(expression: &str) -> std::result::Result<CronSchedule, String> {
	let converted = convert_to_cron_crate_format(expression).ok_or_else(|| {
		format!(
			"expected {FIELD_COUNT} fields, found {}",
			expression.split_whitespace().count()
		)
	})?;
	Schedule::from_str(&converted).map_err(|e| e.to_string())
}

pub fn is_valid(expression: &str) -> bool {
	parse(expression).is_ok()
}

/// Parse every job's schedule, stopping at the first invalid one.
///
/// Either all jobs come back paired with their parsed schedule or none do.
pub fn parse_all(jobs: &[Job]) -> Result<Vec<(Job, CronSchedule)>> {
	jobs.iter()
		.map(|job| {
			parse(&job.schedule)
				.map(|schedule| (job.clone(), schedule))
				.map_err(|_| CronsError::InvalidSchedule {
					path: job.path.clone(),
					schedule: job.schedule.clone(),
				})
		})
		.collect()
}

/// First fire instant strictly after `after`.
pub fn next_after(schedule: &CronSchedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
	schedule.after(&after).next()
}

fn convert_to_cron_crate_format(expression: &str) -> Option<String> {
	let fields: Vec<&str> = expression.split_whitespace().collect();
	if fields.len() != FIELD_COUNT {
		return None;
	}

	Some(format!(
		"0 {} {} {} {} {} *",
		fields[0],
		fields[1],
		fields[2],
		fields[3],
		convert_day_of_week(fields[4])
	))
}

fn convert_day_of_week(field: &str) -> String {
	field
		.split(',')
		.map(convert_day_of_week_item)
		.collect::<Vec<_>>()
		.join(",")
}

fn convert_day_of_week_item(item: &str) -> String {
	let (range, step) = match item.split_once('/') {
		Some((range, step)) => (range, Some(step)),
		None => (item, None),
	};
	let with_step = |range: String| match step {
		Some(step) => format!("{range}/{step}"),
		None => range,
	};

	let Some((start, end)) = range.split_once('-') else {
		return with_step(weekday_name(range));
	};

	match (weekday_number(start), weekday_number(end)) {
		// 0-7 covers the whole week.
		(Some(0), Some(7)) => with_step("SUN-SAT".to_string()),
		// 7-7 is Sunday alone. A step on a single day can only ever land on
		// that day, and the cron crate would read `SUN/n` as open-ended.
		(Some(7), Some(7)) => match step.map(str::parse::<u8>) {
			Some(Ok(0)) | Some(Err(_)) => with_step("SUN".to_string()),
			_ => "SUN".to_string(),
		},
		// A range ending on 7 wraps past Saturday; split off Sunday and keep it
		// only if the step lands on it.
		(Some(first), Some(7)) => {
			let head = with_step(format!("{}-SAT", WEEKDAY_NAMES[first as usize]));
			let step_hits_sunday = match step.map(str::parse::<u8>) {
				Some(Ok(step)) if step > 0 => (7 - first) % step == 0,
				Some(_) => false,
				None => true,
			};
			if step_hits_sunday {
				format!("{head},SUN")
			} else {
				head
			}
		}
		_ => with_step(format!("{}-{}", weekday_name(start), weekday_name(end))),
	}
}

fn weekday_number(token: &str) -> Option<u8> {
	token.parse::<u8>().ok().filter(|n| *n <= 7)
}

/// Numeric 0-7 become names; anything else (`*`, `MON`, out-of-range
/// numbers) is passed through for the parser to judge.
fn weekday_name(token: &str) -> String {
	match weekday_number(token) {
		Some(n) => WEEKDAY_NAMES[(n % 7) as usize].to_string(),
		None => token.to_string(),
	}
}
