// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wildcard filtering of jobs by path.
//!
//! A pattern is matched against the whole path. `*` matches any run of
//! characters, path separators included. Only `*` is rewritten: every other
//! character goes to the regex engine untouched, so `.` matches any single
//! character and an unbalanced `(` is rejected as an invalid pattern.

use regex::Regex;

use crate::error::{CronsError, Result};
use crate::types::Job;

#[derive(Debug, Clone, Default)]
pub struct PathFilter {
	pattern: Option<String>,
	matcher: Option<Regex>,
}

impl PathFilter {
	/// An empty pattern is the same as no pattern.
	pub fn new(pattern: Option<&str>) -> Result<Self> {
		let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
			return Ok(Self::default());
		};

		let matcher = Regex::new(&to_regex(pattern)).map_err(|e| CronsError::InvalidFilter {
			pattern: pattern.to_string(),
			message: e.to_string(),
		})?;

		Ok(Self {
			pattern: Some(pattern.to_string()),
			matcher: Some(matcher),
		})
	}

	pub fn pattern(&self) -> Option<&str> {
		self.pattern.as_deref()
	}

	pub fn matches(&self, path: &str) -> bool {
		match &self.matcher {
			Some(matcher) => matcher.is_match(path),
			None => true,
		}
	}

	/// Keeps matching jobs in their original order.
	pub fn apply(&self, jobs: Vec<Job>) -> Vec<Job> {
		if self.matcher.is_none() {
			return jobs;
		}
		jobs.into_iter().filter(|job| self.matches(&job.path)).collect()
	}
}

fn to_regex(pattern: &str) -> String {
	format!("^{}$", pattern.replace('*', ".*"))
}
