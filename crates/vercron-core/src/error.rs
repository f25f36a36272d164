// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the cron runner.
//!
//! Every variant is fatal to the operation that raised it. Failures of an
//! individual dispatch are not errors; they are reported through
//! [`DispatchResult`](crate::DispatchResult).

use std::path::PathBuf;

use thiserror::Error;
use vercron_common_secret::SecretEnvError;

pub type Result<T> = std::result::Result<T, CronsError>;

#[derive(Debug, Error)]
pub enum CronsError {
	#[error("invalid base URL '{url}': {message}")]
	InvalidBaseUrl { url: String, message: String },

	#[error("config file not found: {}", .path.display())]
	ConfigNotFound { path: PathBuf },

	#[error("failed to read config file {}: {source}", .path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The message always includes the JSON parser's own message.
	#[error("failed to parse config file {}: {message}", .path.display())]
	ConfigParse { path: PathBuf, message: String },

	#[error("invalid config file {}: {message}", .path.display())]
	ConfigShape { path: PathBuf, message: String },

	#[error("no cron jobs found{}", filter_suffix(.filter))]
	NoMatchingJobs { filter: Option<String> },

	#[error("invalid schedule '{schedule}' for job {path}")]
	InvalidSchedule { path: String, schedule: String },

	#[error("job not found: {path}")]
	JobNotFound { path: String },

	#[error("invalid filter pattern '{pattern}': {message}")]
	InvalidFilter { pattern: String, message: String },

	#[error("runner is already watching; stop it before starting again")]
	AlreadyWatching,

	#[error("failed to build HTTP client: {0}")]
	HttpClient(String),

	#[error("cron secret cannot be sent in an Authorization header: {0}")]
	InvalidSecret(String),

	#[error(transparent)]
	Secret(#[from] SecretEnvError),
}

fn filter_suffix(filter: &Option<String>) -> String {
	match filter {
		Some(pattern) => format!(" matching filter '{pattern}'"),
		None => String::new(),
	}
}

impl CronsError {
	pub fn invalid_base_url(url: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidBaseUrl {
			url: url.into(),
			message: message.into(),
		}
	}

	pub fn config_shape(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
		Self::ConfigShape {
			path: path.into(),
			message: message.into(),
		}
	}
}
