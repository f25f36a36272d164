// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading the job list from a `vercel.json`-style file.
//!
//! Nothing is cached here: every [`ConfigStore::load`] re-reads the file so
//! edits take effect on the next operation.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CronsError, Result};
use crate::types::{Job, JobConfig};

pub const DEFAULT_CONFIG_PATH: &str = "vercel.json";

#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: PathBuf,
}

impl ConfigStore {
	/// `None` falls back to `./vercel.json`. Relative paths are resolved
	/// against the working directory at load time.
	pub fn new(path: Option<PathBuf>) -> Self {
		Self {
			path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
		}
	}

	/// The path as configured, before resolution.
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn resolved_path(&self) -> Result<PathBuf> {
		if self.path.is_absolute() {
			return Ok(self.path.clone());
		}
		let cwd = std::env::current_dir().map_err(|source| CronsError::ConfigRead {
			path: self.path.clone(),
			source,
		})?;
		Ok(cwd.join(&self.path))
	}

	pub fn load(&self) -> Result<JobConfig> {
		let path = self.resolved_path()?;
		if !path.exists() {
			return Err(CronsError::ConfigNotFound { path });
		}

		let text = std::fs::read_to_string(&path).map_err(|source| CronsError::ConfigRead {
			path: path.clone(),
			source,
		})?;

		let config = parse_config(&path, &text)?;
		debug!(path = %path.display(), jobs = config.crons.len(), "Loaded cron config");
		Ok(config)
	}
}

/// Parse config text. `path` is only used for error messages.
pub fn parse_config(path: &Path, text: &str) -> Result<JobConfig> {
	let value: Value = serde_json::from_str(text).map_err(|e| CronsError::ConfigParse {
		path: path.to_path_buf(),
		message: e.to_string(),
	})?;

	let entries = value
		.get("crons")
		.and_then(Value::as_array)
		.ok_or_else(|| CronsError::config_shape(path, "missing crons array"))?;

	let crons = entries
		.iter()
		.enumerate()
		.map(|(index, entry)| {
			Job::deserialize(entry)
				.map_err(|e| CronsError::config_shape(path, format!("crons[{index}]: {e}")))
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(JobConfig { crons })
}
