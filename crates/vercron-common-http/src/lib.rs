// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction for vercron.
//!
//! Every outbound dispatch goes through a client built here so the
//! User-Agent is consistent and identifies the runner to the target app.

mod client;

pub use client::{builder, new_client, new_client_with_timeout, user_agent};
