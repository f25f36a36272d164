// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a client with the standard vercron User-Agent and no request
/// timeout beyond the transport defaults.
pub fn new_client() -> reqwest::Result<Client> {
	builder().build()
}

/// Creates a client with the standard User-Agent and a whole-request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Client builder preloaded with the vercron User-Agent.
///
/// # Example
/// ```ignore
/// let client = vercron_common_http::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Format: `vercron/{version}`
pub fn user_agent() -> String {
	format!("vercron/{}", env!("CARGO_PKG_VERSION"))
}
