// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seam between the dispatcher and the network.
//!
//! [`ReqwestTransport`] is what runs in production. Tests swap in their own
//! [`Transport`] to script responses and failures.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Reported when a failure carries no message of its own.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone)]
pub struct TransportRequest {
	pub url: String,
	pub headers: HeaderMap,
}

/// A request that produced no HTTP response, or a body that could not be
/// read.
#[derive(Debug, Clone, Error)]
#[error("{}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
pub struct TransportError {
	message: Option<String>,
}

impl TransportError {
	/// An empty message is stored as no message.
	pub fn new(message: impl Into<String>) -> Self {
		let message = message.into();
		Self {
			message: (!message.is_empty()).then_some(message),
		}
	}

	pub fn unknown() -> Self {
		Self { message: None }
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}
}

impl From<reqwest::Error> for TransportError {
	fn from(err: reqwest::Error) -> Self {
		Self::new(error_chain(&err))
	}
}

/// reqwest's top-level message hides the cause ("connection refused", DNS
/// failures), so walk the source chain.
fn error_chain(err: &dyn StdError) -> String {
	let mut message = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		let cause_message = cause.to_string();
		if !message.contains(&cause_message) {
			message.push_str(": ");
			message.push_str(&cause_message);
		}
		source = cause.source();
	}
	message
}

#[async_trait]
pub trait TransportResponse: Send {
	fn status(&self) -> StatusCode;

	/// Declared body length, when the server sent one.
	fn content_length(&self) -> Option<u64>;

	/// Next piece of the body, or `None` once it is exhausted. Callers that
	/// stop early never pull the rest off the wire.
	async fn chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

#[async_trait]
pub trait Transport: Send + Sync {
	async fn get(&self, request: TransportRequest)
		-> Result<Box<dyn TransportResponse>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub fn new() -> reqwest::Result<Self> {
		Ok(Self::from_client(vercron_common_http::new_client()?))
	}

	pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
		Ok(Self::from_client(
			vercron_common_http::new_client_with_timeout(timeout)?,
		))
	}

	pub fn from_client(client: Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn get(
		&self,
		request: TransportRequest,
	) -> Result<Box<dyn TransportResponse>, TransportError> {
		let response = self
			.client
			.get(&request.url)
			.headers(request.headers)
			.send()
			.await?;
		Ok(Box::new(ReqwestResponse(response)))
	}
}

struct ReqwestResponse(reqwest::Response);

#[async_trait]
impl TransportResponse for ReqwestResponse {
	fn status(&self) -> StatusCode {
		self.0.status()
	}

	fn content_length(&self) -> Option<u64> {
		self.0.content_length()
	}

	async fn chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
		Ok(self.0.chunk().await?.map(|bytes| bytes.to_vec()))
	}
}
