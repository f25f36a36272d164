// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One outbound call per job, classified into a [`DispatchResult`].

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, error, info};
use vercron_common_secret::SecretString;
use vercron_core::{CronsError, DispatchResult, Job, Result, Verbosity};

use crate::stats::StatsAggregator;
use crate::transport::{Transport, TransportRequest, TransportResponse, UNKNOWN_ERROR};

/// Largest response body captured for extended logging, in bytes.
pub const BODY_CAPTURE_LIMIT: usize = 10 * 1024;

pub struct Dispatcher {
	transport: Arc<dyn Transport>,
	base_url: String,
	headers: HeaderMap,
	verbosity: Verbosity,
	stats: Arc<StatsAggregator>,
}

impl Dispatcher {
	/// `base_url` is used verbatim; job paths are appended without any
	/// slash normalization.
	pub fn new(
		transport: Arc<dyn Transport>,
		base_url: impl Into<String>,
		secret: Option<&SecretString>,
		verbosity: Verbosity,
		stats: Arc<StatsAggregator>,
	) -> Result<Self> {
		Ok(Self {
			transport,
			base_url: base_url.into(),
			headers: request_headers(secret)?,
			verbosity,
			stats,
		})
	}

	pub fn url_for(&self, job: &Job) -> String {
		format!("{}{}", self.base_url, job.path)
	}

	/// Never fails: transport errors and non-2xx statuses become
	/// `success: false` results. Stats are updated exactly once.
	pub async fn dispatch(&self, job: &Job) -> DispatchResult {
		let url = self.url_for(job);
		if self.verbosity >= Verbosity::Extended {
			debug!(path = %job.path, url = %url, headers = ?self.headers, "Dispatching cron job");
		}

		let timestamp = Utc::now();
		let started = Instant::now();
		let outcome = self
			.transport
			.get(TransportRequest {
				url,
				headers: self.headers.clone(),
			})
			.await;
		let duration_ms = started.elapsed().as_millis() as u64;

		let result = match outcome {
			Ok(response) => {
				let status = response.status();
				let success = status.is_success();
				if success {
					if self.verbosity >= Verbosity::Basic {
						info!(path = %job.path, status = status.as_u16(), duration_ms, "Cron job succeeded");
					}
				} else {
					error!(path = %job.path, status = status.as_u16(), duration_ms, "Cron job failed");
				}

				if self.verbosity >= Verbosity::Extended {
					let body = capture_body(response).await;
					debug!(path = %job.path, body = %body, "Cron job response body");
				}

				DispatchResult {
					path: job.path.clone(),
					schedule: job.schedule.clone(),
					success,
					status_code: Some(status.as_u16()),
					error: None,
					timestamp,
					duration_ms,
				}
			}
			Err(err) => {
				let message = err.message().unwrap_or(UNKNOWN_ERROR).to_string();
				error!(path = %job.path, error = %message, duration_ms, "Cron job request failed");
				if self.verbosity >= Verbosity::Extended {
					debug!(path = %job.path, error = ?err, "Cron job request error detail");
				}

				DispatchResult {
					path: job.path.clone(),
					schedule: job.schedule.clone(),
					success: false,
					status_code: None,
					error: Some(message),
					timestamp,
					duration_ms,
				}
			}
		};

		self.stats.record(&result);
		result
	}
}

fn request_headers(secret: Option<&SecretString>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	if let Some(secret) = secret.filter(|s| !s.is_empty()) {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", secret.expose()))
			.map_err(|e| CronsError::InvalidSecret(e.to_string()))?;
		value.set_sensitive(true);
		headers.insert(AUTHORIZATION, value);
	}

	Ok(headers)
}

/// Best-effort body text for logging. Read failures and oversized bodies
/// come back as placeholder strings. At most one chunk past
/// [`BODY_CAPTURE_LIMIT`] is read; the rest of the body is left unread.
pub async fn capture_body(mut response: Box<dyn TransportResponse>) -> String {
	if let Some(length) = response.content_length() {
		if length > BODY_CAPTURE_LIMIT as u64 {
			return format!(
				"[body not captured: content-length {length} exceeds {BODY_CAPTURE_LIMIT} bytes]"
			);
		}
	}

	let mut body = Vec::new();
	let mut truncated = false;
	loop {
		match response.chunk().await {
			Ok(Some(chunk)) => {
				body.extend_from_slice(&chunk);
				if body.len() > BODY_CAPTURE_LIMIT {
					truncated = true;
					break;
				}
			}
			Ok(None) => break,
			Err(err) => return format!("[failed to read body: {err}]"),
		}
	}

	let text = String::from_utf8_lossy(&body).into_owned();
	if truncated {
		truncate_body(text)
	} else {
		text
	}
}

fn truncate_body(text: String) -> String {
	if text.len() <= BODY_CAPTURE_LIMIT {
		return text;
	}

	let mut end = BODY_CAPTURE_LIMIT;
	while !text.is_char_boundary(end) {
		end -= 1;
	}
	format!("{}... [truncated at {BODY_CAPTURE_LIMIT} bytes]", &text[..end])
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::TransportError;
	use async_trait::async_trait;
	use reqwest::StatusCode;
	use std::collections::VecDeque;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	type Body = std::result::Result<Vec<Vec<u8>>, TransportError>;

	enum Scripted {
		Status(u16),
		StatusWithBody(u16, Option<u64>, Body),
		Fail(TransportError),
	}

	struct ScriptedResponse {
		status: StatusCode,
		content_length: Option<u64>,
		chunks: VecDeque<Vec<u8>>,
		error: Option<TransportError>,
		reads: Arc<AtomicUsize>,
	}

	impl ScriptedResponse {
		fn new(status: StatusCode, content_length: Option<u64>, body: Body) -> Self {
			let (chunks, error) = match body {
				Ok(chunks) => (chunks.into(), None),
				Err(err) => (VecDeque::new(), Some(err)),
			};
			Self {
				status,
				content_length,
				chunks,
				error,
				reads: Arc::new(AtomicUsize::new(0)),
			}
		}
	}

	#[async_trait]
	impl TransportResponse for ScriptedResponse {
		fn status(&self) -> StatusCode {
			self.status
		}

		fn content_length(&self) -> Option<u64> {
			self.content_length
		}

		async fn chunk(&mut self) -> std::result::Result<Option<Vec<u8>>, TransportError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			if let Some(err) = self.error.take() {
				return Err(err);
			}
			Ok(self.chunks.pop_front())
		}
	}

	struct ScriptedTransport {
		script: Mutex<Vec<Scripted>>,
		requests: Mutex<Vec<TransportRequest>>,
	}

	impl ScriptedTransport {
		fn new(mut script: Vec<Scripted>) -> Arc<Self> {
			script.reverse();
			Arc::new(Self {
				script: Mutex::new(script),
				requests: Mutex::new(Vec::new()),
			})
		}

		fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl Transport for ScriptedTransport {
		async fn get(
			&self,
			request: TransportRequest,
		) -> std::result::Result<Box<dyn TransportResponse>, TransportError> {
			self.requests.lock().unwrap().push(request);
			let next = self.script.lock().unwrap().pop().expect("script exhausted");
			let (status, content_length, body) = match next {
				Scripted::Status(code) => (code, None, Ok(Vec::new())),
				Scripted::StatusWithBody(code, length, body) => (code, length, body),
				Scripted::Fail(err) => return Err(err),
			};
			Ok(Box::new(ScriptedResponse::new(
				StatusCode::from_u16(status).unwrap(),
				content_length,
				body,
			)))
		}
	}

	fn dispatcher(
		transport: Arc<ScriptedTransport>,
		secret: Option<&str>,
		verbosity: Verbosity,
	) -> (Dispatcher, Arc<StatsAggregator>) {
		let stats = Arc::new(StatsAggregator::new());
		let secret = secret.map(SecretString::from);
		let dispatcher = Dispatcher::new(
			transport,
			"http://localhost:3000",
			secret.as_ref(),
			verbosity,
			Arc::clone(&stats),
		)
		.unwrap();
		(dispatcher, stats)
	}

	fn job() -> Job {
		Job::new("/api/crons/test1", "0 * * * *")
	}

	#[tokio::test]
	async fn ok_status_is_success() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(200)]);
		let (dispatcher, stats) = dispatcher(transport, None, Verbosity::Quiet);

		let result = dispatcher.dispatch(&job()).await;

		assert!(result.success);
		assert_eq!(result.status_code, Some(200));
		assert!(result.error.is_none());
		assert_eq!(result.path, "/api/crons/test1");
		assert_eq!(result.schedule, "0 * * * *");
		assert_eq!(stats.snapshot().successful_executions, 1);
	}

	#[tokio::test]
	async fn error_status_is_failure_without_message() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(404), Scripted::Status(503)]);
		let (dispatcher, stats) = dispatcher(transport, None, Verbosity::Quiet);

		for expected in [404, 503] {
			let result = dispatcher.dispatch(&job()).await;
			assert!(!result.success);
			assert_eq!(result.status_code, Some(expected));
			assert!(result.error.is_none());
		}
		assert_eq!(stats.snapshot().failed_executions, 2);
	}

	#[tokio::test]
	async fn redirect_status_is_not_success() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(304)]);
		let (dispatcher, _) = dispatcher(transport, None, Verbosity::Quiet);

		assert!(!dispatcher.dispatch(&job()).await.success);
	}

	#[tokio::test]
	async fn transport_error_records_message_and_no_status() {
		let transport = ScriptedTransport::new(vec![
			Scripted::Fail(TransportError::new("connection refused")),
			Scripted::Fail(TransportError::unknown()),
		]);
		let (dispatcher, stats) = dispatcher(transport, None, Verbosity::Quiet);

		let first = dispatcher.dispatch(&job()).await;
		assert!(!first.success);
		assert!(first.status_code.is_none());
		assert_eq!(first.error.as_deref(), Some("connection refused"));

		let second = dispatcher.dispatch(&job()).await;
		assert_eq!(second.error.as_deref(), Some(UNKNOWN_ERROR));

		let snapshot = stats.snapshot();
		assert_eq!(snapshot.failed_executions, 2);
		assert!(snapshot.last_execution.is_some());
	}

	#[tokio::test]
	async fn url_is_concatenated_verbatim() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(200)]);
		let stats = Arc::new(StatsAggregator::new());
		let dispatcher = Dispatcher::new(
			transport.clone(),
			"http://localhost:3000/",
			None,
			Verbosity::Quiet,
			stats,
		)
		.unwrap();

		dispatcher.dispatch(&job()).await;

		assert_eq!(transport.requests()[0].url, "http://localhost:3000//api/crons/test1");
	}

	#[tokio::test]
	async fn headers_without_secret() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(200)]);
		let (dispatcher, _) = dispatcher(transport.clone(), None, Verbosity::Quiet);

		dispatcher.dispatch(&job()).await;

		let headers = &transport.requests()[0].headers;
		assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
		assert!(headers.get(AUTHORIZATION).is_none());
	}

	#[tokio::test]
	async fn headers_with_secret() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(200)]);
		let (dispatcher, _) = dispatcher(transport.clone(), Some("abc"), Verbosity::Quiet);

		dispatcher.dispatch(&job()).await;

		let headers = &transport.requests()[0].headers;
		assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
		assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
	}

	#[tokio::test]
	async fn empty_secret_sends_no_authorization() {
		let transport = ScriptedTransport::new(vec![Scripted::Status(200)]);
		let (dispatcher, _) = dispatcher(transport.clone(), Some(""), Verbosity::Quiet);

		dispatcher.dispatch(&job()).await;

		assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
	}

	#[test]
	fn secret_with_newline_is_rejected() {
		let secret = SecretString::from("abc\ndef");
		assert!(matches!(
			request_headers(Some(&secret)),
			Err(CronsError::InvalidSecret(_))
		));
	}

	#[tokio::test]
	async fn body_capture_never_changes_classification() {
		let transport = ScriptedTransport::new(vec![
			Scripted::StatusWithBody(200, None, Err(TransportError::new("stream reset"))),
			Scripted::StatusWithBody(500, Some(1 << 20), Ok(Vec::new())),
		]);
		let (dispatcher, stats) = dispatcher(transport, None, Verbosity::Extended);

		let first = dispatcher.dispatch(&job()).await;
		assert!(first.success);
		assert_eq!(first.status_code, Some(200));

		let second = dispatcher.dispatch(&job()).await;
		assert!(!second.success);
		assert_eq!(second.status_code, Some(500));
		assert!(second.error.is_none());

		let snapshot = stats.snapshot();
		assert_eq!(snapshot.successful_executions, 1);
		assert_eq!(snapshot.failed_executions, 1);
	}

	fn response(content_length: Option<u64>, body: Body) -> ScriptedResponse {
		ScriptedResponse::new(StatusCode::OK, content_length, body)
	}

	fn text(body: &str) -> Body {
		Ok(vec![body.as_bytes().to_vec()])
	}

	#[tokio::test]
	async fn capture_skips_declared_oversized_body() {
		let response = response(Some(20_000), text("ignored"));
		let reads = Arc::clone(&response.reads);

		let captured = capture_body(Box::new(response)).await;

		assert!(captured.contains("20000"));
		assert!(!captured.contains("ignored"));
		assert_eq!(reads.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn capture_stops_reading_undeclared_body_at_limit() {
		let chunks = vec![b"x".repeat(1024); 100];
		let response = response(None, Ok(chunks));
		let reads = Arc::clone(&response.reads);

		let captured = capture_body(Box::new(response)).await;

		assert!(captured.starts_with(&"x".repeat(BODY_CAPTURE_LIMIT)));
		assert!(captured.ends_with(&format!("[truncated at {BODY_CAPTURE_LIMIT} bytes]")));
		assert_eq!(reads.load(Ordering::SeqCst), BODY_CAPTURE_LIMIT / 1024 + 1);
	}

	#[tokio::test]
	async fn capture_keeps_body_split_across_chunks() {
		let chunks = vec![b"{\"ok\"".to_vec(), b":1}".to_vec()];
		let captured = capture_body(Box::new(response(None, Ok(chunks)))).await;
		assert_eq!(captured, "{\"ok\":1}");
	}

	#[tokio::test]
	async fn capture_keeps_short_body() {
		let captured = capture_body(Box::new(response(Some(8), text("{\"ok\":1}")))).await;
		assert_eq!(captured, "{\"ok\":1}");
	}

	#[tokio::test]
	async fn capture_reports_read_errors() {
		let body = Err(TransportError::new("stream reset"));
		let captured = capture_body(Box::new(response(None, body))).await;
		assert_eq!(captured, "[failed to read body: stream reset]");
	}

	#[test]
	fn truncation_respects_char_boundaries() {
		let text = format!("{}é", "a".repeat(BODY_CAPTURE_LIMIT - 1));
		let truncated = truncate_body(text);
		assert!(truncated.starts_with(&"a".repeat(BODY_CAPTURE_LIMIT - 1)));
		assert!(truncated.contains("[truncated"));
	}
}
