// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end dispatch over real HTTP against a wiremock server.

use std::time::Duration;

use tempfile::TempDir;
use vercron_runner::{CronRunner, RunnerOptions, Verbosity};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &TempDir) -> std::path::PathBuf {
	let config = dir.path().join("vercel.json");
	std::fs::write(
		&config,
		r#"{"crons": [
			{ "path": "/api/crons/test1", "schedule": "0 * * * *" },
			{ "path": "/api/crons/broken", "schedule": "*/5 * * * *" }
		]}"#,
	)
	.unwrap();
	config
}

async fn mock_server() -> MockServer {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/api/crons/test1"))
		.respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/api/crons/broken"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;
	server
}

#[tokio::test]
async fn sends_bearer_secret_when_configured() {
	let server = mock_server().await;
	let dir = TempDir::new().unwrap();
	let mut runner = CronRunner::new(
		RunnerOptions::new(server.uri())
			.secret_env_var(None)
			.cron_secret("abc")
			.config_path(write_config(&dir)),
	)
	.unwrap();

	let result = runner.execute_one("/api/crons/test1").await.unwrap();
	assert!(result.success);
	assert_eq!(result.status_code, Some(200));

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests.len(), 1);
	let headers = &requests[0].headers;
	assert_eq!(
		headers.get("authorization").unwrap().to_str().unwrap(),
		"Bearer abc"
	);
	assert_eq!(
		headers.get("content-type").unwrap().to_str().unwrap(),
		"application/json"
	);
	assert!(headers
		.get("user-agent")
		.unwrap()
		.to_str()
		.unwrap()
		.starts_with("vercron/"));
}

#[tokio::test]
async fn omits_authorization_without_secret() {
	let server = mock_server().await;
	let dir = TempDir::new().unwrap();
	let mut runner = CronRunner::new(
		RunnerOptions::new(server.uri())
			.secret_env_var(None)
			.config_path(write_config(&dir)),
	)
	.unwrap();

	runner.execute_one("/api/crons/test1").await.unwrap();

	let requests = server.received_requests().await.unwrap();
	assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn classifies_server_errors_with_extended_logging() {
	let server = mock_server().await;
	let dir = TempDir::new().unwrap();
	let mut runner = CronRunner::new(
		RunnerOptions::new(server.uri())
			.secret_env_var(None)
			.verbosity(Verbosity::Extended)
			.config_path(write_config(&dir)),
	)
	.unwrap();

	let results = runner.execute_all().await.unwrap();

	assert_eq!(results.len(), 2);
	assert!(results[0].success);
	assert!(!results[1].success);
	assert_eq!(results[1].status_code, Some(500));
	assert!(results[1].error.is_none());

	let stats = runner.stats();
	assert_eq!(stats.successful_executions, 1);
	assert_eq!(stats.failed_executions, 1);
}

#[tokio::test]
async fn slow_endpoint_times_out_as_failure() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
		.mount(&server)
		.await;
	let dir = TempDir::new().unwrap();
	let mut runner = CronRunner::new(
		RunnerOptions::new(server.uri())
			.secret_env_var(None)
			.request_timeout(Duration::from_millis(200))
			.config_path(write_config(&dir)),
	)
	.unwrap();

	let result = runner.execute_one("/api/crons/test1").await.unwrap();

	assert!(!result.success);
	assert!(result.status_code.is_none());
	assert!(result.error.is_some());
}

#[tokio::test]
async fn unreachable_host_is_failure_with_message() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let uri = format!("http://{}", listener.local_addr().unwrap());
	drop(listener);

	let dir = TempDir::new().unwrap();
	let mut runner = CronRunner::new(
		RunnerOptions::new(uri)
			.secret_env_var(None)
			.config_path(write_config(&dir)),
	)
	.unwrap();

	let result = runner.execute_one("/api/crons/test1").await.unwrap();

	assert!(!result.success);
	assert!(result.status_code.is_none());
	assert!(!result.error.unwrap().is_empty());
	assert_eq!(runner.stats().failed_executions, 1);
}
