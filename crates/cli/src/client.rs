// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use argo_daemon::protocol::{
    AbandonResponse, AckResponse, ErrorResponse, InputBody, ListResponse, OutputResponse,
    StartBody, StartResponse, StatusResponse,
};
use std::time::Duration;
use thiserror::Error;

// Timeout configuration (env var in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for HTTP requests to the daemon
pub fn timeout_http() -> Duration {
    parse_duration_ms("ARC_TIMEOUT_HTTP_MS").unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not reachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
}

/// Blocking HTTP client for the daemon API.
pub struct DaemonClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl DaemonClient {
    /// Client pointed at `ARGO_DAEMON_HOST:ARGO_DAEMON_PORT`.
    pub fn from_env() -> Result<Self, ClientError> {
        let host =
            std::env::var("ARGO_DAEMON_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("ARGO_DAEMON_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(9876);
        Self::new(format!("http://{host}:{port}"))
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout_http())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn start(&self, body: &StartBody) -> Result<StartResponse, ClientError> {
        let url = format!("{}/api/workflow/start", self.base_url);
        self.parse(self.send(self.http.post(&url).json(body))?)
    }

    pub fn list(&self) -> Result<ListResponse, ClientError> {
        let url = format!("{}/api/workflow/list", self.base_url);
        self.parse(self.send(self.http.get(&url))?)
    }

    pub fn status(&self, id: &str) -> Result<StatusResponse, ClientError> {
        let url = format!("{}/api/workflow/status/{id}", self.base_url);
        self.parse(self.send(self.http.get(&url))?)
    }

    pub fn pause(&self, id: &str) -> Result<AckResponse, ClientError> {
        let url = format!("{}/api/workflow/pause/{id}", self.base_url);
        self.parse(self.send(self.http.post(&url))?)
    }

    pub fn resume(&self, id: &str) -> Result<AckResponse, ClientError> {
        let url = format!("{}/api/workflow/resume/{id}", self.base_url);
        self.parse(self.send(self.http.post(&url))?)
    }

    pub fn abandon(&self, id: &str) -> Result<AbandonResponse, ClientError> {
        let url = format!("{}/api/workflow/abandon/{id}", self.base_url);
        self.parse(self.send(self.http.delete(&url))?)
    }

    pub fn drain_output(&self, id: &str) -> Result<OutputResponse, ClientError> {
        let url = format!(
            "{}/api/workflow/output?workflow_name={id}",
            self.base_url
        );
        self.parse(self.send(self.http.get(&url))?)
    }

    pub fn send_input(&self, id: &str, line: &str) -> Result<AckResponse, ClientError> {
        let url = format!(
            "{}/api/workflow/input?workflow_name={id}",
            self.base_url
        );
        let body = InputBody {
            input: line.to_string(),
        };
        self.parse(self.send(self.http.post(&url).json(&body))?)
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        request.send().map_err(|source| {
            if source.is_connect() {
                ClientError::Unreachable {
                    url: self.base_url.clone(),
                    source,
                }
            } else {
                ClientError::Http(source)
            }
        })
    }

    fn parse<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json()?);
        }
        let message = response
            .json::<ErrorResponse>()
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
