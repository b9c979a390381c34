// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP collaborator used by every remote step.

use async_trait::async_trait;
use reqwest::Method;
use rolesync_common_http::Timeouts;
use rolesync_common_secret::SecretString;
use serde_json::Value;
use tracing::{instrument, trace};

use crate::error::TransportError;

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub query: Vec<(String, String)>,
	pub bearer: Option<SecretString>,
	pub json: Option<Value>,
}

impl TransportRequest {
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: Vec::new(),
			query: Vec::new(),
			bearer: None,
			json: None,
		}
	}

	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::GET, url)
	}

	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::POST, url)
	}

	pub fn patch(url: impl Into<String>) -> Self {
		Self::new(Method::PATCH, url)
	}

	pub fn delete(url: impl Into<String>) -> Self {
		Self::new(Method::DELETE, url)
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));
		self
	}

	pub fn bearer(mut self, token: &SecretString) -> Self {
		self.bearer = Some(token.clone());
		self
	}

	pub fn json(mut self, body: Value) -> Self {
		self.json = Some(body);
		self
	}
}

/// Status and decoded body of a response.
///
/// An empty body decodes to `null`, a body that is not JSON to a string.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
	pub status: u16,
	pub body: Value,
}

impl TransportResponse {
	pub fn new(status: u16, body: Value) -> Self {
		Self { status, body }
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub(crate) fn decode_body(raw: &str) -> Value {
		if raw.trim().is_empty() {
			return Value::Null;
		}
		serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
	}
}

/// Sends requests on behalf of the engine.
///
/// Implementations report a non-2xx status as a normal response; only a
/// failure to obtain a response at all is a [`TransportError`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	pub fn new(timeouts: Timeouts) -> Result<Self, TransportError> {
		let client = rolesync_common_http::client_with_timeouts(timeouts)
			.map_err(|e| TransportError::Client(e.to_string()))?;
		Ok(Self { client })
	}

	pub fn from_client(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
	#[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		let url = request.url.clone();
		let mut builder = self.client.request(request.method, &request.url);

		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(token) = &request.bearer {
			builder = builder.bearer_auth(token.expose());
		}
		if let Some(body) = &request.json {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(&url, e))?;
		let status = response.status().as_u16();
		let raw = response
			.text()
			.await
			.map_err(|e| TransportError::from_reqwest(&url, e))?;

		trace!(status, bytes = raw.len(), "response received");
		Ok(TransportResponse::new(status, TransportResponse::decode_body(&raw)))
	}
}
