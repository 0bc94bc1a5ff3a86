// src/utils/http.rs

//! HTTP transport for the vendor API.
//!
//! Every request goes through [`with_retry`]: a fixed number of attempts with
//! no delay in between, the last error propagated to the caller.
//!
//! Certificate validation is switched off when
//! `vendor.accept_invalid_certs` is set (the default). The vendor serves an
//! invalid chain, so the channel's integrity is not verified in that mode.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::{AppError, Result, TransportErrorKind};
use crate::models::VendorConfig;

/// Expected body format of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Html,
}

/// A successfully fetched and decoded body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Html(String),
}

impl Payload {
    /// Take the JSON value, failing if the body was fetched as HTML.
    pub fn into_json(self, url: &str) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Html(_) => Err(AppError::parse(url, "expected JSON, got HTML")),
        }
    }

    /// Take the HTML text, failing if the body was fetched as JSON.
    pub fn into_html(self, url: &str) -> Result<String> {
        match self {
            Payload::Html(text) => Ok(text),
            Payload::Json(_) => Err(AppError::parse(url, "expected HTML, got JSON")),
        }
    }
}

/// Something that can GET a URL and decode the body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, format: PayloadFormat) -> Result<Payload>;
}

/// Run `attempt` up to `max_attempts` times, returning the first success or
/// the last error. The attempt number (starting at 1) is passed in.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(error) if n < max_attempts => {
                log::debug!("Attempt {}/{} failed: {}", n, max_attempts, error);
                n += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &VendorConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let token = HeaderValue::from_str(&config.token)
        .map_err(|_| AppError::config("vendor.token is not a valid header value"))?;
    headers.insert("token", token);
    if let Some(cookie) = &config.session_cookie {
        let cookie = HeaderValue::from_str(cookie)
            .map_err(|_| AppError::config("vendor.session_cookie is not a valid header value"))?;
        headers.insert(COOKIE, cookie);
    }

    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs);

    builder = match &config.proxy {
        Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

/// [`Transport`] over reqwest with retries and an in-flight request cap.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_attempts: u32,
    semaphore: Arc<Semaphore>,
}

impl HttpTransport {
    pub fn new(config: &VendorConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            max_attempts: config.max_attempts,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    async fn fetch_once(&self, url: &str, format: PayloadFormat) -> Result<Payload> {
        // Held for one attempt only, so nested fan-out cannot starve itself.
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AppError::transport(url, TransportErrorKind::Network, "limiter closed"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(
                url,
                TransportErrorKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let text = response.text().await.map_err(|e| request_error(url, e))?;
        decode_body(url, text, format)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, format: PayloadFormat) -> Result<Payload> {
        with_retry(self.max_attempts, move |_| self.fetch_once(url, format)).await
    }
}

/// Decode a response body into the requested format.
pub fn decode_body(url: &str, text: String, format: PayloadFormat) -> Result<Payload> {
    match format {
        PayloadFormat::Json => serde_json::from_str(&text)
            .map(Payload::Json)
            .map_err(|e| AppError::transport(url, TransportErrorKind::ParseFailure, e)),
        PayloadFormat::Html => Ok(Payload::Html(text)),
    }
}

fn request_error(url: &str, error: reqwest::Error) -> AppError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if let Some(status) = error.status() {
        TransportErrorKind::HttpStatus(status.as_u16())
    } else if error.is_decode() {
        TransportErrorKind::ParseFailure
    } else {
        TransportErrorKind::Network
    };
    AppError::transport(url, kind, error)
}
