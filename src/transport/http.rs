//! Direct HTTP transport.
//!
//! # Responsibilities
//! - Execute requests with the per-request connect/read timeout pair
//! - Retry connection and timeout failures as the retryer allows
//! - Map client errors onto `TransportError`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::TransportError;
use crate::transport::{Request, RequestOptions, Response, Transport};

/// HTTP transport backed by `reqwest`.
///
/// `reqwest` fixes the connect timeout per client, so one client is kept per
/// distinct connect timeout; connection pools are shared by every request using it.
#[derive(Debug, Default)]
pub struct HttpTransport {
    clients: DashMap<Duration, reqwest::Client>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, connect_timeout: Duration) -> Result<reqwest::Client, TransportError> {
        if let Some(client) = self.clients.get(&connect_timeout) {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(self
            .clients
            .entry(connect_timeout)
            .or_insert(client)
            .clone())
    }

    async fn execute_once(
        &self,
        client: &reqwest::Client,
        request: &Request,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let mut builder = client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(options.read_timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_error(&request.url, options.read_timeout, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(&request.url, options.read_timeout, e))?;

        Ok(Response {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request, options: &RequestOptions) -> Result<Response, TransportError> {
        let client = self.client_for(options.connect_timeout)?;
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.execute_once(&client, &request, options).await {
                Ok(response) => {
                    tracing::trace!(
                        url = %request.url,
                        status = %response.status,
                        attempts,
                        elapsed = ?start.elapsed(),
                        "Request completed"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => match options.retryer.next_delay(attempts) {
                    Some(delay) => {
                        tracing::info!(url = %request.url, attempt = attempts, delay = ?delay, error = %e, "Retrying request");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }
}

fn map_error(url: &str, read_timeout: Duration, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            after: read_timeout,
        }
    } else if error.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Io {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
