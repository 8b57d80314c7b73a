//! Retrying HTTP client shared by the database adapters.

use crate::config::HttpConfig;
use reqwest::Url;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised while talking to a remote database.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("cannot connect to {url}")]
    Connect { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: usize,
        last: Box<SourceError>,
    },
}

/// Thin wrapper over `reqwest::Client` with bounded retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
    timeout_seconds: u64,
}

impl HttpClient {
    /// Build a client from the `[http]` configuration section.
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Request {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            retries: config.retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// GET a JSON document, retrying failed attempts.
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        self.retrying(url, move || self.get_json_once(url, query))
            .await
    }

    /// GET a JSON document with a single attempt.
    pub async fn get_json_once(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, SourceError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify_error(url, e))?;

        let response = check_status(url, response)?;

        response.json().await.map_err(|e| SourceError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// GET a text body (HTML pages), retrying failed attempts.
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        self.retrying(url, move || async move {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| self.classify_error(url, e))?;

            check_status(url, response)?
                .text()
                .await
                .map_err(|e| SourceError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
        })
        .await
    }

    /// POST a form and decode the JSON reply. Single attempt.
    pub async fn post_form_json(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<Value, SourceError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| self.classify_error(url, e))?;

        check_status(url, response)?
            .json()
            .await
            .map_err(|e| SourceError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn retrying<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut last = SourceError::Request {
            url: url.to_string(),
            reason: "no attempt made".to_string(),
        };

        for n in 1..=self.retries {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!("Attempt {}/{} for {} failed: {}", n, self.retries, url, e);
                    last = e;
                    if n < self.retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(SourceError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.retries,
            last: Box::new(last),
        })
    }

    fn classify_error(&self, url: &str, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
                seconds: self.timeout_seconds,
            }
        } else if e.is_connect() {
            SourceError::Connect {
                url: url.to_string(),
            }
        } else {
            SourceError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Join path segments onto a base URL, percent-encoding each segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<String, SourceError> {
    let invalid = |reason: String| SourceError::Request {
        url: base.to_string(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);

    Ok(url.to_string())
}
