//! HTTP remote store
//!
//! Speaks the résumé server's JSON envelope:
//!
//! | Call | Request | Success | Failure |
//! |---|---|---|---|
//! | fetch | `POST /get_json_content {language}` | `{content}` | `404 {error}` |
//! | save | `POST /save_json {language, content}` | `{success, message}` | `400 {error, errors?}` |
//! | schema | `GET /schemas/<language>` | schema | `404`/`500 {error}` |

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use vitae_form::ValidationIssue;
use vitae_store::Locale;

use crate::config::RemoteConfig;
use crate::error::NetworkError;
use crate::remote::{RemoteStore, SaveOutcome};

/// [`RemoteStore`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpRemote {
    /// Create client for the configured server
    ///
    /// # Errors
    /// Returns [`NetworkError::Unreachable`] if the client cannot be built
    pub fn new(config: &RemoteConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("vitae/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Server root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{route}", self.base_url)
    }

    fn transport(&self, err: &reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            NetworkError::Unreachable(err.to_string())
        }
    }

    async fn body(&self, response: Response) -> Result<(StatusCode, Value), NetworkError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport(&e))?;
        if text.trim().is_empty() {
            return Ok((status, Value::Null));
        }
        let body = serde_json::from_str(&text)
            .map_err(|e| NetworkError::InvalidResponse(format!("{status}: {e}")))?;
        Ok((status, body))
    }
}

fn error_text(status: StatusCode, body: &Value) -> NetworkError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map_or_else(|| status.to_string(), str::to_string);
    NetworkError::Status {
        status: status.as_u16(),
        message,
    }
}

fn issues(body: &Value) -> Vec<ValidationIssue> {
    let listed: Vec<ValidationIssue> = body
        .get("errors")
        .and_then(|errors| serde_json::from_value(errors.clone()).ok())
        .unwrap_or_default();
    if !listed.is_empty() {
        return listed;
    }
    let message = body.get("error").and_then(Value::as_str).unwrap_or("rejected");
    vec![ValidationIssue::new("", message)]
}

#[async_trait::async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        let response = self
            .client
            .post(self.url("get_json_content"))
            .json(&json!({ "language": locale.as_str() }))
            .send()
            .await
            .map_err(|e| self.transport(&e))?;
        let (status, mut body) = self.body(response).await?;

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => match body.get_mut("content").map(Value::take) {
                Some(content) => Ok(Some(content)),
                None => Err(NetworkError::InvalidResponse("missing 'content'".to_string())),
            },
            s => Err(error_text(s, &body)),
        }
    }

    async fn save(&self, locale: &Locale, document: &Value) -> Result<SaveOutcome, NetworkError> {
        let response = self
            .client
            .post(self.url("save_json"))
            .json(&json!({ "language": locale.as_str(), "content": document }))
            .send()
            .await
            .map_err(|e| self.transport(&e))?;
        let (status, body) = self.body(response).await?;

        match status {
            s if s.is_success() => {
                let message = body.get("message").and_then(Value::as_str).unwrap_or("saved");
                Ok(SaveOutcome::accepted(message))
            }
            StatusCode::BAD_REQUEST => Ok(SaveOutcome::Rejected(issues(&body))),
            s => Err(error_text(s, &body)),
        }
    }

    async fn fetch_schema(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        let response = self
            .client
            .get(self.url(&format!("schemas/{locale}")))
            .send()
            .await
            .map_err(|e| self.transport(&e))?;
        let (status, body) = self.body(response).await?;

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(body)),
            s => Err(error_text(s, &body)),
        }
    }
}
