use crate::app_error::AppError;
use crate::config::Config;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Internal error classification used for robust retry handling.
#[derive(Debug)]
pub(crate) enum QueryError {
    Http {
        status: StatusCode,
        body: String,
        retry_after: Option<Duration>,
    },
    Transport {
        is_connect: bool,
        is_timeout: bool,
        message: String,
    },
    InvalidJson {
        body: String,
        parse_error: String,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub tokens_in: u64,
    pub tokens_out: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Client for an OpenAI-style chat-completions endpoint.
pub(crate) struct ChatClient {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatClient {
    pub(crate) fn new(config: &Config) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }

    // Single attempt. No retries here; the policy loop decides retries.
    async fn query_once(&self, request_body: &Value) -> Result<Value, QueryError> {
        let resp_res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(request_body)
            .send()
            .await;

        let resp = match resp_res {
            Ok(r) => r,
            Err(e) => {
                return Err(QueryError::Transport {
                    is_connect: e.is_connect(),
                    is_timeout: e.is_timeout(),
                    message: censor_api_key_in_error_string(e, &self.api_key),
                });
            }
        };

        handle_response_to_json(resp, &self.api_key).await
    }

    /// Query with bounded exponential backoff for transient failures.
    pub(crate) async fn query_with_retries(&self, request_body: &Value) -> Result<Value, AppError> {
        let policy = RetryPolicy::default();
        let mut attempt: u32 = 1;

        loop {
            match self.query_once(request_body).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt >= policy.max_attempts || !policy.is_retryable(&e) {
                        return Err(map_query_error_to_app_error(e));
                    }

                    // Respect Retry-After if provided (HTTP errors only).
                    let mut delay = policy.backoff_delay(attempt);
                    if let QueryError::Http {
                        retry_after: Some(ra),
                        ..
                    } = e
                    {
                        if ra > delay {
                            delay = ra;
                        }
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Retry policy for the remote endpoint: a handful of attempts with capped
/// exponential backoff.
pub(crate) struct RetryPolicy {
    pub(crate) max_attempts: u32,
    pub(crate) base_delay: Duration,
    pub(crate) max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(400),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub(crate) fn is_retryable(&self, err: &QueryError) -> bool {
        match err {
            QueryError::Transport { is_connect, .. } => {
                // Retry only if the connection was not established; a request
                // that may have reached the service is not safe to repeat.
                *is_connect
            }
            QueryError::Http { status, .. } => {
                matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
            }
            // A 2xx that failed to parse already ran inference; don't repeat it.
            QueryError::InvalidJson { .. } => false,
        }
    }

    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff with jitter derived from system time nanos (no RNG dependency).
        let shift = attempt.saturating_sub(1).min(10);
        let exp = 1u32 << shift;
        let base = self.base_delay.saturating_mul(exp);
        let capped = if base > self.max_delay {
            self.max_delay
        } else {
            base
        };
        capped + jitter_duration(self.base_delay)
    }
}

fn jitter_duration(base: Duration) -> Duration {
    // 0..(base/2)
    let nanos_now: u128 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u128)
        .unwrap_or(0);

    let half = base.as_nanos() / 2;
    if half == 0 {
        return Duration::from_millis(0);
    }
    let bound = half.min(u128::from(u64::MAX));
    let jitter_nanos = nanos_now % bound;
    Duration::from_nanos(jitter_nanos as u64)
}

fn map_query_error_to_app_error(e: QueryError) -> AppError {
    match e {
        QueryError::Http { status, body, .. } => match status.as_u16() {
            401 | 403 => AppError::Authentication(format!("HTTP {status} with body:\n{body}")),
            429 => AppError::RateLimited(format!("HTTP {status} with body:\n{body}")),
            _ => AppError::Remote(format!("HTTP {status} with body:\n{body}")),
        },
        QueryError::Transport { message, .. } => AppError::Network(message),
        QueryError::InvalidJson { body, parse_error } => AppError::Remote(format!(
            "Invalid JSON in success response: {parse_error}; raw body:\n{body}"
        )),
    }
}

pub(crate) fn censor_api_key(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        return text.to_string();
    }
    // Only censor things that look like keys. Very short strings are unlikely to be keys.
    let censored_key = if api_key.len() > 8 {
        format!("...{}", &api_key[api_key.len() - 4..])
    } else {
        "...".to_string()
    };
    text.replace(api_key, &censored_key)
}

fn censor_api_key_in_error_string(e: reqwest::Error, api_key: &str) -> String {
    censor_api_key(&e.to_string(), api_key)
}

async fn handle_response_to_json(
    resp: reqwest::Response,
    api_key: &str,
) -> Result<Value, QueryError> {
    let status = resp.status();
    let retry_after = parse_retry_after(resp.headers());

    let text = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            return Err(QueryError::Transport {
                is_connect: e.is_connect(),
                is_timeout: e.is_timeout(),
                message: censor_api_key_in_error_string(e, api_key),
            })
        }
    };

    if !status.is_success() {
        return Err(QueryError::Http {
            status,
            body: censor_api_key(&text, api_key),
            retry_after,
        });
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(v) => Ok(v),
        Err(e) => Err(QueryError::InvalidJson {
            body: text,
            parse_error: e.to_string(),
        }),
    }
}

pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(val) = headers.get(RETRY_AFTER) {
        if let Ok(s) = val.to_str() {
            if let Ok(secs) = s.trim().parse::<u64>() {
                return Some(Duration::from_secs(secs));
            }
        }
    }
    None
}

/// Pull the reply text and token usage out of a chat-completions response.
pub(crate) fn extract_reply(response: &Value) -> Result<ChatReply, AppError> {
    let content = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            AppError::ResponseParsing(
                "Could not find 'content' in chat completion response JSON.".to_string(),
            )
        })?;

    let usage_field = |name: &str| {
        response
            .get("usage")
            .and_then(|u| u.get(name))
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    };

    Ok(ChatReply {
        text: content.to_string(),
        usage: TokenUsage {
            tokens_in: usage_field("prompt_tokens"),
            tokens_out: usage_field("completion_tokens"),
        },
    })
}
