//! LLM oracle boundary.
//!
//! Every component that needs semantic judgment (column classification, query
//! validation, hotel ranking) talks to an [`Oracle`]: a list of role-tagged
//! messages goes in, free text comes out. [`ask`] wraps a call with the shared
//! retry policy and a caller-supplied parser, so a component only decides what
//! a well-formed answer looks like.

use crate::config::LlmConfig;
use crate::error::{RecommenderError, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Message author, serialized the way chat-completion APIs expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Black-box text oracle.
///
/// Implementations only move text; they never interpret it. Returning a boxed
/// future keeps the trait object-safe so the pipeline can share one
/// `Arc<dyn Oracle>` between its stages.
pub trait Oracle: Send + Sync {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>>;
}

/// Bounded retry schedule for oracle calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Sleep before the second attempt; doubles afterwards
    pub initial_backoff: Duration,
    /// Upper bound for the doubled backoff
    pub max_backoff: Duration,
    /// Deadline for a single oracle round-trip
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            call_timeout: Duration::from_secs(90),
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..Self::default()
        }
    }
}

enum LastFailure {
    Transport(String),
    Unparsable(String),
}

/// Call the oracle until `parse` accepts its answer or the retry budget runs out.
///
/// `parse` returns `None` for text that is not a well-formed answer; the same
/// messages are then sent again after a jittered exponential backoff.
/// Retryable transport errors follow the same schedule, while fatal ones
/// (e.g. HTTP 401) are returned immediately.
///
/// # Errors
///
/// - [`RecommenderError::MalformedOutput`] when the last attempt produced text
///   that did not parse.
/// - [`RecommenderError::OracleUnavailable`] when the last attempt failed in
///   transport.
pub async fn ask<T, F>(
    oracle: &dyn Oracle,
    task: &'static str,
    messages: &[ChatMessage],
    policy: &RetryPolicy,
    mut parse: F,
) -> Result<T>
where
    F: FnMut(&str) -> Option<T>,
{
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut last_failure = None;

    for attempt in 1..=attempts {
        debug!(task, attempt, "Sending oracle request");

        match call_with_timeout(oracle, messages, policy.call_timeout).await {
            Ok(raw) => match parse(&raw) {
                Some(value) => return Ok(value),
                None => {
                    let preview: String = raw.chars().take(200).collect();
                    warn!(task, attempt, content_preview = %preview, "Oracle output did not parse");
                    last_failure = Some(LastFailure::Unparsable(raw));
                }
            },
            Err(e) if e.is_retryable() => {
                warn!(task, attempt, error = %e, "Oracle call failed");
                last_failure = Some(LastFailure::Transport(e.to_string()));
            }
            Err(e) => return Err(e),
        }

        if attempt < attempts {
            sleep_with_jitter(backoff).await;
            backoff = (backoff * 2).min(policy.max_backoff);
        }
    }

    Err(match last_failure {
        Some(LastFailure::Unparsable(raw)) => RecommenderError::MalformedOutput {
            task,
            attempts,
            raw,
        },
        Some(LastFailure::Transport(reason)) => RecommenderError::OracleUnavailable {
            task,
            attempts,
            reason,
        },
        None => RecommenderError::OracleUnavailable {
            task,
            attempts,
            reason: "no attempt was made".to_string(),
        },
    })
}

async fn call_with_timeout(
    oracle: &dyn Oracle,
    messages: &[ChatMessage],
    deadline: Duration,
) -> Result<String> {
    tokio::time::timeout(deadline, oracle.complete(messages))
        .await
        .map_err(|_| RecommenderError::Timeout(deadline))?
}

async fn sleep_with_jitter(backoff: Duration) {
    let base = backoff.as_millis() as u64;
    if base == 0 {
        return;
    }
    let jitter = rand::random::<u64>() % (base / 4 + 1);
    tokio::time::sleep(Duration::from_millis(base + jitter)).await;
}

/// Strip markdown code fences and surrounding prose from an oracle answer.
///
/// Returns the outermost `[...]` or `{...}` span when one exists, otherwise
/// the trimmed text unchanged.
pub fn extract_json(content: &str) -> &str {
    let mut trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string ("json") on the fence line
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        trimmed = body.trim_end().trim_end_matches("```").trim();
    }

    let open = trimmed.find(['[', '{']);
    let close = trimmed.rfind([']', '}']);
    match (open, close) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a JSON array of strings out of an oracle answer.
pub fn parse_string_list(content: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(extract_json(content)).ok()
}

/// Token usage tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Accumulated token usage with atomic counters
#[derive(Debug, Default)]
struct AtomicTokenUsage {
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

impl AtomicTokenUsage {
    fn add(&self, usage: &ApiUsage) {
        self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        self.total_tokens.fetch_add(usage.total_tokens, Ordering::Relaxed);
    }

    fn get(&self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
        }
    }
}

/// OpenAI-compatible API response structures
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

enum Auth {
    Bearer(String),
    AzureKey(String),
}

/// Chat-completion oracle over HTTP (OpenAI-compatible or Azure OpenAI).
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: Url,
    auth: Auth,
    model: String,
    temperature: f32,
    seed: Option<u64>,
    usage: AtomicTokenUsage,
}

impl HttpOracle {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.retry.call_timeout)
            .build()
            .map_err(|e| RecommenderError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let auth = if config.azure_api_version.is_some() {
            Auth::AzureKey(config.api_key.clone())
        } else {
            Auth::Bearer(config.api_key.clone())
        };

        Ok(Self {
            client,
            endpoint: config.endpoint()?,
            auth,
            model: config.model.clone(),
            temperature: config.temperature,
            seed: config.seed,
            usage: AtomicTokenUsage::default(),
        })
    }

    /// Tokens consumed by every call made through this oracle so far
    pub fn usage(&self) -> TokenUsage {
        self.usage.get()
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut request_body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if let Some(seed) = self.seed {
            request_body["seed"] = serde_json::json!(seed);
        }

        let request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json");
        let request = match &self.auth {
            Auth::Bearer(key) => request.header("Authorization", format!("Bearer {}", key)),
            Auth::AzureKey(key) => request.header("api-key", key),
        };

        let response = request.json(&request_body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecommenderError::Api {
                code: status.as_u16(),
                message: format!("LLM API error: {} - {}", status, error_text),
            });
        }

        let api_response: ChatCompletionResponse = response.json().await?;

        if let Some(usage) = &api_response.usage {
            self.usage.add(usage);
        }

        Ok(api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl Oracle for HttpOracle {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.send(messages))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic oracles for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of answers and records every request.
    pub struct ScriptedOracle {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedOracle {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::from_results(replies.into_iter().map(|r| Ok(r.into())).collect())
        }

        pub fn from_results(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or(0)
        }

        pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl Oracle for ScriptedOracle {
        fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(messages.to_vec());
            }
            let reply = self
                .replies
                .lock()
                .ok()
                .and_then(|mut r| r.pop_front())
                .unwrap_or_else(|| Err(RecommenderError::Validation("script exhausted".to_string())));
            Box::pin(async move { reply })
        }
    }

    /// Answers every request with a closure over the user prompt.
    pub struct FnOracle<F>(pub F);

    impl<F> Oracle for FnOracle<F>
    where
        F: Fn(&str) -> String + Send + Sync,
    {
        fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String>> {
            let prompt = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.as_str())
                .unwrap_or("");
            let reply = (self.0)(prompt);
            Box::pin(async move { Ok(reply) })
        }
    }
}
