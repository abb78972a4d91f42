//! Remote inference signal.
//!
//! Consults an external scoring oracle over HTTP. The oracle is read-only
//! and optional: every failure mode (missing credentials, timeout, network
//! error, malformed response) degrades to "unavailable" rather than an
//! error, so a broken oracle can never fail a classification.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::label::Label;

/// Default bound on a single oracle call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Label/confidence pair reported by the remote oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteVerdict {
    /// The higher-probability class.
    pub label: Label,
    /// Probability of that class, in `[0, 1]`.
    pub confidence: f64,
}

/// A remote scoring signal.
///
/// Implementations return `None` when the signal is unavailable for any
/// reason; they never propagate failures to the caller.
pub trait RemoteSignal {
    /// Score normalized text, or report the signal as unavailable.
    fn try_score(&self, text: &str) -> impl Future<Output = Option<RemoteVerdict>> + Send;
}

/// Configuration for the HTTP remote scorer.
#[derive(Debug, Clone)]
pub struct RemoteScorerConfig {
    /// Inference endpoint URL.
    pub endpoint: String,
    /// Bearer credential. `None` means heuristic-only mode: the scorer
    /// reports unavailable without making a network call.
    pub api_token: Option<String>,
    /// Bound on a single request, including connect time.
    pub timeout: Duration,
}

impl RemoteScorerConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote scorer backed by an HTTP inference endpoint.
///
/// One outbound call per invocation, no retries: a missed remote signal
/// degrades to heuristic-only scoring, not to overall failure.
#[derive(Debug, Clone)]
pub struct HttpRemoteScorer {
    config: RemoteScorerConfig,
    http_client: Client,
}

impl HttpRemoteScorer {
    /// Create a scorer from the given configuration.
    #[must_use]
    pub fn new(config: RemoteScorerConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    async fn request(&self, token: &str, text: &str) -> Option<Value> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .json(&serde_json::json!({ "inputs": text }))
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|err| warn!("remote scorer request failed: {err}"))
            .ok()?;

        if !response.status().is_success() {
            warn!("remote scorer returned status {}", response.status());
            return None;
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| warn!("remote scorer returned malformed body: {err}"))
            .ok()
    }
}

impl RemoteSignal for HttpRemoteScorer {
    async fn try_score(&self, text: &str) -> Option<RemoteVerdict> {
        let token = self.config.api_token.as_deref()?;
        let body = self.request(token, text).await?;
        let verdict = parse_class_probabilities(&body);
        if verdict.is_none() {
            warn!("remote scorer response missing class probabilities");
        } else {
            debug!(?verdict, "remote scorer verdict");
        }
        verdict
    }
}

/// Extract the two class probabilities from an oracle response and pick the
/// higher one.
///
/// Accepts both a flat array of `{label, score}` entries and the
/// batched form that nests that array one level deep. Both classes must be
/// present; anything else is unavailable.
fn parse_class_probabilities(value: &Value) -> Option<RemoteVerdict> {
    let items = value.as_array()?;
    let entries = match items.first()? {
        Value::Array(inner) => inner.as_slice(),
        _ => items.as_slice(),
    };

    let mut spam = None;
    let mut ham = None;
    for entry in entries {
        let label = entry.get("label").and_then(Value::as_str);
        let score = entry.get("score").and_then(Value::as_f64);
        match (label, score) {
            (Some("LABEL_1" | "spam"), Some(s)) => spam = Some(s),
            (Some("LABEL_0" | "ham"), Some(s)) => ham = Some(s),
            _ => {}
        }
    }

    let (spam, ham) = (spam?, ham?);
    let verdict = if spam > ham {
        RemoteVerdict {
            label: Label::Spam,
            confidence: spam,
        }
    } else {
        RemoteVerdict {
            label: Label::Ham,
            confidence: ham,
        }
    };
    Some(verdict)
}
