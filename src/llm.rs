//! LLM-assisted hint generation against the Anthropic messages API.
//!
//! One request per clue, no retries. Usage is recorded only after the reply
//! has been fully parsed; every failure leaves the counters untouched.

use crate::config::LlmConfig;
use crate::prompt::{build_hint_prompt, parse_hint_text};
use crate::usage::UsageTracker;
use crate::{HintRequest, Hints};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM hints disabled by configuration")]
    Disabled,
    #[error("no API credential configured")]
    MissingCredential,
    #[error("HTTP client unavailable; rebuild with the `llm` feature")]
    MissingDependency,
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl LlmError {
    /// True when the LLM was never attempted because of configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::Disabled | LlmError::MissingCredential | LlmError::MissingDependency
        )
    }
}

/// One outbound POST.
#[derive(Debug, Clone, Copy)]
pub struct TransportRequest<'a> {
    pub endpoint: &'a str,
    pub api_key: &'a str,
    pub anthropic_version: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a JSON body and hands back the raw status and body.
pub trait Transport: Send + Sync {
    fn post(&self, request: &TransportRequest<'_>) -> Result<TransportResponse, LlmError>;
}

#[cfg(feature = "llm")]
pub use self::http::ReqwestTransport;

#[cfg(feature = "llm")]
mod http {
    use super::{LlmError, Transport, TransportRequest, TransportResponse};
    use reqwest::blocking::Client;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use std::time::Duration;

    /// Blocking reqwest client with the configured timeout.
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Duration) -> Result<Self, LlmError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| LlmError::Client(err.to_string()))?;
            Ok(Self { client })
        }
    }

    impl Transport for ReqwestTransport {
        fn post(&self, request: &TransportRequest<'_>) -> Result<TransportResponse, LlmError> {
            let mut headers = HeaderMap::new();
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(request.api_key.trim())
                    .map_err(|_| LlmError::Client("invalid API key header".to_string()))?,
            );
            headers.insert(
                "anthropic-version",
                HeaderValue::from_str(request.anthropic_version)
                    .map_err(|_| LlmError::Client("invalid anthropic-version header".to_string()))?,
            );
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            let resp = self
                .client
                .post(request.endpoint)
                .headers(headers)
                .body(request.body.to_string())
                .send()
                .map_err(map_reqwest_error)?;
            let status = resp.status().as_u16();
            let body = resp.text().map_err(map_reqwest_error)?;
            Ok(TransportResponse { status, body })
        }
    }

    fn map_reqwest_error(err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: TokenUsage,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    input_tokens: u64,
    output_tokens: u64,
}

/// The LLM path. Returns `None` whenever the caller should fall back.
pub struct LlmGenerator {
    config: LlmConfig,
    transport: Result<Arc<dyn Transport>, LlmError>,
    usage: UsageTracker,
}

impl LlmGenerator {
    /// Uses the reqwest transport when the `llm` feature is compiled in.
    pub fn new(config: LlmConfig, usage: UsageTracker) -> Self {
        // Only reachable past the enabled and credential checks in `ready`.
        let transport = if config.enabled && config.has_credential() {
            default_transport(&config)
        } else {
            Err(LlmError::Disabled)
        };
        Self {
            config,
            transport,
            usage,
        }
    }

    pub fn with_transport<T>(config: LlmConfig, usage: UsageTracker, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            config,
            transport: Ok(Arc::new(transport)),
            usage,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Whether a call would be attempted at all, and if not, why.
    pub fn readiness(&self) -> Result<(), LlmError> {
        self.ready().map(|_| ())
    }

    fn ready(&self) -> Result<(&dyn Transport, &str), LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredential)?;
        let transport = self.transport.as_ref().map_err(Clone::clone)?;
        Ok((transport.as_ref(), api_key))
    }

    /// Hints from the model, or the reason there are none.
    pub fn try_generate(&self, request: &HintRequest) -> Result<Hints, LlmError> {
        let (transport, api_key) = self.ready()?;
        let prompt = build_hint_prompt(request);
        let body = serde_json::to_string(&MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [Message {
                role: "user",
                content: &prompt,
            }],
        })
        .map_err(|err| LlmError::Client(err.to_string()))?;

        let response = transport.post(&TransportRequest {
            endpoint: &self.config.endpoint,
            api_key,
            anthropic_version: &self.config.anthropic_version,
            body: &body,
        })?;
        if response.status != 200 {
            return Err(LlmError::Status {
                status: response.status,
                body: response.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&response.body)
            .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
        let text = parsed
            .content
            .first()
            .and_then(|block| block.text.as_deref())
            .ok_or_else(|| LlmError::MalformedResponse("no text content".to_string()))?;
        let hints = parse_hint_text(text)
            .map_err(|err| LlmError::MalformedResponse(format!("hint JSON: {err}")))?;

        let model = parsed.model.as_str();
        if model.is_empty() {
            return Err(LlmError::MalformedResponse("empty model".to_string()));
        }
        self.usage
            .record(parsed.usage.input_tokens, parsed.usage.output_tokens, model);
        debug!(
            model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "LLM hints generated"
        );
        Ok(hints)
    }

    /// Like [`LlmGenerator::try_generate`], logging the failure reason.
    pub fn generate(&self, request: &HintRequest) -> Option<Hints> {
        match self.try_generate(request) {
            Ok(hints) => Some(hints),
            Err(err) if err.is_configuration() => {
                debug!(reason = %err, "LLM hints unavailable, using fallback");
                None
            }
            Err(err) => {
                warn!(error = %err, "LLM hint generation failed, using fallback");
                None
            }
        }
    }
}

#[cfg(feature = "llm")]
fn default_transport(config: &LlmConfig) -> Result<Arc<dyn Transport>, LlmError> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.timeout)?);
    Ok(transport)
}

#[cfg(not(feature = "llm"))]
fn default_transport(_config: &LlmConfig) -> Result<Arc<dyn Transport>, LlmError> {
    Err(LlmError::MissingDependency)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn request() -> HintRequest {
        HintRequest::new(["An anagram of LATE gives a word meaning old."])
            .with_definitions(["old"])
            .with_answer("TALE")
    }

    fn generator(transport: FakeTransport) -> LlmGenerator {
        LlmGenerator::with_transport(keyed_config(), UsageTracker::ephemeral(), transport)
    }

    #[test]
    fn configuration_gates_run_in_order() {
        let transport = FakeTransport::new([]);
        let disabled = LlmGenerator::with_transport(
            LlmConfig {
                api_key: Some("sk".to_string()),
                ..LlmConfig::disabled()
            },
            UsageTracker::ephemeral(),
            transport.clone(),
        );
        assert_eq!(disabled.try_generate(&request()), Err(LlmError::Disabled));

        let keyless = LlmGenerator::with_transport(
            LlmConfig::default(),
            UsageTracker::ephemeral(),
            transport.clone(),
        );
        assert_eq!(keyless.try_generate(&request()), Err(LlmError::MissingCredential));
        assert!(keyless.generate(&request()).is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[cfg(not(feature = "llm"))]
    #[test]
    fn missing_http_client_is_reported() {
        let generator = LlmGenerator::new(keyed_config(), UsageTracker::ephemeral());
        assert_eq!(generator.readiness(), Err(LlmError::MissingDependency));
    }

    #[test]
    fn server_error_records_nothing() {
        let generator = generator(FakeTransport::new([status(500)]));
        let err = generator.try_generate(&request()).unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 500, .. }));
        assert_eq!(generator.usage().snapshot().total_api_calls, 0);
        assert_eq!(generator.usage().snapshot().total_input_tokens, 0);
    }

    #[test]
    fn two_successes_accumulate() {
        let generator = generator(FakeTransport::new([
            reply(FULL_HINTS, 100, 50),
            reply(FULL_HINTS, 200, 80),
        ]));
        assert!(generator.generate(&request()).is_some());
        assert!(generator.generate(&request()).is_some());
        let record = generator.usage().snapshot();
        assert_eq!(record.total_api_calls, 2);
        assert_eq!(record.total_input_tokens, 300);
        assert_eq!(record.total_output_tokens, 130);
        assert_eq!(record.model_used.as_deref(), Some("claude-sonnet-4-20250514"));
    }

    #[test]
    fn partial_fields_still_count() {
        let partial = reply(r#"{"hint1": "a", "hint2": "b"}"#, 10, 5);
        let generator = generator(FakeTransport::new([partial]));
        let hints = generator.try_generate(&request()).unwrap();
        assert_eq!(hints.level(2), Some("b"));
        assert_eq!(hints.level(3), Some(""));
        assert_eq!(generator.usage().snapshot().total_api_calls, 1);
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let fenced = format!("```json\n{FULL_HINTS}\n```");
        let generator = generator(FakeTransport::new([reply(&fenced, 1, 1)]));
        let hints = generator.try_generate(&request()).unwrap();
        assert_eq!(hints.level(4), Some("TALE: anagram of LATE"));
    }

    #[test]
    fn malformed_replies_record_nothing() {
        let not_json = Ok(TransportResponse {
            status: 200,
            body: "<html>gateway</html>".to_string(),
        });
        let no_usage = Ok(TransportResponse {
            status: 200,
            body: r#"{"content": [{"text": "{}"}], "model": "m"}"#.to_string(),
        });
        let no_content = Ok(TransportResponse {
            status: 200,
            body: r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 1}}"#.to_string(),
        });
        let no_model = Ok(TransportResponse {
            status: 200,
            body: serde_json::json!({
                "content": [{ "text": FULL_HINTS }],
                "usage": { "input_tokens": 3, "output_tokens": 4 },
            })
            .to_string(),
        });
        let empty_usage = Ok(TransportResponse {
            status: 200,
            body: serde_json::json!({
                "content": [{ "text": FULL_HINTS }],
                "usage": {},
                "model": "claude-sonnet-4-20250514",
            })
            .to_string(),
        });
        let prose = reply("I cannot help with that.", 7, 7);
        let generator = generator(FakeTransport::new([
            not_json,
            no_usage,
            no_content,
            no_model,
            empty_usage,
            prose,
        ]));
        for _ in 0..6 {
            let err = generator.try_generate(&request()).unwrap_err();
            assert!(matches!(err, LlmError::MalformedResponse(_)), "{err}");
        }
        assert_eq!(generator.usage().snapshot(), Default::default());
    }

    #[test]
    fn timeouts_fall_back() {
        let generator = generator(FakeTransport::new([Err(LlmError::Timeout)]));
        assert!(generator.generate(&request()).is_none());
        assert_eq!(generator.usage().snapshot().total_api_calls, 0);
    }

    #[test]
    fn request_body_carries_model_and_prompt() {
        let transport = FakeTransport::new([reply(FULL_HINTS, 1, 1)]);
        let generator = generator(transport.clone());
        generator.try_generate(&request()).unwrap();
        let bodies = transport.bodies.lock();
        let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("An anagram of LATE"));
        assert!(content.contains("- Answer: TALE"));
    }
}
