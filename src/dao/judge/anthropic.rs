//! Judge backed by the Anthropic Messages API.

use std::{env, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AnswerJudge, JudgeError, JudgeRequest, Verdict};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const COMMENTARY_RULES: &str = "Keep it short and do not read out the answer card.";

/// Connection settings of the Anthropic judge.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API root, without the `/v1/messages` suffix.
    pub base_url: String,
    /// Value of the `x-api-key` header.
    pub api_key: String,
    /// Model asked for verdicts.
    pub model: String,
    /// Completion budget per call.
    pub max_tokens: u32,
    /// HTTP timeout of a single call.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Build a configuration from `ANTHROPIC_API_KEY` and the optional
    /// `ANTHROPIC_BASE_URL`. Returns `None` when no key is set.
    pub fn from_env(model: impl Into<String>, max_tokens: u32, timeout: Duration) -> Option<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Some(Self {
            base_url,
            api_key,
            model: model.into(),
            max_tokens,
            timeout,
        })
    }
}

/// Judge asking an Anthropic model for a JSON verdict.
#[derive(Clone)]
pub struct AnthropicJudge {
    client: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
    model: Arc<str>,
    max_tokens: u32,
}

impl AnthropicJudge {
    /// Build the HTTP client for `config`.
    pub fn new(config: AnthropicConfig) -> Result<Self, JudgeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| JudgeError::Config(err.to_string()))?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            api_key: Arc::from(config.api_key),
            model: Arc::from(config.model),
            max_tokens: config.max_tokens,
        })
    }
}

impl AnswerJudge for AnthropicJudge {
    fn judge(&self, request: JudgeRequest) -> BoxFuture<'static, Result<Verdict, JudgeError>> {
        let judge = self.clone();
        Box::pin(async move {
            let body = MessagesRequest {
                model: &judge.model,
                max_tokens: judge.max_tokens,
                messages: vec![Message {
                    role: "user",
                    content: build_prompt(&request),
                }],
            };

            let response = judge
                .client
                .post(format!("{}/v1/messages", judge.base_url))
                .header("x-api-key", judge.api_key.as_ref())
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|err| JudgeError::Request(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(JudgeError::Status {
                    status: status.as_u16(),
                });
            }

            let payload: MessagesResponse = response
                .json()
                .await
                .map_err(|err| JudgeError::Malformed(err.to_string()))?;
            let text = payload
                .content
                .into_iter()
                .find_map(|block| block.text)
                .ok_or_else(|| JudgeError::Malformed("response has no text block".into()))?;

            parse_verdict(&text)
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawVerdict {
    result: bool,
    #[serde(default)]
    justification: String,
}

fn build_prompt(request: &JudgeRequest) -> String {
    let payload = serde_json::json!({
        "question": request.question,
        "expected-answer": request.expected_answer,
        "given-answer": request.given_answer,
    });
    let persona = if request.host_prompt.trim().is_empty() {
        COMMENTARY_RULES.to_string()
    } else {
        format!("{COMMENTARY_RULES} {}", request.host_prompt.trim())
    };

    format!(
        "You are {name}, the host of a quiz show, and you must decide whether the player \
         gave a correct answer. Reply with JSON only, in this format:\n\
         {{\"result\": true, \"justification\": \"Yes, that's right.\"}}\n\
         or\n\
         {{\"result\": false, \"justification\": \"No, you are two years off.\"}}\n\n\
         When writing the justification remember: {persona}\n\n\
         Here is the request:\n{payload}",
        name = request.host_name,
    )
}

/// Read a verdict from model output, tolerating code fences and surrounding prose.
fn parse_verdict(text: &str) -> Result<Verdict, JudgeError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(JudgeError::Malformed(format!("no JSON object in `{text}`"))),
    };

    let raw: RawVerdict =
        serde_json::from_str(json).map_err(|err| JudgeError::Malformed(err.to_string()))?;
    Ok(Verdict {
        correct: raw.result,
        commentary: raw.justification,
    })
}
