//! Adjudication of free-text answers.

/// Judge backed by the Anthropic messages API.
#[cfg(feature = "anthropic-judge")]
pub mod anthropic;
/// Offline exact-match judge.
pub mod exact;

use futures::future::BoxFuture;
use thiserror::Error;

/// Everything a judge needs to rule on one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeRequest {
    /// Name the host speaks under.
    pub host_name: String,
    /// Persona prompt of the host, empty when nobody hosts.
    pub host_prompt: String,
    /// Question as shown to players.
    pub question: String,
    /// Text the player submitted.
    pub given_answer: String,
    /// Accepted answer forms, joined with `; `.
    pub expected_answer: String,
}

/// Ruling on an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the answer counts as correct.
    pub correct: bool,
    /// Host commentary read out to viewers.
    pub commentary: String,
}

/// Failures of a judge call. None of them are fatal to the session.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The judge could not be configured.
    #[error("judge is misconfigured: {0}")]
    Config(String),
    /// The request never produced a response.
    #[error("judge request failed: {0}")]
    Request(String),
    /// The judge answered with a non-success status.
    #[error("judge responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// The judge answered with something that is not a verdict.
    #[error("judge returned an unreadable verdict: {0}")]
    Malformed(String),
}

/// External adjudicator of answers.
pub trait AnswerJudge: Send + Sync {
    /// Rule on `request`.
    fn judge(&self, request: JudgeRequest) -> BoxFuture<'static, Result<Verdict, JudgeError>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
