//! Application-level configuration loading: timer durations, broadcast sizing and judge settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::timers::TimerName;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SIQ_SHOW_CONFIG_PATH";
const DEFAULT_CHARACTERS_PATH: &str = "npc_characters/characters.json";
const DEFAULT_JUDGE_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_JUDGE_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Forced advance when humans never all acknowledge the start.
    pub start_ack_timeout: Duration,
    /// Forced can-answer signal when not every human confirms the question.
    pub question_shown_timeout: Duration,
    /// Buzz window opened by the first buzz.
    pub buzz_window: Duration,
    /// How long the correct answer stays on screen.
    pub show_answer: Duration,
    /// Offset of the can-answer timestamp from the moment it is sent.
    pub can_answer_delay: Duration,
    /// Undelivered events kept per viewer.
    pub broadcast_capacity: usize,
    /// Upper bound on a single judge call.
    pub judge_timeout: Duration,
    /// Location of the NPC characters file.
    pub characters_path: PathBuf,
    /// Model used by the Anthropic judge.
    pub judge_model: String,
    /// Completion budget of a judge call.
    pub judge_max_tokens: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Duration a named timer is armed with.
    pub fn timer_duration(&self, name: TimerName) -> Duration {
        match name {
            TimerName::StartAckForced => self.start_ack_timeout,
            TimerName::QuestionShownForced => self.question_shown_timeout,
            TimerName::BuzzWindow => self.buzz_window,
            TimerName::ShowAnswerAdvance => self.show_answer,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    start_ack_timeout_ms: Option<u64>,
    question_shown_timeout_ms: Option<u64>,
    buzz_window_ms: Option<u64>,
    show_answer_ms: Option<u64>,
    can_answer_delay_ms: Option<u64>,
    broadcast_capacity: Option<usize>,
    judge_timeout_ms: Option<u64>,
    characters_path: Option<PathBuf>,
    judge_model: Option<String>,
    judge_max_tokens: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let millis = |raw: Option<u64>, default: u64| Duration::from_millis(raw.unwrap_or(default));
        Self {
            start_ack_timeout: millis(value.start_ack_timeout_ms, 30_000),
            question_shown_timeout: millis(value.question_shown_timeout_ms, 3_000),
            buzz_window: millis(value.buzz_window_ms, 3_000),
            show_answer: millis(value.show_answer_ms, 5_000),
            can_answer_delay: millis(value.can_answer_delay_ms, 500),
            broadcast_capacity: value.broadcast_capacity.unwrap_or(64).max(1),
            judge_timeout: millis(value.judge_timeout_ms, 30_000),
            characters_path: value
                .characters_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHARACTERS_PATH)),
            judge_model: value
                .judge_model
                .unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
            judge_max_tokens: value.judge_max_tokens.unwrap_or(DEFAULT_JUDGE_MAX_TOKENS),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
