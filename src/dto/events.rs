use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::public::ScoreEntry, state::game::PlayerId};

/// Event pushed to every viewer. Serialized as a JSON object whose `type` field names the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShowEvent {
    /// The game was started; clients must acknowledge.
    Start,
    /// Questions table of the active round.
    QuestionsTable {
        /// Pipe-delimited theme names and price slots.
        table: String,
    },
    /// The current player picked a question.
    QuestionSelected {
        /// Question key, `round_theme_question`.
        id: String,
        /// Special questions are not supported; always `false`.
        isspecial: bool,
    },
    /// Players may buzz from `timestamp` (unix milliseconds) on.
    CanAnswer {
        /// Unix time in milliseconds.
        timestamp: i64,
    },
    /// Clients stop their local countdowns.
    StopTimer,
    /// A buzz winner must now answer.
    #[serde(rename_all = "camelCase")]
    WaitAnswer {
        /// Player who won the buzz.
        player_id: PlayerId,
    },
    /// An answer was judged.
    #[serde(rename_all = "camelCase")]
    Validated {
        /// Question key.
        id_quest: String,
        /// Player who answered.
        player_id: PlayerId,
        /// Whether the answer was accepted.
        result: bool,
        /// True when no other buzzer is waiting.
        unfreeze: bool,
    },
    /// Echo of a player's answer.
    #[serde(rename_all = "camelCase")]
    PlayerTalk {
        /// Player who answered.
        player_id: PlayerId,
        /// Answer text.
        text: String,
    },
    /// Host commentary on the last answer.
    HostTalk {
        /// Commentary text.
        text: String,
    },
    /// The correct answer is shown.
    #[serde(rename_all = "camelCase")]
    ShowAnswer {
        /// Question key.
        id_quest: String,
    },
    /// The session was wiped.
    Reset,
    /// Every round is exhausted.
    GameOver {
        /// Final scoreboard in join order.
        scores: Vec<ScoreEntry>,
    },
}

impl ShowEvent {
    /// Value of the `type` field, also used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            ShowEvent::Start => "start",
            ShowEvent::QuestionsTable { .. } => "questionstable",
            ShowEvent::QuestionSelected { .. } => "questionselected",
            ShowEvent::CanAnswer { .. } => "cananswer",
            ShowEvent::StopTimer => "stoptimer",
            ShowEvent::WaitAnswer { .. } => "waitanswer",
            ShowEvent::Validated { .. } => "validated",
            ShowEvent::PlayerTalk { .. } => "playertalk",
            ShowEvent::HostTalk { .. } => "hosttalk",
            ShowEvent::ShowAnswer { .. } => "showanswer",
            ShowEvent::Reset => "reset",
            ShowEvent::GameOver { .. } => "gameover",
        }
    }
}
