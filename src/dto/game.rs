use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_not_blank, state::game::PlayerId};

/// Generic acknowledgement returned by every command.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl ActionResponse {
    /// Build a response carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Join the lobby as a human player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    #[validate(range(min = 0))]
    pub id: PlayerId,
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Optional photo reference shown next to the player.
    #[serde(default)]
    pub photo: Option<String>,
}

/// Add an NPC contestant or host by character name.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CharacterRequest {
    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub character: String,
}

/// Id assigned to a newly joined NPC.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedResponse {
    /// Assigned player id.
    pub id: PlayerId,
    /// Character name.
    pub name: String,
}

/// Command that only names the acting player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerCommand {
    #[validate(range(min = 0))]
    pub player_id: PlayerId,
}

/// Pick a question from the table.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectQuestionRequest {
    #[validate(range(min = 1))]
    pub round: usize,
    #[validate(range(min = 1))]
    pub theme: usize,
    #[validate(range(min = 1))]
    pub question: usize,
    #[validate(range(min = 0))]
    pub player_id: PlayerId,
}

/// Answer to the selected question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Question key, `round_theme_question`.
    #[validate(length(min = 5))]
    pub id_quest: String,
    #[validate(range(min = 0))]
    pub player_id: PlayerId,
    #[validate(length(max = 500))]
    pub text: String,
}

/// Outcome of a judged answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Whether the answer was accepted.
    pub correct: bool,
    /// Host commentary on the answer.
    pub commentary: String,
}
