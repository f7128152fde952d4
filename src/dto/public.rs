use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::characters::NpcCharacter,
    state::{
        game::{Player, PlayerId, PlayerKind},
        state_machine::GamePhase,
    },
};

/// One line of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreEntry {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Signed score.
    pub score: i64,
}

impl From<&Player> for ScoreEntry {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            score: player.score,
        }
    }
}

/// Role of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Human,
    Npc,
    Host,
}

impl From<&PlayerKind> for PlayerRole {
    fn from(kind: &PlayerKind) -> Self {
        match kind {
            PlayerKind::Human => PlayerRole::Human,
            PlayerKind::Npc(_) => PlayerRole::Npc,
            PlayerKind::Host(_) => PlayerRole::Host,
        }
    }
}

/// Participant as listed by the data endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Human, NPC or host.
    pub role: PlayerRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            role: (&player.kind).into(),
            photo: player.photo.clone(),
        }
    }
}

/// Current phase of the session.
#[derive(Debug, Serialize, ToSchema)]
pub struct StateResponse {
    /// Current phase.
    pub state: GamePhase,
    /// True while an answer is with the judge.
    pub judging: bool,
}

/// Scoreboard in join order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoresResponse {
    /// One entry per participant.
    pub scores: Vec<ScoreEntry>,
}

/// Raw package document and the participants.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse {
    /// Normalized package document, `null` before any upload.
    #[schema(value_type = Option<Object>)]
    pub package_json: Option<serde_json::Value>,
    /// Participants in join order.
    pub players: Vec<PlayerSummary>,
}

/// Player whose turn it is to pick a question.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentPlayerResponse {
    /// `None` before the game starts.
    pub player_id: Option<PlayerId>,
}

/// Active round, 1-based. Zero before the game starts.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentRoundResponse {
    /// Round number.
    pub round: usize,
}

/// Name and score of a single participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStateResponse {
    /// Display name.
    pub name: String,
    /// Signed score.
    pub score: i64,
}

/// Query string of the player state endpoint.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PlayerQuery {
    #[validate(range(min = 0))]
    pub id: PlayerId,
}

/// NPC character offered to the lobby.
#[derive(Debug, Serialize, ToSchema)]
pub struct CharacterSummary {
    /// Character name.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&NpcCharacter> for CharacterSummary {
    fn from(character: &NpcCharacter) -> Self {
        Self {
            name: character.name.clone(),
            photo: character.photo.clone(),
        }
    }
}
