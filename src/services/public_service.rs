//! Read-only projections of the live session.

use crate::{
    dto::public::{
        CharacterSummary, CurrentPlayerResponse, CurrentRoundResponse, DataResponse,
        PlayerStateResponse, PlayerSummary, ScoresResponse, StateResponse,
    },
    error::ServiceError,
    state::{SharedState, game::PlayerId},
};

/// Current phase and whether an answer is being judged.
pub async fn get_state(state: &SharedState) -> StateResponse {
    let session = state.session().lock().await;
    StateResponse {
        state: session.phase(),
        judging: session.is_judging(),
    }
}

/// Scoreboard in join order.
pub async fn get_scores(state: &SharedState) -> ScoresResponse {
    let session = state.session().lock().await;
    ScoresResponse {
        scores: session.scoreboard(),
    }
}

/// Raw package document and participants.
pub async fn get_data(state: &SharedState) -> DataResponse {
    let session = state.session().lock().await;
    DataResponse {
        package_json: session.document().map(|doc| doc.raw.as_ref().clone()),
        players: session.players().map(PlayerSummary::from).collect(),
    }
}

/// Player holding the turn.
pub async fn get_current_player(state: &SharedState) -> CurrentPlayerResponse {
    CurrentPlayerResponse {
        player_id: state.session().lock().await.current_player(),
    }
}

/// Active round, zero before the start.
pub async fn get_current_round(state: &SharedState) -> CurrentRoundResponse {
    CurrentRoundResponse {
        round: state.session().lock().await.round_num(),
    }
}

/// Name and score of one participant.
pub async fn get_player_state(
    state: &SharedState,
    id: PlayerId,
) -> Result<PlayerStateResponse, ServiceError> {
    let session = state.session().lock().await;
    let player = session
        .player(id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))?;
    Ok(PlayerStateResponse {
        name: player.name.clone(),
        score: player.score,
    })
}

/// Characters available to NPC joins.
pub fn list_characters(state: &SharedState) -> Vec<CharacterSummary> {
    state
        .roster()
        .characters()
        .iter()
        .map(CharacterSummary::from)
        .collect()
}
