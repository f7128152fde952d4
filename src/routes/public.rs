use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use validator::Validate;

use crate::{
    dto::public::{
        CharacterSummary, CurrentPlayerResponse, CurrentRoundResponse, DataResponse,
        PlayerQuery, PlayerStateResponse, ScoresResponse, StateResponse,
    },
    error::{AppError, ErrorBody},
    services::public_service,
    state::SharedState,
};

/// Read-only status routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/scores", get(get_scores))
        .route("/data", get(get_data))
        .route("/currentplayer", get(get_current_player))
        .route("/currentround", get(get_current_round))
        .route("/playerstate", get(get_player_state))
        .route("/npccharacters", get(get_characters))
}

/// Current phase of the session.
#[utoipa::path(
    get,
    path = "/state",
    tag = "public",
    responses((status = 200, description = "Current phase", body = StateResponse))
)]
pub async fn get_state(State(state): State<SharedState>) -> Json<StateResponse> {
    Json(public_service::get_state(&state).await)
}

/// Scoreboard in join order.
#[utoipa::path(
    get,
    path = "/scores",
    tag = "public",
    responses((status = 200, description = "Scoreboard", body = ScoresResponse))
)]
pub async fn get_scores(State(state): State<SharedState>) -> Json<ScoresResponse> {
    Json(public_service::get_scores(&state).await)
}

/// Raw package document and participants.
#[utoipa::path(
    get,
    path = "/data",
    tag = "public",
    responses((status = 200, description = "Package and players", body = DataResponse))
)]
pub async fn get_data(State(state): State<SharedState>) -> Json<DataResponse> {
    Json(public_service::get_data(&state).await)
}

/// Player holding the turn.
#[utoipa::path(
    get,
    path = "/currentplayer",
    tag = "public",
    responses((status = 200, description = "Player holding the turn", body = CurrentPlayerResponse))
)]
pub async fn get_current_player(State(state): State<SharedState>) -> Json<CurrentPlayerResponse> {
    Json(public_service::get_current_player(&state).await)
}

/// Active round.
#[utoipa::path(
    get,
    path = "/currentround",
    tag = "public",
    responses((status = 200, description = "Active round", body = CurrentRoundResponse))
)]
pub async fn get_current_round(State(state): State<SharedState>) -> Json<CurrentRoundResponse> {
    Json(public_service::get_current_round(&state).await)
}

/// Name and score of one participant.
#[utoipa::path(
    get,
    path = "/playerstate",
    tag = "public",
    params(PlayerQuery),
    responses(
        (status = 200, description = "Player state", body = PlayerStateResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn get_player_state(
    State(state): State<SharedState>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<PlayerStateResponse>, AppError> {
    query.validate()?;
    let player = public_service::get_player_state(&state, query.id).await?;
    Ok(Json(player))
}

/// Characters available for NPC joins.
#[utoipa::path(
    get,
    path = "/npccharacters",
    tag = "public",
    responses((status = 200, description = "NPC characters", body = [CharacterSummary]))
)]
pub async fn get_characters(State(state): State<SharedState>) -> Json<Vec<CharacterSummary>> {
    Json(public_service::list_characters(&state))
}
