use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::game::{
        ActionResponse, AnswerRequest, AnswerResponse, CharacterRequest, JoinRequest,
        JoinedResponse, PlayerCommand, SelectQuestionRequest,
    },
    error::{AppError, ErrorBody},
    services::game_service,
    state::SharedState,
};

/// Command routes driving the show.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/join", post(join))
        .route("/joinnpc", post(join_npc))
        .route("/joinshowman", post(join_showman))
        .route("/start", post(start))
        .route("/startacknowledge", post(start_acknowledge))
        .route("/selectquestion", post(select_question))
        .route("/questionbeenshown", post(question_shown))
        .route("/requestanswer", post(request_answer))
        .route("/answer", post(answer))
        .route("/timerdone", post(timer_done))
        .route("/reset", post(reset))
}

/// Install a question package (normalized SIQ JSON) and return to the lobby.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "game",
    request_body(content = String, content_type = "application/json", description = "Normalized SIQ document"),
    responses(
        (status = 200, description = "Package installed", body = ActionResponse),
        (status = 400, description = "Package rejected", body = ErrorBody)
    )
)]
pub async fn upload(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, AppError> {
    game_service::upload(&state, body).await?;
    Ok(Json(ActionResponse::new("package uploaded")))
}

/// Join the lobby as a human player.
#[utoipa::path(
    post,
    path = "/join",
    tag = "game",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player joined", body = ActionResponse),
        (status = 409, description = "Lobby closed", body = ErrorBody)
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::join(&state, payload).await?;
    Ok(Json(ActionResponse::new("joined")))
}

/// Add an NPC contestant.
#[utoipa::path(
    post,
    path = "/joinnpc",
    tag = "game",
    request_body = CharacterRequest,
    responses(
        (status = 200, description = "NPC joined", body = JoinedResponse),
        (status = 404, description = "Unknown character", body = ErrorBody)
    )
)]
pub async fn join_npc(
    State(state): State<SharedState>,
    Json(payload): Json<CharacterRequest>,
) -> Result<Json<JoinedResponse>, AppError> {
    payload.validate()?;
    let joined = game_service::join_npc(&state, &payload.character).await?;
    Ok(Json(joined))
}

/// Put an NPC character in the host slot.
#[utoipa::path(
    post,
    path = "/joinshowman",
    tag = "game",
    request_body = CharacterRequest,
    responses(
        (status = 200, description = "Host joined", body = JoinedResponse),
        (status = 404, description = "Unknown character", body = ErrorBody)
    )
)]
pub async fn join_showman(
    State(state): State<SharedState>,
    Json(payload): Json<CharacterRequest>,
) -> Result<Json<JoinedResponse>, AppError> {
    payload.validate()?;
    let joined = game_service::join_showman(&state, &payload.character).await?;
    Ok(Json(joined))
}

/// Start the game.
#[utoipa::path(
    post,
    path = "/start",
    tag = "game",
    responses(
        (status = 200, description = "Game started", body = ActionResponse),
        (status = 409, description = "Game cannot start", body = ErrorBody)
    )
)]
pub async fn start(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    game_service::start(&state).await?;
    Ok(Json(ActionResponse::new("game started")))
}

/// Confirm the start screen was shown.
#[utoipa::path(
    post,
    path = "/startacknowledge",
    tag = "game",
    request_body = PlayerCommand,
    responses(
        (status = 200, description = "Acknowledged", body = ActionResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn start_acknowledge(
    State(state): State<SharedState>,
    Json(payload): Json<PlayerCommand>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::start_acknowledge(&state, payload.player_id).await?;
    Ok(Json(ActionResponse::new("acknowledged")))
}

/// Pick a question from the table.
#[utoipa::path(
    post,
    path = "/selectquestion",
    tag = "game",
    request_body = SelectQuestionRequest,
    responses(
        (status = 200, description = "Question selected", body = ActionResponse),
        (status = 409, description = "Selection rejected", body = ErrorBody)
    )
)]
pub async fn select_question(
    State(state): State<SharedState>,
    Json(payload): Json<SelectQuestionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::select_question(&state, payload).await?;
    Ok(Json(ActionResponse::new("question selected")))
}

/// Confirm the current question was rendered.
#[utoipa::path(
    post,
    path = "/questionbeenshown",
    tag = "game",
    request_body = PlayerCommand,
    responses(
        (status = 200, description = "Recorded", body = ActionResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn question_shown(
    State(state): State<SharedState>,
    Json(payload): Json<PlayerCommand>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::question_shown(&state, payload.player_id).await?;
    Ok(Json(ActionResponse::new("recorded")))
}

/// Buzz in.
#[utoipa::path(
    post,
    path = "/requestanswer",
    tag = "game",
    request_body = PlayerCommand,
    responses(
        (status = 200, description = "Buzz registered", body = ActionResponse),
        (status = 409, description = "Buzz rejected", body = ErrorBody)
    )
)]
pub async fn request_answer(
    State(state): State<SharedState>,
    Json(payload): Json<PlayerCommand>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::request_answer(&state, payload.player_id).await?;
    Ok(Json(ActionResponse::new("buzz registered")))
}

/// Answer the selected question.
#[utoipa::path(
    post,
    path = "/answer",
    tag = "game",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer judged", body = AnswerResponse),
        (status = 409, description = "Answer rejected", body = ErrorBody),
        (status = 502, description = "Judge failed; the answer can be retried", body = ErrorBody),
        (status = 504, description = "Judge timed out; the answer can be retried", body = ErrorBody)
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    payload.validate()?;
    let verdict = game_service::answer(&state, payload).await?;
    Ok(Json(verdict))
}

/// Report that a client's countdown ran out.
#[utoipa::path(
    post,
    path = "/timerdone",
    tag = "game",
    request_body = PlayerCommand,
    responses(
        (status = 200, description = "Recorded", body = ActionResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn timer_done(
    State(state): State<SharedState>,
    Json(payload): Json<PlayerCommand>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    game_service::timer_done(&state, payload.player_id).await?;
    Ok(Json(ActionResponse::new("recorded")))
}

/// Wipe the session.
#[utoipa::path(
    post,
    path = "/reset",
    tag = "game",
    responses((status = 200, description = "Session reset", body = ActionResponse))
)]
pub async fn reset(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    game_service::reset(&state).await?;
    Ok(Json(ActionResponse::new("session reset")))
}
