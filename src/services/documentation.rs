use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document of the show server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::game::upload,
        crate::routes::game::join,
        crate::routes::game::join_npc,
        crate::routes::game::join_showman,
        crate::routes::game::start,
        crate::routes::game::start_acknowledge,
        crate::routes::game::select_question,
        crate::routes::game::question_shown,
        crate::routes::game::request_answer,
        crate::routes::game::answer,
        crate::routes::game::timer_done,
        crate::routes::game::reset,
        crate::routes::public::get_state,
        crate::routes::public::get_scores,
        crate::routes::public::get_data,
        crate::routes::public::get_current_player,
        crate::routes::public::get_current_round,
        crate::routes::public::get_player_state,
        crate::routes::public::get_characters,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::events::ShowEvent,
            crate::dto::game::ActionResponse,
            crate::dto::game::JoinRequest,
            crate::dto::game::CharacterRequest,
            crate::dto::game::JoinedResponse,
            crate::dto::game::PlayerCommand,
            crate::dto::game::SelectQuestionRequest,
            crate::dto::game::AnswerRequest,
            crate::dto::game::AnswerResponse,
            crate::dto::public::ScoreEntry,
            crate::dto::public::PlayerRole,
            crate::dto::public::PlayerSummary,
            crate::dto::public::StateResponse,
            crate::dto::public::ScoresResponse,
            crate::dto::public::DataResponse,
            crate::dto::public::CurrentPlayerResponse,
            crate::dto::public::CurrentRoundResponse,
            crate::dto::public::PlayerStateResponse,
            crate::dto::public::CharacterSummary,
            crate::state::state_machine::GamePhase,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "game", description = "Commands driving the show"),
        (name = "public", description = "Read-only session status"),
        (name = "health", description = "Health check endpoints"),
        (name = "viewers", description = "Show event streams over SSE and WebSocket"),
    )
)]
pub struct ApiDoc;
