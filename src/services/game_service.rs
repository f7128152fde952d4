//! Command handlers of the show. Each command runs as one critical section over
//! the session; only the judge call of `answer` happens outside of it.

use axum::body::Bytes;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    dao::{characters::NpcCharacter, judge::Verdict},
    dto::game::{AnswerRequest, AnswerResponse, JoinRequest, JoinedResponse, SelectQuestionRequest},
    error::ServiceError,
    services::events,
    state::{
        SharedState,
        game::{Effects, GameSession, HOST_PLAYER_ID, PendingAnswer, PlayerId},
        package::QuestionKey,
    },
};

/// Replace the package, wiping players and progress.
pub async fn upload(state: &SharedState, bytes: Bytes) -> Result<(), ServiceError> {
    let document = state.packages().extract(bytes).await.inspect_err(|err| {
        warn!(error = %err, "package upload rejected");
    })?;
    let name = document.package.name.clone();
    let rounds = document.package.round_count();

    run_command(state, |session| Ok(((), session.load_package(document)))).await?;
    info!(package = %name, rounds, "package installed");
    Ok(())
}

/// Wipe the session, package included.
pub async fn reset(state: &SharedState) -> Result<(), ServiceError> {
    run_command(state, |session| Ok(((), session.reset()))).await?;
    info!("session reset");
    Ok(())
}

/// Add or rename a human player.
pub async fn join(state: &SharedState, request: JoinRequest) -> Result<(), ServiceError> {
    let JoinRequest { id, name, photo } = request;
    let name = name.trim().to_string();
    run_command(state, |session| {
        session.join(id, name.clone(), photo)?;
        Ok(((), Effects::default()))
    })
    .await?;
    info!(player_id = id, name = %name, "player joined");
    Ok(())
}

/// Add an NPC contestant created from a roster character.
pub async fn join_npc(state: &SharedState, character: &str) -> Result<JoinedResponse, ServiceError> {
    let character = find_character(state, character)?;
    let id = run_command(state, |session| {
        let id = session.join_npc(character.persona(), character.photo.clone())?;
        Ok((id, Effects::default()))
    })
    .await?;
    info!(player_id = id, character = %character.name, "NPC joined");
    Ok(JoinedResponse {
        id,
        name: character.name,
    })
}

/// Put a roster character in the host slot.
pub async fn join_showman(
    state: &SharedState,
    character: &str,
) -> Result<JoinedResponse, ServiceError> {
    let character = find_character(state, character)?;
    run_command(state, |session| {
        session.join_host(character.persona(), character.photo.clone())?;
        Ok(((), Effects::default()))
    })
    .await?;
    info!(player_id = HOST_PLAYER_ID, character = %character.name, "host joined");
    Ok(JoinedResponse {
        id: HOST_PLAYER_ID,
        name: character.name,
    })
}

/// Leave the lobby.
pub async fn start(state: &SharedState) -> Result<(), ServiceError> {
    run_effects(state, GameSession::start).await
}

/// Record a start acknowledgement.
pub async fn start_acknowledge(state: &SharedState, player_id: PlayerId) -> Result<(), ServiceError> {
    run_effects(state, |session| session.start_acknowledge(player_id)).await
}

/// Pick a question for the current player.
pub async fn select_question(
    state: &SharedState,
    request: SelectQuestionRequest,
) -> Result<(), ServiceError> {
    let key = QuestionKey::new(request.round, request.theme, request.question)?;
    run_effects(state, |session| session.select_question(key, request.player_id)).await
}

/// Record that a client rendered the question.
pub async fn question_shown(state: &SharedState, player_id: PlayerId) -> Result<(), ServiceError> {
    run_effects(state, |session| session.question_shown(player_id)).await
}

/// Register a buzz.
pub async fn request_answer(state: &SharedState, player_id: PlayerId) -> Result<(), ServiceError> {
    run_effects(state, |session| session.request_answer(player_id)).await
}

/// Record that a player's countdown ran out.
pub async fn timer_done(state: &SharedState, player_id: PlayerId) -> Result<(), ServiceError> {
    run_effects(state, |session| session.timer_done(player_id)).await
}

/// Judge an answer and score it.
///
/// The session is only marked as judging while the judge runs, so reads and
/// other commands are served meanwhile. A failing or slow judge leaves the
/// session exactly as it was and the answer can be submitted again.
pub async fn answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let key: QuestionKey = request.id_quest.parse()?;
    let pending = {
        let mut session = state.session().lock().await;
        session.begin_answer(key, request.player_id, &request.text)?
    };
    info!(player_id = request.player_id, question = %key, "answer submitted for judging");

    // Detached so a dropped request cannot leave the session judging.
    let task_state = state.clone();
    tokio::spawn(async move { resolve_answer(task_state, pending, request.text).await })
        .await
        .map_err(|err| ServiceError::ExternalService(format!("judge task failed: {err}")))?
}

async fn resolve_answer(
    state: SharedState,
    pending: PendingAnswer,
    text: String,
) -> Result<AnswerResponse, ServiceError> {
    let PendingAnswer { ticket, request } = pending;
    let judge = state.judge();
    let limit = state.config().judge_timeout;

    let verdict: Result<Verdict, ServiceError> = match timeout(limit, judge.judge(request)).await {
        Ok(Ok(verdict)) => Ok(verdict),
        Ok(Err(err)) => {
            warn!(judge = judge.name(), error = %err, "judge call failed");
            Err(err.into())
        }
        Err(_) => {
            warn!(judge = judge.name(), timeout_ms = limit.as_millis() as u64, "judge call timed out");
            Err(ServiceError::Timeout)
        }
    };

    let verdict = match verdict {
        Ok(verdict) => verdict,
        Err(err) => {
            state.session().lock().await.abort_answer(&ticket);
            return Err(err);
        }
    };

    let response = AnswerResponse {
        correct: verdict.correct,
        commentary: verdict.commentary.clone(),
    };
    run_effects(&state, |session| session.finish_answer(&ticket, text, verdict)).await?;
    info!(
        player_id = ticket.player_id(),
        question = %ticket.key(),
        correct = response.correct,
        "answer judged"
    );
    Ok(response)
}

fn find_character(state: &SharedState, name: &str) -> Result<NpcCharacter, ServiceError> {
    state
        .roster()
        .find(name)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("character `{}` not found", name.trim())))
}

async fn run_effects<F>(state: &SharedState, command: F) -> Result<(), ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<Effects, ServiceError>,
{
    run_command(state, |session| command(session).map(|effects| ((), effects))).await
}

/// Run `command` under the session lock, apply its effects before releasing
/// the lock, then hand NPC cues to the hook.
async fn run_command<T, F>(state: &SharedState, command: F) -> Result<T, ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<(T, Effects), ServiceError>,
{
    let (value, cues) = {
        let mut session = state.session().lock().await;
        let (value, effects) = command(&mut *session).inspect_err(|err| {
            warn!(error = %err, phase = session.phase().as_str(), "command rejected");
        })?;
        (value, events::apply_effects(state, effects))
    };

    events::dispatch_npc_cues(state, cues);
    Ok(value)
}
