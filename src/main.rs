//! SIQ show server entrypoint wiring the session, REST commands, SSE and WebSocket viewers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siq_show_back::{
    config::AppConfig,
    dao::{
        characters::NpcRoster,
        judge::{AnswerJudge, exact::ExactMatchJudge},
        package_store::SiqJsonStore,
    },
    routes,
    services::npc::IdleNpcHook,
    state::{AppState, Collaborators, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let roster = NpcRoster::load(&config.characters_path);
    info!(characters = roster.len(), "NPC roster ready");

    let collaborators = Collaborators {
        judge: build_judge(&config)?,
        packages: Arc::new(SiqJsonStore),
        roster,
        npc_hook: Arc::new(IdleNpcHook),
    };
    let app_state = AppState::new(config, collaborators);
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the answer judge: the Anthropic API when a key is configured, exact
/// matching against the answer card otherwise.
#[cfg(feature = "anthropic-judge")]
fn build_judge(config: &AppConfig) -> anyhow::Result<Arc<dyn AnswerJudge>> {
    use siq_show_back::dao::judge::anthropic::{AnthropicConfig, AnthropicJudge};

    match AnthropicConfig::from_env(
        config.judge_model.clone(),
        config.judge_max_tokens,
        config.judge_timeout,
    ) {
        Some(anthropic) => {
            let judge = AnthropicJudge::new(anthropic).context("building Anthropic judge")?;
            info!(model = %config.judge_model, "answers judged by the Anthropic API");
            Ok(Arc::new(judge))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; answers judged by exact match");
            Ok(Arc::new(ExactMatchJudge))
        }
    }
}

#[cfg(not(feature = "anthropic-judge"))]
fn build_judge(_config: &AppConfig) -> anyhow::Result<Arc<dyn AnswerJudge>> {
    warn!("built without the anthropic-judge feature; answers judged by exact match");
    Ok(Arc::new(ExactMatchJudge))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
