/// OpenAPI documentation generation.
pub mod documentation;
/// Publication of session effects.
pub mod events;
/// Show commands.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Extension point for automated contestants.
pub mod npc;
/// Read-only projections of the session.
pub mod public_service;
/// Server-Sent Events viewers.
pub mod sse_service;
/// Delivery of elapsed timers to the session.
pub mod timer_service;
/// WebSocket viewers.
pub mod websocket_service;
