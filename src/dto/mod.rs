/// Events pushed to viewers.
pub mod events;
/// Command payloads.
pub mod game;
/// Health check payload.
pub mod health;
/// Status read payloads.
pub mod public;
/// Custom validators.
pub mod validation;
