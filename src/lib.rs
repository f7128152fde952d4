//! Library crate for siq-show-back, exposing modules for the binary and integration tests.

/// Runtime configuration.
pub mod config;
/// External collaborators: packages, judges, NPC roster.
pub mod dao;
/// Request, response and event payloads.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routers.
pub mod routes;
/// Command handlers, projections and viewer transports.
pub mod services;
/// Session state and its building blocks.
pub mod state;
