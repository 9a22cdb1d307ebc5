/// User and board management behind the admin routes.
pub mod admin_service;
/// Password login and session tokens.
pub mod auth_service;
/// Startup wiring of the store and the session.
pub mod bootstrap;
/// Countdown task driving `timerUpdate` ticks.
pub mod countdown;
/// OpenAPI documentation generation.
pub mod documentation;
/// Broadcast payload builders.
pub mod events;
/// Round control and answer scoring.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Ordered background writes to the document store.
pub mod persistence;
/// Read-only projections of the session.
pub mod public_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;

#[cfg(test)]
pub(crate) mod test_support;
