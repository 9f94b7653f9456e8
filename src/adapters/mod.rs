//! Adapters - concrete implementations behind the ports, plus the HTTP
//! and WebSocket surfaces.

pub mod auth;
pub mod http;
pub mod websocket;
