//! Real-time relay over WebSocket.
//!
//! Connected clients authenticate in-band with the same bearer token used
//! on the REST side, join rooms derived from their verified identity, and
//! receive domain events scoped by room membership. The relay keeps no
//! state across disconnects and offers no delivery guarantee: fan-out is
//! fire-and-forget.

mod handler;
mod messages;
mod registry;
mod relay;

pub use handler::{ws_handler, RelayState};
pub use messages::{ClientMessage, ServerMessage};
pub use registry::ConnectionRegistry;
pub use relay::Relay;
