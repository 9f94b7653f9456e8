//! Foundation value objects shared across the backend.

mod auth;
mod errors;
mod ids;
mod role;
mod room;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::ValidationError;
pub use ids::{ConnectionId, UserId};
pub use role::Role;
pub use room::RoomName;
pub use timestamp::Timestamp;
