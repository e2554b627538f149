//! Types shared by the round engine and the HTTP server.

pub mod event;
pub mod role;
pub mod round_status;

pub use event::{Event, GenericEvent, RoundEvent};
pub use role::{Role, permission};
pub use round_status::RoundStatus;
