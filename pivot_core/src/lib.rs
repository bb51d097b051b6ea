//! Pivot's core facilities.
//!
//! A pivot listens for connections whose first line names the next hop,
//! connects onward and relays both directions until they are done.
//! See [`directive`] for the line format and [`tcp`] for the relay.

pub mod dns;
pub mod tcp;
pub mod time;
pub mod error;
pub mod endpoint;
pub mod registry;
pub mod directive;

pub use error::{DispatchError, ParseError};
pub use registry::{Registry, SessionId, SessionInfo};
