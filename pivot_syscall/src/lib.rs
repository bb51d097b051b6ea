//! Pivot's convenient syscall collections.

mod nofile;
mod socket;

pub use nofile::*;
pub use socket::*;

pub use socket2;
