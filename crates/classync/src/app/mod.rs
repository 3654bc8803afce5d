//! Application layer: the class synchronization protocol.

pub mod buffer;
pub mod commit;
pub mod notify;
pub mod ports;
pub mod selection;
pub mod session;
pub mod snapshot;
