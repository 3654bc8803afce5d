//! Domain types shared by the synchronization core.

pub mod errors;
pub mod model;
