//! Presentation helpers for the command line front end.

pub mod panel;
