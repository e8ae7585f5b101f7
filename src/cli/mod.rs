//! Command-line entry points
//!
//! Contains the logic behind the two binary modes: the HTTP server and the
//! one-shot local-file conversion.

pub mod convert;
pub mod server;
