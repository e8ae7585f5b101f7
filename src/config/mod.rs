//! Configuration management for the relay
//!
//! This module handles loading and managing configuration settings
//! for both HTTP server and one-shot convert modes.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::Settings;
