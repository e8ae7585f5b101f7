//! Type definitions for the relay
//!
//! This module contains the persisted session record, throwaway identities,
//! and the response shapes of the HTTP surface.

pub mod identity;
pub mod response;
pub mod session;

pub use identity::Identity;
pub use response::{ErrorResponse, PingResponse, SessionStatusResponse};
pub use session::Session;
