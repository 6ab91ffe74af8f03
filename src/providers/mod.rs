//! Providers Module - External Collaborators
//!
//! The HTTP gateway to the Shield backend and the session credentials
//! it borrows from the identity provider.

pub mod credentials;
pub mod gateway;

pub use credentials::*;
pub use gateway::*;
