//! Core Module - Shield Client Logic
//!
//! Result normalization, the emergency revoke workflow, the status
//! aggregator and the analysis operations built on the gateway.

pub mod analysis;
pub mod normalizer;
pub mod revoke;
pub mod status;

pub use analysis::*;
pub use normalizer::*;
pub use revoke::*;
pub use status::*;
