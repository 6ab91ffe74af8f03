//! Utils Module - Shared Helpers
//!
//! Constants, revoke calldata decoding and the validity scope used to
//! drop results that land after a view is gone.

pub mod constants;
pub mod decoder;
pub mod validity;

pub use constants::*;
pub use decoder::*;
pub use validity::*;
