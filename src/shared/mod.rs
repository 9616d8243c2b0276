/// Shared kernel - error types, result alias, identifiers and security helpers
pub mod error;
pub mod id;
pub mod result;
pub mod security;

pub use result::Result;
