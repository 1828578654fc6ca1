//! User-specific cache behaviour: identity and notification wording.

pub mod entity;
pub mod error;

pub use error::*;
