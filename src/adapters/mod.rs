//! Read and write adapters behind the cache actor.

pub mod fetch;
pub mod simulated;

pub use fetch::*;
pub use simulated::*;
