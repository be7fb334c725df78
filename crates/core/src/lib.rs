//! MServer Core - Fundamental types and utilities

mod error;
mod types;
mod idgen;
mod positions;
mod rng;

pub use error::*;
pub use types::*;
pub use idgen::*;
pub use positions::*;
pub use rng::*;
