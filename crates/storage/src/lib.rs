//! MServer Storage - Persistence collaborator interfaces
//!
//! The channel consumes a relational schema it does not own. This crate gives
//! it typed rows ([`rows`]), the two query traits ([`SkillDataSource`],
//! [`CharacterStore`]) and two implementations: [`MemoryStore`] for tests and
//! [`JsonFileStore`] for a standalone channel.

pub mod dataset;
pub mod error;
pub mod json_file;
pub mod memory;
pub mod rows;
pub mod source;

pub use dataset::Dataset;
pub use error::{Result, StorageError};
pub use json_file::{JsonFileStore, DATA_FILE_NAME};
pub use memory::MemoryStore;
pub use rows::*;
pub use source::{CharacterStore, SkillDataSource};
