//! MServer Skills - Skill effect data
//!
//! Loads per-level combat parameters for player and mob skills from a
//! [`mserver_storage::SkillDataSource`] and serves them from a shared
//! in-process [`EffectCache`].
//!
//! ## Layout
//!
//! - [`tables`]: static buff / charged / ammunition id sets
//! - [`effects`]: one immutable record per (skill, level)
//! - [`stats`]: all levels of one skill plus its classification
//! - [`loader`]: row grouping and store queries
//! - [`cache`]: memoizing cache with atomic refresh

pub mod cache;
pub mod effects;
pub mod error;
pub mod loader;
pub mod stats;
pub mod tables;

pub use cache::{EffectCache, EffectCacheStats};
pub use effects::{Ammunition, MobSkillEffect, PlayerSkillEffect, Summon};
pub use error::{Result, SkillError};
pub use stats::{MobSkillStats, SkillStats};
