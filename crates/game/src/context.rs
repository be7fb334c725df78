//! # Game Context
//!
//! Channel-wide collaborators shared by every session handler.
//!
//! # Thread Safety
//! Every field is `Send + Sync` and cheap to share; one context is built at
//! startup and handed to each connection behind an `Arc`.

use std::sync::Arc;

use mserver_core::{SeedSource, ThreadRngSeeds};
use mserver_skills::EffectCache;
use mserver_storage::CharacterStore;

use crate::char_data::{BasicCharData, CharDataEncoder};
use crate::coordinator::{ChannelCoordinator, LocalCoordinator};
use crate::cooldown::CooldownManager;
use crate::field::{BasicField, FieldDelegate};
use crate::registry::PlayerRegistry;

pub struct GameContext {
    pub world: u8,
    /// 1-based channel number
    pub channel: u8,
    pub store: Arc<dyn CharacterStore>,
    pub effects: Arc<EffectCache>,
    pub cooldowns: CooldownManager,
    pub registry: PlayerRegistry,
    pub coordinator: Arc<dyn ChannelCoordinator>,
    pub field: Arc<dyn FieldDelegate>,
    pub seeds: Arc<dyn SeedSource>,
    pub char_data: Arc<dyn CharDataEncoder>,
}

impl GameContext {
    /// Context with the in-process collaborators
    ///
    /// # Arguments
    /// * `store` - Character and account persistence
    /// * `effects` - Skill effect cache, possibly still empty
    pub fn new(world: u8, channel: u8, store: Arc<dyn CharacterStore>, effects: Arc<EffectCache>) -> Self {
        let registry = PlayerRegistry::new();
        Self {
            world,
            channel,
            store,
            effects,
            cooldowns: CooldownManager::new(),
            coordinator: Arc::new(LocalCoordinator::new(registry.clone())),
            registry,
            field: Arc::new(BasicField::new()),
            seeds: Arc::new(ThreadRngSeeds),
            char_data: Arc::new(BasicCharData),
        }
    }

    pub fn with_coordinator(mut self, coordinator: Arc<dyn ChannelCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_field(mut self, field: Arc<dyn FieldDelegate>) -> Self {
        self.field = field;
        self
    }

    pub fn with_seeds(mut self, seeds: Arc<dyn SeedSource>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_char_data(mut self, encoder: Arc<dyn CharDataEncoder>) -> Self {
        self.char_data = encoder;
        self
    }
}
