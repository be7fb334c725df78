//! # MServer Game Logic Layer
//!
//! Everything a channel does with a connected player once its frames are
//! decoded.
//!
//! ## Modules
//!
//! - `session` - Per-connection state machine and event queue
//! - `character` - In-game character and its owned tables
//! - `capabilities` - Buddy, inventory and cooldown views over a character
//! - `cooldown` - Channel-wide cooldown timers
//! - `registry` - Characters currently in game on this channel
//! - `coordinator` - Calls to the other channels of the world
//! - `field` - Map-side collaborator (movement, NPCs)
//! - `char_data` - Character block of the map-entry packet
//! - `context` - Shared collaborators handed to every handler
//! - `handlers` - Opcode handlers and session lifecycle

pub mod buddy;
pub mod capabilities;
pub mod char_data;
pub mod character;
pub mod context;
pub mod coordinator;
pub mod cooldown;
pub mod field;
pub mod handlers;
pub mod inventory;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use buddy::{Buddy, BuddyList};
pub use capabilities::{Cooldownable, HasBuddyList, HasInventory};
pub use char_data::{BasicCharData, CharDataEncoder};
pub use character::{ActiveBuff, Character, CharacterStats, QuestEntry, SkillEntry};
pub use context::GameContext;
pub use coordinator::{CarriedBuff, ChannelCoordinator, LocalCoordinator, HANDOFF_WINDOW};
pub use cooldown::{Cancelled, CooldownManager};
pub use field::{BasicField, FieldDelegate};
pub use inventory::{Inventory, InventoryTab, Item};
pub use registry::{PlayerHandle, PlayerRegistry};
pub use session::{Outbound, Session, SessionEvent, SessionState};
