//! # Packet Handler System
//!
//! Routes each inbound frame to the handler registered for its opcode.
//!
//! # Architecture
//!
//! ## Handler Registry
//!
//! The registry maps a [`RecvOpcode`] to an async handler function. A handler
//! borrows the shared [`GameContext`] and the session that received the frame,
//! and consumes the frame body.
//!
//! ## Error Policy
//!
//! [`HandlerRegistry::handle_frame`] decides what a failure means:
//! - unknown opcode: logged at debug with the raw bytes, frame dropped
//! - `ProtocolViolation` / `DoubleLogin`: session closed
//! - anything else: logged, connection carries on
//!
//! # Thread Safety
//!
//! The registry is immutable once built and shared across connection tasks
//! behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use futures::FutureExt;
//! use mserver_network::HandlerRegistry;
//! use mserver_protocol::RecvOpcode;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_function(RecvOpcode::Pong, |ctx, session, body| {
//!     mserver_game::handlers::handle_pong(ctx, session, body).boxed()
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use mserver_core::{Result, ServerError};
use mserver_game::handlers;
use mserver_game::{GameContext, Session};
use mserver_protocol::{PacketIn, PacketReader, RecvOpcode};
use tracing::{debug, error, warn};

/// Type for packet handler functions
///
/// # Purpose
/// Async function that handles one frame body for one session.
///
/// The returned future borrows the context and the session for `'a`, which
/// is what lets handlers mutate the session without locking it.
pub type HandlerFunction =
    Arc<dyn for<'a> Fn(&'a GameContext, &'a mut Session, PacketReader) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// Registry of packet handlers
///
/// # Purpose
/// Maintains a mapping from opcodes to handler functions.
/// Provides O(1) lookup and dispatch.
pub struct HandlerRegistry {
    /// Map from opcode to handler function
    handlers: HashMap<RecvOpcode, HandlerFunction>,
}

impl HandlerRegistry {
    /// Create an empty registry
    #[inline]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every handler a channel server answers
    ///
    /// # Returns
    /// Handlers for connection entry, keep-alive, client errors, movement
    /// and NPC dialogue, plus no-ops for the character-list chatter
    pub fn channel() -> Self {
        let mut registry = Self::new();
        for opcode in RecvOpcode::NO_OPS {
            registry.register_function(opcode, |ctx, session, body| handlers::handle_no_op(ctx, session, body).boxed());
        }
        registry.register_function(RecvOpcode::PlayerConnected, |ctx, session, body| {
            handlers::handle_player_connected(ctx, session, body).boxed()
        });
        registry.register_function(RecvOpcode::Pong, |ctx, session, body| {
            handlers::handle_pong(ctx, session, body).boxed()
        });
        registry.register_function(RecvOpcode::ClientError, |ctx, session, body| {
            handlers::handle_client_error(ctx, session, body).boxed()
        });
        registry.register_function(RecvOpcode::MovePlayer, |ctx, session, body| {
            handlers::handle_move_player(ctx, session, body).boxed()
        });
        registry.register_function(RecvOpcode::NpcTalk, |ctx, session, body| {
            handlers::handle_npc_talk(ctx, session, body).boxed()
        });
        registry.register_function(RecvOpcode::NpcTalkMore, |ctx, session, body| {
            handlers::handle_npc_talk_more(ctx, session, body).boxed()
        });
        registry
    }

    /// Register a handler function
    ///
    /// # Arguments
    /// * `opcode` - The opcode to handle; replaces any earlier handler
    /// * `handler` - Function to call for frames with this opcode
    pub fn register_function<F>(&mut self, opcode: RecvOpcode, handler: F)
    where
        F: for<'a> Fn(&'a GameContext, &'a mut Session, PacketReader) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        debug!("Registered handler for opcode: {:?}", opcode);
        self.handlers.insert(opcode, Arc::new(handler));
    }

    /// Dispatch a frame to its registered handler
    ///
    /// # Returns
    /// - `Ok(())` - Frame handled
    /// - `Err(UnknownOpcode)` - No handler; the frame has been logged
    /// - `Err(ProtocolViolation)` - Frame too short for an opcode, or the
    ///   handler read past its end
    /// - Any other error the handler returned
    pub async fn dispatch(&self, ctx: &GameContext, session: &mut Session, frame: Bytes) -> Result<()> {
        let packet = PacketIn::from_frame(frame.clone())?;
        let Some(handler) = packet.kind().and_then(|opcode| self.handlers.get(&opcode)) else {
            debug!(
                "Unhandled opcode 0x{:04X} ({} bytes): {:02X?}",
                packet.opcode,
                frame.len(),
                &frame[..]
            );
            return Err(ServerError::UnknownOpcode(packet.opcode));
        };
        handler(ctx, session, packet.body).await
    }

    /// Dispatch a frame and apply the error policy
    pub async fn handle_frame(&self, ctx: &GameContext, session: &mut Session, frame: Bytes) {
        match self.dispatch(ctx, session, frame).await {
            Ok(()) | Err(ServerError::UnknownOpcode(_)) => {}
            Err(e) if e.is_session_fatal() => {
                error!("Session {}: {}", session.id(), e);
                session.close(e.to_string());
            }
            Err(e) => warn!("Session {}: {}", session.id(), e),
        }
    }

    /// Check if a handler is registered for an opcode
    pub fn has_handler(&self, opcode: RecvOpcode) -> bool {
        self.handlers.contains_key(&opcode)
    }

    /// Get the number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use mserver_core::{AccountId, CharacterId, FixedSeeds, OnlineState};
    use mserver_game::GameContext;
    use mserver_skills::EffectCache;
    use mserver_storage::{AccountRow, CharacterRow, Dataset, MemoryStore};

    /// Context over a store holding character 1 ("Hero") awaiting entry
    pub fn context() -> (GameContext, Arc<MemoryStore>) {
        let mut data = Dataset::new();
        data.accounts.push(AccountRow {
            id: AccountId(10),
            name: "hero_acc".into(),
            privilege: 0,
            online_state: OnlineState::Migrating,
        });
        data.characters.push(CharacterRow {
            id: CharacterId(1),
            account_id: AccountId(10),
            name: "Hero".into(),
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new(data));
        let effects = Arc::new(EffectCache::new(store.clone()));
        let ctx = GameContext::new(0, 1, store.clone(), effects).with_seeds(Arc::new(FixedSeeds::new(vec![0])));
        (ctx, store)
    }
}
