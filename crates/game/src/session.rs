//! # Session
//!
//! Server-side state of one client connection.
//!
//! # State Machine
//!
//! ```text
//! Connected ──> CharSelected ──> Migrating <──> InGame
//!     └───────────────────────────────^
//! any ──> Disconnected
//! ```
//!
//! The `Connected -> Migrating` edge is how a fresh channel connection adopts
//! the handoff marker the previous server persisted. `InGame` is only ever
//! entered from `Migrating`.
//!
//! # Thread Safety
//! A session is owned by its connection task and never shared. Other tasks
//! reach it through [`Outbound`] (frames to the client) and the event queue
//! ([`SessionEvent`]), both of which are processed in order by the owner.

use bytes::Bytes;
use mserver_core::{AccountId, Result, ServerError, SessionId, SkillId};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::character::Character;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connected,
    CharSelected,
    Migrating,
    InGame,
    Disconnected,
}

impl SessionState {
    /// Whether `self -> next` is a legal edge
    pub fn can_transition(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Disconnected, _) => false,
            (_, Disconnected) => true,
            (Connected, CharSelected) | (Connected, Migrating) => true,
            (CharSelected, Migrating) => true,
            (Migrating, InGame) | (InGame, Migrating) => true,
            _ => false,
        }
    }
}

/// Message posted to a session from outside its connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A cooldown timer elapsed
    CooldownExpired { skill: SkillId },
    /// Close the connection
    Kick { reason: String },
}

/// Cloneable sender of finished frames to one client
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl Outbound {
    pub fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        Self { tx }
    }

    /// A sender with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue a frame; returns `false` once the connection is gone
    pub fn send(&self, frame: Bytes) -> bool {
        self.tx.send(frame).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Session {
    id: SessionId,
    world: u8,
    channel: u8,
    state: SessionState,
    account: Option<AccountId>,
    character: Option<Character>,
    outbound: Outbound,
    events: mpsc::UnboundedSender<SessionEvent>,
    close: CancellationToken,
    close_reason: Option<String>,
    last_pong: Instant,
}

impl Session {
    /// Create a session in `Connected`
    ///
    /// # Arguments
    /// * `outbound` - Frames queued here are written to the client in order
    /// * `events` - Sender half of this session's event queue
    pub fn new(
        id: SessionId,
        world: u8,
        channel: u8,
        outbound: Outbound,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            id,
            world,
            channel,
            state: SessionState::Connected,
            account: None,
            character: None,
            outbound,
            events,
            close: CancellationToken::new(),
            close_reason: None,
            last_pong: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn world(&self) -> u8 {
        self.world
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn account(&self) -> Option<AccountId> {
        self.account
    }

    /// Move to `next`
    ///
    /// # Returns
    /// `InvalidState` if the edge is not part of the state machine; the
    /// state is unchanged in that case
    pub fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition(next) {
            return Err(ServerError::InvalidState(format!(
                "session {}: {:?} -> {:?}",
                self.id, self.state, next
            )));
        }
        debug!("Session {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Accept a connection handed over by another server for `account`
    pub fn adopt_handoff(&mut self, account: AccountId) -> Result<()> {
        self.transition(SessionState::Migrating)?;
        self.account = Some(account);
        Ok(())
    }

    /// Give the session its character once it is in game
    pub fn attach_character(&mut self, character: Character) {
        self.character = Some(character);
    }

    /// Record the account a character was picked from
    pub fn select_character(&mut self, account: AccountId) -> Result<()> {
        self.transition(SessionState::CharSelected)?;
        self.account = Some(account);
        Ok(())
    }

    /// Leave `InGame` for another server
    pub fn begin_migration(&mut self) -> Result<()> {
        self.transition(SessionState::Migrating)
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        self.character.as_mut()
    }

    pub fn take_character(&mut self) -> Option<Character> {
        self.character.take()
    }

    /// Queue a frame for the client
    pub fn send(&self, frame: Bytes) {
        if !self.outbound.send(frame) {
            debug!("Session {}: dropped frame for a closed connection", self.id);
        }
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub fn events(&self) -> &mpsc::UnboundedSender<SessionEvent> {
        &self.events
    }

    /// Ask the connection task to close; the first reason wins
    pub fn close(&mut self, reason: impl Into<String>) {
        if self.close_reason.is_none() {
            self.close_reason = Some(reason.into());
        }
        self.close.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_cancelled()
    }

    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Token the connection task selects on
    pub fn close_token(&self) -> CancellationToken {
        self.close.clone()
    }

    pub fn mark_pong(&mut self) {
        self.last_pong = Instant::now();
    }

    pub fn last_pong(&self) -> Instant {
        self.last_pong
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;

    #[test]
    fn test_legal_edges() {
        use SessionState::*;
        assert!(Connected.can_transition(CharSelected));
        assert!(Connected.can_transition(Migrating));
        assert!(CharSelected.can_transition(Migrating));
        assert!(Migrating.can_transition(InGame));
        assert!(InGame.can_transition(Migrating));
        for state in [Connected, CharSelected, Migrating, InGame] {
            assert!(state.can_transition(Disconnected));
        }
    }

    #[test]
    fn test_in_game_only_from_migrating() {
        use SessionState::*;
        for state in [Connected, CharSelected, InGame, Disconnected] {
            assert!(!state.can_transition(InGame));
        }
        assert!(!Disconnected.can_transition(Connected));
        assert!(!CharSelected.can_transition(Connected));
    }

    #[test]
    fn test_illegal_transition_keeps_state() {
        let mut h = Harness::new(1);
        assert!(matches!(
            h.session.transition(SessionState::InGame),
            Err(ServerError::InvalidState(_))
        ));
        assert_eq!(h.session.state(), SessionState::Connected);
    }

    #[test]
    fn test_select_then_migrate() {
        let mut h = Harness::new(1);
        h.session.select_character(AccountId(3)).unwrap();
        assert_eq!(h.session.account(), Some(AccountId(3)));
        h.session.transition(SessionState::Migrating).unwrap();
        h.session.transition(SessionState::InGame).unwrap();
        h.session.begin_migration().unwrap();
        assert_eq!(h.session.state(), SessionState::Migrating);
    }

    #[test]
    fn test_handoff_adoption() {
        let mut h = Harness::new(1);
        h.session.adopt_handoff(AccountId(4)).unwrap();
        assert_eq!(h.session.state(), SessionState::Migrating);
        assert_eq!(h.session.account(), Some(AccountId(4)));
        h.session.transition(SessionState::InGame).unwrap();
        // A second handoff on the same connection is not an edge
        assert!(h.session.adopt_handoff(AccountId(4)).is_err());
    }

    #[test]
    fn test_close_keeps_first_reason() {
        let mut h = Harness::new(1);
        let token = h.session.close_token();
        h.session.close("first");
        h.session.close("second");
        assert!(token.is_cancelled());
        assert_eq!(h.session.close_reason(), Some("first"));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let h = Harness::new(1);
        let Harness { session, frames, .. } = h;
        drop(frames);
        assert!(session.outbound().is_closed());
        session.send(Bytes::from_static(&[1, 2]));
    }
}
