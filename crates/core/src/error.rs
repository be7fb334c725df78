//! Core error types for MServer
//!
//! Every component converts its own failures into one of these variants at its
//! boundary. Only [`ServerError::ProtocolViolation`] and
//! [`ServerError::DoubleLogin`] terminate a session; everything else is logged
//! and the connection carries on.

use crate::CharacterId;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Malformed or truncated frame. The session is closed.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// No handler registered for an opcode. Logged only.
    #[error("Unknown opcode: 0x{0:04X}")]
    UnknownOpcode(u16),

    /// Character tried to enter the game without a pending migration.
    #[error("Double login attempt for character {character}")]
    DoubleLogin { character: CharacterId },

    /// A character or skill row is absent.
    #[error("Not found: {0}")]
    DataNotFound(String),

    /// Store unreachable or query failed. Callers treat it like `DataNotFound`.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Illegal session state transition.
    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServerError {
    /// Whether this error must end the session that produced it
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::ProtocolViolation(_) | ServerError::DoubleLogin { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
