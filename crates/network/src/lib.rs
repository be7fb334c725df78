//! # MServer Networking Layer
//!
//! Tokio-based transport for a channel server.
//!
//! ## Modules
//!
//! - [`config`] - Listener and keep-alive options
//! - [`connection`] - Per-connection frame loop
//! - [`handlers`] - Opcode to handler registry
//! - [`server`] - Accept loop

pub mod config;
pub mod connection;
pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use config::NetworkConfig;
pub use connection::{frame_codec, PlayerConnection};
pub use handlers::{HandlerFunction, HandlerRegistry};
pub use server::ChannelServer;
