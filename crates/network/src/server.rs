//! # Channel Server
//!
//! The TCP accept loop of one channel.
//!
//! # Architecture
//!
//! ## Components
//!
//! 1. **TCP Listener** - Accepts incoming connections
//! 2. **Connection Map** - Event senders of all live sessions (`DashMap`)
//! 3. **Handler Registry** - Shared by every connection task
//! 4. **ID Generator** - Assigns session ids
//!
//! Each accepted socket becomes a [`PlayerConnection`] running in its own
//! task, inside a `session` tracing span.
//!
//! # Shutdown
//!
//! When the shutdown future resolves the listener stops accepting, every
//! live session is kicked, and the server waits a grace period for their
//! cleanup (persisting logouts, presence updates) to finish.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mserver_network::{ChannelServer, HandlerRegistry, NetworkConfig};
//! # async fn start(ctx: Arc<mserver_game::GameContext>) -> mserver_core::Result<()> {
//! let server = ChannelServer::bind(NetworkConfig::default(), ctx, HandlerRegistry::channel()).await?;
//! server.run().await
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use mserver_core::{IdGenerator, Result, ServerError, SessionId};
use mserver_game::{GameContext, SessionEvent};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::NetworkConfig;
use crate::connection::PlayerConnection;
use crate::handlers::HandlerRegistry;

/// How long shutdown waits for kicked sessions to clean up
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Main channel server instance
///
/// # Purpose
/// Accepts client connections and spawns a connection task for each.
pub struct ChannelServer {
    /// Network configuration
    config: NetworkConfig,

    /// TCP listener for accepting connections
    listener: TcpListener,

    /// Live sessions
    /// Key: SessionId, Value: the session's event sender
    connections: Arc<DashMap<SessionId, mpsc::UnboundedSender<SessionEvent>>>,

    /// Shared collaborators handed to every handler
    ctx: Arc<GameContext>,

    /// Packet handler registry
    handlers: Arc<HandlerRegistry>,

    /// ID generator for sessions
    id_generator: IdGenerator,
}

impl ChannelServer {
    /// Validate the configuration and bind the listener
    ///
    /// # Errors
    /// - `Config` if the configuration is invalid
    /// - `Io` if the address cannot be bound
    pub async fn bind(config: NetworkConfig, ctx: Arc<GameContext>, handlers: HandlerRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ServerError::Config(format!("Invalid network configuration: {}", e)))?;

        let listener = TcpListener::bind(config.bind_address).await.map_err(|e| {
            ServerError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", config.bind_address, e),
            ))
        })?;

        info!(
            "Channel {} of world {} listening on {}",
            ctx.channel,
            ctx.world,
            listener.local_addr()?
        );
        info!(
            "Configuration: max_connections={}, ping_interval={:?}, connection_timeout={:?}",
            config.max_connections, config.ping_interval, config.connection_timeout
        );

        Ok(Self {
            config,
            listener,
            connections: Arc::new(DashMap::new()),
            ctx,
            handlers: Arc::new(handlers),
            id_generator: IdGenerator::new(),
        })
    }

    /// The address the listener actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Get the number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Ctrl-C received, initiating shutdown");
        })
        .await
    }

    /// Run the accept loop until `shutdown` resolves
    ///
    /// # Lifecycle
    ///
    /// ```text
    /// 1. Accept incoming connection
    /// 2. Check connection limit
    /// 3. Assign session ID
    /// 4. Spawn connection task
    /// 5. Repeat until shutdown
    /// ```
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((socket, addr)) => self.accept(socket, addr).await,
                    Err(e) => error!("Error accepting connection: {:?}", e),
                },

                _ = &mut shutdown => break,
            }
        }

        self.drain().await;
        Ok(())
    }

    async fn accept(&self, mut socket: tokio::net::TcpStream, addr: SocketAddr) {
        if self.connections.len() >= self.config.max_connections {
            warn!(
                "Connection from {} rejected: server full ({} connections)",
                addr,
                self.connections.len()
            );
            let _ = socket.shutdown().await;
            return;
        }
        if let Err(e) = socket.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
        }

        let id = self.id_generator.next_id();
        let connection = PlayerConnection::new(
            socket,
            id,
            self.ctx.clone(),
            self.handlers.clone(),
            self.config.clone(),
        );
        self.connections.insert(id, connection.events());

        let connections = self.connections.clone();
        let span = info_span!("session", id = %id, peer = %addr);
        tokio::spawn(
            async move {
                connection.run().await;
                connections.remove(&id);
                debug!("Connection task finished");
            }
            .instrument(span),
        );
    }

    /// Kick every live session and wait for their cleanup
    async fn drain(&self) {
        let live = self.connections.len();
        if live == 0 {
            info!("Channel server stopped");
            return;
        }

        info!("Kicking {} connections for shutdown", live);
        for entry in self.connections.iter() {
            let _ = entry.value().send(SessionEvent::Kick {
                reason: "Server shutting down".to_string(),
            });
        }

        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while !self.connections.is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = self.connections.len();
        if remaining > 0 {
            warn!("{} connections still open after the shutdown grace period", remaining);
        }
        info!("Channel server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::frame_codec;
    use crate::handlers::test_support::context;
    use bytes::Bytes;
    use futures::{SinkExt, StreamExt};
    use mserver_core::{AccountId, OnlineState};
    use mserver_protocol::{PacketIn, SendOpcode};
    use mserver_storage::CharacterStore;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio_util::codec::Framed;

    const CONNECT_HERO: [u8; 6] = [0x14, 0x00, 0x01, 0x00, 0x00, 0x00];

    fn local_config(max_connections: usize) -> NetworkConfig {
        NetworkConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            max_connections,
            ..Default::default()
        }
    }

    async fn enter(addr: SocketAddr) -> Framed<TcpStream, tokio_util::codec::LengthDelimitedCodec> {
        let mut client = Framed::new(TcpStream::connect(addr).await.unwrap(), frame_codec());
        client.send(Bytes::from_static(&CONNECT_HERO)).await.unwrap();
        let first = client.next().await.unwrap().unwrap();
        let opcode = PacketIn::from_frame(first.freeze()).unwrap().opcode;
        assert_eq!(opcode, SendOpcode::ChangeMap.as_u16());
        client
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (ctx, _store) = context();
        let result = ChannelServer::bind(local_config(0), Arc::new(ctx), HandlerRegistry::channel()).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_serves_then_shuts_down() {
        let (ctx, store) = context();
        let server = Arc::new(
            ChannelServer::bind(local_config(10), Arc::new(ctx), HandlerRegistry::channel())
                .await
                .unwrap(),
        );
        let addr = server.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let running = {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .run_until(async {
                        let _ = stopped.await;
                    })
                    .await
            })
        };

        let mut client = enter(addr).await;
        assert_eq!(server.connection_count(), 1);

        stop.send(()).unwrap();
        assert!(client.next().await.is_none());
        running.await.unwrap().unwrap();
        assert_eq!(server.connection_count(), 0);
        assert_eq!(store.online_state(AccountId(10)).unwrap(), OnlineState::Offline);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let (ctx, _store) = context();
        let server = Arc::new(
            ChannelServer::bind(local_config(1), Arc::new(ctx), HandlerRegistry::channel())
                .await
                .unwrap(),
        );
        let addr = server.local_addr().unwrap();
        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.run_until(std::future::pending()).await })
        };

        let _first = enter(addr).await;
        let mut second = Framed::new(TcpStream::connect(addr).await.unwrap(), frame_codec());
        assert!(second.next().await.is_none());
        assert_eq!(server.connection_count(), 1);

        running.abort();
    }
}
