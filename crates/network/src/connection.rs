//! # Player Connection
//!
//! Runs one client connection from accept to cleanup.
//!
//! # Framing
//!
//! Every frame on the wire is a 2-byte little-endian length followed by that
//! many bytes: a 2-byte opcode and the packet body. [`frame_codec`] builds the
//! matching `LengthDelimitedCodec`.
//!
//! # Ordering
//!
//! The connection task owns its [`Session`] and is the only thing that
//! touches it. Inbound frames, session events (cooldown expiry, kicks) and
//! keep-alive ticks are handled one at a time in the order the loop picks
//! them, so handlers for one session never overlap.
//!
//! # Lifecycle
//!
//! ```text
//! accept ─> loop { close | outbound | event | inbound | ping } ─> flush ─> disconnect
//! ```
//!
//! The loop ends when the session is closed by a handler, the client hangs
//! up, a read or write fails, or the client misses pongs for longer than the
//! configured timeout.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use mserver_core::SessionId;
use mserver_game::handlers::{disconnect, handle_event};
use mserver_game::{GameContext, Outbound, Session, SessionEvent};
use mserver_protocol::build_ping;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use crate::config::{NetworkConfig, MAX_FRAME_LENGTH};
use crate::handlers::HandlerRegistry;

/// Codec for the 2-byte little-endian length prefix
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(2)
        .little_endian()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

/// One client connection
///
/// # Purpose
/// Owns the transport, the session and both of the session's queues.
/// Generic over the stream so tests can drive it through an in-memory pipe.
pub struct PlayerConnection<S> {
    framed: Framed<S, LengthDelimitedCodec>,
    session: Session,
    frames: mpsc::UnboundedReceiver<Bytes>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    ctx: Arc<GameContext>,
    handlers: Arc<HandlerRegistry>,
    config: NetworkConfig,
}

impl<S> PlayerConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an accepted stream in a fresh `Connected` session
    pub fn new(
        stream: S,
        id: SessionId,
        ctx: Arc<GameContext>,
        handlers: Arc<HandlerRegistry>,
        config: NetworkConfig,
    ) -> Self {
        let (outbound, frames) = Outbound::channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let session = Session::new(id, ctx.world, ctx.channel, outbound, events_tx);
        Self {
            framed: Framed::new(stream, frame_codec()),
            session,
            frames,
            events,
            ctx,
            handlers,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sender for posting events to this connection's session
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.session.events().clone()
    }

    /// Run until the connection ends, then clean up the session
    pub async fn run(self) {
        let Self {
            framed,
            mut session,
            mut frames,
            mut events,
            ctx,
            handlers,
            config,
        } = self;
        let id = session.id();
        let close = session.close_token();
        let (mut sink, mut stream) = framed.split();

        let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Session {} connected", id);

        loop {
            tokio::select! {
                biased;

                _ = close.cancelled() => break,

                Some(frame) = frames.recv() => {
                    if let Err(e) = sink.send(frame).await {
                        warn!("Session {} write error: {}", id, e);
                        break;
                    }
                }

                Some(event) = events.recv() => handle_event(&mut session, event),

                inbound = stream.next() => match inbound {
                    Some(Ok(frame)) => handlers.handle_frame(&ctx, &mut session, frame.freeze()).await,
                    Some(Err(e)) => {
                        warn!("Session {} read error: {}", id, e);
                        break;
                    }
                    None => {
                        info!("Session {} closed by client", id);
                        break;
                    }
                },

                _ = ping.tick() => {
                    if session.last_pong().elapsed() >= config.connection_timeout {
                        warn!("Session {} timed out", id);
                        break;
                    }
                    session.send(build_ping());
                }
            }
        }

        // Frames queued just before a close still go out
        while let Ok(frame) = frames.try_recv() {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
        if let Some(reason) = session.close_reason() {
            debug!("Session {} closing: {}", id, reason);
        }

        disconnect(&ctx, &mut session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use mserver_core::{AccountId, OnlineState};
    use mserver_protocol::{SendOpcode, PacketIn, RecvOpcode};
    use mserver_storage::{CharacterStore, MemoryStore};
    use std::time::Duration;
    use tokio::io::DuplexStream;

    const CONNECT_HERO: [u8; 6] = [0x14, 0x00, 0x01, 0x00, 0x00, 0x00];

    fn connect(
        config: NetworkConfig,
    ) -> (
        Framed<DuplexStream, LengthDelimitedCodec>,
        tokio::task::JoinHandle<()>,
        Arc<MemoryStore>,
    ) {
        let (ctx, store) = context();
        let (client, server) = tokio::io::duplex(64 * 1024);
        let connection = PlayerConnection::new(
            server,
            SessionId(1),
            Arc::new(ctx),
            Arc::new(HandlerRegistry::channel()),
            config,
        );
        let task = tokio::spawn(connection.run());
        (Framed::new(client, frame_codec()), task, store)
    }

    fn opcode(frame: &[u8]) -> u16 {
        PacketIn::from_frame(Bytes::copy_from_slice(frame)).unwrap().opcode
    }

    #[test]
    fn test_frame_codec_is_little_endian() {
        use tokio_util::codec::Encoder;
        let mut codec = frame_codec();
        let mut out = bytes::BytesMut::new();
        codec.encode(Bytes::from_static(&[0x11, 0x00, 0xAA]), &mut out).unwrap();
        assert_eq!(&out[..], &[0x03, 0x00, 0x11, 0x00, 0xAA]);
    }

    #[tokio::test]
    async fn test_entry_then_hang_up() {
        let (mut client, task, store) = connect(NetworkConfig::default());

        client.send(Bytes::from_static(&CONNECT_HERO)).await.unwrap();
        let first = client.next().await.unwrap().unwrap();
        assert_eq!(opcode(&first), SendOpcode::ChangeMap.as_u16());
        assert_eq!(store.online_state(AccountId(10)).unwrap(), OnlineState::InGame);

        drop(client);
        task.await.unwrap();
        assert_eq!(store.online_state(AccountId(10)).unwrap(), OnlineState::Offline);
    }

    #[tokio::test]
    async fn test_double_login_closes_connection() {
        let (mut client, task, store) = connect(NetworkConfig::default());
        store.set_online_state(AccountId(10), OnlineState::LoggedIn).unwrap();

        client.send(Bytes::from_static(&CONNECT_HERO)).await.unwrap();
        assert!(client.next().await.is_none());
        task.await.unwrap();
        // Never entered, so the account state is left alone
        assert_eq!(store.online_state(AccountId(10)).unwrap(), OnlineState::LoggedIn);
    }

    #[tokio::test]
    async fn test_unknown_frame_does_not_end_connection() {
        let (mut client, task, _store) = connect(NetworkConfig::default());

        client.send(Bytes::from_static(&[0xFF, 0x7F, 0x00])).await.unwrap();
        client.send(Bytes::from_static(&CONNECT_HERO)).await.unwrap();
        let first = client.next().await.unwrap().unwrap();
        assert_eq!(opcode(&first), SendOpcode::ChangeMap.as_u16());

        drop(client);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_pongs_time_out() {
        let config = NetworkConfig {
            ping_interval: Duration::from_secs(1),
            connection_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let (mut client, task, _store) = connect(config);

        let mut pings = 0;
        while let Some(frame) = client.next().await {
            assert_eq!(opcode(&frame.unwrap()), SendOpcode::Ping.as_u16());
            pings += 1;
        }
        assert_eq!(pings, 2);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pongs_keep_connection_alive() {
        let config = NetworkConfig {
            ping_interval: Duration::from_secs(1),
            connection_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let (mut client, task, _store) = connect(config);
        let pong = Bytes::copy_from_slice(&RecvOpcode::Pong.as_u16().to_le_bytes());

        for _ in 0..6 {
            let frame = client.next().await.unwrap().unwrap();
            assert_eq!(opcode(&frame), SendOpcode::Ping.as_u16());
            client.send(pong.clone()).await.unwrap();
        }
        assert!(!task.is_finished());

        drop(client);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_kick_event_ends_connection() {
        let (ctx, _store) = context();
        let (client, server) = tokio::io::duplex(1024);
        let connection = PlayerConnection::new(
            server,
            SessionId(9),
            Arc::new(ctx),
            Arc::new(HandlerRegistry::channel()),
            NetworkConfig::default(),
        );
        let events = connection.events();
        let task = tokio::spawn(connection.run());

        events
            .send(SessionEvent::Kick {
                reason: "maintenance".into(),
            })
            .unwrap();
        task.await.unwrap();

        let mut client = Framed::new(client, frame_codec());
        assert!(client.next().await.is_none());
    }
}
