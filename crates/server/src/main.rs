//! MServer - channel server binary
//!
//! Usage: `mserver [config-file]` (default: `config/channel.txt`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use mserver_config::{ServerConfig, DEFAULT_CONFIG_PATH};
use mserver_game::GameContext;
use mserver_network::{ChannelServer, HandlerRegistry, NetworkConfig};
use mserver_skills::EffectCache;
use mserver_storage::JsonFileStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("MServer channel starting up");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = ServerConfig::load_from_file(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    config.display();

    let store = Arc::new(
        JsonFileStore::open(&config.data_dir)
            .with_context(|| format!("opening data directory {}", config.data_dir.display()))?,
    );

    let effects = Arc::new(EffectCache::new(store.clone()));
    if config.preload_skills {
        if effects.load_all() {
            let stats = effects.stats();
            info!("Preloaded {} skills and {} mob skills", stats.skills, stats.mob_skills);
        } else {
            warn!("Skill preload failed, effects will be loaded on demand");
        }
    }

    let ctx = Arc::new(GameContext::new(config.world, config.channel, store, effects));
    let server = ChannelServer::bind(network_config(&config), ctx, HandlerRegistry::channel()).await?;
    server.run().await?;

    info!("MServer channel shut down");
    Ok(())
}

/// Listener settings derived from the channel configuration
fn network_config(config: &ServerConfig) -> NetworkConfig {
    NetworkConfig {
        bind_address: config.socket_addr(),
        max_connections: config.max_players,
        ping_interval: config.ping_interval(),
        connection_timeout: config.connection_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_network_config_follows_channel_config() {
        let config = ServerConfig::parse("port = 7600\nmaxplayers = 3\npinginterval = 5\nconnectiontimeout = 20\n");
        let network = network_config(&config);
        assert_eq!(network.bind_address.port(), 7600);
        assert_eq!(network.max_connections, 3);
        assert_eq!(network.ping_interval, Duration::from_secs(5));
        assert_eq!(network.connection_timeout, Duration::from_secs(20));
        assert!(network.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid_for_network() {
        assert!(network_config(&ServerConfig::default()).validate().is_ok());
    }
}
