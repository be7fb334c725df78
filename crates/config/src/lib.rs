//! MServer Configuration Management
//!
//! Loads a channel's settings from `config/channel.txt`.
//!
//! # Format
//!
//! One `key = value` pair per line. Lines starting with `#` and blank lines
//! are skipped, unknown keys are ignored, and a value that does not parse
//! leaves the default in place (with a warning). A missing file yields the
//! defaults.
//!
//! ```text
//! # Scania, channel 1
//! name = Scania
//! world = 0
//! channel = 1
//! bindaddress = 0.0.0.0
//! port = 7575
//! maxplayers = 1000
//! datadir = data
//! preloadskills = true
//! pinginterval = 30
//! connectiontimeout = 90
//! ```

use std::fs;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use mserver_core::Result;

/// Where [`ServerConfig::load_default`] looks
pub const DEFAULT_CONFIG_PATH: &str = "config/channel.txt";

/// Settings of one channel server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// World name (from "name", default: "Scania")
    pub name: String,
    /// World index (from "world", default: 0)
    pub world: u8,
    /// 1-based channel number (from "channel", default: 1)
    pub channel: u8,
    /// Interface to listen on (from "bindaddress", default: 0.0.0.0)
    pub bind_address: IpAddr,
    /// Listener port (from "port", default: 7575)
    pub port: u16,
    /// Connection limit (from "maxplayers", default: 1000)
    pub max_players: usize,
    /// Directory holding `channel_data.json` (from "datadir", default: "data")
    pub data_dir: PathBuf,
    /// Bulk-load skill effects at startup (from "preloadskills", default: true)
    pub preload_skills: bool,
    /// Seconds between keep-alive pings (from "pinginterval", default: 30)
    pub ping_interval_secs: u64,
    /// Seconds without a pong before a client is dropped
    /// (from "connectiontimeout", default: 90)
    pub connection_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "Scania".to_string(),
            world: 0,
            channel: 1,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 7575,
            max_players: 1000,
            data_dir: PathBuf::from("data"),
            preload_skills: true,
            ping_interval_secs: 30,
            connection_timeout_secs: 90,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a file
    ///
    /// # Returns
    /// - The parsed configuration, or the defaults if the file does not exist
    /// - `Io` if the file exists but cannot be read
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("{} not found, using default configuration", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load `config/channel.txt` relative to the working directory
    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Parse file content
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => config.parse_option(&key.trim().to_lowercase(), value.trim()),
                None => tracing::debug!("Ignoring config line without '=': {}", line),
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "name" => self.name = value.to_string(),
            "world" => set_parsed(&mut self.world, key, value),
            "channel" => {
                set_parsed(&mut self.channel, key, value);
                if self.channel == 0 {
                    tracing::warn!("channel is 1-based, using 1");
                    self.channel = 1;
                }
            }
            "bindaddress" => set_parsed(&mut self.bind_address, key, value),
            "port" => set_parsed(&mut self.port, key, value),
            "maxplayers" => set_parsed(&mut self.max_players, key, value),
            "datadir" => self.data_dir = PathBuf::from(value),
            "preloadskills" => match parse_bool(value) {
                Some(flag) => self.preload_skills = flag,
                None => tracing::warn!("Invalid value for preloadskills: {:?}", value),
            },
            "pinginterval" => set_parsed(&mut self.ping_interval_secs, key, value),
            "connectiontimeout" => set_parsed(&mut self.connection_timeout_secs, key, value),
            _ => tracing::debug!("Unknown config option: {} = {}", key, value),
        }
    }

    /// Address for the TCP listener
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Log a configuration summary
    pub fn display(&self) {
        tracing::info!("Server configuration:");
        tracing::info!("  World: {} ({}), channel {}", self.name, self.world, self.channel);
        tracing::info!("  Bind: {}", self.socket_addr());
        tracing::info!("  Max players: {}", self.max_players);
        tracing::info!("  Data directory: {}", self.data_dir.display());
        tracing::info!("  Preload skills: {}", self.preload_skills);
        tracing::info!(
            "  Keep-alive: ping every {}s, timeout {}s",
            self.ping_interval_secs,
            self.connection_timeout_secs
        );
    }
}

/// Overwrite `slot` if `value` parses, otherwise warn and keep the default
fn set_parsed<T: FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!("Invalid value for {}: {:?}", key, value),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7575);
        assert_eq!(config.channel, 1);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:7575");
        assert!(config.connection_timeout() > config.ping_interval());
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# channel two
name = Bera
world = 1
channel = 2
bindaddress = 127.0.0.1
port = 7576
maxplayers = 50
datadir = /srv/mserver
preloadskills = no
pinginterval = 10
connectiontimeout = 40
"#;
        let config = ServerConfig::parse(config_text);
        assert_eq!(config.name, "Bera");
        assert_eq!(config.world, 1);
        assert_eq!(config.channel, 2);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:7576");
        assert_eq!(config.max_players, 50);
        assert_eq!(config.data_dir, PathBuf::from("/srv/mserver"));
        assert!(!config.preload_skills);
        assert_eq!(config.ping_interval(), Duration::from_secs(10));
        assert_eq!(config.connection_timeout(), Duration::from_secs(40));
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = ServerConfig::parse("port = seventy\nmaxplayers = -1\nbindaddress = nowhere\nchannel = 0\n");
        let defaults = ServerConfig::default();
        assert_eq!(config.port, defaults.port);
        assert_eq!(config.max_players, defaults.max_players);
        assert_eq!(config.bind_address, defaults.bind_address);
        assert_eq!(config.channel, 1);
    }

    #[test]
    fn test_unknown_keys_and_junk_lines_ignored() {
        let config = ServerConfig::parse("motd = hello\nnot a pair\n  # indented comment\nPORT = 8000\n");
        assert_eq!(config.port, 8000);
        assert_eq!(config.name, ServerConfig::default().name);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = Khaini").unwrap();
        writeln!(file, "port = 8585").unwrap();

        let config = ServerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.name, "Khaini");
        assert_eq!(config.port, 8585);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load_from_file(dir.path().join("channel.txt")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        // A directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load_from_file(dir.path()).is_err());
    }
}
