//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence and
//! every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};

use super::nickname::generate_nickname;

/// Root configuration for the `tickirc` host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The one server to connect to and how to register with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "generate_nickname")]
    pub nickname: String,
    /// Defaults to the nickname.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    /// Joined once the session is active.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            nickname: generate_nickname(),
            username: None,
            realname: None,
            channels: Vec::new(),
            quit_message: default_quit_message(),
        }
    }
}

impl ServerConfig {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }
}

/// Event loop and protocol limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Upper bound on a buffered unterminated line. Unset means unbounded.
    #[serde(default)]
    pub max_line_len: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            max_line_len: None,
        }
    }
}

/// Diagnostics and chat transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub transcript: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            transcript: false,
            log_dir: default_log_dir(),
        }
    }
}

fn default_host() -> String {
    "irc.libera.chat".to_string()
}
fn default_port() -> u16 {
    6667
}
fn default_quit_message() -> String {
    "tickirc".to_string()
}
fn default_tick_interval() -> u64 {
    50
}
fn default_level() -> String {
    "info".to_string()
}
fn default_log_dir() -> String {
    "~/.local/share/tickirc/logs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "irc.libera.chat");
        assert_eq!(config.server.port, 6667);
        assert!(!config.server.nickname.is_empty());
        assert_eq!(config.client.tick_interval_ms, 50);
        assert_eq!(config.client.max_line_len, None);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.transcript);
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = toml::from_str(
            r##"
            [server]
            host = "irc.example.net"
            nickname = "crabbot"
            channels = ["#rust", "#bots"]

            [client]
            max_line_len = 8192
            "##,
        )
        .unwrap();

        assert_eq!(config.server.host, "irc.example.net");
        assert_eq!(config.server.port, 6667);
        assert_eq!(config.server.username(), "crabbot");
        assert_eq!(config.server.realname(), "crabbot");
        assert_eq!(config.server.channels, vec!["#rust", "#bots"]);
        assert_eq!(config.client.max_line_len, Some(8192));
        assert_eq!(config.client.tick_interval_ms, 50);
    }
}
