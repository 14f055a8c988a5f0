//! Server and backend settings.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;

/// Settings of the loopback backend that answers forwarded commands.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Delay between `Pinging ...` and the packet flow
    pub flow_delay: Duration,
    /// Delay between `Pinging ...` and the reply line
    pub reply_delay: Duration,
    /// Target of a bare `ping`
    pub default_target: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            flow_delay: Duration::from_millis(500),
            reply_delay: Duration::from_millis(1500),
            default_target: "R1".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Period of the simulation tick loop
    pub tick_interval: Duration,
    /// Directory served for every path the API does not claim
    pub static_dir: Option<PathBuf>,
    /// Capacity of the stream channel shared by WebSocket clients
    pub event_capacity: usize,
    pub backend: BackendConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_interval: Duration::from_millis(50),
            static_dir: None,
            event_capacity: 1024,
            backend: BackendConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then `NETSEA_PORT`, `NETSEA_REPLY_DELAY_MS` and
    /// `NETSEA_STATIC_DIR`, then positional `[port] [static_dir]`.
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::from_sources(|key| std::env::var(key).ok(), args)
    }

    fn from_sources(env: impl Fn(&str) -> Option<String>, args: &[String]) -> Self {
        let mut config = Self::default();

        if let Some(port) = env("NETSEA_PORT").and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Some(ms) = env("NETSEA_REPLY_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.backend.reply_delay = Duration::from_millis(ms);
            config.backend.flow_delay = config.backend.flow_delay.min(config.backend.reply_delay);
        }
        if let Some(dir) = env("NETSEA_STATIC_DIR") {
            config.static_dir = Some(PathBuf::from(dir));
        }

        if let Some(port) = args.first().and_then(|s| s.parse().ok()) {
            config.port = port;
        }
        if let Some(dir) = args.get(1) {
            config.static_dir = Some(PathBuf::from(dir));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert!(config.static_dir.is_none());
        assert!(config.backend.flow_delay < config.backend.reply_delay);
        assert_eq!(config.backend.default_target, "R1");
    }

    #[test]
    fn args_override_environment() {
        let env = |key: &str| match key {
            "NETSEA_PORT" => Some("8080".to_string()),
            "NETSEA_REPLY_DELAY_MS" => Some("200".to_string()),
            _ => None,
        };
        let config = ServerConfig::from_sources(env, &[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend.reply_delay, Duration::from_millis(200));
        assert_eq!(config.backend.flow_delay, Duration::from_millis(200));

        let args = vec!["9000".to_string(), "web/dist".to_string()];
        let config = ServerConfig::from_sources(env, &args);
        assert_eq!(config.port, 9000);
        assert_eq!(config.static_dir, Some(PathBuf::from("web/dist")));
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let env = |_: &str| Some("not-a-number".to_string());
        let args = vec!["x".to_string()];
        let config = ServerConfig::from_sources(env, &args);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.backend.reply_delay, Duration::from_millis(1500));
    }
}
