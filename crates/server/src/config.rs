// crates/server/src/config.rs
//! Daemon configuration, read from the environment at startup.

use std::env;

pub const DEFAULT_PORT: u16 = 7667;
pub const DEFAULT_MAX_SESSIONS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// TCP port for the HTTP and WebSocket listener.
    pub port: u16,
    /// Hard cap on concurrently connected sessions.
    pub max_sessions: usize,
    /// Module names reported as disabled in the inventory.
    pub disabled_modules: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            disabled_modules: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `HOSTDECK_PORT` wins over the generic `PORT`; a value that does not
    /// parse falls back to the default rather than aborting startup.
    pub fn from_env() -> Self {
        let port = env::var("HOSTDECK_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let max_sessions = env::var("HOSTDECK_MAX_SESSIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        let disabled_modules = env::var("HOSTDECK_DISABLED_MODULES")
            .map(|v| parse_module_list(&v))
            .unwrap_or_default();
        Self {
            port,
            max_sessions,
            disabled_modules,
        }
    }
}

fn parse_module_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
