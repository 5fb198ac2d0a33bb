//! Server configuration and environment variable handling.

use std::env;
use std::net::SocketAddr;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Browser origin allowed to call the API with credentials
    pub client_url: Option<String>,
    /// Name of the user every request acts as
    pub current_user_name: String,
    /// Insert demo users and posts on start when missing
    pub seed_demo_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            client_url: None,
            current_user_name: "Yasu".to_string(),
            seed_demo_data: true,
        }
    }
}

impl ServerConfig {
    /// Create a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST` (optional, default: 0.0.0.0)
    /// - `PORT` (optional, default: 8080)
    /// - `CLIENT_URL` (optional): CORS origin; permissive CORS when unset
    /// - `CURRENT_USER_NAME` (optional, default: Yasu)
    /// - `SEED_DEMO_DATA` (optional, default: true)
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("PORT must be a valid port number, got '{}'", raw))?,
            Err(_) => defaults.port,
        };
        let client_url = env::var("CLIENT_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let current_user_name = env::var("CURRENT_USER_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.current_user_name);
        let seed_demo_data = match env::var("SEED_DEMO_DATA") {
            Ok(raw) => parse_bool(&raw)
                .ok_or_else(|| format!("SEED_DEMO_DATA must be true or false, got '{}'", raw))?,
            Err(_) => defaults.seed_demo_data,
        };

        Ok(Self {
            host,
            port,
            client_url,
            current_user_name,
            seed_demo_data,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
