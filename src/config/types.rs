//! Configuration types for treegate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Back-office upstream connection settings
    pub upstream: UpstreamConfig,

    /// Proxy server settings
    pub server: ServerConfig,

    /// Access rule settings
    pub access: AccessConfig,

    /// Session header settings
    pub session: SessionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Back-office upstream connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream CMS URL (e.g., `https://cms.example.com`)
    pub url: String,

    /// Service token for upstream API calls (prefer env var BACKOFFICE_API_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// Path prefix of the back-office API on the upstream
    pub route_prefix: String,

    /// Endpoint path, under the API prefix, serving start node assignments
    /// per user id
    pub assignments_path: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for failed requests
    pub max_retries: u32,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            token: None,
            route_prefix: "/backoffice/api".to_string(),
            assignments_path: "/startnodes/users".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            verify_ssl: true,
        }
    }
}

/// Proxy server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,

    /// Listen port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8750,
        }
    }
}

/// Access rule configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// When set, pickers and breadcrumbs hide anything outside the user's
    /// subtrees instead of merely flagging it
    pub limit_pickers_to_start_nodes: bool,
}

/// Session header configuration.
///
/// The authenticating front proxy identifies the back-office user through
/// trusted request headers; these name them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Header carrying the numeric back-office user id
    pub user_id_header: String,

    /// Header flagging administrator sessions
    pub admin_header: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id_header: crate::session::DEFAULT_USER_ID_HEADER.to_string(),
            admin_header: crate::session::DEFAULT_ADMIN_HEADER.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
