//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (TREEGATE_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "treegate.toml",
    ".treegate.toml",
    "~/.config/treegate/config.toml",
    "/etc/treegate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;
    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde defaults on AppConfig

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with TREEGATE_ prefix
    // e.g., TREEGATE_UPSTREAM__URL, TREEGATE_SERVER__PORT
    // Double underscore (__) maps to nested keys (upstream.url)
    builder = builder.add_source(
        Environment::with_prefix("TREEGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. Common upstream token environment variables, in precedence order
    for env_var in &["BACKOFFICE_API_TOKEN", "TREEGATE_UPSTREAM_TOKEN"] {
        if let Ok(token) = std::env::var(env_var) {
            builder = builder
                .set_override("upstream.token", token)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            break;
        }
    }

    // 5. BACKOFFICE_URL shortcut for the most commonly overridden key
    if let Ok(url) = std::env::var("BACKOFFICE_URL") {
        builder = builder
            .set_override("upstream.url", url)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;
    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.upstream.url.is_empty() {
        return Err(ConfigError::Missing {
            field: "upstream.url".to_string(),
        });
    }

    if !config.upstream.url.starts_with("http://") && !config.upstream.url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            message: format!(
                "upstream.url must start with http:// or https://, got: {}",
                config.upstream.url
            ),
        });
    }

    if url::Url::parse(&config.upstream.url).is_err() {
        return Err(ConfigError::Invalid {
            message: format!("upstream.url is not a valid URL: {}", config.upstream.url),
        });
    }

    if !config.upstream.route_prefix.starts_with('/') {
        return Err(ConfigError::Invalid {
            message: format!(
                "upstream.route_prefix must start with '/', got: {}",
                config.upstream.route_prefix
            ),
        });
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "upstream.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.session.user_id_header.is_empty() {
        return Err(ConfigError::Missing {
            field: "session.user_id_header".to_string(),
        });
    }

    Ok(())
}
