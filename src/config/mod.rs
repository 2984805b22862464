mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable selecting `production` or `development`.
pub const ENV_VAR: &str = "REELGATE_ENV";

/// Environment variable carrying the upstream API key.
pub const API_KEY_VAR: &str = "REELGATE_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelgate.toml",
        "./config.toml",
        "~/.config/reelgate/config.toml",
        "/etc/reelgate/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

/// Apply `REELGATE_ENV` and `REELGATE_API_KEY` on top of file values.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(value) = std::env::var(ENV_VAR) {
        config.environment = value
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{ENV_VAR}: {e}"))?;
    }

    if let Ok(key) = std::env::var(API_KEY_VAR) {
        if !key.trim().is_empty() {
            config.upstream.api_key = key.trim().to_string();
        }
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.upstream.base_url.trim().is_empty() {
        anyhow::bail!("upstream.base_url cannot be empty");
    }
    if config.upstream.timeout_ms == 0 {
        anyhow::bail!("upstream.timeout_ms must be greater than 0");
    }
    if config.upstream.api_key.is_empty() {
        tracing::warn!("No upstream API key configured; requests will likely be rejected");
    }

    if config.governor.backoff_max_ms < config.governor.backoff_base_ms {
        anyhow::bail!(
            "governor.backoff_max_ms ({}) is smaller than backoff_base_ms ({})",
            config.governor.backoff_max_ms,
            config.governor.backoff_base_ms
        );
    }

    if config.queue.batch_size == 0 {
        anyhow::bail!("queue.batch_size must be greater than 0");
    }

    if config.cache.max_entries == 0 {
        anyhow::bail!("cache.max_entries must be greater than 0");
    }

    for (section, policy) in [
        ("production", &config.cache.production),
        ("development", &config.cache.development),
    ] {
        for (name, secs) in policy.entries() {
            if secs == 0 {
                anyhow::bail!("cache.{section}.{name} must be greater than 0");
            }
        }
    }

    Ok(())
}
