mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./bookhound.toml",
        "~/.config/bookhound/config.toml",
        "/etc/bookhound/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if !(0.0..=1.0).contains(&config.fuzzy.threshold) {
        anyhow::bail!(
            "Fuzzy threshold must be between 0 and 1, got {}",
            config.fuzzy.threshold
        );
    }

    if config.throttle.max_attempts == 0 {
        anyhow::bail!("Throttle max_attempts cannot be 0");
    }

    if config.throttle.multiplier < 1.0 {
        anyhow::bail!(
            "Throttle multiplier must be at least 1, got {}",
            config.throttle.multiplier
        );
    }

    if config.batch.jobs == 0 {
        anyhow::bail!("Batch jobs cannot be 0");
    }

    Ok(())
}
