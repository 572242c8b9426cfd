mod init;
mod schema;

pub use init::run_init;
pub use schema::{EventConfig, VenueConfig, CONFIG_VERSION};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::scoring::validate_rule_set;

/// Get the config directory path (~/.config/agility-scoring/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("agility-scoring")
}

/// Get the default config file path (~/.config/agility-scoring/venue.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("venue.yaml")
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Load a venue configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/agility-scoring/venue.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<VenueConfig> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `agility-score init` to create one",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: VenueConfig = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    tracing::debug!(
        path = %config_path.display(),
        version = config.version,
        events = config.events.len(),
        "loaded venue config"
    );

    Ok(config)
}

/// Save a venue configuration atomically.
///
/// The file is never left half-written; the parent directory is created if needed.
pub fn save_config(path: &Path, config: &VenueConfig) -> Result<()> {
    ensure_parent_dir(path)?;

    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit().context("Failed to save config")?;

    Ok(())
}

/// Write the starter configuration to `path`.
pub fn write_starter_config(path: &Path) -> Result<()> {
    save_config(path, &VenueConfig::starter())
}

/// Validate a whole venue configuration.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &VenueConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.version == 0 {
        errors.push("version: must be at least 1".to_string());
    }

    let mut seen = HashSet::new();
    for (i, event) in config.events.iter().enumerate() {
        if event.name.trim().is_empty() {
            errors.push(format!("events[{}].name: must not be empty", i));
        } else if !seen.insert(event.name.as_str()) {
            errors.push(format!("events[{}].name: duplicate event '{}'", i, event.name));
        }
        if let Err(rule_errors) = validate_rule_set(&format!("events[{}].rules", i), &event.rules) {
            errors.extend(rule_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
