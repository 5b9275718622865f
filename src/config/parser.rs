use crate::config::types::LocaleConfig;
use crate::config::validation::validate_locale_config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a locale document from the given path
///
/// Files ending in `.json` are read as JSON (`{"categories": [...]}`), anything
/// else as TOML (`categories = [...]`).
///
/// # Arguments
///
/// * `path` - Path to the locale document
///
/// # Returns
///
/// * `Ok(LocaleConfig)` - Successfully loaded and validated document
/// * `Err(ConfigError)` - Failed to load, parse, or validate the document
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cellar_gap::config::load_locale_config;
///
/// let config = load_locale_config(Path::new("eng.json")).unwrap();
/// println!("Categories: {}", config.categories.len());
/// ```
pub fn load_locale_config(path: &Path) -> Result<LocaleConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_locale_config(&content, is_json(path))?;
    validate_locale_config(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the document content
///
/// Recorded with every crawl run so a snapshot can be traced back to the
/// category list that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Loads a locale document and returns both the document and its hash
pub fn load_locale_config_with_hash(path: &Path) -> Result<(LocaleConfig, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_locale_config(&content, is_json(path))?;
    validate_locale_config(&config)?;
    Ok((config, hash_content(&content)))
}

fn parse_locale_config(content: &str, json: bool) -> Result<LocaleConfig, ConfigError> {
    if json {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(toml::from_str(content)?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
