//! Configuration management for Rotacast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub dry_run: DryRunConfig,
    pub mastodon: Option<MastodonConfig>,
    pub bluesky: Option<BlueskyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// CSV file with a header row; row order defines item identifiers
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Persisted rotation state, one identifier per line, head first
    pub path: String,
    /// Newline-delimited identifiers permanently excluded from selection
    pub exclusions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Longest edge of the rendered image; sources are never upscaled
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG encode quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Timeout for fetching the source asset
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            timeout_secs: default_render_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Per-destination timeout covering upload and post together
    #[serde(default = "default_publish_timeout")]
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_publish_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunConfig {
    /// Where the rendered artifact is written in dry-run mode
    #[serde(default = "default_dry_run_output")]
    pub output: String,
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            output: default_dry_run_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    pub enabled: bool,
    /// Instance URL, with or without the https:// prefix
    pub instance: String,
    /// File containing the OAuth access token
    pub token_file: String,
}

impl MastodonConfig {
    pub fn expand_token_file_path(&self) -> Result<PathBuf> {
        expand_path(&self.token_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    pub enabled: bool,
    /// Account handle (e.g., "user.bsky.social")
    pub handle: String,
    /// File containing the app password
    pub password_file: String,
}

impl BlueskyConfig {
    pub fn expand_password_file_path(&self) -> Result<PathBuf> {
        expand_path(&self.password_file)
    }
}

fn default_max_dimension() -> u32 {
    1500
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_render_timeout() -> u64 {
    30
}

fn default_publish_timeout() -> u64 {
    60
}

fn default_dry_run_output() -> String {
    "preview.jpg".to_string()
}

fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| ConfigError::MissingField(format!("cannot expand path {}: {}", path, e)))?;
    Ok(PathBuf::from(expanded.to_string()))
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Names of platforms enabled in this configuration
    pub fn enabled_platforms(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.mastodon.as_ref().is_some_and(|m| m.enabled) {
            names.push("mastodon");
        }
        if self.bluesky.as_ref().is_some_and(|b| b.enabled) {
            names.push("bluesky");
        }
        names
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("ROTACAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("rotacast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[catalog]
path = "items.csv"

[queue]
path = "order.txt"
exclusions = "exclusions.txt"

[render]
max_dimension = 1200
jpeg_quality = 90
timeout_secs = 10

[publish]
timeout_secs = 45

[mastodon]
enabled = true
instance = "mastodon.example"
token_file = "/tmp/mastodon.token"

[bluesky]
enabled = false
handle = "bot.bsky.social"
password_file = "/tmp/bluesky.password"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write config");
        file.flush().expect("Failed to flush");
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(FULL_CONFIG);
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.catalog.path, "items.csv");
        assert_eq!(config.queue.path, "order.txt");
        assert_eq!(config.queue.exclusions.as_deref(), Some("exclusions.txt"));
        assert_eq!(config.render.max_dimension, 1200);
        assert_eq!(config.render.jpeg_quality, 90);
        assert_eq!(config.publish.timeout_secs, 45);
        assert!(config.mastodon.as_ref().unwrap().enabled);
        assert!(!config.bluesky.as_ref().unwrap().enabled);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config(
            r#"
[catalog]
path = "items.csv"

[queue]
path = "order.txt"
"#,
        );
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.render.max_dimension, 1500);
        assert_eq!(config.render.jpeg_quality, 85);
        assert_eq!(config.render.timeout_secs, 30);
        assert_eq!(config.publish.timeout_secs, 60);
        assert_eq!(config.dry_run.output, "preview.jpg");
        assert!(config.queue.exclusions.is_none());
        assert!(config.mastodon.is_none());
        assert!(config.bluesky.is_none());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let result = Config::load_from_path(&PathBuf::from("/nonexistent/rotacast.toml"));
        assert!(matches!(
            result,
            Err(crate::error::RotacastError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_load_invalid_toml_is_parse_error() {
        let file = write_config("not = [valid");
        let result = Config::load_from_path(&file.path().to_path_buf());
        assert!(matches!(
            result,
            Err(crate::error::RotacastError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_enabled_platforms() {
        let file = write_config(FULL_CONFIG);
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.enabled_platforms(), vec!["mastodon"]);

        let file = write_config(
            r#"
[catalog]
path = "items.csv"

[queue]
path = "order.txt"
"#,
        );
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert!(config.enabled_platforms().is_empty());
    }

    #[test]
    fn test_expand_token_file_path_plain() {
        let config = MastodonConfig {
            enabled: true,
            instance: "mastodon.example".to_string(),
            token_file: "/tmp/mastodon.token".to_string(),
        };
        let path = config.expand_token_file_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/mastodon.token"));
    }
}
