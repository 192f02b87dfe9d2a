//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\unheard\config.toml
//! - macOS: ~/Library/Application Support/unheard/config.toml
//! - Linux: ~/.config/unheard/config.toml
//!
//! The config file is human-readable and editable. Credentials may also be
//! supplied through environment variables (see the CLI flags).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials
    pub credentials: Credentials,

    /// Remote endpoints
    pub api: ApiConfig,

    /// Access token refresh
    pub auth: AuthConfig,

    /// Catalog store location
    pub database: DatabaseConfig,

    /// Heuristics for albums whose tracks have not been listed
    pub estimator: EstimatorConfig,

    /// Unrated track selection
    pub selector: SelectorConfig,

    /// Playback confirmation
    pub playback: PlaybackConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Application client ID
    pub client_id: Option<String>,
    /// Application client secret
    pub client_secret: Option<String>,
    /// Long-lived refresh token obtained from the login flow
    pub refresh_token: Option<String>,
}

/// Remote service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Web API base URL
    pub base_url: String,
    /// Accounts service base URL (token endpoint)
    pub accounts_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
        }
    }
}

/// Access token refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Seconds between background token refreshes
    pub refresh_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 600,
        }
    }
}

impl AuthConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Catalog store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file (empty = `unheard.db` in the data directory)
    pub path: Option<PathBuf>,
}

/// Assumptions used for albums that have not been listed yet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Assumed number of tracks on an unlisted album
    pub assumed_tracks_per_album: u64,
    /// Assumed average track duration in milliseconds
    pub assumed_track_duration_ms: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            assumed_tracks_per_album: 10,
            assumed_track_duration_ms: 3 * 60 * 1000,
        }
    }
}

/// Unrated track selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Case-insensitive substrings of track names that are omitted automatically
    pub omit_patterns: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            omit_patterns: vec!["live".to_string()],
        }
    }
}

/// Playback confirmation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Total play attempts before giving up
    pub max_attempts: u32,
    /// Delay between playback state polls
    pub poll_interval_ms: u64,
    /// How long a single attempt waits for the device to report the track
    pub confirm_timeout_ms: u64,
    /// Maximum reads while skipping ahead to an enqueued track
    pub skip_ceiling: u32,
    /// Delay between polls while waiting for a track to finish
    pub track_end_poll_ms: u64,
    /// Playlist used as the playback context (tracks are added to it first)
    pub staging_playlist_id: Option<String>,
    /// Target device (empty = currently active device)
    pub device_id: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            poll_interval_ms: 500,
            confirm_timeout_ms: 5000,
            skip_ceiling: 10,
            track_end_poll_ms: 1000,
            staging_playlist_id: None,
            device_id: None,
        }
    }
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn track_end_poll_interval(&self) -> Duration {
        Duration::from_millis(self.track_end_poll_ms)
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("unheard"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Default location of the catalog database
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("unheard"))
        .unwrap_or_default()
        .join(crate::db::DEFAULT_DB_NAME)
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[estimator]"));
        assert!(toml.contains("[selector]"));
        assert!(toml.contains("[playback]"));
    }

    #[test]
    fn test_reference_defaults() {
        let config = Config::default();
        assert_eq!(config.estimator.assumed_tracks_per_album, 10);
        assert_eq!(config.estimator.assumed_track_duration_ms, 180_000);
        assert_eq!(config.selector.omit_patterns, vec!["live".to_string()]);
        assert_eq!(config.playback.max_attempts, 3);
        assert_eq!(config.playback.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.playback.confirm_timeout(), Duration::from_secs(5));
        assert_eq!(config.playback.skip_ceiling, 10);
        assert_eq!(config.auth.refresh_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[credentials]
client_id = "abc"

[playback]
max_attempts = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.credentials.client_id.as_deref(), Some("abc"));
        assert_eq!(config.playback.max_attempts, 5);
        assert_eq!(config.playback.poll_interval_ms, 500);
        assert_eq!(config.api.base_url, "https://api.spotify.com/v1");
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.selector.omit_patterns = vec!["live".into(), "remaster".into()];
        config.playback.staging_playlist_id = Some("5sfVal7459RWClfmHNpCiC".into());
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.selector.omit_patterns.len(), 2);
        assert_eq!(
            loaded.playback.staging_playlist_id.as_deref(),
            Some("5sfVal7459RWClfmHNpCiC")
        );
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let config = load_from(&path);
        assert_eq!(config.playback.max_attempts, 3);
    }
}
