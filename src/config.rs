//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\media-intake\config.toml
//! - macOS: ~/Library/Application Support/media-intake/config.toml
//! - Linux: ~/.config/media-intake/config.toml
//!
//! Every section is optional; missing keys fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::quality::MediaFamily;
use crate::transfer::FileStrategy;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Import pipeline settings
    pub import: ImportConfig,

    /// ffprobe settings
    pub probe: ProbeConfig,

    /// Library settings
    pub library: LibraryConfig,
}

/// Import pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Strategy that overrides topology-based selection
    pub preferred_strategy: Option<FileStrategy>,

    /// Compare full-content checksums after each transfer
    pub verify_checksum: bool,

    /// Directory that receives recycled (reversibly deleted) files
    pub recycle_bin: Option<PathBuf>,

    /// Maximum concurrent imports in a batch (1 = sequential)
    pub max_parallel: usize,

    /// Destination naming patterns
    pub naming: NamingConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            preferred_strategy: None,
            verify_checksum: true,
            recycle_bin: None,
            max_parallel: 1,
            naming: NamingConfig::default(),
        }
    }
}

/// Destination path patterns, relative to the library root.
///
/// Placeholders are replaced with sanitized tag values; `{ext}` is the
/// source extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub music: String,
    pub audiobook: String,
    pub ebook: String,
    pub movie: String,
}

impl NamingConfig {
    pub fn pattern_for(&self, family: MediaFamily) -> &str {
        match family {
            MediaFamily::Music => &self.music,
            MediaFamily::Audiobook => &self.audiobook,
            MediaFamily::Ebook => &self.ebook,
            MediaFamily::Movie => &self.movie,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            music: "{Artist}/{Album}/{TrackNum} - {Title}.{ext}".to_string(),
            audiobook: "{Author}/{Title}/{Chapter} - {Title}.{ext}".to_string(),
            ebook: "{Author}/{Title}.{ext}".to_string(),
            movie: "{Title} ({Year})/{Title} ({Year}).{ext}".to_string(),
        }
    }
}

/// ffprobe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Explicit ffprobe executable (skips the search)
    pub ffprobe_path: Option<PathBuf>,

    /// `-probesize` for the first pass, in bytes
    pub probe_size: u64,

    /// `-analyzeduration` for the first pass, in microseconds
    pub analyze_duration: u64,

    /// `-probesize` when the first pass leaves the channel layout unresolved
    pub extended_probe_size: u64,

    /// `-analyzeduration` for the extended pass
    pub extended_analyze_duration: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            probe_size: 5_000_000,
            analyze_duration: 5_000_000,
            extended_probe_size: 150_000_000,
            extended_analyze_duration: 150_000_000,
        }
    }
}

/// Library management settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Library root that imports land under
    pub root: Option<PathBuf>,

    /// Catalog database file (defaults to the config directory)
    pub database: Option<PathBuf>,
}

impl LibraryConfig {
    /// Database file to use: the configured one, else `catalog.db` in the
    /// config directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            config_dir()
                .map(|d| d.join(crate::catalog::DEFAULT_DB_NAME))
                .unwrap_or_else(|| PathBuf::from(crate::catalog::DEFAULT_DB_NAME))
        })
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("media-intake"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
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

/// Load configuration from an explicit file, falling back to defaults.
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

/// Save configuration to a file, creating its directory and writing
/// atomically.
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write to temp, then rename
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[import]"));
        assert!(toml.contains("[probe]"));
        assert!(toml.contains("[library]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.import.preferred_strategy = Some(FileStrategy::Copy);
        config.import.max_parallel = 4;
        config.library.root = Some(PathBuf::from("/library"));

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.import.preferred_strategy, Some(FileStrategy::Copy));
        assert_eq!(parsed.import.max_parallel, 4);
        assert_eq!(parsed.library.root, Some(PathBuf::from("/library")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[import]
preferred_strategy = "move"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.import.preferred_strategy, Some(FileStrategy::Move));
        assert!(config.import.verify_checksum);
        assert_eq!(config.import.max_parallel, 1);
        assert_eq!(config.probe.probe_size, 5_000_000);
        assert!(config.import.naming.music.ends_with(".{ext}"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.probe.ffprobe_path = Some(PathBuf::from("/opt/ffmpeg/ffprobe"));
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(
            loaded.probe.ffprobe_path,
            Some(PathBuf::from("/opt/ffmpeg/ffprobe"))
        );
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "import = [not toml").unwrap();

        let config = load_from(&path);
        assert!(config.import.verify_checksum);
    }
}
