//! Bridge configuration.

use crate::error::{BridgeError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding the tracking library path.
pub const LIBRARY_ENV: &str = "BEAMTRACK_TRACKING_LIB";

/// Entry point symbol exported by tracking libraries.
pub const DEFAULT_ENTRY_SYMBOL: &str = "run";

/// Where to find the tracking library and which symbol to call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Path of the shared library.
    pub library_path: Option<PathBuf>,
    /// Exported entry point name.
    pub entry_symbol: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            entry_symbol: DEFAULT_ENTRY_SYMBOL.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Defaults, with the library path taken from `BEAMTRACK_TRACKING_LIB`.
    pub fn from_env() -> Self {
        Self::from_library_var(env::var_os(LIBRARY_ENV).map(PathBuf::from))
    }

    fn from_library_var(value: Option<PathBuf>) -> Self {
        Self {
            library_path: value.filter(|p| !p.as_os_str().is_empty()),
            ..Self::default()
        }
    }

    /// The configured library path.
    pub fn library_path(&self) -> Result<&Path> {
        self.library_path.as_deref().ok_or_else(|| {
            BridgeError::config(format!("no tracking library path (set {LIBRARY_ENV})"))
        })
    }
}

/// Builder for creating a custom [`BridgeConfig`].
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
        }
    }

    /// Set the library path.
    pub fn library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.library_path = Some(path.into());
        self
    }

    /// Set the entry point symbol.
    pub fn entry_symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.config.entry_symbol = symbol.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BridgeConfig {
        self.config
    }
}

impl Default for BridgeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.entry_symbol, "run");
        assert!(matches!(
            config.library_path(),
            Err(BridgeError::Config { .. })
        ));
    }

    #[test]
    fn test_builder() {
        let config = BridgeConfig::builder()
            .library_path("/opt/track/libtrack.so")
            .entry_symbol("track")
            .build();
        assert_eq!(
            config.library_path().unwrap(),
            Path::new("/opt/track/libtrack.so")
        );
        assert_eq!(config.entry_symbol, "track");
    }

    #[test]
    fn test_library_from_variable() {
        let config = BridgeConfig::from_library_var(Some(PathBuf::from("libtrack.so")));
        assert_eq!(config.library_path, Some(PathBuf::from("libtrack.so")));

        let config = BridgeConfig::from_library_var(Some(PathBuf::new()));
        assert_eq!(config.library_path, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"library_path": "libtrack.so"}"#).unwrap();
        assert_eq!(config.entry_symbol, "run");
        assert_eq!(config.library_path, Some(PathBuf::from("libtrack.so")));
    }
}
