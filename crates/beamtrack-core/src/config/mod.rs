//! Registry configuration.
//!
//! A [`DispatchConfig`] decides which backend a fresh registry starts on and
//! whether registration may overwrite existing entries. The process-wide
//! registry reads its configuration from the environment once, at first use.

use crate::error::Result;
use crate::types::Backend;
use std::env;

/// Environment variable naming the backend the global registry starts on.
pub const BACKEND_ENV: &str = "BEAMTRACK_BACKEND";

/// Configuration for a [`DispatchRegistry`](crate::dispatch::DispatchRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Backend activated when the registry is created.
    pub initial_backend: Backend,
    /// Refuse to overwrite an existing (backend, name) entry.
    pub strict_registration: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            initial_backend: Backend::Cpu,
            strict_registration: false,
        }
    }
}

impl DispatchConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder::new()
    }

    /// Defaults, with the initial backend taken from `BEAMTRACK_BACKEND` if set.
    ///
    /// An unparseable value is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        Self::from_backend_var(env::var(BACKEND_ENV).ok().as_deref())
    }

    fn from_backend_var(value: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            config.initial_backend = value.parse()?;
        }
        Ok(config)
    }
}

/// Builder for creating a custom [`DispatchConfig`].
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
}

impl DispatchConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
        }
    }

    /// Set the backend activated at construction.
    pub fn initial_backend(mut self, backend: Backend) -> Self {
        self.config.initial_backend = backend;
        self
    }

    /// Enable or disable strict registration.
    pub fn strict_registration(mut self, strict: bool) -> Self {
        self.config.strict_registration = strict;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DispatchConfig {
        self.config
    }
}

impl Default for DispatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.initial_backend, Backend::Cpu);
        assert!(!config.strict_registration);
    }

    #[test]
    fn test_config_builder() {
        let config = DispatchConfig::builder()
            .initial_backend(Backend::Gpu)
            .strict_registration(true)
            .build();

        assert_eq!(config.initial_backend, Backend::Gpu);
        assert!(config.strict_registration);
    }

    #[test]
    fn test_backend_from_variable() {
        let config = DispatchConfig::from_backend_var(Some("gpu")).unwrap();
        assert_eq!(config.initial_backend, Backend::Gpu);

        let config = DispatchConfig::from_backend_var(None).unwrap();
        assert_eq!(config, DispatchConfig::default());

        let config = DispatchConfig::from_backend_var(Some("  ")).unwrap();
        assert_eq!(config.initial_backend, Backend::Cpu);

        let err = DispatchConfig::from_backend_var(Some("tpu")).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidBackend { .. }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{"initial_backend": "gpu"}"#).unwrap();
        assert_eq!(config.initial_backend, Backend::Gpu);
        assert!(!config.strict_registration);
    }
}
