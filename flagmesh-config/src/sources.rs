// Flag source definitions

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, Result};
use flagmesh_features::{
    FeatureFlag, FlagClient, InMemoryFlagClient, LabeledClient, MergedFlagClient,
    NamespacedFlagClient,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One flag source: a project or environment served by its own client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display label, unique across sources
    pub label: String,

    /// Disabled sources are skipped when building clients
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// JSON file holding an array of flag definitions. Relative paths are
    /// resolved against the configuration file's directory.
    #[serde(default)]
    pub flags_file: Option<PathBuf>,

    /// Inline flag definitions, applied after `flags_file`
    #[serde(default)]
    pub flags: Vec<FeatureFlag>,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            flags_file: None,
            flags: Vec::new(),
        }
    }

    pub fn with_flags_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.flags_file = Some(path.into());
        self
    }

    pub fn with_flag(mut self, flag: FeatureFlag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Build the in-memory client for this source.
    pub fn build_client(&self, base_dir: Option<&Path>) -> Result<InMemoryFlagClient> {
        let client = match self.flags_file {
            Some(ref path) => {
                let path = match base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                debug!(source = %self.label, path = %path.display(), "loading flag file");
                InMemoryFlagClient::from_file(&path).map_err(|source| ConfigError::SourceError {
                    label: self.label.clone(),
                    source,
                })?
            }
            None => InMemoryFlagClient::new(),
        };

        Ok(client.with_flags(self.flags.iter().cloned()))
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.label, "source label")?;

        if self.flags_file.is_none() && self.flags.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "source '{}' needs flags_file or inline flags",
                self.label
            )));
        }

        ConfigValidator::unique(self.flags.iter().map(|f| f.key.as_str()), "flag key")
    }
}

/// Ordered flag sources. Order is resolution priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Upper bound on client initialization, in milliseconds
    #[serde(default)]
    pub init_timeout_ms: Option<u64>,

    /// Directory relative flag files are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl MeshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with the lowest priority so far
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// Enabled sources in priority order
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Build one labeled client per enabled source.
    pub fn build_clients(&self) -> Result<Vec<LabeledClient>> {
        self.validate()?;

        self.enabled_sources()
            .map(|source| {
                let client: Arc<dyn FlagClient> =
                    Arc::new(source.build_client(self.base_dir.as_deref())?);
                Ok(LabeledClient::new(source.label.clone(), client))
            })
            .collect()
    }

    /// Build a merged client over the enabled sources. Not yet initialized.
    pub fn build_merged(&self) -> Result<MergedFlagClient> {
        Ok(MergedFlagClient::new(self.build_clients()?))
    }

    /// Build a namespaced client over the enabled sources. Not yet initialized.
    pub fn build_namespaced(&self) -> Result<NamespacedFlagClient> {
        Ok(self
            .build_clients()?
            .into_iter()
            .fold(NamespacedFlagClient::new(), |namespaced, entry| {
                namespaced.with_client(entry.label, entry.client)
            }))
    }
}

impl Validate for MeshConfig {
    fn validate(&self) -> Result<()> {
        if self.enabled_sources().next().is_none() {
            return Err(ConfigError::ValidationError(
                "at least one enabled source is required".to_string(),
            ));
        }

        for source in &self.sources {
            source.validate()?;
        }

        ConfigValidator::unique(self.sources.iter().map(|s| s.label.as_str()), "source label")?;

        if let Some(timeout) = self.init_timeout_ms {
            ConfigValidator::in_range(timeout, 1, 600_000, "init_timeout_ms")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sources() -> MeshConfig {
        MeshConfig::new()
            .with_source(
                SourceConfig::new("Project A").with_flag(FeatureFlag::string("flag-a", "A")),
            )
            .with_source(
                SourceConfig::new("Project B").with_flag(FeatureFlag::string("flag-b", "B")),
            )
    }

    #[test]
    fn test_valid_config() {
        assert!(two_sources().validate().is_ok());
    }

    #[test]
    fn test_requires_a_source() {
        assert!(MeshConfig::new().validate().is_err());

        let mut config = two_sources();
        config.sources.iter_mut().for_each(|s| s.enabled = false);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_labels() {
        let config = two_sources()
            .with_source(SourceConfig::new("Project A").with_flag(FeatureFlag::boolean("x", true)));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate source label"));
    }

    #[test]
    fn test_source_without_flags() {
        let config = MeshConfig::new().with_source(SourceConfig::new("Empty"));
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_timeout_range() {
        let mut config = two_sources();
        config.init_timeout_ms = Some(0);
        assert!(config.validate().is_err());

        let config = two_sources().with_init_timeout(Duration::from_secs(2));
        assert_eq!(config.init_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        let config = two_sources().with_init_timeout(Duration::MAX);
        assert_eq!(config.init_timeout_ms, Some(u64::MAX));
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_disabled_sources_are_skipped() {
        let mut config = two_sources();
        config.sources[0].enabled = false;

        let merged = config.build_merged().unwrap();
        assert_eq!(merged.labels(), vec!["Project B"]);
    }

    #[test]
    fn test_missing_flags_file() {
        let config = MeshConfig::new()
            .with_source(SourceConfig::new("Broken").with_flags_file("does-not-exist.json"));

        let err = config.build_clients().unwrap_err();
        assert!(matches!(err, ConfigError::SourceError { ref label, .. } if label == "Broken"));
    }
}
