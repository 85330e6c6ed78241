// Flag source configuration for flagmesh

pub mod env;
pub mod error;
pub mod loader;
pub mod sources;
pub mod validation;

pub use env::{EnvLoader, ENV_PREFIX};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use sources::{MeshConfig, SourceConfig};
pub use validation::{ConfigValidator, Validate};

use std::path::Path;
use tracing::info;

impl MeshConfig {
    /// Load from a JSON or TOML file, detected by extension, and validate.
    ///
    /// Relative `flags_file` paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: MeshConfig = ConfigLoader::auto(path)?.load_file(path)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;

        info!(
            path = %path.display(),
            sources = config.sources.len(),
            "loaded flag source configuration"
        );
        Ok(config)
    }

    /// Parse from a string and validate.
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        let config: MeshConfig = ConfigLoader::new(format).parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `FLAGMESH_CONFIG`, reading `.env` first.
    ///
    /// `FLAGMESH_INIT_TIMEOUT_MS` overrides the file's `init_timeout_ms`.
    pub fn from_env() -> Result<Self> {
        EnvLoader::load_dotenv(None)?;
        let env = EnvLoader::flagmesh();

        let path = env
            .load_opt("config")
            .ok_or_else(|| ConfigError::KeyNotFound(env.var_name("config")))?;
        let mut config = Self::load(&path)?;

        if let Some(raw) = env.load_opt("init_timeout_ms") {
            let timeout = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", env.var_name("init_timeout_ms"), e))
            })?;
            config.init_timeout_ms = Some(timeout);
            config.validate()?;
        }

        Ok(config)
    }
}
