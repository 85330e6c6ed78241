// Environment variable loading

use crate::{ConfigError, Result};
use std::env;

/// Default prefix for flagmesh environment variables
pub const ENV_PREFIX: &str = "FLAGMESH";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for `FLAGMESH_*` variables
    pub fn flagmesh() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Load a `.env` file into the process environment.
    ///
    /// A missing default `.env` is not an error; a missing explicit path is.
    pub fn load_dotenv(path: Option<&str>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(())
    }

    /// Full variable name for `key`, e.g. `config` -> `FLAGMESH_CONFIG`
    pub fn var_name(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.var_name(key)).map_err(ConfigError::EnvError)
    }

    /// Load a variable if it is set and not blank
    pub fn load_opt(&self, key: &str) -> Option<String> {
        self.load_var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::flagmesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe in edition 2024, so these tests only read.

    #[test]
    fn test_var_name() {
        assert_eq!(EnvLoader::flagmesh().var_name("config"), "FLAGMESH_CONFIG");
        assert_eq!(EnvLoader::new(None).var_name("path"), "PATH");
    }

    #[test]
    fn test_load_var_with_default() {
        let loader = EnvLoader::flagmesh();
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_missing_var() {
        let loader = EnvLoader::flagmesh();
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
        assert_eq!(loader.load_opt("MISSING_VAR_67890"), None);
    }

    #[test]
    fn test_unprefixed_path_exists() {
        let loader = EnvLoader::new(None);
        if std::env::var("PATH").is_ok() {
            assert!(loader.load_var("PATH").is_ok());
        }
    }

    #[test]
    fn test_missing_explicit_dotenv() {
        let result = EnvLoader::load_dotenv(Some("/nonexistent/.env"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
