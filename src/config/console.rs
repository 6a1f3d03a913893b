//! # Console Settings
//!
//! Where the registry lives and how the Key Vault client talks to Azure.

use std::path::PathBuf;

use super::{env_var_or_default, CredentialSource};
use crate::constants::{APP_DIR_NAME, DEFAULT_API_VERSION, DEFAULT_PAGE_SIZE};
use crate::error::{ConsoleError, ConsoleResult};

/// Console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Directory holding the vault registry and display preferences
    pub config_dir: PathBuf,
    /// Key Vault secrets REST API version
    pub api_version: String,
    /// Page size requested when listing secrets
    pub page_size: u32,
    /// Credential handed to the Key Vault client
    pub credential: CredentialSource,
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// - `KVCONSOLE_CONFIG_DIR` (default: `<platform config dir>/kvconsole`)
    /// - `KVCONSOLE_API_VERSION` (default: `7.4`)
    /// - `KVCONSOLE_PAGE_SIZE` (default: `25`)
    /// - `KVCONSOLE_CREDENTIAL`, `AZURE_CLIENT_ID`, `KVCONSOLE_STATIC_TOKEN`
    ///
    /// # Errors
    /// Returns an error if no config directory can be determined or the
    /// credential settings are inconsistent
    pub fn from_env() -> ConsoleResult<Self> {
        let config_dir = match std::env::var_os("KVCONSOLE_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_config_dir()?,
        };

        Ok(Self {
            config_dir,
            api_version: env_var_or_default("KVCONSOLE_API_VERSION", DEFAULT_API_VERSION.to_string()),
            page_size: env_var_or_default("KVCONSOLE_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            credential: CredentialSource::from_env()?,
        })
    }

    /// Configuration rooted at an explicit directory, everything else defaulted
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            credential: CredentialSource::default(),
        }
    }
}

fn default_config_dir() -> ConsoleResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            ConsoleError::storage(
                "Cannot determine the config directory; set KVCONSOLE_CONFIG_DIR",
            )
        })
}
