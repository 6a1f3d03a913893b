//! # Constants
//!
//! Default values and well-known names used across the console.

/// Application directory name under the platform config directory
pub const APP_DIR_NAME: &str = "kvconsole";

/// Vault registry file name
pub const REGISTRY_FILE: &str = "key_vaults.json";

/// Display preference file name
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Key Vault secrets REST API version
pub const DEFAULT_API_VERSION: &str = "7.4";

/// Page size requested when listing secrets
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest `maxresults` Key Vault accepts on list calls
pub const MAX_PAGE_SIZE: u32 = 25;

/// DNS suffix appended to bare vault names
pub const KEY_VAULT_DNS_SUFFIX: &str = "vault.azure.net";

/// OAuth scope for Key Vault data-plane tokens
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kvconsole=info,keyvault_console=info";
