//! # Azure Key Vault Client Creation
//!
//! Vault URL construction and HTTP client setup.

use reqwest::Client as ReqwestClient;

use crate::constants::KEY_VAULT_DNS_SUFFIX;
use crate::error::{ConsoleError, ConsoleResult};

/// Construct vault URL from a registry endpoint
/// Supports both full URLs and bare vault names; the result always ends with `/`
pub fn construct_vault_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let url = if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}.{KEY_VAULT_DNS_SUFFIX}/")
    };

    if url.ends_with('/') {
        url
    } else {
        format!("{url}/")
    }
}

/// Short vault name for spans and log lines
pub fn vault_display_name(vault_url: &str) -> &str {
    let host = vault_url
        .strip_prefix("https://")
        .or_else(|| vault_url.strip_prefix("http://"))
        .unwrap_or(vault_url);
    let host = host.split('/').next().unwrap_or(host);
    host.strip_suffix(&format!(".{KEY_VAULT_DNS_SUFFIX}"))
        .unwrap_or(host)
}

/// Create the HTTP client used for Key Vault REST calls
pub fn create_http_client() -> ConsoleResult<ReqwestClient> {
    ReqwestClient::builder()
        .user_agent(concat!("kvconsole/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConsoleError::service(format!("Failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_vault_url_construction() {
        assert_eq!(
            construct_vault_url("my-vault"),
            "https://my-vault.vault.azure.net/"
        );
        assert_eq!(
            construct_vault_url("https://custom-vault.vault.azure.net/"),
            "https://custom-vault.vault.azure.net/"
        );
        assert_eq!(
            construct_vault_url("https://custom-vault.vault.azure.net"),
            "https://custom-vault.vault.azure.net/"
        );
        assert_eq!(
            construct_vault_url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080/"
        );
    }

    #[test]
    fn test_vault_display_name() {
        assert_eq!(
            vault_display_name("https://prod-kv.vault.azure.net/"),
            "prod-kv"
        );
        assert_eq!(
            vault_display_name("http://127.0.0.1:8080/"),
            "127.0.0.1:8080"
        );
    }
}
