//! # Validation
//!
//! Client-side checks applied before any backend call, and vault identifier
//! normalization.

use regex::Regex;

use crate::error::{ConsoleError, ConsoleResult};

/// Derive a vault identifier from its display name
///
/// The name is lowercased and every character outside `[a-z0-9]` is replaced
/// with `-`. No trimming or collapsing is applied, so `"My Vault!"` becomes
/// `"my-vault-"`.
pub fn normalize_vault_id(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Reject empty (or whitespace-only) required fields
pub fn require_non_empty(field: &str, value: &str) -> ConsoleResult<()> {
    if value.trim().is_empty() {
        return Err(ConsoleError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate a vault endpoint: either a full URL or a bare Key Vault name
///
/// Key Vault names are 3-24 characters, start with a letter, end with a letter
/// or digit, and contain only letters, digits and hyphens.
pub fn validate_vault_endpoint(endpoint: &str) -> ConsoleResult<()> {
    let endpoint = endpoint.trim();
    require_non_empty("Vault URL", endpoint)?;

    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return Ok(());
    }

    let vault_name_regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]{1,22}[a-zA-Z0-9]$")
        .map_err(|e| ConsoleError::validation(format!("Failed to compile regex: {e}")))?;

    if !vault_name_regex.is_match(endpoint) {
        return Err(ConsoleError::validation(format!(
            "Invalid vault name '{endpoint}'. Expected 3-24 letters, digits or hyphens starting with a letter, or a full https:// URL"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_specials_with_hyphen() {
        assert_eq!(normalize_vault_id("My Vault!"), "my-vault-");
        assert_eq!(normalize_vault_id("prod_kv.01"), "prod-kv-01");
        assert_eq!(normalize_vault_id("already-ok"), "already-ok");
    }

    #[test]
    fn test_normalize_non_ascii() {
        assert_eq!(normalize_vault_id("Café"), "caf-");
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("Secret Name", "db").is_ok());
        let err = require_non_empty("Secret Name", "   ").unwrap_err();
        assert_eq!(err.user_message(), "Secret Name is required");
    }

    #[test]
    fn test_validate_vault_endpoint() {
        assert!(validate_vault_endpoint("my-keyvault-name").is_ok());
        assert!(validate_vault_endpoint("https://my-kv.vault.azure.net/").is_ok());
        assert!(validate_vault_endpoint("http://127.0.0.1:8080/").is_ok());
        assert!(validate_vault_endpoint("").is_err());
        assert!(validate_vault_endpoint("1starts-with-digit").is_err());
        assert!(validate_vault_endpoint("ab").is_err());
        assert!(validate_vault_endpoint("bad_underscore").is_err());
    }
}
