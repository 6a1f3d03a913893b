//! # Vault Registration
//!
//! A locally registered vault. The persisted record shape is `{id, name, value}`
//! where `value` holds the connection endpoint (vault name or URL).

use serde::{Deserialize, Serialize};

use crate::validation::normalize_vault_id;

/// A vault the user has chosen to track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRegistration {
    /// Identifier normalized from the display name
    pub id: String,
    /// Display name
    pub name: String,
    /// Connection endpoint: a bare vault name or a full vault URL
    pub value: String,
}

impl VaultRegistration {
    /// Build a registration, deriving the identifier from the display name
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: normalize_vault_id(&name),
            name,
            value: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.value
    }
}
