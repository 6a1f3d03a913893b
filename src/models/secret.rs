//! # Secret Models
//!
//! A secret comes in two shapes: [`SecretSummary`] (metadata only, what a list
//! call returns) and [`SecretDetail`] (metadata plus value, fetched on demand).

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Metadata about a secret, excluding its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSummary {
    /// Secret name, unique within a vault
    pub name: String,
    /// Disabled secrets cannot be read or edited
    pub enabled: bool,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl SecretSummary {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            created: None,
            updated: None,
        }
    }
}

/// Secret value, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A secret summary plus its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDetail {
    pub summary: SecretSummary,
    pub value: SecretValue,
}

impl SecretDetail {
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn enabled(&self) -> bool {
        self.summary.enabled
    }
}
