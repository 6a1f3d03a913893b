//! # Secret-Store Providers
//!
//! The [`SecretStore`] trait is the seam between the console and the
//! secret-management backend. Implementations perform no caching: every call
//! reaches the backend.

pub mod azure;
pub mod memory;

use async_trait::async_trait;

use crate::error::ConsoleResult;
use crate::models::{SecretDetail, SecretSummary, SecretValue};

pub use azure::key_vault::AzureKeyVault;
pub use memory::InMemorySecretStore;

/// Secret-store client trait
///
/// `vault` is the vault's connection endpoint as stored in the registry
/// (a bare vault name or a full URL).
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Enumerate all secrets in the vault
    ///
    /// # Errors
    /// Returns `Service` if the vault is unreachable or the caller lacks permission
    async fn list_secrets(&self, vault: &str) -> ConsoleResult<Vec<SecretSummary>>;

    /// Fetch the current value and metadata of one secret
    ///
    /// # Errors
    /// Returns `NotFound` if no such secret exists, `Service` otherwise
    async fn get_secret(&self, vault: &str, name: &str) -> ConsoleResult<SecretDetail>;

    /// Create the secret, or add a new version if it already exists
    ///
    /// # Errors
    /// Returns `Validation` for an empty value and `Service` when the backend rejects the call
    async fn set_secret(
        &self,
        vault: &str,
        name: &str,
        value: &SecretValue,
    ) -> ConsoleResult<SecretSummary>;

    /// Short identifier for logs
    fn provider_id(&self) -> &'static str;
}
