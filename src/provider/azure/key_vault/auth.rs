//! # Azure Key Vault Authentication
//!
//! Builds the token credential handed to [`super::AzureKeyVault`]. The
//! credential is always an explicit value, never a process-wide global.

use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use azure_identity::{AzureCliCredential, ManagedIdentityCredential, WorkloadIdentityCredential};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CredentialSource;
use crate::error::{ConsoleError, ConsoleResult};

/// Credential that always returns a fixed bearer token
///
/// Used against local Key Vault emulators and in tests.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenCredential").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        use typespec_client_core::time::{Duration, OffsetDateTime};

        Ok(AccessToken::new(
            Secret::new(self.token.clone()),
            OffsetDateTime::now_utc() + Duration::seconds(3600),
        ))
    }
}

/// Create Azure credential based on configuration
/// Supports Managed Identity, Workload Identity, Azure CLI and static tokens
pub fn create_credential(source: &CredentialSource) -> ConsoleResult<Arc<dyn TokenCredential>> {
    let credential: Arc<dyn TokenCredential> = match source {
        CredentialSource::ManagedIdentity => {
            info!("Using Azure Managed Identity authentication");
            ManagedIdentityCredential::new(None).map_err(|e| {
                ConsoleError::service(format!("Failed to create ManagedIdentityCredential: {e}"))
            })?
        }
        CredentialSource::WorkloadIdentity { client_id } => {
            info!(
                "Using Azure Workload Identity authentication with client ID: {}",
                client_id
            );
            let options = azure_identity::WorkloadIdentityCredentialOptions {
                client_id: Some(client_id.clone()),
                ..Default::default()
            };
            WorkloadIdentityCredential::new(Some(options)).map_err(|e| {
                ConsoleError::service(format!("Failed to create WorkloadIdentityCredential: {e}"))
            })?
        }
        CredentialSource::AzureCli => {
            info!("Using Azure CLI authentication (az login)");
            AzureCliCredential::new(None).map_err(|e| {
                ConsoleError::service(format!("Failed to create AzureCliCredential: {e}"))
            })?
        }
        CredentialSource::StaticToken(token) => {
            debug!("Using static bearer token credential");
            Arc::new(StaticTokenCredential::new(token.clone()))
        }
    };

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_credential_returns_token() {
        let credential = StaticTokenCredential::new("test-token");
        let token = credential
            .get_token(&["https://vault.azure.net/.default"], None)
            .await
            .unwrap();
        assert_eq!(token.token.secret(), "test-token");
    }

    #[test]
    fn test_static_token_debug_is_redacted() {
        let credential = StaticTokenCredential::new("very-secret");
        assert!(!format!("{credential:?}").contains("very-secret"));
    }

    #[test]
    fn test_create_static_credential() {
        let source = CredentialSource::StaticToken("abc".to_string());
        assert!(create_credential(&source).is_ok());
    }
}
