//! # Credential Source
//!
//! Which Azure credential the Key Vault client is built with.

use std::str::FromStr;

use crate::error::{ConsoleError, ConsoleResult};

/// Azure credential selection
#[derive(Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Managed Identity (works automatically on Azure compute)
    #[default]
    ManagedIdentity,
    /// Workload Identity federation with the given client ID
    WorkloadIdentity { client_id: String },
    /// Token from the logged-in Azure CLI (`az login`)
    AzureCli,
    /// Fixed bearer token, for emulators and tests
    StaticToken(String),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::ManagedIdentity => f.write_str("ManagedIdentity"),
            CredentialSource::WorkloadIdentity { client_id } => f
                .debug_struct("WorkloadIdentity")
                .field("client_id", client_id)
                .finish(),
            CredentialSource::AzureCli => f.write_str("AzureCli"),
            CredentialSource::StaticToken(_) => f.write_str("StaticToken(<redacted>)"),
        }
    }
}

/// Credential kind names accepted by `KVCONSOLE_CREDENTIAL` and `--credential`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ManagedIdentity,
    WorkloadIdentity,
    AzureCli,
    Static,
}

impl FromStr for CredentialKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "managed-identity" | "managed" => Ok(CredentialKind::ManagedIdentity),
            "workload-identity" | "workload" => Ok(CredentialKind::WorkloadIdentity),
            "azure-cli" | "cli" => Ok(CredentialKind::AzureCli),
            "static" | "static-token" => Ok(CredentialKind::Static),
            other => Err(ConsoleError::validation(format!(
                "Unknown credential '{other}'. Expected managed-identity, workload-identity, azure-cli or static"
            ))),
        }
    }
}

impl CredentialSource {
    /// Build a credential source from a kind plus its optional inputs
    ///
    /// # Errors
    /// Returns a validation error when the kind needs an input that is missing
    pub fn from_parts(
        kind: CredentialKind,
        client_id: Option<String>,
        static_token: Option<String>,
    ) -> ConsoleResult<Self> {
        match kind {
            CredentialKind::ManagedIdentity => Ok(CredentialSource::ManagedIdentity),
            CredentialKind::AzureCli => Ok(CredentialSource::AzureCli),
            CredentialKind::WorkloadIdentity => client_id
                .filter(|id| !id.trim().is_empty())
                .map(|client_id| CredentialSource::WorkloadIdentity { client_id })
                .ok_or_else(|| {
                    ConsoleError::validation("Workload identity requires AZURE_CLIENT_ID")
                }),
            CredentialKind::Static => static_token
                .filter(|token| !token.is_empty())
                .map(CredentialSource::StaticToken)
                .ok_or_else(|| {
                    ConsoleError::validation("Static credential requires KVCONSOLE_STATIC_TOKEN")
                }),
        }
    }

    /// Read `KVCONSOLE_CREDENTIAL`, `AZURE_CLIENT_ID` and `KVCONSOLE_STATIC_TOKEN`
    ///
    /// # Errors
    /// Returns a validation error for an unknown kind or missing input
    pub fn from_env() -> ConsoleResult<Self> {
        let kind = match std::env::var("KVCONSOLE_CREDENTIAL") {
            Ok(value) => value.parse()?,
            Err(_) => CredentialKind::ManagedIdentity,
        };
        Self::from_parts(
            kind,
            std::env::var("AZURE_CLIENT_ID").ok(),
            std::env::var("KVCONSOLE_STATIC_TOKEN").ok(),
        )
    }
}
