//! # Azure Key Vault Client
//!
//! Client for interacting with the Azure Key Vault Secrets REST API.
//!
//! This module provides functionality to:
//! - List secret properties in a vault (following `nextLink` pagination)
//! - Retrieve a secret's current value
//! - Create secrets or add new versions to existing ones
//!
//! The token credential is injected through [`AzureKeyVault::new`]; one client
//! serves every vault in the registry because the vault endpoint is passed per
//! call.

mod auth;
mod client;
mod wire;

pub use auth::{create_credential, StaticTokenCredential};
pub use client::{construct_vault_url, vault_display_name};

use async_trait::async_trait;
use azure_core::credentials::{TokenCredential, TokenRequestOptions};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, field, info, info_span, Instrument, Span};

use self::client::create_http_client;
use self::wire::{error_message, SecretBundle, SecretItem, SecretListResult, SetSecretRequest};
use crate::config::ConsoleConfig;
use crate::constants::{DEFAULT_API_VERSION, DEFAULT_PAGE_SIZE, KEY_VAULT_SCOPE, MAX_PAGE_SIZE};
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{SecretDetail, SecretSummary, SecretValue};
use crate::provider::SecretStore;

/// Azure Key Vault provider implementation
pub struct AzureKeyVault {
    http_client: ReqwestClient,
    credential: Arc<dyn TokenCredential>,
    api_version: String,
    page_size: u32,
}

impl std::fmt::Debug for AzureKeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureKeyVault")
            .field("api_version", &self.api_version)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl AzureKeyVault {
    /// Create a Key Vault client using the given credential
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(credential: Arc<dyn TokenCredential>) -> ConsoleResult<Self> {
        Ok(Self {
            http_client: create_http_client()?,
            credential,
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Create a Key Vault client from console configuration
    ///
    /// # Errors
    /// Returns an error if the credential or HTTP client cannot be built
    pub fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let credential = create_credential(&config.credential)?;
        Ok(Self::new(credential)?
            .with_api_version(config.api_version.clone())
            .with_page_size(config.page_size))
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the list page size, clamped to what Key Vault accepts (1..=25)
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Build `{vault}secrets[/{name}]?api-version=...`
    fn secrets_url(&self, vault: &str, name: Option<&str>) -> ConsoleResult<Url> {
        let base = construct_vault_url(vault);
        let mut url = Url::parse(&base).map_err(|e| {
            ConsoleError::validation(format!("Invalid vault URL '{base}': {e}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ConsoleError::validation(format!("Invalid vault URL '{base}'"))
            })?;
            segments.pop_if_empty().push("secrets");
            if let Some(name) = name {
                segments.push(name);
            }
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn bearer_token(&self) -> ConsoleResult<String> {
        let token_response = self
            .credential
            .get_token(&[KEY_VAULT_SCOPE], Some(TokenRequestOptions::default()))
            .await
            .map_err(|e| {
                ConsoleError::service(format!("Failed to get Azure Key Vault access token: {e}"))
            })?;
        Ok(token_response.token.secret().to_string())
    }

    async fn send(&self, request: RequestBuilder) -> ConsoleResult<Response> {
        let token = self.bearer_token().await?;
        request
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| ConsoleError::service(format!("Failed to reach Azure Key Vault: {e}")))
    }

    async fn list_page(&self, url: Url) -> ConsoleResult<SecretListResult> {
        let response = self.send(self.http_client.get(url)).await?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        response.json::<SecretListResult>().await.map_err(|e| {
            ConsoleError::service(format!("Failed to deserialize Azure secret list: {e}"))
        })
    }

    async fn fetch_all(&self, vault: &str) -> ConsoleResult<Vec<SecretSummary>> {
        let mut url = self.secrets_url(vault, None)?;
        url.query_pairs_mut()
            .append_pair("maxresults", &self.page_size.to_string());

        let mut secrets = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            let page = self.list_page(page_url).await?;
            secrets.extend(page.value.into_iter().map(SecretItem::into_summary));
            if let Some(link) = page.next_link.filter(|link| !link.is_empty()) {
                next = Some(Url::parse(&link).map_err(|e| {
                    ConsoleError::service(format!("Invalid nextLink '{link}': {e}"))
                })?);
            }
        }
        Ok(secrets)
    }

    async fn fetch_one(&self, vault: &str, name: &str) -> ConsoleResult<SecretDetail> {
        let url = self.secrets_url(vault, Some(name))?;
        let response = self.send(self.http_client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ConsoleError::not_found(name));
        }
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        let bundle = parse_bundle(response).await?;
        Ok(bundle.into_detail(name))
    }

    async fn put_value(
        &self,
        vault: &str,
        name: &str,
        value: &SecretValue,
    ) -> ConsoleResult<SecretSummary> {
        let url = self.secrets_url(vault, Some(name))?;
        let request = self.http_client.put(url).json(&SetSecretRequest {
            value: value.expose(),
        });
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        let bundle = parse_bundle(response).await?;
        Ok(bundle.into_detail(name).summary)
    }
}

async fn parse_bundle(response: Response) -> ConsoleResult<SecretBundle> {
    response.json::<SecretBundle>().await.map_err(|e| {
        ConsoleError::service(format!("Failed to deserialize Azure secret response: {e}"))
    })
}

/// Convert a non-success response into a service error, preferring the Azure error message
async fn service_error(response: Response) -> ConsoleError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match error_message(&body) {
        Some(message) => ConsoleError::service(message),
        None => ConsoleError::service(format!("HTTP {status}: {body}")),
    }
}

fn record_outcome<T>(span: &Span, start: Instant, result: &ConsoleResult<T>) {
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.record("operation.duration_ms", elapsed_ms);
    span.record("operation.success", result.is_ok());
    if let Err(e) = result {
        span.record("error.kind", e.kind());
    }
}

#[async_trait]
impl SecretStore for AzureKeyVault {
    async fn list_secrets(&self, vault: &str) -> ConsoleResult<Vec<SecretSummary>> {
        let span = info_span!(
            "keyvault.secret.list",
            vault.name = vault_display_name(&construct_vault_url(vault)),
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            operation.count = field::Empty,
            error.kind = field::Empty,
        );
        let span_clone = span.clone();
        let start = Instant::now();

        async move {
            let result = self.fetch_all(vault).await;
            record_outcome(&span_clone, start, &result);
            if let Ok(secrets) = &result {
                span_clone.record("operation.count", secrets.len());
                debug!("Listed {} secrets", secrets.len());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_secret(&self, vault: &str, name: &str) -> ConsoleResult<SecretDetail> {
        let span = tracing::debug_span!(
            "keyvault.secret.get",
            secret.name = name,
            vault.name = vault_display_name(&construct_vault_url(vault)),
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.kind = field::Empty,
        );
        let span_clone = span.clone();
        let start = Instant::now();

        async move {
            let result = self.fetch_one(vault, name).await;
            record_outcome(&span_clone, start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn set_secret(
        &self,
        vault: &str,
        name: &str,
        value: &SecretValue,
    ) -> ConsoleResult<SecretSummary> {
        if value.is_empty() {
            return Err(ConsoleError::validation("Secret Value is required"));
        }

        let span = info_span!(
            "keyvault.secret.set",
            secret.name = name,
            vault.name = vault_display_name(&construct_vault_url(vault)),
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.kind = field::Empty,
        );
        let span_clone = span.clone();
        let start = Instant::now();

        async move {
            // Key Vault creates a new version when the secret already exists
            info!("Creating/updating Azure secret: {}", name);
            let result = self.put_value(vault, name, value).await;
            record_outcome(&span_clone, start, &result);
            result
        }
        .instrument(span)
        .await
    }

    fn provider_id(&self) -> &'static str {
        "azure-key-vault"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AzureKeyVault {
        AzureKeyVault::new(Arc::new(StaticTokenCredential::new("t"))).unwrap()
    }

    #[test]
    fn test_secrets_url_for_bare_vault_name() {
        let url = client().secrets_url("my-vault", Some("db-password")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://my-vault.vault.azure.net/secrets/db-password?api-version=7.4"
        );
    }

    #[test]
    fn test_secrets_url_escapes_name() {
        let url = client()
            .secrets_url("http://127.0.0.1:9000", Some("a b"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/secrets/a%20b?api-version=7.4"
        );
    }

    #[test]
    fn test_custom_api_version_and_page_size() {
        let kv = client().with_api_version("2025-07-01").with_page_size(0);
        assert_eq!(kv.page_size, 1);
        let url = kv.secrets_url("kv", None).unwrap();
        assert!(url.as_str().ends_with("/secrets?api-version=2025-07-01"));
    }

    #[test]
    fn test_page_size_capped_at_service_maximum() {
        assert_eq!(client().with_page_size(100).page_size, 25);
        assert_eq!(client().with_page_size(10).page_size, 10);
    }

    #[tokio::test]
    async fn test_empty_value_rejected_before_network() {
        let err = client()
            .set_secret("kv", "name", &SecretValue::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }
}
