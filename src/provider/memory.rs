//! In-memory secret store
//!
//! Backs the `--offline` console mode and the test suite. Mirrors Key Vault
//! behavior closely enough for the console: each set creates a new version
//! (only the latest value is kept), disabled secrets cannot be read, and
//! unknown vaults are unreachable.
//!
//! Every call is recorded so callers can assert how many backend calls an
//! action issued.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::SecretStore;
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{SecretDetail, SecretSummary, SecretValue};

/// Backend operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    List,
    Get,
    Set,
}

/// A recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub operation: StoreOperation,
    pub vault: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredSecret {
    value: SecretValue,
    enabled: bool,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    versions: u32,
}

impl StoredSecret {
    fn summary(&self, name: &str) -> SecretSummary {
        SecretSummary {
            name: name.to_string(),
            enabled: self.enabled,
            created: Some(self.created),
            updated: Some(self.updated),
        }
    }
}

type VaultContents = BTreeMap<String, StoredSecret>;

/// In-memory implementation of [`SecretStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    vaults: Arc<RwLock<HashMap<String, VaultContents>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<HashMap<StoreOperation, VecDeque<String>>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a vault reachable (no-op if it already exists)
    pub async fn create_vault(&self, vault: &str) {
        self.vaults
            .write()
            .await
            .entry(vault.to_string())
            .or_default();
    }

    /// Seed a secret directly, bypassing the call log
    pub async fn seed(&self, vault: &str, name: &str, value: &str, enabled: bool) {
        let now = Utc::now();
        self.vaults
            .write()
            .await
            .entry(vault.to_string())
            .or_default()
            .insert(
                name.to_string(),
                StoredSecret {
                    value: SecretValue::new(value),
                    enabled,
                    created: now,
                    updated: now,
                    versions: 1,
                },
            );
    }

    /// Make the next call of `operation` fail with a service error carrying `message`
    pub async fn fail_next(&self, operation: StoreOperation, message: impl Into<String>) {
        self.failures
            .lock()
            .await
            .entry(operation)
            .or_default()
            .push_back(message.into());
    }

    /// All calls issued so far
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Number of versions written for a secret
    pub async fn version_count(&self, vault: &str, name: &str) -> u32 {
        self.vaults
            .read()
            .await
            .get(vault)
            .and_then(|contents| contents.get(name))
            .map_or(0, |secret| secret.versions)
    }

    async fn record(
        &self,
        operation: StoreOperation,
        vault: &str,
        name: Option<&str>,
    ) -> ConsoleResult<()> {
        self.calls.lock().await.push(StoreCall {
            operation,
            vault: vault.to_string(),
            name: name.map(str::to_string),
        });

        let injected = self
            .failures
            .lock()
            .await
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        if let Some(message) = injected {
            debug!("Injected {:?} failure: {}", operation, message);
            return Err(ConsoleError::service(message));
        }
        Ok(())
    }
}

fn unreachable_vault(vault: &str) -> ConsoleError {
    ConsoleError::service(format!("Vault {vault} is unreachable"))
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn list_secrets(&self, vault: &str) -> ConsoleResult<Vec<SecretSummary>> {
        self.record(StoreOperation::List, vault, None).await?;
        let vaults = self.vaults.read().await;
        let contents = vaults.get(vault).ok_or_else(|| unreachable_vault(vault))?;
        Ok(contents
            .iter()
            .map(|(name, secret)| secret.summary(name))
            .collect())
    }

    async fn get_secret(&self, vault: &str, name: &str) -> ConsoleResult<SecretDetail> {
        self.record(StoreOperation::Get, vault, Some(name)).await?;
        let vaults = self.vaults.read().await;
        let contents = vaults.get(vault).ok_or_else(|| unreachable_vault(vault))?;
        let secret = contents
            .get(name)
            .ok_or_else(|| ConsoleError::not_found(name))?;
        if !secret.enabled {
            return Err(ConsoleError::service(format!(
                "Operation get is not allowed on a disabled secret: {name}"
            )));
        }
        Ok(SecretDetail {
            summary: secret.summary(name),
            value: secret.value.clone(),
        })
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
        self.record(StoreOperation::Set, vault, Some(name)).await?;

        let mut vaults = self.vaults.write().await;
        let contents = vaults
            .get_mut(vault)
            .ok_or_else(|| unreachable_vault(vault))?;
        let now = Utc::now();
        let secret = contents
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.value = value.clone();
                existing.updated = now;
                existing.versions += 1;
            })
            .or_insert_with(|| StoredSecret {
                value: value.clone(),
                enabled: true,
                created: now,
                updated: now,
                versions: 1,
            });
        Ok(secret.summary(name))
    }

    fn provider_id(&self) -> &'static str {
        "memory"
    }
}
