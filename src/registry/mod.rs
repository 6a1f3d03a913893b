//! # Vault Registry
//!
//! Client-held bookmark list of vaults. The registry is not connected to any
//! server-side vault enumeration; it only remembers what the user added.
//!
//! Iteration order is insertion order. Identifiers are unique. The current
//! selection is session state and is never persisted: on load the first entry
//! is selected.

mod storage;

pub use storage::{RegistryFile, SaveOutcome};

use tracing::{debug, info};

use crate::error::{ConsoleError, ConsoleResult};
use crate::models::VaultRegistration;
use crate::validation::{require_non_empty, validate_vault_endpoint};

/// Registered vaults plus the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultRegistry {
    vaults: Vec<VaultRegistration>,
    selected: Option<String>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a registry verbatim, selecting the first entry
    pub fn from_vaults(vaults: Vec<VaultRegistration>) -> Self {
        let selected = vaults.first().map(|v| v.id.clone());
        Self { vaults, selected }
    }

    pub fn list(&self) -> &[VaultRegistration] {
        &self.vaults
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VaultRegistration> {
        self.vaults.iter().find(|v| v.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Currently selected vault, if any
    pub fn selected(&self) -> Option<&VaultRegistration> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Validate user input and build a registration from it
    ///
    /// The display name is kept as typed, so surrounding spaces show up in the
    /// id. The endpoint is trimmed.
    ///
    /// # Errors
    /// Returns a validation error for an empty name or a malformed endpoint
    pub fn registration(name: &str, endpoint: &str) -> ConsoleResult<VaultRegistration> {
        require_non_empty("Display Name", name)?;
        validate_vault_endpoint(endpoint)?;
        Ok(VaultRegistration::new(name, endpoint.trim()))
    }

    /// Add a vault; it becomes selected when nothing was selected
    ///
    /// # Errors
    /// Returns a validation error if the identifier is already registered
    pub fn add(&mut self, vault: VaultRegistration) -> ConsoleResult<&VaultRegistration> {
        if self.contains(&vault.id) {
            return Err(ConsoleError::validation(format!(
                "A Key Vault with id \"{}\" is already registered",
                vault.id
            )));
        }

        info!("Registering Key Vault {} ({})", vault.name, vault.id);
        if self.selected().is_none() {
            self.selected = Some(vault.id.clone());
        }
        self.vaults.push(vault);
        Ok(&self.vaults[self.vaults.len() - 1])
    }

    /// Remove a vault
    ///
    /// Removing the selected vault selects the first remaining entry, or nothing.
    ///
    /// # Errors
    /// Returns a validation error if the identifier is not registered
    pub fn remove(&mut self, id: &str) -> ConsoleResult<VaultRegistration> {
        let index = self
            .vaults
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| unknown_vault(id))?;
        let removed = self.vaults.remove(index);

        if self.selected.as_deref() == Some(id) {
            self.selected = self.vaults.first().map(|v| v.id.clone());
            debug!(
                "Removed selected Key Vault {}, selection falls back to {:?}",
                id, self.selected
            );
        }
        info!("Removed Key Vault {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Select a registered vault
    ///
    /// # Errors
    /// Returns a validation error if the identifier is not registered
    pub fn select(&mut self, id: &str) -> ConsoleResult<&VaultRegistration> {
        let index = self
            .vaults
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| unknown_vault(id))?;
        self.selected = Some(id.to_string());
        Ok(&self.vaults[index])
    }
}

fn unknown_vault(id: &str) -> ConsoleError {
    ConsoleError::validation(format!("Key Vault \"{id}\" is not registered"))
}
