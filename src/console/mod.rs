//! # Console Controller
//!
//! Session state machine on top of a [`SecretStore`] and a [`VaultRegistry`].
//!
//! ## Rules
//!
//! - The secret list always belongs to the selected vault. Switching vaults
//!   clears it before the new fetch starts.
//! - Every successful create or update is followed by a full re-fetch. No
//!   local patching.
//! - Create, update and vault removal only run after [`Console::confirm`].
//!   [`Console::decline`] drops the pending action without touching anything.
//! - Overlapping list fetches are resolved by ticket: the most recently
//!   started fetch wins and older responses are discarded.
//! - Failures are caught where they happen and surfaced through
//!   [`LoadState::Error`]. A failed vault switch leaves the list empty, any
//!   other failure keeps the list as it was.

mod filter;
mod state;

pub use filter::filter_secrets;
pub use state::{
    AddSecretForm, ConfirmOutcome, EditDialog, FetchReason, FetchTicket, LoadState,
    PendingAction, SecretView,
};

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{Preferences, SecretSummary, SecretValue, VaultRegistration};
use crate::provider::SecretStore;
use crate::registry::{RegistryFile, SaveOutcome, VaultRegistry};
use crate::validation::require_non_empty;

/// Interactive console session
#[derive(Debug)]
pub struct Console {
    store: Arc<dyn SecretStore>,
    registry: VaultRegistry,
    storage: Option<RegistryFile>,
    preferences: Preferences,
    secrets: Vec<SecretSummary>,
    state: LoadState,
    search: String,
    add_form: AddSecretForm,
    edit_dialog: EditDialog,
    pending: Option<PendingAction>,
    fetch_seq: u64,
}

impl Console {
    /// Session over an in-memory registry; nothing is written to disk
    pub fn new(store: Arc<dyn SecretStore>, registry: VaultRegistry) -> Self {
        let state = if registry.selected().is_some() {
            LoadState::Ready
        } else {
            LoadState::Idle
        };
        Self {
            store,
            registry,
            storage: None,
            preferences: Preferences::default(),
            secrets: Vec::new(),
            state,
            search: String::new(),
            add_form: AddSecretForm::default(),
            edit_dialog: EditDialog::Closed,
            pending: None,
            fetch_seq: 0,
        }
    }

    /// Session backed by the registry and preferences files in `storage`
    ///
    /// An unreadable preferences file falls back to defaults.
    ///
    /// # Errors
    /// Returns a storage error if the registry file exists but cannot be parsed
    pub fn open(store: Arc<dyn SecretStore>, storage: RegistryFile) -> ConsoleResult<Self> {
        let registry = storage.load_registry()?;
        let preferences = storage.load_preferences().unwrap_or_else(|e| {
            warn!("Ignoring display preferences: {}", e);
            Preferences::default()
        });
        info!(
            "Opened console with {} registered Key Vaults (store: {})",
            registry.len(),
            store.provider_id()
        );
        let mut console = Self::new(store, registry);
        console.preferences = preferences;
        console.storage = Some(storage);
        Ok(console)
    }

    /// Fetch the list for the vault selected at startup
    ///
    /// # Errors
    /// Returns the fetch error, which is also surfaced in the load state
    pub async fn start(&mut self) -> ConsoleResult<()> {
        self.fetch(FetchReason::VaultSwitch).await
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn registry(&self) -> &VaultRegistry {
        &self.registry
    }

    pub fn vaults(&self) -> &[VaultRegistration] {
        self.registry.list()
    }

    pub fn selected_vault(&self) -> Option<&VaultRegistration> {
        self.registry.selected()
    }

    pub fn secrets(&self) -> &[SecretSummary] {
        &self.secrets
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn add_form(&self) -> &AddSecretForm {
        &self.add_form
    }

    pub fn edit_dialog(&self) -> &EditDialog {
        &self.edit_dialog
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// What the secret table shows for the current list and search text
    pub fn view(&self) -> SecretView<'_> {
        if self.registry.selected().is_none() {
            return SecretView::NoVault;
        }
        if self.is_loading() {
            return SecretView::Loading;
        }
        if self.secrets.is_empty() {
            return SecretView::Empty;
        }
        let matches = filter_secrets(&self.secrets, &self.search);
        if matches.is_empty() {
            SecretView::NoMatches
        } else {
            SecretView::Matches(matches)
        }
    }

    // ------------------------------------------------------------------
    // List fetching
    // ------------------------------------------------------------------

    /// Start a list fetch for the selected vault
    ///
    /// Returns `None` when no vault is selected; the list is cleared and the
    /// state goes idle. A vault switch clears the list immediately.
    pub fn begin_fetch(&mut self, reason: FetchReason) -> Option<FetchTicket> {
        let Some(vault) = self.registry.selected() else {
            self.secrets.clear();
            self.state = LoadState::Idle;
            return None;
        };

        self.fetch_seq += 1;
        let ticket = FetchTicket {
            seq: self.fetch_seq,
            vault_id: vault.id.clone(),
            endpoint: vault.value.clone(),
            reason,
        };
        if reason == FetchReason::VaultSwitch {
            self.secrets.clear();
        }
        self.state = LoadState::Loading;
        debug!("Fetch #{} started for Key Vault {}", ticket.seq, ticket.vault_id);
        Some(ticket)
    }

    /// Apply the result of a fetch started with [`Console::begin_fetch`]
    ///
    /// Returns `false` when the ticket is stale (a newer fetch was started or
    /// the selection moved on) and the result was discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: ConsoleResult<Vec<SecretSummary>>,
    ) -> bool {
        if ticket.seq != self.fetch_seq || self.registry.selected_id() != Some(ticket.vault_id.as_str()) {
            debug!(
                "Discarding stale fetch #{} for Key Vault {}",
                ticket.seq, ticket.vault_id
            );
            return false;
        }

        match result {
            Ok(secrets) => {
                debug!("Fetch #{} returned {} secrets", ticket.seq, secrets.len());
                self.secrets = secrets;
                self.state = LoadState::Ready;
            }
            Err(e) => {
                warn!("Failed to fetch secrets for {}: {}", ticket.vault_id, e);
                if ticket.reason == FetchReason::VaultSwitch {
                    self.secrets.clear();
                }
                self.state = LoadState::Error(e.user_message());
            }
        }
        true
    }

    /// Re-fetch the selected vault's list, keeping it on failure
    ///
    /// # Errors
    /// Returns the fetch error, which is also surfaced in the load state
    pub async fn refresh(&mut self) -> ConsoleResult<()> {
        self.fetch(FetchReason::Refresh).await
    }

    async fn fetch(&mut self, reason: FetchReason) -> ConsoleResult<()> {
        let Some(ticket) = self.begin_fetch(reason) else {
            return Ok(());
        };
        let store = Arc::clone(&self.store);
        let result = store.list_secrets(ticket.endpoint()).await;
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        };
        self.complete_fetch(&ticket, result);
        outcome
    }

    // ------------------------------------------------------------------
    // Vault registry
    // ------------------------------------------------------------------

    /// Switch to another registered vault and fetch its list
    ///
    /// Closes the edit dialog and drops any pending confirmation; the search
    /// text is kept.
    ///
    /// # Errors
    /// Returns a validation error for an unknown id, or the fetch error
    pub async fn select_vault(&mut self, id: &str) -> ConsoleResult<()> {
        if self.registry.selected_id() == Some(id) {
            return Ok(());
        }
        let result = self.registry.select(id).map(|_| ());
        self.surface(result)?;
        self.edit_dialog = EditDialog::Closed;
        self.pending = None;
        self.fetch(FetchReason::VaultSwitch).await
    }

    /// Register a vault and persist the registry
    ///
    /// When nothing was selected the new vault becomes selected and its list
    /// is fetched.
    ///
    /// # Errors
    /// Returns a validation error for bad input or a duplicate id, or a
    /// storage error if the registry cannot be written
    pub async fn add_vault(&mut self, name: &str, endpoint: &str) -> ConsoleResult<VaultRegistration> {
        let result = VaultRegistry::registration(name, endpoint)
            .and_then(|vault| self.registry.add(vault).cloned());
        let vault = self.surface(result)?;
        self.persist_registry()?;

        if self.registry.selected_id() == Some(vault.id.as_str()) {
            // Fetch errors are surfaced in the load state; the vault was still added
            let _ = self.fetch(FetchReason::VaultSwitch).await;
        }
        Ok(vault)
    }

    /// Ask for confirmation before removing a vault
    ///
    /// # Errors
    /// Returns a validation error if the id is not registered
    pub fn request_remove_vault(&mut self, id: &str) -> ConsoleResult<&PendingAction> {
        let result = self
            .registry
            .get(id)
            .map(|vault| PendingAction::RemoveVault {
                id: vault.id.clone(),
                name: vault.name.clone(),
            })
            .ok_or_else(|| ConsoleError::validation(format!("Key Vault \"{id}\" is not registered")));
        let action = self.surface(result)?;
        Ok(&*self.pending.insert(action))
    }

    // ------------------------------------------------------------------
    // Add secret
    // ------------------------------------------------------------------

    pub fn set_add_form(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.add_form.name = name.into();
        self.add_form.value = value.into();
    }

    /// Validate the add form and ask for confirmation
    ///
    /// # Errors
    /// Returns a validation error when no vault is selected, a list fetch is
    /// outstanding, or either field is empty
    pub fn submit_add_secret(&mut self) -> ConsoleResult<&PendingAction> {
        let result = self.prepare_add();
        let action = self.surface(result)?;
        Ok(&*self.pending.insert(action))
    }

    fn prepare_add(&self) -> ConsoleResult<PendingAction> {
        let vault = self.require_idle_vault()?;
        require_non_empty("Secret Name", &self.add_form.name)?;
        require_non_empty("Secret Value", &self.add_form.value)?;
        Ok(PendingAction::CreateSecret {
            vault_name: vault.name.clone(),
            endpoint: vault.value.clone(),
            name: self.add_form.name.clone(),
            value: SecretValue::new(self.add_form.value.clone()),
        })
    }

    // ------------------------------------------------------------------
    // Edit secret
    // ------------------------------------------------------------------

    /// Fetch a secret's current value and open the edit dialog
    ///
    /// Disabled secrets are refused without a backend call.
    ///
    /// # Errors
    /// Returns a validation error for disabled secrets or when no vault is
    /// selected, or the backend error from the fetch
    pub async fn open_edit(&mut self, name: &str) -> ConsoleResult<&EditDialog> {
        let result = self.check_editable(name);
        let endpoint = self.surface(result)?;

        let store = Arc::clone(&self.store);
        let result = store.get_secret(&endpoint, name).await.and_then(|detail| {
            if detail.enabled() {
                Ok(detail)
            } else {
                Err(disabled_secret(name))
            }
        });
        let detail = self.surface(result)?;

        self.edit_dialog = EditDialog::Open {
            name: detail.summary.name.clone(),
            enabled: detail.summary.enabled,
            draft: detail.value.clone(),
        };
        Ok(&self.edit_dialog)
    }

    fn check_editable(&self, name: &str) -> ConsoleResult<String> {
        let vault = self.require_idle_vault()?;
        if let Some(summary) = self.secrets.iter().find(|s| s.name == name) {
            if !summary.enabled {
                return Err(disabled_secret(name));
            }
        }
        Ok(vault.value.clone())
    }

    /// Replace the value being edited
    ///
    /// # Errors
    /// Returns a validation error if the dialog is closed
    pub fn set_edit_value(&mut self, value: impl Into<String>) -> ConsoleResult<()> {
        match &mut self.edit_dialog {
            EditDialog::Open { draft, .. } => {
                *draft = SecretValue::new(value.into());
                Ok(())
            }
            EditDialog::Closed => Err(ConsoleError::validation("No secret is being edited")),
        }
    }

    /// Validate the edited value and ask for confirmation
    ///
    /// # Errors
    /// Returns a validation error if the dialog is closed or the value is empty
    pub fn submit_edit(&mut self) -> ConsoleResult<&PendingAction> {
        let result = self.prepare_update();
        let action = self.surface(result)?;
        Ok(&*self.pending.insert(action))
    }

    fn prepare_update(&self) -> ConsoleResult<PendingAction> {
        let vault = self.require_idle_vault()?;
        let EditDialog::Open { name, draft, .. } = &self.edit_dialog else {
            return Err(ConsoleError::validation("No secret is being edited"));
        };
        if draft.is_empty() {
            return Err(ConsoleError::validation("Secret Value is required"));
        }
        Ok(PendingAction::UpdateSecret {
            vault_name: vault.name.clone(),
            endpoint: vault.value.clone(),
            name: name.clone(),
            value: draft.clone(),
        })
    }

    /// Close the edit dialog and re-fetch the list
    ///
    /// # Errors
    /// Returns the fetch error, which is also surfaced in the load state
    pub async fn close_edit(&mut self) -> ConsoleResult<()> {
        self.edit_dialog = EditDialog::Closed;
        if matches!(self.pending, Some(PendingAction::UpdateSecret { .. })) {
            self.pending = None;
        }
        self.refresh().await
    }

    // ------------------------------------------------------------------
    // Confirmation
    // ------------------------------------------------------------------

    /// Run the pending action
    ///
    /// # Errors
    /// Returns a validation error when nothing is pending, or the error of
    /// the action itself
    pub async fn confirm(&mut self) -> ConsoleResult<ConfirmOutcome> {
        let Some(action) = self.pending.take() else {
            return Err(ConsoleError::validation("Nothing to confirm"));
        };

        match action {
            PendingAction::CreateSecret {
                endpoint,
                name,
                value,
                ..
            } => {
                let store = Arc::clone(&self.store);
                let result = store.set_secret(&endpoint, &name, &value).await;
                let summary = self.surface(result)?;
                info!("Created secret {}", name);
                self.add_form.clear();
                self.state = LoadState::Ready;
                let _ = self.refresh().await;
                Ok(ConfirmOutcome::SecretCreated(summary))
            }
            PendingAction::UpdateSecret {
                endpoint,
                name,
                value,
                ..
            } => {
                let store = Arc::clone(&self.store);
                let result = store.set_secret(&endpoint, &name, &value).await;
                let summary = self.surface(result)?;
                info!("Updated secret {}", name);
                self.edit_dialog = EditDialog::Closed;
                self.state = LoadState::Ready;
                let _ = self.refresh().await;
                Ok(ConfirmOutcome::SecretUpdated(summary))
            }
            PendingAction::RemoveVault { id, .. } => {
                let previous = self.registry.selected_id().map(str::to_string);
                let result = self.registry.remove(&id);
                let removed = self.surface(result)?;
                self.persist_registry()?;

                if self.registry.selected_id() != previous.as_deref() {
                    self.edit_dialog = EditDialog::Closed;
                    let _ = self.fetch(FetchReason::VaultSwitch).await;
                }
                Ok(ConfirmOutcome::VaultRemoved(removed))
            }
        }
    }

    /// Drop the pending action; nothing else changes
    pub fn decline(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    // ------------------------------------------------------------------
    // Search and preferences
    // ------------------------------------------------------------------

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Flip dark mode and persist the preference
    ///
    /// # Errors
    /// Returns a storage error if the preferences file cannot be written
    pub fn toggle_dark_mode(&mut self) -> ConsoleResult<bool> {
        let dark_mode = self.preferences.toggle_dark_mode();
        if let Some(storage) = &self.storage {
            storage.save_preferences(&self.preferences)?;
        }
        Ok(dark_mode)
    }

    /// Clear a surfaced error
    pub fn dismiss_error(&mut self) {
        if matches!(self.state, LoadState::Error(_)) {
            self.state = if self.registry.selected().is_some() {
                LoadState::Ready
            } else {
                LoadState::Idle
            };
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require_idle_vault(&self) -> ConsoleResult<&VaultRegistration> {
        let vault = self
            .registry
            .selected()
            .ok_or_else(|| ConsoleError::validation("Select a Key Vault first"))?;
        if self.is_loading() {
            return Err(ConsoleError::validation(
                "Secrets are still loading, try again when the list is ready",
            ));
        }
        Ok(vault)
    }

    fn persist_registry(&mut self) -> ConsoleResult<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let result = storage.save_registry(&self.registry);
        if let Ok(SaveOutcome::SkippedEmpty) = result {
            debug!("Registry is empty, previous file kept");
        }
        self.surface(result).map(|_| ())
    }

    /// Record a failure in the load state before handing it back
    fn surface<T>(&mut self, result: ConsoleResult<T>) -> ConsoleResult<T> {
        if let Err(e) = &result {
            warn!("{}", e);
            self.state = LoadState::Error(e.user_message());
        }
        result
    }
}

fn disabled_secret(name: &str) -> ConsoleError {
    ConsoleError::validation(format!("Secret \"{name}\" is disabled and cannot be edited"))
}
