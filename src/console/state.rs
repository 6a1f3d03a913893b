//! # Console State
//!
//! Transient session state: load status, form and dialog contents, pending
//! confirmations. Nothing here is persisted.

use crate::models::{SecretSummary, SecretValue, VaultRegistration};

/// Status of the selected vault's secret list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No vault selected
    Idle,
    /// A list fetch is outstanding
    Loading,
    /// List rendered
    Ready,
    /// The last operation failed with this message
    Error(String),
}

/// Why a list fetch was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    /// The selected vault changed; the previous list is cleared up front
    VaultSwitch,
    /// Explicit refresh or re-fetch after a mutation; the list is kept on failure
    Refresh,
}

/// Handle for one outstanding list fetch
///
/// Only the most recently issued ticket may update the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub(crate) seq: u64,
    pub(crate) vault_id: String,
    pub(crate) endpoint: String,
    pub(crate) reason: FetchReason,
}

impl FetchTicket {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }
}

/// Contents of the add-secret form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSecretForm {
    pub name: String,
    pub value: String,
}

impl AddSecretForm {
    pub fn clear(&mut self) {
        self.name.clear();
        self.value.clear();
    }
}

/// Edit-secret dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditDialog {
    #[default]
    Closed,
    Open {
        name: String,
        enabled: bool,
        /// Value being edited, initialized from a fresh fetch
        draft: SecretValue,
    },
}

impl EditDialog {
    pub fn is_open(&self) -> bool {
        matches!(self, EditDialog::Open { .. })
    }

    pub fn secret_name(&self) -> Option<&str> {
        match self {
            EditDialog::Open { name, .. } => Some(name),
            EditDialog::Closed => None,
        }
    }
}

/// A destructive action waiting for explicit user confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CreateSecret {
        vault_name: String,
        endpoint: String,
        name: String,
        value: SecretValue,
    },
    UpdateSecret {
        vault_name: String,
        endpoint: String,
        name: String,
        value: SecretValue,
    },
    RemoveVault {
        id: String,
        name: String,
    },
}

impl PendingAction {
    /// Question shown to the user before the action runs
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::CreateSecret {
                vault_name, name, ..
            } => format!(
                "Are you sure you want to create a new secret \"{name}\" in key vault \"{vault_name}\"? This action cannot be undone."
            ),
            PendingAction::UpdateSecret {
                vault_name, name, ..
            } => format!(
                "Are you sure you want to update the secret \"{name}\" in key vault \"{vault_name}\"? This action cannot be undone."
            ),
            PendingAction::RemoveVault { name, .. } => format!(
                "Are you sure you want to remove the Key Vault \"{name}\"? This action cannot be undone."
            ),
        }
    }
}

/// Result of a confirmed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    SecretCreated(SecretSummary),
    SecretUpdated(SecretSummary),
    VaultRemoved(VaultRegistration),
}

/// What the secret table should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretView<'a> {
    /// No vault selected: prompt the user to add one
    NoVault,
    Loading,
    /// The vault has no secrets at all
    Empty,
    /// The vault has secrets but none match the search text
    NoMatches,
    Matches(Vec<&'a SecretSummary>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_name_secret_and_vault() {
        let create = PendingAction::CreateSecret {
            vault_name: "Prod".to_string(),
            endpoint: "prod-kv".to_string(),
            name: "api-key".to_string(),
            value: SecretValue::new("v"),
        };
        assert_eq!(
            create.prompt(),
            "Are you sure you want to create a new secret \"api-key\" in key vault \"Prod\"? This action cannot be undone."
        );

        let update = PendingAction::UpdateSecret {
            vault_name: "Prod".to_string(),
            endpoint: "prod-kv".to_string(),
            name: "api-key".to_string(),
            value: SecretValue::new("v"),
        };
        assert!(update.prompt().starts_with("Are you sure you want to update the secret \"api-key\""));
    }

    #[test]
    fn test_edit_dialog_accessors() {
        let dialog = EditDialog::Open {
            name: "db".to_string(),
            enabled: true,
            draft: SecretValue::new("x"),
        };
        assert!(dialog.is_open());
        assert_eq!(dialog.secret_name(), Some("db"));
        assert_eq!(EditDialog::Closed.secret_name(), None);
    }
}
