//! # Key Vault Console
//!
//! Library behind the `kvconsole` terminal console for Azure Key Vault secrets.
//!
//! ## Overview
//!
//! The console is a thin orchestration layer over a secret-management service:
//!
//! 1. **Secret-store client** - [`provider::SecretStore`] lists, reads and writes secrets in a vault
//! 2. **Vault registry** - [`registry::VaultRegistry`] is a locally persisted bookmark list of vaults
//! 3. **Console controller** - [`console::Console`] tracks selection, loading, errors, dialogs and
//!    pending confirmations, and re-fetches the secret list after every mutation
//!
//! Storage, encryption, versioning and access control stay with the backend.

pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod models;
pub mod observability;
pub mod provider;
pub mod registry;
pub mod validation;

pub use console::Console;
pub use error::{ConsoleError, ConsoleResult};
pub use models::{Preferences, SecretDetail, SecretSummary, SecretValue, VaultRegistration};
pub use provider::SecretStore;
pub use registry::VaultRegistry;
