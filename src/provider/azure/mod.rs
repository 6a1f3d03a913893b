//! # Azure Providers
//!
//! Azure Key Vault secrets client.

pub mod key_vault;
