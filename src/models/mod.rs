//! # Models
//!
//! Data shapes shared by the secret-store client, registry and console.

mod preferences;
mod secret;
mod vault;

pub use preferences::Preferences;
pub use secret::{SecretDetail, SecretSummary, SecretValue};
pub use vault::VaultRegistration;
