//! # Console Configuration
//!
//! Console configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via
//! environment variables; command-line flags override both.

mod console;
mod credential;

pub use console::ConsoleConfig;
pub use credential::{CredentialKind, CredentialSource};

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
