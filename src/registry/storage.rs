//! Registry persistence
//!
//! The registry is stored as a flat JSON array of `{id, name, value}` records
//! and restored verbatim on startup. Display preferences live in a separate
//! file.
//!
//! An empty registry is never written. Removing the last vault therefore
//! leaves the previous file in place and that vault comes back on the next
//! start; "empty" and "never configured" look the same on disk.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::VaultRegistry;
use crate::constants::{PREFERENCES_FILE, REGISTRY_FILE};
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{Preferences, VaultRegistration};

/// Result of a registry save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The registry was empty; the file on disk was left untouched
    SkippedEmpty,
}

/// On-disk location of the registry and preferences
#[derive(Debug, Clone)]
pub struct RegistryFile {
    dir: PathBuf,
}

impl RegistryFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }

    /// Load the registry; a missing file yields an empty registry
    ///
    /// # Errors
    /// Returns a storage error if the file exists but cannot be read or parsed
    pub fn load_registry(&self) -> ConsoleResult<VaultRegistry> {
        let path = self.registry_path();
        let Some(content) = read_optional(&path)? else {
            debug!("No registry at {}, starting empty", path.display());
            return Ok(VaultRegistry::new());
        };

        let vaults: Vec<VaultRegistration> = serde_json::from_str(&content).map_err(|e| {
            ConsoleError::storage(format!(
                "Failed to parse Key Vault registry {}: {e}",
                path.display()
            ))
        })?;
        debug!("Loaded {} Key Vaults from {}", vaults.len(), path.display());
        Ok(VaultRegistry::from_vaults(vaults))
    }

    /// Rewrite the registry file wholesale, unless the registry is empty
    ///
    /// # Errors
    /// Returns a storage error if the file cannot be written
    pub fn save_registry(&self, registry: &VaultRegistry) -> ConsoleResult<SaveOutcome> {
        if registry.is_empty() {
            warn!(
                "Key Vault registry is empty, leaving {} unchanged",
                self.registry_path().display()
            );
            return Ok(SaveOutcome::SkippedEmpty);
        }

        let content = serde_json::to_string_pretty(registry.list())?;
        self.write(&self.registry_path(), &content)?;
        Ok(SaveOutcome::Written)
    }

    /// Load display preferences; a missing file yields defaults
    ///
    /// # Errors
    /// Returns a storage error if the file exists but cannot be read or parsed
    pub fn load_preferences(&self) -> ConsoleResult<Preferences> {
        match read_optional(&self.preferences_path())? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Preferences::default()),
        }
    }

    /// # Errors
    /// Returns a storage error if the file cannot be written
    pub fn save_preferences(&self, preferences: &Preferences) -> ConsoleResult<()> {
        let content = serde_json::to_string_pretty(preferences)?;
        self.write(&self.preferences_path(), &content)
    }

    fn write(&self, path: &Path, content: &str) -> ConsoleResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ConsoleError::storage(format!(
                "Failed to create config directory {}: {e}",
                self.dir.display()
            ))
        })?;
        fs::write(path, content).map_err(|e| {
            ConsoleError::storage(format!("Failed to write {}: {e}", path.display()))
        })
    }
}

fn read_optional(path: &Path) -> ConsoleResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConsoleError::storage(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_registry() {
        let dir = TempDir::new().unwrap();
        let file = RegistryFile::new(dir.path());
        assert!(file.load_registry().unwrap().is_empty());
        assert_eq!(file.load_preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn test_save_and_restore_verbatim() {
        let dir = TempDir::new().unwrap();
        let file = RegistryFile::new(dir.path().join("nested"));
        let mut registry = VaultRegistry::new();
        registry.add(VaultRegistration::new("Dev", "dev-kv")).unwrap();
        registry
            .add(VaultRegistration::new("Prod", "https://prod-kv.vault.azure.net/"))
            .unwrap();

        assert_eq!(file.save_registry(&registry).unwrap(), SaveOutcome::Written);

        let restored = file.load_registry().unwrap();
        assert_eq!(restored.list(), registry.list());
        assert_eq!(restored.selected_id(), Some("dev"));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.registry_path()).unwrap()).unwrap();
        assert_eq!(raw[1]["value"], "https://prod-kv.vault.azure.net/");
    }

    #[test]
    fn test_empty_registry_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let file = RegistryFile::new(dir.path());
        let mut registry = VaultRegistry::new();
        registry.add(VaultRegistration::new("Dev", "dev-kv")).unwrap();
        file.save_registry(&registry).unwrap();

        registry.remove("dev").unwrap();
        assert_eq!(
            file.save_registry(&registry).unwrap(),
            SaveOutcome::SkippedEmpty
        );

        // The stale entry comes back on reload
        let reloaded = file.load_registry().unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].id, "dev");
    }

    #[test]
    fn test_corrupt_registry_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = RegistryFile::new(dir.path());
        fs::write(file.registry_path(), "{not json").unwrap();
        let err = file.load_registry().unwrap_err();
        assert!(matches!(err, ConsoleError::Storage(_)));
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = RegistryFile::new(dir.path());
        let mut prefs = Preferences::default();
        prefs.toggle_dark_mode();
        file.save_preferences(&prefs).unwrap();
        assert!(file.load_preferences().unwrap().dark_mode);
    }
}
