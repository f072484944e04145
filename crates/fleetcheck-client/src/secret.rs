//! Credential storage
//!
//! Credentials are kept per service name. Entries older than the rotation
//! window are replaced on the next store; fresh ones are left alone.

use chrono::{DateTime, Duration, Utc};
use fleetcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Age after which a stored secret is replaced
pub const DEFAULT_ROTATION_DAYS: i64 = 30;

/// One stored credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub service: String,
    pub account: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
}

/// Keyed credential storage
pub trait SecretStore: Send + Sync {
    /// Look up the entry for `service`
    fn read(&self, service: &str) -> Result<Option<SecretEntry>>;

    /// Add a new entry; fails if `service` already has one
    fn write(&self, entry: SecretEntry) -> Result<()>;

    /// Remove the entry for `service`, returning whether one existed
    fn delete(&self, service: &str) -> Result<bool>;
}

// ============================================================================
// Environment store
// ============================================================================

/// Read-only store backed by process environment variables.
///
/// The service name is the variable name. Environment values carry no
/// creation time, so they are reported as created now.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    account: String,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self {
            account: "env".to_string(),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn read(&self, service: &str) -> Result<Option<SecretEntry>> {
        Ok(std::env::var(service)
            .ok()
            .filter(|value| !value.is_empty())
            .map(|secret| SecretEntry {
                service: service.to_string(),
                account: self.account.clone(),
                secret,
                created_at: Utc::now(),
            }))
    }

    fn write(&self, entry: SecretEntry) -> Result<()> {
        Err(Error::secret(format!(
            "cannot store {}: the environment store is read-only",
            entry.service
        )))
    }

    fn delete(&self, service: &str) -> Result<bool> {
        Err(Error::secret(format!(
            "cannot delete {}: the environment store is read-only",
            service
        )))
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON file holding a list of entries
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<SecretEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::secret(format!(
                "failed to read secret store {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the file atomically; the new content is never readable by others
    fn save(&self, entries: &[SecretEntry]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // NamedTempFile is created 0600 on unix
        let mut staged = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(staged.as_file_mut(), entries)?;
        staged.as_file_mut().write_all(b"\n")?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), entries = entries.len(), "Saved secret store");
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn read(&self, service: &str) -> Result<Option<SecretEntry>> {
        Ok(self.load()?.into_iter().find(|e| e.service == service))
    }

    fn write(&self, entry: SecretEntry) -> Result<()> {
        let mut entries = self.load()?;
        if entries.iter().any(|e| e.service == entry.service) {
            return Err(Error::secret(format!(
                "an entry for {} already exists",
                entry.service
            )));
        }
        entries.push(entry);
        self.save(&entries)
    }

    fn delete(&self, service: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.service != service);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// What `store_with_rotation` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// No entry existed; a new one was written
    Created,
    /// The entry was older than the window and was replaced
    Rotated,
    /// The entry is within the window and was kept
    UpToDate,
}

/// Store `secret` unless a fresh entry for `service` already exists
pub fn store_with_rotation(
    store: &dyn SecretStore,
    account: &str,
    service: &str,
    secret: &str,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<RotationOutcome> {
    let outcome = match store.read(service)? {
        Some(existing) if now - existing.created_at <= max_age => {
            info!(service, "Secret is up to date");
            return Ok(RotationOutcome::UpToDate);
        }
        Some(existing) => {
            info!(
                service,
                age_days = (now - existing.created_at).num_days(),
                "Secret is past its rotation window, replacing it"
            );
            store.delete(service)?;
            RotationOutcome::Rotated
        }
        None => RotationOutcome::Created,
    };

    store.write(SecretEntry {
        service: service.to_string(),
        account: account.to_string(),
        secret: secret.to_string(),
        created_at: now,
    })?;

    info!(service, account, ?outcome, "Secret stored");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn store() -> (TempDir, FileSecretStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(dir.path().join("nested").join("secrets.json"));
        (dir, store)
    }

    fn window() -> Duration {
        Duration::days(DEFAULT_ROTATION_DAYS)
    }

    #[test]
    fn test_file_store_roundtrip() {
        let (_dir, store) = store();
        assert_eq!(store.read("api").unwrap(), None);

        let entry = SecretEntry {
            service: "api".to_string(),
            account: "ops".to_string(),
            secret: "s3cret".to_string(),
            created_at: now(),
        };
        store.write(entry.clone()).unwrap();

        assert_eq!(store.read("api").unwrap(), Some(entry.clone()));
        assert!(store.write(entry).is_err(), "duplicate service must be rejected");

        assert!(store.delete("api").unwrap());
        assert!(!store.delete("api").unwrap());
        assert_eq!(store.read("api").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private_from_first_write() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store_with_rotation(&store, "ops", "api", "token", now(), window()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let leftovers: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("secrets.json")]);
    }

    #[test]
    fn test_rotation_creates_then_keeps_fresh_entry() {
        let (_dir, store) = store();

        let first = store_with_rotation(&store, "ops", "api", "one", now(), window()).unwrap();
        assert_eq!(first, RotationOutcome::Created);

        let later = now() + Duration::days(10);
        let second = store_with_rotation(&store, "ops", "api", "two", later, window()).unwrap();
        assert_eq!(second, RotationOutcome::UpToDate);
        assert_eq!(store.read("api").unwrap().unwrap().secret, "one");
    }

    #[test]
    fn test_rotation_replaces_expired_entry() {
        let (_dir, store) = store();
        store_with_rotation(&store, "ops", "api", "one", now(), window()).unwrap();

        let later = now() + Duration::days(31);
        let outcome = store_with_rotation(&store, "ops", "api", "two", later, window()).unwrap();
        assert_eq!(outcome, RotationOutcome::Rotated);

        let entry = store.read("api").unwrap().unwrap();
        assert_eq!(entry.secret, "two");
        assert_eq!(entry.created_at, later);
    }

    #[test]
    fn test_rotation_boundary_is_inclusive() {
        let (_dir, store) = store();
        store_with_rotation(&store, "ops", "api", "one", now(), window()).unwrap();

        let outcome =
            store_with_rotation(&store, "ops", "api", "two", now() + window(), window()).unwrap();
        assert_eq!(outcome, RotationOutcome::UpToDate);
    }

    #[test]
    fn test_env_store_is_read_only() {
        let store = EnvSecretStore::new();
        std::env::set_var("FLEETCHECK_TEST_SECRET_STORE", "value");

        let entry = store.read("FLEETCHECK_TEST_SECRET_STORE").unwrap().unwrap();
        assert_eq!(entry.secret, "value");
        assert_eq!(store.read("FLEETCHECK_TEST_SECRET_UNSET").unwrap(), None);

        assert!(matches!(store.write(entry), Err(Error::Secret(_))));
        assert!(store.delete("FLEETCHECK_TEST_SECRET_STORE").is_err());
    }

    #[test]
    fn test_corrupt_file_is_secret_error() {
        let (dir, _) = store();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ nope").unwrap();

        let store = FileSecretStore::new(path);
        assert!(matches!(store.read("api"), Err(Error::Secret(_))));
    }
}
