//! Persistent index of container bindings.
//!
//! The rendered vhost file is the only other place that knows which container a
//! domain proxies to, so the binding is recorded here when a host is added and
//! read back when its config is recreated. Existence of a host is never decided
//! by this index.
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::INDEX_LOCK_SUFFIX;
use crate::error::HostIndexError;

/// Upstream target recorded for a domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostBinding {
    pub container_name: String,
    pub container_port: u16,
    pub created_at: DateTime<Utc>,
}

impl HostBinding {
    pub fn new(container_name: impl Into<String>, container_port: u16) -> Self {
        Self {
            container_name: container_name.into(),
            container_port,
            created_at: Utc::now(),
        }
    }
}

/// On-disk representation of the index.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HostIndexFile {
    hosts: BTreeMap<String, HostBinding>,
}

impl HostIndexFile {
    pub fn get(&self, domain: &str) -> Option<&HostBinding> {
        self.hosts.get(domain)
    }

    pub fn hosts(&self) -> &BTreeMap<String, HostBinding> {
        &self.hosts
    }
}

/// Handle on the index file at a fixed path.
#[derive(Debug, Clone)]
pub struct HostIndex {
    path: PathBuf,
}

/// Exclusive advisory lock, released on drop.
struct IndexLock {
    file: File,
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl HostIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(INDEX_LOCK_SUFFIX);
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<IndexLock, HostIndexError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| HostIndexError::Lock {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| HostIndexError::Lock { path, source })?;
        Ok(IndexLock { file })
    }

    /// Loads the index; a missing file is an empty index.
    pub fn load(&self) -> Result<HostIndexFile, HostIndexError> {
        if !self.path.exists() {
            return Ok(HostIndexFile::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        let index = serde_json::from_str::<HostIndexFile>(&contents)?;
        Ok(index)
    }

    fn save(&self, index: &HostIndexFile) -> Result<(), HostIndexError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(index)?)?;
        Ok(())
    }

    /// Looks up the binding of one domain.
    pub fn get(&self, domain: &str) -> Result<Option<HostBinding>, HostIndexError> {
        Ok(self.load()?.get(domain).cloned())
    }

    /// Records or replaces the binding of `domain`.
    pub fn insert(&self, domain: &str, binding: HostBinding) -> Result<(), HostIndexError> {
        let _lock = self.lock()?;
        let mut index = self.load()?;
        index.hosts.insert(domain.to_string(), binding);
        self.save(&index)?;
        debug!("Recorded binding for '{domain}' in {}", self.path.display());
        Ok(())
    }

    /// Drops the binding of `domain`.
    pub fn remove(&self, domain: &str) -> Result<HostBinding, HostIndexError> {
        let _lock = self.lock()?;
        let mut index = self.load()?;
        let binding = index
            .hosts
            .remove(domain)
            .ok_or(HostIndexError::DomainNotFound)?;
        self.save(&index)?;
        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let index = HostIndex::new(dir.path().join("hosts.json"));
        assert!(index.load().unwrap().hosts().is_empty());
        assert_eq!(index.get("example.com").unwrap(), None);
    }

    #[test]
    fn insert_and_remove_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/hosts.json");
        let index = HostIndex::new(&path);

        index
            .insert("example.com", HostBinding::new("app1", 8080))
            .unwrap();
        index.insert("other.org", HostBinding::new("app2", 80)).unwrap();

        let reopened = HostIndex::new(&path);
        let binding = reopened.get("example.com").unwrap().unwrap();
        assert_eq!(binding.container_name, "app1");
        assert_eq!(binding.container_port, 8080);
        assert!(dir.path().join("state/hosts.json.lock").exists());

        let removed = reopened.remove("example.com").unwrap();
        assert_eq!(removed.container_name, "app1");
        assert_eq!(reopened.get("example.com").unwrap(), None);
        assert!(reopened.get("other.org").unwrap().is_some());
    }

    #[test]
    fn removing_unknown_domain_fails() {
        let dir = tempdir().unwrap();
        let index = HostIndex::new(dir.path().join("hosts.json"));
        assert!(matches!(
            index.remove("example.com"),
            Err(HostIndexError::DomainNotFound)
        ));
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hosts.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            HostIndex::new(&path).load(),
            Err(HostIndexError::Parse(_))
        ));
    }
}
