use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::{parse_counter, Driver, Error, Expiration};
use crate::clock::{Clock, SystemClock};

const FOLDER_LEN: usize = 4;
const FALLBACK_DIR: &str = "failover-cache";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default)]
    pub root_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Entry {
    #[serde(rename = "d")]
    value: String,
    #[serde(rename = "t")]
    expires_at: u64,
}

/// Driver storing one JSON file per key below a root directory.
#[derive(Debug)]
pub struct Backend {
    root_dir: PathBuf,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_fallback(config, &std::env::temp_dir())
    }

    /// Uses `base/failover-cache` when the configured directory is unset or missing, so that
    /// `clean` never empties a directory shared with other programs.
    fn with_fallback(config: &BackendConfig, base: &Path) -> Self {
        let root_dir = match &config.root_dir {
            Some(dir) if Path::new(dir).is_dir() => PathBuf::from(dir),
            Some(dir) => {
                let fallback = base.join(FALLBACK_DIR);
                warn!(
                    "Cache directory {dir} does not exist, using {}",
                    fallback.display()
                );
                fallback
            }
            None => base.join(FALLBACK_DIR),
        };

        if let Err(err) = std::fs::create_dir_all(&root_dir) {
            warn!("Unable to create cache directory {}: {err}", root_dir.display());
        }

        info!("Using file cache driver in {}", root_dir.display());
        Backend { root_dir }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(key.as_bytes()));
        let mut path = self.root_dir.clone();
        for start in (0..hash.len()).step_by(FOLDER_LEN) {
            path.push(&hash[start..(start + FOLDER_LEN).min(hash.len())]);
        }
        path
    }

    async fn write_entry(&self, key: &str, entry: &Entry) -> Result<(), Error> {
        let path = self.key_to_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, serde_json::to_vec(entry)?).await?;
        Ok(())
    }
}

#[async_trait]
impl Driver for Backend {
    async fn is_connected(&self) -> bool {
        match fs::metadata(&self.root_dir).await {
            Ok(metadata) => metadata.is_dir() && !metadata.permissions().readonly(),
            Err(err) => {
                debug!("Cache directory {} unavailable: {err}", self.root_dir.display());
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.key_to_path(key);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let Ok(entry) = serde_json::from_slice::<Entry>(&content) else {
            debug!("Ignoring unreadable cache file {}", path.display());
            return Ok(None);
        };

        if entry.expires_at > SystemClock.now() {
            return Ok(Some(entry.value));
        }

        match fs::remove_file(&path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), Error> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Expiration::resolve(expiration, SystemClock.now()).deadline(),
        };
        self.write_entry(key, &entry).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.key_to_path(key)).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    async fn clean(&self) -> Result<(), Error> {
        let mut entries = fs::read_dir(&self.root_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&path).await?;
            } else {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    async fn increment(&self, key: &str, offset: i64) -> Result<(), Error> {
        let current = parse_counter(self.get(key).await?.as_deref());
        let entry = Entry {
            value: current.wrapping_add(offset).to_string(),
            expires_at: Expiration::BackendDefault.deadline(),
        };
        self.write_entry(key, &entry).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn backend(dir: &TempDir) -> Backend {
        Backend::new(&BackendConfig {
            root_dir: Some(dir.path().to_string_lossy().to_string()),
        })
    }

    #[test]
    fn test_missing_directory_falls_back_to_dedicated_dir() {
        let backend = Backend::new(&BackendConfig {
            root_dir: Some("/this/directory/does/not/exist".to_string()),
        });
        assert_eq!(
            backend.root_dir(),
            std::env::temp_dir().join(FALLBACK_DIR).as_path()
        );
        assert!(backend.root_dir().is_dir());
    }

    #[tokio::test]
    async fn test_clean_spares_files_beside_fallback_dir() {
        let base = TempDir::new().unwrap();
        let neighbour = base.path().join("other-program.txt");
        std::fs::write(&neighbour, "keep me").unwrap();

        let backend = Backend::with_fallback(
            &BackendConfig {
                root_dir: Some("/this/directory/does/not/exist".to_string()),
            },
            base.path(),
        );
        assert_eq!(backend.root_dir(), base.path().join(FALLBACK_DIR).as_path());

        backend.set("key", "value", 0).await.unwrap();
        backend.clean().await.unwrap();

        assert_eq!(backend.get("key").await, Ok(None));
        assert!(neighbour.exists());
        assert!(backend.root_dir().is_dir());
    }

    #[tokio::test]
    async fn test_disappearing_directory_is_disconnected() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("cache");
        std::fs::create_dir(&root).unwrap();

        let backend = Backend::new(&BackendConfig {
            root_dir: Some(root.to_string_lossy().to_string()),
        });
        assert!(backend.is_connected().await);

        std::fs::remove_dir_all(&root).unwrap();
        assert!(!backend.is_connected().await);
    }

    #[test]
    fn test_key_to_path_is_sharded() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        let path = backend.key_to_path("key");
        let relative = path.strip_prefix(dir.path()).unwrap();

        // 64 hex characters split in segments of 4
        assert_eq!(relative.components().count(), 16);
        assert_eq!(backend.key_to_path("key"), path);
        assert_ne!(backend.key_to_path("other"), path);
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        assert!(backend.is_connected().await);

        assert_eq!(backend.get("key").await, Ok(None));

        backend.set("key", "value", 60).await.unwrap();
        assert_eq!(backend.get("key").await, Ok(Some("value".to_string())));

        backend.delete("key").await.unwrap();
        assert_eq!(backend.get("key").await, Ok(None));
        assert!(backend.delete("key").await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_expiration_never_expires() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        backend.set("key", "value", 0).await.unwrap();
        assert_eq!(backend.get("key").await, Ok(Some("value".to_string())));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        // absolute deadline one second from now
        let deadline = SystemClock.now() + 1;
        backend.set("key", "value", deadline).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        assert_eq!(backend.get("key").await, Ok(None));
        assert!(!backend.key_to_path("key").exists());
    }

    #[tokio::test]
    async fn test_counters() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        backend.increment("hits", 2).await.unwrap();
        backend.increment("hits", 2).await.unwrap();
        backend.decrement("hits", 1).await.unwrap();

        assert_eq!(backend.get("hits").await, Ok(Some("3".to_string())));
    }

    #[tokio::test]
    async fn test_clean_twice() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        backend.set("a", "1", 0).await.unwrap();
        backend.set("b", "2", 0).await.unwrap();

        backend.clean().await.unwrap();
        assert_eq!(backend.get("a").await, Ok(None));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        backend.clean().await.unwrap();
        assert_eq!(backend.get("b").await, Ok(None));
    }
}
