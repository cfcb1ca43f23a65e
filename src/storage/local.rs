//! Local filesystem storage implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::StateStore;

/// State file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read bytes, returning None if file doesn't exist.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::state(format!(
                "could not replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl StateStore for LocalStorage {
    fn load(&self) -> Result<Snapshot> {
        match self.read_bytes()? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => {
                log::info!(
                    "No state file at {}, starting fresh",
                    self.path.display()
                );
                Ok(Snapshot::default())
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&bytes)?;
        log::debug!("State saved to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MerchItem, TourEntry};
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        Snapshot {
            merch_hash: Some("aa11".into()),
            tour_hash: None,
            merch_items: vec![MerchItem {
                title: "IDMTHY Tee".into(),
                price: "$30.00".into(),
                url: "https://quadeca.com/products/idmthy-tee".into(),
                sold_out: true,
            }],
            tour_dates: vec![TourEntry {
                date: "Mar 14".into(),
                location: "Los Angeles, CA".into(),
                venue: "The Fonda".into(),
            }],
        }
    }

    #[test]
    fn test_missing_file_is_first_run() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("state.json"));

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, Snapshot::default());
        assert!(loaded.is_first_run());
    }

    #[test]
    fn test_location_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let storage = LocalStorage::new(&path);
        assert_eq!(storage.location(), path.display().to_string());
    }

    #[test]
    fn test_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("state.json"));

        storage.save(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), sample());
        assert!(!tmp.path().join("state.tmp").exists());
    }

    #[test]
    fn test_save_overwrites_and_creates_dirs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested/dir/state.json"));

        storage.save(&sample()).unwrap();
        storage.save(&Snapshot::default()).unwrap();
        assert_eq!(storage.load().unwrap(), Snapshot::default());
    }

    #[test]
    fn test_reads_legacy_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(
            &path,
            r#"{
              "merch_hash": "abc",
              "tour_hash": null,
              "merch_items": [{"title": "IDMTHY Tee", "price": "$30.00", "url": ""}],
              "tour_dates": []
            }"#,
        )
        .unwrap();

        let loaded = LocalStorage::new(&path).load().unwrap();
        assert_eq!(loaded.merch_hash.as_deref(), Some("abc"));
        assert!(loaded.merch_items[0].sold_out);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            LocalStorage::new(&path).load(),
            Err(AppError::Json(_))
        ));
    }
}
