//! File-backed result cache.
//!
//! One pretty-printed JSON file per drug, named by the blake3 hash of the
//! drug id so arbitrary ids map to safe file names. Writes go through a
//! temporary file in the same directory and are renamed into place, so a
//! crashed run never leaves a half-written entry behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use trialmoa_classify::{CacheEntry, CacheError, CacheLookup, ResultCache};

const ENTRY_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened result cache");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, drug_id: &str) -> PathBuf {
        let key = blake3::hash(drug_id.as_bytes()).to_hex();
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Number of entry files currently on disk.
    pub fn len(&self) -> Result<usize, CacheError> {
        let mut n = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == ENTRY_EXT) {
                n += 1;
            }
        }
        Ok(n)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl ResultCache for FileCache {
    fn get(&self, drug_id: &str, fingerprint: &str) -> Result<CacheLookup, CacheError> {
        let path = self.entry_path(drug_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheLookup::Miss),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "corrupt cache entry, recomputing");
                return Ok(CacheLookup::Stale);
            }
        };
        if entry.drug_id != drug_id {
            tracing::warn!(
                path = %path.display(),
                expected = drug_id,
                found = %entry.drug_id,
                "cache entry belongs to another drug, recomputing"
            );
            return Ok(CacheLookup::Stale);
        }
        if entry.fingerprint != fingerprint {
            tracing::debug!(drug_id, "cache entry fingerprint changed");
            return Ok(CacheLookup::Stale);
        }
        Ok(CacheLookup::Hit(entry.outcome))
    }

    fn put(&mut self, entry: CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(&entry.drug_id);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, &entry)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}
