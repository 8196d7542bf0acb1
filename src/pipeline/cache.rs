//! On-disk cache of extraction results keyed by content hash.
//!
//! Flat directory of `<key>.json` files. Writes go through a temp file in the
//! same directory and an atomic rename, so concurrent writers of the same key
//! duplicate work but never leave a torn file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::types::ExtractionResult;
use crate::models::DocumentType;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist cache entry: {0}")]
    Persist(String),
}

pub struct ExtractionCache {
    dir: PathBuf,
}

impl ExtractionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `sha256(content ‖ type)`, URL-safe base64 without padding.
    pub fn cache_key(content: &[u8], document_type: DocumentType) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hasher.update(document_type.as_str().as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Cached result for `key`. An unreadable entry counts as a miss and is
    /// removed.
    pub fn get(&self, key: &str) -> Result<Option<ExtractionResult>, CacheError> {
        let path = self.entry_path(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt cache entry");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    pub fn put(&self, result: &ExtractionResult) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec(result)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(self.entry_path(&result.cache_key))
            .map_err(|e| CacheError::Persist(e.to_string()))?;

        tracing::debug!(key = %result.cache_key, bytes = json.len(), "Cached extraction result");
        Ok(())
    }

    /// Remove every cached entry. Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        tracing::info!(removed, dir = %self.dir.display(), "Extraction cache cleared");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
