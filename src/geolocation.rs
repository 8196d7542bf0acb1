//! File cache for IP geolocation lookups.
//!
//! Detection itself lives outside the crate; this only remembers answers.
//! One `<sha256(ip)>.json` file per address holding `{expires_at, data}`.
//! Entries live for an hour and are deleted when read after expiry.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::reference;

/// Default time to live of a cached lookup, in seconds.
pub const GEO_CACHE_TTL_SECS: i64 = 3600;

#[derive(Error, Debug)]
pub enum GeoCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist geolocation entry: {0}")]
    Persist(String),
}

/// Where an address was located.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub ip: String,
    /// ISO alpha-3 when the country is known.
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub in_jurisdiction: bool,
}

impl GeoLocation {
    /// Build from a provider answer; `country` may be alpha-2, alpha-3 or a
    /// country name.
    pub fn new(ip: impl Into<String>, country: Option<&str>) -> Self {
        let country_code = country.and_then(reference::country_code);
        let in_jurisdiction = country_code
            .as_deref()
            .is_some_and(reference::is_in_jurisdiction);
        Self {
            ip: ip.into(),
            country_code,
            country_name: None,
            city: None,
            in_jurisdiction,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix seconds.
    expires_at: i64,
    data: GeoLocation,
}

pub struct GeoCache {
    dir: PathBuf,
    ttl: Duration,
}

impl GeoCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::seconds(GEO_CACHE_TTL_SECS),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.geo_cache_dir.clone())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lowercase hex sha256 of the address.
    pub fn key(ip: &str) -> String {
        format!("{:x}", Sha256::digest(ip.trim().as_bytes()))
    }

    fn entry_path(&self, ip: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(ip)))
    }

    pub fn get(&self, ip: &str) -> Result<Option<GeoLocation>, GeoCacheError> {
        self.get_at(ip, Utc::now())
    }

    /// Cached location valid at `now`. Expired or unreadable entries are
    /// removed and count as a miss.
    pub fn get_at(&self, ip: &str, now: DateTime<Utc>) -> Result<Option<GeoLocation>, GeoCacheError> {
        let path = self.entry_path(ip);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt geolocation entry");
                let _ = std::fs::remove_file(&path);
                return Ok(None);
            }
        };

        if now.timestamp() > entry.expires_at {
            tracing::debug!(expires_at = entry.expires_at, "Geolocation entry expired");
            std::fs::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    pub fn put(&self, location: &GeoLocation) -> Result<(), GeoCacheError> {
        self.put_at(location, Utc::now())
    }

    pub fn put_at(&self, location: &GeoLocation, now: DateTime<Utc>) -> Result<(), GeoCacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry {
            expires_at: (now + self.ttl).timestamp(),
            data: location.clone(),
        };
        let json = serde_json::to_vec(&entry)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(self.entry_path(&location.ip))
            .map_err(|e| GeoCacheError::Persist(e.to_string()))?;

        tracing::debug!(country = ?location.country_code, "Cached geolocation");
        Ok(())
    }

    /// Delete every entry expired at `now`. Returns the number removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, GeoCacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let expired = std::fs::read(&path)
                .ok()
                .and_then(|raw| serde_json::from_slice::<CacheEntry>(&raw).ok())
                .map_or(true, |e| now.timestamp() > e.expires_at);
            if expired {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(ip: &str, country: &str) -> GeoLocation {
        GeoLocation::new(ip, Some(country))
    }

    #[test]
    fn key_is_hex_sha256() {
        let key = GeoCache::key("196.188.0.1");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, GeoCache::key(" 196.188.0.1 "));
        assert_ne!(key, GeoCache::key("196.188.0.2"));
    }

    #[test]
    fn jurisdiction_from_country() {
        assert!(location("1.1.1.1", "ET").in_jurisdiction);
        assert_eq!(location("1.1.1.1", "ET").country_code.as_deref(), Some("ETH"));
        assert!(!location("1.1.1.1", "US").in_jurisdiction);
        assert!(!GeoLocation::new("1.1.1.1", None).in_jurisdiction);
    }

    #[test]
    fn fresh_entry_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GeoCache::new(dir.path());
        let now = Utc::now();
        let loc = location("196.188.0.1", "ETH");
        cache.put_at(&loc, now).unwrap();
        assert_eq!(cache.get_at("196.188.0.1", now + Duration::minutes(59)).unwrap(), Some(loc));
        assert_eq!(cache.get_at("10.0.0.1", now).unwrap(), None);
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GeoCache::new(dir.path());
        let now = Utc::now();
        cache.put_at(&location("196.188.0.1", "ETH"), now).unwrap();

        let later = now + Duration::minutes(61);
        assert_eq!(cache.get_at("196.188.0.1", later).unwrap(), None);
        let path = dir.path().join(format!("{}.json", GeoCache::key("196.188.0.1")));
        assert!(!path.exists());
    }

    #[test]
    fn purge_removes_only_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GeoCache::new(dir.path());
        let now = Utc::now();
        cache.put_at(&location("1.1.1.1", "KEN"), now - Duration::hours(2)).unwrap();
        cache.put_at(&location("2.2.2.2", "UGA"), now).unwrap();
        std::fs::write(dir.path().join("garbage.json"), b"{").unwrap();

        assert_eq!(cache.purge_expired(now).unwrap(), 2);
        assert!(cache.get_at("2.2.2.2", now).unwrap().is_some());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GeoCache::new(dir.path().join("absent"));
        assert_eq!(cache.get("1.1.1.1").unwrap(), None);
        assert_eq!(cache.purge_expired(Utc::now()).unwrap(), 0);
    }
}
