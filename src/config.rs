use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dossiera";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DOSSIERA_DATA_DIR";

/// Host country of the consular post (display name).
pub const DESTINATION_COUNTRY: &str = "Côte d'Ivoire";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "dossiera_lib=info,warn"
}

/// Get the application data directory.
/// `$DOSSIERA_DATA_DIR` if set, else `<platform data dir>/Dossiera`.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Flat directory of cached extraction results.
pub fn extraction_cache_dir() -> PathBuf {
    app_data_dir().join("cache").join("extraction")
}

/// Directory of cached geolocation lookups.
pub fn geo_cache_dir() -> PathBuf {
    app_data_dir().join("cache").join("geo")
}

// ═══════════════════════════════════════════════════════════
// Thresholds
// ═══════════════════════════════════════════════════════════

/// Tunable thresholds shared by the matching and validation layers.
pub mod thresholds {
    /// CrossDocumentSync: minimum overall score (percent) and fuzzy-match cut.
    pub const SYNC_MATCH: u32 = 85;
    /// Coherence rule: passport-anchored name similarity below this warns.
    pub const NAME_COHERENCE: f64 = 0.70;
    /// Risk cross-validation: pairwise name similarity floor.
    pub const RISK_NAME_CONSISTENCY: f64 = 0.80;
    /// Numeric comparison match floor (percent).
    pub const NUMBER_MATCH: u32 = 95;
    /// Maximum authorized stay, in days.
    pub const MAX_STAY_DAYS: i64 = 90;
    /// Passport must outlive the stay by this many months.
    pub const PASSPORT_VALIDITY_MONTHS: u32 = 6;
    /// Minimum recommended notice before travel, in days.
    pub const MIN_NOTICE_DAYS: i64 = 5;
    /// Yellow-fever certificates older than this many years warn.
    pub const VACCINATION_MAX_AGE_YEARS: i32 = 10;
    /// Age of majority.
    pub const ADULT_AGE: u32 = 18;
    /// Date deltas up to this many days are tolerated by coherence checks.
    pub const DATE_DELTA_DAYS: i64 = 1;
    /// Risk cross-validation: hotel check-in vs ticket arrival.
    pub const CHECKIN_TOLERANCE_DAYS: i64 = 2;
    /// Relative payment tolerance against the expected fee.
    pub const PAYMENT_TOLERANCE: f64 = 0.05;
    /// Risk anomaly: travel sooner than this many days.
    pub const URGENT_TRAVEL_DAYS: i64 = 7;
}

// ═══════════════════════════════════════════════════════════
// Fees
// ═══════════════════════════════════════════════════════════

/// Visa fees in XOF.
pub mod fees {
    pub const TOURIST: i64 = 50_000;
    pub const BUSINESS: i64 = 100_000;
    pub const TRANSIT: i64 = 25_000;
    pub const EXPRESS_SUPPLEMENT: i64 = 75_000;
    pub const CURRENCY: &str = "XOF";

    /// Fee for a visa type. Diplomatic, service and courtesy visas are free.
    /// Unknown types are charged as tourist visas.
    pub fn visa_fee(visa_type: &str) -> i64 {
        match visa_type.trim().to_lowercase().as_str() {
            "business" | "affaires" => BUSINESS,
            "transit" => TRANSIT,
            "diplomatic" | "diplomatique" | "service" | "courtesy" | "courtoisie" => 0,
            _ => TOURIST,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// EngineConfig
// ═══════════════════════════════════════════════════════════

/// Runtime configuration for the extraction pipeline and validation queue.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cache_dir: PathBuf,
    pub geo_cache_dir: PathBuf,
    pub structuring_model: String,
    pub ollama_url: String,
    pub structuring_timeout_secs: u64,
    pub queue_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: extraction_cache_dir(),
            geo_cache_dir: geo_cache_dir(),
            structuring_model: "llama3.1:8b".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            structuring_timeout_secs: 30,
            queue_workers: 2,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `DOSSIERA_*` environment variables.
    /// Unparseable numeric overrides are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("DOSSIERA_MODEL") {
            config.structuring_model = model;
        }
        if let Ok(url) = std::env::var("DOSSIERA_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Some(secs) = env_parse::<u64>("DOSSIERA_STRUCTURING_TIMEOUT") {
            config.structuring_timeout_secs = secs;
        }
        if let Some(workers) = env_parse::<usize>("DOSSIERA_QUEUE_WORKERS") {
            config.queue_workers = workers.max(1);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dirs_under_app_data() {
        let app = app_data_dir();
        assert!(extraction_cache_dir().starts_with(&app));
        assert!(geo_cache_dir().starts_with(&app));
        assert!(extraction_cache_dir().ends_with("extraction"));
    }

    #[test]
    fn app_name_is_dossiera() {
        assert_eq!(APP_NAME, "Dossiera");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn fees_per_visa_type() {
        assert_eq!(fees::visa_fee("tourist"), 50_000);
        assert_eq!(fees::visa_fee("Business"), 100_000);
        assert_eq!(fees::visa_fee("transit"), 25_000);
        assert_eq!(fees::visa_fee("diplomatic"), 0);
        assert_eq!(fees::visa_fee("unknown"), fees::TOURIST);
    }

    #[test]
    fn default_engine_config_has_workers() {
        let config = EngineConfig::default();
        assert!(config.queue_workers >= 1);
        assert!(config.cache_dir.ends_with("extraction"));
    }
}
