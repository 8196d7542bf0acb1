pub mod config;
pub mod parsing;
pub mod reference;
pub mod models;
pub mod matching;
pub mod pipeline; // Extraction: OCR, per-type extractors, AI structuring, cache
pub mod sync; // Extracted vs expected field comparison
pub mod prefill; // Cascade prefill from collected documents
pub mod coherence; // Eleven dossier rules
pub mod risk; // Fraud indicators, anomalies, risk score
pub mod queue; // Deep-validation worker pool
pub mod geolocation; // Geolocation result cache

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. The filter comes from `RUST_LOG`, else
/// `config::default_log_filter()`. Safe to call more than once: later calls
/// leave the first subscriber in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} starting", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
