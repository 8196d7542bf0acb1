//! Weighted fraud and anomaly model over a dossier.
//!
//! Four stages:
//! 1. Per-document required fields and recorded verdicts
//! 2. Cross-document consistency (names, dates, nationality, passport number)
//! 3. Fraud indicators and anomalies
//! 4. Score, level and recommendation
//!
//! The model recommends; a CRITICAL or HIGH level always routes the dossier
//! to an officer.

mod cross;
mod detection;
mod names;
mod types;
mod validator;

pub use cross::{collect_names, cross_validate};
pub use detection::{expected_fee, required_fields};
pub use names::consistency_similarity;
pub use types::*;
pub use validator::{risk_level, risk_score, RiskValidator};
