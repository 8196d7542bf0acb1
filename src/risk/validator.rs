use std::collections::BTreeMap;

use crate::models::{Dossier, RiskLevel};

use super::cross::cross_validate;
use super::detection::{check_document, detect_fraud, identify_anomalies};
use super::types::*;

const INDICATOR_FACTOR: f64 = 0.15;
const ANOMALY_FACTOR: f64 = 0.10;

/// `Σ 0.15·w(indicator) + Σ 0.10·w(anomaly)`, capped at 1 and rounded to
/// three decimals.
pub fn risk_score(indicators: &[FraudIndicator], anomalies: &[Anomaly]) -> f64 {
    let raw = indicators
        .iter()
        .map(|i| INDICATOR_FACTOR * i.weight())
        .sum::<f64>()
        + anomalies.len() as f64 * ANOMALY_FACTOR * Anomaly::WEIGHT;
    (raw.min(1.0) * 1000.0).round() / 1000.0
}

pub fn risk_level(score: f64) -> RiskLevel {
    if score >= 0.75 {
        RiskLevel::Critical
    } else if score >= 0.5 {
        RiskLevel::High
    } else if score >= 0.25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Weighted fraud/anomaly model over a whole dossier. Pure: the same dossier
/// and context always yield the same assessment.
#[derive(Debug, Clone, Default)]
pub struct RiskValidator;

impl RiskValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, dossier: &Dossier, context: &RiskContext) -> RiskAssessment {
        // Step 1: per-document required fields and recorded verdicts
        let document_results: BTreeMap<_, _> = dossier
            .present_types()
            .into_iter()
            .map(|t| (t, check_document(dossier, t)))
            .collect();
        let mut valid = document_results.values().all(|c| c.valid);

        // Step 2: cross-document checks
        let cross_validation = cross_validate(dossier);

        // Step 3: fraud indicators and anomalies
        let fraud_indicators = detect_fraud(dossier, context);
        let anomalies = identify_anomalies(dossier, context);

        // Step 4: score
        let score = risk_score(&fraud_indicators, &anomalies);
        let level = risk_level(score);

        let requires_manual_review = matches!(level, RiskLevel::Critical | RiskLevel::High);
        if level == RiskLevel::Critical {
            valid = false;
        }
        if !cross_validation.names_consistent() {
            valid = false;
        }

        let mut review_reasons = Vec::new();
        if requires_manual_review {
            for indicator in &fraud_indicators {
                if matches!(indicator.severity, RiskLevel::Critical | RiskLevel::High)
                    && !review_reasons.contains(&indicator.description)
                {
                    review_reasons.push(indicator.description.clone());
                }
            }
            if !cross_validation.names_consistent() {
                review_reasons.push("Name inconsistency detected across documents".to_string());
            }
        }

        tracing::info!(
            score,
            level = %level,
            indicators = fraud_indicators.len(),
            anomalies = anomalies.len(),
            valid,
            "Risk assessed"
        );

        RiskAssessment {
            valid,
            confidence: ((1.0 - score) * 1000.0).round() / 1000.0,
            fraud_indicators,
            anomalies,
            risk_score: score,
            risk_level: level,
            requires_manual_review,
            review_reasons,
            recommendations: vec![Recommendation::for_level(level)],
            document_results,
            cross_validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn passport(expiry: NaiveDate) -> CanonicalDocument {
        CanonicalDocument::Passport(PassportData {
            surname: Some("TESFAYE".into()),
            given_names: Some("ABEBE KEBEDE".into()),
            passport_number: Some("EP1234567".into()),
            nationality: Some("ETH".into()),
            expiry_date: Some(expiry),
            ..Default::default()
        })
    }

    #[test]
    fn score_levels() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(0.25), RiskLevel::Medium);
        assert_eq!(risk_level(0.5), RiskLevel::High);
        assert_eq!(risk_level(0.75), RiskLevel::Critical);

        let expired = FraudIndicator::new(FraudType::ExpiredPassport);
        let note = FraudIndicator::new(FraudType::MissingVerbalNote);
        assert_eq!(risk_score(&[expired.clone()], &[]), 0.45);
        assert_eq!(risk_score(&[expired.clone(), note.clone(), expired], &[]), 1.0);
        let anomaly = Anomaly::new(AnomalyType::LongStay, "x");
        assert_eq!(risk_score(&[], &[anomaly]), 0.05);
    }

    #[test]
    fn clean_dossier_is_low_risk() {
        let dossier = Dossier::new().with(passport(d(2030, 1, 1)));
        let result = RiskValidator::new().validate(&dossier, &RiskContext::new(d(2025, 5, 1)));
        assert!(result.valid);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.recommendations, vec![Recommendation::Approve]);
        assert!(!result.requires_manual_review);
    }

    #[test]
    fn expired_diplomat_without_note_is_critical() {
        let mut doc = passport(d(2025, 1, 10));
        if let CanonicalDocument::Passport(p) = &mut doc {
            p.passport_type = Some(PassportType::Diplomatique);
        }
        let dossier = Dossier::new().with(doc);
        let result = RiskValidator::new().validate(&dossier, &RiskContext::new(d(2025, 5, 1)));
        assert_eq!(result.risk_score, 0.9);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(!result.valid);
        assert!(result.requires_manual_review);
        assert_eq!(result.recommendations, vec![Recommendation::Reject]);
        assert_eq!(result.review_reasons.len(), 2);
        assert!(!result.summary().contains("0.15"));
    }

    #[test]
    fn name_inconsistency_invalidates_low_risk_dossier() {
        let dossier = Dossier::new()
            .with(passport(d(2030, 1, 1)))
            .with(CanonicalDocument::Hotel(HotelData {
                guest_name: Some("JOHN SMITH".into()),
                hotel_name: Some("Sofitel".into()),
                check_in: Some(d(2025, 6, 1)),
                ..Default::default()
            }));
        let result = RiskValidator::new().validate(&dossier, &RiskContext::new(d(2025, 5, 1)));
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(!result.valid);
        assert!(!result.cross_validation.names_consistent());
    }

    #[test]
    fn missing_fields_invalidate_without_raising_risk() {
        let dossier = Dossier::new().with(CanonicalDocument::Ticket(TicketData::default()));
        let result = RiskValidator::new().validate(&dossier, &RiskContext::new(d(2025, 5, 1)));
        assert!(!result.valid);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(
            result.document_results[&DocumentType::Ticket].missing_fields.len(),
            3
        );
    }

    #[test]
    fn assessment_survives_json_round_trip() {
        let dossier = Dossier::new().with(passport(d(2025, 9, 1)));
        let result = RiskValidator::new().validate(&dossier, &RiskContext::new(d(2025, 5, 1)));
        let json = serde_json::to_string(&result).unwrap();
        let back: RiskAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
