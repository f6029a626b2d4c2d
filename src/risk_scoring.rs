//! Supplier and organization risk scoring
//!
//! Two per-supplier scoring strategies coexist: the weighted model used for
//! incident analysis and the simplified bonus model used by the orchestration
//! layer. Both are kept as named strategies so callers opt in explicitly.

use crate::supplier_matcher::MatchResult;
use crate::{
    round2, CriticalityLevel, ParsedIncident, Result, RiskEngineError, SupplierId, SupplierTier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Daily revenue exposed per affected supplier (USD)
pub const DAILY_REVENUE_PER_SUPPLIER: f64 = 10_000.0;

/// Expedited shipping cost per affected supplier (USD)
pub const EXPEDITED_SHIPPING_PER_SUPPLIER: f64 = 5_000.0;

/// Alternative sourcing cost per affected supplier (USD)
pub const ALTERNATIVE_SOURCING_PER_SUPPLIER: f64 = 10_000.0;

/// Baseline recovery time before critical suppliers are accounted for
pub const BASE_RESOLUTION_DAYS: u32 = 7;

/// Extra recovery days per critical supplier
pub const DAYS_PER_CRITICAL_SUPPLIER: u32 = 3;

/// Per-supplier impact formula
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScoringStrategy {
    /// severity 0-50 + criticality weight x30 + tier multiplier x15 + proximity x5
    #[default]
    Weighted,
    /// severity 0-50 + criticality bonus 10-40 + tier bonus 5-15 + proximity x10
    Simplified,
}

impl ScoringStrategy {
    /// Raw impact score in [0, 100] for validated inputs
    pub fn supplier_impact(
        &self,
        severity_level: u8,
        criticality: CriticalityLevel,
        tier: SupplierTier,
        proximity_score: f64,
    ) -> f64 {
        let severity_contribution = (f64::from(severity_level) / 5.0) * 50.0;
        let proximity = proximity_score.clamp(0.0, 1.0);

        let score = match self {
            ScoringStrategy::Weighted => {
                severity_contribution
                    + criticality_weight(criticality) * 30.0
                    + tier_multiplier(tier) * 15.0
                    + proximity * 5.0
            }
            ScoringStrategy::Simplified => {
                severity_contribution
                    + criticality_bonus(criticality)
                    + tier_bonus(tier)
                    + proximity * 10.0
            }
        };

        score.clamp(0.0, 100.0)
    }
}

fn criticality_weight(criticality: CriticalityLevel) -> f64 {
    match criticality {
        CriticalityLevel::Low => 0.25,
        CriticalityLevel::Medium => 0.50,
        CriticalityLevel::High => 0.75,
        CriticalityLevel::Critical => 1.0,
    }
}

fn tier_multiplier(tier: SupplierTier) -> f64 {
    match tier {
        SupplierTier::Tier1 => 1.0,
        SupplierTier::Tier2 => 0.7,
        SupplierTier::Tier3 => 0.4,
    }
}

fn criticality_bonus(criticality: CriticalityLevel) -> f64 {
    match criticality {
        CriticalityLevel::Low => 10.0,
        CriticalityLevel::Medium => 20.0,
        CriticalityLevel::High => 30.0,
        CriticalityLevel::Critical => 40.0,
    }
}

fn tier_bonus(tier: SupplierTier) -> f64 {
    match tier {
        SupplierTier::Tier1 => 15.0,
        SupplierTier::Tier2 => 10.0,
        SupplierTier::Tier3 => 5.0,
    }
}

/// Cost model for the financial estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum FinancialModel {
    /// Flat $15k mitigation per supplier; High and Critical suppliers extend recovery
    #[default]
    Flat,
    /// Itemized shipping + sourcing costs; only Critical suppliers extend recovery.
    /// Daily revenue at risk is 10% of the average order value per supplier.
    Itemized { avg_order_value: f64 },
}

impl FinancialModel {
    /// Itemized model with the standard $100k average order value
    pub fn itemized() -> Self {
        FinancialModel::Itemized {
            avg_order_value: 100_000.0,
        }
    }

    fn counts_as_critical(&self, criticality: CriticalityLevel) -> bool {
        match self {
            FinancialModel::Flat => criticality.is_high(),
            FinancialModel::Itemized { .. } => criticality == CriticalityLevel::Critical,
        }
    }
}

/// Risk band of an organization-level score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a 0-100 score; lower bounds are inclusive
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else if score >= 20.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Minimal => write!(f, "MINIMAL"),
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Impact of an incident on one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierImpact {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub criticality: CriticalityLevel,
    pub tier: SupplierTier,
    pub proximity_score: f64,
    pub impact_score: f64,
}

/// Deterministic cost estimate of a disruption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialImpact {
    pub daily_revenue_at_risk: f64,
    pub estimated_resolution_days: u32,
    pub total_estimated_loss: f64,
    pub expedited_shipping_cost: f64,
    pub alternative_sourcing_cost: f64,
    pub total_mitigation_cost: f64,
    pub net_impact: f64,
}

/// Headline numbers for dashboards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyMetrics {
    pub total_affected: usize,
    pub critical_affected: usize,
    pub average_impact_score: f64,
    pub tier_1_affected: usize,
    pub cascading_count: usize,
}

/// Organization-wide result of one incident analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRiskAssessment {
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    /// Affected suppliers rated High or Critical, whatever the financial
    /// model. `FinancialModel::Itemized` counts only Critical suppliers
    /// toward `estimated_resolution_days`, so the two can differ.
    pub critical_supplier_count: usize,
    /// Sorted by impact, highest first
    pub affected_suppliers: Vec<SupplierImpact>,
    pub cascading_supplier_ids: Vec<SupplierId>,
    pub financial_impact: FinancialImpact,
    pub key_metrics: KeyMetrics,
    pub strategy: ScoringStrategy,
    pub assessed_at: DateTime<Utc>,
}

impl OrganizationRiskAssessment {
    /// High or Critical risk warrants executive escalation
    pub fn requires_escalation(&self) -> bool {
        self.risk_level >= RiskLevel::High
    }

    /// Export as JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Risk scorer configuration and entry points
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    strategy: ScoringStrategy,
    financial_model: FinancialModel,
}

impl RiskScorer {
    /// Create a scorer with the weighted strategy and flat cost model
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: ScoringStrategy, financial_model: FinancialModel) -> Self {
        Self {
            strategy,
            financial_model,
        }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Impact score for one supplier, rejecting out-of-range severities
    pub fn impact_score(
        &self,
        severity_level: u8,
        criticality: CriticalityLevel,
        tier: SupplierTier,
        proximity_score: f64,
    ) -> Result<f64> {
        validate_severity(severity_level)?;
        if !proximity_score.is_finite() {
            return Err(RiskEngineError::MalformedInput(
                "proximity score is not a number".to_string(),
            ));
        }
        Ok(self
            .strategy
            .supplier_impact(severity_level, criticality, tier, proximity_score))
    }

    /// Mean impact scaled by breadth of disruption, clamped to [0, 100]
    pub fn organization_score(&self, impact_scores: &[f64], total_supplier_count: usize) -> f64 {
        if impact_scores.is_empty() || total_supplier_count == 0 {
            return 0.0;
        }

        let average = impact_scores.iter().sum::<f64>() / impact_scores.len() as f64;
        let affected_fraction = (impact_scores.len() as f64 / total_supplier_count as f64).min(1.0);

        (average * (0.7 + 0.3 * affected_fraction)).clamp(0.0, 100.0)
    }

    /// Cost estimate for a set of affected suppliers
    pub fn financial_impact(&self, affected: &[SupplierImpact]) -> FinancialImpact {
        let count = affected.len() as f64;
        let critical_count = affected
            .iter()
            .filter(|s| self.financial_model.counts_as_critical(s.criticality))
            .count() as u32;

        let daily_revenue_at_risk = match self.financial_model {
            FinancialModel::Flat => count * DAILY_REVENUE_PER_SUPPLIER,
            FinancialModel::Itemized { avg_order_value } => count * avg_order_value * 0.1,
        };
        let estimated_resolution_days =
            BASE_RESOLUTION_DAYS + critical_count * DAYS_PER_CRITICAL_SUPPLIER;
        let total_estimated_loss = daily_revenue_at_risk * f64::from(estimated_resolution_days);

        let expedited_shipping_cost = count * EXPEDITED_SHIPPING_PER_SUPPLIER;
        let alternative_sourcing_cost = count * ALTERNATIVE_SOURCING_PER_SUPPLIER;
        let total_mitigation_cost = match self.financial_model {
            FinancialModel::Flat => count * 15_000.0,
            FinancialModel::Itemized { .. } => expedited_shipping_cost + alternative_sourcing_cost,
        };

        FinancialImpact {
            daily_revenue_at_risk: round2(daily_revenue_at_risk),
            estimated_resolution_days,
            total_estimated_loss: round2(total_estimated_loss),
            expedited_shipping_cost: round2(expedited_shipping_cost),
            alternative_sourcing_cost: round2(alternative_sourcing_cost),
            total_mitigation_cost: round2(total_mitigation_cost),
            net_impact: round2(total_estimated_loss - total_mitigation_cost),
        }
    }

    /// Score every matched supplier and roll the result up to the organization
    pub fn assess_risk(
        &self,
        incident: &ParsedIncident,
        matched: &[MatchResult],
        total_supplier_count: usize,
        cascading: &BTreeSet<SupplierId>,
    ) -> Result<OrganizationRiskAssessment> {
        validate_severity(incident.severity_level)?;

        let mut affected_suppliers = Vec::with_capacity(matched.len());
        for m in matched.iter().filter(|m| m.is_affected) {
            let impact_score =
                self.impact_score(incident.severity_level, m.criticality, m.tier, m.proximity_score)?;
            affected_suppliers.push(SupplierImpact {
                supplier_id: m.supplier_id,
                supplier_name: m.supplier_name.clone(),
                criticality: m.criticality,
                tier: m.tier,
                proximity_score: m.proximity_score,
                impact_score: round2(impact_score),
            });
        }

        affected_suppliers.sort_by(|a, b| {
            b.impact_score
                .partial_cmp(&a.impact_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.supplier_id.cmp(&b.supplier_id))
        });

        let impact_scores: Vec<f64> = affected_suppliers.iter().map(|s| s.impact_score).collect();
        let overall_risk_score = round2(self.organization_score(&impact_scores, total_supplier_count));

        let critical_supplier_count = affected_suppliers
            .iter()
            .filter(|s| s.criticality.is_high())
            .count();

        let average_impact_score = if impact_scores.is_empty() {
            0.0
        } else {
            round2(impact_scores.iter().sum::<f64>() / impact_scores.len() as f64)
        };

        let key_metrics = KeyMetrics {
            total_affected: affected_suppliers.len(),
            critical_affected: critical_supplier_count,
            average_impact_score,
            tier_1_affected: affected_suppliers
                .iter()
                .filter(|s| s.tier == SupplierTier::Tier1)
                .count(),
            cascading_count: cascading.len(),
        };

        Ok(OrganizationRiskAssessment {
            overall_risk_score,
            risk_level: RiskLevel::from_score(overall_risk_score),
            critical_supplier_count,
            financial_impact: self.financial_impact(&affected_suppliers),
            affected_suppliers,
            cascading_supplier_ids: cascading.iter().copied().collect(),
            key_metrics,
            strategy: self.strategy,
            assessed_at: Utc::now(),
        })
    }
}

/// Assess with the default weighted strategy and flat cost model
pub fn assess_risk(
    incident: &ParsedIncident,
    matched: &[MatchResult],
    total_supplier_count: usize,
    cascading: &BTreeSet<SupplierId>,
) -> Result<OrganizationRiskAssessment> {
    RiskScorer::new().assess_risk(incident, matched, total_supplier_count, cascading)
}

fn validate_severity(severity_level: u8) -> Result<()> {
    if (1..=5).contains(&severity_level) {
        Ok(())
    } else {
        Err(RiskEngineError::InvalidSeverity(format!(
            "severity level must be between 1 and 5, got {}",
            severity_level
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplier_matcher::MatchReason;
    use crate::{IncidentType, SupplierCategory};

    fn matched(id: SupplierId, criticality: CriticalityLevel, tier: SupplierTier, proximity: f64) -> MatchResult {
        MatchResult {
            supplier_id: id,
            supplier_name: format!("Supplier {}", id),
            category: SupplierCategory::Components,
            criticality,
            tier,
            is_affected: true,
            proximity_score: proximity,
            reason: MatchReason::AffectedCountry {
                country: "Taiwan".to_string(),
            },
            distance_km: None,
        }
    }

    fn incident(severity: u8) -> ParsedIncident {
        ParsedIncident::new(IncidentType::NaturalDisaster, severity)
    }

    #[test]
    fn test_weighted_maximum() {
        let score = ScoringStrategy::Weighted.supplier_impact(
            5,
            CriticalityLevel::Critical,
            SupplierTier::Tier1,
            1.0,
        );
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_weighted_breakdown() {
        // 30 + 0.5*30 + 0.7*15 + 0.8*5 = 30 + 15 + 10.5 + 4 = 59.5
        let score = ScoringStrategy::Weighted.supplier_impact(
            3,
            CriticalityLevel::Medium,
            SupplierTier::Tier2,
            0.8,
        );
        assert!((score - 59.5).abs() < 1e-9);
    }

    #[test]
    fn test_simplified_clamps() {
        // 50 + 40 + 15 + 10 = 115 -> 100
        let score = ScoringStrategy::Simplified.supplier_impact(
            5,
            CriticalityLevel::Critical,
            SupplierTier::Tier1,
            1.0,
        );
        assert_eq!(score, 100.0);

        // 10 + 10 + 5 + 5 = 30
        let low = ScoringStrategy::Simplified.supplier_impact(
            1,
            CriticalityLevel::Low,
            SupplierTier::Tier3,
            0.5,
        );
        assert!((low - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_severity() {
        for strategy in [ScoringStrategy::Weighted, ScoringStrategy::Simplified] {
            let scorer = RiskScorer::with_strategy(strategy, FinancialModel::Flat);
            let mut previous = 0.0;
            for severity in 1..=5 {
                let score = scorer
                    .impact_score(severity, CriticalityLevel::High, SupplierTier::Tier2, 0.6)
                    .unwrap();
                assert!(score >= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_invalid_severity_rejected() {
        let scorer = RiskScorer::new();
        assert!(matches!(
            scorer.impact_score(0, CriticalityLevel::Low, SupplierTier::Tier1, 0.5),
            Err(RiskEngineError::InvalidSeverity(_))
        ));
        assert!(assess_risk(&incident(7), &[], 10, &BTreeSet::new()).is_err());
    }

    #[test]
    fn test_proximity_is_clamped() {
        let scorer = RiskScorer::new();
        let over = scorer
            .impact_score(3, CriticalityLevel::Low, SupplierTier::Tier1, 4.0)
            .unwrap();
        let at_one = scorer
            .impact_score(3, CriticalityLevel::Low, SupplierTier::Tier1, 1.0)
            .unwrap();
        assert_eq!(over, at_one);
    }

    #[test]
    fn test_zero_affected() {
        let assessment = assess_risk(&incident(5), &[], 25, &BTreeSet::new()).unwrap();
        assert_eq!(assessment.overall_risk_score, 0.0);
        assert_eq!(assessment.risk_level, RiskLevel::Minimal);
        assert_eq!(assessment.critical_supplier_count, 0);
        assert_eq!(assessment.financial_impact.total_estimated_loss, 0.0);
        assert_eq!(assessment.financial_impact.estimated_resolution_days, 7);
    }

    #[test]
    fn test_zero_total_suppliers() {
        let scorer = RiskScorer::new();
        assert_eq!(scorer.organization_score(&[80.0, 90.0], 0), 0.0);
    }

    #[test]
    fn test_organization_score_breadth() {
        let scorer = RiskScorer::new();
        // mean 80, half affected => 80 * (0.7 + 0.15) = 68
        let score = scorer.organization_score(&[70.0, 90.0], 4);
        assert!((score - 68.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_inputs_never_exceed_100() {
        let matches: Vec<MatchResult> = (1..=50)
            .map(|id| matched(id, CriticalityLevel::Critical, SupplierTier::Tier1, 1.0))
            .collect();
        let scorer = RiskScorer::with_strategy(ScoringStrategy::Simplified, FinancialModel::Flat);
        let assessment = scorer
            .assess_risk(&incident(5), &matches, 50, &BTreeSet::new())
            .unwrap();

        assert_eq!(assessment.overall_risk_score, 100.0);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert!(assessment
            .affected_suppliers
            .iter()
            .all(|s| s.impact_score <= 100.0));
    }

    #[test]
    fn test_hsinchu_impact_score() {
        let matches = vec![matched(1, CriticalityLevel::Critical, SupplierTier::Tier1, 1.0)];
        let assessment = assess_risk(&incident(5), &matches, 1, &BTreeSet::new()).unwrap();
        assert!(assessment.affected_suppliers[0].impact_score >= 90.0);
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(79.99), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(20.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(19.99), RiskLevel::Minimal);
    }

    #[test]
    fn test_flat_financial_impact() {
        let matches = vec![
            matched(1, CriticalityLevel::Critical, SupplierTier::Tier1, 1.0),
            matched(2, CriticalityLevel::High, SupplierTier::Tier2, 0.8),
            matched(3, CriticalityLevel::Low, SupplierTier::Tier3, 0.5),
        ];
        let assessment = assess_risk(&incident(4), &matches, 10, &BTreeSet::new()).unwrap();
        let financial = &assessment.financial_impact;

        // High + Critical count => 7 + 2*3 = 13 days
        assert_eq!(financial.daily_revenue_at_risk, 30_000.0);
        assert_eq!(financial.estimated_resolution_days, 13);
        assert_eq!(financial.total_estimated_loss, 390_000.0);
        assert_eq!(financial.total_mitigation_cost, 45_000.0);
        assert_eq!(financial.net_impact, 345_000.0);
        assert_eq!(assessment.critical_supplier_count, 2);
    }

    #[test]
    fn test_itemized_financial_impact() {
        let matches = vec![
            matched(1, CriticalityLevel::Critical, SupplierTier::Tier1, 1.0),
            matched(2, CriticalityLevel::High, SupplierTier::Tier2, 0.8),
        ];
        let scorer = RiskScorer::with_strategy(ScoringStrategy::Weighted, FinancialModel::itemized());
        let assessment = scorer
            .assess_risk(&incident(4), &matches, 10, &BTreeSet::new())
            .unwrap();
        let financial = &assessment.financial_impact;

        // Only Critical counts => 7 + 3 = 10 days
        assert_eq!(financial.estimated_resolution_days, 10);
        assert_eq!(financial.daily_revenue_at_risk, 20_000.0);
        assert_eq!(financial.expedited_shipping_cost, 10_000.0);
        assert_eq!(financial.alternative_sourcing_cost, 20_000.0);
        assert_eq!(financial.total_mitigation_cost, 30_000.0);
        assert_eq!(financial.net_impact, 170_000.0);
        // The reported count stays High + Critical under either model
        assert_eq!(assessment.critical_supplier_count, 2);
        assert_eq!(assessment.key_metrics.critical_affected, 2);
    }

    #[test]
    fn test_affected_sorted_by_impact() {
        let matches = vec![
            matched(1, CriticalityLevel::Low, SupplierTier::Tier3, 0.5),
            matched(2, CriticalityLevel::Critical, SupplierTier::Tier1, 1.0),
            matched(3, CriticalityLevel::Medium, SupplierTier::Tier2, 0.8),
        ];
        let cascading = BTreeSet::from([10, 11]);
        let assessment = assess_risk(&incident(3), &matches, 20, &cascading).unwrap();

        let ids: Vec<SupplierId> = assessment
            .affected_suppliers
            .iter()
            .map(|s| s.supplier_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(assessment.cascading_supplier_ids, vec![10, 11]);
        assert_eq!(assessment.key_metrics.cascading_count, 2);
        assert_eq!(assessment.key_metrics.tier_1_affected, 1);
    }

    #[test]
    fn test_assessment_json() {
        let matches = vec![matched(1, CriticalityLevel::High, SupplierTier::Tier1, 0.9)];
        let assessment = assess_risk(&incident(4), &matches, 3, &BTreeSet::new()).unwrap();
        let json = assessment.to_json().unwrap();
        assert!(json.contains("overall_risk_score"));
        assert!(json.contains("financial_impact"));
    }
}
