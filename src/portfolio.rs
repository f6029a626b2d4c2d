//! Forward-looking portfolio risk
//!
//! Looks at an organization's whole supplier base rather than one incident and
//! flags structural weaknesses: concentration, dependency on critical
//! suppliers, unreliable or saturated suppliers and long lead times.

use crate::{round2, CriticalityLevel, Supplier, SupplierTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Predicted score when no risk factor is present
pub const BASELINE_RISK_SCORE: f64 = 20.0;

const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskFactorKind {
    GeographicConcentration,
    CriticalSupplierDependency,
    Tier1Concentration,
    SupplierReliability,
    CapacityConstraints,
    ExtendedLeadTimes,
}

impl std::fmt::Display for RiskFactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskFactorKind::GeographicConcentration => write!(f, "Geographic Concentration"),
            RiskFactorKind::CriticalSupplierDependency => write!(f, "Critical Supplier Dependency"),
            RiskFactorKind::Tier1Concentration => write!(f, "Tier 1 Concentration"),
            RiskFactorKind::SupplierReliability => write!(f, "Supplier Reliability"),
            RiskFactorKind::CapacityConstraints => write!(f, "Capacity Constraints"),
            RiskFactorKind::ExtendedLeadTimes => write!(f, "Extended Lead Times"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum FactorSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    Medium,
    High,
}

/// A structural weakness of the supplier portfolio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub severity: FactorSeverity,
    pub description: String,
    pub likelihood: f64,
    pub potential_impact: f64,
}

impl RiskFactor {
    fn new(
        kind: RiskFactorKind,
        severity: FactorSeverity,
        description: String,
        likelihood: f64,
        potential_impact: f64,
    ) -> Self {
        Self {
            kind,
            severity,
            description,
            likelihood,
            potential_impact,
        }
    }

    /// likelihood x impact
    pub fn weighted_risk(&self) -> f64 {
        self.likelihood * self.potential_impact
    }
}

/// Proactive step addressing one factor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProactiveRecommendation {
    pub risk_addressed: String,
    pub recommendation: String,
    pub priority: Priority,
    pub estimated_timeline: String,
    pub expected_benefit: String,
}

impl ProactiveRecommendation {
    fn new(risk_addressed: &str, recommendation: &str, priority: Priority, timeline: &str, benefit: &str) -> Self {
        Self {
            risk_addressed: risk_addressed.to_string(),
            recommendation: recommendation.to_string(),
            priority,
            estimated_timeline: timeline.to_string(),
            expected_benefit: benefit.to_string(),
        }
    }
}

/// Portfolio-level outlook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutlook {
    pub supplier_count: usize,
    pub risk_factors: Vec<RiskFactor>,
    pub predicted_risk_score: f64,
    pub confidence_level: f64,
    pub recommendations: Vec<ProactiveRecommendation>,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioOutlook {
    /// Export as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Deterministic portfolio analysis
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalyzer;

impl PortfolioAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the whole supplier base of one organization
    pub fn analyze(&self, suppliers: &[Supplier]) -> PortfolioOutlook {
        let risk_factors = self.risk_factors(suppliers);
        PortfolioOutlook {
            supplier_count: suppliers.len(),
            predicted_risk_score: round2(predicted_risk_score(&risk_factors)),
            confidence_level: round2(confidence_level(suppliers)),
            recommendations: recommendations(&risk_factors),
            risk_factors,
            generated_at: Utc::now(),
        }
    }

    pub fn risk_factors(&self, suppliers: &[Supplier]) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        if suppliers.is_empty() {
            return factors;
        }
        let total = suppliers.len() as f64;

        if let Some((country, count)) = top_country(suppliers) {
            let share = count as f64 / total * 100.0;
            if share > 50.0 {
                let severity = if share > 70.0 {
                    FactorSeverity::High
                } else {
                    FactorSeverity::Medium
                };
                factors.push(RiskFactor::new(
                    RiskFactorKind::GeographicConcentration,
                    severity,
                    format!("{:.0}% of suppliers concentrated in {}", share, country),
                    0.6,
                    75.0,
                ));
            }
        }

        let critical = suppliers
            .iter()
            .filter(|s| s.criticality == CriticalityLevel::Critical)
            .count();
        let critical_share = critical as f64 / total * 100.0;
        if critical_share > 20.0 {
            factors.push(RiskFactor::new(
                RiskFactorKind::CriticalSupplierDependency,
                FactorSeverity::High,
                format!(
                    "{} critical suppliers ({:.0}% of portfolio)",
                    critical, critical_share
                ),
                0.4,
                85.0,
            ));
        }

        let tier_1_share = suppliers
            .iter()
            .filter(|s| s.tier == SupplierTier::Tier1)
            .count() as f64
            / total
            * 100.0;
        if tier_1_share > 60.0 {
            factors.push(RiskFactor::new(
                RiskFactorKind::Tier1Concentration,
                FactorSeverity::Medium,
                format!(
                    "{:.0}% of suppliers are Tier 1 (limited backup options)",
                    tier_1_share
                ),
                0.5,
                60.0,
            ));
        }

        let low_reliability = suppliers.iter().filter(|s| s.reliability() < 70.0).count();
        if low_reliability > 0 {
            factors.push(RiskFactor::new(
                RiskFactorKind::SupplierReliability,
                FactorSeverity::Medium,
                format!("{} suppliers with reliability score <70", low_reliability),
                0.7,
                50.0,
            ));
        }

        let saturated = suppliers.iter().filter(|s| s.utilization() > 85.0).count();
        if saturated > 0 {
            factors.push(RiskFactor::new(
                RiskFactorKind::CapacityConstraints,
                FactorSeverity::Medium,
                format!("{} suppliers operating at >85% capacity", saturated),
                0.6,
                55.0,
            ));
        }

        let long_lead = suppliers.iter().filter(|s| s.lead_time_days > 60).count();
        if long_lead > 0 {
            factors.push(RiskFactor::new(
                RiskFactorKind::ExtendedLeadTimes,
                FactorSeverity::Low,
                format!("{} suppliers with lead times >60 days", long_lead),
                0.3,
                40.0,
            ));
        }

        factors
    }
}

/// Most common country (case-insensitive), ties resolved alphabetically
fn top_country(suppliers: &[Supplier]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for supplier in suppliers {
        let name = supplier.country.trim();
        let entry = counts
            .entry(name.to_lowercase())
            .or_insert_with(|| (name.to_string(), 0));
        entry.1 += 1;
    }

    let mut best: Option<(String, usize)> = None;
    for (display, count) in counts.into_values() {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((display, count));
        }
    }
    best
}

/// Mean of likelihood x impact, capped at 100
pub fn predicted_risk_score(factors: &[RiskFactor]) -> f64 {
    if factors.is_empty() {
        return BASELINE_RISK_SCORE;
    }
    let total: f64 = factors.iter().map(RiskFactor::weighted_risk).sum();
    (total / factors.len() as f64).min(100.0)
}

/// Data-quality confidence in [50, 100]
pub fn confidence_level(suppliers: &[Supplier]) -> f64 {
    if suppliers.is_empty() {
        return 50.0;
    }
    let total = suppliers.len();
    let mut confidence = 50.0;

    confidence += if total > 20 {
        15.0
    } else if total > 10 {
        10.0
    } else if total > 5 {
        5.0
    } else {
        0.0
    };

    let with_coordinates = suppliers.iter().filter(|s| s.location.is_some()).count();
    confidence += with_coordinates as f64 / total as f64 * 20.0;

    let mean_reliability = suppliers.iter().map(Supplier::reliability).sum::<f64>() / total as f64;
    if mean_reliability > 0.0 {
        confidence += 15.0;
    }

    f64::min(confidence, 100.0)
}

fn recommendations(factors: &[RiskFactor]) -> Vec<ProactiveRecommendation> {
    let mut recommendations: Vec<ProactiveRecommendation> = factors
        .iter()
        .filter_map(|factor| {
            let name = factor.kind.to_string();
            match factor.kind {
                RiskFactorKind::GeographicConcentration => Some(ProactiveRecommendation::new(
                    &name,
                    "Diversify supplier base across multiple regions",
                    Priority::High,
                    "3-6 months",
                    "Reduce geographic risk by 40-50%",
                )),
                RiskFactorKind::CriticalSupplierDependency => Some(ProactiveRecommendation::new(
                    &name,
                    "Establish backup suppliers for critical components",
                    Priority::High,
                    "1-3 months",
                    "Ensure business continuity",
                )),
                RiskFactorKind::CapacityConstraints => Some(ProactiveRecommendation::new(
                    &name,
                    "Negotiate capacity reservations or identify additional suppliers",
                    Priority::Medium,
                    "1-2 months",
                    "Ensure supply availability during demand spikes",
                )),
                RiskFactorKind::SupplierReliability => Some(ProactiveRecommendation::new(
                    &name,
                    "Implement supplier performance monitoring and improvement program",
                    Priority::Medium,
                    "2-4 months",
                    "Improve overall supplier reliability by 15-20%",
                )),
                RiskFactorKind::Tier1Concentration | RiskFactorKind::ExtendedLeadTimes => None,
            }
        })
        .collect();

    recommendations.push(ProactiveRecommendation::new(
        "General Supply Chain Resilience",
        "Implement supply chain visibility and monitoring system",
        Priority::Medium,
        "3-6 months",
        "Early detection of potential disruptions",
    ));
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SupplierCategory;

    fn supplier(id: i64, country: &str) -> Supplier {
        Supplier::new(
            id,
            &format!("Supplier {}", id),
            country,
            SupplierCategory::Components,
            CriticalityLevel::Medium,
        )
        .with_tier(SupplierTier::Tier2)
    }

    #[test]
    fn test_empty_portfolio() {
        let outlook = PortfolioAnalyzer::new().analyze(&[]);
        assert!(outlook.risk_factors.is_empty());
        assert_eq!(outlook.predicted_risk_score, BASELINE_RISK_SCORE);
        assert_eq!(outlook.confidence_level, 50.0);
        assert_eq!(outlook.recommendations.len(), 1);
    }

    #[test]
    fn test_healthy_portfolio_has_baseline_score() {
        let suppliers = vec![supplier(1, "Japan"), supplier(2, "Germany"), supplier(3, "Mexico")];
        let outlook = PortfolioAnalyzer::new().analyze(&suppliers);
        assert!(outlook.risk_factors.is_empty());
        assert_eq!(outlook.predicted_risk_score, 20.0);
    }

    #[test]
    fn test_geographic_concentration() {
        let suppliers = vec![
            supplier(1, "Taiwan"),
            supplier(2, "taiwan"),
            supplier(3, "Taiwan"),
            supplier(4, "Japan"),
        ];
        let factors = PortfolioAnalyzer::new().risk_factors(&suppliers);
        let concentration = factors
            .iter()
            .find(|f| f.kind == RiskFactorKind::GeographicConcentration)
            .unwrap();
        assert_eq!(concentration.severity, FactorSeverity::High);
        assert!(concentration.description.starts_with("75% of suppliers concentrated in"));
    }

    #[test]
    fn test_half_share_is_not_concentration() {
        let suppliers = vec![supplier(1, "Taiwan"), supplier(2, "Japan")];
        let factors = PortfolioAnalyzer::new().risk_factors(&suppliers);
        assert!(factors.is_empty());
    }

    #[test]
    fn test_predicted_score() {
        let suppliers = vec![
            supplier(1, "Japan").with_reliability(60.0),
            supplier(2, "Germany").with_capacity_utilization(90.0),
            supplier(3, "Mexico"),
        ];
        let outlook = PortfolioAnalyzer::new().analyze(&suppliers);
        assert_eq!(outlook.risk_factors.len(), 2);
        // (0.7*50 + 0.6*55) / 2 = 34
        assert_eq!(outlook.predicted_risk_score, 34.0);
    }

    #[test]
    fn test_confidence_level() {
        let mut suppliers: Vec<Supplier> = (1..=12).map(|id| supplier(id, "Japan")).collect();
        for s in suppliers.iter_mut().take(6) {
            s.location = Some(crate::GeoPoint::new_unchecked(35.0, 139.0));
        }
        // 50 + 10 + 10 + 15
        assert_eq!(confidence_level(&suppliers), 85.0);
    }

    #[test]
    fn test_recommendations_capped() {
        let suppliers: Vec<Supplier> = (1..=4)
            .map(|id| {
                Supplier::new(
                    id,
                    "Fragile",
                    "Taiwan",
                    SupplierCategory::Components,
                    CriticalityLevel::Critical,
                )
                .with_reliability(50.0)
                .with_capacity_utilization(95.0)
                .with_lead_time(90)
            })
            .collect();

        let outlook = PortfolioAnalyzer::new().analyze(&suppliers);
        assert_eq!(outlook.risk_factors.len(), 6);
        assert_eq!(outlook.recommendations.len(), 5);
        assert_eq!(outlook.recommendations[0].priority, Priority::High);
        assert!(outlook.predicted_risk_score <= 100.0);
    }
}
