//! Supplier impact matching for a single incident
//!
//! Each supplier is checked against four independent signals: country, city,
//! distance to the epicentre and industry keywords. Any signal marks the
//! supplier as affected; later signals may raise its proximity score but
//! never lower it.

use crate::geo::ImpactRadii;
use crate::{
    CriticalityLevel, ParsedIncident, Result, Supplier, SupplierCategory, SupplierId,
    SupplierTier,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Proximity assigned to a country-level match
pub const COUNTRY_MATCH_PROXIMITY: f64 = 0.8;

/// Proximity assigned to a city-level match
pub const CITY_MATCH_PROXIMITY: f64 = 1.0;

/// Proximity assigned to an industry-keyword match
pub const INDUSTRY_MATCH_PROXIMITY: f64 = 0.5;

/// Why a supplier was classified as affected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    AffectedCountry { country: String },
    AffectedCity { city: String },
    WithinRadius { distance_km: f64, radius_km: f64 },
    IndustryAffected { industry: String },
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchReason::AffectedCountry { country } => {
                write!(f, "Located in affected country: {}", country)
            }
            MatchReason::AffectedCity { city } => {
                write!(f, "Located in directly affected city: {}", city)
            }
            MatchReason::WithinRadius {
                distance_km,
                radius_km,
            } => write!(
                f,
                "Within {:.0}km of incident (radius: {:.0}km)",
                distance_km, radius_km
            ),
            MatchReason::IndustryAffected { industry } => {
                write!(f, "Industry affected: {}", industry)
            }
        }
    }
}

/// Classification of one supplier against one incident
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub category: SupplierCategory,
    pub criticality: CriticalityLevel,
    pub tier: SupplierTier,
    pub is_affected: bool,
    /// Confidence in [0, 1] that the supplier is hit
    pub proximity_score: f64,
    pub reason: MatchReason,
    pub distance_km: Option<f64>,
}

/// Affected suppliers for one incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub matches: Vec<MatchResult>,
    pub affected_count: usize,
    pub total_scanned: usize,
}

impl MatchSummary {
    /// IDs of every affected supplier
    pub fn affected_ids(&self) -> BTreeSet<SupplierId> {
        self.matches.iter().map(|m| m.supplier_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Export as JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Matches incidents to suppliers
#[derive(Debug, Clone, Default)]
pub struct SupplierMatcher {
    radii: ImpactRadii,
}

impl SupplierMatcher {
    /// Create a matcher with the standard radius table
    pub fn new() -> Self {
        Self {
            radii: ImpactRadii::new(),
        }
    }

    /// Create a matcher with a custom radius table
    pub fn with_radii(radii: ImpactRadii) -> Self {
        Self { radii }
    }

    /// Radius for an incident: the parsed radius if given, else the table entry
    pub fn impact_radius(&self, incident: &ParsedIncident) -> f64 {
        incident
            .affected_radius_km
            .unwrap_or_else(|| self.radii.radius_for(incident.disruption_kind()))
    }

    /// Classify every supplier and keep the affected ones
    pub fn match_suppliers(
        &self,
        incident: &ParsedIncident,
        suppliers: &[Supplier],
    ) -> Result<MatchSummary> {
        incident.validate()?;
        for supplier in suppliers {
            supplier.validate()?;
        }

        let radius_km = self.impact_radius(incident);
        let matches: Vec<MatchResult> = suppliers
            .iter()
            .filter_map(|supplier| self.evaluate(incident, supplier, radius_km))
            .collect();

        debug!(
            "Matched {} of {} suppliers (radius {:.0}km)",
            matches.len(),
            suppliers.len(),
            radius_km
        );

        Ok(MatchSummary {
            affected_count: matches.len(),
            total_scanned: suppliers.len(),
            matches,
        })
    }

    /// Evaluate a single supplier; `None` when unaffected
    pub fn evaluate(
        &self,
        incident: &ParsedIncident,
        supplier: &Supplier,
        radius_km: f64,
    ) -> Option<MatchResult> {
        let mut is_affected = false;
        let mut proximity_score: f64 = 0.0;
        let mut reason = None;
        let mut distance_km = None;

        // 1-2. Country, then city within that country
        if let Some(country) = non_blank(incident.country.as_deref()) {
            if same_text(&supplier.country, country) {
                is_affected = true;
                proximity_score = COUNTRY_MATCH_PROXIMITY;
                reason = Some(MatchReason::AffectedCountry {
                    country: country.to_string(),
                });

                let incident_city = non_blank(incident.city.as_deref());
                let supplier_city = non_blank(supplier.city.as_deref());
                if let (Some(incident_city), Some(supplier_city)) = (incident_city, supplier_city) {
                    if same_text(supplier_city, incident_city) {
                        proximity_score = CITY_MATCH_PROXIMITY;
                        reason = Some(MatchReason::AffectedCity {
                            city: incident_city.to_string(),
                        });
                    }
                }
            }
        }

        // 3. Distance to the epicentre
        if let (Some(epicentre), Some(site)) = (&incident.location, &supplier.location) {
            let distance = epicentre.distance_to(site);
            distance_km = Some(distance);

            if distance <= radius_km {
                is_affected = true;
                proximity_score = proximity_score.max(1.0 - distance / radius_km);
                reason = Some(MatchReason::WithinRadius {
                    distance_km: distance,
                    radius_km,
                });
            }
        }

        // 4. Industry keywords, only as a last resort
        if !is_affected {
            if let Some(industry) = industry_match(incident, supplier.category) {
                is_affected = true;
                proximity_score = INDUSTRY_MATCH_PROXIMITY;
                reason = Some(MatchReason::IndustryAffected { industry });
            }
        }

        if !is_affected {
            return None;
        }

        Some(MatchResult {
            supplier_id: supplier.id,
            supplier_name: supplier.name.clone(),
            category: supplier.category,
            criticality: supplier.criticality,
            tier: supplier.tier,
            is_affected,
            proximity_score: proximity_score.clamp(0.0, 1.0),
            reason: reason?,
            distance_km,
        })
    }
}

/// Match with the standard radius table
pub fn match_suppliers(incident: &ParsedIncident, suppliers: &[Supplier]) -> Result<MatchSummary> {
    SupplierMatcher::new().match_suppliers(incident, suppliers)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Case-insensitive containment in either direction
fn industry_match(incident: &ParsedIncident, category: SupplierCategory) -> Option<String> {
    let category_name = category.to_string().to_lowercase();

    incident
        .key_industries
        .iter()
        .map(|industry| industry.trim())
        .filter(|industry| !industry.is_empty())
        .find(|industry| {
            let industry_lower = industry.to_lowercase();
            industry_lower.contains(&category_name) || category_name.contains(&industry_lower)
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IncidentType, RiskEngineError};

    fn hsinchu_quake() -> ParsedIncident {
        ParsedIncident::new(IncidentType::NaturalDisaster, 5)
            .with_location(24.8138, 120.9675)
            .with_radius(500.0)
            .with_country("Taiwan")
            .with_city("Hsinchu")
    }

    fn supplier(id: SupplierId, country: &str) -> Supplier {
        Supplier::new(
            id,
            &format!("Supplier {}", id),
            country,
            SupplierCategory::Components,
            CriticalityLevel::High,
        )
    }

    #[test]
    fn test_colocated_suppliers_always_affected() {
        let matcher = SupplierMatcher::new();
        let suppliers = vec![
            supplier(1, "Elsewhere").with_location(24.8138, 120.9675),
            supplier(2, "Elsewhere").with_location(24.8138, 120.9675),
        ];

        for event_type in [
            IncidentType::NaturalDisaster,
            IncidentType::LaborStrike,
            IncidentType::CyberSecurity,
        ] {
            let incident = ParsedIncident::new(event_type, 3).with_location(24.8138, 120.9675);
            let summary = matcher.match_suppliers(&incident, &suppliers).unwrap();
            assert_eq!(summary.affected_count, 2);
            for m in &summary.matches {
                assert!(m.is_affected);
                assert_eq!(m.distance_km, Some(0.0));
                assert_eq!(m.proximity_score, 1.0);
            }
        }
    }

    #[test]
    fn test_country_match_without_city() {
        let incident = ParsedIncident::new(IncidentType::Geopolitical, 3)
            .with_country("Taiwan")
            .with_city("Hsinchu");
        let suppliers = vec![supplier(1, "taiwan").with_city("Taipei")];

        let summary = match_suppliers(&incident, &suppliers).unwrap();
        assert_eq!(summary.affected_count, 1);
        assert_eq!(summary.matches[0].proximity_score, 0.8);
        assert!(matches!(
            summary.matches[0].reason,
            MatchReason::AffectedCountry { .. }
        ));
    }

    #[test]
    fn test_country_and_city_match() {
        let incident = ParsedIncident::new(IncidentType::Geopolitical, 3)
            .with_country("Taiwan")
            .with_city("Hsinchu");
        let suppliers = vec![supplier(1, "TAIWAN").with_city("hsinchu")];

        let summary = match_suppliers(&incident, &suppliers).unwrap();
        assert_eq!(summary.matches[0].proximity_score, 1.0);
        assert_eq!(
            summary.matches[0].reason.to_string(),
            "Located in directly affected city: Hsinchu"
        );
    }

    #[test]
    fn test_distance_never_lowers_country_score() {
        // ~70 km from Hsinchu, well inside 500 km => 1 - 70/500 > 0.8
        let near = supplier(1, "Taiwan").with_location(25.0330, 121.5654);
        // ~250 km away => 1 - 250/500 = 0.5, country score 0.8 must win
        let far = supplier(2, "Taiwan").with_location(22.6273, 120.3014);

        let summary = match_suppliers(&hsinchu_quake(), &[near, far]).unwrap();
        let near_match = summary.matches.iter().find(|m| m.supplier_id == 1).unwrap();
        let far_match = summary.matches.iter().find(|m| m.supplier_id == 2).unwrap();

        assert!(near_match.proximity_score > 0.8);
        assert!(far_match.proximity_score >= 0.8);
        assert!(matches!(far_match.reason, MatchReason::WithinRadius { .. }));
    }

    #[test]
    fn test_radius_proximity_is_linear_in_distance() {
        let taipei = supplier(1, "Elsewhere").with_location(25.0330, 121.5654);
        let incident = ParsedIncident::new(IncidentType::NaturalDisaster, 4)
            .with_location(24.8138, 120.9675)
            .with_radius(500.0);
        let distance = incident
            .location
            .unwrap()
            .distance_to(&taipei.location.unwrap());
        assert!(distance > 50.0 && distance < 100.0);

        let summary = match_suppliers(&incident, &[taipei.clone()]).unwrap();
        let m = &summary.matches[0];
        assert_eq!(m.distance_km, Some(distance));
        assert!((m.proximity_score - (1.0 - distance / 500.0)).abs() < 1e-9);
        assert!(matches!(m.reason, MatchReason::WithinRadius { .. }));

        // Exactly on the boundary: still affected, proximity 0
        let edge = incident.with_radius(distance);
        let summary = match_suppliers(&edge, &[taipei]).unwrap();
        assert_eq!(summary.affected_count, 1);
        assert_eq!(summary.matches[0].proximity_score, 0.0);
        assert_eq!(summary.matches[0].distance_km, Some(distance));
    }

    #[test]
    fn test_outside_radius_unaffected() {
        let incident = ParsedIncident::new(IncidentType::LaborStrike, 2).with_location(24.8138, 120.9675);
        // Taipei is ~70 km away, labor dispute radius is 50 km
        let suppliers = vec![supplier(1, "Taiwan").with_location(25.0330, 121.5654)];

        let summary = match_suppliers(&incident, &suppliers).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.total_scanned, 1);
    }

    #[test]
    fn test_default_radius_from_event_type() {
        let matcher = SupplierMatcher::new();
        let strike = ParsedIncident::new(IncidentType::LaborStrike, 2);
        let quake = ParsedIncident::new(IncidentType::NaturalDisaster, 2);
        let cyber = ParsedIncident::new(IncidentType::CyberSecurity, 2);
        let explicit = ParsedIncident::new(IncidentType::LaborStrike, 2).with_radius(42.0);

        assert_eq!(matcher.impact_radius(&strike), 50.0);
        assert_eq!(matcher.impact_radius(&quake), 500.0);
        assert_eq!(matcher.impact_radius(&cyber), 100.0);
        assert_eq!(matcher.impact_radius(&explicit), 42.0);
    }

    #[test]
    fn test_industry_keyword_match() {
        let incident = ParsedIncident::new(IncidentType::Economic, 3)
            .with_industry("Electronic Components")
            .with_industry("  ");
        let suppliers = vec![
            supplier(1, "Germany"),
            Supplier::new(
                2,
                "Steel Works",
                "Germany",
                SupplierCategory::RawMaterials,
                CriticalityLevel::Low,
            ),
        ];

        let summary = match_suppliers(&incident, &suppliers).unwrap();
        assert_eq!(summary.affected_count, 1);
        assert_eq!(summary.matches[0].supplier_id, 1);
        assert_eq!(summary.matches[0].proximity_score, 0.5);
        assert_eq!(
            summary.matches[0].reason,
            MatchReason::IndustryAffected {
                industry: "Electronic Components".to_string()
            }
        );
    }

    #[test]
    fn test_industry_match_skipped_when_already_affected() {
        let incident = ParsedIncident::new(IncidentType::Economic, 3)
            .with_country("Germany")
            .with_industry("components");
        let summary = match_suppliers(&incident, &[supplier(1, "Germany")]).unwrap();
        assert_eq!(summary.matches[0].proximity_score, 0.8);
    }

    #[test]
    fn test_hsinchu_scenario() {
        let foundry = supplier(7, "Taiwan")
            .with_city("Hsinchu")
            .with_location(24.8138, 120.9675);
        let summary = match_suppliers(&hsinchu_quake(), &[foundry]).unwrap();

        let m = &summary.matches[0];
        assert!(m.is_affected);
        assert_eq!(m.distance_km, Some(0.0));
        assert_eq!(m.proximity_score, 1.0);
    }

    #[test]
    fn test_no_suppliers() {
        let summary = match_suppliers(&hsinchu_quake(), &[]).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.affected_count, 0);
    }

    #[test]
    fn test_invalid_incident_rejected() {
        let incident = ParsedIncident::new(IncidentType::NaturalDisaster, 9);
        assert!(matches!(
            match_suppliers(&incident, &[]),
            Err(RiskEngineError::InvalidSeverity(_))
        ));
    }

    #[test]
    fn test_summary_json() {
        let foundry = supplier(7, "Taiwan").with_location(24.8138, 120.9675);
        let summary = match_suppliers(&hsinchu_quake(), &[foundry]).unwrap();
        let json = summary.to_json().unwrap();
        assert!(json.contains("within_radius"));
        assert!(json.contains("\"affected_count\": 1"));
    }
}
