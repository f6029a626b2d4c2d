//! # Supply-Chain Risk Engine
//!
//! Deterministic core of a supply-chain risk dashboard: decides which suppliers
//! an incident touches, how the disruption cascades through supplier
//! dependencies, and how much risk the organization carries as a result.
//!
//! ## Features
//!
//! - **Supplier Matching**: country, city, Haversine radius and industry signals
//! - **Cascading Impact**: breadth-first search over reverse dependency edges
//! - **Risk Scoring**: per-supplier impact, organization score, financial estimate
//! - **Alternative Sourcing**: weighted ranking of replacement suppliers
//! - **Live-Feed Alerts**: event classification, matching and alert triggering
//! - **Portfolio Outlook**: forward-looking concentration and capacity risks
//!
//! ## Pipeline
//!
//! ```text
//! ParsedIncident -> SupplierMatcher -> DependencyGraph::downstream_impact
//!                -> RiskScorer::assess_risk -> AlternativeRanker
//! ```
//!
//! Every stage is a pure function of already-loaded inputs. I/O lives behind
//! [`SupplierRepository`] and [`AdvisoryGenerator`].

pub mod alternatives;
pub mod config;
pub mod dependency_graph;
pub mod geo;
pub mod pipeline;
pub mod risk_scoring;
pub mod supplier_matcher;

#[cfg(feature = "live-feeds")]
pub mod alerts;
#[cfg(feature = "live-feeds")]
pub mod live_feed;
#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use alternatives::{candidate_pool, rank_alternatives, AlternativeRanker, RankedCandidate};
pub use config::EngineConfig;
pub use dependency_graph::{cascading_impact, DependencyGraph, InMemoryRepository, SupplierRepository};
pub use geo::{distance_km, DisruptionKind, GeoPoint, ImpactRadii};
pub use pipeline::{AdvisoryContext, AdvisoryGenerator, CannedAdvisory, IncidentAnalysis, IncidentPipeline};
pub use risk_scoring::{
    assess_risk, FinancialImpact, FinancialModel, OrganizationRiskAssessment, RiskLevel,
    RiskScorer, ScoringStrategy,
};
pub use supplier_matcher::{match_suppliers, MatchReason, MatchResult, MatchSummary, SupplierMatcher};

#[cfg(feature = "live-feeds")]
pub use alerts::{alert_impact_score, should_alert, Alert, AlertDetector};
#[cfg(feature = "live-feeds")]
pub use live_feed::{EventClassifier, FeedEvent, FeedLocation, FeedSeverity, LiveFeedMatcher, MatchedFeedEvent};
#[cfg(feature = "portfolio")]
pub use portfolio::{PortfolioAnalyzer, PortfolioOutlook};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Supplier primary key
pub type SupplierId = i64;

/// Organization primary key
pub type OrganizationId = i64;

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskEngineError {
    #[error("Invalid severity level: {0}")]
    InvalidSeverity(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid impact radius: {0}")]
    InvalidRadius(String),

    #[error("Invalid supplier record: {0}")]
    InvalidSupplier(String),

    #[error("Supplier repository failure: {0}")]
    Repository(String),

    #[error("Advisory generation failed: {0}")]
    Advisory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

pub type Result<T> = std::result::Result<T, RiskEngineError>;

/// What a supplier provides
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SupplierCategory {
    RawMaterials,
    Components,
    FinishedGoods,
    Logistics,
    Services,
}

impl std::fmt::Display for SupplierCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplierCategory::RawMaterials => write!(f, "Raw Materials"),
            SupplierCategory::Components => write!(f, "Components"),
            SupplierCategory::FinishedGoods => write!(f, "Finished Goods"),
            SupplierCategory::Logistics => write!(f, "Logistics"),
            SupplierCategory::Services => write!(f, "Services"),
        }
    }
}

/// Business importance of a supplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CriticalityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl CriticalityLevel {
    /// High or Critical; the threshold for escalation and critical paths
    pub fn is_high(&self) -> bool {
        *self >= CriticalityLevel::High
    }
}

impl std::fmt::Display for CriticalityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriticalityLevel::Low => write!(f, "Low"),
            CriticalityLevel::Medium => write!(f, "Medium"),
            CriticalityLevel::High => write!(f, "High"),
            CriticalityLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Supply-chain depth; serialized as the bare tier number
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum SupplierTier {
    #[default]
    Tier1,
    Tier2,
    Tier3,
}

impl SupplierTier {
    /// Numeric tier (1 = direct supplier)
    pub fn level(&self) -> u8 {
        match self {
            SupplierTier::Tier1 => 1,
            SupplierTier::Tier2 => 2,
            SupplierTier::Tier3 => 3,
        }
    }
}

impl TryFrom<u8> for SupplierTier {
    type Error = RiskEngineError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(SupplierTier::Tier1),
            2 => Ok(SupplierTier::Tier2),
            3 => Ok(SupplierTier::Tier3),
            other => Err(RiskEngineError::InvalidSupplier(format!(
                "tier must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<SupplierTier> for u8 {
    fn from(tier: SupplierTier) -> Self {
        tier.level()
    }
}

impl std::fmt::Display for SupplierTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tier {}", self.level())
    }
}

fn default_lead_time_days() -> u32 {
    30
}

fn default_reliability_score() -> f64 {
    85.0
}

fn default_capacity_utilization() -> f64 {
    70.0
}

/// Supplier record as consumed by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
    pub category: SupplierCategory,
    pub criticality: CriticalityLevel,
    #[serde(default)]
    pub tier: SupplierTier,
    #[serde(default = "default_lead_time_days")]
    pub lead_time_days: u32,
    #[serde(default = "default_reliability_score")]
    pub reliability_score: f64,
    #[serde(default = "default_capacity_utilization")]
    pub capacity_utilization: f64,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl Supplier {
    /// Create a supplier with default tier, lead time, reliability and utilization
    pub fn new(
        id: SupplierId,
        name: &str,
        country: &str,
        category: SupplierCategory,
        criticality: CriticalityLevel,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            country: country.to_string(),
            city: None,
            category,
            criticality,
            tier: SupplierTier::default(),
            lead_time_days: default_lead_time_days(),
            reliability_score: default_reliability_score(),
            capacity_utilization: default_capacity_utilization(),
            location: None,
        }
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(GeoPoint::new_unchecked(latitude, longitude));
        self
    }

    pub fn with_tier(mut self, tier: SupplierTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_lead_time(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    pub fn with_reliability(mut self, score: f64) -> Self {
        self.reliability_score = score;
        self
    }

    pub fn with_capacity_utilization(mut self, utilization: f64) -> Self {
        self.capacity_utilization = utilization;
        self
    }

    /// Reject records the scoring functions cannot interpret
    pub fn validate(&self) -> Result<()> {
        if self.lead_time_days == 0 {
            return Err(RiskEngineError::InvalidSupplier(format!(
                "supplier {} has a lead time of 0 days",
                self.id
            )));
        }
        if !self.reliability_score.is_finite() || !self.capacity_utilization.is_finite() {
            return Err(RiskEngineError::InvalidSupplier(format!(
                "supplier {} has a non-numeric reliability or utilization",
                self.id
            )));
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        Ok(())
    }

    /// Reliability clamped to [0, 100]
    pub fn reliability(&self) -> f64 {
        self.reliability_score.clamp(0.0, 100.0)
    }

    /// Capacity utilization clamped to [0, 100]
    pub fn utilization(&self) -> f64 {
        self.capacity_utilization.clamp(0.0, 100.0)
    }
}

/// Directed edge: `supplier_id` depends on `depends_on_supplier_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierDependencyEdge {
    pub supplier_id: SupplierId,
    pub depends_on_supplier_id: SupplierId,
    #[serde(default)]
    pub dependency_type: String,
}

impl SupplierDependencyEdge {
    pub fn new(supplier_id: SupplierId, depends_on_supplier_id: SupplierId, dependency_type: &str) -> Self {
        Self {
            supplier_id,
            depends_on_supplier_id,
            dependency_type: dependency_type.to_string(),
        }
    }
}

/// Incident category as produced by the event parser
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IncidentType {
    NaturalDisaster,
    Geopolitical,
    LaborStrike,
    Logistics,
    Economic,
    CyberSecurity,
    Regulatory,
    Other,
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentType::NaturalDisaster => write!(f, "Natural Disaster"),
            IncidentType::Geopolitical => write!(f, "Geopolitical"),
            IncidentType::LaborStrike => write!(f, "Labor Strike"),
            IncidentType::Logistics => write!(f, "Logistics"),
            IncidentType::Economic => write!(f, "Economic"),
            IncidentType::CyberSecurity => write!(f, "Cyber Security"),
            IncidentType::Regulatory => write!(f, "Regulatory"),
            IncidentType::Other => write!(f, "Other"),
        }
    }
}

/// Structured incident handed over by the external event parser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedIncident {
    pub event_type: IncidentType,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub severity_level: u8,
    #[serde(default)]
    pub affected_radius_km: Option<f64>,
    #[serde(default)]
    pub key_industries: BTreeSet<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl ParsedIncident {
    pub fn new(event_type: IncidentType, severity_level: u8) -> Self {
        Self {
            event_type,
            location: None,
            country: None,
            city: None,
            severity_level,
            affected_radius_km: None,
            key_industries: BTreeSet::new(),
            summary: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(GeoPoint::new_unchecked(latitude, longitude));
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.affected_radius_km = Some(radius_km);
        self
    }

    pub fn with_industry(mut self, industry: &str) -> Self {
        self.key_industries.insert(industry.to_string());
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Disruption class used for radius lookups
    pub fn disruption_kind(&self) -> DisruptionKind {
        DisruptionKind::from(self.event_type)
    }

    /// Fail fast on fields that have no sensible default
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.severity_level) {
            return Err(RiskEngineError::InvalidSeverity(format!(
                "severity level must be between 1 and 5, got {}",
                self.severity_level
            )));
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        if let Some(radius) = self.affected_radius_km {
            geo::validate_radius(radius)?;
        }
        Ok(())
    }

    /// Parse and validate an incident from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let incident: ParsedIncident = serde_json::from_str(json)
            .map_err(|e| RiskEngineError::MalformedInput(format!("incident: {}", e)))?;
        incident.validate()?;
        Ok(incident)
    }
}

/// Round to two decimal places for reporting
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_supplier() -> Supplier {
        Supplier::new(
            1,
            "Hsinchu Foundry",
            "Taiwan",
            SupplierCategory::Components,
            CriticalityLevel::Critical,
        )
        .with_city("Hsinchu")
        .with_location(24.8138, 120.9675)
    }

    #[test]
    fn test_valid_supplier() {
        let supplier = create_supplier();
        assert!(supplier.validate().is_ok());
        assert_eq!(supplier.tier, SupplierTier::Tier1);
        assert_eq!(supplier.lead_time_days, 30);
    }

    #[test]
    fn test_high_criticality_threshold() {
        assert!(!CriticalityLevel::Low.is_high());
        assert!(!CriticalityLevel::Medium.is_high());
        assert!(CriticalityLevel::High.is_high());
        assert!(CriticalityLevel::Critical.is_high());
    }

    #[test]
    fn test_zero_lead_time_rejected() {
        let supplier = create_supplier().with_lead_time(0);
        assert!(matches!(
            supplier.validate(),
            Err(RiskEngineError::InvalidSupplier(_))
        ));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let supplier = create_supplier()
            .with_reliability(120.0)
            .with_capacity_utilization(-5.0);
        assert_eq!(supplier.reliability(), 100.0);
        assert_eq!(supplier.utilization(), 0.0);
    }

    #[test]
    fn test_incident_severity_validation() {
        assert!(ParsedIncident::new(IncidentType::Economic, 3).validate().is_ok());
        assert!(matches!(
            ParsedIncident::new(IncidentType::Economic, 0).validate(),
            Err(RiskEngineError::InvalidSeverity(_))
        ));
        assert!(ParsedIncident::new(IncidentType::Economic, 6).validate().is_err());
    }

    #[test]
    fn test_incident_radius_validation() {
        let incident = ParsedIncident::new(IncidentType::NaturalDisaster, 4).with_radius(-10.0);
        assert!(matches!(
            incident.validate(),
            Err(RiskEngineError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_incident_from_json_with_missing_optionals() {
        let json = r#"{"event_type": "LaborStrike", "severity_level": 2}"#;
        let incident = ParsedIncident::from_json(json).unwrap();
        assert!(incident.location.is_none());
        assert!(incident.affected_radius_km.is_none());
        assert_eq!(incident.disruption_kind(), DisruptionKind::LaborDispute);
    }

    #[test]
    fn test_incident_from_json_missing_severity() {
        let json = r#"{"event_type": "LaborStrike"}"#;
        assert!(ParsedIncident::from_json(json).is_err());
    }

    #[test]
    fn test_tier_serializes_as_number() {
        let supplier = create_supplier().with_tier(SupplierTier::Tier2);
        let json = serde_json::to_string(&supplier).unwrap();
        assert!(json.contains("\"tier\":2"));

        let parsed: Supplier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tier, SupplierTier::Tier2);

        let bad = json.replace("\"tier\":2", "\"tier\":7");
        assert!(serde_json::from_str::<Supplier>(&bad).is_err());
    }

    #[test]
    fn test_supplier_defaults_from_json() {
        let json = r#"{
            "id": 9,
            "name": "Rotterdam Freight",
            "country": "Netherlands",
            "category": "Logistics",
            "criticality": "Medium"
        }"#;
        let supplier: Supplier = serde_json::from_str(json).unwrap();
        assert_eq!(supplier.reliability_score, 85.0);
        assert_eq!(supplier.capacity_utilization, 70.0);
        assert_eq!(supplier.tier, SupplierTier::Tier1);
        assert!(supplier.location.is_none());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(SupplierCategory::RawMaterials.to_string(), "Raw Materials");
        assert_eq!(SupplierCategory::FinishedGoods.to_string(), "Finished Goods");
    }
}
