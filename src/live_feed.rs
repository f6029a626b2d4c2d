//! Live-feed event classification and supplier matching
//!
//! Feed events (news articles, weather alerts) arrive as loosely structured
//! records. They are classified by keyword, given a severity band and matched
//! against suppliers with a simpler rule than incident matching: country
//! substring or distance inside the radius for the event kind.

use crate::geo::{DisruptionKind, GeoPoint, ImpactRadii};
use crate::{CriticalityLevel, Result, RiskEngineError, Supplier, SupplierId};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Severity band of a feed event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FeedSeverity {
    /// Map a NOAA alert severity; unknown values are Medium
    pub fn from_noaa(noaa_severity: &str) -> Self {
        match noaa_severity.trim() {
            "Extreme" => FeedSeverity::Critical,
            "Severe" => FeedSeverity::High,
            "Moderate" => FeedSeverity::Medium,
            "Minor" => FeedSeverity::Low,
            _ => FeedSeverity::Medium,
        }
    }

    /// High or Critical
    pub fn is_severe(&self) -> bool {
        *self >= FeedSeverity::High
    }
}

impl std::fmt::Display for FeedSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSeverity::Low => write!(f, "LOW"),
            FeedSeverity::Medium => write!(f, "MEDIUM"),
            FeedSeverity::High => write!(f, "HIGH"),
            FeedSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Where a feed event happened, as far as the source knows
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub point: Option<GeoPoint>,
}

impl FeedLocation {
    pub fn country(country: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            ..Self::default()
        }
    }

    pub fn with_point(mut self, latitude: f64, longitude: f64) -> Self {
        self.point = Some(GeoPoint::new_unchecked(latitude, longitude));
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

/// A normalized event from an external feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedEvent {
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub kind: DisruptionKind,
    pub severity: FeedSeverity,
    #[serde(default)]
    pub location: Option<FeedLocation>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedEvent {
    pub fn new(source: &str, title: &str, kind: DisruptionKind, severity: FeedSeverity) -> Self {
        Self {
            source: source.to_string(),
            title: title.to_string(),
            description: None,
            url: None,
            kind,
            severity,
            location: None,
            published_at: None,
        }
    }

    /// News article: kind from title keywords, severity from tone and title
    pub fn from_article(classifier: &EventClassifier, source: &str, title: &str, tone: f64) -> Self {
        Self::new(
            source,
            title,
            classifier.classify_event_type(title),
            classifier.severity_from_tone(tone, title),
        )
    }

    /// NOAA weather alert; always a weather event located in the USA
    pub fn from_noaa_alert(headline: &str, noaa_severity: &str, area: &str) -> Self {
        let mut event = Self::new(
            "NOAA",
            headline,
            DisruptionKind::WeatherEvent,
            FeedSeverity::from_noaa(noaa_severity),
        );
        event.location = Some(FeedLocation::country("USA").with_region(area));
        event
    }

    pub fn with_location(mut self, location: FeedLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Stable identity used to de-duplicate events across scans
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.title.trim().to_lowercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.kind.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Keyword classifier for event titles
#[derive(Debug, Clone)]
pub struct EventClassifier {
    kinds: Vec<(DisruptionKind, Regex)>,
    critical_terms: Regex,
}

impl EventClassifier {
    /// Classifier with the standard keyword lists
    pub fn new() -> Result<Self> {
        let mut classifier = Self {
            kinds: Vec::new(),
            critical_terms: keyword_pattern(&["major", "severe", "catastrophic", "disaster"])?,
        };
        classifier.load_default_keywords()?;
        Ok(classifier)
    }

    fn load_default_keywords(&mut self) -> Result<()> {
        self.add_keywords(DisruptionKind::NaturalDisaster, &["earthquake", "quake", "seismic"])?;
        self.add_keywords(DisruptionKind::LaborDispute, &["strike", "protest", "walkout"])?;
        self.add_keywords(
            DisruptionKind::WeatherEvent,
            &["flood", "hurricane", "typhoon", "storm"],
        )?;
        self.add_keywords(
            DisruptionKind::IndustrialAccident,
            &["fire", "explosion", "accident"],
        )?;
        self.add_keywords(
            DisruptionKind::LogisticsDisruption,
            &["port", "shipping", "logistics"],
        )?;
        Ok(())
    }

    /// Append a keyword rule; rules are checked in insertion order.
    ///
    /// Blank keywords are dropped. A rule with no keyword left is rejected,
    /// since an empty pattern would match every title.
    pub fn add_keywords(&mut self, kind: DisruptionKind, keywords: &[&str]) -> Result<()> {
        self.kinds.push((kind, keyword_pattern(keywords)?));
        Ok(())
    }

    /// First matching rule wins; no match is `Other`
    pub fn classify_event_type(&self, title: &str) -> DisruptionKind {
        self.kinds
            .iter()
            .find(|(_, pattern)| pattern.is_match(title))
            .map(|(kind, _)| *kind)
            .unwrap_or(DisruptionKind::Other)
    }

    /// Negative tone means bad news; alarming title words force Critical
    pub fn severity_from_tone(&self, tone: f64, title: &str) -> FeedSeverity {
        if tone < -5.0 || self.critical_terms.is_match(title) {
            FeedSeverity::Critical
        } else if tone < -2.0 {
            FeedSeverity::High
        } else if tone < 0.0 {
            FeedSeverity::Medium
        } else {
            FeedSeverity::Low
        }
    }
}

/// Case-insensitive containment of any keyword
fn keyword_pattern(keywords: &[&str]) -> Result<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Err(RiskEngineError::Config(
            "keyword rule needs at least one non-blank keyword".to_string(),
        ));
    }
    let pattern = format!("(?i)(?:{})", alternatives.join("|"));
    Regex::new(&pattern)
        .map_err(|e| RiskEngineError::Config(format!("invalid keyword pattern: {}", e)))
}

/// Supplier touched by a feed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffectedFeedSupplier {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub distance_km: Option<f64>,
    pub criticality: CriticalityLevel,
}

/// Feed event with at least one affected supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedFeedEvent {
    pub event: FeedEvent,
    pub affected_suppliers: Vec<AffectedFeedSupplier>,
}

impl MatchedFeedEvent {
    pub fn affected_count(&self) -> usize {
        self.affected_suppliers.len()
    }

    pub fn critical_supplier_count(&self) -> usize {
        self.affected_suppliers
            .iter()
            .filter(|s| s.criticality == CriticalityLevel::Critical)
            .count()
    }
}

/// Radius-only matcher for feed events
#[derive(Debug, Clone, Default)]
pub struct LiveFeedMatcher {
    radii: ImpactRadii,
}

impl LiveFeedMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_radii(radii: ImpactRadii) -> Self {
        Self { radii }
    }

    /// Match one event against suppliers that have coordinates.
    ///
    /// Returns `None` for events without a location or without any affected
    /// supplier.
    pub fn match_event(&self, event: &FeedEvent, suppliers: &[Supplier]) -> Option<MatchedFeedEvent> {
        let location = event.location.as_ref()?;
        let radius_km = self.radii.radius_for(event.kind);
        let event_country = location
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);

        let affected_suppliers: Vec<AffectedFeedSupplier> = suppliers
            .iter()
            .filter_map(|supplier| {
                let supplier_point = supplier.location?;
                let distance_km = location.point.map(|p| p.distance_to(&supplier_point));

                let country_hit = event_country
                    .as_deref()
                    .map_or(false, |c| supplier.country.to_uppercase().contains(c));
                let radius_hit = distance_km.map_or(false, |d| d <= radius_km);

                (country_hit || radius_hit).then(|| AffectedFeedSupplier {
                    supplier_id: supplier.id,
                    supplier_name: supplier.name.clone(),
                    distance_km,
                    criticality: supplier.criticality,
                })
            })
            .collect();

        if affected_suppliers.is_empty() {
            return None;
        }

        debug!(
            "Feed event '{}' affects {} suppliers",
            event.title,
            affected_suppliers.len()
        );
        Some(MatchedFeedEvent {
            event: event.clone(),
            affected_suppliers,
        })
    }

    /// Match a batch, keeping only events that touch a supplier
    pub fn match_events(&self, events: &[FeedEvent], suppliers: &[Supplier]) -> Vec<MatchedFeedEvent> {
        events
            .iter()
            .filter_map(|event| self.match_event(event, suppliers))
            .collect()
    }
}
