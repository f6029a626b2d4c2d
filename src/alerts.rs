//! Alert triggering for the live-feed path
//!
//! Decides whether a matched feed event deserves an alert and assembles the
//! alert record with its impact score and recommended actions.

use crate::geo::DisruptionKind;
use crate::live_feed::{
    AffectedFeedSupplier, FeedEvent, FeedLocation, FeedSeverity, LiveFeedMatcher, MatchedFeedEvent,
};
use crate::Supplier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Affected-supplier count that triggers an alert on its own
pub const DEFAULT_BREADTH_THRESHOLD: usize = 3;

/// Alert trigger with the standard breadth threshold
pub fn should_alert(event: &MatchedFeedEvent) -> bool {
    should_alert_with_threshold(event, DEFAULT_BREADTH_THRESHOLD)
}

fn should_alert_with_threshold(event: &MatchedFeedEvent, breadth_threshold: usize) -> bool {
    event.event.severity.is_severe()
        || event.critical_supplier_count() > 0
        || event.affected_count() >= breadth_threshold
}

/// Severity band (10-40) + breadth (up to 30) + critical suppliers (up to 30)
pub fn alert_impact_score(event: &MatchedFeedEvent) -> f64 {
    let severity_points = match event.event.severity {
        FeedSeverity::Critical => 40.0,
        FeedSeverity::High => 30.0,
        FeedSeverity::Medium => 20.0,
        FeedSeverity::Low => 10.0,
    };
    let breadth_points = (event.affected_count() as f64 * 5.0).min(30.0);
    let critical_points = (event.critical_supplier_count() as f64 * 10.0).min(30.0);

    (severity_points + breadth_points + critical_points).min(100.0)
}

/// Alert record ready for storage or notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub severity: FeedSeverity,
    pub kind: DisruptionKind,
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
    pub location: Option<FeedLocation>,
    pub impact_score: f64,
    pub affected_suppliers: Vec<AffectedFeedSupplier>,
    pub affected_count: usize,
    pub recommended_actions: Vec<String>,
    pub fingerprint: String,
}

impl Alert {
    /// Export as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs matched feed events through the trigger rule
#[derive(Debug, Clone)]
pub struct AlertDetector {
    matcher: LiveFeedMatcher,
    breadth_threshold: usize,
    seen_fingerprints: HashSet<String>,
}

impl AlertDetector {
    pub fn new() -> Self {
        Self::with_config(LiveFeedMatcher::new(), DEFAULT_BREADTH_THRESHOLD)
    }

    pub fn with_config(matcher: LiveFeedMatcher, breadth_threshold: usize) -> Self {
        Self {
            matcher,
            breadth_threshold,
            seen_fingerprints: HashSet::new(),
        }
    }

    pub fn should_alert(&self, event: &MatchedFeedEvent) -> bool {
        should_alert_with_threshold(event, self.breadth_threshold)
    }

    /// Canned actions by event kind, plus escalation for severe events
    pub fn recommended_actions(&self, event: &FeedEvent) -> Vec<String> {
        let mut actions = vec![
            "Review affected supplier contracts and SLAs".to_string(),
            "Contact affected suppliers for status updates".to_string(),
        ];

        let specific: &[&str] = match event.kind {
            DisruptionKind::NaturalDisaster => &[
                "Activate disaster recovery protocols",
                "Assess alternative supplier capacity",
                "Review insurance coverage for affected regions",
            ],
            DisruptionKind::LaborDispute => &[
                "Identify backup suppliers in different regions",
                "Negotiate expedited shipping if needed",
            ],
            DisruptionKind::WeatherEvent => &[
                "Monitor weather forecasts for duration",
                "Adjust inventory levels as precaution",
            ],
            DisruptionKind::LogisticsDisruption => &[
                "Explore alternative shipping routes",
                "Consider air freight for critical components",
            ],
            DisruptionKind::IndustrialAccident | DisruptionKind::Other => &[],
        };
        actions.extend(specific.iter().map(|a| a.to_string()));

        if event.severity.is_severe() {
            actions.push("Escalate to executive team immediately".to_string());
            actions.push("Initiate emergency supplier sourcing".to_string());
        }

        actions
    }

    /// Assemble the alert record for a matched event
    pub fn create_alert(&self, matched: &MatchedFeedEvent) -> Alert {
        let event = &matched.event;
        Alert {
            alert_id: Uuid::new_v4(),
            created_at: Utc::now(),
            severity: event.severity,
            kind: event.kind,
            title: event.title.clone(),
            description: event.description.clone(),
            source: event.source.clone(),
            source_url: event.url.clone(),
            location: event.location.clone(),
            impact_score: alert_impact_score(matched),
            affected_suppliers: matched.affected_suppliers.clone(),
            affected_count: matched.affected_count(),
            recommended_actions: self.recommended_actions(event),
            fingerprint: event.fingerprint(),
        }
    }

    /// Match, filter and alert on a batch of feed events.
    ///
    /// Events already seen by this detector (same fingerprint) are skipped,
    /// including repeats inside the batch.
    pub fn scan(&mut self, events: &[FeedEvent], suppliers: &[Supplier]) -> Vec<Alert> {
        info!("Starting alert scan over {} events", events.len());

        let mut fresh = Vec::new();
        for event in events {
            if self.seen_fingerprints.insert(event.fingerprint()) {
                fresh.push(event.clone());
            } else {
                debug!("Skipping duplicate feed event '{}'", event.title);
            }
        }

        let matched = self.matcher.match_events(&fresh, suppliers);
        info!("{} events affect suppliers", matched.len());

        let alerts: Vec<Alert> = matched
            .iter()
            .filter(|m| self.should_alert(m))
            .map(|m| self.create_alert(m))
            .collect();

        info!("Generated {} alerts", alerts.len());
        alerts
    }

    /// Forget de-duplication history
    pub fn reset(&mut self) {
        self.seen_fingerprints.clear();
    }
}

impl Default for AlertDetector {
    fn default() -> Self {
        Self::new()
    }
}
