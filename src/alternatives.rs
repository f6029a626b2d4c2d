//! Alternative supplier ranking
//!
//! Scores replacement candidates for an affected supplier on five weighted
//! criteria and returns the best few.

use crate::geo::GeoPoint;
use crate::supplier_matcher::same_text;
use crate::{round2, Supplier, SupplierCategory, SupplierId, SupplierTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of alternatives returned when no limit is configured
pub const DEFAULT_TOP_N: usize = 3;

const GEOGRAPHIC_WEIGHT: f64 = 0.25;
const CAPACITY_WEIGHT: f64 = 0.20;
const RELIABILITY_WEIGHT: f64 = 0.25;
const LEAD_TIME_WEIGHT: f64 = 0.20;
const TIER_MATCH_WEIGHT: f64 = 0.10;

/// Distance from the incident at which a candidate earns the full geographic score
const FULL_SCORE_DISTANCE_KM: f64 = 2000.0;

/// Longest lead time that still earns a non-zero score
const MAX_ACCEPTABLE_LEAD_TIME_DAYS: f64 = 90.0;

/// Per-criterion scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub geographic_distance: f64,
    pub capacity_availability: f64,
    pub reliability: f64,
    pub lead_time: f64,
    pub tier_match: f64,
}

impl ScoreBreakdown {
    fn weighted_total(&self) -> f64 {
        self.geographic_distance * GEOGRAPHIC_WEIGHT
            + self.capacity_availability * CAPACITY_WEIGHT
            + self.reliability * RELIABILITY_WEIGHT
            + self.lead_time * LEAD_TIME_WEIGHT
            + self.tier_match * TIER_MATCH_WEIGHT
    }

    fn rounded(self) -> Self {
        Self {
            geographic_distance: round2(self.geographic_distance),
            capacity_availability: round2(self.capacity_availability),
            reliability: round2(self.reliability),
            lead_time: round2(self.lead_time),
            tier_match: round2(self.tier_match),
        }
    }
}

/// A scored replacement candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCandidate {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub country: String,
    pub city: Option<String>,
    pub category: SupplierCategory,
    pub tier: SupplierTier,
    pub lead_time_days: u32,
    pub total_score: f64,
    pub score_breakdown: ScoreBreakdown,
}

/// Weighted multi-criteria ranker
#[derive(Debug, Clone)]
pub struct AlternativeRanker {
    top_n: usize,
}

impl AlternativeRanker {
    /// Ranker returning the default top 3
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Score one candidate against the supplier it would replace
    pub fn score(
        &self,
        candidate: &Supplier,
        affected: &Supplier,
        incident_location: Option<GeoPoint>,
    ) -> RankedCandidate {
        let geographic_distance = match (incident_location, candidate.location) {
            (Some(incident), Some(location)) => {
                (incident.distance_to(&location) / FULL_SCORE_DISTANCE_KM * 100.0).min(100.0)
            }
            _ if !same_text(&candidate.country, &affected.country) => 70.0,
            _ => 30.0,
        };

        let lead_time = (100.0
            - f64::from(candidate.lead_time_days) / MAX_ACCEPTABLE_LEAD_TIME_DAYS * 100.0)
            .max(0.0);

        let tier_match = match candidate.tier.level().abs_diff(affected.tier.level()) {
            0 => 100.0,
            1 => 50.0,
            _ => 20.0,
        };

        let breakdown = ScoreBreakdown {
            geographic_distance,
            capacity_availability: 100.0 - candidate.utilization(),
            reliability: candidate.reliability(),
            lead_time,
            tier_match,
        };

        RankedCandidate {
            supplier_id: candidate.id,
            supplier_name: candidate.name.clone(),
            country: candidate.country.clone(),
            city: candidate.city.clone(),
            category: candidate.category,
            tier: candidate.tier,
            lead_time_days: candidate.lead_time_days,
            total_score: round2(breakdown.weighted_total()),
            score_breakdown: breakdown.rounded(),
        }
    }

    /// Score, sort descending (ties by supplier id) and truncate to top-n.
    /// The affected supplier is never returned, even if it appears in the pool.
    pub fn rank<'a, I>(
        &self,
        affected: &Supplier,
        candidates: I,
        incident_location: Option<GeoPoint>,
    ) -> Vec<RankedCandidate>
    where
        I: IntoIterator<Item = &'a Supplier>,
    {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.id != affected.id)
            .map(|candidate| self.score(candidate, affected, incident_location))
            .collect();

        ranked.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.supplier_id.cmp(&b.supplier_id))
        });
        ranked.truncate(self.top_n);
        ranked
    }
}

impl Default for AlternativeRanker {
    fn default() -> Self {
        Self::new()
    }
}

/// Same-category suppliers that are neither the affected supplier nor affected themselves
pub fn candidate_pool<'a>(
    affected: &Supplier,
    all_suppliers: &'a [Supplier],
    affected_ids: &BTreeSet<SupplierId>,
) -> Vec<&'a Supplier> {
    all_suppliers
        .iter()
        .filter(|s| s.id != affected.id)
        .filter(|s| s.category == affected.category)
        .filter(|s| !affected_ids.contains(&s.id))
        .collect()
}

/// Rank candidates for an affected supplier
pub fn rank_alternatives(
    affected: &Supplier,
    candidates: &[Supplier],
    incident_location: Option<GeoPoint>,
    top_n: usize,
) -> Vec<RankedCandidate> {
    AlternativeRanker::with_top_n(top_n).rank(affected, candidates, incident_location)
}
