//! Incident analysis pipeline
//!
//! Runs one parsed incident through matching, cascade search, scoring and
//! alternative ranking for a single organization, then asks the advisory
//! collaborator for narrative recommendations.

use crate::alternatives::{candidate_pool, RankedCandidate};
use crate::config::EngineConfig;
use crate::dependency_graph::{CascadingExposure, DependencyGraph, SupplierRepository};
use crate::risk_scoring::{OrganizationRiskAssessment, RiskLevel};
use crate::supplier_matcher::MatchSummary;
use crate::{
    CriticalityLevel, IncidentType, OrganizationId, ParsedIncident, Result, Supplier,
    SupplierCategory, SupplierId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the advisory collaborator gets to see
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryContext {
    pub organization_id: OrganizationId,
    pub event_type: IncidentType,
    pub incident_summary: Option<String>,
    pub risk_level: RiskLevel,
    pub overall_risk_score: f64,
    pub affected_supplier_count: usize,
    pub critical_supplier_count: usize,
    pub cascading_supplier_count: usize,
}

/// Produces free-text strategic recommendations, typically backed by an LLM
pub trait AdvisoryGenerator {
    fn generate(&self, context: &AdvisoryContext) -> Result<Vec<String>>;
}

/// Advisory that always answers with the canned suggestions
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedAdvisory;

impl AdvisoryGenerator for CannedAdvisory {
    fn generate(&self, _context: &AdvisoryContext) -> Result<Vec<String>> {
        Ok(fallback_recommendations())
    }
}

fn fallback_recommendations() -> Vec<String> {
    [
        "Contact all affected suppliers to assess status",
        "Review current inventory levels",
        "Activate backup suppliers",
        "Expedite orders from alternative suppliers",
        "Adjust production schedule based on available materials",
        "Diversify supplier base geographically",
        "Increase safety stock for critical components",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdvisorySource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advisory {
    pub source: AdvisorySource,
    pub recommendations: Vec<String>,
    /// Why the generator output was not used
    pub error: Option<String>,
}

/// Supplier reached only through dependencies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadingSupplier {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub country: String,
    pub criticality: CriticalityLevel,
}

/// Ranked replacements for one affected supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierAlternatives {
    pub affected_supplier_id: SupplierId,
    pub affected_supplier_name: String,
    pub category: SupplierCategory,
    pub alternatives: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Degraded,
}

/// Audit entry for one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageLog {
    pub stage: String,
    pub status: StageStatus,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl StageLog {
    fn completed(stage: &str, detail: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Completed,
            detail,
            timestamp: Utc::now(),
        }
    }

    fn degraded(stage: &str, detail: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Degraded,
            detail,
            timestamp: Utc::now(),
        }
    }
}

/// Full result of analyzing one incident for one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentAnalysis {
    pub analysis_id: Uuid,
    pub organization_id: OrganizationId,
    pub incident: ParsedIncident,
    pub matches: MatchSummary,
    pub cascading_suppliers: Vec<CascadingSupplier>,
    pub cascading_exposure: Vec<CascadingExposure>,
    pub assessment: OrganizationRiskAssessment,
    pub alternatives: Vec<SupplierAlternatives>,
    pub immediate_actions: Vec<String>,
    pub long_term_strategies: Vec<String>,
    pub advisory: Advisory,
    pub stage_logs: Vec<StageLog>,
    pub processing_time_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl IncidentAnalysis {
    /// Export as JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Sequential incident pipeline over a repository and an advisory collaborator
pub struct IncidentPipeline<R, A> {
    repository: R,
    advisory: A,
    config: EngineConfig,
}

impl<R: SupplierRepository, A: AdvisoryGenerator> IncidentPipeline<R, A> {
    /// Create a pipeline with default configuration
    pub fn new(repository: R, advisory: A) -> Self {
        Self::with_config(repository, advisory, EngineConfig::default())
    }

    pub fn with_config(repository: R, advisory: A, config: EngineConfig) -> Self {
        Self {
            repository,
            advisory,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one incident.
    ///
    /// Invalid incidents, supplier loading failures and invalid supplier
    /// records abort the analysis. A failure to load dependency edges only
    /// disables the cascade stage, and a failing advisory falls back to
    /// canned suggestions.
    pub fn analyze(
        &self,
        organization_id: OrganizationId,
        incident: &ParsedIncident,
    ) -> Result<IncidentAnalysis> {
        let started = Instant::now();
        let mut stage_logs = Vec::new();
        incident.validate()?;

        info!(
            "Analyzing {} incident (severity {}) for organization {}",
            incident.event_type, incident.severity_level, organization_id
        );

        let suppliers = self.repository.suppliers_for_organization(organization_id)?;
        let matches = self.config.matcher().match_suppliers(incident, &suppliers)?;
        let affected_ids = matches.affected_ids();
        stage_logs.push(StageLog::completed(
            "supplier_matching",
            format!(
                "{} of {} suppliers affected",
                matches.affected_count, matches.total_scanned
            ),
        ));

        let by_id: HashMap<SupplierId, &Supplier> = suppliers.iter().map(|s| (s.id, s)).collect();

        let (cascading_ids, cascading_exposure) =
            match self.repository.dependency_edges_for_organization(organization_id) {
                Ok(edges) => {
                    let graph = DependencyGraph::build(&suppliers, &edges);
                    let downstream = graph.downstream_impact(&affected_ids);
                    stage_logs.push(StageLog::completed(
                        "cascade_analysis",
                        format!("{} cascading impacts", downstream.len()),
                    ));
                    (downstream, graph.cascading_exposure(&affected_ids))
                }
                Err(e) => {
                    warn!("Continuing without cascading analysis: {}", e);
                    stage_logs.push(StageLog::degraded("cascade_analysis", e.to_string()));
                    (BTreeSet::new(), Vec::new())
                }
            };

        let cascading_suppliers: Vec<CascadingSupplier> = cascading_ids
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|s| CascadingSupplier {
                supplier_id: s.id,
                supplier_name: s.name.clone(),
                country: s.country.clone(),
                criticality: s.criticality,
            })
            .collect();

        let assessment = self.config.scorer().assess_risk(
            incident,
            &matches.matches,
            suppliers.len(),
            &cascading_ids,
        )?;
        stage_logs.push(StageLog::completed(
            "risk_scoring",
            format!(
                "{} risk ({:.2}/100)",
                assessment.risk_level, assessment.overall_risk_score
            ),
        ));

        // Most impacted supplier first
        let ranker = self.config.ranker();
        let alternatives: Vec<SupplierAlternatives> = assessment
            .affected_suppliers
            .iter()
            .filter_map(|impact| by_id.get(&impact.supplier_id))
            .filter_map(|affected| {
                let pool = candidate_pool(affected, &suppliers, &affected_ids);
                if pool.is_empty() {
                    return None;
                }
                Some(SupplierAlternatives {
                    affected_supplier_id: affected.id,
                    affected_supplier_name: affected.name.clone(),
                    category: affected.category,
                    alternatives: ranker.rank(affected, pool, incident.location),
                })
            })
            .collect();
        stage_logs.push(StageLog::completed(
            "alternative_sourcing",
            format!("alternatives for {} suppliers", alternatives.len()),
        ));

        let context = AdvisoryContext {
            organization_id,
            event_type: incident.event_type,
            incident_summary: incident.summary.clone(),
            risk_level: assessment.risk_level,
            overall_risk_score: assessment.overall_risk_score,
            affected_supplier_count: matches.affected_count,
            critical_supplier_count: assessment.critical_supplier_count,
            cascading_supplier_count: cascading_ids.len(),
        };
        let advisory = self.request_advisory(&context);
        stage_logs.push(match advisory.source {
            AdvisorySource::Generated => StageLog::completed(
                "advisory",
                format!("{} recommendations", advisory.recommendations.len()),
            ),
            AdvisorySource::Fallback => StageLog::degraded(
                "advisory",
                advisory.error.clone().unwrap_or_default(),
            ),
        });

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Analysis finished in {}ms: {} affected, {} cascading, {} risk",
            processing_time_ms,
            matches.affected_count,
            cascading_ids.len(),
            assessment.risk_level
        );

        Ok(IncidentAnalysis {
            analysis_id: Uuid::new_v4(),
            organization_id,
            incident: incident.clone(),
            immediate_actions: immediate_actions(matches.affected_count, assessment.critical_supplier_count),
            long_term_strategies: long_term_strategies(),
            matches,
            cascading_suppliers,
            cascading_exposure,
            assessment,
            alternatives,
            advisory,
            stage_logs,
            processing_time_ms,
            completed_at: Utc::now(),
        })
    }

    /// Single advisory call; errors and empty answers use the canned list
    fn request_advisory(&self, context: &AdvisoryContext) -> Advisory {
        match self.advisory.generate(context) {
            Ok(recommendations) if !recommendations.is_empty() => Advisory {
                source: AdvisorySource::Generated,
                recommendations,
                error: None,
            },
            Ok(_) => {
                debug!("Advisory returned nothing, using fallback");
                Advisory {
                    source: AdvisorySource::Fallback,
                    recommendations: fallback_recommendations(),
                    error: Some("advisory returned no recommendations".to_string()),
                }
            }
            Err(e) => {
                warn!("Advisory generation failed, using fallback: {}", e);
                Advisory {
                    source: AdvisorySource::Fallback,
                    recommendations: fallback_recommendations(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// First-response checklist; escalation leads when High/Critical suppliers are hit
pub fn immediate_actions(affected_count: usize, critical_count: usize) -> Vec<String> {
    let mut actions = vec![
        format!("Contact {} affected suppliers immediately", affected_count),
        "Assess current inventory levels for affected products".to_string(),
        "Activate alternative sourcing plans".to_string(),
    ];
    if critical_count > 0 {
        actions.insert(
            0,
            format!(
                "URGENT: {} critical suppliers affected - escalate to executive team",
                critical_count
            ),
        );
    }
    actions
}

pub fn long_term_strategies() -> Vec<String> {
    [
        "Implement supplier diversification program",
        "Establish strategic inventory reserves",
        "Develop comprehensive business continuity plans",
        "Invest in supply chain visibility technology",
        "Create supplier relationship management program",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
