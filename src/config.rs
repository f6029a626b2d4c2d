//! Engine configuration
//!
//! One serde-loadable struct carries every tunable of the engine. Missing
//! fields fall back to the defaults, so a config file only needs the values
//! it overrides.

use crate::alternatives::{AlternativeRanker, DEFAULT_TOP_N};
use crate::geo::ImpactRadii;
use crate::risk_scoring::{FinancialModel, RiskScorer, ScoringStrategy};
use crate::supplier_matcher::SupplierMatcher;
use crate::{Result, RiskEngineError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub impact_radii: ImpactRadii,
    pub scoring_strategy: ScoringStrategy,
    pub financial_model: FinancialModel,
    pub alternatives_top_n: usize,
    /// Affected-supplier count that triggers a feed alert on its own
    pub alert_breadth_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            impact_radii: ImpactRadii::default(),
            scoring_strategy: ScoringStrategy::Weighted,
            financial_model: FinancialModel::Flat,
            alternatives_top_n: DEFAULT_TOP_N,
            alert_breadth_threshold: 3,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| RiskEngineError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RiskEngineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.impact_radii
            .validate()
            .map_err(|e| RiskEngineError::Config(e.to_string()))?;

        if self.alternatives_top_n == 0 {
            return Err(RiskEngineError::Config(
                "alternatives_top_n must be at least 1".to_string(),
            ));
        }
        if self.alert_breadth_threshold == 0 {
            return Err(RiskEngineError::Config(
                "alert_breadth_threshold must be at least 1".to_string(),
            ));
        }
        if let FinancialModel::Itemized { avg_order_value } = self.financial_model {
            if !avg_order_value.is_finite() || avg_order_value < 0.0 {
                return Err(RiskEngineError::Config(format!(
                    "avg_order_value must be a non-negative amount, got {}",
                    avg_order_value
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn matcher(&self) -> SupplierMatcher {
        SupplierMatcher::with_radii(self.impact_radii.clone())
    }

    pub fn scorer(&self) -> RiskScorer {
        RiskScorer::with_strategy(self.scoring_strategy, self.financial_model)
    }

    pub fn ranker(&self) -> AlternativeRanker {
        AlternativeRanker::with_top_n(self.alternatives_top_n)
    }

    #[cfg(feature = "live-feeds")]
    pub fn alert_detector(&self) -> crate::alerts::AlertDetector {
        crate::alerts::AlertDetector::with_config(
            crate::live_feed::LiveFeedMatcher::with_radii(self.impact_radii.clone()),
            self.alert_breadth_threshold,
        )
    }
}
