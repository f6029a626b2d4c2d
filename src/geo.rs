//! Geographic primitives for incident proximity matching
//!
//! Provides the Haversine great-circle distance and the event-type specific
//! impact radius table used to decide whether a supplier sits inside the
//! footprint of a disruption.

use crate::{IncidentType, Result, RiskEngineError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius applied when no table entry exists for a disruption kind
pub const DEFAULT_IMPACT_RADIUS_KM: f64 = 100.0;

/// Great-circle distance in kilometres between two lat/lon points.
///
/// Inputs are decimal degrees. Ranges are not checked here: validate with
/// [`GeoPoint::new`] before calling if the data comes from an untrusted
/// source. The result is symmetric and exactly zero for identical points.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` past 1.0 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Create a point without range checks
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and within range
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RiskEngineError::InvalidCoordinates(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RiskEngineError::InvalidCoordinates(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Distance to another point in kilometres
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Disruption classes that carry their own impact radius
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DisruptionKind {
    NaturalDisaster,
    WeatherEvent,
    LaborDispute,
    IndustrialAccident,
    LogisticsDisruption,
    Other,
}

impl std::fmt::Display for DisruptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisruptionKind::NaturalDisaster => write!(f, "NATURAL_DISASTER"),
            DisruptionKind::WeatherEvent => write!(f, "WEATHER_EVENT"),
            DisruptionKind::LaborDispute => write!(f, "LABOR_DISPUTE"),
            DisruptionKind::IndustrialAccident => write!(f, "INDUSTRIAL_ACCIDENT"),
            DisruptionKind::LogisticsDisruption => write!(f, "LOGISTICS_DISRUPTION"),
            DisruptionKind::Other => write!(f, "OTHER"),
        }
    }
}

impl From<IncidentType> for DisruptionKind {
    fn from(event_type: IncidentType) -> Self {
        match event_type {
            IncidentType::NaturalDisaster => DisruptionKind::NaturalDisaster,
            IncidentType::LaborStrike => DisruptionKind::LaborDispute,
            IncidentType::Logistics => DisruptionKind::LogisticsDisruption,
            _ => DisruptionKind::Other,
        }
    }
}

/// Impact radius lookup by disruption kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactRadii {
    radii: HashMap<DisruptionKind, f64>,
    default_radius_km: f64,
}

impl ImpactRadii {
    /// Create the standard radius table
    pub fn new() -> Self {
        let mut table = Self {
            radii: HashMap::new(),
            default_radius_km: DEFAULT_IMPACT_RADIUS_KM,
        };
        table.load_default_radii();
        table
    }

    fn load_default_radii(&mut self) {
        self.radii.insert(DisruptionKind::NaturalDisaster, 500.0);
        self.radii.insert(DisruptionKind::WeatherEvent, 300.0);
        self.radii.insert(DisruptionKind::LaborDispute, 50.0);
        self.radii.insert(DisruptionKind::IndustrialAccident, 100.0);
        self.radii.insert(DisruptionKind::LogisticsDisruption, 200.0);
    }

    /// Override the radius for one disruption kind
    pub fn set_radius(&mut self, kind: DisruptionKind, radius_km: f64) -> Result<()> {
        validate_radius(radius_km)?;
        self.radii.insert(kind, radius_km);
        Ok(())
    }

    /// Radius for a kind, falling back to the default radius
    pub fn radius_for(&self, kind: DisruptionKind) -> f64 {
        self.radii
            .get(&kind)
            .copied()
            .unwrap_or(self.default_radius_km)
    }

    /// Radius used when a kind has no entry
    pub fn default_radius(&self) -> f64 {
        self.default_radius_km
    }

    /// Check every configured radius is positive and finite
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.default_radius_km)?;
        for radius in self.radii.values() {
            validate_radius(*radius)?;
        }
        Ok(())
    }
}

impl Default for ImpactRadii {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_radius(radius_km: f64) -> Result<()> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(())
    } else {
        Err(RiskEngineError::InvalidRadius(format!(
            "radius must be a positive number of kilometres, got {}",
            radius_km
        )))
    }
}
