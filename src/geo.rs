//! Geodesic distance on the WGS-84 ellipsoid.
//!
//! Distances come from Karney's inverse geodesic solution (`geographiclib-rs`),
//! which converges for every pair of points including antipodal ones. The only
//! failures are non-finite values and latitudes outside [-90, 90].
use geographiclib_rs::{Geodesic, InverseGeodesic};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WGS84: Lazy<Geodesic> = Lazy::new(Geodesic::wgs84);

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NonFinite(*self));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::LatitudeOutOfRange(self.latitude));
        }
        Ok(())
    }
}

/// The home base every distance is measured from.
///
/// Built once from configuration and handed to the responder; never modified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint(Coordinates);

impl ReferencePoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(Coordinates::new(latitude, longitude))
    }

    pub fn coordinates(&self) -> Coordinates {
        self.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("coordinate is not a finite number: {0:?}")]
    NonFinite(Coordinates),

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
}

/// Surface distance in meters between the reference point and `point`.
pub fn distance(reference: &ReferencePoint, point: Coordinates) -> Result<f64, GeoError> {
    geodesic_distance(reference.coordinates(), point)
}

/// Surface distance in meters between two points on the WGS-84 ellipsoid.
pub fn geodesic_distance(from: Coordinates, to: Coordinates) -> Result<f64, GeoError> {
    from.validate()?;
    to.validate()?;

    let meters: f64 = WGS84.inverse(from.latitude, from.longitude, to.latitude, to.longitude);
    Ok(meters)
}
