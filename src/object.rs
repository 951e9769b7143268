use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};

use crate::tle::ElementSet;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("invalid element set: {0}")]
    InvalidElements(String),

    #[error("propagation failed: {0}")]
    Propagation(String),
}

/// Sub-satellite point at a given instant.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GeodeticPosition {
    pub time: DateTime<Utc>,
    /// Geodetic latitude in deg (-90° to +90°)
    pub latitude_degrees: f64,
    /// Geodetic longitude in deg (-180° to +180°)
    pub longitude_degrees: f64,
    /// Height above the WGS84 ellipsoid in km
    pub elevation_km: f64,
}

#[derive(Clone, Debug)]
pub struct Object {
    name: String,
    norad_id: u64,

    epoch: DateTime<Utc>,
    mean_motion: f64,

    constants: sgp4::Constants,
}

impl Object {
    pub fn from_element_set(element_set: &ElementSet) -> Result<Self, CalcError> {
        debug!(name = %element_set.name, "satellite name");
        debug!(line1 = %element_set.line1, "TLE line 1");
        debug!(line2 = %element_set.line2, "TLE line 2");

        let elements = sgp4::Elements::from_tle(
            Some(element_set.name.clone()),
            element_set.line1.as_bytes(),
            element_set.line2.as_bytes(),
        )
        .map_err(|e| CalcError::InvalidElements(e.to_string()))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| CalcError::InvalidElements(e.to_string()))?;

        Ok(Self {
            name: element_set.name.clone(),
            norad_id: elements.norad_id,
            epoch: DateTime::from_naive_utc_and_offset(elements.datetime, Utc),
            mean_motion: elements.mean_motion,
            constants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u64 {
        self.norad_id
    }

    /// The UTC timestamp of the elements
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn orbital_period(&self) -> chrono::Duration {
        const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;
        chrono::Duration::seconds((SECONDS_PER_DAY / self.mean_motion) as i64)
    }

    pub fn predict(&self, time: DateTime<Utc>) -> Result<GeodeticPosition, CalcError> {
        let minutes_since_epoch = (time - self.epoch).num_milliseconds() as f64 / 60_000.0;

        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))
            .map_err(|e| CalcError::Propagation(e.to_string()))?;

        let gmst = gmst_from_julian_days(julian_days_from_utc(time));
        let [lat, lon, alt] = ecef_to_lat_lon_alt(teme_to_ecef(prediction.position, gmst));

        debug_assert!((-90.0..=90.0).contains(&lat), "latitude out of range");
        debug_assert!((-180.0..=180.0).contains(&lon), "longitude out of range");

        Ok(GeodeticPosition {
            time,
            latitude_degrees: lat,
            longitude_degrees: lon,
            elevation_km: alt,
        })
    }
}

/// Computes the sub-satellite point of `element_set` at `time`.
pub fn locate(element_set: &ElementSet, time: DateTime<Utc>) -> Result<GeodeticPosition, CalcError> {
    let result = Object::from_element_set(element_set).and_then(|object| {
        debug!(
            norad_id = object.norad_id(),
            epoch = %object.epoch(),
            period_min = object.orbital_period().num_minutes(),
            "propagating {}",
            object.name()
        );
        object.predict(time)
    });

    match &result {
        Ok(position) => debug!(
            latitude = position.latitude_degrees,
            longitude = position.longitude_degrees,
            elevation_km = position.elevation_km,
            "satellite position"
        ),
        Err(err) => error!("Error calculating satellite position: {err}"),
    }
    result
}

/// Julian date of a UTC instant, counted from the Unix epoch (JD 2440587.5).
fn julian_days_from_utc(datetime: DateTime<Utc>) -> f64 {
    const UNIX_EPOCH_JD: f64 = 2440587.5;
    const MILLIS_PER_DAY: f64 = 86_400_000.0;

    UNIX_EPOCH_JD + datetime.timestamp_millis() as f64 / MILLIS_PER_DAY
}

/// IAU-82 Greenwich mean sidereal time in rad, within [0, 2π).
fn gmst_from_julian_days(julian_days: f64) -> f64 {
    const J2000: f64 = 2451545.0;
    const DAYS_PER_CENTURY: f64 = 36525.0;
    const SECONDS_PER_DAY: f64 = 86400.0;

    let centuries = (julian_days - J2000) / DAYS_PER_CENTURY;
    let seconds = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * centuries
        + 0.093104 * centuries * centuries
        - 6.2e-6 * centuries * centuries * centuries;

    (seconds / SECONDS_PER_DAY * 2.0 * PI).rem_euclid(2.0 * PI)
}

/// TEME → ECEF: rotation about z by -GMST. Polar motion is ignored.
fn teme_to_ecef([x, y, z]: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin, cos) = gmst.sin_cos();
    [x * cos + y * sin, y * cos - x * sin, z]
}

/// Converts an ECEF position vector (km) into WGS84 geodetic `[latitude, longitude, altitude]`
/// in deg, deg and km.
fn ecef_to_lat_lon_alt(position: [f64; 3]) -> [f64; 3] {
    const A: f64 = 6378.137; // WGS84 Earth semi-major axis (km)
    const F: f64 = 1.0 / 298.257223563; // Flattening
    const B: f64 = A * (1.0 - F); // Semi-minor axis (km)

    let [x, y, z] = position;

    let longitude = y.atan2(x).to_degrees();

    // Bowring's approximation
    let e2 = 1.0 - (B * B) / (A * A);
    let ep2 = (A * A) / (B * B) - 1.0;
    let p = (x.powi(2) + y.powi(2)).sqrt();
    let theta = (z * A).atan2(p * B);
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();
    let latitude = (z + ep2 * B * sin_theta.powi(3))
        .atan2(p - e2 * A * cos_theta.powi(3))
        .to_degrees();

    let n = A / (1.0 - e2 * latitude.to_radians().sin().powi(2)).sqrt();
    let altitude = p / latitude.to_radians().cos() - n;

    [latitude, longitude, altitude]
}
