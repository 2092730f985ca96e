use serde::{Deserialize, Serialize};

use crate::prelude::{ResampError, ResampResult};

/// Equatorial sky position in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    pub alpha: f64,
    pub delta: f64,
}

impl SkyPosition {
    pub fn new(alpha: f64, delta: f64) -> Self {
        Self { alpha, delta }
    }
}

/// Keplerian orbital elements of a source in a binary system.
///
/// `asini` is the projected semi-major axis in light-seconds; a value of zero
/// means the source is isolated and the remaining fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryOrbit {
    pub asini: f64,
    pub period: f64,
    pub ecc: f64,
    /// Time of periapsis passage (GPS seconds).
    pub tp: f64,
    /// Argument of periapsis (radians).
    pub argp: f64,
}

impl BinaryOrbit {
    pub fn isolated() -> Self {
        Self::default()
    }

    pub fn is_binary(&self) -> bool {
        self.asini > 0.0
    }

    pub fn validate(&self) -> ResampResult<()> {
        if !self.asini.is_finite() || self.asini < 0.0 {
            return Err(ResampError::InvalidArgument(format!(
                "projected semi-major axis must be finite and non-negative, got {}",
                self.asini
            )));
        }
        if !self.is_binary() {
            return Ok(());
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(ResampError::InvalidArgument(format!(
                "orbital period must be positive, got {}",
                self.period
            )));
        }
        if !self.ecc.is_finite() || !(0.0..1.0).contains(&self.ecc) {
            return Err(ResampError::InvalidArgument(format!(
                "eccentricity must lie in [0, 1), got {}",
                self.ecc
            )));
        }
        if !self.tp.is_finite() || !self.argp.is_finite() {
            return Err(ResampError::InvalidArgument(
                "periapsis time and argument must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Full phase-evolution parameters of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPoint {
    pub sky: SkyPosition,
    /// Reference time for `fkdot` and the source-frame timing (GPS seconds).
    pub ref_time: f64,
    /// Frequency and its derivatives at `ref_time`: `[f, fdot, fddot, ...]`.
    /// The first entry is the lowest frequency of the requested band.
    pub fkdot: Vec<f64>,
    #[serde(default)]
    pub binary: BinaryOrbit,
}

impl SearchPoint {
    pub fn new(sky: SkyPosition, ref_time: f64, fkdot: Vec<f64>) -> Self {
        Self {
            sky,
            ref_time,
            fkdot,
            binary: BinaryOrbit::isolated(),
        }
    }

    pub fn with_binary(mut self, binary: BinaryOrbit) -> Self {
        self.binary = binary;
        self
    }

    pub fn freq(&self) -> f64 {
        self.fkdot.first().copied().unwrap_or(0.0)
    }

    pub fn has_spindown(&self) -> bool {
        self.fkdot.iter().skip(1).any(|&f| f != 0.0)
    }

    pub fn validate(&self) -> ResampResult<()> {
        if self.fkdot.is_empty() {
            return Err(ResampError::InvalidArgument(
                "search point carries no frequency".into(),
            ));
        }
        if self.fkdot.iter().any(|f| !f.is_finite()) {
            return Err(ResampError::InvalidArgument(
                "frequency derivatives must be finite".into(),
            ));
        }
        if !self.sky.alpha.is_finite() || !self.sky.delta.is_finite() || !self.ref_time.is_finite()
        {
            return Err(ResampError::InvalidArgument(
                "sky position and reference time must be finite".into(),
            ));
        }
        self.binary.validate()
    }
}
