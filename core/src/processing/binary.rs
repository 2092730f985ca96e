use std::f64::consts::TAU;

use crate::interface::{BinaryOrbit, TimingMap};
use crate::prelude::{ResampError, ResampResult};

const KEPLER_TOL: f64 = 1e-12;
const KEPLER_MAX_ITER: usize = 100;

/// Orbit state at one barycentric arrival time.
#[derive(Debug, Clone, Copy)]
struct OrbitDelay {
    /// Light-travel delay across the orbit, `t_ssb - t_source` (s).
    delay: f64,
    /// `d(delay) / dt_source`.
    delay_rate: f64,
}

/// Solves for the eccentric anomaly at a barycentric arrival time given as
/// seconds since periapsis, including the orbital light-travel delay on the
/// left-hand side of Kepler's equation.
fn orbit_delay(orbit: &BinaryOrbit, since_tp: f64) -> ResampResult<OrbitDelay> {
    let omega = TAU / orbit.period;
    let ecc = orbit.ecc;
    let beta = (1.0 - ecc * ecc).sqrt();
    let (sin_w, cos_w) = orbit.argp.sin_cos();
    let a_omega = orbit.asini * omega;

    let mut frac_orb = (since_tp / orbit.period).fract();
    if frac_orb < 0.0 {
        frac_orb += 1.0;
    }
    let mean_anomaly = TAU * frac_orb;

    let eval = |e_anom: f64| {
        let (sin_e, cos_e) = e_anom.sin_cos();
        let value = e_anom - ecc * sin_e
            + a_omega * (sin_w * (cos_e - ecc) + cos_w * beta * sin_e)
            - mean_anomaly;
        let slope = 1.0 - ecc * cos_e + a_omega * (cos_w * beta * cos_e - sin_w * sin_e);
        (value, slope)
    };

    // the periodic part is bounded, so this brackets every root
    let bound = ecc + a_omega * (2.0 + ecc) + 1.0;
    let (mut lo, mut hi) = (mean_anomaly - bound, mean_anomaly + bound);
    let mut e_anom = mean_anomaly;
    let mut solved = None;
    for _ in 0..KEPLER_MAX_ITER {
        let (value, slope) = eval(e_anom);
        if value.abs() <= KEPLER_TOL || hi - lo <= KEPLER_TOL {
            solved = Some(e_anom);
            break;
        }
        if value < 0.0 {
            lo = e_anom;
        } else {
            hi = e_anom;
        }
        let newton = e_anom - value / slope;
        e_anom = if slope > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }
    let e_anom = solved.ok_or_else(|| {
        ResampError::Internal(format!(
            "Kepler solver did not converge at tp + {} s (asini {}, period {}, ecc {})",
            since_tp, orbit.asini, orbit.period, ecc
        ))
    })?;

    let (sin_e, cos_e) = e_anom.sin_cos();
    let delay = orbit.asini * (sin_w * (cos_e - ecc) + cos_w * beta * sin_e);
    let delay_rate = a_omega * (cos_w * beta * cos_e - sin_w * sin_e) / (1.0 - ecc * cos_e);

    Ok(OrbitDelay { delay, delay_rate })
}

/// Adds the binary-orbit correction to one detector's sky-only timing.
pub fn add_binary_timing(sky: &TimingMap, orbit: &BinaryOrbit) -> ResampResult<TimingMap> {
    if !orbit.is_binary() {
        return Ok(sky.clone());
    }
    orbit.validate()?;

    let mut delta_t = Vec::with_capacity(sky.len());
    let mut tdot = Vec::with_capacity(sky.len());
    for (j, (&dt, &td)) in sky.delta_t.iter().zip(&sky.tdot).enumerate() {
        let state = orbit_delay(orbit, (sky.ref_time - orbit.tp) + dt)?;
        let stretch = 1.0 + state.delay_rate;
        if !(stretch > 0.0) {
            return Err(ResampError::Internal(format!(
                "segment {}: orbital velocity exceeds the speed of light",
                j
            )));
        }
        delta_t.push(dt - state.delay);
        tdot.push(td / stretch);
    }

    Ok(TimingMap::new(sky.ref_time, delta_t, tdot))
}

pub fn add_multi_binary_timing(
    sky: &[TimingMap],
    orbit: &BinaryOrbit,
) -> ResampResult<Vec<TimingMap>> {
    sky.iter()
        .map(|timing| add_binary_timing(timing, orbit))
        .collect()
}
