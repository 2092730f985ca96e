use crate::prelude::{ResampError, ResampResult};
use crate::processing::scratch;

/// Natural cubic spline through uniformly spaced samples.
///
/// Built and dropped inside a single resampling call; evaluation outside
/// `[t0, t0 + (n-1) * dt]` extends the end polynomials, so callers clamp
/// their abscissae first.
pub struct UniformSpline<'a> {
    t0: f64,
    dt: f64,
    values: &'a [f64],
    second: Vec<f64>,
}

impl<'a> UniformSpline<'a> {
    pub fn natural(t0: f64, dt: f64, values: &'a [f64]) -> ResampResult<Self> {
        if values.is_empty() {
            return Err(ResampError::InvalidArgument(
                "cannot interpolate an empty series".into(),
            ));
        }
        if !(dt > 0.0) {
            return Err(ResampError::InvalidArgument(format!(
                "spline node spacing must be positive, got {}",
                dt
            )));
        }

        let n = values.len();
        let mut second = scratch::zeroed::<f64>(n, "spline coefficients")?;
        if n > 2 {
            // tridiagonal system M[i-1] + 4 M[i] + M[i+1] = 6 (y[i+1] - 2 y[i] + y[i-1]) / dt^2
            // with M[0] = M[n-1] = 0, solved by forward elimination
            let interior = n - 2;
            let mut diag = scratch::zeroed::<f64>(interior, "spline elimination")?;
            let scale = 6.0 / (dt * dt);
            for i in 0..interior {
                let rhs = scale * (values[i + 2] - 2.0 * values[i + 1] + values[i]);
                if i == 0 {
                    diag[i] = 4.0;
                    second[i + 1] = rhs;
                } else {
                    let factor = 1.0 / diag[i - 1];
                    diag[i] = 4.0 - factor;
                    second[i + 1] = rhs - factor * second[i];
                }
            }
            second[interior] /= diag[interior - 1];
            for i in (0..interior - 1).rev() {
                second[i + 1] = (second[i + 1] - second[i + 2]) / diag[i];
            }
        }

        Ok(Self {
            t0,
            dt,
            values,
            second,
        })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.values.len();
        if n == 1 {
            return self.values[0];
        }
        let x = (t - self.t0) / self.dt;
        let i = (x.floor().max(0.0) as usize).min(n - 2);
        let u = x - i as f64;
        let v = 1.0 - u;
        let linear = v * self.values[i] + u * self.values[i + 1];
        let curvature = (v * v * v - v) * self.second[i] + (u * u * u - u) * self.second[i + 1];
        linear + curvature * self.dt * self.dt / 6.0
    }
}
