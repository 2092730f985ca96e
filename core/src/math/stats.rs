use num_complex::Complex32;

use crate::interface::AntennaNormalization;

pub struct StatsHelper;

impl StatsHelper {
    /// Detection statistic 2F from the amplitude pair and the antenna
    /// quadratic form. Non-negative whenever `D > 0`.
    pub fn two_f(fa: Complex32, fb: Complex32, norm: &AntennaNormalization) -> f32 {
        let d_inv = 1.0 / norm.d;
        let f = d_inv
            * (norm.b * fa.norm_sqr() + norm.a * fb.norm_sqr()
                - 2.0 * norm.c * (fa.re * fb.re + fa.im * fb.im)
                - 2.0 * norm.e * (-fa.re * fb.im + fa.im * fb.re));
        2.0 * f
    }
}
