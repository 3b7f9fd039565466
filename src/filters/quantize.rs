//! Lossy precision reduction for floating point variables.
//!
//! With `least_significant_digit = d` values are rounded to the nearest
//! multiple of `2^-b` where `b = ceil(log2(10^d))`, so that the error stays
//! below `10^-d` and the low mantissa bits become zero (which compresses well).

use crate::types::Element;

/// Multiplier used to round values to `least_significant_digit` decimals.
pub fn scale(least_significant_digit: i32) -> f64 {
    let bits = (10f64.powi(least_significant_digit)).log2().ceil();
    2f64.powf(bits)
}

pub fn quantize<T: Element>(values: &mut [T], least_significant_digit: i32) {
    let scale = scale(least_significant_digit);

    for v in values {
        *v = v.quantize(scale);
    }
}
