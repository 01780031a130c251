//! Decibel <-> linear power conversions for backscatter values

use num_traits::Float;

fn ten<T: Float + From<f32>>() -> T {
    <T as From<f32>>::from(10.0)
}

/// Convert a decibel value to natural (linear power) units: `10^(db/10)`
pub fn to_natural<T: Float + From<f32>>(db: T) -> T {
    let ten = ten::<T>();
    ten.powf(db / ten)
}

/// Convert a linear power value to decibels: `10·log10(x)`
///
/// Returns `None` when the value has no defined logarithm (non-positive or not finite).
pub fn to_db<T: Float + From<f32>>(natural: T) -> Option<T> {
    if natural.is_finite() && natural > T::zero() {
        Some(ten::<T>() * natural.log10())
    } else {
        None
    }
}
