use num_traits::Float;

/// Exponential moving average step: `alpha * next + (1 - alpha) * prev`
#[inline]
pub fn ema<F: Float>(alpha: F, next: F, prev: F) -> F {
    alpha * next + (F::one() - alpha) * prev
}

/// Linear interpolation from `b` (at `t = 0`) to `a` (at `t = 1`)
#[inline]
pub fn lerp<F: Float>(t: F, a: F, b: F) -> F {
    a * t + b * (F::one() - t)
}

/// Fractional distance across the frame measured from the right edge:
/// 0 at the right hand side, 1 at the left.
#[inline]
pub fn fraction_from_right<F: Float>(x: F, width: F) -> F {
    (width - x) / width
}
