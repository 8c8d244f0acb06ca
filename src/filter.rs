//! Median-of-three outlier rejection.
//!
//! A single spurious echo timeout or glitch among three successive
//! measurements is discarded by taking the middle value. If two of the
//! three are invalid (0), the median is pulled to 0 — accepted, since
//! the drive loop treats 0 as a close obstacle anyway.

/// Closed-form median of three values:
/// `max(min(a, b), min(max(a, b), c))`.
///
/// Holds for every permutation of the inputs, including ties and the
/// out-of-range sentinel (0).
pub fn median_of_three(a: f32, b: f32, c: f32) -> f32 {
    f32::max(f32::min(a, b), f32::min(f32::max(a, b), c))
}
