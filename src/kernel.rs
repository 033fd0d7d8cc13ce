// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel.  Given a point on the complex plane,
//! iterate z -> z² + c until the orbit leaves a disc or the counter
//! runs out, and report how much of the counter was left.  That
//! remainder is the "depth" the rest of the crate stores as a pixel.
//!
//! The arithmetic is written out on the real and imaginary parts
//! rather than through `Complex` multiplication so that every
//! intermediate is rounded in exactly the same order each time;
//! points along the boundary of the set are sensitive to the last
//! bit.

use num::Complex;

use crate::error::FractalError;

/// The squared magnitude at which an orbit counts as escaped.
pub const ESCAPE_THRESHOLD: f64 = 5.0;

/// The starting value of the depth counter.  It has to fit in the
/// pixel after the first decrement, so it is capped at 256.
pub const ITERATION_CAP: u32 = 256;

/// The knobs of the kernel.  Read-only for the life of a job.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscapeParams {
    threshold: f64,
    cap: u32,
}

impl Default for EscapeParams {
    fn default() -> Self {
        EscapeParams {
            threshold: ESCAPE_THRESHOLD,
            cap: ITERATION_CAP,
        }
    }
}

impl EscapeParams {
    /// The cap must be in `1..=256` so the remaining count always
    /// fits in a byte, and the threshold must be a positive, finite
    /// squared radius.
    pub fn new(threshold: f64, cap: u32) -> Result<Self, FractalError> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(FractalError::EscapeParams(format!(
                "threshold {} is not a positive finite number",
                threshold
            )));
        }
        if cap == 0 || cap > ITERATION_CAP {
            return Err(FractalError::EscapeParams(format!(
                "iteration cap {} is outside 1..={}",
                cap, ITERATION_CAP
            )));
        }
        Ok(EscapeParams { threshold, cap })
    }

    /// Squared escape radius.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Starting depth.
    pub fn cap(&self) -> u32 {
        self.cap
    }
}

/// Run the orbit of `c`.  Returns what was left of the counter when
/// the orbit escaped, or 0 if it never did.  Points that escape on
/// the first step come back as `cap - 1`.
#[inline]
pub fn depth(c: Complex<f64>, params: &EscapeParams) -> u8 {
    let (cx, cy) = (c.re, c.im);
    let mut x = cx;
    let mut y = cy;
    let mut depth = params.cap;
    loop {
        let x2 = x * x;
        let y2 = y * y;
        y = 2.0 * x * y + cy;
        x = x2 - y2 + cx;
        depth -= 1;
        if depth == 0 || x2 + y2 >= params.threshold {
            break;
        }
    }
    depth as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(depth(Complex::new(0.0, 0.0), &EscapeParams::default()), 0);
    }

    #[test]
    fn far_points_escape_immediately() {
        let params = EscapeParams::default();
        assert_eq!(depth(Complex::new(10.0, 10.0), &params), 255);
        assert_eq!(depth(Complex::new(-3.0, 0.0), &params), 255);
    }

    #[test]
    fn escape_after_a_few_steps() {
        // c = 1: orbit 1, 2, 5; the test sees |z|² = 1, then 4, then 25.
        assert_eq!(depth(Complex::new(1.0, 0.0), &EscapeParams::default()), 253);
    }

    #[test]
    fn interior_point_exhausts_the_counter() {
        // -1 lives on the period-two cycle -1, 0, -1, ...
        assert_eq!(depth(Complex::new(-1.0, 0.0), &EscapeParams::default()), 0);
    }

    #[test]
    fn smaller_cap_is_respected() {
        let params = EscapeParams::new(ESCAPE_THRESHOLD, 16).unwrap();
        assert_eq!(depth(Complex::new(0.0, 0.0), &params), 0);
        assert_eq!(depth(Complex::new(10.0, 0.0), &params), 15);
    }

    #[test]
    fn depth_is_bounded_across_the_plane() {
        let params = EscapeParams::default();
        let mut seen_inside = false;
        let mut seen_outside = false;
        for i in 0..81 {
            for j in 0..81 {
                let c = Complex::new(-2.5 + i as f64 * 0.05, -2.0 + j as f64 * 0.05);
                let d = u32::from(depth(c, &params));
                assert!(d < ITERATION_CAP);
                seen_inside |= d == 0;
                seen_outside |= d > 0;
            }
        }
        assert!(seen_inside && seen_outside);
    }

    #[test]
    fn rejects_unusable_params() {
        assert!(EscapeParams::new(5.0, 0).is_err());
        assert!(EscapeParams::new(5.0, 257).is_err());
        assert!(EscapeParams::new(0.0, 256).is_err());
        assert!(EscapeParams::new(std::f64::NAN, 256).is_err());
        assert!(EscapeParams::new(4.0, 256).is_ok());
    }
}
