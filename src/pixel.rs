// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time state of a single pixel.
//!
//! A pixel is iterated a few rounds at a time and handed back to the
//! frontier between calls, so its orbit has to survive between them:
//! the current `z` and the iteration count travel with the pixel.

use crate::planes::Pixel;
use crate::precise::PreciseComplex;

/// An orbit whose squared modulus exceeds this has escaped.  Once
/// `|z| > 2`, `|z|` grows without bound under `z * z + c` for any `c`
/// in the set's neighborhood.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// What a call to [`PixelState::iterate`] found.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The orbit escaped after this many iterations in total.  The
    /// pixel is finished.
    Escaped(u32),
    /// The orbit is still bounded after this many iterations in total.
    /// The pixel needs more work.
    Pending(u32),
}

/// One pixel's progress through the escape-time recurrence.
#[derive(Clone, Debug)]
pub struct PixelState {
    pixel: Pixel,
    age: u64,
    iterations: u32,
    c: PreciseComplex,
    z: PreciseComplex,
}

impl PixelState {
    /// A freshly discovered pixel at `pixel`, whose origin on the
    /// complex plane is `c`.  `age` is the discovery stamp handed out by
    /// the render that found it.
    pub fn new(pixel: Pixel, age: u64, c: PreciseComplex) -> PixelState {
        let z = PreciseComplex::zero(c.precision());
        PixelState {
            pixel,
            age,
            iterations: 0,
            c,
            z,
        }
    }

    /// Where in the image this pixel lives.
    pub fn pixel(&self) -> Pixel {
        self.pixel
    }

    /// The discovery stamp.  Later discoveries carry larger stamps.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Iterations performed so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// The fixed origin of this pixel's orbit.
    pub fn c(&self) -> &PreciseComplex {
        &self.c
    }

    /// The current point of the orbit.
    pub fn z(&self) -> &PreciseComplex {
        &self.z
    }

    /// Squared modulus of the current iterate, cut down to an `f64`.
    /// Only good enough for colouring.
    pub fn norm_sqr_f64(&self) -> f64 {
        self.z.norm_sqr().to_f64()
    }

    /// Advance the orbit by at most `rounds` steps, stopping early the
    /// moment it escapes.
    pub fn iterate(&mut self, rounds: u32) -> Step {
        for _ in 0..rounds {
            self.z.square_add(&self.c);
            self.iterations += 1;
            if self.z.norm_sqr() > ESCAPE_RADIUS_SQUARED {
                return Step::Escaped(self.iterations);
            }
        }
        Step::Pending(self.iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precise::Precision;

    fn state(re: f64, im: f64) -> PixelState {
        PixelState::new(
            Pixel(0, 0),
            0,
            PreciseComplex::from_f64(re, im, Precision::digits(30)),
        )
    }

    #[test]
    fn origin_never_escapes() {
        let mut p = state(0.0, 0.0);
        assert_eq!(p.iterate(1), Step::Pending(1));
        assert_eq!(p.iterate(1000), Step::Pending(1001));
        assert_eq!(p.iterate(5000), Step::Pending(6001));
        assert_eq!(*p.z(), PreciseComplex::zero(Precision::digits(30)));
    }

    #[test]
    fn three_escapes_on_the_first_round() {
        let mut p = state(3.0, 0.0);
        assert_eq!(p.iterate(1), Step::Escaped(1));
        assert_eq!(p.norm_sqr_f64(), 9.0);
    }

    #[test]
    fn one_escapes_on_the_third_round() {
        // 0 -> 1 -> 2 -> 5; |2|^2 is exactly 4, which is not past the radius.
        let mut p = state(1.0, 0.0);
        assert_eq!(p.iterate(2), Step::Pending(2));
        assert_eq!(p.iterate(10), Step::Escaped(3));
    }

    #[test]
    fn period_two_cycle_stays_bounded() {
        let mut p = state(-1.0, 0.0);
        assert_eq!(p.iterate(500), Step::Pending(500));
    }

    #[test]
    fn zero_rounds_is_a_no_op() {
        let mut p = state(0.3, 0.5);
        assert_eq!(p.iterate(0), Step::Pending(0));
        assert_eq!(p.iterations(), 0);
    }

    #[test]
    fn chunking_does_not_change_the_answer() {
        let mut whole = state(0.26, 0.0);
        let mut pieces = state(0.26, 0.0);
        let expected = whole.iterate(10_000);
        let mut found = Step::Pending(0);
        for _ in 0..1000 {
            found = pieces.iterate(17);
            if let Step::Escaped(_) = found {
                break;
            }
        }
        assert_eq!(found, expected);
        assert!(match expected {
            Step::Escaped(n) => n > 10,
            Step::Pending(_) => false,
        });
    }
}
