// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Arbitrary-precision complex numbers.
//!
//! At deep zoom a single pixel spans a distance far smaller than the
//! gap between two adjacent `f64` values, and every pixel in a
//! neighborhood collapses onto the same point.  To keep neighboring
//! pixels distinct we carry the real and imaginary parts in `rug`
//! floats whose width grows with the zoom depth.  Every value carries
//! the precision context it was built under, and every operation
//! rounds its result to that context.

use crate::errors::{RenderError, Result};
use rug::{Complex, Float};

/// Significant decimal digits never drop below this, no matter how
/// wide the view.
pub const PRECISION_FLOOR: u32 = 20;

/// Digits carried beyond what the zoom depth strictly demands, so that
/// accumulated rounding stays below one pixel.
pub const PRECISION_MARGIN: u32 = 8;

// log2(10): mantissa bits per significant decimal digit.
const BITS_PER_DIGIT: f64 = 3.321_928_094_887_362;

/// A precision context, measured in significant decimal digits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precision(u32);

impl Precision {
    /// A context carrying at least `digits` significant digits.
    /// Requests below the floor are clamped up to it.
    pub fn digits(digits: u32) -> Precision {
        Precision(digits.max(PRECISION_FLOOR))
    }

    /// The context needed to resolve individual pixels of a view whose
    /// side length is `side`: roughly `-log2(side)` plus a margin.
    ///
    /// A float is stored as `m * 2^exp` with `m` in `[0.5, 1)`, so
    /// `1 - exp` is the ceiling of `-log2(side)`.  Shrinking the side
    /// can only lower the exponent, which is what keeps the precision
    /// monotonic as we zoom in.
    pub fn for_side(side: &Float) -> Precision {
        let depth = match side.get_exp() {
            Some(exp) => 1 - i64::from(exp),
            None => 0,
        };
        let wanted = depth + i64::from(PRECISION_MARGIN);
        let wanted = wanted.max(0).min(i64::from(u32::max_value() / 4));
        Precision::digits(wanted as u32)
    }

    /// Number of significant decimal digits in this context.
    pub fn significant_digits(self) -> u32 {
        self.0
    }

    /// Mantissa width, in bits, that holds this many decimal digits.
    pub fn bits(self) -> u32 {
        (f64::from(self.0) * BITS_PER_DIGIT).ceil() as u32
    }

    /// Round `value` into this context.
    pub fn float(self, value: &Float) -> Float {
        Float::with_val(self.bits(), value)
    }
}

/// A complex number carried under a fixed precision context.
#[derive(Clone, Debug, PartialEq)]
pub struct PreciseComplex {
    value: Complex,
    precision: Precision,
}

impl PreciseComplex {
    /// Build from real and imaginary parts, rounding both into `precision`.
    pub fn new(re: &Float, im: &Float, precision: Precision) -> PreciseComplex {
        PreciseComplex {
            value: Complex::with_val(precision.bits(), (re, im)),
            precision,
        }
    }

    /// Zero, under the given context.
    pub fn zero(precision: Precision) -> PreciseComplex {
        PreciseComplex {
            value: Complex::new(precision.bits()),
            precision,
        }
    }

    /// Convenience constructor for values that fit in an `f64`.
    pub fn from_f64(re: f64, im: f64, precision: Precision) -> PreciseComplex {
        PreciseComplex {
            value: Complex::with_val(precision.bits(), (re, im)),
            precision,
        }
    }

    /// Read both parts from decimal strings, without passing through
    /// `f64`, so that deep coordinates survive intact.
    pub fn parse(re: &str, im: &str, precision: Precision) -> Result<PreciseComplex> {
        let re = parse_float(re, precision)?;
        let im = parse_float(im, precision)?;
        Ok(PreciseComplex::new(&re, &im, precision))
    }

    /// The context this value is rounded to.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Real part.
    pub fn re(&self) -> &Float {
        self.value.real()
    }

    /// Imaginary part.
    pub fn im(&self) -> &Float {
        self.value.imag()
    }

    /// `self + other`, rounded to this value's context.
    pub fn add(&self, other: &PreciseComplex) -> PreciseComplex {
        self.with(Complex::with_val(self.precision.bits(), &self.value + &other.value))
    }

    /// `self - other`, rounded to this value's context.
    pub fn sub(&self, other: &PreciseComplex) -> PreciseComplex {
        self.with(Complex::with_val(self.precision.bits(), &self.value - &other.value))
    }

    /// `self * other`, rounded to this value's context.
    pub fn mul(&self, other: &PreciseComplex) -> PreciseComplex {
        self.with(Complex::with_val(self.precision.bits(), &self.value * &other.value))
    }

    /// `re^2 + im^2`.  Comparing this against the square of the escape
    /// radius saves a square root on every iteration.
    pub fn norm_sqr(&self) -> Float {
        Float::with_val(self.precision.bits(), self.value.norm_ref())
    }

    /// Replace `self` with `self * self + c` in place.  This is the
    /// whole of the Mandelbrot recurrence, and runs without allocating.
    pub fn square_add(&mut self, c: &PreciseComplex) {
        self.value.square_mut();
        self.value += &c.value;
    }

    /// The same number, re-rounded into another context.
    pub fn with_precision(&self, precision: Precision) -> PreciseComplex {
        PreciseComplex {
            value: Complex::with_val(precision.bits(), &self.value),
            precision,
        }
    }

    fn with(&self, value: Complex) -> PreciseComplex {
        PreciseComplex {
            value,
            precision: self.precision,
        }
    }
}

/// Parse a decimal string straight into a float of the given context.
pub fn parse_float(s: &str, precision: Precision) -> Result<Float> {
    match Float::parse(s.trim()) {
        Ok(parsed) => Ok(Float::with_val(precision.bits(), parsed)),
        Err(_) => Err(RenderError::BadCoordinate(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Precision {
        Precision::digits(30)
    }

    #[test]
    fn arithmetic_matches_hand_results() {
        let a = PreciseComplex::from_f64(1.0, 2.0, ctx());
        let b = PreciseComplex::from_f64(3.0, -1.0, ctx());
        assert_eq!(a.add(&b), PreciseComplex::from_f64(4.0, 1.0, ctx()));
        assert_eq!(a.sub(&b), PreciseComplex::from_f64(-2.0, 3.0, ctx()));
        // (1 + 2i)(3 - i) = 3 - i + 6i + 2 = 5 + 5i
        assert_eq!(a.mul(&b), PreciseComplex::from_f64(5.0, 5.0, ctx()));
    }

    #[test]
    fn norm_sqr_is_squared_modulus() {
        let z = PreciseComplex::from_f64(3.0, 4.0, ctx());
        assert_eq!(z.norm_sqr(), 25.0);
    }

    #[test]
    fn square_add_is_the_mandelbrot_step() {
        let c = PreciseComplex::from_f64(0.25, -0.5, ctx());
        let mut z = PreciseComplex::from_f64(1.0, 1.0, ctx());
        let expected = z.mul(&z).add(&c);
        z.square_add(&c);
        assert_eq!(z, expected);
    }

    #[test]
    fn precision_is_clamped_to_floor() {
        assert_eq!(Precision::digits(3).significant_digits(), PRECISION_FLOOR);
        let wide = Float::with_val(64, 1_000_000);
        assert_eq!(Precision::for_side(&wide).significant_digits(), PRECISION_FLOOR);
    }

    #[test]
    fn precision_never_drops_when_side_halves() {
        let mut side = Float::with_val(64, 4);
        let mut last = Precision::for_side(&side);
        for _ in 0..300 {
            side >>= 1u32;
            let next = Precision::for_side(&side);
            assert!(next >= last, "{:?} < {:?} at side {}", next, last, side);
            last = next;
        }
        assert!(last.significant_digits() > 300);
    }

    #[test]
    fn bits_cover_digits() {
        let p = Precision::digits(100);
        assert!(p.bits() >= 332);
    }

    #[test]
    fn deep_coordinates_stay_distinct() {
        let mut side = Float::with_val(64, 1);
        side >>= 200u32;
        let p = Precision::for_side(&side);
        let a = PreciseComplex::parse("-0.75", "0.1", p).unwrap();
        let offset = PreciseComplex::new(&side, &Float::new(p.bits()), p);
        let b = a.add(&offset);
        assert_ne!(a, b);
        assert_eq!(b.sub(&a), offset);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(PreciseComplex::parse("1.5", "nope", ctx()).is_err());
        assert!(PreciseComplex::parse("-1.5e-3", " 2 ", ctx()).is_ok());
    }
}
