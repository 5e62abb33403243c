// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the View struct, which describes a relationship between a
//! rectangle on the integral plane with an origin at 0,0 (the image),
//! and a square window on the complex plane, anchored at its
//! left-upper corner.  Maps pixels to points, and maps a selection of
//! pixels to a new, deeper window.

use crate::errors::{RenderError, Result};
use crate::precise::{parse_float, PreciseComplex, Precision};
use rug::Float;

/// Describes the x, y of a pixel in the image.  The origin is the
/// left-upper corner; y grows downward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

impl Pixel {
    /// The (up to four) grid-adjacent pixels that fall inside a
    /// `width` by `height` image.
    pub fn neighbours(self, width: usize, height: usize) -> impl Iterator<Item = Pixel> {
        let Pixel(x, y) = self;
        let candidates = [
            if x > 0 { Some(Pixel(x - 1, y)) } else { None },
            if x + 1 < width { Some(Pixel(x + 1, y)) } else { None },
            if y > 0 { Some(Pixel(x, y - 1)) } else { None },
            if y + 1 < height { Some(Pixel(x, y + 1)) } else { None },
        ];
        candidates.to_vec().into_iter().flatten()
    }

    /// Chebyshev distance between two pixels.
    pub fn chebyshev(self, other: Pixel) -> usize {
        let dx = if self.0 > other.0 { self.0 - other.0 } else { other.0 - self.0 };
        let dy = if self.1 > other.1 { self.1 - other.1 } else { other.1 - self.1 };
        dx.max(dy)
    }
}

/// A rectangle of pixels picked by the user, as two opposite corners
/// in whatever order the drag produced them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Where the drag started.
    pub from: Pixel,
    /// Where the drag ended.
    pub to: Pixel,
}

impl Selection {
    /// A selection between two corners.
    pub fn new(from: Pixel, to: Pixel) -> Selection {
        Selection { from, to }
    }

    /// Returns the left-upper corner and the width of the selection,
    /// after sorting the corners and clamping them into a `width` by
    /// `height` image.
    pub fn normalized(&self, width: usize, height: usize) -> (Pixel, usize) {
        let clamp = |p: Pixel| Pixel(p.0.min(width.saturating_sub(1)), p.1.min(height.saturating_sub(1)));
        let (a, b) = (clamp(self.from), clamp(self.to));
        let left = a.0.min(b.0);
        let top = a.1.min(b.1);
        (Pixel(left, top), a.0.max(b.0) - left)
    }
}

// Image dimensions are carried into `rug` and `image` as `u32`.
fn check_size(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidView(format!(
            "image must have pixels, got {}x{}",
            width, height
        )));
    }
    if width > u32::max_value() as usize || height > u32::max_value() as usize {
        return Err(RenderError::InvalidView(format!(
            "image of {}x{} is too large",
            width, height
        )));
    }
    Ok(())
}

/// A square window onto the complex plane, rendered into an image of
/// `width` by `height` pixels.  The side length spans the image width;
/// pixels are square, so the window extends `side * height / width`
/// downward from its top edge.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    left: Float,
    top: Float,
    side: Float,
    // The complex distance between two adjacent pixels.
    step: Float,
    width: usize,
    height: usize,
    precision: Precision,
}

impl View {
    /// Constructor.  Takes the left-upper corner of the window, its side
    /// length, and the resolution of the image it will be drawn into.
    pub fn new(left: &Float, top: &Float, side: &Float, width: usize, height: usize) -> Result<View> {
        View::with_floor(left, top, side, width, height, Precision::digits(0))
    }

    /// The whole set, framed the way most people first meet it.
    pub fn home(width: usize, height: usize) -> Result<View> {
        check_size(width, height)?;
        let p = Precision::digits(0);
        let side = Float::with_val(p.bits(), 4);
        let left = Float::with_val(p.bits(), -2.5);
        let mut top = Float::with_val(p.bits(), height as u32);
        top *= 2u32;
        top /= width as u32;
        View::new(&left, &top, &side, width, height)
    }

    /// A window of side `side` centred on `re + im i`, all read from
    /// decimal strings so that deep coordinates are not cut down to `f64`.
    pub fn centred(re: &str, im: &str, side: &str, width: usize, height: usize) -> Result<View> {
        check_size(width, height)?;
        let side_prec = Precision::digits(side.len() as u32);
        let side = parse_float(side, side_prec)?;
        let precision = Precision::for_side(&side).max(Precision::digits((re.len().max(im.len())) as u32));
        let bits = precision.bits();
        let side = precision.float(&side);
        let centre = PreciseComplex::parse(re, im, precision)?;

        let mut half_width = Float::with_val(bits, &side);
        half_width /= 2u32;
        let mut half_height = Float::with_val(bits, &side * height as u32);
        half_height /= width as u32;
        half_height /= 2u32;
        let left = Float::with_val(bits, centre.re() - &half_width);
        let top = Float::with_val(bits, centre.im() + &half_height);
        View::with_floor(&left, &top, &side, width, height, precision)
    }

    fn with_floor(
        left: &Float,
        top: &Float,
        side: &Float,
        width: usize,
        height: usize,
        floor: Precision,
    ) -> Result<View> {
        check_size(width, height)?;
        if !side.is_normal() || side.is_sign_negative() {
            return Err(RenderError::InvalidView(format!(
                "side length must be positive and finite, got {}",
                side
            )));
        }
        if !left.is_finite() || !top.is_finite() {
            return Err(RenderError::InvalidView("corner must be finite".to_string()));
        }

        let precision = Precision::for_side(side).max(floor);
        let side = precision.float(side);
        let mut step = Float::with_val(precision.bits(), &side);
        step /= width as u32;
        Ok(View {
            left: precision.float(left),
            top: precision.float(top),
            side,
            step,
            width,
            height,
            precision,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of pixels in the image.  Used to size buffers.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the image is of a size.  Views are never built
    /// empty, so this only exists to keep `len` honest.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real coordinate of the left edge.
    pub fn left(&self) -> &Float {
        &self.left
    }

    /// Imaginary coordinate of the top edge.
    pub fn top(&self) -> &Float {
        &self.top
    }

    /// Side length of the window, measured along the image width.
    pub fn side(&self) -> &Float {
        &self.side
    }

    /// The precision context every point of this view is computed in.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The pixel closest to the middle of the image.
    pub fn centre_pixel(&self) -> Pixel {
        Pixel(self.width / 2, self.height / 2)
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// equivalent point on the complex plane.
    pub fn pixel_to_point(&self, pixel: Pixel) -> PreciseComplex {
        let bits = self.precision.bits();
        let mut re = Float::with_val(bits, &self.step * pixel.0 as u32);
        re += &self.left;
        let mut im = Float::with_val(bits, &self.step * pixel.1 as u32);
        im = Float::with_val(bits, &self.top - &im);
        PreciseComplex::new(&re, &im, self.precision)
    }

    /// Maps a selection back onto the complex plane and returns the
    /// window it describes: the left-upper corner moves to the
    /// selection's corner, and the side shrinks by the ratio of the
    /// selection's width to the image width.  Returns `None` for
    /// selections narrower than `min_width` pixels.
    ///
    /// The new window never carries less precision than this one.
    pub fn zoom(&self, selection: &Selection, min_width: usize) -> Option<View> {
        let (corner, span) = selection.normalized(self.width, self.height);
        if span < min_width.max(1) {
            return None;
        }

        let side = Float::with_val(self.precision.bits(), &self.step * span as u32);
        let precision = Precision::for_side(&side).max(self.precision);
        let bits = precision.bits();

        let mut left = Float::with_val(bits, &self.step * corner.0 as u32);
        left += &self.left;
        let down = Float::with_val(bits, &self.step * corner.1 as u32);
        let top = Float::with_val(bits, &self.top - &down);

        View::with_floor(&left, &top, &side, self.width, self.height, precision).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(left: f64, top: f64, side: f64, width: usize, height: usize) -> View {
        View::new(
            &Float::with_val(64, left),
            &Float::with_val(64, top),
            &Float::with_val(64, side),
            width,
            height,
        )
        .unwrap()
    }

    fn point(re: f64, im: f64, v: &View) -> PreciseComplex {
        PreciseComplex::from_f64(re, im, v.precision())
    }

    #[test]
    fn view_fails_on_bad_shape() {
        assert!(View::home(0, 4).is_err());
        let zero = Float::new(64);
        let one = Float::with_val(64, 1);
        assert!(View::new(&zero, &zero, &zero, 4, 4).is_err());
        assert!(View::new(&zero, &zero, &Float::with_val(64, -1), 4, 4).is_err());
        assert!(View::new(&zero, &zero, &one, 4, 4).is_ok());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_images_are_refused_before_any_arithmetic() {
        let huge = u32::max_value() as usize + 1;
        assert!(View::home(4, huge).is_err());
        assert!(View::home(huge, 4).is_err());
        assert!(View::centred("0", "0", "1", 4, huge).is_err());
        assert!(View::home(4, 1 << 31).is_ok());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let v = view(0.0, 5.0, 5.0, 5, 5);
        assert_eq!(v.pixel_to_point(Pixel(0, 0)), point(0.0, 5.0, &v));
        assert_eq!(v.pixel_to_point(Pixel(2, 2)), point(2.0, 3.0, &v));
        assert_eq!(v.pixel_to_point(Pixel(4, 4)), point(4.0, 1.0, &v));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let v = view(-2.0, 2.0, 4.0, 4, 4);
        assert_eq!(v.pixel_to_point(Pixel(2, 2)), point(0.0, 0.0, &v));
        assert_eq!(v.pixel_to_point(Pixel(0, 0)), point(-2.0, 2.0, &v));
        assert_eq!(v.pixel_to_point(Pixel(3, 1)), point(1.0, 1.0, &v));
    }

    #[test]
    fn home_is_vertically_centred() {
        let v = View::home(400, 200).unwrap();
        assert_eq!(*v.top(), 1.0);
        assert_eq!(*v.left(), -2.5);
    }

    #[test]
    fn centred_view_frames_its_centre() {
        let v = View::centred("-0.5", "0", "4", 8, 8).unwrap();
        assert_eq!(v.pixel_to_point(Pixel(4, 4)), point(-0.5, 0.0, &v));
        assert!(View::centred("x", "0", "4", 8, 8).is_err());
    }

    #[test]
    fn neighbours_stay_in_bounds() {
        let corner: Vec<Pixel> = Pixel(0, 0).neighbours(3, 3).collect();
        assert_eq!(corner, vec![Pixel(1, 0), Pixel(0, 1)]);
        assert_eq!(Pixel(1, 1).neighbours(3, 3).count(), 4);
        assert_eq!(Pixel(2, 2).neighbours(3, 3).count(), 2);
        assert_eq!(Pixel(0, 0).neighbours(1, 1).count(), 0);
    }

    #[test]
    fn chebyshev_takes_the_larger_axis() {
        assert_eq!(Pixel(1, 1).chebyshev(Pixel(4, 2)), 3);
        assert_eq!(Pixel(4, 9).chebyshev(Pixel(4, 2)), 7);
    }

    #[test]
    fn selection_normalizes_corners() {
        let s = Selection::new(Pixel(30, 8), Pixel(10, 20));
        assert_eq!(s.normalized(100, 100), (Pixel(10, 8), 20));
        let s = Selection::new(Pixel(90, 90), Pixel(500, 10));
        assert_eq!(s.normalized(100, 100), (Pixel(90, 10), 9));
    }

    #[test]
    fn zoom_maps_selection_proportionally() {
        let v = view(-2.0, 2.0, 4.0, 64, 64);
        let z = v.zoom(&Selection::new(Pixel(48, 32), Pixel(32, 16)), 4).unwrap();
        assert_eq!(*z.side(), 1.0);
        assert_eq!(*z.left(), 0.0);
        assert_eq!(*z.top(), 1.0);
        assert!(z.precision() >= v.precision());
    }

    #[test]
    fn zoom_ignores_slivers() {
        let v = view(-2.0, 2.0, 4.0, 100, 100);
        assert!(v.zoom(&Selection::new(Pixel(10, 10), Pixel(12, 90)), 4).is_none());
        assert!(v.zoom(&Selection::new(Pixel(10, 10), Pixel(10, 10)), 0).is_none());
    }

    #[test]
    fn repeated_zoom_never_loses_precision() {
        let mut v = View::home(64, 64).unwrap();
        for _ in 0..80 {
            let next = v.zoom(&Selection::new(Pixel(16, 16), Pixel(48, 48)), 4).unwrap();
            assert!(next.precision() >= v.precision());
            assert!(*next.side() < *v.side());
            v = next;
        }
        assert!(v.precision().significant_digits() > 80);
    }
}
