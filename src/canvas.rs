// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The image buffer and the discovered grid of one render.  Both live
//! in a single struct so that one mutex covers them: painting an
//! escaped pixel and claiming its neighbors must look like one step to
//! every other worker.

use crate::planes::Pixel;
use image::RgbImage;
use itertools::iproduct;

/// What is known about one pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not resolved yet, or never reached by the fill.
    Unvisited,
    /// Escaped after this many iterations.
    Escaped(u32),
    /// Ran out of iterations without escaping; presumed inside the set.
    Bounded,
}

/// Per-pixel state of a render, indexed `y * width + x`.
#[derive(Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    rgb: Vec<u8>,
    outcomes: Vec<Outcome>,
    discovered: Vec<bool>,
    // Discovery stamp for the next pixel claimed.
    next_age: u64,
    escaped: usize,
    bounded: usize,
}

impl Canvas {
    /// A black, unvisited canvas.
    pub fn new(width: usize, height: usize) -> Canvas {
        let len = width * height;
        Canvas {
            width,
            height,
            rgb: vec![0; len * 3],
            outcomes: vec![Outcome::Unvisited; len],
            discovered: vec![false; len],
            next_age: 0,
            escaped: 0,
            bounded: 0,
        }
    }

    fn offset(&self, pixel: Pixel) -> Option<usize> {
        if pixel.0 < self.width && pixel.1 < self.height {
            Some(pixel.1 * self.width + pixel.0)
        } else {
            None
        }
    }

    /// Claim a pixel for the frontier.  Returns its discovery stamp the
    /// first time, and `None` ever after (or if it is off the image).
    pub fn discover(&mut self, pixel: Pixel) -> Option<u64> {
        let offset = self.offset(pixel)?;
        if self.discovered[offset] {
            return None;
        }
        self.discovered[offset] = true;
        let age = self.next_age;
        self.next_age += 1;
        Some(age)
    }

    /// Has this pixel been claimed?
    pub fn is_discovered(&self, pixel: Pixel) -> bool {
        self.offset(pixel).map_or(false, |offset| self.discovered[offset])
    }

    /// Record a resolved pixel.  Each pixel is painted at most once;
    /// a second attempt is refused and returns `false`.
    pub fn paint(&mut self, pixel: Pixel, outcome: Outcome, colour: [u8; 3]) -> bool {
        let offset = match self.offset(pixel) {
            Some(offset) => offset,
            None => return false,
        };
        if self.outcomes[offset] != Outcome::Unvisited || outcome == Outcome::Unvisited {
            return false;
        }
        self.outcomes[offset] = outcome;
        self.rgb[offset * 3..offset * 3 + 3].copy_from_slice(&colour);
        match outcome {
            Outcome::Escaped(_) => self.escaped += 1,
            Outcome::Bounded => self.bounded += 1,
            Outcome::Unvisited => {}
        }
        true
    }

    /// What is known about a pixel.
    pub fn outcome(&self, pixel: Pixel) -> Outcome {
        self.offset(pixel)
            .map_or(Outcome::Unvisited, |offset| self.outcomes[offset])
    }

    /// Count of claimed pixels.
    pub fn discovered(&self) -> usize {
        self.next_age as usize
    }

    /// Count of escaped pixels.
    pub fn escaped(&self) -> usize {
        self.escaped
    }

    /// Count of pixels retired at the iteration cutoff.
    pub fn bounded(&self) -> usize {
        self.bounded
    }

    /// Copy the image out.
    pub fn snapshot(&self, generation: u64) -> Snapshot {
        Snapshot {
            generation,
            width: self.width,
            height: self.height,
            rgb: self.rgb.clone(),
            outcomes: self.outcomes.clone(),
        }
    }
}

/// A read-only copy of a render's image, for the display.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// The render generation this was taken from.
    pub generation: u64,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Packed RGB triples, row by row.
    pub rgb: Vec<u8>,
    /// Per-pixel outcomes, row by row.
    pub outcomes: Vec<Outcome>,
}

impl Snapshot {
    /// What is known about a pixel.
    pub fn outcome(&self, pixel: Pixel) -> Outcome {
        if pixel.0 < self.width && pixel.1 < self.height {
            self.outcomes[pixel.1 * self.width + pixel.0]
        } else {
            Outcome::Unvisited
        }
    }

    /// Colour of a pixel.
    pub fn colour(&self, pixel: Pixel) -> Option<[u8; 3]> {
        if pixel.0 < self.width && pixel.1 < self.height {
            let offset = (pixel.1 * self.width + pixel.0) * 3;
            Some([self.rgb[offset], self.rgb[offset + 1], self.rgb[offset + 2]])
        } else {
            None
        }
    }

    /// Pixels resolved one way or the other.
    pub fn resolved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| **outcome != Outcome::Unvisited)
            .count()
    }

    /// The image as an `image` buffer, ready to be encoded.
    pub fn to_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width as u32, self.height as u32, self.rgb.clone())
    }

    /// The escape counts as a flat grid, `0` standing in for anything
    /// that did not escape.
    pub fn escape_counts(&self) -> Vec<u32> {
        iproduct!(0..self.height, 0..self.width)
            .map(|(y, x)| match self.outcome(Pixel(x, y)) {
                Outcome::Escaped(n) => n,
                _ => 0,
            })
            .collect()
    }
}
