// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape count to colour.  The hue cycles with the smoothed escape
//! count, so bands repeat at every depth instead of washing out as the
//! counts climb.

use num::clamp;

/// Colour of pixels presumed to be inside the set.
pub const INTERIOR: [u8; 3] = [0, 0, 0];

// Degrees of hue per iteration, and the period of the brightness ripple.
const HUE_PER_ITERATION: f64 = 7.0;
const BRIGHTNESS_PERIOD: f64 = 64.0;

/// The continuous escape count: the integer count, nudged by how far
/// past the escape radius the orbit landed, so neighboring bands blend.
pub fn smooth(iterations: u32, norm_sqr: f64) -> f64 {
    let n = f64::from(iterations);
    if !norm_sqr.is_finite() || norm_sqr <= 1.0 {
        return n;
    }
    let log_modulus = norm_sqr.ln() / 2.0;
    if log_modulus <= 0.0 {
        return n;
    }
    (n + 1.0 - log_modulus.ln() / std::f64::consts::LN_2).max(0.0)
}

/// The colour of a pixel that escaped after `iterations` rounds with
/// squared modulus `norm_sqr`.
pub fn colour(iterations: u32, norm_sqr: f64) -> [u8; 3] {
    let t = smooth(iterations, norm_sqr);
    let hue = (t * HUE_PER_ITERATION) % 360.0;
    let ripple = (t * 2.0 * std::f64::consts::PI / BRIGHTNESS_PERIOD).sin();
    let value = 0.8 + 0.2 * ripple;
    hsv_to_rgb(hue, 0.85, value)
}

/// Classic hexcone HSV to RGB.  `h` in degrees, `s` and `v` in `[0, 1]`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let c = v * s;
    let h_prime = (h / 60.0) % 6.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let (r, g, b) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let channel = |f: f64| clamp(((f + m) * 255.0).round(), 0.0, 255.0) as u8;
    [channel(r), channel(g), channel(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(42.0, 0.0, 0.0), [0, 0, 0]);
    }

    #[test]
    fn smoothing_stays_near_the_count() {
        let s = smooth(10, 16.0);
        assert!(s > 9.0 && s < 11.0, "{}", s);
        assert_eq!(smooth(10, std::f64::INFINITY), 10.0);
    }

    #[test]
    fn escaped_pixels_are_never_interior() {
        for n in 1..500 {
            assert_ne!(colour(n, 5.0), INTERIOR);
        }
    }
}
