#![warn(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Flood-fill Mandelbrot renderer
//!
//! The Mandelbrot set is drawn by taking each point `c` of the complex
//! plane, iterating `z = z * z + c` from zero, and counting how long
//! the orbit takes to leave the disc of radius two.  Points whose
//! orbits never leave are in the set.
//!
//! Two things make deep zooms expensive.  First, `f64` runs out of
//! digits somewhere around a zoom of 10^15, after which neighboring
//! pixels map to the same number; this crate carries coordinates in
//! arbitrary precision that grows with the zoom depth.  Second, the
//! interior of the set costs the full iteration budget per pixel.
//! Instead of scanning every pixel, we flood outward from a ring of
//! seed pixels on the image border: only pixels adjacent to an
//! escaped pixel are ever computed, so the fill stops at the edge of
//! the set and most of the interior is never touched.
//!
//! Work is kept in a priority queue shared by a pool of threads.  A
//! zoom cancels the running render by dropping a marker into its
//! queue, and the same threads move on to the next one.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;
extern crate rug;

pub mod canvas;
pub mod config;
pub mod controller;
pub mod errors;
pub mod frontier;
pub mod palette;
pub mod pixel;
pub mod planes;
pub mod precise;
pub mod render;

pub use canvas::{Outcome, Snapshot};
pub use config::RenderConfig;
pub use controller::ViewController;
pub use errors::{RenderError, Result};
pub use frontier::Strategy;
pub use pixel::{PixelState, Step};
pub use planes::{Pixel, Selection, View};
pub use precise::{PreciseComplex, Precision};
pub use render::{Exit, Render, RenderStats};
