// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs of a render.  Once a render has started its configuration
//! does not change; a new configuration takes effect at the next zoom.

use crate::errors::{RenderError, Result};
use crate::frontier::Strategy;

/// Parameters shared by every render a controller starts.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Size of the worker pool.
    pub workers: usize,
    /// Hard cap on iterations for any one pixel.  A pixel that reaches
    /// it without escaping is retired as inside the set.
    pub max_iterations: u32,
    /// Rounds a worker spends on a pixel before handing it back.
    pub rounds_per_call: u32,
    /// Distance between seed pixels along the image border.
    pub seed_stride: usize,
    /// Tie-break between pixels with equal iteration counts.
    pub strategy: Strategy,
    /// Selections narrower than this many pixels are ignored.
    pub min_selection: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 640,
            height: 480,
            workers: num_cpus::get(),
            max_iterations: 2000,
            rounds_per_call: 100,
            seed_stride: 10,
            strategy: Strategy::default(),
            min_selection: 4,
        }
    }
}

impl RenderConfig {
    /// Set the image resolution.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-pixel iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the rounds per worker step.
    pub fn with_rounds_per_call(mut self, rounds: u32) -> Self {
        self.rounds_per_call = rounds;
        self
    }

    /// Set the border seed spacing.
    pub fn with_seed_stride(mut self, stride: usize) -> Self {
        self.seed_stride = stride;
        self
    }

    /// Set the traversal strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the narrowest selection a zoom will accept.
    pub fn with_min_selection(mut self, min_selection: usize) -> Self {
        self.min_selection = min_selection;
        self
    }

    /// Refuse configurations that could never finish a render.
    pub fn validate(&self) -> Result<()> {
        let fail = |why: &str| -> Result<()> { Err(RenderError::InvalidConfig(why.to_string())) };
        if self.width == 0 || self.height == 0 {
            return fail("image size must be non-zero");
        }
        if self.width > u32::max_value() as usize || self.height > u32::max_value() as usize {
            return fail("image size must fit in 32 bits");
        }
        if self.workers == 0 {
            return fail("need at least one worker");
        }
        if self.max_iterations == 0 {
            return fail("iteration cap must be non-zero");
        }
        if self.rounds_per_call == 0 {
            return fail("rounds per call must be non-zero");
        }
        if self.seed_stride == 0 {
            return fail("seed stride must be non-zero");
        }
        Ok(())
    }
}
