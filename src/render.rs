// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One render generation: a frontier, a canvas, and the flood fill
//! that workers run over them.
//!
//! Rather than visit every pixel, the fill starts from a sparse ring
//! of seeds on the image border.  A pixel that escapes paints itself
//! and claims its four neighbors; a pixel that stays bounded until
//! the iteration cap is painted as interior and claims nothing.  The
//! fill therefore flows through the exterior of the set and stops at
//! its boundary, and the (expensive) interior is only ever touched
//! along its edge.

use crate::canvas::{Canvas, Outcome, Snapshot};
use crate::config::RenderConfig;
use crate::errors::{RenderError, Result};
use crate::frontier::{Entry, Frontier};
use crate::palette;
use crate::pixel::{PixelState, Step};
use crate::planes::{Pixel, View};
use itertools::Itertools;
use log::{debug, error, info, trace};
use std::any::Any;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Why a worker stopped consuming a render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Nothing left to do.
    Finished,
    /// Found the cancellation marker.
    Cancelled,
}

/// Progress numbers for a render.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// The generation these numbers describe.
    pub generation: u64,
    /// Pixels claimed by the fill, seeds included.
    pub discovered: usize,
    /// Pixels painted as escaped.
    pub escaped: usize,
    /// Pixels painted as interior at the iteration cap.
    pub bounded: usize,
    /// Entries waiting in the frontier.
    pub queued: usize,
    /// Pixels in a worker's hands right now.
    pub in_flight: usize,
    /// Pixels ever admitted to the frontier.
    pub admitted: usize,
    /// Largest the frontier has been.
    pub high_water: usize,
    /// Whether the cancellation marker has been posted.
    pub cancelled: bool,
}

/// The state of one zoom level's render, shared by every worker.
pub struct Render {
    generation: u64,
    view: View,
    max_iterations: u32,
    rounds_per_call: u32,
    frontier: Frontier,
    canvas: Mutex<Canvas>,
    // Settles left to sabotage with a panic under the canvas lock.
    #[cfg(test)]
    failures: AtomicUsize,
}

// Returns the popped pixel's slot to the frontier if the worker holding
// it bails out before settling it.
struct Held<'a> {
    frontier: &'a Frontier,
    settled: bool,
}

impl<'a> Held<'a> {
    fn new(frontier: &'a Frontier) -> Held<'a> {
        Held {
            frontier,
            settled: false,
        }
    }

    fn release(mut self) {
        self.settled = true;
    }
}

impl<'a> Drop for Held<'a> {
    fn drop(&mut self) {
        if !self.settled {
            self.frontier.abandon();
        }
    }
}

impl Render {
    /// Build a render of `view` and seed its frontier.  No work happens
    /// until a worker calls [`Render::work`].
    pub fn new(generation: u64, view: View, config: &RenderConfig) -> Result<Render> {
        config.validate()?;
        let render = Render {
            generation,
            frontier: Frontier::new(config.strategy, view.centre_pixel()),
            canvas: Mutex::new(Canvas::new(view.width(), view.height())),
            max_iterations: config.max_iterations,
            rounds_per_call: config.rounds_per_call,
            view,
            #[cfg(test)]
            failures: AtomicUsize::new(0),
        };
        let seeds = render.seed(config.seed_stride)?;
        info!(
            "generation {}: {}x{} at {} digits, {} seeds, {} fill",
            generation,
            render.view.width(),
            render.view.height(),
            render.view.precision().significant_digits(),
            seeds,
            config.strategy
        );
        Ok(render)
    }

    // Every canvas update completes before the lock is released, so a
    // worker that panicked while holding it leaves nothing half-written.
    fn canvas(&self) -> MutexGuard<Canvas> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn fail_next_settles(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn sabotage(&self) {
        let armed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if armed {
            panic!("injected worker failure");
        }
    }

    fn seed(&self, stride: usize) -> Result<usize> {
        let mut canvas = self.canvas();
        let seeds: Vec<PixelState> = border(self.view.width(), self.view.height(), stride)
            .into_iter()
            .filter_map(|pixel| {
                canvas
                    .discover(pixel)
                    .map(|age| PixelState::new(pixel, age, self.view.pixel_to_point(pixel)))
            })
            .collect();
        let count = seeds.len();
        self.frontier.admit(seeds)?;
        Ok(count)
    }

    /// The opaque stamp of this render.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The window being rendered.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// One worker's share of the fill.  Returns when the frontier runs
    /// dry or the cancellation marker turns up.
    pub fn work(&self) -> Result<Exit> {
        loop {
            let mut state = match self.frontier.pop()? {
                None => return Ok(Exit::Finished),
                Some(Entry::Cancel) => return Ok(Exit::Cancelled),
                Some(Entry::Pixel(state)) => state,
            };
            let held = Held::new(&self.frontier);

            let budget = self.max_iterations.saturating_sub(state.iterations());
            match state.iterate(self.rounds_per_call.min(budget)) {
                Step::Escaped(n) => {
                    let colour = palette::colour(n, state.norm_sqr_f64());
                    self.settle(&state, Outcome::Escaped(n), colour)?;
                }
                Step::Pending(n) if n >= self.max_iterations => {
                    self.settle(&state, Outcome::Bounded, palette::INTERIOR)?;
                }
                Step::Pending(_) => self.frontier.requeue(state)?,
            }
            held.release();
        }
    }

    // Paint a resolved pixel and, if it escaped, claim and enqueue its
    // unclaimed neighbors.  All under the canvas lock.
    fn settle(&self, state: &PixelState, outcome: Outcome, colour: [u8; 3]) -> Result<()> {
        let painted = {
            let mut canvas = self.canvas();
            #[cfg(test)]
            self.sabotage();
            let painted = canvas.paint(state.pixel(), outcome, colour);

            let mut found = Vec::new();
            if painted {
                if let Outcome::Escaped(_) = outcome {
                    for pixel in state.pixel().neighbours(self.view.width(), self.view.height()) {
                        if let Some(age) = canvas.discover(pixel) {
                            found.push(PixelState::new(pixel, age, self.view.pixel_to_point(pixel)));
                        }
                    }
                }
            }
            trace!("{:?} {:?}, {} new", state.pixel(), outcome, found.len());
            self.frontier.retire(found)?;
            painted
        };
        if !painted {
            error!("pixel {:?} was resolved twice", state.pixel());
        }
        Ok(())
    }

    /// Run [`Render::work`] for one worker, catching both errors and
    /// panics.  `None` means the worker failed and should not be used
    /// again.
    pub fn supervise(&self, worker: usize) -> Option<Exit> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.work())) {
            Ok(Ok(exit)) => {
                debug!(
                    "worker {} left generation {}: {:?}",
                    worker, self.generation, exit
                );
                Some(exit)
            }
            Ok(Err(err)) => {
                error!(
                    "worker {} failed in generation {}: {}",
                    worker, self.generation, err
                );
                None
            }
            Err(cause) => {
                error!(
                    "worker {} panicked in generation {}: {}",
                    worker,
                    self.generation,
                    panic_message(&*cause)
                );
                None
            }
        }
    }

    /// Run the whole render to completion on `workers` scoped threads.
    pub fn run(&self, workers: usize) -> Result<RenderStats> {
        crossbeam::scope(|spawner| {
            for worker in 0..workers.max(1) {
                spawner.spawn(move |_| self.supervise(worker));
            }
        })
        .map_err(|_| RenderError::Spawn("worker scope panicked".to_string()))?;

        let stats = self.stats()?;
        info!(
            "generation {} done: {} escaped, {} bounded, frontier peaked at {}",
            self.generation, stats.escaped, stats.bounded, stats.high_water
        );
        Ok(stats)
    }

    /// Post the cancellation marker.  Workers drain out as they reach it.
    pub fn cancel(&self) -> Result<()> {
        debug!("cancelling generation {}", self.generation);
        self.frontier.cancel()
    }

    /// Nothing left to do and nobody doing it.
    pub fn is_quiescent(&self) -> Result<bool> {
        self.frontier.is_quiescent()
    }

    /// Block until the render is quiescent or cancelled, at most
    /// `timeout`.  Returns whether it settled in time.
    pub fn wait(&self, timeout: Duration) -> Result<bool> {
        self.frontier.wait_quiescent(timeout)
    }

    /// Copy the current image out.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.canvas().snapshot(self.generation))
    }

    /// Current progress numbers.
    pub fn stats(&self) -> Result<RenderStats> {
        let canvas = self.canvas();
        let counts = self.frontier.counts()?;
        Ok(RenderStats {
            generation: self.generation,
            discovered: canvas.discovered(),
            escaped: canvas.escaped(),
            bounded: canvas.bounded(),
            queued: counts.queued,
            in_flight: counts.in_flight,
            admitted: counts.admitted,
            high_water: counts.high_water,
            cancelled: self.frontier.is_cancelled()?,
        })
    }
}

/// Seed pixels: every `stride`th pixel around the border of the image,
/// plus the corners.
pub fn border(width: usize, height: usize, stride: usize) -> Vec<Pixel> {
    if width == 0 || height == 0 {
        return vec![];
    }
    let (right, bottom) = (width - 1, height - 1);
    let stride = stride.max(1);
    let across = (0..width).step_by(stride).chain(iter::once(right));
    let down = (0..height).step_by(stride).chain(iter::once(bottom));
    across
        .flat_map(move |x| vec![Pixel(x, 0), Pixel(x, bottom)])
        .chain(down.flat_map(move |y| vec![Pixel(0, y), Pixel(right, y)]))
        .unique()
        .collect()
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown cause".to_string()
    }
}
