// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ViewController owns what the user is looking at: the current
//! window, the render drawing it, and a fixed pool of workers.
//!
//! Every zoom starts a new render generation.  The previous render is
//! cancelled by posting the marker into its frontier; workers drain
//! off the old render and pick up the new one from their inbox.  The
//! pool itself is never torn down or rebuilt between zooms.

use crate::canvas::Snapshot;
use crate::config::RenderConfig;
use crate::errors::{RenderError, Result};
use crate::planes::{Selection, View};
use crate::precise::Precision;
use crate::render::{Render, RenderStats};
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Worker {
    inbox: Sender<Arc<Render>>,
    handle: Option<JoinHandle<()>>,
}

// A failure costs the worker the rest of that generation only; it is
// back in the pool for the next render in its inbox.
fn worker_loop(id: usize, inbox: Receiver<Arc<Render>>) {
    for render in inbox.iter() {
        if render.supervise(id).is_none() {
            warn!(
                "worker {} sits out the rest of generation {}",
                id,
                render.generation()
            );
        }
    }
    debug!("worker {} shut down", id);
}

/// Drives zoom and cancellation over a pool of render workers.
pub struct ViewController {
    config: RenderConfig,
    home: View,
    generation: u64,
    current: Arc<Render>,
    selection: Option<Selection>,
    workers: Vec<Worker>,
}

impl ViewController {
    /// Start at the home view with `config`'s resolution.
    pub fn new(config: RenderConfig) -> Result<ViewController> {
        config.validate()?;
        let home = View::home(config.width, config.height)?;
        ViewController::with_view(config, home)
    }

    /// Start at `view`.  The view's resolution wins over `config`'s.
    pub fn with_view(config: RenderConfig, view: View) -> Result<ViewController> {
        let config = config.with_size(view.width(), view.height());
        config.validate()?;

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let (inbox, rx) = channel::unbounded();
            let handle = thread::Builder::new()
                .name(format!("floodbrot-worker-{}", id))
                .spawn(move || worker_loop(id, rx))
                .map_err(|err| RenderError::Spawn(err.to_string()))?;
            workers.push(Worker {
                inbox,
                handle: Some(handle),
            });
        }

        let home = view.clone();
        let current = Arc::new(Render::new(1, view, &config)?);
        let controller = ViewController {
            config,
            home,
            generation: 1,
            current,
            selection: None,
            workers,
        };
        controller.dispatch();
        Ok(controller)
    }

    fn dispatch(&self) {
        for (id, worker) in self.workers.iter().enumerate() {
            if worker.inbox.send(self.current.clone()).is_err() {
                warn!("worker {} is gone, not sending generation {}", id, self.generation);
            }
        }
    }

    // Start a fresh generation on `view` and cancel the one it replaces.
    fn replace(&mut self, view: View) -> Result<()> {
        let generation = self.generation + 1;
        let next = Arc::new(Render::new(generation, view, &self.config)?);
        self.current.cancel()?;
        self.generation = generation;
        self.current = next;
        self.dispatch();
        Ok(())
    }

    /// Zoom into a selected rectangle of the current image.  Returns
    /// `false`, leaving everything as it was, when the selection is too
    /// narrow to mean anything.
    pub fn zoom(&mut self, selection: &Selection) -> Result<bool> {
        let next = match self.current.view().zoom(selection, self.config.min_selection) {
            Some(view) => view,
            None => {
                debug!("ignoring degenerate selection {:?}", selection);
                return Ok(false);
            }
        };
        info!(
            "zoom {:?}: side now {:e}, {} digits",
            selection,
            next.side().to_f64(),
            next.precision().significant_digits()
        );
        self.selection = None;
        self.replace(next)?;
        Ok(true)
    }

    /// Go back to the starting window.
    pub fn reset(&mut self) -> Result<()> {
        let home = self.home.clone();
        self.replace(home)
    }

    /// Hold on to the selection the user is dragging out, for the
    /// display to draw over the image.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// The selection being dragged, if any.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// The window on screen.
    pub fn view(&self) -> &View {
        self.current.view()
    }

    /// The precision the current window is computed in.
    pub fn precision(&self) -> Precision {
        self.current.view().precision()
    }

    /// The live render generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The configuration every render is started with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// A copy of the image as it stands.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.current.snapshot()
    }

    /// Progress of the live render.
    pub fn stats(&self) -> Result<RenderStats> {
        self.current.stats()
    }

    /// Whether the live render has nothing left to do.
    pub fn is_idle(&self) -> Result<bool> {
        self.current.is_quiescent()
    }

    /// Block until the live render finishes, at most `timeout`.
    pub fn wait_idle(&self, timeout: Duration) -> Result<bool> {
        self.current.wait(timeout)
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        if let Err(err) = self.current.cancel() {
            warn!("could not cancel generation {}: {}", self.generation, err);
        }
        for worker in self.workers.drain(..) {
            let Worker { inbox, handle } = worker;
            drop(inbox);
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    warn!("a worker thread panicked on the way out");
                }
            }
        }
    }
}
