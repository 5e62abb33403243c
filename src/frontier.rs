// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The frontier: every pixel that has been discovered but not yet
//! resolved, in the order the workers should take them.
//!
//! Pixels with the fewest iterations come out first, so nobody is
//! starved of early rounds while a neighbor is driven deep.  Ties go
//! to the traversal strategy, then to whichever pixel is closer to the
//! middle of the image.  The cancellation marker outranks everything.

use crate::errors::Result;
use crate::pixel::PixelState;
use crate::planes::Pixel;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// How discovery age breaks ties between pixels with equal iteration
/// counts.  Chosen once per render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Newest discoveries first: the fill runs outward along a growing
    /// edge.
    DepthFirst,
    /// Oldest discoveries first: the fill grows evenly, layer by layer.
    BreadthFirst,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::DepthFirst
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::DepthFirst => write!(f, "dfs"),
            Strategy::BreadthFirst => write!(f, "bfs"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dfs" | "depth" | "depth-first" => Ok(Strategy::DepthFirst),
            "bfs" | "breadth" | "breadth-first" => Ok(Strategy::BreadthFirst),
            _ => Err(format!("Unknown traversal strategy '{}'", s)),
        }
    }
}

impl Strategy {
    /// The sort key of a pixel under this strategy, in an image whose
    /// middle is `centre`.
    pub fn rank(self, state: &PixelState, centre: Pixel) -> Rank {
        let age = match self {
            Strategy::DepthFirst => u64::max_value() - state.age(),
            Strategy::BreadthFirst => state.age(),
        };
        Rank {
            tier: 1,
            iterations: state.iterations(),
            age,
            distance: state.pixel().chebyshev(centre),
            x: state.pixel().0,
            y: state.pixel().1,
        }
    }

    /// `Less` means `a` is taken before `b`.
    pub fn compare(self, a: &PixelState, b: &PixelState, centre: Pixel) -> Ordering {
        self.rank(a, centre).cmp(&self.rank(b, centre))
    }
}

/// The sort key of a frontier entry.  Smaller keys are dequeued first.
/// The trailing coordinates only make the order total.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    tier: u8,
    iterations: u32,
    age: u64,
    distance: usize,
    x: usize,
    y: usize,
}

impl Rank {
    /// The rank of the cancellation marker, below every pixel's.
    pub const CANCEL: Rank = Rank {
        tier: 0,
        iterations: 0,
        age: 0,
        distance: 0,
        x: 0,
        y: 0,
    };
}

/// Something a worker can take off the frontier.
#[derive(Debug)]
pub enum Entry {
    /// Stop consuming this frontier.
    Cancel,
    /// Work on this pixel.
    Pixel(PixelState),
}

struct Queued {
    rank: Rank,
    entry: Entry,
}

// BinaryHeap is a max-heap; reverse the rank so the least rank is on top.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank.cmp(&self.rank)
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Queued {}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Queued>,
    // Pixels popped by a worker and not yet requeued or retired.
    in_flight: usize,
    cancelled: bool,
    admitted: usize,
    high_water: usize,
}

impl Queue {
    fn push(&mut self, rank: Rank, entry: Entry) {
        self.heap.push(Queued { rank, entry });
        self.high_water = self.high_water.max(self.heap.len());
    }

    fn quiescent(&self) -> bool {
        self.heap.is_empty() && self.in_flight == 0
    }
}

/// A blocking priority queue of pending pixels, shared by every worker
/// of one render.
pub struct Frontier {
    strategy: Strategy,
    centre: Pixel,
    queue: Mutex<Queue>,
    ready: Condvar,
}

impl Frontier {
    /// An empty frontier ordering pixels by `strategy`, breaking final
    /// ties towards `centre`.
    pub fn new(strategy: Strategy, centre: Pixel) -> Frontier {
        Frontier {
            strategy,
            centre,
            queue: Mutex::new(Queue::default()),
            ready: Condvar::new(),
        }
    }

    /// The traversal strategy this frontier was built with.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn lock(&self) -> Result<MutexGuard<Queue>> {
        Ok(self.queue.lock()?)
    }

    /// Admit newly discovered pixels.
    pub fn admit<I>(&self, pixels: I) -> Result<()>
    where
        I: IntoIterator<Item = PixelState>,
    {
        let mut queue = self.lock()?;
        for state in pixels {
            let rank = self.strategy.rank(&state, self.centre);
            queue.push(rank, Entry::Pixel(state));
            queue.admitted += 1;
        }
        self.ready.notify_all();
        Ok(())
    }

    /// Take the most urgent entry, waiting while the frontier is empty
    /// but other workers still hold pixels that may put work back.
    /// Returns `None` once the frontier is empty and nobody holds a
    /// pixel: the render is finished.
    ///
    /// The cancellation marker is never removed; every worker that
    /// comes looking sees it.
    pub fn pop(&self) -> Result<Option<Entry>> {
        let mut queue = self.lock()?;
        loop {
            let marker_on_top = match queue.heap.peek() {
                Some(top) => top.rank == Rank::CANCEL,
                None => false,
            };
            if marker_on_top {
                return Ok(Some(Entry::Cancel));
            }
            if let Some(top) = queue.heap.pop() {
                queue.in_flight += 1;
                return Ok(Some(top.entry));
            }
            if queue.in_flight == 0 {
                self.ready.notify_all();
                return Ok(None);
            }
            queue = self.ready.wait(queue)?;
        }
    }

    /// Hand back a pixel that needs more rounds.
    pub fn requeue(&self, state: PixelState) -> Result<()> {
        let mut queue = self.lock()?;
        let rank = self.strategy.rank(&state, self.centre);
        queue.push(rank, Entry::Pixel(state));
        queue.in_flight -= 1;
        self.ready.notify_one();
        Ok(())
    }

    /// Finish with a popped pixel, admitting whatever neighbors it
    /// discovered in the same step.
    pub fn retire(&self, discovered: Vec<PixelState>) -> Result<()> {
        let mut queue = self.lock()?;
        for state in discovered {
            let rank = self.strategy.rank(&state, self.centre);
            queue.push(rank, Entry::Pixel(state));
            queue.admitted += 1;
        }
        queue.in_flight -= 1;
        self.ready.notify_all();
        Ok(())
    }

    /// Give up on a popped pixel without resolving it.  Used when a
    /// worker dies mid-step, so that its siblings do not wait forever
    /// for a pixel that will never come back.
    pub fn abandon(&self) {
        let mut queue = match self.queue.lock() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.in_flight = queue.in_flight.saturating_sub(1);
        self.ready.notify_all();
    }

    /// Post the cancellation marker.  Posting it twice is harmless.
    pub fn cancel(&self) -> Result<()> {
        let mut queue = self.lock()?;
        if !queue.cancelled {
            queue.cancelled = true;
            queue.push(Rank::CANCEL, Entry::Cancel);
        }
        self.ready.notify_all();
        Ok(())
    }

    /// Has the marker been posted?
    pub fn is_cancelled(&self) -> Result<bool> {
        Ok(self.lock()?.cancelled)
    }

    /// Nothing queued and nothing in a worker's hands.
    pub fn is_quiescent(&self) -> Result<bool> {
        Ok(self.lock()?.quiescent())
    }

    /// Block until the frontier is quiescent or cancelled, or until
    /// `timeout` passes.  Returns whether it got there in time.
    pub fn wait_quiescent(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.lock()?;
        loop {
            if queue.quiescent() || queue.cancelled {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            queue = self.ready.wait_timeout(queue, deadline - now)?.0;
        }
    }

    /// A point-in-time view of the queue's bookkeeping.
    pub fn counts(&self) -> Result<FrontierCounts> {
        let queue = self.lock()?;
        Ok(FrontierCounts {
            queued: queue.heap.len(),
            in_flight: queue.in_flight,
            admitted: queue.admitted,
            high_water: queue.high_water,
        })
    }
}

/// Bookkeeping numbers for a frontier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    /// Entries waiting in the queue, the marker included.
    pub queued: usize,
    /// Pixels a worker is currently iterating.
    pub in_flight: usize,
    /// Distinct pixels ever admitted; requeues do not count.
    pub admitted: usize,
    /// The most entries the queue has held at once.
    pub high_water: usize,
}
