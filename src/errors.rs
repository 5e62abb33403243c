// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single error type shared by every part of the renderer.

use failure::Fail;
use std::sync::PoisonError;

/// Everything that can go wrong while building a view or running a
/// render.  Degenerate zoom selections are *not* errors; they are
/// quietly ignored by the controller.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The view window cannot be rendered: zero-sized image, or a
    /// side length that is zero, negative, or not finite.
    #[fail(display = "Invalid view: {}", _0)]
    InvalidView(String),

    /// A coordinate string could not be read as a number.
    #[fail(display = "Could not parse coordinate '{}'", _0)]
    BadCoordinate(String),

    /// The render configuration is unusable.
    #[fail(display = "Invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A worker died while holding shared render state.
    #[fail(display = "Shared render state was poisoned by a failed worker")]
    Poisoned,

    /// A worker thread could not be started.
    #[fail(display = "Could not start worker: {}", _0)]
    Spawn(String),
}

impl<T> From<PoisonError<T>> for RenderError {
    fn from(_: PoisonError<T>) -> Self {
        RenderError::Poisoned
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
