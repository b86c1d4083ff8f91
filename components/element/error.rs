/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

/// Errors raised by element lifecycle callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The embed source is neither `https` nor an allowed test origin.
    InvalidSourceScheme { src: String },
    /// `allow-same-origin` was requested for an embed sharing the container's origin.
    SandboxOriginCollision { src: String, container: String },
    /// The element starts too close to the top of the page.
    PositionTooHigh { top: f64, min_top: f64 },
    /// The frame reported an error, or went away before loading.
    FrameLoadFailed(String),
    /// Content was requested for an element that is not in a live page.
    NotAttached,
    /// The element declared a layout its implementation cannot honour.
    UnsupportedLayout(String),
}

pub type Fallible<T> = Result<T, Error>;

pub type ErrorResult = Fallible<()>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidSourceScheme { ref src } => write!(
                f,
                "Invalid <amp-iframe> src. Must start with https://. Found {}",
                src
            ),
            Error::SandboxOriginCollision {
                ref src,
                ref container,
            } => write!(
                f,
                "Origin of <amp-iframe> {} must not be equal to container {} \
                 when sandboxed with allow-same-origin",
                src, container
            ),
            Error::PositionTooHigh { top, min_top } => write!(
                f,
                "<amp-iframe> elements must not be positioned above the fold. \
                 Current position {}. Min: {}",
                top, min_top
            ),
            Error::FrameLoadFailed(ref reason) => write!(f, "Frame failed to load: {}", reason),
            Error::NotAttached => write!(f, "Element is not attached to a page"),
            Error::UnsupportedLayout(ref layout) => write!(f, "Layout not supported: {}", layout),
        }
    }
}

impl std::error::Error for Error {}
