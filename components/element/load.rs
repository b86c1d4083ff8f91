/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One-shot load outcome of a frame.
//!
//! The [`LoadSignal`] half goes to whatever fetches the frame and is consumed
//! by reporting, so an outcome can only ever be reported once. The
//! [`LoadHandle`] half is awaited by whoever asked for the content.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use log::debug;
use tokio::sync::oneshot;

use crate::error::{Error, ErrorResult};

pub fn load_channel() -> (LoadSignal, LoadHandle) {
    let (sender, receiver) = oneshot::channel();
    (LoadSignal(sender), LoadHandle(receiver))
}

#[derive(Debug)]
pub struct LoadSignal(oneshot::Sender<ErrorResult>);

impl LoadSignal {
    pub fn loaded(self) {
        self.settle(Ok(()));
    }

    pub fn failed(self, reason: &str) {
        self.settle(Err(Error::FrameLoadFailed(reason.to_owned())));
    }

    fn settle(self, outcome: ErrorResult) {
        if self.0.send(outcome).is_err() {
            debug!("Load outcome reported after its handle was dropped");
        }
    }
}

/// Resolves once with the frame's load outcome. A signal dropped without
/// reporting resolves to [`Error::FrameLoadFailed`].
#[derive(Debug)]
pub struct LoadHandle(oneshot::Receiver<ErrorResult>);

impl Future for LoadHandle {
    type Output = ErrorResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ErrorResult> {
        Pin::new(&mut self.0).poll(cx).map(|outcome| {
            outcome.unwrap_or_else(|_| {
                Err(Error::FrameLoadFailed(
                    "frame was destroyed before it loaded".to_owned(),
                ))
            })
        })
    }
}
