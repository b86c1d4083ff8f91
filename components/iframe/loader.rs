/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use amp_element::{Element, LoadSignal};
use log::debug;

/// Hands out frame names. Clones share one counter, so every embed created
/// through clones of the same allocator gets a distinct, increasing name.
/// A name is consumed when it is read, even if the frame is never used.
#[derive(Clone, Debug)]
pub struct FrameNameAllocator {
    prefix: Arc<str>,
    next: Arc<AtomicU64>,
}

impl FrameNameAllocator {
    pub fn new(prefix: &str) -> FrameNameAllocator {
        FrameNameAllocator {
            prefix: Arc::from(prefix),
            next: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn next_name(&self) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, id)
    }
}

/// Fetches the document of a newly created frame.
pub trait FrameLoader {
    /// Begin loading `frame`'s `src`. The outcome is reported through
    /// `signal`; dropping it without reporting counts as a failed load.
    fn begin_load(&self, frame: &Element, signal: LoadSignal);
}

/// A loader that only records frames, leaving the embedder (or a test) to
/// report their outcomes later.
#[derive(Debug, Default)]
pub struct FrameLoadQueue {
    pending: RefCell<Vec<(Element, LoadSignal)>>,
}

impl FrameLoadQueue {
    pub fn new() -> FrameLoadQueue {
        FrameLoadQueue::default()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Names of the frames still waiting for an outcome, oldest first.
    pub fn pending_names(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .filter_map(|(frame, _)| frame.get_attribute("name").map(str::to_owned))
            .collect()
    }

    /// Remove the frame called `name` together with its signal.
    pub fn take(&self, name: &str) -> Option<(Element, LoadSignal)> {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .position(|(frame, _)| frame.get_attribute("name") == Some(name))?;
        Some(pending.remove(index))
    }

    pub fn drain(&self) -> Vec<(Element, LoadSignal)> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

impl FrameLoader for FrameLoadQueue {
    fn begin_load(&self, frame: &Element, signal: LoadSignal) {
        debug!(
            "Queued frame {:?} for {:?}",
            frame.get_attribute("name"),
            frame.get_attribute("src")
        );
        self.pending.borrow_mut().push((frame.clone(), signal));
    }
}
