/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! Some extensions change how a page looks once they initialize. Showing the
//! page before they do produces a visible jump, so the page shell asks the
//! [`RenderGate`] what to wait for before revealing the body. The wait is
//! always bounded: an extension that never reports in costs at most the
//! configured timeout.

pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use amp_config::RenderDelayPrefs;
use amp_element::Page;
use futures::future::{BoxFuture, FutureExt, join_all};
use log::{debug, info, warn};
use tokio::time::Instant;

pub use crate::registry::{ReadinessHandle, ReadinessRegistry, ServiceRegistry};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateOutcome {
    /// Every render-delaying extension on the page reported ready.
    AllReady,
    /// The timeout elapsed first. The page should be shown anyway.
    TimedOut,
}

/// Resolve to `inner`'s output, or to `None` once `deadline` has passed.
pub async fn with_deadline<F: std::future::Future>(deadline: Instant, inner: F) -> Option<F::Output> {
    tokio::time::timeout_at(deadline, inner).await.ok()
}

pub struct RenderGate {
    prefs: RenderDelayPrefs,
    registry: Arc<dyn ReadinessRegistry>,
}

impl RenderGate {
    pub fn new(prefs: RenderDelayPrefs, registry: Arc<dyn ReadinessRegistry>) -> RenderGate {
        RenderGate { prefs, registry }
    }

    pub fn timeout(&self) -> Duration {
        self.prefs.timeout()
    }

    /// The configured render-delaying extensions declared on `page`, in
    /// configuration order.
    pub fn render_delaying_extensions(&self, page: &Page) -> Vec<&str> {
        let mut included: Vec<&str> = Vec::new();
        for extension in &self.prefs.extensions {
            if !included.contains(&extension.as_str()) && page.declares_custom_element(extension) {
                included.push(extension.as_str());
            }
        }
        included
    }

    /// Request a readiness handle for every render-delaying extension
    /// declared on `page`. Extensions the page does not use are never asked.
    pub fn included_extensions(&self, page: &Page) -> Vec<ReadinessHandle> {
        self.render_delaying_extensions(page)
            .into_iter()
            .map(|extension| self.registry.readiness_handle(page, extension))
            .collect()
    }

    /// `None` when nothing on `page` delays rendering and it can be shown
    /// right away. Otherwise a future settling once to
    /// [`GateOutcome::AllReady`] or, after the timeout, to
    /// [`GateOutcome::TimedOut`]. The timeout runs from this call, not from
    /// the first poll of the returned future.
    pub fn wait_for_extensions(&self, page: &Page) -> Option<BoxFuture<'static, GateOutcome>> {
        let extensions = self.included_extensions(page);
        if extensions.is_empty() {
            debug!("No render-delaying extensions on {}", page.url());
            return None;
        }
        info!(
            "Waiting for {} render-delaying extension(s) on {}",
            extensions.len(),
            page.url()
        );
        let ceiling = self.timeout();
        let deadline = Instant::now() + ceiling;
        Some(
            async move {
                match with_deadline(deadline, join_all(extensions)).await {
                    Some(_) => GateOutcome::AllReady,
                    None => {
                        warn!("Render-delaying extensions not ready after {:?}", ceiling);
                        GateOutcome::TimedOut
                    },
                }
            }
            .boxed(),
        )
    }
}
