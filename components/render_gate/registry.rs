/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use amp_element::{Page, PageId};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Completes once an extension has finished initializing. Clones complete
/// together.
#[derive(Clone)]
pub struct ReadinessHandle(Shared<BoxFuture<'static, ()>>);

impl ReadinessHandle {
    pub fn new<F>(ready: F) -> ReadinessHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        ReadinessHandle(ready.boxed().shared())
    }

    pub fn ready() -> ReadinessHandle {
        ReadinessHandle::new(future::ready(()))
    }

    /// A handle for an extension that will never report in.
    pub fn never() -> ReadinessHandle {
        ReadinessHandle::new(future::pending())
    }
}

impl Future for ReadinessHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.0).poll(cx)
    }
}

/// Source of per-extension readiness handles.
pub trait ReadinessRegistry {
    /// The handle of `extension` on `page`. Asking again for the same pair
    /// gives a handle that completes at the same time.
    fn readiness_handle(&self, page: &Page, extension: &str) -> ReadinessHandle;
}

struct Service {
    signal: Option<oneshot::Sender<()>>,
    handle: ReadinessHandle,
}

impl Service {
    fn new() -> Service {
        let (sender, receiver) = oneshot::channel();
        let handle = ReadinessHandle::new(async move {
            // An extension that went away without reporting is never ready.
            if receiver.await.is_err() {
                future::pending::<()>().await;
            }
        });
        Service {
            signal: Some(sender),
            handle,
        }
    }
}

/// Readiness of extensions, keyed by page and extension id. Extensions call
/// [`ServiceRegistry::signal_ready`] when they have initialized.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<Mutex<HashMap<(PageId, String), Service>>>,
}

impl ServiceRegistry {
    pub fn new() -> ServiceRegistry {
        ServiceRegistry::default()
    }

    fn with_service<R>(&self, page: PageId, extension: &str, f: impl FnOnce(&mut Service) -> R) -> R {
        let mut services = self.services.lock();
        let service = services
            .entry((page, extension.to_owned()))
            .or_insert_with(Service::new);
        f(service)
    }

    /// Mark `extension` on `page` as initialized. Only the first call counts.
    pub fn signal_ready(&self, page: PageId, extension: &str) {
        let signal = self.with_service(page, extension, |service| service.signal.take());
        match signal {
            Some(signal) => {
                debug!("{} is ready on {:?}", extension, page);
                // The receiver lives inside the shared handle, which we hold.
                let _ = signal.send(());
            },
            None => warn!("{} already reported ready on {:?}", extension, page),
        }
    }

    /// Drop the ability to report `extension` ready, e.g. because it failed
    /// to load. Its handle will never complete.
    pub fn abandon(&self, page: PageId, extension: &str) {
        if self
            .with_service(page, extension, |service| service.signal.take())
            .is_some()
        {
            warn!("{} abandoned on {:?}", extension, page);
        }
    }

    /// Forget every service of `page`.
    pub fn remove_page(&self, page: PageId) {
        self.services.lock().retain(|(id, _), _| *id != page);
    }
}

impl ReadinessRegistry for ServiceRegistry {
    fn readiness_handle(&self, page: &Page, extension: &str) -> ReadinessHandle {
        self.with_service(page.id(), extension, |service| service.handle.clone())
    }
}
