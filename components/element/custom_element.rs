/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::any::Any;
use std::collections::HashMap;

use log::{debug, warn};

use crate::element::Element;
use crate::error::{Error, ErrorResult, Fallible};
use crate::layout::Layout;
use crate::load::LoadHandle;
use crate::page::Page;

/// Behaviour behind a registered custom element tag.
pub trait CustomElement {
    fn is_layout_supported(&self, layout: Layout) -> bool {
        layout == Layout::Nodisplay
    }

    /// Called once, the first time the element is attached to a live page.
    fn first_attached_callback(&mut self, _element: &Element, _page: &Page) -> ErrorResult {
        Ok(())
    }

    /// Called when layout decides the element should load its content.
    /// `Ok(None)` means there is nothing to wait for.
    fn load_content(&mut self, element: &Element, page: &Page) -> Fallible<Option<LoadHandle>>;

    /// Called when the element is removed from its page.
    fn detached_callback(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

pub type ElementConstructor = Box<dyn Fn() -> Box<dyn CustomElement>>;

/// Custom element definitions of one page context.
#[derive(Default)]
pub struct ElementRegistry {
    definitions: HashMap<String, ElementConstructor>,
}

impl ElementRegistry {
    pub fn new() -> ElementRegistry {
        ElementRegistry::default()
    }

    /// Define `name`. The first definition of a name wins.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn CustomElement> + 'static,
    {
        let name = name.to_ascii_lowercase();
        if self.definitions.contains_key(&name) {
            warn!("<{}> is already registered, ignoring redefinition", name);
            return;
        }
        debug!("Registered <{}>", name);
        self.definitions.insert(name, Box::new(constructor));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.definitions.contains_key(&name.to_ascii_lowercase())
    }

    /// Pair `element` with a fresh instance of its definition, if there is one.
    pub fn upgrade(&self, element: Element) -> Option<CustomElementHost> {
        let constructor = self.definitions.get(element.local_name())?;
        Some(CustomElementHost::new(element, constructor()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HostState {
    Unattached,
    Attached,
    Detached,
}

/// Drives one element through the lifecycle callbacks of its implementation.
pub struct CustomElementHost {
    element: Element,
    implementation: Box<dyn CustomElement>,
    state: HostState,
    ever_attached: bool,
    /// Set when the first attachment failed. Such an element stays inert.
    attach_error: Option<Error>,
}

impl CustomElementHost {
    pub fn new(element: Element, implementation: Box<dyn CustomElement>) -> CustomElementHost {
        CustomElementHost {
            element,
            implementation,
            state: HostState::Unattached,
            ever_attached: false,
            attach_error: None,
        }
    }

    pub fn implementation(&self) -> &dyn CustomElement {
        &*self.implementation
    }

    pub fn is_attached(&self) -> bool {
        self.state == HostState::Attached
    }

    /// Insert into `page`. The first attachment checks the layout and runs
    /// `first_attached_callback`; if that fails the element stays detached
    /// and every later attachment reports the same error.
    pub fn attach(&mut self, page: &Page) -> ErrorResult {
        if let Some(ref error) = self.attach_error {
            return Err(error.clone());
        }
        if self.state == HostState::Attached {
            return Ok(());
        }
        if !self.ever_attached {
            self.ever_attached = true;
            if let Err(error) = self.first_attach(page) {
                self.attach_error = Some(error.clone());
                return Err(error);
            }
        }
        self.state = HostState::Attached;
        Ok(())
    }

    fn first_attach(&mut self, page: &Page) -> ErrorResult {
        match self.element.layout() {
            Some(layout) if self.implementation.is_layout_supported(layout) => {},
            Some(layout) => return Err(Error::UnsupportedLayout(layout.to_string())),
            None => {
                return Err(Error::UnsupportedLayout(
                    self.element
                        .get_attribute("layout")
                        .unwrap_or_default()
                        .to_owned(),
                ));
            },
        }
        self.implementation
            .first_attached_callback(&self.element, page)
    }

    pub fn load_content(&mut self, page: &Page) -> Fallible<Option<LoadHandle>> {
        if self.state != HostState::Attached {
            return Err(Error::NotAttached);
        }
        self.implementation.load_content(&self.element, page)
    }

    pub fn detach(&mut self) {
        if self.state == HostState::Attached {
            self.state = HostState::Detached;
            self.implementation.detached_callback();
        }
    }
}
