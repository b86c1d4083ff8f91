/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::atomic::{AtomicU32, Ordering};

use crate::element::Element;
use crate::layout::ViewportSize;

static PAGE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PageId(u32);

impl PageId {
    pub fn next() -> Self {
        Self(PAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A loaded document: its location, the viewport it is shown in and the
/// elements declared in it, in document order.
#[derive(Clone, Debug)]
pub struct Page {
    id: PageId,
    url: String,
    viewport: ViewportSize,
    elements: Vec<Element>,
}

impl Page {
    pub fn new(url: &str, viewport: ViewportSize) -> Page {
        Page {
            id: PageId::next(),
            url: url.to_owned(),
            viewport,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: Element) -> Page {
        self.elements.push(element);
        self
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// The page location exactly as it was given.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn push_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Whether an element (normally an extension `<script>`) declares
    /// `custom-element="name"`. The comparison is exact and case-sensitive.
    pub fn declares_custom_element(&self, name: &str) -> bool {
        self.elements
            .iter()
            .any(|element| element.get_attribute("custom-element") == Some(name))
    }

    /// Distinct `custom-element` declarations, in first-seen document order.
    pub fn declared_custom_elements(&self) -> Vec<&str> {
        let mut declared: Vec<&str> = Vec::new();
        for name in self
            .elements
            .iter()
            .filter_map(|element| element.get_attribute("custom-element"))
        {
            if !declared.contains(&name) {
                declared.push(name);
            }
        }
        declared
    }
}
