/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The JSON description of a page the shell runs.
//!
//! ```json
//! {
//!   "url": "https://pub.example/article.html",
//!   "viewport": { "width": 400, "height": 800 },
//!   "elements": [
//!     { "tag": "script", "attributes": { "custom-element": "amp-accordion" } },
//!     { "tag": "amp-iframe", "top": 900,
//!       "attributes": { "src": "https://example.com/a", "width": "300", "height": "250" } }
//!   ],
//!   "ready_after_ms": { "amp-accordion": 250 },
//!   "failing_frames": ["https://example.com/broken"]
//! }
//! ```

use std::collections::BTreeMap;

use amp_element::{Element, LayoutBox, Page, ViewportSize};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PageManifest {
    pub url: String,
    #[serde(default)]
    pub viewport: ViewportManifest,
    #[serde(default)]
    pub elements: Vec<ElementManifest>,
    /// When each extension reports ready, in ms after startup. Extensions
    /// missing here never report.
    #[serde(default)]
    pub ready_after_ms: BTreeMap<String, u64>,
    /// Frame sources whose load fails.
    #[serde(default)]
    pub failing_frames: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewportManifest {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportManifest {
    fn default() -> Self {
        ViewportManifest {
            width: 400.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ElementManifest {
    pub tag: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
}

impl ElementManifest {
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(&self.tag);
        for (name, value) in &self.attributes {
            element.set_attribute(name, value);
        }
        let width = amp_element::layout::get_length_numeral(element.get_attribute("width"));
        let height = amp_element::layout::get_length_numeral(element.get_attribute("height"));
        element.set_layout_box(LayoutBox::new(
            self.top,
            self.left,
            width.unwrap_or_default(),
            height.unwrap_or_default(),
        ));
        element
    }
}

impl PageManifest {
    pub fn from_json(json: &str) -> serde_json::Result<PageManifest> {
        serde_json::from_str(json)
    }

    pub fn to_page(&self) -> Page {
        let viewport = ViewportSize::new(self.viewport.width, self.viewport.height);
        self.elements
            .iter()
            .fold(Page::new(&self.url, viewport), |page, element| {
                page.with_element(element.to_element())
            })
    }
}
