/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::str::FromStr;

use indexmap::IndexMap;
use log::warn;

use crate::layout::{Layout, LayoutBox};

/// Class added to children that should cover their parent's box.
pub const FILL_CONTENT_CLASS: &str = "-amp-fill-content";

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    local_name: String,
    attrs: IndexMap<String, String>,
    layout_box: LayoutBox,
}

impl Element {
    pub fn new(local_name: &str) -> Element {
        Element {
            local_name: local_name.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            layout_box: LayoutBox::default(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Element {
        self.set_attribute(name, value);
        self
    }

    pub fn with_layout_box(mut self, layout_box: LayoutBox) -> Element {
        self.layout_box = layout_box;
        self
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attrs
            .insert(name.to_ascii_lowercase(), value.to_owned());
    }

    pub fn layout_box(&self) -> LayoutBox {
        self.layout_box
    }

    pub fn set_layout_box(&mut self, layout_box: LayoutBox) {
        self.layout_box = layout_box;
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.get_attribute("class") {
            Some(classes) if !classes.trim().is_empty() => format!("{} {}", classes.trim(), class),
            _ => class.to_owned(),
        };
        self.set_attribute("class", &classes);
    }

    /// Mark `self` as a child that covers its parent's box.
    pub fn apply_fill_content(&mut self) {
        self.add_class(FILL_CONTENT_CLASS);
    }

    /// The declared layout, or the one implied by `width` and `height`.
    /// `None` when the `layout` attribute holds an unknown value.
    pub fn layout(&self) -> Option<Layout> {
        if let Some(layout) = self.get_attribute("layout") {
            return match Layout::from_str(layout.trim()) {
                Ok(layout) => Some(layout),
                Err(_) => {
                    warn!("Unknown layout {:?} on <{}>", layout, self.local_name);
                    None
                },
            };
        }
        let width = self.get_attribute("width").filter(|width| *width != "auto");
        match (width, self.get_attribute("height")) {
            (Some(_), Some(_)) => Some(Layout::Fixed),
            (None, Some(_)) => Some(Layout::FixedHeight),
            _ => Some(Layout::Container),
        }
    }

    /// Copy each of `names` that is present on `self` onto `target` verbatim.
    pub fn propagate_attributes(&self, names: &[&str], target: &mut Element) {
        for name in names {
            if let Some(value) = self.get_attribute(name) {
                target.set_attribute(name, value);
            }
        }
    }
}
