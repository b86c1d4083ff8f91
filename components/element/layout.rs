/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use strum::{Display, EnumString};

/// The `layout` attribute values understood by the runtime.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum Layout {
    Nodisplay,
    Fixed,
    FixedHeight,
    Responsive,
    Container,
    Fill,
    FlexItem,
}

/// Whether the layout gives the element a size before its content loads.
pub fn is_layout_size_defined(layout: Layout) -> bool {
    matches!(
        layout,
        Layout::Fixed |
            Layout::FixedHeight |
            Layout::Responsive |
            Layout::Fill |
            Layout::FlexItem
    )
}

/// The numeric part of a CSS length such as `"300px"`; `None` for `"auto"`
/// and anything without a leading number.
pub fn get_length_numeral(length: Option<&str>) -> Option<f64> {
    let length = length?.trim();
    let end = length
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(length.len());
    length[..end].parse().ok()
}

/// Position and size of an element relative to the top of the page, in CSS px.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> LayoutBox {
        LayoutBox {
            top,
            left,
            width,
            height,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> ViewportSize {
        ViewportSize { width, height }
    }
}
