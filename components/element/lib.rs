/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! The small slice of a document model that AMP components are written
//! against: elements with attributes and a layout box, pages that own them,
//! and the custom element lifecycle (first attach, load content, detach).

pub mod custom_element;
pub mod element;
pub mod error;
pub mod layout;
pub mod load;
pub mod page;

pub use crate::custom_element::{CustomElement, CustomElementHost, ElementRegistry};
pub use crate::element::Element;
pub use crate::error::{Error, ErrorResult, Fallible};
pub use crate::layout::{Layout, LayoutBox, ViewportSize};
pub use crate::load::{LoadHandle, LoadSignal, load_channel};
pub use crate::page::{Page, PageId};
