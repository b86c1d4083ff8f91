/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! `<amp-iframe>`: embeds a third-party document in a sandboxed frame.
//!
//! The source is checked when the element is first attached, and the
//! element's position is checked every time layout asks it to load. Only
//! when both pass is an `<iframe>` created, always with a `sandbox`
//! attribute and with a process-unique `name`.

pub mod loader;

use std::any::Any;
use std::rc::Rc;

use amp_config::IframePrefs;
use amp_element::layout::{get_length_numeral, is_layout_size_defined};
use amp_element::{
    CustomElement, Element, ElementRegistry, Error, ErrorResult, Fallible, Layout, LayoutBox,
    LoadHandle, Page, load_channel,
};
use amp_url::ParsedUrl;
use log::{debug, info, warn};

pub use crate::loader::{FrameLoadQueue, FrameLoader, FrameNameAllocator};

pub const TAG_NAME: &str = "amp-iframe";

/// Attributes copied verbatim from `<amp-iframe>` onto its `<iframe>`.
const PASSTHROUGH_ATTRIBUTES: [&str; 3] = ["frameborder", "allowfullscreen", "allowtransparency"];

const ALLOW_SAME_ORIGIN: &str = "allow-same-origin";

fn sandbox_allows_same_origin(sandbox: &str) -> bool {
    sandbox
        .split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case(ALLOW_SAME_ORIGIN))
}

/// Check that `src` may be embedded in a page at `container_src`, returning
/// `src` unchanged.
///
/// A frame that shares the container's origin must not also be granted
/// `allow-same-origin`, whatever its scheme. Beyond that, only `https`
/// sources are accepted, plus origins under the configured test prefix.
pub fn assert_source(
    src: &str,
    container_src: &str,
    sandbox: Option<&str>,
    prefs: &IframePrefs,
) -> Fallible<String> {
    let container = ParsedUrl::parse(container_src);
    let url = ParsedUrl::parse_with_base(container.url(), src);

    if sandbox.is_some_and(sandbox_allows_same_origin) && url.origin().same_origin(container.origin()) {
        return Err(Error::SandboxOriginCollision {
            src: src.to_owned(),
            container: container_src.to_owned(),
        });
    }

    let is_test_origin = prefs.test_origin_prefix.as_deref().is_some_and(|prefix| {
        url.origin().is_tuple() && url.origin().ascii_serialization().starts_with(prefix)
    });
    if url.scheme() != Some("https") && !is_test_origin {
        return Err(Error::InvalidSourceScheme {
            src: src.to_owned(),
        });
    }

    Ok(src.to_owned())
}

/// The lowest point an embed may start at: the configured pixel bound, or
/// the configured fraction of the viewport when that is smaller.
pub fn min_top(viewport_height: f64, prefs: &IframePrefs) -> f64 {
    prefs
        .min_top_px
        .min(viewport_height * prefs.min_top_viewport_fraction)
}

/// Forbid embeds above the fold.
pub fn assert_position(layout_box: LayoutBox, viewport_height: f64, prefs: &IframePrefs) -> ErrorResult {
    let min_top = min_top(viewport_height, prefs);
    if layout_box.top >= min_top {
        Ok(())
    } else {
        Err(Error::PositionTooHigh {
            top: layout_box.top,
            min_top,
        })
    }
}

/// What every `<amp-iframe>` of a process shares.
#[derive(Clone)]
pub struct IframeContext {
    prefs: IframePrefs,
    names: FrameNameAllocator,
    loader: Rc<dyn FrameLoader>,
}

impl IframeContext {
    pub fn new(prefs: IframePrefs, names: FrameNameAllocator, loader: Rc<dyn FrameLoader>) -> Self {
        IframeContext {
            prefs,
            names,
            loader,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EmbedState {
    Unattached,
    /// Attached with a validated source, or with none at all.
    Attached { src: Option<String> },
    /// The source failed validation; no frame will ever be created.
    Inert,
    FrameCreated { src: String },
}

pub struct AmpIframe {
    context: IframeContext,
    state: EmbedState,
    frame: Option<Element>,
}

impl AmpIframe {
    pub fn new(context: IframeContext) -> AmpIframe {
        AmpIframe {
            context,
            state: EmbedState::Unattached,
            frame: None,
        }
    }

    pub fn state(&self) -> &EmbedState {
        &self.state
    }

    /// The `<iframe>` child, once created.
    pub fn frame(&self) -> Option<&Element> {
        self.frame.as_ref()
    }

    fn create_frame(&mut self, element: &Element, src: &str) -> LoadHandle {
        let mut iframe = Element::new("iframe");
        iframe.apply_fill_content();
        if let Some(width) = get_length_numeral(element.get_attribute("width")) {
            iframe.set_attribute("width", &width.to_string());
        }
        if let Some(height) = get_length_numeral(element.get_attribute("height")) {
            iframe.set_attribute("height", &height.to_string());
        }
        let name = self.context.names.next_name();
        iframe.set_attribute("name", &name);
        element.propagate_attributes(&PASSTHROUGH_ATTRIBUTES, &mut iframe);
        // An absent sandbox attribute would mean "fully trusted".
        iframe.set_attribute("sandbox", element.get_attribute("sandbox").unwrap_or_default());
        iframe.set_attribute("src", src);

        let (signal, handle) = load_channel();
        self.context.loader.begin_load(&iframe, signal);
        info!("Created frame {} for {}", name, src);
        self.frame = Some(iframe);
        self.state = EmbedState::FrameCreated {
            src: src.to_owned(),
        };
        handle
    }
}

impl CustomElement for AmpIframe {
    fn is_layout_supported(&self, layout: Layout) -> bool {
        is_layout_size_defined(layout)
    }

    fn first_attached_callback(&mut self, element: &Element, page: &Page) -> ErrorResult {
        if self.state != EmbedState::Unattached {
            return Ok(());
        }
        let Some(src) = element.get_attribute("src").filter(|src| !src.is_empty()) else {
            debug!("<amp-iframe> without src stays empty");
            self.state = EmbedState::Attached { src: None };
            return Ok(());
        };
        match assert_source(src, page.url(), element.get_attribute("sandbox"), &self.context.prefs) {
            Ok(src) => {
                self.state = EmbedState::Attached { src: Some(src) };
                Ok(())
            },
            Err(error) => {
                warn!("{}", error);
                self.state = EmbedState::Inert;
                Err(error)
            },
        }
    }

    fn load_content(&mut self, element: &Element, page: &Page) -> Fallible<Option<LoadHandle>> {
        let src = match self.state {
            EmbedState::Unattached => return Err(Error::NotAttached),
            EmbedState::Attached { src: Some(ref src) } => src.clone(),
            EmbedState::Attached { src: None } |
            EmbedState::Inert |
            EmbedState::FrameCreated { .. } => return Ok(None),
        };
        // Layout may have moved the element since it was attached.
        assert_position(element.layout_box(), page.viewport().height, &self.context.prefs)?;
        Ok(Some(self.create_frame(element, &src)))
    }

    /// Drop the frame but keep the validated source, so a re-attached
    /// element loads into a fresh frame.
    fn detached_callback(&mut self) {
        if let Some(frame) = self.frame.take() {
            debug!("Removed frame {:?}", frame.get_attribute("name"));
        }
        if let EmbedState::FrameCreated { ref src } = self.state {
            self.state = EmbedState::Attached {
                src: Some(src.clone()),
            };
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Register `<amp-iframe>` with a page's element registry.
pub fn install_iframe(registry: &mut ElementRegistry, context: IframeContext) {
    registry.register(TAG_NAME, move || Box::new(AmpIframe::new(context.clone())));
}
