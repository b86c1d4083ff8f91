/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]
#![crate_name = "amp_url"]
#![crate_type = "rlib"]

pub mod origin;

use std::fmt;
use std::sync::Arc;

use log::debug;
use url::Url;

pub use crate::origin::{ImmutableOrigin, OpaqueOrigin};

#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AmpUrl(Arc<Url>);

impl AmpUrl {
    pub fn from_url(url: Url) -> Self {
        AmpUrl(Arc::new(url))
    }

    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(Self::from_url)
    }

    pub fn parse_with_base(base: Option<&Self>, input: &str) -> Result<Self, url::ParseError> {
        Url::options()
            .base_url(base.map(|b| &*b.0))
            .parse(input)
            .map(Self::from_url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn origin(&self) -> ImmutableOrigin {
        ImmutableOrigin::new(self.0.origin())
    }
}

impl fmt::Debug for AmpUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.0.as_str().fmt(formatter)
    }
}

/// A declared URL string parsed leniently.
///
/// Markup attributes are author input, so a malformed value is not an error
/// here. It simply has no scheme and an opaque origin, which compares unequal
/// to every other origin, including another parse of the same string.
#[derive(Clone, Debug)]
pub struct ParsedUrl {
    url: Option<AmpUrl>,
    origin: ImmutableOrigin,
}

impl ParsedUrl {
    pub fn parse(input: &str) -> ParsedUrl {
        ParsedUrl::parse_with_base(None, input)
    }

    /// Parse `input`, resolving it against `base` when it is relative.
    pub fn parse_with_base(base: Option<&AmpUrl>, input: &str) -> ParsedUrl {
        match AmpUrl::parse_with_base(base, input) {
            Ok(url) => ParsedUrl {
                origin: url.origin(),
                url: Some(url),
            },
            Err(error) => {
                debug!("Treating {:?} as opaque ({}).", input, error);
                ParsedUrl {
                    url: None,
                    origin: ImmutableOrigin::new_opaque(),
                }
            },
        }
    }

    pub fn url(&self) -> Option<&AmpUrl> {
        self.url.as_ref()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.url.as_ref().map(AmpUrl::scheme)
    }

    pub fn origin(&self) -> &ImmutableOrigin {
        &self.origin
    }
}
