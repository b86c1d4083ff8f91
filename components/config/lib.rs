/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

pub mod prefs;

pub use crate::prefs::{IframePrefs, PrefError, PrefValue, Preferences, RenderDelayPrefs};

pub fn amp_version() -> String {
    let cargo_version = env!("CARGO_PKG_VERSION");
    let git_info = option_env!("GIT_INFO");
    match git_info {
        Some(info) => format!("AMP {}{}", cargo_version, info),
        None => format!("AMP {}", cargo_version),
    }
}
