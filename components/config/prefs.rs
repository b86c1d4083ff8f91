/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Preferences consumed by the embed element and the render-delay gate.
//!
//! There is no global preference store: a [`Preferences`] value is built once
//! (from defaults, a JSON file and `name=value` overrides) and handed to the
//! components that need it.

use std::fmt;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Preferences {
    pub iframe: IframePrefs,
    pub render_delay: RenderDelayPrefs,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IframePrefs {
    /// Prefix of the `name` given to every frame; a counter value follows it.
    pub name_prefix: String,
    /// Absolute lower bound, in px, for how far down an embed must start.
    pub min_top_px: f64,
    /// Fraction of the viewport height an embed must start below, when that
    /// is smaller than `min_top_px`.
    pub min_top_viewport_fraction: f64,
    /// Origins whose ASCII serialization starts with this prefix are accepted
    /// without `https`. Used for same-process testing; `None` disables it.
    pub test_origin_prefix: Option<String>,
}

impl Default for IframePrefs {
    fn default() -> Self {
        IframePrefs {
            name_prefix: "amp_iframe".to_owned(),
            min_top_px: 600.0,
            min_top_viewport_fraction: 0.75,
            test_origin_prefix: Some("http://iframe.localhost:".to_owned()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderDelayPrefs {
    /// Extensions that hold back page reveal when declared on a page.
    /// Every entry delays every page that uses it, so keep this short.
    pub extensions: Vec<String>,
    pub timeout_ms: u64,
}

impl RenderDelayPrefs {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RenderDelayPrefs {
    fn default() -> Self {
        RenderDelayPrefs {
            extensions: vec![
                "amp-accordion".to_owned(),
                "amp-dynamic-css-classes".to_owned(),
            ],
            timeout_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PrefValue {
    /// Interpret a command line value the way a user most likely meant it.
    pub fn from_booleanish_str(input: &str) -> Self {
        match input {
            "false" => PrefValue::Bool(false),
            "true" => PrefValue::Bool(true),
            _ => input
                .parse::<i64>()
                .map(PrefValue::Int)
                .or_else(|_| input.parse::<f64>().map(PrefValue::Float))
                .unwrap_or_else(|_| PrefValue::Str(input.to_owned())),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            PrefValue::Int(value) => Some(value as f64),
            PrefValue::Float(value) => Some(value),
            _ => None,
        }
    }

    fn as_string(&self) -> String {
        match *self {
            PrefValue::Bool(value) => value.to_string(),
            PrefValue::Int(value) => value.to_string(),
            PrefValue::Float(value) => value.to_string(),
            PrefValue::Str(ref value) => value.clone(),
        }
    }
}

fn is_valid_min_top_px(px: f64) -> bool {
    px.is_finite() && px >= 0.0
}

fn is_valid_fraction(fraction: f64) -> bool {
    (0.0..=1.0).contains(&fraction)
}

#[derive(Debug)]
pub enum PrefError {
    NoSuchPref(String),
    InvalidValue { name: String, value: PrefValue },
    JsonParseErr(serde_json::Error),
}

impl fmt::Display for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PrefError::NoSuchPref(ref name) => write!(f, "Unknown preference {:?}", name),
            PrefError::InvalidValue {
                ref name,
                ref value,
            } => write!(f, "Invalid value {:?} for preference {:?}", value, name),
            PrefError::JsonParseErr(ref error) => write!(f, "Could not parse preferences: {}", error),
        }
    }
}

impl std::error::Error for PrefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            PrefError::JsonParseErr(ref error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PrefError {
    fn from(error: serde_json::Error) -> Self {
        PrefError::JsonParseErr(error)
    }
}

impl Preferences {
    /// Read preferences from JSON. Missing fields keep their defaults;
    /// unknown fields and out of range values are errors, as they are for
    /// [`Preferences::set`].
    pub fn from_json(json: &str) -> Result<Preferences, PrefError> {
        let mut prefs: Preferences = serde_json::from_str(json)?;
        if !is_valid_min_top_px(prefs.iframe.min_top_px) {
            return Err(PrefError::InvalidValue {
                name: "iframe.min_top_px".to_owned(),
                value: PrefValue::Float(prefs.iframe.min_top_px),
            });
        }
        if !is_valid_fraction(prefs.iframe.min_top_viewport_fraction) {
            return Err(PrefError::InvalidValue {
                name: "iframe.min_top_viewport_fraction".to_owned(),
                value: PrefValue::Float(prefs.iframe.min_top_viewport_fraction),
            });
        }
        if prefs.iframe.test_origin_prefix.as_deref() == Some("") {
            prefs.iframe.test_origin_prefix = None;
        }
        Ok(prefs)
    }

    /// Apply a `name=value` override. A bare `name` means `name=true`.
    pub fn set_from_command_line(&mut self, pref: &str) -> Result<(), PrefError> {
        let mut split = pref.splitn(2, '=');
        let name = split.next().unwrap_or_default().trim();
        let value = split
            .next()
            .map(|value| PrefValue::from_booleanish_str(value.trim()))
            .unwrap_or(PrefValue::Bool(true));
        self.set(name, value)
    }

    pub fn set(&mut self, name: &str, value: PrefValue) -> Result<(), PrefError> {
        let invalid = |value: PrefValue| PrefError::InvalidValue {
            name: name.to_owned(),
            value,
        };
        match name {
            "iframe.name_prefix" => self.iframe.name_prefix = value.as_string(),
            "iframe.min_top_px" => match value.as_f64() {
                Some(px) if is_valid_min_top_px(px) => self.iframe.min_top_px = px,
                _ => return Err(invalid(value)),
            },
            "iframe.min_top_viewport_fraction" => match value.as_f64() {
                Some(fraction) if is_valid_fraction(fraction) => {
                    self.iframe.min_top_viewport_fraction = fraction
                },
                _ => return Err(invalid(value)),
            },
            "iframe.test_origin_prefix" => {
                self.iframe.test_origin_prefix = match value {
                    PrefValue::Bool(false) => None,
                    PrefValue::Str(ref prefix) if prefix.is_empty() => None,
                    PrefValue::Str(prefix) => Some(prefix),
                    other => return Err(invalid(other)),
                }
            },
            "render_delay.extensions" => {
                self.render_delay.extensions = value
                    .as_string()
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned)
                    .collect()
            },
            "render_delay.timeout_ms" => match value {
                PrefValue::Int(ms) if ms >= 0 => self.render_delay.timeout_ms = ms as u64,
                other => return Err(invalid(other)),
            },
            _ => return Err(PrefError::NoSuchPref(name.to_owned())),
        }
        debug!("Set preference {}", name);
        Ok(())
    }
}
