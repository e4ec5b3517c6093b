/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Engine timing options and the per-section settings table.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::{DisplaySettings, SettingsOverride, ShowcaseError};

/// Timing knobs shared by every instance of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowcaseOptions {
    /// A frame that reports "loaded" sooner than this after open is assumed
    /// to be a refusal page rather than the target site (default: 200).
    ///
    /// This is a heuristic: genuinely fast pages are reported as blocked.
    pub load_block_threshold_ms: u64,
    /// Length of the close animation; the popup is detached after it
    /// (default: 300).
    pub close_delay_ms: u64,
    /// Delay standing in for the next animation frame (default: 16).
    pub frame_interval_ms: u64,
}

impl Default for ShowcaseOptions {
    fn default() -> Self {
        Self {
            load_block_threshold_ms: 200,
            close_delay_ms: 300,
            frame_interval_ms: 16,
        }
    }
}

/// Page-wide settings keyed by section element id.
///
/// Deserializes from the same shape page scripts use:
///
/// ```json
/// { "website-showcase-1": { "layout": "info", "infoPosition": "left" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ShowcaseConfig {
    sections: HashMap<String, SettingsOverride>,
}

impl ShowcaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ShowcaseError> {
        serde_json::from_str(json).map_err(|e| ShowcaseError::InvalidConfig(e.to_string()))
    }

    /// Register overrides for the section with the given id.
    pub fn with_section(mut self, id: &str, overrides: SettingsOverride) -> Self {
        self.sections.insert(id.to_string(), overrides);
        self
    }

    pub fn overrides_for(&self, id: &str) -> Option<&SettingsOverride> {
        self.sections.get(id)
    }

    /// Effective settings for a section: its overrides over the defaults.
    pub fn settings_for(&self, id: &str) -> DisplaySettings {
        self.overrides_for(id)
            .map(DisplaySettings::merged)
            .unwrap_or_default()
    }
}
