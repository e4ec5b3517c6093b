/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared public types used across all layers.

use std::fmt;
use std::rc::Rc;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dom::NodeId;

/// Name stamped on roots and popups, and the id prefix of eligible roots.
pub const PLUGIN_NAME: &str = "website-showcase";

// ---------------------------------------------------------------------------
// Item data
// ---------------------------------------------------------------------------

/// One list item as delivered by the page's embedded content payload.
///
/// Every field is read leniently: numbers and booleans become text, and
/// values of the wrong shape fall back to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// May contain markup; rendered unescaped in the info panel.
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient")]
    pub button: ItemButton,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemButton {
    #[serde(deserialize_with = "lenient_string")]
    pub button_link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub button_text: String,
}

/// A font size override such as `{ "value": 1.4, "unit": "rem" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSize {
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl FontSize {
    /// CSS length, defaulting the unit to `rem`.
    pub fn to_css(&self) -> String {
        let unit = match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => unit,
            _ => "rem",
        };
        format!("{}{}", self.value, unit)
    }
}

/// Font-size overrides applied to the popup as scoped style variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOptions {
    pub title_font_size: Option<FontSize>,
    pub body_font_size: Option<FontSize>,
}

// ---------------------------------------------------------------------------
// Display settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Only the embedded page, centered.
    #[default]
    Basic,
    /// Embedded page plus a side panel with title, description and link.
    Info,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Basic => "basic",
            Layout::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoPosition {
    Left,
    #[default]
    Right,
}

impl InfoPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InfoPosition::Left => "left",
            InfoPosition::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoPositionMobile {
    Above,
    #[default]
    Below,
}

impl InfoPositionMobile {
    pub fn as_str(self) -> &'static str {
        match self {
            InfoPositionMobile::Above => "above",
            InfoPositionMobile::Below => "below",
        }
    }
}

/// Per-instance display settings. Immutable once an instance is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub layout: Layout,
    pub info_position: InfoPosition,
    pub info_position_mobile: InfoPositionMobile,
}

/// Caller-supplied overrides; unset fields keep the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsOverride {
    pub layout: Option<Layout>,
    pub info_position: Option<InfoPosition>,
    pub info_position_mobile: Option<InfoPositionMobile>,
}

impl DisplaySettings {
    pub fn merged(overrides: &SettingsOverride) -> Self {
        let defaults = Self::default();
        Self {
            layout: overrides.layout.unwrap_or(defaults.layout),
            info_position: overrides.info_position.unwrap_or(defaults.info_position),
            info_position_mobile: overrides
                .info_position_mobile
                .unwrap_or(defaults.info_position_mobile),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

/// Lifecycle notifications raised by an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowcaseEvent {
    BeforeInit { root: NodeId },
    AfterInit { root: NodeId },
    /// `url` is the link as stored on the overlay, before normalization.
    PopupOpen { url: String, title: String, root: NodeId },
    PopupClose { root: NodeId },
    Destroy { root: NodeId },
}

impl ShowcaseEvent {
    /// Event name in the `wm-website-showcase:<type>` form page scripts know.
    pub fn name(&self) -> &'static str {
        match self {
            ShowcaseEvent::BeforeInit { .. } => "wm-website-showcase:beforeInit",
            ShowcaseEvent::AfterInit { .. } => "wm-website-showcase:afterInit",
            ShowcaseEvent::PopupOpen { .. } => "wm-website-showcase:popupOpen",
            ShowcaseEvent::PopupClose { .. } => "wm-website-showcase:popupClose",
            ShowcaseEvent::Destroy { .. } => "wm-website-showcase:destroy",
        }
    }

    pub fn root(&self) -> NodeId {
        match self {
            ShowcaseEvent::BeforeInit { root }
            | ShowcaseEvent::AfterInit { root }
            | ShowcaseEvent::PopupOpen { root, .. }
            | ShowcaseEvent::PopupClose { root }
            | ShowcaseEvent::Destroy { root } => *root,
        }
    }
}

/// Callback registered for lifecycle notifications.
pub type EventListener = Rc<dyn Fn(&ShowcaseEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// What the host should do with a click after the widget saw it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    pub handled: bool,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while extracting data or driving the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowcaseError {
    /// The root has no `.user-items-list-item-container` descendant.
    MissingContainer,
    /// The container has no `data-current-context` attribute.
    MissingPayload,
    /// The payload is not valid JSON of the expected shape.
    MalformedPayload(String),
    /// The per-section settings table could not be parsed.
    InvalidConfig(String),
    /// A URL given to the page could not be parsed.
    InvalidUrl(String),
    /// A selector string could not be parsed.
    InvalidSelector(String),
    /// A node id does not belong to the page's document.
    UnknownNode,
}

impl fmt::Display for ShowcaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowcaseError::MissingContainer => write!(f, "no item container found"),
            ShowcaseError::MissingPayload => write!(f, "no data-current-context found"),
            ShowcaseError::MalformedPayload(msg) => write!(f, "malformed item payload: {msg}"),
            ShowcaseError::InvalidConfig(msg) => write!(f, "invalid settings: {msg}"),
            ShowcaseError::InvalidUrl(msg) => write!(f, "invalid URL: {msg}"),
            ShowcaseError::InvalidSelector(sel) => write!(f, "unsupported selector: {sel}"),
            ShowcaseError::UnknownNode => write!(f, "node does not belong to this document"),
        }
    }
}

impl std::error::Error for ShowcaseError {}

/// Read `T`, treating `null` or a value of the wrong shape as missing.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("[{PLUGIN_NAME}] ignoring unreadable value: {e}");
        T::default()
    }))
}

/// Read text from any JSON scalar. Arrays and objects become empty.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Number(n) => {
            warn!("[{PLUGIN_NAME}] using number {n} as text");
            n.to_string()
        }
        Value::Bool(b) => {
            warn!("[{PLUGIN_NAME}] using boolean {b} as text");
            b.to_string()
        }
        other => {
            warn!("[{PLUGIN_NAME}] ignoring non-text value {other}");
            String::new()
        }
    })
}
