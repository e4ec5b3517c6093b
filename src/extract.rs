/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Reads the item payload a list section embeds in its markup.

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::dom::{Document, NodeId, Selector};
use crate::types::{lenient, FontSize, ItemRecord, ShowcaseError, StyleOptions, PLUGIN_NAME};

pub(crate) const CONTAINER_CLASS: &str = "user-items-list-item-container";
pub(crate) const PAYLOAD_ATTR: &str = "data-current-context";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomOptions {
    #[serde(deserialize_with = "lenient")]
    pub custom_title_font_size: Option<FontSize>,
    #[serde(deserialize_with = "lenient")]
    pub custom_body_font_size: Option<FontSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionOptions {
    #[serde(deserialize_with = "lenient")]
    pub custom_options: CustomOptions,
}

/// Everything extracted from a section's payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShowcaseData {
    #[serde(rename = "userItems", deserialize_with = "lenient_records")]
    pub records: Vec<ItemRecord>,
    #[serde(deserialize_with = "lenient")]
    pub options: SectionOptions,
    #[serde(deserialize_with = "lenient")]
    pub styles: Map<String, Value>,
    #[serde(deserialize_with = "lenient")]
    pub section_title: Option<String>,
    pub section_button: Option<Value>,
}

impl ShowcaseData {
    pub fn style_options(&self) -> StyleOptions {
        let custom = &self.options.custom_options;
        StyleOptions {
            title_font_size: custom.custom_title_font_size.clone(),
            body_font_size: custom.custom_body_font_size.clone(),
        }
    }
}

/// Read each item on its own so one unreadable entry keeps its slot with
/// default fields instead of failing the whole payload.
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<ItemRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("[{PLUGIN_NAME}] userItems is not a list: {other}");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                warn!("[{PLUGIN_NAME}] item {index} unreadable, using defaults: {e}");
                ItemRecord::default()
            })
        })
        .collect())
}

/// Locate the payload container under `root` and parse its JSON.
pub fn extract(document: &Document, root: NodeId) -> Result<ShowcaseData, ShowcaseError> {
    let container = document
        .query_selector(root, &Selector::class(CONTAINER_CLASS))
        .ok_or(ShowcaseError::MissingContainer)?;
    let payload = document
        .attribute(container, PAYLOAD_ATTR)
        .filter(|payload| !payload.is_empty())
        .ok_or(ShowcaseError::MissingPayload)?;
    parse_payload(&payload)
}

pub fn parse_payload(payload: &str) -> Result<ShowcaseData, ShowcaseError> {
    serde_json::from_str(payload).map_err(|e| ShowcaseError::MalformedPayload(e.to_string()))
}
