/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Attaches one clickable overlay to the media region of every list item.
//!
//! Binding keeps no state of its own: an overlay already present in a media
//! region is the only record that the region was bound. That makes it safe
//! to run again whenever a carousel or infinite scroll clones items.

use log::debug;

use crate::dom::{Document, NodeId, Selector};
use crate::types::ItemRecord;

pub(crate) const OVERLAY_CLASS: &str = "wm-showcase-overlay";
pub(crate) const OVERLAY_TEXT_CLASS: &str = "wm-showcase-overlay-text";
pub(crate) const MEDIA_CLASS: &str = "wm-showcase-media";

const ATTR_LINK: &str = "data-button-link";
const ATTR_BUTTON_TEXT: &str = "data-button-text";
const ATTR_TITLE: &str = "data-item-title";
const ATTR_DESCRIPTION: &str = "data-item-description";

const DEFAULT_LINK: &str = "#";
const DEFAULT_BUTTON_TEXT: &str = "View Site";
const DEFAULT_TITLE: &str = "Website Preview";

/// Grid, carousel and simple-list item shapes.
const ITEM_CLASSES: &[&str] = &["list-item", "user-items-list-simple__item", "preFade"];

const MEDIA_INNER_CLASSES: &[&str] = &[
    "user-items-list-carousel__media-inner",
    "user-items-list__media-inner",
    "list-item-media-inner",
    "user-items-list-simple__media-inner",
];

const MEDIA_CONTAINER_CLASSES: &[&str] = &[
    "user-items-list-carousel__media-container",
    "user-items-list__media-container",
    "list-item-media-container",
    "user-items-list-simple__media-container",
];

/// The data an overlay carries to open its popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayData {
    pub link: String,
    pub button_text: String,
    pub title: String,
    pub description: String,
}

impl OverlayData {
    /// Fill gaps in a record with the display defaults.
    pub fn from_record(record: &ItemRecord) -> Self {
        Self {
            link: or_default(&record.button.button_link, DEFAULT_LINK),
            button_text: or_default(&record.button.button_text, DEFAULT_BUTTON_TEXT),
            title: or_default(&record.title, DEFAULT_TITLE),
            description: record.description.clone(),
        }
    }

    /// Read the data back from an overlay element.
    pub fn from_element(document: &Document, overlay: NodeId) -> Self {
        let read = |name: &str, default: &str| {
            document
                .attribute(overlay, name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            link: read(ATTR_LINK, DEFAULT_LINK),
            button_text: read(ATTR_BUTTON_TEXT, DEFAULT_BUTTON_TEXT),
            title: read(ATTR_TITLE, DEFAULT_TITLE),
            description: read(ATTR_DESCRIPTION, ""),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

pub(crate) fn overlay_selector() -> Selector {
    Selector::class(OVERLAY_CLASS)
}

fn media_inner_selector() -> Selector {
    Selector::any_class(MEDIA_INNER_CLASSES).or(Selector::attr_equals(
        "data-animation-role",
        "image",
    ))
}

/// Find the element the overlay should cover: the inner media wrapper if
/// present, else the media container.
fn media_region(document: &Document, item: NodeId) -> Option<NodeId> {
    document
        .query_selector(item, &media_inner_selector())
        .or_else(|| document.query_selector(item, &Selector::any_class(MEDIA_CONTAINER_CLASSES)))
}

/// Attach overlays to every item under `root` that lacks one. Item `i` is
/// bound to `records[i % records.len()]`. Returns the number created.
pub fn bind(document: &mut Document, root: NodeId, records: &[ItemRecord]) -> usize {
    if records.is_empty() {
        return 0;
    }

    let items = document.query_selector_all(root, &Selector::any_class(ITEM_CLASSES));
    let mut created = 0;
    for (index, item) in items.into_iter().enumerate() {
        let Some(record) = records.get(index % records.len()) else {
            continue;
        };
        let Some(media) = media_region(document, item) else {
            continue;
        };
        if document.query_selector(media, &overlay_selector()).is_some() {
            continue;
        }

        document.add_class(media, MEDIA_CLASS);
        let data = OverlayData::from_record(record);
        let overlay = document.append_element(media, "div", &[OVERLAY_CLASS]);
        let text = document.append_element(overlay, "span", &[OVERLAY_TEXT_CLASS]);
        document.append_text(text, &data.button_text);
        document.set_attribute(overlay, ATTR_LINK, &data.link);
        document.set_attribute(overlay, ATTR_BUTTON_TEXT, &data.button_text);
        document.set_attribute(overlay, ATTR_TITLE, &data.title);
        document.set_attribute(overlay, ATTR_DESCRIPTION, &data.description);
        created += 1;
    }

    if created > 0 {
        debug!("bound {created} overlays");
    }
    created
}

/// Remove every overlay and media marker under `root`.
pub fn unbind(document: &mut Document, root: NodeId) {
    for overlay in document.query_selector_all(root, &overlay_selector()) {
        document.remove(overlay);
    }
    for media in document.query_selector_all(root, &Selector::class(MEDIA_CLASS)) {
        document.remove_class(media, MEDIA_CLASS);
    }
}
