/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Website showcase: turns list-section items into clickable previews that
//! open the linked site in a framed popup.
//!
//! The crate runs against its own page model rather than a browser:
//!
//! - **[`Page`]**: document tree, origin, virtual clock and deferred tasks.
//!   The host feeds it clicks, key presses, frame load signals and time.
//! - **[`ShowcaseEngine`]**: mounts one [`ShowcaseInstance`] per section
//!   whose id starts with `website-showcase` and routes input to it.
//!
//! # Example
//!
//! ```no_run
//! use website_showcase::{Page, ShowcaseConfig, ShowcaseEngine, ShowcaseOptions};
//!
//! let mut page = Page::new("https://studio.example.com/work").unwrap();
//! // ... populate page.document_mut() with the section markup ...
//! let mut engine = ShowcaseEngine::new(ShowcaseOptions::default(), ShowcaseConfig::new());
//! engine.mount(&mut page);
//!
//! let overlay = engine.instances()[0].overlays(&page)[0];
//! engine.click(&mut page, overlay).unwrap();
//! engine.advance_time(&mut page, 16);
//! ```

mod config;
mod dom;
mod engine;
mod extract;
mod instance;
mod overlay;
mod page;
mod popup;
mod types;

pub use config::{ShowcaseConfig, ShowcaseOptions};
pub use dom::{escape_attr, escape_text, Document, NodeId, Selector};
pub use engine::{ShowcaseEngine, EDIT_MODE_CLASS};
pub use extract::{extract, parse_payload, CustomOptions, SectionOptions, ShowcaseData};
pub use instance::ShowcaseInstance;
pub use overlay::{bind as bind_overlays, unbind as unbind_overlays, OverlayData};
pub use page::{Page, PendingTask};
pub use popup::{absolute_url, OpenRequest, PopupController, PopupState};
pub use types::{
    ClickOutcome, DisplaySettings, EventListener, FontSize, InfoPosition, InfoPositionMobile,
    ItemButton, ItemRecord, Layout, SettingsOverride, ShowcaseError, ShowcaseEvent,
    StyleOptions, SubscriptionId, PLUGIN_NAME,
};
