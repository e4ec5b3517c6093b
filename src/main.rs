/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Preview CLI: renders a section payload into a synthetic list section,
//! mounts the showcase on it, optionally opens one item, and prints the
//! resulting page markup.
//!
//! ```bash
//! website-showcase --payload items.json
//! website-showcase --payload items.json --layout info --open 0 --load-after 900
//! website-showcase --payload items.json --open 1 --output preview.html
//! ```

use std::process;

use bpaf::Bpaf;
use log::error;
use url::Url;
use website_showcase::{
    Document, InfoPosition, InfoPositionMobile, Layout, Page, SettingsOverride, ShowcaseConfig,
    ShowcaseEngine, ShowcaseOptions, PLUGIN_NAME,
};

// ---------------------------------------------------------------------------
// CLI parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, usage("website-showcase [OPTIONS] --payload <PATH>"))]
struct PreviewConfig {
    /// JSON payload as embedded in the section's data-current-context
    #[bpaf(long, short, argument("PATH"))]
    payload: String,

    /// Popup layout: basic or info
    #[bpaf(long, argument::<String>("LAYOUT"), parse(parse_layout), fallback(Layout::Basic))]
    layout: Layout,

    /// Side of the info panel on wide screens: left or right
    #[bpaf(
        long,
        argument::<String>("SIDE"),
        parse(parse_info_position),
        fallback(InfoPosition::Right)
    )]
    info_position: InfoPosition,

    /// Placement of the info panel on narrow screens: above or below
    #[bpaf(
        long,
        argument::<String>("PLACEMENT"),
        parse(parse_info_position_mobile),
        fallback(InfoPositionMobile::Below)
    )]
    info_position_mobile: InfoPositionMobile,

    /// Page location that relative links resolve against
    #[bpaf(long, argument::<String>("URL"), parse(parse_url), optional)]
    origin: Option<Url>,

    /// Open the popup for the item at this index
    #[bpaf(long, argument("INDEX"))]
    open: Option<usize>,

    /// Simulate the frame finishing its load this many ms after opening
    #[bpaf(long, argument("MS"))]
    load_after: Option<u64>,

    /// Write the HTML to this file instead of stdout
    #[bpaf(long, short, argument("PATH"))]
    output: Option<String>,
}

fn parse_layout(s: String) -> Result<Layout, String> {
    match s.as_str() {
        "basic" => Ok(Layout::Basic),
        "info" => Ok(Layout::Info),
        other => Err(format!("unknown layout {other:?}, expected basic or info")),
    }
}

fn parse_info_position(s: String) -> Result<InfoPosition, String> {
    match s.as_str() {
        "left" => Ok(InfoPosition::Left),
        "right" => Ok(InfoPosition::Right),
        other => Err(format!("unknown side {other:?}, expected left or right")),
    }
}

fn parse_info_position_mobile(s: String) -> Result<InfoPositionMobile, String> {
    match s.as_str() {
        "above" => Ok(InfoPositionMobile::Above),
        "below" => Ok(InfoPositionMobile::Below),
        other => Err(format!("unknown placement {other:?}, expected above or below")),
    }
}

fn parse_url(s: String) -> Result<Url, String> {
    Url::parse(&s).map_err(|e| format!("Invalid URL: {e}"))
}

// ---------------------------------------------------------------------------
// Synthetic section
// ---------------------------------------------------------------------------

const SECTION_ID: &str = "website-showcase-preview";
const DEFAULT_ORIGIN: &str = "https://example.com/";

/// A grid-style list section with one item per payload record.
fn build_section(payload: &str, item_count: usize) -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    let wrapper = doc.append_element(body, "div", &[]);
    doc.set_attribute(wrapper, "id", "siteWrapper");

    let section = doc.append_element(wrapper, "section", &["page-section"]);
    doc.set_attribute(section, "id", SECTION_ID);
    let container = doc.append_element(section, "div", &["user-items-list-item-container"]);
    doc.set_attribute(container, "data-current-context", payload);

    for _ in 0..item_count {
        let item = doc.append_element(container, "li", &["list-item"]);
        let media = doc.append_element(item, "div", &["list-item-media"]);
        let inner = doc.append_element(media, "div", &["list-item-media-inner"]);
        doc.append_element(inner, "img", &[]);
    }
    doc
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let config = preview_config().run();

    let payload = std::fs::read_to_string(&config.payload).unwrap_or_else(|e| {
        eprintln!("Error: failed to read {}: {e}", config.payload);
        process::exit(1);
    });
    let data = website_showcase::parse_payload(&payload).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let document = build_section(&payload, data.records.len());
    let origin = config
        .origin
        .as_ref()
        .map_or(DEFAULT_ORIGIN, |url| url.as_str());
    let mut page = Page::with_document(origin, document).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let settings = ShowcaseConfig::new().with_section(
        SECTION_ID,
        SettingsOverride {
            layout: Some(config.layout),
            info_position: Some(config.info_position),
            info_position_mobile: Some(config.info_position_mobile),
        },
    );
    let mut engine = ShowcaseEngine::new(ShowcaseOptions::default(), settings);
    engine.mount(&mut page);
    let Some(instance) = engine.instances().first() else {
        eprintln!("Error: no {PLUGIN_NAME} section mounted");
        process::exit(1);
    };
    let overlays = instance.overlays(&page);
    eprintln!("{} overlays bound.", overlays.len());

    if let Some(index) = config.open {
        let Some(&overlay) = overlays.get(index) else {
            eprintln!("Error: no item at index {index} ({} items)", overlays.len());
            process::exit(1);
        };
        if let Err(e) = engine.click(&mut page, overlay) {
            eprintln!("Error: click failed: {e}");
            process::exit(1);
        }
        let frame_interval = engine.options().frame_interval_ms;
        engine.advance_time(&mut page, frame_interval);

        if let Some(load_after) = config.load_after {
            engine.advance_time(&mut page, load_after.saturating_sub(frame_interval));
            let frame = engine.instances()[0].popup().frame();
            if let Some(frame) = frame {
                match engine.frame_loaded(&mut page, frame) {
                    Ok(Some(state)) => eprintln!("Popup state after load: {state:?}"),
                    Ok(None) => eprintln!("Load signal ignored."),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
    }

    let html = page.document().to_html();
    match &config.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &html) {
                error!("Failed to write HTML to {path}: {e}");
                eprintln!("Error: failed to write HTML: {e}");
                process::exit(1);
            }
            eprintln!("HTML saved to {path} ({} bytes)", html.len());
        }
        None => println!("{html}"),
    }
}
