/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The modal that shows a target site inside a frame.
//!
//! ```text
//! Closed -> Opening -> Loading -> Loaded | Blocked -> Closing -> Closed
//! ```
//!
//! Whether the target refused to be framed cannot be observed directly, so
//! the load is timed: a "loaded" signal arriving sooner than
//! [`ShowcaseOptions::load_block_threshold_ms`] is taken to be the browser's
//! refusal page. Fast legitimate sites are misreported as blocked.

use log::{debug, warn};
use url::Url;

use crate::config::ShowcaseOptions;
use crate::dom::{Document, NodeId, Selector};
use crate::page::{InstanceId, Page, TaskKind};
use crate::types::{DisplaySettings, Layout, StyleOptions, PLUGIN_NAME};

pub(crate) const POPUP_CLASS: &str = "wm-showcase-popup";
pub(crate) const VISIBLE_CLASS: &str = "wm-showcase-popup--visible";
pub(crate) const BACKDROP_CLASS: &str = "wm-showcase-popup-backdrop";
pub(crate) const CLOSE_CLASS: &str = "wm-showcase-popup-close";
pub(crate) const LOADER_CLASS: &str = "wm-showcase-popup-loader";
pub(crate) const ERROR_CLASS: &str = "wm-showcase-popup-error";
pub(crate) const FRAME_CLASS: &str = "wm-showcase-iframe";

pub(crate) const TITLE_SIZE_VAR: &str = "--popup-info-title-size";
pub(crate) const DESCRIPTION_SIZE_VAR: &str = "--popup-info-description-size";

const ERROR_MESSAGE: &str = "Unable to load website, disable Clickjack Protection in the \
                             Squarespace Settings of the embedded site.";

const EXTERNAL_ICON: &str = r#"<svg viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M18 13v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"/><polyline points="15 3 21 3 21 9"/><line x1="10" y1="14" x2="21" y2="3"/></svg>"#;
const CLOSE_ICON: &str = r#"<svg viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M18 6L6 18M6 6l12 12"/></svg>"#;

/// Lifecycle of the controller's popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Closed,
    /// Inserted, waiting for the animation frame that makes it visible.
    Opening,
    /// Visible, frame still loading.
    Loading,
    Loaded,
    /// The frame failed or was judged to be a refusal page.
    Blocked,
    /// Close animation running; detached when it ends.
    Closing,
}

/// What a popup is opened with, as read from an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub url: String,
    pub title: String,
    pub description: String,
    pub button_text: String,
}

/// Resolve `url` against `origin`. Links that already carry an http(s)
/// scheme pass through; anything unresolvable is returned unchanged.
pub fn absolute_url(url: &str, origin: &Url) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match origin.join(url) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            debug!("keeping unresolvable link {url:?}: {e}");
            url.to_string()
        }
    }
}

#[derive(Debug)]
struct ActivePopup {
    generation: u64,
    element: NodeId,
    frame: NodeId,
    loader: NodeId,
    error: NodeId,
    url: String,
    state: PopupState,
    load_started_ms: u64,
}

/// Owns at most one popup at a time.
#[derive(Debug)]
pub struct PopupController {
    owner: InstanceId,
    settings: DisplaySettings,
    styles: StyleOptions,
    section_theme: Option<String>,
    options: ShowcaseOptions,
    generation: u64,
    active: Option<ActivePopup>,
}

impl PopupController {
    pub(crate) fn new(
        owner: InstanceId,
        settings: DisplaySettings,
        options: ShowcaseOptions,
    ) -> Self {
        Self {
            owner,
            settings,
            styles: StyleOptions::default(),
            section_theme: None,
            options,
            generation: 0,
            active: None,
        }
    }

    pub(crate) fn set_styles(&mut self, styles: StyleOptions) {
        self.styles = styles;
    }

    pub(crate) fn set_section_theme(&mut self, theme: Option<String>) {
        self.section_theme = theme;
    }

    pub fn state(&self) -> PopupState {
        self.active.as_ref().map_or(PopupState::Closed, |p| p.state)
    }

    /// The popup element, while one exists (including during Closing).
    pub fn element(&self) -> Option<NodeId> {
        self.active.as_ref().map(|p| p.element)
    }

    pub fn frame(&self) -> Option<NodeId> {
        self.active.as_ref().map(|p| p.frame)
    }

    /// Normalized URL the current popup is showing.
    pub fn url(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.url.as_str())
    }

    /// Build and insert a new popup. An existing popup is torn down at once,
    /// without its close animation. Returns whether a popup that had not
    /// already started closing was replaced.
    pub(crate) fn open(&mut self, page: &mut Page, request: &OpenRequest) -> bool {
        let replaced = self
            .active
            .as_ref()
            .is_some_and(|p| p.state != PopupState::Closing);
        self.teardown(page);

        let url = absolute_url(&request.url, page.origin());
        self.generation += 1;
        let generation = self.generation;

        let parts = self.build(page.document_mut(), &url, request);
        let host = page.popup_host();
        page.document_mut().append_child(host, parts.element);
        page.lock_scroll();
        page.add_key_listener(self.owner);
        page.schedule(
            self.owner,
            self.options.frame_interval_ms,
            TaskKind::RevealPopup { generation },
        );

        debug!("popup {generation} opening {url}");
        self.active = Some(ActivePopup {
            generation,
            element: parts.element,
            frame: parts.frame,
            loader: parts.loader,
            error: parts.error,
            url,
            state: PopupState::Opening,
            load_started_ms: page.now_ms(),
        });
        replaced
    }

    /// Start the close animation. Returns false when nothing is open or a
    /// close is already under way.
    pub(crate) fn close(&mut self, page: &mut Page) -> bool {
        let Some(popup) = self.active.as_mut() else {
            return false;
        };
        if popup.state == PopupState::Closing {
            return false;
        }
        popup.state = PopupState::Closing;
        page.document_mut().remove_class(popup.element, VISIBLE_CLASS);
        page.remove_key_listener(self.owner);
        page.schedule(
            self.owner,
            self.options.close_delay_ms,
            TaskKind::FinishClose {
                generation: popup.generation,
            },
        );
        true
    }

    /// Remove the popup immediately. Returns whether one existed.
    pub(crate) fn teardown(&mut self, page: &mut Page) -> bool {
        let Some(popup) = self.active.take() else {
            return false;
        };
        debug!("popup {} torn down", popup.generation);
        page.document_mut().remove(popup.element);
        page.remove_key_listener(self.owner);
        page.unlock_scroll();
        true
    }

    /// Run deferred work. Tasks for a popup that has since been replaced
    /// or removed are ignored.
    pub(crate) fn run_task(&mut self, page: &mut Page, kind: TaskKind) {
        match kind {
            TaskKind::RevealPopup { generation } => {
                let Some(popup) = self.current_mut(generation) else {
                    return;
                };
                match popup.state {
                    PopupState::Closing => return,
                    PopupState::Opening => popup.state = PopupState::Loading,
                    // The frame may settle before the first animation frame.
                    _ => {}
                }
                page.document_mut().add_class(popup.element, VISIBLE_CLASS);
            }
            TaskKind::FinishClose { generation } => {
                if self
                    .current_mut(generation)
                    .is_some_and(|p| p.state == PopupState::Closing)
                {
                    self.teardown(page);
                }
            }
        }
    }

    fn current_mut(&mut self, generation: u64) -> Option<&mut ActivePopup> {
        self.active
            .as_mut()
            .filter(|popup| popup.generation == generation)
    }

    /// The frame reported "loaded". Returns the resulting state, or `None`
    /// when `frame` is not this controller's live frame.
    pub(crate) fn frame_loaded(&mut self, page: &mut Page, frame: NodeId) -> Option<PopupState> {
        let threshold = self.options.load_block_threshold_ms;
        let popup = self.live_frame(frame)?;
        let elapsed = page.now_ms().saturating_sub(popup.load_started_ms);
        let blocked = elapsed < threshold;
        let (loader, error) = (popup.loader, popup.error);
        popup.state = if blocked {
            warn!("{} loaded after {elapsed}ms, assuming it refused framing", popup.url);
            PopupState::Blocked
        } else {
            debug!("{} loaded after {elapsed}ms", popup.url);
            PopupState::Loaded
        };
        let state = popup.state;
        show_outcome(page.document_mut(), loader, error, blocked);
        Some(state)
    }

    /// The frame reported a load error.
    pub(crate) fn frame_failed(&mut self, page: &mut Page, frame: NodeId) -> Option<PopupState> {
        let popup = self.live_frame(frame)?;
        warn!("{} failed to load", popup.url);
        popup.state = PopupState::Blocked;
        let (loader, error) = (popup.loader, popup.error);
        show_outcome(page.document_mut(), loader, error, true);
        Some(PopupState::Blocked)
    }

    /// Load signals only count while the popup is showing and loading.
    fn live_frame(&mut self, frame: NodeId) -> Option<&mut ActivePopup> {
        self.active.as_mut().filter(|popup| {
            popup.frame == frame
                && matches!(popup.state, PopupState::Opening | PopupState::Loading)
        })
    }

    /// Whether a click on `target` should dismiss the popup.
    pub(crate) fn is_dismiss_target(&self, document: &Document, target: NodeId) -> bool {
        let Some(popup) = self.active.as_ref() else {
            return false;
        };
        if !document.contains(popup.element, target) {
            return false;
        }
        document
            .closest(target, &Selector::class(CLOSE_CLASS).or(Selector::class(BACKDROP_CLASS)))
            .is_some_and(|hit| document.contains(popup.element, hit))
    }

    // -- Markup --

    fn build(&self, doc: &mut Document, url: &str, request: &OpenRequest) -> PopupParts {
        let info = self.settings.layout == Layout::Info;

        let element = doc.create_element("div");
        doc.add_class(element, POPUP_CLASS);
        if info {
            doc.add_class(element, "wm-showcase-popup--info");
            doc.add_class(
                element,
                &format!("wm-showcase-popup--info-{}", self.settings.info_position.as_str()),
            );
            doc.add_class(
                element,
                &format!(
                    "wm-showcase-popup--info-mobile-{}",
                    self.settings.info_position_mobile.as_str()
                ),
            );
        }
        doc.set_attribute(element, "data-wm-plugin", PLUGIN_NAME);
        if let Some(theme) = &self.section_theme {
            doc.set_attribute(element, "data-section-theme", theme);
        }
        if let Some(size) = &self.styles.title_font_size {
            doc.set_style(element, TITLE_SIZE_VAR, &size.to_css());
        }
        if let Some(size) = &self.styles.body_font_size {
            doc.set_style(element, DESCRIPTION_SIZE_VAR, &size.to_css());
        }

        doc.append_element(element, "div", &[BACKDROP_CLASS]);
        let container = doc.append_element(element, "div", &["wm-showcase-popup-container"]);
        let header = doc.append_element(container, "div", &["wm-showcase-popup-header"]);
        append_controls(doc, header, url);

        let body = doc.append_element(container, "div", &["wm-showcase-popup-body"]);
        let main = doc.append_element(body, "div", &["wm-showcase-popup-main"]);
        let loader = doc.append_element(main, "div", &[LOADER_CLASS]);
        doc.append_element(loader, "div", &["wm-showcase-spinner"]);
        let error = doc.append_element(main, "div", &[ERROR_CLASS]);
        doc.append_text(error, ERROR_MESSAGE);

        let frame = doc.append_element(main, "iframe", &[FRAME_CLASS]);
        for (name, value) in [
            ("src", url),
            ("title", "Website Preview"),
            ("loading", "eager"),
            (
                "allow",
                "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture",
            ),
            ("allowfullscreen", ""),
            ("referrerpolicy", "no-referrer-when-downgrade"),
        ] {
            doc.set_attribute(frame, name, value);
        }

        if info {
            let panel = doc.append_element(body, "div", &["wm-showcase-popup-info"]);
            let buttons = doc.append_element(panel, "div", &["wm-showcase-popup-info-buttons"]);
            append_controls(doc, buttons, url);
            let title = doc.append_element(panel, "h2", &["wm-showcase-popup-info-title"]);
            doc.append_text(title, &request.title);
            if !request.description.is_empty() {
                let description =
                    doc.append_element(panel, "div", &["wm-showcase-popup-info-description"]);
                let markup = doc.create_markup(&request.description);
                doc.append_child(description, markup);
            }
            let link = doc.append_element(
                panel,
                "a",
                &["wm-showcase-popup-info-button", "sqs-button-element--primary"],
            );
            set_external_link(doc, link, url);
            doc.append_text(link, &request.button_text);
        }

        PopupParts {
            element,
            frame,
            loader,
            error,
        }
    }
}

struct PopupParts {
    element: NodeId,
    frame: NodeId,
    loader: NodeId,
    error: NodeId,
}

fn set_external_link(doc: &mut Document, link: NodeId, url: &str) {
    doc.set_attribute(link, "href", url);
    doc.set_attribute(link, "target", "_blank");
    doc.set_attribute(link, "rel", "noopener noreferrer");
}

/// Open-in-new-tab link and close button.
fn append_controls(doc: &mut Document, parent: NodeId, url: &str) {
    let external = doc.append_element(parent, "a", &["wm-showcase-popup-external"]);
    set_external_link(doc, external, url);
    doc.set_attribute(external, "aria-label", "Open in new tab");
    let icon = doc.create_markup(EXTERNAL_ICON);
    doc.append_child(external, icon);

    let close = doc.append_element(parent, "button", &[CLOSE_CLASS]);
    doc.set_attribute(close, "aria-label", "Close popup");
    let icon = doc.create_markup(CLOSE_ICON);
    doc.append_child(close, icon);
}

fn show_outcome(doc: &mut Document, loader: NodeId, error: NodeId, blocked: bool) {
    doc.set_style(loader, "display", "none");
    if blocked {
        doc.set_style(error, "z-index", "2");
    }
}
