/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One showcase bound to one section root: extraction, overlays, delegated
//! click handling, the popup, and lifecycle notifications.

use log::{debug, error};

use crate::config::ShowcaseOptions;
use crate::dom::{NodeId, Selector};
use crate::extract::{self, ShowcaseData};
use crate::overlay::{self, OverlayData};
use crate::page::{InstanceId, Page, TaskKind};
use crate::popup::{OpenRequest, PopupController, PopupState};
use crate::types::{
    ClickOutcome, DisplaySettings, EventListener, ShowcaseEvent, SubscriptionId, PLUGIN_NAME,
};

const ATTR_PLUGIN: &str = "data-wm-plugin";
const ATTR_LAYOUT: &str = "data-wm-layout";
const ATTR_SECTION_THEME: &str = "data-section-theme";

pub struct ShowcaseInstance {
    id: InstanceId,
    root: NodeId,
    settings: DisplaySettings,
    data: ShowcaseData,
    popup: PopupController,
    click_bound: bool,
    destroyed: bool,
    next_subscription: u64,
    listeners: Vec<(SubscriptionId, EventListener)>,
}

impl ShowcaseInstance {
    /// Create an instance for `root`. Nothing touches the page until
    /// [`init`](Self::init), so listeners can subscribe first.
    pub(crate) fn new(
        id: InstanceId,
        root: NodeId,
        settings: DisplaySettings,
        options: ShowcaseOptions,
    ) -> Self {
        Self {
            id,
            root,
            settings,
            data: ShowcaseData::default(),
            popup: PopupController::new(id, settings, options),
            click_bound: false,
            destroyed: false,
            next_subscription: 0,
            listeners: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn data(&self) -> &ShowcaseData {
        &self.data
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn popup_state(&self) -> PopupState {
        self.popup.state()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // -- Notifications --

    pub fn subscribe(&mut self, listener: EventListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn emit(&self, event: ShowcaseEvent) {
        debug!("{} on instance {}", event.name(), self.id.0);
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    // -- Lifecycle --

    /// Stamp the root, read its payload, build overlays and start routing
    /// clicks. A missing or malformed payload is logged and leaves the
    /// instance without overlays.
    pub(crate) fn init(&mut self, page: &mut Page) {
        self.emit(ShowcaseEvent::BeforeInit { root: self.root });

        let doc = page.document_mut();
        doc.set_attribute(self.root, ATTR_PLUGIN, PLUGIN_NAME);
        doc.set_attribute(self.root, ATTR_LAYOUT, self.settings.layout.as_str());

        match extract::extract(page.document(), self.root) {
            Ok(data) => {
                self.popup.set_styles(data.style_options());
                self.data = data;
            }
            Err(e) => error!("[{PLUGIN_NAME}] {e}"),
        }
        self.popup
            .set_section_theme(page.document().attribute(self.root, ATTR_SECTION_THEME));

        self.build_overlays(page);
        self.click_bound = true;

        self.emit(ShowcaseEvent::AfterInit { root: self.root });
    }

    /// Bind overlays to items that lack one. Safe to call again after items
    /// are cloned into the section.
    pub fn build_overlays(&mut self, page: &mut Page) -> usize {
        if self.destroyed {
            return 0;
        }
        overlay::bind(page.document_mut(), self.root, &self.data.records)
    }

    /// Undo everything `init` did and stop handling input. The popup, if
    /// any, closes with its normal animation.
    pub(crate) fn destroy(&mut self, page: &mut Page) {
        if self.destroyed {
            return;
        }
        self.close_popup(page);
        self.click_bound = false;

        let doc = page.document_mut();
        overlay::unbind(doc, self.root);
        doc.remove_attribute(self.root, ATTR_PLUGIN);
        doc.remove_attribute(self.root, ATTR_LAYOUT);
        self.destroyed = true;

        self.emit(ShowcaseEvent::Destroy { root: self.root });
    }

    // -- Popup --

    pub(crate) fn open_popup(&mut self, page: &mut Page, request: &OpenRequest) {
        if self.popup.open(page, request) {
            self.emit(ShowcaseEvent::PopupClose { root: self.root });
        }
        self.emit(ShowcaseEvent::PopupOpen {
            url: request.url.clone(),
            title: request.title.clone(),
            root: self.root,
        });
    }

    /// Begin closing. Nothing happens, and nothing is emitted, when no popup
    /// is open or one is already closing.
    pub(crate) fn close_popup(&mut self, page: &mut Page) -> bool {
        let closed = self.popup.close(page);
        if closed {
            self.emit(ShowcaseEvent::PopupClose { root: self.root });
        }
        closed
    }

    pub(crate) fn run_task(&mut self, page: &mut Page, kind: TaskKind) {
        self.popup.run_task(page, kind);
    }

    pub(crate) fn frame_loaded(&mut self, page: &mut Page, frame: NodeId) -> Option<PopupState> {
        self.popup.frame_loaded(page, frame)
    }

    pub(crate) fn frame_failed(&mut self, page: &mut Page, frame: NodeId) -> Option<PopupState> {
        self.popup.frame_failed(page, frame)
    }

    // -- Input --

    /// Route a click. Dismiss controls of the open popup close it; a click
    /// anywhere inside an overlay under the root opens that overlay's site.
    pub(crate) fn handle_click(&mut self, page: &mut Page, target: NodeId) -> ClickOutcome {
        if self.popup.is_dismiss_target(page.document(), target) {
            self.close_popup(page);
            return ClickOutcome {
                handled: true,
                ..Default::default()
            };
        }

        if !self.click_bound || !page.document().contains(self.root, target) {
            return ClickOutcome::default();
        }
        let doc = page.document();
        let Some(overlay) = doc
            .closest(target, &overlay::overlay_selector())
            .filter(|overlay| doc.contains(self.root, *overlay))
        else {
            return ClickOutcome::default();
        };

        let data = OverlayData::from_element(doc, overlay);
        self.open_popup(
            page,
            &OpenRequest {
                url: data.link,
                title: data.title,
                description: data.description,
                button_text: data.button_text,
            },
        );
        ClickOutcome {
            handled: true,
            default_prevented: true,
            propagation_stopped: true,
        }
    }

    /// Document-level key handling; only Escape matters.
    pub(crate) fn handle_key(&mut self, page: &mut Page, key: &str) -> bool {
        key == "Escape" && self.close_popup(page)
    }

    /// Whether this instance's popup tree contains `node`.
    pub(crate) fn owns_popup_node(&self, page: &Page, node: NodeId) -> bool {
        self.popup
            .element()
            .is_some_and(|popup| page.document().contains(popup, node))
    }

    /// Overlays currently under the root.
    pub fn overlays(&self, page: &Page) -> Vec<NodeId> {
        page.document()
            .query_selector_all(self.root, &overlay::overlay_selector())
    }

    /// Data carried by an overlay element, as a click would read it.
    pub fn overlay_data(&self, page: &Page, overlay: NodeId) -> Option<OverlayData> {
        let doc = page.document();
        doc.matches(overlay, &Selector::class(overlay::OVERLAY_CLASS))
            .then(|| OverlayData::from_element(doc, overlay))
    }
}
