/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `ShowcaseEngine`: finds showcase sections on a page, owns one instance
//! per section, and routes host input to them.
//!
//! The engine is single-threaded and holds no reference to the page; every
//! entry point takes the [`Page`] it should act on.

use log::{debug, info};

use crate::config::{ShowcaseConfig, ShowcaseOptions};
use crate::dom::{NodeId, Selector};
use crate::instance::ShowcaseInstance;
use crate::page::{InstanceId, Page};
use crate::popup::PopupState;
use crate::types::{ClickOutcome, EventListener, ShowcaseError, PLUGIN_NAME};

/// Body class the site editor sets when edit mode turns on.
pub const EDIT_MODE_CLASS: &str = "sqs-edit-mode-active";

pub struct ShowcaseEngine {
    options: ShowcaseOptions,
    config: ShowcaseConfig,
    instances: Vec<ShowcaseInstance>,
    listeners: Vec<EventListener>,
    edit_mode_armed: bool,
}

impl ShowcaseEngine {
    pub fn new(options: ShowcaseOptions, config: ShowcaseConfig) -> Self {
        Self {
            options,
            config,
            instances: Vec::new(),
            listeners: Vec::new(),
            edit_mode_armed: false,
        }
    }

    pub fn options(&self) -> &ShowcaseOptions {
        &self.options
    }

    /// Register a listener on every instance mounted from now on, the way a
    /// page script would listen for bubbling events on the document.
    pub fn on_event(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub fn instances(&self) -> &[ShowcaseInstance] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [ShowcaseInstance] {
        &mut self.instances
    }

    /// The instance mounted on `root`, if any.
    pub fn instance(&self, root: NodeId) -> Option<&ShowcaseInstance> {
        self.instances.iter().find(|i| i.root() == root)
    }

    pub fn instance_mut(&mut self, root: NodeId) -> Option<&mut ShowcaseInstance> {
        self.instances.iter_mut().find(|i| i.root() == root)
    }

    /// Whether an edit-mode signal would still tear instances down.
    pub fn is_edit_mode_armed(&self) -> bool {
        self.edit_mode_armed
    }

    // -- Mounting --

    /// Mount an instance on every element whose id starts with the plugin
    /// name. Roots already mounted are skipped. Returns how many were added.
    pub fn mount(&mut self, page: &mut Page) -> usize {
        let roots = page
            .document()
            .query_selector_all(page.document().root(), &Selector::attr_prefix("id", PLUGIN_NAME));

        let mut mounted = 0;
        for root in roots {
            if self.instance(root).is_some() {
                continue;
            }
            let section_id = page.document().attribute(root, "id").unwrap_or_default();
            let settings = self.config.settings_for(&section_id);
            let id = InstanceId(self.instances.len());

            let mut instance = ShowcaseInstance::new(id, root, settings, self.options);
            for listener in &self.listeners {
                instance.subscribe(listener.clone());
            }
            instance.init(page);
            debug!("mounted {section_id} with {:?} layout", settings.layout);
            self.instances.push(instance);
            mounted += 1;
        }

        if page.is_framed() {
            self.edit_mode_armed = true;
        }
        info!("{mounted} showcase sections mounted");
        mounted
    }

    /// Re-run overlay binding everywhere, e.g. after a carousel cloned items.
    pub fn rebind(&mut self, page: &mut Page) -> usize {
        self.instances
            .iter_mut()
            .map(|instance| instance.build_overlays(page))
            .sum()
    }

    // -- Teardown --

    /// Called by the host when the body's classes change. If the page is
    /// framed and edit mode became active, every instance is destroyed and
    /// the signal is disarmed. Returns whether teardown happened.
    pub fn notify_body_changed(&mut self, page: &mut Page) -> bool {
        if !self.edit_mode_armed {
            return false;
        }
        let body = page.document().body();
        if !page.document().has_class(body, EDIT_MODE_CLASS) {
            return false;
        }
        info!("edit mode active, tearing down showcase sections");
        self.teardown_all(page);
        true
    }

    /// Destroy every instance. Instances stay listed so pending close
    /// animations still finish.
    pub fn teardown_all(&mut self, page: &mut Page) {
        for instance in &mut self.instances {
            instance.destroy(page);
        }
        self.edit_mode_armed = false;
    }

    // -- Input --

    fn check_node(page: &Page, node: NodeId) -> Result<(), ShowcaseError> {
        if page.document().contains_node(node) {
            Ok(())
        } else {
            Err(ShowcaseError::UnknownNode)
        }
    }

    /// Deliver a click on `target`.
    pub fn click(&mut self, page: &mut Page, target: NodeId) -> Result<ClickOutcome, ShowcaseError> {
        Self::check_node(page, target)?;
        for instance in &mut self.instances {
            let outcome = instance.handle_click(page, target);
            if outcome.handled {
                return Ok(outcome);
            }
        }
        Ok(ClickOutcome::default())
    }

    /// Deliver a document-level key press (e.g. `"Escape"`). Returns whether
    /// any instance reacted.
    pub fn key_down(&mut self, page: &mut Page, key: &str) -> bool {
        let mut handled = false;
        for id in page.key_listeners() {
            if let Some(instance) = self.instances.get_mut(id.0) {
                handled |= instance.handle_key(page, key);
            }
        }
        handled
    }

    /// The frame element `frame` fired its load event.
    pub fn frame_loaded(
        &mut self,
        page: &mut Page,
        frame: NodeId,
    ) -> Result<Option<PopupState>, ShowcaseError> {
        Self::check_node(page, frame)?;
        Ok(self
            .instances
            .iter_mut()
            .find_map(|instance| instance.frame_loaded(page, frame)))
    }

    /// The frame element `frame` fired its error event.
    pub fn frame_failed(
        &mut self,
        page: &mut Page,
        frame: NodeId,
    ) -> Result<Option<PopupState>, ShowcaseError> {
        Self::check_node(page, frame)?;
        Ok(self
            .instances
            .iter_mut()
            .find_map(|instance| instance.frame_failed(page, frame)))
    }

    /// The instance whose popup contains `node`.
    pub fn popup_owner(&self, page: &Page, node: NodeId) -> Option<&ShowcaseInstance> {
        self.instances
            .iter()
            .find(|instance| instance.owns_popup_node(page, node))
    }

    // -- Time --

    /// Advance the page clock by `delta_ms`, running every task that falls
    /// due along the way in order.
    pub fn advance_time(&mut self, page: &mut Page, delta_ms: u64) -> usize {
        let target = page.now_ms().saturating_add(delta_ms);
        let mut ran = 0;
        while let Some(task) = page.next_due_task(target) {
            if let Some(instance) = self.instances.get_mut(task.owner.0) {
                instance.run_task(page, task.kind);
            }
            ran += 1;
        }
        page.set_now(target);
        ran
    }
}
