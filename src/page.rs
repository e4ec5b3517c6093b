/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The browsing context a showcase runs in: document, origin, virtual clock,
//! deferred tasks, document-level key listeners and the scroll lock.

use std::collections::BTreeSet;

use log::debug;
use url::{Origin, Url};

use crate::dom::{Document, NodeId};
use crate::types::ShowcaseError;

/// Index of an instance inside its engine. Owners of deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct InstanceId(pub(crate) usize);

/// Work deferred until the clock reaches `due_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskKind {
    /// Animation frame: add the visible class to the popup.
    RevealPopup { generation: u64 },
    /// Close animation finished: detach the popup.
    FinishClose { generation: u64 },
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    seq: u64,
    due_ms: u64,
    pub(crate) owner: InstanceId,
    pub(crate) kind: TaskKind,
}

/// A task still waiting for the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub due_ms: u64,
}

// ---------------------------------------------------------------------------
// Scroll lock
// ---------------------------------------------------------------------------

/// Page-wide scroll lock shared by every instance. Scrolling stays
/// suppressed while at least one holder remains.
#[derive(Debug, Default)]
struct ScrollLock {
    holders: usize,
}

impl ScrollLock {
    fn acquire(&mut self, document: &mut Document) {
        self.holders += 1;
        if self.holders == 1 {
            let body = document.body();
            document.set_style(body, "overflow", "hidden");
        }
    }

    fn release(&mut self, document: &mut Document) {
        if self.holders == 0 {
            return;
        }
        self.holders -= 1;
        if self.holders == 0 {
            let body = document.body();
            document.remove_style(body, "overflow");
        }
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub struct Page {
    document: Document,
    location: Url,
    base: Url,
    framed: bool,
    now_ms: u64,
    next_seq: u64,
    tasks: Vec<ScheduledTask>,
    key_listeners: BTreeSet<InstanceId>,
    scroll_lock: ScrollLock,
}

impl Page {
    /// Create a page at `location` with an empty document.
    pub fn new(location: &str) -> Result<Self, ShowcaseError> {
        Self::with_document(location, Document::new())
    }

    /// Create a page at `location` around an existing document.
    pub fn with_document(location: &str, document: Document) -> Result<Self, ShowcaseError> {
        let location = Url::parse(location).map_err(|e| ShowcaseError::InvalidUrl(e.to_string()))?;
        let base = origin_base(&location);
        Ok(Self {
            document,
            location,
            base,
            framed: false,
            now_ms: 0,
            next_seq: 0,
            tasks: Vec::new(),
            key_listeners: BTreeSet::new(),
            scroll_lock: ScrollLock::default(),
        })
    }

    /// Mark the page as running inside an embedding frame (e.g. an editor).
    pub fn set_framed(&mut self, framed: bool) {
        self.framed = framed;
    }

    pub fn is_framed(&self) -> bool {
        self.framed
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Base that relative links resolve against: the page origin.
    pub fn origin(&self) -> &Url {
        &self.base
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_lock.holders > 0
    }

    pub fn pending_tasks(&self) -> Vec<PendingTask> {
        let mut pending: Vec<_> = self
            .tasks
            .iter()
            .map(|t| PendingTask { due_ms: t.due_ms })
            .collect();
        pending.sort_by_key(|t| t.due_ms);
        pending
    }

    // -- Crate-internal services --

    pub(crate) fn lock_scroll(&mut self) {
        self.scroll_lock.acquire(&mut self.document);
    }

    pub(crate) fn unlock_scroll(&mut self) {
        self.scroll_lock.release(&mut self.document);
    }

    pub(crate) fn add_key_listener(&mut self, owner: InstanceId) {
        self.key_listeners.insert(owner);
    }

    pub(crate) fn remove_key_listener(&mut self, owner: InstanceId) {
        self.key_listeners.remove(&owner);
    }

    pub(crate) fn key_listeners(&self) -> Vec<InstanceId> {
        self.key_listeners.iter().copied().collect()
    }

    pub(crate) fn schedule(&mut self, owner: InstanceId, delay_ms: u64, kind: TaskKind) {
        let due_ms = self.now_ms.saturating_add(delay_ms);
        debug!("scheduling {kind:?} for instance {} at {due_ms}ms", owner.0);
        self.tasks.push(ScheduledTask {
            seq: self.next_seq,
            due_ms,
            owner,
            kind,
        });
        self.next_seq += 1;
    }

    /// Pop the earliest task due at or before `limit_ms`, advancing the
    /// clock to its due time. Ties run in scheduling order.
    pub(crate) fn next_due_task(&mut self, limit_ms: u64) -> Option<ScheduledTask> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= limit_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)?;
        let task = self.tasks.remove(index);
        self.now_ms = self.now_ms.max(task.due_ms);
        Some(task)
    }

    pub(crate) fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// `#siteWrapper` if present, else the body.
    pub(crate) fn popup_host(&self) -> NodeId {
        self.document
            .element_by_id("siteWrapper")
            .unwrap_or_else(|| self.document.body())
    }
}

fn origin_base(location: &Url) -> Url {
    match location.origin() {
        origin @ Origin::Tuple(..) => {
            Url::parse(&origin.ascii_serialization()).unwrap_or_else(|_| location.clone())
        }
        Origin::Opaque(_) => location.clone(),
    }
}
