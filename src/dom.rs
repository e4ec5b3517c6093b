/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Arena-backed document tree with the selector subset the widget needs.
//!
//! Nodes are never freed: removing a node only detaches it from its parent,
//! so stale [`NodeId`]s stay valid and simply report as disconnected. Ids
//! this document never issued read as empty and are ignored by mutations.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::types::ShowcaseError;

/// Opaque handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    /// Pre-rendered markup, serialized verbatim.
    Markup(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    styles: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding an empty `body`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            body: NodeId(0),
        };
        let body = doc.create_element("body");
        doc.append_child(doc.root, body);
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether `node` was created by this document.
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    // -- Construction --

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
        }))
    }

    /// Create a detached text node. Its content is escaped on serialization.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Create a detached node whose markup is serialized as-is.
    pub fn create_markup(&mut self, html: &str) -> NodeId {
        self.push(NodeKind::Markup(html.to_string()))
    }

    /// Create an element with the given classes and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(node, class);
        }
        self.append_child(parent, node);
        node
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text(text);
        self.append_child(parent, node);
        node
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere. Appending a node into its own subtree is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains_node(parent) || !self.contains_node(child) {
            return;
        }
        if parent == child || self.contains(child, parent) {
            return;
        }
        self.remove(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `node` from its parent. No-op for detached nodes.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node.0).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|c| *c != node);
        }
    }

    /// Deep-copy `node` and its subtree into a new detached node. Returns
    /// `None` for ids this document never issued.
    pub fn clone_subtree(&mut self, node: NodeId) -> Option<NodeId> {
        let source = self.nodes.get(node.0)?;
        let (kind, children) = (source.kind.clone(), source.children.clone());
        let copy = self.push(kind);
        for child in children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    // -- Tree navigation --

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node.0) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether `node` is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    // -- Attributes --

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let element = self.element(node)?;
        match name {
            "class" if !element.classes.is_empty() => Some(element.classes.join(" ")),
            "class" => None,
            "style" if !element.styles.is_empty() => Some(style_text(&element.styles)),
            "style" => None,
            _ => element
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
        }
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        match name {
            "class" => {
                element.classes = value.split_whitespace().map(str::to_string).collect();
            }
            "style" => {
                element.styles = parse_style(value);
            }
            _ => {
                if let Some(slot) = element.attrs.iter_mut().find(|(k, _)| k == name) {
                    slot.1 = value.to_string();
                } else {
                    element.attrs.push((name.to_string(), value.to_string()));
                }
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        match name {
            "class" => element.classes.clear(),
            "style" => element.styles.clear(),
            _ => element.attrs.retain(|(k, _)| k != name),
        }
    }

    // -- Classes --

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    // -- Inline style --

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?
            .styles
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        if let Some(slot) = element.styles.iter_mut().find(|(k, _)| k == property) {
            slot.1 = value.to_string();
        } else {
            element.styles.push((property.to_string(), value.to_string()));
        }
    }

    pub fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(element) = self.element_mut(node) {
            element.styles.retain(|(k, _)| k != property);
        }
    }

    // -- Queries --

    /// Descendants of `scope` (excluding `scope`) in document order.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node)
            .is_some_and(|element| selector.alternatives.iter().any(|c| c.matches(element)))
    }

    /// First descendant of `scope` matching `selector`.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| self.matches(*node, selector))
    }

    /// All descendants of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(*node, selector))
            .collect()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.matches(current, selector) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_selector(self.root, &Selector::id(id))
    }

    // -- Serialization --

    pub fn text_content(&self, node: NodeId) -> String {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(NodeKind::Markup(_)) | None => String::new(),
            Some(NodeKind::Document | NodeKind::Element(_)) => self
                .children(node)
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(*child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        out.push_str(&self.inner_html(self.root));
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.kind {
            NodeKind::Document => out.push_str(&self.inner_html(node)),
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Markup(html) => out.push_str(html),
            NodeKind::Element(element) => {
                let _ = write!(out, "<{}", element.tag);
                if !element.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape_attr(&element.classes.join(" ")));
                }
                for (name, value) in &element.attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                }
                if !element.styles.is_empty() {
                    let _ = write!(out, " style=\"{}\"", escape_attr(&style_text(&element.styles)));
                }
                out.push('>');
                if is_void(&element.tag) {
                    return;
                }
                for child in &entry.children {
                    self.write_node(*child, out);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "source"
    )
}

fn style_text(styles: &[(String, String)]) -> String {
    styles
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_style(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Escape text for use as element content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    op: AttrMatch,
}

/// A compound selector: tag, id, classes and attribute conditions that must
/// all hold for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if self.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
            return false;
        }
        let attr = |name: &str| {
            element
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        if let Some(id) = &self.id {
            if attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes.iter().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|cond| {
            let value = if cond.name == "class" {
                (!element.classes.is_empty()).then(|| element.classes.join(" "))
            } else {
                attr(&cond.name).map(str::to_string)
            };
            match (&cond.op, value) {
                (_, None) => false,
                (AttrMatch::Exists, Some(_)) => true,
                (AttrMatch::Equals(expected), Some(v)) => v == *expected,
                (AttrMatch::Prefix(prefix), Some(v)) => v.starts_with(prefix.as_str()),
            }
        })
    }
}

/// A selector list: an element matches if any compound alternative matches.
///
/// Supports `tag`, `#id`, `.class`, `[attr]`, `[attr="v"]`, `[attr^="v"]`,
/// compounds of those, and comma-separated lists. Combinators are not
/// supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    fn single(compound: Compound) -> Self {
        Self {
            alternatives: vec![compound],
        }
    }

    pub fn class(name: &str) -> Self {
        Self::single(Compound {
            classes: vec![name.to_string()],
            ..Default::default()
        })
    }

    /// Matches elements carrying any of the given classes.
    pub fn any_class(names: &[&str]) -> Self {
        Self {
            alternatives: names
                .iter()
                .map(|name| Compound {
                    classes: vec![name.to_string()],
                    ..Default::default()
                })
                .collect(),
        }
    }

    pub fn id(id: &str) -> Self {
        Self::single(Compound {
            id: Some(id.to_string()),
            ..Default::default()
        })
    }

    pub fn tag(tag: &str) -> Self {
        Self::single(Compound {
            tag: Some(tag.to_ascii_lowercase()),
            ..Default::default()
        })
    }

    pub fn attr_equals(name: &str, value: &str) -> Self {
        Self::single(Compound {
            attrs: vec![AttrCondition {
                name: name.to_string(),
                op: AttrMatch::Equals(value.to_string()),
            }],
            ..Default::default()
        })
    }

    pub fn attr_prefix(name: &str, prefix: &str) -> Self {
        Self::single(Compound {
            attrs: vec![AttrCondition {
                name: name.to_string(),
                op: AttrMatch::Prefix(prefix.to_string()),
            }],
            ..Default::default()
        })
    }

    /// Selector list union, like `a, b` in CSS.
    pub fn or(mut self, other: Selector) -> Self {
        self.alternatives.extend(other.alternatives);
        self
    }

    pub fn parse(input: &str) -> Result<Self, ShowcaseError> {
        let alternatives = input
            .split(',')
            .map(|part| parse_compound(part.trim()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ShowcaseError::InvalidSelector(input.to_string()))?;
        Ok(Self { alternatives })
    }
}

impl FromStr for Selector {
    type Err = ShowcaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !is_ident_char(c))
        .unwrap_or(input.len());
    input.split_at(end)
}

fn parse_compound(mut input: &str) -> Option<Compound> {
    if input.is_empty() {
        return None;
    }
    let mut compound = Compound::default();
    let (tag, rest) = take_ident(input);
    if !tag.is_empty() {
        compound.tag = Some(tag.to_ascii_lowercase());
        input = rest;
    }
    while let Some(first) = input.chars().next() {
        match first {
            '.' | '#' => {
                let (name, rest) = take_ident(&input[1..]);
                if name.is_empty() {
                    return None;
                }
                if first == '.' {
                    compound.classes.push(name.to_string());
                } else {
                    compound.id = Some(name.to_string());
                }
                input = rest;
            }
            '[' => {
                let close = input.find(']')?;
                compound.attrs.push(parse_attr(&input[1..close])?);
                input = &input[close + 1..];
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn parse_attr(body: &str) -> Option<AttrCondition> {
    let unquote = |v: &str| {
        let v = v.trim();
        v.strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(v)
            .to_string()
    };
    let (name, op) = if let Some((name, value)) = body.split_once("^=") {
        (name, AttrMatch::Prefix(unquote(value)))
    } else if let Some((name, value)) = body.split_once('=') {
        (name, AttrMatch::Equals(unquote(value)))
    } else {
        (body, AttrMatch::Exists)
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    Some(AttrCondition {
        name: name.to_string(),
        op,
    })
}
