//! In-process DOM document.
//!
//! # Responsibility
//! - Hold an element/text tree with attributes, focus, caret and scroll state.
//! - Store listener records per node, keyed by event kind.
//! - Dispatch user events from a target up through its ancestors.
//!
//! # Invariants
//! - A node has at most one listener per event kind; setting one replaces it.
//! - Freed slots are recycled, but each reuse bumps the slot generation, so a
//!   stale id never aliases a newer node.
//! - Focus never points at a node outside the connected tree.
//! - No document borrow is held while a listener runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

mod markup;
mod transient;

pub use transient::TransientDomState;

pub type DomResult<T> = Result<T, DomError>;

/// Arena handle of one node: slot index plus the slot generation it was
/// issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// User event kinds listeners can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomEventKind {
    Click,
    Input,
    Change,
    Submit,
    Reset,
}

/// Event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: DomEventKind,
    pub target: NodeId,
    /// Target `value` attribute at dispatch time.
    pub value: Option<String>,
    /// Whether the target carried `checked` at dispatch time.
    pub checked: bool,
}

pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Insertion point relative to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPosition {
    AfterBegin,
    BeforeEnd,
}

/// Simple element selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Class(String),
    Name(String),
    NamePrefix(String),
}

impl Selector {
    pub fn tag(value: impl Into<String>) -> Self {
        Self::Tag(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Self::Class(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn name_prefix(value: impl Into<String>) -> Self {
        Self::NamePrefix(value.into())
    }

    fn matches(&self, tag: &str, attrs: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Tag(expected) => tag.eq_ignore_ascii_case(expected),
            Self::Class(expected) => attrs
                .get("class")
                .is_some_and(|classes| classes.split_whitespace().any(|class| class == expected)),
            Self::Name(expected) => attrs.get("name").is_some_and(|name| name == expected),
            Self::NamePrefix(prefix) => attrs
                .get("name")
                .is_some_and(|name| name.starts_with(prefix.as_str())),
        }
    }
}

/// DOM operation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    UnknownNode(NodeId),
    NotAnElement(NodeId),
    /// Template markup must produce exactly one root element.
    TemplateRoot { found: usize },
    /// Node must be detached for this operation.
    AlreadyAttached(NodeId),
    /// Node must have a parent for this operation.
    Detached(NodeId),
    /// Insertion would make a node its own ancestor.
    Cycle(NodeId),
}

impl Display for DomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::NotAnElement(id) => write!(f, "node {id} is not an element"),
            Self::TemplateRoot { found } => {
                write!(f, "template must have exactly one root element, found {found}")
            }
            Self::AlreadyAttached(id) => write!(f, "node {id} is already attached"),
            Self::Detached(id) => write!(f, "node {id} has no parent"),
            Self::Cycle(id) => write!(f, "inserting node {id} would create a cycle"),
        }
    }
}

impl Error for DomError {}

enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scroll_top: u32,
    listeners: BTreeMap<DomEventKind, Listener>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            scroll_top: 0,
            listeners: BTreeMap::new(),
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Document tree rooted at a `body` element.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
    focus: Option<NodeId>,
    caret: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut document = Self {
            slots: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            focus: None,
            caret: 0,
        };
        document.body = document.alloc(NodeKind::Element {
            tag: "body".to_string(),
            attrs: BTreeMap::new(),
        });
        document
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(NodeData::new(kind));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    fn node(&self, id: NodeId) -> DomResult<&NodeData> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DomError::UnknownNode(id))
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Whether `id` is reachable from `body`.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id).last() == Some(&self.body)
    }

    /// Number of live nodes, connected or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Arena slots ever allocated; bounded by the peak live node count.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// `id` followed by its ancestors, nearest first.
    pub fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = if self.is_live(id) { Some(id) } else { None };
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.parent(current);
        }
        path
    }

    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors_inclusive(id).contains(&ancestor)
    }

    /// Inserts a detached node under `parent`.
    pub fn insert(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: RenderPosition,
    ) -> DomResult<()> {
        self.ensure_insertable(parent, child)?;
        let parent_node = self.node_mut(parent)?;
        match position {
            RenderPosition::AfterBegin => parent_node.children.insert(0, child),
            RenderPosition::BeforeEnd => parent_node.children.push(child),
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Inserts a detached node right before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> DomResult<()> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        self.ensure_insertable(parent, child)?;
        let parent_node = self.node_mut(parent)?;
        let index = parent_node
            .children
            .iter()
            .position(|candidate| *candidate == reference)
            .ok_or(DomError::Detached(reference))?;
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if let NodeKind::Text(_) = self.node(parent)?.kind {
            return Err(DomError::NotAnElement(parent));
        }
        let child_node = self.node(child)?;
        if child_node.parent.is_some() || child == self.body {
            return Err(DomError::AlreadyAttached(child));
        }
        if self.contains(child, parent) {
            return Err(DomError::Cycle(child));
        }
        Ok(())
    }

    /// Puts detached `new` in `old`'s place; `old` becomes detached but live.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        self.ensure_insertable(parent, new)?;
        let parent_node = self.node_mut(parent)?;
        let index = parent_node
            .children
            .iter()
            .position(|candidate| *candidate == old)
            .ok_or(DomError::Detached(old))?;
        parent_node.children[index] = new;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        self.clear_focus_within(old);
        Ok(())
    }

    /// Detaches `id` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?
            .children
            .retain(|candidate| *candidate != id);
        self.node_mut(id)?.parent = None;
        self.clear_focus_within(id);
        Ok(())
    }

    /// Detaches and frees the whole subtree, dropping its listeners.
    pub fn discard(&mut self, id: NodeId) -> DomResult<()> {
        if id == self.body {
            return Err(DomError::AlreadyAttached(id));
        }
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.release(current) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    fn clear_focus_within(&mut self, root: NodeId) {
        if let Some(focused) = self.focus {
            if self.contains(root, focused) {
                self.focus = None;
                self.caret = 0;
            }
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).ok()?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.remove(name);
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|value| value == class))
    }

    /// Form control value; empty when unset.
    pub fn value(&self, id: NodeId) -> String {
        self.attr(id, "value").unwrap_or_default().to_string()
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.attr(id, "checked").is_some()
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Matching elements in document order, `scope` included.
    pub fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending = vec![scope];
        while let Some(current) = pending.pop() {
            let Ok(node) = self.node(current) else {
                continue;
            };
            if let NodeKind::Element { tag, attrs } = &node.kind {
                if selector.matches(tag, attrs) {
                    found.push(current);
                }
                pending.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// Focuses a connected element and puts the caret at the value end.
    pub fn focus(&mut self, id: NodeId) -> DomResult<()> {
        if self.tag(id).is_none() {
            return Err(DomError::NotAnElement(id));
        }
        if !self.is_connected(id) {
            return Err(DomError::Detached(id));
        }
        self.focus = Some(id);
        self.caret = self.value(id).chars().count();
        Ok(())
    }

    pub fn blur(&mut self) {
        self.focus = None;
        self.caret = 0;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Moves the caret inside the focused control, clamped to its value.
    pub fn set_caret(&mut self, position: usize) {
        if let Some(focused) = self.focus {
            self.caret = position.min(self.value(focused).chars().count());
        }
    }

    pub fn scroll_top(&self, id: NodeId) -> u32 {
        self.node(id).map(|node| node.scroll_top).unwrap_or(0)
    }

    pub fn set_scroll_top(&mut self, id: NodeId, value: u32) -> DomResult<()> {
        self.node_mut(id)?.scroll_top = value;
        Ok(())
    }

    /// Registers the listener for `kind` on `id`, replacing any previous one.
    pub fn set_listener(
        &mut self,
        id: NodeId,
        kind: DomEventKind,
        listener: Listener,
    ) -> DomResult<()> {
        self.node_mut(id)?.listeners.insert(kind, listener);
        Ok(())
    }

    pub fn listener(&self, id: NodeId, kind: DomEventKind) -> Option<Listener> {
        self.node(id).ok()?.listeners.get(&kind).cloned()
    }

    /// Listener records registered on one node.
    pub fn listener_count(&self, id: NodeId) -> usize {
        self.node(id).map(|node| node.listeners.len()).unwrap_or(0)
    }

    /// Listener records over every live node.
    pub fn total_listener_count(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.node.as_ref())
            .map(|node| node.listeners.len())
            .sum()
    }
}

/// Shared handle to a `Document`, used by views and tests to drive input.
#[derive(Clone, Default)]
pub struct Dom {
    document: Rc<RefCell<Document>>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with shared access. `f` must not call back into this handle.
    pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.document.borrow())
    }

    /// Runs `f` with exclusive access. `f` must not call back into this handle.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.document.borrow_mut())
    }

    pub fn body(&self) -> NodeId {
        self.with(Document::body)
    }

    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.with(|document| document.query(scope, selector))
    }

    pub fn outer_html(&self, id: NodeId) -> DomResult<String> {
        self.with(|document| document.outer_html(id))
    }

    /// Dispatches `kind` at `target` and bubbles it to every ancestor.
    ///
    /// Listeners are looked up right before each invocation, so a listener
    /// that replaces part of the tree stops propagation through freed nodes.
    pub fn dispatch(&self, target: NodeId, kind: DomEventKind) -> DomResult<()> {
        let (event, path) = self.with(|document| {
            if !document.is_live(target) {
                return Err(DomError::UnknownNode(target));
            }
            let event = DomEvent {
                kind,
                target,
                value: document.attr(target, "value").map(str::to_string),
                checked: document.is_checked(target),
            };
            Ok((event, document.ancestors_inclusive(target)))
        })?;

        for node in path {
            let listener = self.with(|document| document.listener(node, kind));
            if let Some(listener) = listener {
                listener(&event);
            }
        }
        Ok(())
    }

    pub fn click(&self, target: NodeId) -> DomResult<()> {
        self.dispatch(target, DomEventKind::Click)
    }

    /// Replaces the control value as if typed, then fires `input`.
    pub fn type_into(&self, target: NodeId, text: &str) -> DomResult<()> {
        self.with_mut(|document| {
            document.set_attr(target, "value", text)?;
            if document.focused() == Some(target) {
                document.set_caret(text.chars().count());
            }
            Ok::<(), DomError>(())
        })?;
        self.dispatch(target, DomEventKind::Input)
    }

    /// Sets the control value and fires `change`.
    pub fn change_value(&self, target: NodeId, text: &str) -> DomResult<()> {
        self.with_mut(|document| document.set_attr(target, "value", text))?;
        self.dispatch(target, DomEventKind::Change)
    }

    /// Flips a checkbox and fires `change`.
    pub fn toggle(&self, target: NodeId) -> DomResult<()> {
        self.with_mut(|document| {
            if document.is_checked(target) {
                document.remove_attr(target, "checked")
            } else {
                document.set_attr(target, "checked", "")
            }
        })?;
        self.dispatch(target, DomEventKind::Change)
    }

    /// Checks one radio, unchecks its same-named siblings, fires `change`.
    pub fn select_radio(&self, target: NodeId) -> DomResult<()> {
        self.with_mut(|document| {
            let name = document.attr(target, "name").map(str::to_string);
            if let (Some(name), Some(parent)) = (name, document.parent(target)) {
                let scope = document
                    .ancestors_inclusive(parent)
                    .into_iter()
                    .find(|node| document.tag(*node) == Some("form"))
                    .unwrap_or(parent);
                for radio in document.query_all(scope, &Selector::name(name)) {
                    document.remove_attr(radio, "checked")?;
                }
            }
            document.set_attr(target, "checked", "")
        })?;
        self.dispatch(target, DomEventKind::Change)
    }

    pub fn submit(&self, form: NodeId) -> DomResult<()> {
        self.dispatch(form, DomEventKind::Submit)
    }

    pub fn reset(&self, form: NodeId) -> DomResult<()> {
        self.dispatch(form, DomEventKind::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Dom, DomError, DomEvent, DomEventKind, RenderPosition, Selector};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn replace_keeps_position_and_drops_focus_inside_old_node() {
        let mut document = Document::new();
        let body = document.body();
        let first = document.create_element("li");
        let second = document.create_element("li");
        let input = document.create_element("input");
        document.insert(body, first, RenderPosition::BeforeEnd).unwrap();
        document.insert(body, second, RenderPosition::BeforeEnd).unwrap();
        document.insert(first, input, RenderPosition::BeforeEnd).unwrap();
        document.focus(input).unwrap();

        let replacement = document.create_element("form");
        document.replace_node(first, replacement).unwrap();

        assert_eq!(document.children(body), vec![replacement, second]);
        assert_eq!(document.focused(), None);
        assert!(document.is_live(first));
        assert!(!document.is_connected(first));
    }

    #[test]
    fn discard_frees_subtree_and_listeners() {
        let mut document = Document::new();
        let body = document.body();
        let parent = document.create_element("div");
        let child = document.create_element("button");
        document.insert(body, parent, RenderPosition::BeforeEnd).unwrap();
        document.insert(parent, child, RenderPosition::BeforeEnd).unwrap();
        document
            .set_listener(child, DomEventKind::Click, Rc::new(|_: &DomEvent| {}))
            .unwrap();

        document.discard(parent).unwrap();

        assert!(!document.is_live(child));
        assert_eq!(document.total_listener_count(), 0);
        assert_eq!(document.node_count(), 1);
    }

    #[test]
    fn discarded_slots_are_reused_without_reviving_stale_ids() {
        let mut document = Document::new();
        let body = document.body();
        let old = document.create_element("div");
        document.insert(body, old, RenderPosition::BeforeEnd).unwrap();
        document.discard(old).unwrap();

        let fresh = document.create_element("span");

        assert_eq!(document.slot_count(), 2);
        assert_ne!(fresh, old);
        assert!(!document.is_live(old));
        assert_eq!(document.tag(fresh), Some("span"));
        assert_eq!(
            document.set_attr(old, "class", "stale"),
            Err(DomError::UnknownNode(old))
        );
        assert_eq!(document.discard(old), Err(DomError::UnknownNode(old)));
        assert!(document.is_live(fresh));
    }

    #[test]
    fn insert_rejects_attached_nodes_and_cycles() {
        let mut document = Document::new();
        let body = document.body();
        let outer = document.create_element("div");
        document.insert(body, outer, RenderPosition::BeforeEnd).unwrap();

        assert_eq!(
            document.insert(body, outer, RenderPosition::BeforeEnd),
            Err(DomError::AlreadyAttached(outer))
        );
        let detached = document.create_element("div");
        let inner = document.create_element("span");
        document.insert(detached, inner, RenderPosition::BeforeEnd).unwrap();
        document.detach(inner).unwrap();
        document.insert(inner, detached, RenderPosition::BeforeEnd).unwrap();
        assert_eq!(
            document.insert(detached, inner, RenderPosition::BeforeEnd),
            Err(DomError::Cycle(inner))
        );
    }

    #[test]
    fn setting_a_listener_twice_keeps_one_record() {
        let dom = Dom::new();
        let body = dom.body();
        let button = dom.with_mut(|document| {
            let button = document.create_element("button");
            document
                .insert(body, button, RenderPosition::BeforeEnd)
                .unwrap();
            button
        });
        let hits = Rc::new(RefCell::new(0));
        for _ in 0..3 {
            let counter = Rc::clone(&hits);
            dom.with_mut(|document| {
                document
                    .set_listener(
                        button,
                        DomEventKind::Click,
                        Rc::new(move |_: &DomEvent| *counter.borrow_mut() += 1),
                    )
                    .unwrap()
            });
        }

        dom.click(button).unwrap();

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(dom.with(|document| document.listener_count(button)), 1);
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let dom = Dom::new();
        let body = dom.body();
        let (form, input) = dom.with_mut(|document| {
            let form = document.create_element("form");
            let input = document.create_element("input");
            document.set_attr(input, "name", "event-price").unwrap();
            document.insert(body, form, RenderPosition::BeforeEnd).unwrap();
            document.insert(form, input, RenderPosition::BeforeEnd).unwrap();
            (form, input)
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        dom.with_mut(|document| {
            document
                .set_listener(
                    form,
                    DomEventKind::Input,
                    Rc::new(move |event: &DomEvent| log.borrow_mut().push(event.value.clone())),
                )
                .unwrap()
        });

        dom.type_into(input, "250").unwrap();

        assert_eq!(*seen.borrow(), vec![Some("250".to_string())]);
        assert_eq!(
            dom.query(body, &Selector::name("event-price")),
            Some(input)
        );
    }
}
