//! Transient interaction state that survives a subtree swap.
//!
//! Focus and scroll live on nodes, so a freshly built subtree starts without
//! them. Capturing before the swap and restoring by `name` afterwards makes a
//! re-render invisible to the user.

use super::{Document, DomResult, NodeId, Selector};

/// Focus, caret and scroll offsets of one subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientDomState {
    /// `name` of the focused control inside the subtree.
    pub focused_name: Option<String>,
    /// `value` of the focused control; tells same-named radios apart.
    pub focused_value: Option<String>,
    /// Position of the focused control among controls sharing its name.
    pub focused_index: usize,
    pub caret: usize,
    pub root_scroll: u32,
    /// Non-zero scroll offsets of named descendants.
    pub named_scroll: Vec<(String, u32)>,
}

impl Document {
    /// Snapshots transient state of the subtree rooted at `root`.
    pub fn capture_transient(&self, root: NodeId) -> TransientDomState {
        let focused = self
            .focused()
            .filter(|focused| self.contains(root, *focused))
            .and_then(|focused| Some((focused, self.attr(focused, "name")?.to_string())));
        let (focused_name, focused_value, focused_index) = match focused {
            Some((node, name)) => {
                let index = self
                    .query_all(root, &Selector::name(name.as_str()))
                    .iter()
                    .position(|peer| *peer == node)
                    .unwrap_or(0);
                let value = self.attr(node, "value").map(str::to_string);
                (Some(name), value, index)
            }
            None => (None, None, 0),
        };
        let named_scroll = self
            .query_all(root, &Selector::NamePrefix(String::new()))
            .into_iter()
            .filter_map(|node| {
                let offset = self.scroll_top(node);
                let name = self.attr(node, "name")?;
                (offset > 0).then(|| (name.to_string(), offset))
            })
            .collect();

        TransientDomState {
            caret: if focused_name.is_some() { self.caret() } else { 0 },
            focused_name,
            focused_value,
            focused_index,
            root_scroll: self.scroll_top(root),
            named_scroll,
        }
    }

    /// Reapplies `state` to the subtree rooted at `root`.
    ///
    /// Returns `Ok(false)` when the previously focused control no longer
    /// exists; scroll offsets are still restored in that case.
    pub fn restore_transient(
        &mut self,
        root: NodeId,
        state: &TransientDomState,
    ) -> DomResult<bool> {
        self.set_scroll_top(root, state.root_scroll)?;
        for (name, offset) in &state.named_scroll {
            if let Some(node) = self.query(root, &Selector::name(name.as_str())) {
                self.set_scroll_top(node, *offset)?;
            }
        }

        let Some(name) = state.focused_name.as_deref() else {
            return Ok(true);
        };
        let peers = self.query_all(root, &Selector::name(name));
        let by_value = match (&state.focused_value, peers.len()) {
            (Some(value), 2..) => peers
                .iter()
                .copied()
                .find(|peer| self.attr(*peer, "value") == Some(value.as_str())),
            _ => None,
        };
        let Some(target) = by_value
            .or_else(|| peers.get(state.focused_index).copied())
            .or_else(|| peers.first().copied())
        else {
            return Ok(false);
        };
        self.focus(target)?;
        self.set_caret(state.caret);
        Ok(true)
    }
}
