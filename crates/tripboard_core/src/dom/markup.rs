//! Markup import and serialization for `Document`.

use super::{Document, DomError, DomResult, NodeData, NodeId, NodeKind};
use scraper::{ElementRef, Html, Node};
use std::collections::BTreeMap;

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

impl Document {
    /// Parses template markup into a detached subtree and returns its root.
    ///
    /// Whitespace-only text between elements is dropped.
    ///
    /// # Errors
    /// - `TemplateRoot` unless the markup has exactly one top-level element
    ///   and no top-level text.
    pub fn create_fragment(&mut self, markup: &str) -> DomResult<NodeId> {
        let fragment = Html::parse_fragment(markup);
        let mut roots = Vec::new();
        let mut stray_text = false;
        for child in fragment.root_element().children() {
            match child.value() {
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        roots.push(self.import_element(element));
                    }
                }
                Node::Text(text) => {
                    let content: &str = text;
                    stray_text |= !content.trim().is_empty();
                }
                _ => {}
            }
        }

        if roots.len() != 1 || stray_text {
            let found = roots.len();
            for root in roots {
                self.discard(root)?;
            }
            return Err(DomError::TemplateRoot { found });
        }
        Ok(roots[0])
    }

    fn import_element(&mut self, element: ElementRef<'_>) -> NodeId {
        let value = element.value();
        let attrs: BTreeMap<String, String> = value
            .attrs()
            .map(|(name, content)| (name.to_string(), content.to_string()))
            .collect();
        let id = self.alloc(NodeKind::Element {
            tag: value.name().to_string(),
            attrs,
        });

        for child in element.children() {
            let child_id = match child.value() {
                Node::Element(_) => ElementRef::wrap(child).map(|inner| self.import_element(inner)),
                Node::Text(text) => {
                    let content: &str = text;
                    if content.trim().is_empty() {
                        None
                    } else {
                        Some(self.alloc(NodeKind::Text(content.to_string())))
                    }
                }
                _ => None,
            };
            if let Some(child_id) = child_id {
                self.link(id, child_id);
            }
        }
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Ok(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Ok(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Serializes a subtree with escaped text and attribute values.
    pub fn outer_html(&self, id: NodeId) -> DomResult<String> {
        let mut out = String::new();
        self.write_node(self.node(id)?, &mut out);
        Ok(out)
    }

    fn write_node(&self, node: &NodeData, out: &mut String) {
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &node.children {
                    if let Ok(child) = self.node(*child) {
                        self.write_node(child, out);
                    }
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
