//! Typed CTM document model and canonical rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grammar::scan::escape;

/// One line of a CTM document.
///
/// `label`, attribute keys and attribute values are stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtmNode {
    /// Depth in the tree; the root is level 0.
    pub level: usize,
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl CtmNode {
    pub fn new(level: usize, label: impl Into<String>) -> Self {
        Self {
            level,
            label: label.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute to the node.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// An ordered CTM outline.
///
/// A node at level N is a child of the nearest preceding node at level N-1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtmDocument {
    pub nodes: Vec<CtmNode>,
}

impl CtmDocument {
    pub fn new(nodes: Vec<CtmNode>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deepest level present, or `None` for an empty document.
    pub fn depth(&self) -> Option<usize> {
        self.nodes.iter().map(|n| n.level).max()
    }

    /// Indices of the direct children of the node at `index`.
    pub fn children_of(&self, index: usize) -> Vec<usize> {
        let Some(parent) = self.nodes.get(index) else {
            return Vec::new();
        };

        self.nodes[index + 1..]
            .iter()
            .enumerate()
            .take_while(|(_, n)| n.level > parent.level)
            .filter(|(_, n)| n.level == parent.level + 1)
            .map(|(offset, _)| index + 1 + offset)
            .collect()
    }
}

/// Render a document as canonical CTM text, one node per line.
///
/// Separator characters inside labels, keys and values are backslash-escaped
/// so the output reads back as the same document. Labels are written
/// trimmed; surrounding whitespace is not representable in CTM.
pub fn render_document(doc: &CtmDocument) -> String {
    doc.nodes
        .iter()
        .map(render_node)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_node(node: &CtmNode) -> String {
    let mut line = ">".repeat(node.level);
    line.push_str(&escape(node.label.trim()));

    if !node.attributes.is_empty() {
        let attrs = node
            .attributes
            .iter()
            .map(|(k, v)| format!("{}:{}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join(",");
        line.push('|');
        line.push_str(&attrs);
    }

    line
}
