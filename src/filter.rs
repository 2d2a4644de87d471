//! Subtree removal ahead of prose analysis.
//!
//! Code samples are not prose: `The cake was eaten by the dog.` inside a
//! `<pre><code>` block must never trip the passive-voice rule. The filter
//! produces a new tree without those subtrees and leaves the parsed original
//! alone, so the transform path can still serialize every byte of it.

use crate::tree::{Element, Node};
use std::collections::HashSet;

/// Tags excluded from linting when nothing else is configured.
pub const DEFAULT_EXCLUDED_TAGS: &[&str] = &["pre", "code"];

/// Removes every element with an excluded tag, together with its subtree.
#[derive(Debug, Clone)]
pub struct ElementFilter {
    excluded: HashSet<String>,
}

impl Default for ElementFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_TAGS.iter().copied())
    }
}

impl ElementFilter {
    /// Build a filter; tag names are matched case-insensitively.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: tags
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn excludes(&self, tag: &str) -> bool {
        self.excluded.contains(&tag.to_ascii_lowercase())
    }

    /// Rebuild `tree` without excluded subtrees. Sibling order is preserved.
    pub fn apply(&self, tree: &Node) -> Node {
        // An excluded root element leaves nothing to analyze.
        self.filter_node(tree).unwrap_or(Node::Root {
            children: Vec::new(),
        })
    }

    fn filter_children(&self, children: &[Node]) -> Vec<Node> {
        children
            .iter()
            .filter_map(|child| self.filter_node(child))
            .collect()
    }

    fn filter_node(&self, node: &Node) -> Option<Node> {
        match node {
            Node::Element(element) if self.excludes(&element.tag) => None,
            Node::Element(element) => Some(Node::Element(Element {
                tag: element.tag.clone(),
                attributes: element.attributes.clone(),
                children: self.filter_children(&element.children),
            })),
            Node::Root { children } => Some(Node::Root {
                children: self.filter_children(children),
            }),
            leaf => Some(leaf.clone()),
        }
    }
}
