//! Tree to HTML string, optionally minified.
//!
//! Serialization always writes void elements without an end tag, keeps
//! raw-text content (`script`, `style`, `noscript` and friends) verbatim and
//! escapes everything else. Minifying additionally:
//!
//! - drops comments
//! - collapses whitespace runs to a single space (outside `pre`, `textarea`,
//!   `listing` and raw-text elements)
//! - trims whitespace at block boundaries and drops text left empty
//! - unquotes attribute values where that is safe, and writes empty boolean
//!   attributes bare
//!
//! Metadata elements (`meta`, `script`, `noscript`, ...) only count as block
//! boundaries directly inside `head` or `html`. Inside flow content they sit
//! inline, so `Hello <script>..</script> world` keeps both spaces.
//!
//! Minifying is idempotent: minifying the output again yields the same bytes.

use crate::tree::{Attribute, Element, Node, is_block_tag, is_unescaped_tag, is_void_tag};

/// Elements whose whitespace is content, besides the raw-text ones.
const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// The parser drops one newline right after these start tags.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Non-rendered elements that end a line of content inside `head`.
const METADATA_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Parents whose children are laid out without significant whitespace.
const METADATA_PARENTS: &[&str] = &["head", "html"];

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "default",
    "defer",
    "disabled",
    "formnovalidate",
    "hidden",
    "inert",
    "ismap",
    "itemscope",
    "loop",
    "multiple",
    "muted",
    "nomodule",
    "novalidate",
    "open",
    "playsinline",
    "readonly",
    "required",
    "reversed",
    "selected",
];

/// Write `tree` back out as HTML.
pub fn serialize(tree: &Node, minify: bool) -> String {
    let mut out = String::new();
    if minify {
        write_node(&minify_node(tree), true, false, &mut out);
    } else {
        write_node(tree, false, false, &mut out);
    }
    out
}

// ============================================================================
// Minification
// ============================================================================

/// Where a run of siblings sits.
#[derive(Debug, Clone, Copy)]
struct Siblings<'a> {
    parent: Option<&'a str>,
    preformatted: bool,
}

impl Siblings<'_> {
    /// Text at the very start or end of the run touches a block edge.
    fn in_block(&self) -> bool {
        self.parent
            .is_none_or(|tag| is_block_tag(tag) || METADATA_ELEMENTS.contains(&tag))
    }

    /// Whether whitespace next to `node` is insignificant.
    fn is_boundary(&self, node: &Node) -> bool {
        match node {
            Node::Element(element) => {
                let tag = element.tag.as_str();
                is_block_tag(tag)
                    || (METADATA_ELEMENTS.contains(&tag)
                        && self.parent.is_some_and(|p| METADATA_PARENTS.contains(&p)))
            }
            Node::Doctype { .. } => true,
            _ => false,
        }
    }
}

fn minify_node(node: &Node) -> Node {
    match node {
        Node::Root { children } => Node::Root {
            children: minify_children(
                children,
                Siblings {
                    parent: None,
                    preformatted: false,
                },
            ),
        },
        Node::Element(element) => Node::Element(minify_element(element, false)),
        other => other.clone(),
    }
}

fn minify_element(element: &Element, preformatted: bool) -> Element {
    let tag = element.tag.as_str();
    let siblings = Siblings {
        parent: Some(tag),
        preformatted: preformatted
            || PREFORMATTED_ELEMENTS.contains(&tag)
            || is_unescaped_tag(tag),
    };
    Element {
        tag: element.tag.clone(),
        attributes: element.attributes.clone(),
        children: minify_children(&element.children, siblings),
    }
}

fn minify_children(children: &[Node], siblings: Siblings<'_>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Comment { .. } => {}
            Node::Text { value, position } => match merged.last_mut() {
                Some(Node::Text { value: last, .. }) => last.push_str(value),
                _ => merged.push(Node::Text {
                    value: value.clone(),
                    position: *position,
                }),
            },
            Node::Element(element) => {
                merged.push(Node::Element(minify_element(element, siblings.preformatted)))
            }
            other => merged.push(other.clone()),
        }
    }
    if siblings.preformatted {
        return merged;
    }

    let in_block = siblings.in_block();
    let trim: Vec<(bool, bool)> = (0..merged.len())
        .map(|i| {
            let at_start = if i == 0 {
                in_block
            } else {
                siblings.is_boundary(&merged[i - 1])
            };
            let at_end = merged
                .get(i + 1)
                .map_or(in_block, |next| siblings.is_boundary(next));
            (at_start, at_end)
        })
        .collect();

    merged
        .into_iter()
        .zip(trim)
        .filter_map(|(node, (at_start, at_end))| match node {
            Node::Text { value, position } => {
                let mut value = collapse_whitespace(&value);
                if at_end {
                    value.truncate(value.trim_end_matches(' ').len());
                }
                if at_start {
                    value = value.trim_start_matches(' ').to_string();
                }
                (!value.is_empty()).then_some(Node::Text { value, position })
            }
            other => Some(other),
        })
        .collect()
}

/// Replace each run of ASCII whitespace with one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

// ============================================================================
// Writing
// ============================================================================

fn write_node(node: &Node, minify: bool, raw: bool, out: &mut String) {
    match node {
        Node::Root { children } => {
            for child in children {
                write_node(child, minify, raw, out);
            }
        }
        Node::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str(if minify { "<!doctype" } else { "<!DOCTYPE" });
            if !name.is_empty() {
                out.push(' ');
                out.push_str(name);
            }
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push('>');
        }
        Node::Comment { value } => {
            out.push_str("<!--");
            out.push_str(value);
            out.push_str("-->");
        }
        Node::Text { value, .. } => {
            if raw {
                out.push_str(value);
            } else {
                escape_text(value, out);
            }
        }
        Node::Element(element) => write_element(element, minify, out),
    }
}

fn write_element(element: &Element, minify: bool, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for attribute in &element.attributes {
        out.push(' ');
        write_attribute(attribute, minify, out);
    }
    out.push('>');

    if is_void_tag(&element.tag) {
        return;
    }
    if LEADING_NEWLINE_ELEMENTS.contains(&element.tag.as_str())
        && let Some(Node::Text { value, .. }) = element.children.first()
        && value.starts_with('\n')
    {
        out.push('\n');
    }
    let raw = is_unescaped_tag(&element.tag);
    for child in &element.children {
        write_node(child, minify, raw, out);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn write_attribute(attribute: &Attribute, minify: bool, out: &mut String) {
    out.push_str(&attribute.name);
    let value = &attribute.value;
    if minify && value.is_empty() && BOOLEAN_ATTRIBUTES.contains(&attribute.name.as_str()) {
        return;
    }
    out.push('=');
    if minify && can_unquote(value) {
        out.push_str(value);
        return;
    }
    out.push('"');
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn can_unquote(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_ascii_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`' | '&'))
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
