//! Document tree, built by html5ever.
//!
//! Rendered pages arrive as strings from whatever produced the site. [`parse`]
//! runs them through html5ever's tree builder and copies the result into an
//! owned [`Node`] tree that the rest of the pipeline reads: the element filter
//! rebuilds it, the prose view walks it, and the serializer writes it back out.
//!
//! ## What the parser repairs
//!
//! Everything a browser repairs: implied end tags, stray end tags, misnested
//! inline elements, elements still open at the end of input.
//!
//! ```text
//! <p>one<p>two            →  <p>one</p><p>two</p>
//! <ul><li>a<li>b</ul>     →  <ul><li>a</li><li>b</li></ul>
//! </em>stray              →  stray
//! <section>open at EOF    →  <section>open at EOF</section>
//! ```
//!
//! ## What it refuses
//!
//! Input that ends in the middle of markup. html5ever reports these as
//! end-of-file parse errors and they become a [`ParseError`], which the
//! pipeline turns into a single fatal diagnostic:
//!
//! ```text
//! <div class="x           attribute value never closed
//! <p>a</p                 tag never closed
//! <!-- note               comment never closed
//! <script>let x = 1;      raw text element without its end tag
//! ```
//!
//! ## Documents and fragments
//!
//! Input that starts with a doctype or an `<html>` tag is parsed as a full
//! document, so `head` and `body` are always present. Anything else is parsed
//! as the content of a `<body>` and the tree holds just that content.
//!
//! html5ever tracks lines but not columns, so positions are line numbers.

use html5ever::interface::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tokenizer::TokenizerOpts;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{
    ExpandedName, ParseOpts, QualName, local_name, namespace_url, ns, parse_document,
    parse_fragment,
};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is markup-free and written back unescaped.
const UNESCAPED_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "dialog",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "li", "main", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Whether `tag` is a block-level element (starts a new line of flow content).
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Whether text inside `tag` is emitted verbatim (no escaping).
pub fn is_unescaped_tag(tag: &str) -> bool {
    UNESCAPED_ELEMENTS.contains(&tag)
}

/// 1-based line in the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
}

impl Position {
    pub fn new(line: usize) -> Self {
        Self { line }
    }

    /// Move past `ch` as it appears in the source.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// Input that ends inside markup. `position` is where the input ran out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input ends inside a tag (line {})", .position.line)]
    UnterminatedTag { position: Position },
    #[error("input ends inside a quoted attribute value (line {})", .position.line)]
    UnterminatedAttribute { position: Position },
    #[error("input ends inside a comment (line {})", .position.line)]
    UnterminatedComment { position: Position },
    #[error("input ends inside a doctype (line {})", .position.line)]
    UnterminatedDoctype { position: Position },
    #[error("script, style or other raw text element is never closed (line {})", .position.line)]
    UnclosedRawText { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnterminatedTag { position }
            | ParseError::UnterminatedAttribute { position }
            | ParseError::UnterminatedComment { position }
            | ParseError::UnterminatedDoctype { position }
            | ParseError::UnclosedRawText { position } => *position,
        }
    }

    /// Classify an html5ever error message. Only end-of-file errors are
    /// fatal; everything else html5ever recovers from.
    fn from_message(message: &str, line: usize) -> Option<Self> {
        let position = Position::new(line);
        if message.contains("EOFToken") && message.trim_end_matches(" }").ends_with(" Text") {
            return Some(ParseError::UnclosedRawText { position });
        }
        let state = message.strip_prefix("Saw EOF in state ")?;
        Some(if state.contains("Comment") {
            ParseError::UnterminatedComment { position }
        } else if state.contains("Doctype") {
            ParseError::UnterminatedDoctype { position }
        } else if state.starts_with("ScriptData") {
            ParseError::UnclosedRawText { position }
        } else if state.starts_with("AttributeValue") && !state.contains("Unquoted") {
            ParseError::UnterminatedAttribute { position }
        } else {
            ParseError::UnterminatedTag { position }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local tag name, lowercase for HTML elements.
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// A node in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root {
        children: Vec<Node>,
    },
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element(Element),
    Text {
        value: String,
        position: Position,
    },
    Comment {
        value: String,
    },
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children } => children,
            Node::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// All nodes below this one, depth-first in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().iter().rev().collect(),
        }
    }

    /// Concatenated text of this node and everything below it.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text { value, .. } => value.clone(),
            _ => self
                .descendants()
                .filter_map(|n| match n {
                    Node::Text { value, .. } => Some(value.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse an HTML document or fragment into a [`Node::Root`].
pub fn parse(content: &str) -> Result<Node, ParseError> {
    let opts = ParseOpts {
        tokenizer: TokenizerOpts {
            exact_errors: true,
            ..TokenizerOpts::default()
        },
        tree_builder: TreeBuilderOpts {
            exact_errors: true,
            ..TreeBuilderOpts::default()
        },
    };

    let document = is_document(content);
    let sink = if document {
        parse_document(ArenaSink::new(), opts).one(content)
    } else {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        parse_fragment(ArenaSink::new(), opts, context, Vec::new()).one(content)
    };

    if let Some(error) = sink
        .errors
        .iter()
        .find_map(|(message, line)| ParseError::from_message(message, *line))
    {
        return Err(error);
    }

    // A fragment lives under the synthetic <html> html5ever puts at the top.
    let top = &sink.nodes[DOCUMENT].children;
    let top = match (document, top.first()) {
        (false, Some(&html)) => &sink.nodes[html].children,
        _ => top,
    };
    Ok(Node::Root {
        children: sink.convert(top),
    })
}

fn is_document(content: &str) -> bool {
    let start = content.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let head = start.chars().take(9).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

const DOCUMENT: usize = 0;

/// Tree sink for html5ever: nodes live in a vector and handles are indices.
struct ArenaSink {
    nodes: Vec<ArenaNode>,
    /// Parse errors with the line they were reported on.
    errors: Vec<(Cow<'static, str>, usize)>,
    line: usize,
}

struct ArenaNode {
    parent: Option<usize>,
    children: Vec<usize>,
    data: ArenaData,
}

enum ArenaData {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: QualName,
        attributes: Vec<html5ever::Attribute>,
        template: Option<usize>,
        mathml_integration: bool,
    },
    Text {
        value: String,
        line: usize,
    },
    Comment(String),
    ProcessingInstruction,
}

impl ArenaSink {
    fn new() -> Self {
        Self {
            nodes: vec![ArenaNode {
                parent: None,
                children: Vec::new(),
                data: ArenaData::Document,
            }],
            errors: Vec::new(),
            line: 1,
        }
    }

    fn push(&mut self, data: ArenaData) -> usize {
        self.nodes.push(ArenaNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        self.nodes.len() - 1
    }

    fn detach(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }

    fn insert(&mut self, parent: usize, index: usize, child: NodeOrText<usize>) {
        let id = match child {
            NodeOrText::AppendNode(id) => {
                self.detach(id);
                id
            }
            NodeOrText::AppendText(text) => {
                let previous = index
                    .checked_sub(1)
                    .and_then(|i| self.nodes[parent].children.get(i).copied());
                if let Some(previous) = previous
                    && let ArenaData::Text { value, .. } = &mut self.nodes[previous].data
                {
                    value.push_str(&text);
                    return;
                }
                // Newlines reach the sink one at a time, after the line
                // counter has moved past them.
                let line = self.line.saturating_sub(text.matches('\n').count()).max(1);
                self.push(ArenaData::Text {
                    value: text.to_string(),
                    line,
                })
            }
        };
        self.nodes[id].parent = Some(parent);
        let index = index.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(index, id);
    }

    fn convert(&self, ids: &[usize]) -> Vec<Node> {
        ids.iter().filter_map(|&id| self.convert_node(id)).collect()
    }

    fn convert_node(&self, id: usize) -> Option<Node> {
        let node = &self.nodes[id];
        let converted = match &node.data {
            ArenaData::Doctype {
                name,
                public_id,
                system_id,
            } => Node::Doctype {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
            },
            ArenaData::Element {
                name,
                attributes,
                template,
                ..
            } => {
                let children = match template {
                    Some(contents) => &self.nodes[*contents].children,
                    None => &node.children,
                };
                Node::Element(Element {
                    tag: name.local.to_string(),
                    attributes: attributes.iter().map(convert_attribute).collect(),
                    children: self.convert(children),
                })
            }
            ArenaData::Text { value, line } => Node::Text {
                value: value.clone(),
                position: Position::new(*line),
            },
            ArenaData::Comment(value) => Node::Comment {
                value: value.clone(),
            },
            ArenaData::Document | ArenaData::ProcessingInstruction => return None,
        };
        Some(converted)
    }
}

fn convert_attribute(attribute: &html5ever::Attribute) -> Attribute {
    let name = match &attribute.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attribute.name.local),
        None => attribute.name.local.to_string(),
    };
    Attribute::new(name, attribute.value.to_string())
}

impl TreeSink for ArenaSink {
    type Handle = usize;
    type Output = Self;

    fn finish(self) -> Self {
        self
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        self.errors.push((msg, self.line));
    }

    fn get_document(&mut self) -> usize {
        DOCUMENT
    }

    fn elem_name<'a>(&'a self, target: &'a usize) -> ExpandedName<'a> {
        match &self.nodes[*target].data {
            ArenaData::Element { name, .. } => name.expanded(),
            _ => unreachable!("html5ever only asks for the names of elements"),
        }
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        flags: ElementFlags,
    ) -> usize {
        let template = flags.template.then(|| self.push(ArenaData::Document));
        self.push(ArenaData::Element {
            name,
            attributes: attrs,
            template,
            mathml_integration: flags.mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> usize {
        self.push(ArenaData::Comment(text.to_string()))
    }

    fn create_pi(&mut self, _target: StrTendril, _data: StrTendril) -> usize {
        self.push(ArenaData::ProcessingInstruction)
    }

    fn append(&mut self, parent: &usize, child: NodeOrText<usize>) {
        let end = self.nodes[*parent].children.len();
        self.insert(*parent, end, child);
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &usize,
        prev_element: &usize,
        child: NodeOrText<usize>,
    ) {
        if self.nodes[*element].parent.is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = self.push(ArenaData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
        self.append(&DOCUMENT, NodeOrText::AppendNode(doctype));
    }

    fn get_template_contents(&mut self, target: &usize) -> usize {
        match self.nodes[*target].data {
            ArenaData::Element {
                template: Some(contents),
                ..
            } => contents,
            _ => *target,
        }
    }

    fn same_node(&self, x: &usize, y: &usize) -> bool {
        x == y
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn append_before_sibling(&mut self, sibling: &usize, new_node: NodeOrText<usize>) {
        if let NodeOrText::AppendNode(id) = &new_node {
            self.detach(*id);
        }
        let Some(parent) = self.nodes[*sibling].parent else {
            return;
        };
        let index = self.nodes[parent]
            .children
            .iter()
            .position(|child| child == sibling)
            .unwrap_or(0);
        self.insert(parent, index, new_node);
    }

    fn add_attrs_if_missing(&mut self, target: &usize, attrs: Vec<html5ever::Attribute>) {
        if let ArenaData::Element { attributes, .. } = &mut self.nodes[*target].data {
            for attr in attrs {
                if !attributes.iter().any(|a| a.name == attr.name) {
                    attributes.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&mut self, target: &usize) {
        self.detach(*target);
    }

    fn reparent_children(&mut self, node: &usize, new_parent: &usize) {
        let children = std::mem::take(&mut self.nodes[*node].children);
        for &child in &children {
            self.nodes[child].parent = Some(*new_parent);
        }
        self.nodes[*new_parent].children.extend(children);
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &usize) -> bool {
        matches!(
            self.nodes[*handle].data,
            ArenaData::Element {
                mathml_integration: true,
                ..
            }
        )
    }

    fn set_current_line(&mut self, line_number: u64) {
        self.line = usize::try_from(line_number).unwrap_or(usize::MAX);
    }
}
