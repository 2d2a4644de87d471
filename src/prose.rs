//! Prose view of a document tree.
//!
//! Rules reason about words and sentences, not elements. [`Prose::from_tree`]
//! flattens a (filtered) tree into paragraphs: block-level elements open and
//! close a paragraph, inline elements flow into the surrounding one, so
//! `<p>the <em>the</em> end</p>` reads as the single line `the the end`.
//!
//! Every paragraph remembers where each of its text runs came from, so a
//! finding at any byte offset maps back to a line in the original document
//! ([`Paragraph::position_at`]).

use crate::tree::{Node, Position, is_block_tag};
use std::ops::Range;

/// Elements whose text is never prose.
const NON_PROSE_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "svg", "math"];

/// The paragraphs of a document.
#[derive(Debug, Clone, Default)]
pub struct Prose {
    paragraphs: Vec<Paragraph>,
}

impl Prose {
    pub fn from_tree(tree: &Node) -> Self {
        let mut builder = ProseBuilder::default();
        builder.visit(tree);
        builder.flush();
        Self {
            paragraphs: builder.paragraphs,
        }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }
}

/// A run of flow text with a map back to the source.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    text: String,
    anchors: Vec<Anchor>,
}

/// Source position of the text starting at `offset`.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    offset: usize,
    origin: Position,
}

/// A word and its byte range within the paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Word<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn lowercase(&self) -> String {
        self.text.to_lowercase()
    }
}

impl Paragraph {
    /// Build a paragraph from plain text, anchored at line 1.
    pub fn from_text(text: &str) -> Self {
        let mut paragraph = Self::default();
        paragraph.push(text, Position::default());
        paragraph
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn push(&mut self, text: &str, origin: Position) {
        self.anchors.push(Anchor {
            offset: self.text.len(),
            origin,
        });
        self.text.push_str(text);
    }

    fn push_break(&mut self) {
        self.text.push('\n');
    }

    /// Source position of the byte at `offset`.
    pub fn position_at(&self, offset: usize) -> Option<Position> {
        let anchor = self.anchors.iter().rev().find(|a| a.offset <= offset)?;
        let mut position = anchor.origin;
        for ch in self.text.get(anchor.offset..offset)?.chars() {
            position.advance(ch);
        }
        Some(position)
    }

    /// Words in order. A word is a run of letters and digits, allowing
    /// single inner apostrophes and hyphens (`don't`, `e-mail`).
    pub fn words(&self) -> Vec<Word<'_>> {
        let mut words = Vec::new();
        let mut start: Option<usize> = None;
        let mut chars = self.text.char_indices().peekable();

        while let Some((i, ch)) = chars.next() {
            if ch.is_alphanumeric() {
                start.get_or_insert(i);
                continue;
            }
            let joins = matches!(ch, '\'' | '\u{2019}' | '-')
                && start.is_some()
                && chars.peek().is_some_and(|(_, next)| next.is_alphanumeric());
            if joins {
                continue;
            }
            if let Some(s) = start.take() {
                words.push(Word {
                    text: &self.text[s..i],
                    start: s,
                    end: i,
                });
            }
        }
        if let Some(s) = start {
            words.push(Word {
                text: &self.text[s..],
                start: s,
                end: self.text.len(),
            });
        }
        words
    }

    /// Text between two words (`a` before `b`).
    pub fn gap(&self, a: &Word<'_>, b: &Word<'_>) -> &str {
        &self.text[a.end..b.start]
    }

    /// Whether only whitespace separates two words.
    pub fn adjacent(&self, a: &Word<'_>, b: &Word<'_>) -> bool {
        let gap = self.gap(a, b);
        !gap.is_empty() && gap.chars().all(char::is_whitespace)
    }
}

#[derive(Default)]
struct ProseBuilder {
    paragraphs: Vec<Paragraph>,
    current: Paragraph,
}

impl ProseBuilder {
    fn visit(&mut self, node: &Node) {
        match node {
            Node::Root { children } => children.iter().for_each(|c| self.visit(c)),
            Node::Text { value, position } => self.current.push(value, *position),
            Node::Element(element) => {
                let tag = element.tag.as_str();
                if NON_PROSE_ELEMENTS.contains(&tag) {
                    return;
                }
                if tag == "br" {
                    self.current.push_break();
                    return;
                }
                let block = is_block_tag(tag);
                if block {
                    self.flush();
                }
                element.children.iter().for_each(|c| self.visit(c));
                if block {
                    self.flush();
                }
            }
            Node::Comment { .. } | Node::Doctype { .. } => {}
        }
    }

    fn flush(&mut self) {
        let paragraph = std::mem::take(&mut self.current);
        if !paragraph.text.trim().is_empty() {
            self.paragraphs.push(paragraph);
        }
    }
}
