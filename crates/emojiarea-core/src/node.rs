//! Content nodes and the normalized node sequence.
//!
//! A normalized [`NodeSequence`] always alternates text and pictograms,
//! starting and ending with a text span:
//!
//! ```text
//! [Text, Pictogram, Text, Pictogram, Text]
//! ```
//!
//! Text spans may be empty; they exist so the caret always has a text anchor
//! on both sides of every pictogram.

use std::fmt;
use std::ops::Index;

use smol_str::SmolStr;

use crate::catalog::ImageHandle;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSpan {
    pub text: String,
}

impl TextSpan {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One resolved token. Atomic: the caret never sits inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictogramRef {
    /// Full source token including colons, e.g. `:smile:`.
    pub token: SmolStr,
    pub image: ImageHandle,
}

impl PictogramRef {
    pub fn new(token: impl Into<SmolStr>, image: ImageHandle) -> Self {
        Self {
            token: token.into(),
            image,
        }
    }

    /// Token name without colons.
    pub fn name(&self) -> &str {
        crate::catalog::token_body(&self.token)
    }
}

impl From<ImageHandle> for PictogramRef {
    fn from(image: ImageHandle) -> Self {
        Self {
            token: image.alt.clone(),
            image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Text(TextSpan),
    Pictogram(PictogramRef),
}

impl ContentNode {
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text(TextSpan::new(text))
    }

    pub fn pictogram(image: ImageHandle) -> Self {
        ContentNode::Pictogram(image.into())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentNode::Text(_))
    }

    pub fn is_pictogram(&self) -> bool {
        matches!(self, ContentNode::Pictogram(_))
    }

    /// Caret-addressable length: char count for text, 0 for pictograms.
    pub fn caret_len(&self) -> usize {
        match self {
            ContentNode::Text(span) => span.len(),
            ContentNode::Pictogram(_) => 0,
        }
    }

    /// The text this node contributes to the serialized value.
    pub fn source_text(&self) -> &str {
        match self {
            ContentNode::Text(span) => &span.text,
            ContentNode::Pictogram(p) => &p.token,
        }
    }

    /// Length of [`source_text`](Self::source_text) in chars.
    pub fn source_len(&self) -> usize {
        self.source_text().chars().count()
    }
}

impl fmt::Display for ContentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentNode::Text(span) => write!(f, "{:?}", span.text),
            ContentNode::Pictogram(p) => write!(f, "<{}>", p.token),
        }
    }
}

/// Ordered, normalized list of content nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSequence {
    nodes: Vec<ContentNode>,
}

impl Default for NodeSequence {
    fn default() -> Self {
        Self {
            nodes: vec![ContentNode::Text(TextSpan::empty())],
        }
    }
}

impl NodeSequence {
    /// The sequence for empty content: `[TextSpan("")]`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from arbitrary nodes, normalizing them.
    pub fn from_nodes(nodes: Vec<ContentNode>) -> Self {
        Self {
            nodes: normalize_nodes(nodes),
        }
    }

    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<ContentNode> {
        self.nodes
    }

    /// Never zero: a normalized sequence holds at least one text span.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the only node is an empty text span.
    pub fn is_empty(&self) -> bool {
        matches!(self.nodes.as_slice(), [ContentNode::Text(span)] if span.is_empty())
    }

    pub fn get(&self, index: usize) -> Option<&ContentNode> {
        self.nodes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentNode> {
        self.nodes.iter()
    }

    pub fn pictogram_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_pictogram()).count()
    }

    /// If the sequence is a single text span, its text.
    pub fn as_single_text(&self) -> Option<&str> {
        match self.nodes.as_slice() {
            [ContentNode::Text(span)] => Some(&span.text),
            _ => None,
        }
    }

    /// Flat serialization: span texts and pictogram tokens joined in order.
    pub fn to_text(&self) -> String {
        self.nodes.iter().map(ContentNode::source_text).collect()
    }

    /// Length of [`to_text`](Self::to_text) in chars.
    pub fn text_len(&self) -> usize {
        self.nodes.iter().map(ContentNode::source_len).sum()
    }

    /// Check the adjacency invariants.
    pub fn is_normalized(&self) -> bool {
        is_normalized(&self.nodes)
    }
}

impl Index<usize> for NodeSequence {
    type Output = ContentNode;

    fn index(&self, index: usize) -> &ContentNode {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a NodeSequence {
    type Item = &'a ContentNode;
    type IntoIter = std::slice::Iter<'a, ContentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for NodeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("]")
    }
}

pub(crate) fn is_normalized(nodes: &[ContentNode]) -> bool {
    if nodes.len() % 2 == 0 {
        return false;
    }
    nodes
        .iter()
        .enumerate()
        .all(|(i, n)| n.is_text() == (i % 2 == 0))
}

/// Merge adjacent text spans and put a text anchor on both sides of every
/// pictogram.
pub(crate) fn normalize_nodes(nodes: Vec<ContentNode>) -> Vec<ContentNode> {
    let mut out: Vec<ContentNode> = Vec::with_capacity(nodes.len() * 2 + 1);

    for node in nodes {
        match node {
            ContentNode::Text(span) => match out.last_mut() {
                Some(ContentNode::Text(prev)) => prev.text.push_str(&span.text),
                _ => out.push(ContentNode::Text(span)),
            },
            ContentNode::Pictogram(p) => {
                if !matches!(out.last(), Some(ContentNode::Text(_))) {
                    out.push(ContentNode::Text(TextSpan::empty()));
                }
                out.push(ContentNode::Pictogram(p));
            }
        }
    }

    if !matches!(out.last(), Some(ContentNode::Text(_))) {
        out.push(ContentNode::Text(TextSpan::empty()));
    }
    out
}
