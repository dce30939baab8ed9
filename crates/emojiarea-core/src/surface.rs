//! Live surface tree and the `val()` serializer.
//!
//! The surface is what the user actually edits. Platform adapters read it as a
//! tree of [`SurfaceNode`]s; after a paste or an Enter key it can hold block
//! elements and line breaks that a rendered [`NodeSequence`] never produces.

use crate::catalog::ImageHandle;
use crate::node::{ContentNode, NodeSequence, PictogramRef};

/// Element tags that start a new line when serialized.
pub const BLOCK_TAGS: &[&str] = &["p", "div", "pre", "form"];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceNode {
    Text(String),
    Image(ImageHandle),
    LineBreak,
    /// Paragraph-like element; flushes the current line around its children.
    Block(Vec<SurfaceNode>),
    /// Any other element; its children are serialized in place.
    Inline(Vec<SurfaceNode>),
}

impl SurfaceNode {
    pub fn text(text: impl Into<String>) -> Self {
        SurfaceNode::Text(text.into())
    }
}

impl From<&ContentNode> for SurfaceNode {
    fn from(node: &ContentNode) -> Self {
        match node {
            ContentNode::Text(span) => SurfaceNode::Text(span.text.clone()),
            ContentNode::Pictogram(p) => SurfaceNode::Image(p.image.clone()),
        }
    }
}

/// Surface children for a node sequence, one child per node.
pub fn render(seq: &NodeSequence) -> Vec<SurfaceNode> {
    seq.iter().map(SurfaceNode::from).collect()
}

/// Serialize surface children to the canonical plain-text value.
pub fn serialize(children: &[SurfaceNode]) -> String {
    let mut writer = LineWriter::default();
    for child in children {
        writer.visit(child);
    }
    writer.out
}

/// A caret inside one top-level child.
///
/// `path` walks element children down from the top-level child to the caret
/// container. When the container is text, `offset` counts chars into it;
/// otherwise it is a child index of the container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerPoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl InnerPoint {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Char range a top-level child covers in the serialized value.
///
/// `origin` is where offset 0 of the child lands: for a block that is the
/// start of its own line, after the separating newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSpan {
    pub origin: usize,
    pub end: usize,
}

impl ChildSpan {
    /// Caret-addressable length of the child, in chars.
    pub fn len(&self) -> usize {
        self.end - self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.origin
    }
}

/// The serialized value of a surface, with the span of every top-level child
/// and the flat content nodes it is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLayout {
    text: String,
    text_len: usize,
    spans: Vec<ChildSpan>,
    nodes: Vec<ContentNode>,
}

impl SurfaceLayout {
    pub fn new(children: &[SurfaceNode]) -> Self {
        let mut writer = LineWriter::recording();
        let mut spans = Vec::with_capacity(children.len());
        for child in children {
            let origin = writer.open(child);
            writer.visit_inside(child);
            spans.push(ChildSpan {
                origin,
                end: writer.len.max(origin),
            });
            writer.close(child);
        }
        Self {
            text_len: writer.len,
            text: writer.out,
            spans,
            nodes: writer.nodes,
        }
    }

    /// The serialized value; equal to [`serialize`] of the same children.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[ChildSpan] {
        &self.spans
    }

    pub fn span(&self, index: usize) -> Option<ChildSpan> {
        self.spans.get(index).copied()
    }

    /// Flat content nodes, not normalized. Their source text concatenates to
    /// [`text`](Self::text).
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<ContentNode> {
        self.nodes
    }

    /// Char offset in the value of `offset` chars into child `index`,
    /// clamped to the child and to the value.
    pub fn flat_offset(&self, index: usize, offset: usize) -> usize {
        match self.spans.get(index) {
            Some(span) => (span.origin + offset.min(span.len())).min(self.text_len),
            None => self.text_len,
        }
    }
}

/// Offset of `point` within top-level child `index`, counted the way
/// [`SurfaceLayout`] counts: line breaks and block boundaries are one char.
pub fn inner_offset(children: &[SurfaceNode], index: usize, point: &InnerPoint) -> usize {
    let Some(child) = children.get(index) else {
        return 0;
    };
    let mut writer = LineWriter::default();
    for before in &children[..index] {
        writer.visit(before);
    }
    let origin = writer.open(child);
    writer.walk_to(child, &point.path, point.offset);
    writer.caret().saturating_sub(origin)
}

/// The inverse of [`inner_offset`]: where `offset` chars into child `index`
/// falls in its subtree.
///
/// Lands in the first text node that can hold it; otherwise before the first
/// non-text node at or after it, or at the end of the child.
pub fn inner_point(children: &[SurfaceNode], index: usize, offset: usize) -> InnerPoint {
    let Some(child) = children.get(index) else {
        return InnerPoint::default();
    };
    let mut writer = LineWriter::default();
    for before in &children[..index] {
        writer.visit(before);
    }
    let origin = writer.open(child);
    let target = origin + offset;

    let mut path = Vec::new();
    match child {
        SurfaceNode::Text(text) => InnerPoint::new(path, offset.min(text.chars().count())),
        SurfaceNode::Block(nodes) | SurfaceNode::Inline(nodes) => {
            match writer.locate(nodes, target, &mut path) {
                Some(found) => InnerPoint::new(path, found),
                None => InnerPoint::new(Vec::new(), nodes.len()),
            }
        }
        SurfaceNode::Image(_) | SurfaceNode::LineBreak => InnerPoint::default(),
    }
}

/// Streams the serialized value.
///
/// Lines are joined with `\n`, so a flush only leaves a separator pending; it
/// is written once something follows it on the next line.
#[derive(Default)]
struct LineWriter {
    out: String,
    /// `out` in chars.
    len: usize,
    line_started: bool,
    pending_newline: bool,
    record: bool,
    nodes: Vec<ContentNode>,
}

impl LineWriter {
    fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Where the next char would land.
    fn caret(&self) -> usize {
        self.len + usize::from(self.pending_newline)
    }

    fn write_pending(&mut self) {
        if std::mem::take(&mut self.pending_newline) {
            self.out.push('\n');
            self.len += 1;
            if self.record {
                self.nodes.push(ContentNode::text("\n"));
            }
        }
    }

    fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.write_pending();
        self.out.push_str(text);
        self.len += text.chars().count();
        self.line_started = true;
    }

    fn flush(&mut self) {
        self.write_pending();
        self.pending_newline = true;
        self.line_started = false;
    }

    fn flush_started(&mut self) {
        if self.line_started {
            self.flush();
        }
    }

    fn visit(&mut self, node: &SurfaceNode) {
        self.open(node);
        self.visit_inside(node);
        self.close(node);
    }

    /// Enter `node`; returns the caret where its content starts.
    fn open(&mut self, node: &SurfaceNode) -> usize {
        if matches!(node, SurfaceNode::Block(_)) {
            self.flush_started();
        }
        self.caret()
    }

    fn close(&mut self, node: &SurfaceNode) {
        if matches!(node, SurfaceNode::Block(_)) {
            self.flush_started();
        }
    }

    fn visit_inside(&mut self, node: &SurfaceNode) {
        match node {
            SurfaceNode::Text(text) => {
                self.push_str(text);
                if self.record && !text.is_empty() {
                    self.nodes.push(ContentNode::text(text.clone()));
                }
            }
            SurfaceNode::Image(image) => {
                self.push_str(&image.alt);
                if self.record {
                    self.nodes
                        .push(ContentNode::Pictogram(PictogramRef::from(image.clone())));
                }
            }
            SurfaceNode::LineBreak => self.flush(),
            SurfaceNode::Block(children) | SurfaceNode::Inline(children) => {
                for child in children {
                    self.visit(child);
                }
            }
        }
    }

    /// Write everything in `node` that comes before the caret at
    /// `path`/`offset`, leaving the enclosing elements open.
    fn walk_to(&mut self, node: &SurfaceNode, path: &[usize], offset: usize) {
        match node {
            SurfaceNode::Text(text) => {
                let before: String = text.chars().take(offset).collect();
                self.push_str(&before);
            }
            SurfaceNode::Block(children) | SurfaceNode::Inline(children) => match path.split_first() {
                Some((&next, rest)) => {
                    for child in children.iter().take(next) {
                        self.visit(child);
                    }
                    if let Some(child) = children.get(next) {
                        self.open(child);
                        self.walk_to(child, rest, offset);
                    }
                }
                None => {
                    for child in children.iter().take(offset) {
                        self.visit(child);
                    }
                }
            },
            SurfaceNode::Image(_) | SurfaceNode::LineBreak => {}
        }
    }

    /// Find `target` among `children`, pushing child indices onto `path`.
    fn locate(&mut self, children: &[SurfaceNode], target: usize, path: &mut Vec<usize>) -> Option<usize> {
        for (index, child) in children.iter().enumerate() {
            match child {
                SurfaceNode::Text(text) => {
                    let start = self.caret();
                    let len = text.chars().count();
                    if target <= start + len && (len > 0 || target == start) {
                        path.push(index);
                        return Some(target.saturating_sub(start));
                    }
                    self.visit(child);
                }
                SurfaceNode::Image(_) | SurfaceNode::LineBreak => {
                    if target <= self.caret() {
                        return Some(index);
                    }
                    self.visit(child);
                }
                SurfaceNode::Block(nested) | SurfaceNode::Inline(nested) => {
                    if target < self.open(child) {
                        return Some(index);
                    }
                    path.push(index);
                    if let Some(found) = self.locate(nested, target, path) {
                        return Some(found);
                    }
                    path.pop();
                    self.close(child);
                }
            }
        }
        None
    }
}
