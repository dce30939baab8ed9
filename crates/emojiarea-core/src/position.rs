//! Caret positions and the old -> new position mapper.
//!
//! A reconciliation replaces every surface child, so the platform caret is
//! lost. Before the replacement the caret is read against the live children,
//! resolved into the normalized live sequence, and then carried over to the
//! freshly tokenized sequence:
//!
//! 1. flatten the live children into the text they serialize to, with line
//!    breaks and block boundaries as `\n`, and normalize that,
//! 2. resolve the caret container, falling back to a child count when the
//!    caret sits on the surface root,
//! 3. clamp offsets that fell off the end of their node,
//! 4. remap into the new sequence, counting from the end when the caret sits
//!    after the first changed character,
//! 5. hand back concrete node/offset pairs.
//!
//! Nothing here fails: out-of-range input is clamped.

use crate::node::{ContentNode, NodeSequence};
use crate::surface::{SurfaceLayout, SurfaceNode};

/// A caret address.
///
/// `node_index: None` means the caret sits on the surface container itself; in
/// that case `offset` counts children rather than characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorPosition {
    pub node_index: Option<usize>,
    pub offset: usize,
}

impl EditorPosition {
    /// Caret inside node `index`, `offset` chars in.
    pub fn in_node(index: usize, offset: usize) -> Self {
        Self {
            node_index: Some(index),
            offset,
        }
    }

    /// Caret on the container, before child number `offset`.
    pub fn container(offset: usize) -> Self {
        Self {
            node_index: None,
            offset,
        }
    }

    pub fn is_container(&self) -> bool {
        self.node_index.is_none()
    }
}

/// Start/end pair of caret addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorRange {
    pub start: EditorPosition,
    pub end: EditorPosition,
}

impl EditorRange {
    pub fn new(start: EditorPosition, end: EditorPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(position: EditorPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// How a caret was carried into the new sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapStrategy {
    /// Same char offset from the start of the content.
    FromStart,
    /// Same char distance from the end of the content.
    FromEnd,
}

/// A caret mapped onto the new sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedRange {
    pub range: EditorRange,
    pub strategy: RemapStrategy,
}

/// A (child index, char offset) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodePoint {
    index: usize,
    offset: usize,
}

/// Steps 1-3: normalize the live children and resolve the caret against them.
///
/// The returned range always carries concrete node indices into the returned
/// sequence, whose text is exactly what [`serialize`](crate::serialize) reads
/// from `children`.
pub fn resolve_live(children: &[SurfaceNode], range: EditorRange) -> (NodeSequence, EditorRange) {
    if children.is_empty() {
        let origin = EditorPosition::in_node(0, 0);
        return (NodeSequence::new(), EditorRange::collapsed(origin));
    }

    let layout = SurfaceLayout::new(children);
    let child_len = |index: usize| layout.span(index).map_or(0, |span| span.len());

    let start = resolve_raw(&layout, range.start);
    let mut end = resolve_raw(&layout, range.end);

    // Step 3: content collapsed out from under the caret.
    let start = if start.offset > child_len(start.index) {
        NodePoint {
            index: start.index,
            offset: 0,
        }
    } else {
        start
    };
    let end_len = child_len(end.index);
    if end.offset > end_len {
        end.offset = start.offset.min(end_len);
    }

    let start = layout.flat_offset(start.index, start.offset);
    let end = layout.flat_offset(end.index, end.offset);
    let live = NodeSequence::from_nodes(layout.into_nodes());
    let range = EditorRange::new(position_at(&live, start), position_at(&live, end));
    (live, range)
}

/// Step 2: pin a raw address to a child index. The layout has at least one
/// child.
fn resolve_raw(layout: &SurfaceLayout, position: EditorPosition) -> NodePoint {
    let spans = layout.spans();
    let last = spans.len() - 1;
    let end_of_last = NodePoint {
        index: last,
        offset: spans[last].len(),
    };
    match position.node_index {
        Some(index) if index <= last => NodePoint {
            index,
            offset: position.offset,
        },
        // Past the last child: caret at the end of the content.
        Some(_) => end_of_last,
        None if position.offset <= last => NodePoint {
            index: position.offset,
            offset: 0,
        },
        None => end_of_last,
    }
}

/// Step 4: carry a resolved range from `old` into `new`.
///
/// A caret at or before the first char where the two texts differ keeps its
/// offset from the start; a caret after it keeps its distance from the end.
/// When `new` gained nodes the edit is typically right at the caret, so this
/// is the case where counting from the end matters.
pub fn remap(old: &NodeSequence, new: &NodeSequence, range: EditorRange) -> MappedRange {
    let old_text = old.to_text();
    let new_text = new.to_text();
    let old_len = old_text.chars().count();
    let new_len = new_text.chars().count();
    let prefix = common_prefix_chars(&old_text, &new_text);

    let start = char_offset_of(old, range.start).min(old_len);
    let end = char_offset_of(old, range.end).min(old_len);

    let strategy = if start <= prefix {
        RemapStrategy::FromStart
    } else {
        RemapStrategy::FromEnd
    };

    // A caret inside a deleted region lands on the edit point.
    let carry = |offset: usize| {
        if offset <= prefix {
            offset.min(new_len)
        } else {
            new_len
                .saturating_sub(old_len - offset)
                .max(prefix.min(new_len))
        }
    };

    let mapped = EditorRange::new(position_at(new, carry(start)), position_at(new, carry(end)));

    tracing::trace!(
        target: "emojiarea::position",
        old_nodes = old.len(),
        new_nodes = new.len(),
        start,
        end,
        prefix,
        ?strategy,
        ?mapped,
        "remapped caret"
    );

    MappedRange {
        range: mapped,
        strategy,
    }
}

/// Steps 1-5 in one go.
pub fn map_caret(children: &[SurfaceNode], range: EditorRange, new: &NodeSequence) -> MappedRange {
    let (old, resolved) = resolve_live(children, range);
    remap(&old, new, resolved)
}

/// Char offset of a position within the flat text of `seq`.
///
/// A container position counts whole nodes; a pictogram position sits before
/// the pictogram. Out-of-range indices clamp to the end.
pub fn char_offset_of(seq: &NodeSequence, position: EditorPosition) -> usize {
    let (index, offset) = match position.node_index {
        Some(index) => (index, position.offset),
        None => (position.offset, 0),
    };
    if index >= seq.len() {
        return seq.text_len();
    }
    let before: usize = seq.iter().take(index).map(ContentNode::source_len).sum();
    before + offset.min(seq[index].caret_len())
}

/// The caret position for a char offset in the flat text of `seq`.
///
/// Offsets on a text/pictogram boundary belong to the text span; offsets
/// inside a pictogram token snap to just after the pictogram.
pub fn position_at(seq: &NodeSequence, offset: usize) -> EditorPosition {
    let mut node_start = 0;
    for (index, node) in seq.iter().enumerate() {
        let len = node.source_len();
        match node {
            ContentNode::Text(_) if offset <= node_start + len => {
                return EditorPosition::in_node(index, offset - node_start);
            }
            ContentNode::Pictogram(_) if offset < node_start + len => {
                return EditorPosition::in_node(index + 1, 0);
            }
            _ => {}
        }
        node_start += len;
    }
    let last = seq.len() - 1;
    EditorPosition::in_node(last, seq[last].caret_len())
}

fn common_prefix_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
