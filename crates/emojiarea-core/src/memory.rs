//! In-memory platform: a surface and selection with no UI behind them.
//!
//! Used by tests and the CLI. [`MemorySelection`] also offers a few
//! keystroke helpers that edit the surface the way a contenteditable region
//! would, including leaving split or empty text children behind.

use crate::platform::{PlatformError, SelectionProvider, SelectionSnapshot, Surface, SurfaceEvent};
use crate::position::{EditorPosition, EditorRange};
use crate::surface::SurfaceNode;

#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    children: Vec<SurfaceNode>,
    events: Vec<SurfaceEvent>,
    mutations: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<SurfaceNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Direct view of the children without cloning.
    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.children
    }

    /// Replace the children as an outside edit would (paste, drag and drop).
    pub fn set_children(&mut self, children: Vec<SurfaceNode>) {
        self.children = children;
        self.mutations += 1;
    }

    /// Number of structural mutations so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Drain the synthetic events dispatched so far.
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Surface for MemorySurface {
    /// Top-level child index.
    type NodeRef = usize;

    fn children(&self) -> Vec<SurfaceNode> {
        self.children.clone()
    }

    fn clear_children(&mut self) {
        self.children.clear();
        self.mutations += 1;
    }

    fn append_children(&mut self, nodes: &[SurfaceNode]) {
        self.children.extend_from_slice(nodes);
        self.mutations += 1;
    }

    fn child_index_of(&self, node: &usize) -> Option<usize> {
        (*node < self.children.len()).then_some(*node)
    }

    fn dispatch_synthetic_event(&mut self, event: SurfaceEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySelection {
    ranges: Vec<EditorRange>,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_caret(&mut self, position: EditorPosition) {
        self.ranges = vec![EditorRange::collapsed(position)];
    }

    pub fn set_range(&mut self, range: EditorRange) {
        self.ranges = vec![range];
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn primary(&self) -> Option<EditorRange> {
        self.ranges.first().copied()
    }

    /// Type `text` at the caret, replacing a selection inside one text child.
    pub fn type_text(&mut self, surface: &mut MemorySurface, text: &str) -> Result<(), PlatformError> {
        let range = self.primary().ok_or("no selection")?;
        let children = &mut surface.children;
        let typed = text.chars().count();

        let caret = match locate(children, range.start) {
            Slot::InText(index, offset) => {
                let SurfaceNode::Text(existing) = &mut children[index] else {
                    return Err("caret not in a text node".into());
                };
                let end = match range.end.node_index {
                    Some(end_index) if end_index == index && !range.is_collapsed() => {
                        range.end.offset.min(existing.chars().count())
                    }
                    _ => offset,
                };
                let start_byte = byte_offset(existing, offset);
                let end_byte = byte_offset(existing, end.max(offset));
                existing.replace_range(start_byte..end_byte, text);
                EditorPosition::in_node(index, offset + typed)
            }
            Slot::Before(index) => {
                children.insert(index, SurfaceNode::text(text));
                EditorPosition::in_node(index, typed)
            }
        };

        surface.mutations += 1;
        self.set_caret(caret);
        Ok(())
    }

    /// Backspace: remove the char or pictogram before the caret.
    ///
    /// Leaves empty text children in place, as browsers do.
    pub fn delete_backward(&mut self, surface: &mut MemorySurface) -> Result<(), PlatformError> {
        let range = self.primary().ok_or("no selection")?;
        let children = &mut surface.children;

        let (index, offset) = match locate(children, range.start) {
            Slot::InText(index, offset) => (index, offset),
            Slot::Before(index) => (index, 0),
        };

        if offset > 0 {
            if let Some(SurfaceNode::Text(text)) = children.get_mut(index) {
                let start = byte_offset(text, offset - 1);
                let end = byte_offset(text, offset);
                text.replace_range(start..end, "");
            }
            self.set_caret(EditorPosition::in_node(index, offset - 1));
        } else if index > 0 {
            match &mut children[index - 1] {
                SurfaceNode::Text(text) => {
                    text.pop();
                    self.set_caret(EditorPosition::in_node(index, 0));
                }
                _ => {
                    children.remove(index - 1);
                    self.set_caret(EditorPosition::in_node(index - 1, 0));
                }
            }
        } else {
            return Ok(());
        }

        surface.mutations += 1;
        Ok(())
    }
}

impl SelectionProvider<MemorySurface> for MemorySelection {
    fn capture(&self, _surface: &MemorySurface) -> SelectionSnapshot {
        SelectionSnapshot::new(self.ranges.clone())
    }

    fn restore(
        &mut self,
        _surface: &MemorySurface,
        snapshot: &SelectionSnapshot,
    ) -> Result<(), PlatformError> {
        self.ranges = snapshot.ranges.clone();
        Ok(())
    }

    fn replace_at(
        &mut self,
        surface: &mut MemorySurface,
        snapshot: &SelectionSnapshot,
        content: SurfaceNode,
    ) -> Result<(), PlatformError> {
        let range = snapshot.primary().ok_or("no selection to replace")?;
        let children = &mut surface.children;

        let caret = match locate(children, range.start) {
            Slot::InText(index, offset) => {
                let SurfaceNode::Text(existing) = &children[index] else {
                    return Err("caret not in a text node".into());
                };
                let len = existing.chars().count();
                let end = match range.end.node_index {
                    Some(end_index) if end_index == index => range.end.offset.clamp(offset, len),
                    _ => offset,
                };
                let before: String = existing.chars().take(offset).collect();
                let after: String = existing.chars().skip(end).collect();
                children.splice(
                    index..=index,
                    [
                        SurfaceNode::Text(before),
                        content,
                        SurfaceNode::Text(after),
                    ],
                );
                EditorPosition::in_node(index + 2, 0)
            }
            Slot::Before(index) => {
                children.insert(index, content);
                if index + 1 < children.len() {
                    EditorPosition::in_node(index + 1, 0)
                } else {
                    EditorPosition::container(children.len())
                }
            }
        };

        surface.mutations += 1;
        self.set_caret(caret);
        Ok(())
    }
}

/// Where an edit at a caret address lands.
enum Slot {
    /// Inside text child `.0` at char offset `.1` (clamped).
    InText(usize, usize),
    /// Before child `.0`, which is not text (or one past the end).
    Before(usize),
}

fn locate(children: &[SurfaceNode], position: EditorPosition) -> Slot {
    let index = match position.node_index {
        Some(index) => index,
        None => return Slot::Before(position.offset.min(children.len())),
    };
    match children.get(index) {
        Some(SurfaceNode::Text(text)) => {
            Slot::InText(index, position.offset.min(text.chars().count()))
        }
        Some(_) => Slot::Before(index),
        None => Slot::Before(children.len()),
    }
}

fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
