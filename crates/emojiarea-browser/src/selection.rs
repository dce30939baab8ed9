//! DOM Selection API as a [`SelectionProvider`].
//!
//! Positions are read and written relative to the editor's top-level
//! children: a caret inside nested markup (a pasted `<div>`, say) is folded to
//! an offset within its top-level child, counted the way the serializer
//! counts, so line breaks and block boundaries take one char each.

use emojiarea_core::{
    EditorPosition, EditorRange, InnerPoint, PlatformError, SelectionProvider, SelectionSnapshot,
    Surface, SurfaceNode, inner_offset, inner_point,
};
use web_sys::{Node, Range};

use crate::dom::{DomSurface, char_to_utf16_offset, top_level_child, utf16_to_char_offset};

#[derive(Debug, Default, Clone, Copy)]
pub struct DomSelection;

impl DomSelection {
    pub fn new() -> Self {
        Self
    }
}

fn window_selection() -> Result<web_sys::Selection, PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    window
        .get_selection()
        .map_err(|e| format!("get_selection failed: {:?}", e))?
        .ok_or_else(|| "no selection object".into())
}

impl SelectionProvider<DomSurface> for DomSelection {
    fn capture(&self, surface: &DomSurface) -> SelectionSnapshot {
        let Ok(selection) = window_selection() else {
            return SelectionSnapshot::default();
        };
        let children = surface.children();
        let ranges = (0..selection.range_count())
            .filter_map(|i| selection.get_range_at(i).ok())
            .filter_map(|range| read_range(surface, &children, &range))
            .collect();
        SelectionSnapshot::new(ranges)
    }

    fn restore(
        &mut self,
        surface: &DomSurface,
        snapshot: &SelectionSnapshot,
    ) -> Result<(), PlatformError> {
        let selection = window_selection()?;
        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        for range in &snapshot.ranges {
            selection
                .add_range(&build_range(surface, *range)?)
                .map_err(|e| format!("add_range failed: {:?}", e))?;
        }

        tracing::trace!(
            target: "emojiarea::selection",
            ranges = snapshot.ranges.len(),
            primary = ?snapshot.primary(),
            "restored selection"
        );
        Ok(())
    }

    fn replace_at(
        &mut self,
        surface: &mut DomSurface,
        snapshot: &SelectionSnapshot,
        content: SurfaceNode,
    ) -> Result<(), PlatformError> {
        let primary = snapshot.primary().ok_or("no selection to replace")?;
        let range = build_range(surface, primary)?;
        let node = surface.create_node(&content)?;

        range
            .delete_contents()
            .map_err(|e| format!("delete_contents failed: {:?}", e))?;
        range
            .insert_node(&node)
            .map_err(|e| format!("insert_node failed: {:?}", e))?;
        range
            .set_start_after(&node)
            .map_err(|e| format!("set_start_after failed: {:?}", e))?;
        range.collapse_with_to_start(true);

        let selection = window_selection()?;
        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        selection
            .add_range(&range)
            .map_err(|e| format!("add_range failed: {:?}", e))?;
        Ok(())
    }
}

/// Translate a DOM range. `None` when it lies outside the editor.
fn read_range(surface: &DomSurface, children: &[SurfaceNode], range: &Range) -> Option<EditorRange> {
    let start = read_point(
        surface,
        children,
        &range.start_container().ok()?,
        range.start_offset().ok()?,
    )?;
    let end = read_point(
        surface,
        children,
        &range.end_container().ok()?,
        range.end_offset().ok()?,
    )?;
    Some(EditorRange::new(start, end))
}

fn read_point(
    surface: &DomSurface,
    children: &[SurfaceNode],
    container: &Node,
    offset: u32,
) -> Option<EditorPosition> {
    let editor: &Node = surface.editor();
    if container.is_same_node(Some(editor)) {
        return Some(EditorPosition::container(offset as usize));
    }
    let (index, top) = top_level_child(editor, container)?;

    let offset = if container.node_type() == Node::TEXT_NODE {
        let text = container.text_content().unwrap_or_default();
        utf16_to_char_offset(&text, offset as usize)
    } else {
        offset as usize
    };
    let point = InnerPoint::new(path_from(&top, container), offset);
    Some(EditorPosition::in_node(index, inner_offset(children, index, &point)))
}

/// Child indices leading from `top` down to `node`.
fn path_from(top: &Node, node: &Node) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while !current.is_same_node(Some(top)) {
        let mut index = 0;
        let mut sibling = current.previous_sibling();
        while let Some(node) = sibling {
            index += 1;
            sibling = node.previous_sibling();
        }
        path.push(index);
        match current.parent_node() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

fn build_range(surface: &DomSurface, range: EditorRange) -> Result<Range, PlatformError> {
    let dom = surface
        .document()
        .create_range()
        .map_err(|e| format!("create_range failed: {:?}", e))?;
    let children = surface.children();
    let (node, offset) = dom_point(surface, &children, range.start);
    dom.set_start(&node, offset)
        .map_err(|e| format!("set_start failed: {:?}", e))?;
    let (node, offset) = dom_point(surface, &children, range.end);
    dom.set_end(&node, offset)
        .map_err(|e| format!("set_end failed: {:?}", e))?;
    Ok(dom)
}

/// DOM (node, offset) for a caret address, clamped to what exists.
fn dom_point(surface: &DomSurface, children: &[SurfaceNode], position: EditorPosition) -> (Node, u32) {
    let editor: Node = surface.editor().clone().into();
    let count = surface.child_count();

    let Some(index) = position.node_index else {
        return (editor, position.offset.min(count) as u32);
    };
    let Some(child) = surface.child(index) else {
        return (editor, count as u32);
    };

    match children.get(index) {
        Some(SurfaceNode::Image(_) | SurfaceNode::LineBreak) | None => (editor, index as u32),
        Some(_) => {
            let point = inner_point(children, index, position.offset);
            let mut node = child;
            for &step in &point.path {
                match node.child_nodes().item(step as u32) {
                    Some(next) => node = next,
                    None => break,
                }
            }
            if node.node_type() == Node::TEXT_NODE {
                let text = node.text_content().unwrap_or_default();
                let offset = char_to_utf16_offset(&text, point.offset) as u32;
                (node, offset)
            } else {
                let offset = point.offset.min(node.child_nodes().length() as usize);
                (node, offset as u32)
            }
        }
    }
}
