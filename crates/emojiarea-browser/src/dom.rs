//! Contenteditable element as a [`Surface`].
//!
//! Reads DOM children into [`SurfaceNode`] trees and builds DOM nodes back
//! from them. Offsets on the Rust side count chars; the DOM counts UTF-16
//! code units, so text offsets are converted at this boundary.

use emojiarea_core::{ImageHandle, PlatformError, Surface, SurfaceEvent, SurfaceNode};
use emojiarea_core::surface::is_block_tag;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

/// Class put on rendered pictogram images.
pub const ICON_CLASS: &str = "emojiarea-icon";

/// The editable region.
pub struct DomSurface {
    editor: HtmlElement,
    document: Document,
}

impl DomSurface {
    pub fn new(editor: HtmlElement) -> Result<Self, PlatformError> {
        let document = editor.owner_document().ok_or("editor is not in a document")?;
        Ok(Self { editor, document })
    }

    pub fn editor(&self) -> &HtmlElement {
        &self.editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Top-level child `index`, if any.
    pub fn child(&self, index: usize) -> Option<Node> {
        self.editor.child_nodes().item(index as u32)
    }

    pub fn child_count(&self) -> usize {
        self.editor.child_nodes().length() as usize
    }

    /// Build the DOM node for `node`.
    pub fn create_node(&self, node: &SurfaceNode) -> Result<Node, PlatformError> {
        let created: Node = match node {
            SurfaceNode::Text(text) => self.document.create_text_node(text).into(),
            SurfaceNode::Image(image) => {
                let img = self.create_element("img")?;
                img.set_attribute("src", &image.src)
                    .and_then(|_| img.set_attribute("alt", &image.alt))
                    .map_err(|e| format!("set_attribute failed: {:?}", e))?;
                img.set_class_name(ICON_CLASS);
                img.into()
            }
            SurfaceNode::LineBreak => self.create_element("br")?.into(),
            SurfaceNode::Block(children) | SurfaceNode::Inline(children) => {
                let tag = if matches!(node, SurfaceNode::Block(_)) {
                    "div"
                } else {
                    "span"
                };
                let element = self.create_element(tag)?;
                for child in children {
                    element
                        .append_child(&self.create_node(child)?)
                        .map_err(|e| format!("append_child failed: {:?}", e))?;
                }
                element.into()
            }
        };
        Ok(created)
    }

    fn create_element(&self, tag: &str) -> Result<Element, PlatformError> {
        self.document
            .create_element(tag)
            .map_err(|e| format!("create_element({tag}) failed: {:?}", e).into())
    }
}

impl Surface for DomSurface {
    type NodeRef = Node;

    fn children(&self) -> Vec<SurfaceNode> {
        read_children(&self.editor)
    }

    fn clear_children(&mut self) {
        self.editor.set_text_content(None);
    }

    fn append_children(&mut self, nodes: &[SurfaceNode]) {
        for node in nodes {
            let appended = self
                .create_node(node)
                .and_then(|dom| {
                    self.editor
                        .append_child(&dom)
                        .map_err(|e| format!("append_child failed: {:?}", e).into())
                });
            if let Err(e) = appended {
                tracing::warn!(target: "emojiarea::dom", "dropped surface node: {e}");
            }
        }
    }

    fn child_index_of(&self, node: &Node) -> Option<usize> {
        top_level_child(&self.editor, node).map(|(index, _)| index)
    }

    fn dispatch_synthetic_event(&mut self, event: SurfaceEvent) {
        let dispatched = web_sys::Event::new(event.as_str())
            .and_then(|ev| self.editor.dispatch_event(&ev));
        if let Err(e) = dispatched {
            tracing::warn!(target: "emojiarea::dom", "dispatch {} failed: {:?}", event.as_str(), e);
        }
    }
}

/// Convert every child of `parent`, one surface node per DOM node.
pub fn read_children(parent: &Node) -> Vec<SurfaceNode> {
    let nodes = parent.child_nodes();
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .map(|node| read_node(&node))
        .collect()
}

fn read_node(node: &Node) -> SurfaceNode {
    if node.node_type() == Node::TEXT_NODE {
        return SurfaceNode::Text(node.text_content().unwrap_or_default());
    }
    let Some(element) = node.dyn_ref::<Element>() else {
        // Comments and the like contribute nothing but keep child indices aligned.
        return SurfaceNode::Inline(Vec::new());
    };
    let tag = element.tag_name();
    if tag.eq_ignore_ascii_case("img") {
        SurfaceNode::Image(ImageHandle::new(
            element.get_attribute("src").unwrap_or_default(),
            element.get_attribute("alt").unwrap_or_default(),
        ))
    } else if tag.eq_ignore_ascii_case("br") {
        SurfaceNode::LineBreak
    } else if is_block_tag(&tag) {
        SurfaceNode::Block(read_children(node))
    } else {
        SurfaceNode::Inline(read_children(node))
    }
}

/// Index of the top-level child of `editor` holding `node`, and that child.
///
/// `None` for the editor itself and for nodes outside it.
pub fn top_level_child(editor: &Node, node: &Node) -> Option<(usize, Node)> {
    let mut current = node.clone();
    loop {
        let parent = current.parent_node()?;
        if parent.is_same_node(Some(editor)) {
            break;
        }
        current = parent;
    }

    let mut index = 0;
    let mut sibling = current.previous_sibling();
    while let Some(node) = sibling {
        index += 1;
        sibling = node.previous_sibling();
    }
    Some((index, current))
}

/// Char offset for a UTF-16 offset into `text`.
pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (chars, c) in text.chars().enumerate() {
        if units >= utf16_offset {
            return chars;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 offset for a char offset into `text`, clamped to its length.
pub fn char_to_utf16_offset(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_to_char_offset() {
        // 😀 is two UTF-16 units, é is one
        let text = "a😀é";
        assert_eq!(utf16_to_char_offset(text, 0), 0);
        assert_eq!(utf16_to_char_offset(text, 1), 1);
        assert_eq!(utf16_to_char_offset(text, 3), 2);
        assert_eq!(utf16_to_char_offset(text, 4), 3);
        assert_eq!(utf16_to_char_offset(text, 99), 3);
    }

    #[test]
    fn test_char_to_utf16_offset() {
        let text = "a😀é";
        assert_eq!(char_to_utf16_offset(text, 0), 0);
        assert_eq!(char_to_utf16_offset(text, 2), 3);
        assert_eq!(char_to_utf16_offset(text, 3), 4);
        assert_eq!(char_to_utf16_offset(text, 10), 4);
    }
}
