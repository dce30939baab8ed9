//! Platform abstraction traits for the editing surface.
//!
//! These traits are the seam between the session logic and whatever hosts the
//! editable region (browser DOM, an in-memory model for tests, a native UI).
//! The session never touches platform nodes directly: it reads the surface as
//! a [`SurfaceNode`] tree and addresses the caret with [`EditorRange`]s whose
//! node indices count top-level surface children.

use crate::position::EditorRange;
use crate::surface::SurfaceNode;

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Events a surface reports to its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    Input,
    KeyUp,
    Paste,
    Focus,
    Blur,
    /// Value-changed notification, also dispatched by the session itself.
    Change,
}

impl SurfaceEvent {
    /// DOM event type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceEvent::Input => "input",
            SurfaceEvent::KeyUp => "keyup",
            SurfaceEvent::Paste => "paste",
            SurfaceEvent::Focus => "focus",
            SurfaceEvent::Blur => "blur",
            SurfaceEvent::Change => "change",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "input" => SurfaceEvent::Input,
            "keyup" => SurfaceEvent::KeyUp,
            "paste" => SurfaceEvent::Paste,
            "focus" => SurfaceEvent::Focus,
            "blur" => SurfaceEvent::Blur,
            "change" => SurfaceEvent::Change,
            _ => return None,
        })
    }

    /// Whether the event may have changed the surface content.
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            SurfaceEvent::Input | SurfaceEvent::KeyUp | SurfaceEvent::Paste | SurfaceEvent::Change
        )
    }
}

/// Copy of the platform selection, possibly empty.
///
/// Ranges are expressed against the surface children at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub ranges: Vec<EditorRange>,
}

impl SelectionSnapshot {
    pub fn new(ranges: Vec<EditorRange>) -> Self {
        Self { ranges }
    }

    pub fn single(range: EditorRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The primary range, if any.
    pub fn primary(&self) -> Option<EditorRange> {
        self.ranges.first().copied()
    }
}

/// The live editable region.
pub trait Surface {
    /// Platform handle for a node inside the surface.
    type NodeRef;

    /// Read the current children as a surface tree.
    fn children(&self) -> Vec<SurfaceNode>;

    /// Remove every child.
    fn clear_children(&mut self);

    /// Append children in order.
    fn append_children(&mut self, nodes: &[SurfaceNode]);

    /// Index of the top-level child holding `node`.
    ///
    /// `None` when `node` is the surface itself or lies outside it.
    fn child_index_of(&self, node: &Self::NodeRef) -> Option<usize>;

    /// Fire a synthetic event, as if the platform had raised it.
    fn dispatch_synthetic_event(&mut self, event: SurfaceEvent);
}

/// Reads and writes the caret/selection for one surface.
pub trait SelectionProvider<S: Surface> {
    /// Copy the current selection. Empty when nothing is selected.
    fn capture(&self, surface: &S) -> SelectionSnapshot;

    /// Make `snapshot` the current selection.
    fn restore(&mut self, surface: &S, snapshot: &SelectionSnapshot) -> Result<(), PlatformError>;

    /// Replace the primary range of `snapshot` with `content` and leave the
    /// caret just after it.
    fn replace_at(
        &mut self,
        surface: &mut S,
        snapshot: &SelectionSnapshot,
        content: SurfaceNode,
    ) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::EditorPosition;

    #[test]
    fn test_event_names_round_trip() {
        for event in [
            SurfaceEvent::Input,
            SurfaceEvent::KeyUp,
            SurfaceEvent::Paste,
            SurfaceEvent::Focus,
            SurfaceEvent::Blur,
            SurfaceEvent::Change,
        ] {
            assert_eq!(SurfaceEvent::from_name(event.as_str()), Some(event));
        }
        assert_eq!(SurfaceEvent::from_name("mousedown"), None);
    }

    #[test]
    fn test_edit_events() {
        assert!(SurfaceEvent::Input.is_edit());
        assert!(SurfaceEvent::Paste.is_edit());
        assert!(!SurfaceEvent::Focus.is_edit());
        assert!(!SurfaceEvent::Blur.is_edit());
    }

    #[test]
    fn test_snapshot_primary() {
        assert_eq!(SelectionSnapshot::default().primary(), None);
        let range = EditorRange::collapsed(EditorPosition::in_node(0, 1));
        assert_eq!(SelectionSnapshot::single(range).primary(), Some(range));
    }

    #[test]
    fn test_platform_error_from() {
        let e: PlatformError = "no selection".into();
        assert_eq!(e.to_string(), "no selection");
    }
}
