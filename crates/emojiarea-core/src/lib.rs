//! emojiarea-core: Pure Rust logic for an emoji-aware text field overlay.
//!
//! This crate provides:
//! - `PictogramCatalog` - immutable group -> token -> image table
//! - `tokenize` / `serialize` - plain text <-> node sequence <-> surface tree
//! - `map_caret` - carries the caret across a re-render
//! - `Surface` / `SelectionProvider` traits, with an in-memory implementation
//! - `EditorSession<S, P>` - one attached field, generic over the platform

pub mod catalog;
pub mod error;
pub mod memory;
pub mod node;
pub mod options;
pub mod picker;
pub mod platform;
pub mod position;
pub mod session;
pub mod surface;
pub mod tokenize;

pub use catalog::{CatalogConfig, GroupConfig, ImageHandle, Pictogram, PictogramCatalog, PictogramGroup};
pub use error::{EmojiAreaError, Result};
pub use memory::{MemorySelection, MemorySurface};
pub use node::{ContentNode, NodeSequence, PictogramRef, TextSpan};
pub use options::{ButtonConfig, ButtonPlan, ButtonPosition, EmojiAreaOptions};
pub use picker::{PickerChoice, PickerEntry, PickerKey, PickerMenu, PickerTab};
pub use platform::{PlatformError, SelectionProvider, SelectionSnapshot, Surface, SurfaceEvent};
pub use position::{EditorPosition, EditorRange, MappedRange, RemapStrategy, map_caret};
pub use session::{DeferredTask, EditorSession, InsertOutcome, Reconciliation, SessionState};
pub use smol_str::SmolStr;
pub use surface::{
    ChildSpan, InnerPoint, SurfaceLayout, SurfaceNode, inner_offset, inner_point, render, serialize,
};
pub use tokenize::tokenize;
