//! Browser DOM layer for emojiarea.
//!
//! This crate implements the `emojiarea-core` platform traits over a
//! contenteditable element and wires an `EditorSession` to a `<textarea>`.
//! It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: contenteditable element as a `Surface`
//! - `selection`: Selection API as a `SelectionProvider`
//! - `menu`: picker menu rendering
//! - `area`: `attach()`, event listeners and the trigger button
//!
//! # Re-exports
//!
//! This crate re-exports `emojiarea-core` for convenience, so consumers
//! only need to depend on `emojiarea-browser`.

// Re-export core crate
pub use emojiarea_core;
pub use emojiarea_core::*;

pub mod area;
pub mod dom;
pub mod menu;
pub mod selection;

pub use area::{BrowserSession, EmojiArea, attach};
pub use dom::DomSurface;
pub use menu::{MenuClick, MenuView};
pub use selection::DomSelection;
