//! Property-based invariants for tokenizing, serializing and caret mapping.
//!
//! Verifies:
//! 1. Content preservation: node texts and tokens concatenate back to the input
//! 2. Adjacency: every tokenized sequence is normalized
//! 3. Round trip: render -> serialize -> tokenize is the identity
//! 4. Clamp safety: any caret on any surface maps to a valid position
//! 5. Layout: the live sequence reads exactly like the serialized value
//! 6. Sessions: after any edit the surface, value and nodes agree

use std::sync::Arc;

use emojiarea_core::{
    CatalogConfig, EditorPosition, EditorRange, EditorSession, EmojiAreaOptions, ImageHandle,
    MemorySelection, MemorySurface, PictogramCatalog, SurfaceEvent, SurfaceNode, map_caret,
    render, serialize, tokenize,
};
use emojiarea_core::position::resolve_live;
use proptest::prelude::*;

fn catalog() -> Arc<PictogramCatalog> {
    let config = CatalogConfig::from_toml_str(
        r#"
        [[groups]]
        id = "people"
        icons = { smile = "smile.png", a = "a.png", "+1" = "thumbsup.png" }
        "#,
    )
    .unwrap();
    Arc::new(PictogramCatalog::from_config(&config).unwrap())
}

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_chunk() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(":"),
        Just("smile"),
        Just("a"),
        Just("+1"),
        Just("nope"),
        Just(" "),
        Just("é"),
        Just("\n"),
        Just("x"),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_chunk(), 0..24).prop_map(|chunks| chunks.concat())
}

fn arb_surface_node() -> impl Strategy<Value = SurfaceNode> {
    prop_oneof![
        arb_text().prop_map(SurfaceNode::Text),
        Just(SurfaceNode::Image(ImageHandle::new("smile.png", ":smile:"))),
        Just(SurfaceNode::LineBreak),
        arb_text().prop_map(|t| SurfaceNode::Block(vec![SurfaceNode::Text(t)])),
    ]
}

fn arb_position() -> impl Strategy<Value = EditorPosition> {
    (prop::option::of(0usize..12), 0usize..40).prop_map(|(node_index, offset)| EditorPosition {
        node_index,
        offset,
    })
}

#[derive(Debug, Clone)]
enum Edit {
    Type(&'static str),
    Backspace,
    MoveCaret(EditorPosition),
    Insert,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => arb_chunk().prop_map(Edit::Type),
        2 => Just(Edit::Backspace),
        1 => arb_position().prop_map(Edit::MoveCaret),
        1 => Just(Edit::Insert),
    ]
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn content_is_preserved(text in arb_text()) {
        let seq = tokenize(&text, &catalog());
        prop_assert_eq!(seq.to_text(), text);
    }

    #[test]
    fn tokenized_sequences_are_normalized(text in arb_text()) {
        let seq = tokenize(&text, &catalog());
        prop_assert!(seq.is_normalized());
    }

    #[test]
    fn render_serialize_tokenize_is_identity(text in arb_text()) {
        let catalog = catalog();
        let seq = tokenize(&text, &catalog);
        let value = serialize(&render(&seq));
        prop_assert_eq!(&value, &text);
        prop_assert_eq!(tokenize(&value, &catalog), seq);
    }

    #[test]
    fn any_caret_maps_to_a_valid_position(
        children in prop::collection::vec(arb_surface_node(), 0..8),
        start in arb_position(),
        end in arb_position(),
    ) {
        let new = tokenize(&serialize(&children), &catalog());
        let mapped = map_caret(&children, EditorRange::new(start, end), &new);
        for position in [mapped.range.start, mapped.range.end] {
            let index = position.node_index.expect("mapped positions are concrete");
            prop_assert!(index < new.len());
            prop_assert!(new[index].is_text());
            prop_assert!(position.offset <= new[index].caret_len());
        }
    }

    #[test]
    fn live_sequence_reads_like_the_value(
        children in prop::collection::vec(arb_surface_node(), 0..8),
        start in arb_position(),
    ) {
        let (live, range) = resolve_live(&children, EditorRange::collapsed(start));
        prop_assert_eq!(live.to_text(), serialize(&children));
        let index = range.start.node_index.expect("resolved positions are concrete");
        prop_assert!(index < live.len());
        prop_assert!(range.start.offset <= live[index].caret_len());
    }

    #[test]
    fn sessions_stay_consistent(
        source in arb_text(),
        edits in prop::collection::vec(arb_edit(), 0..16),
    ) {
        let mut session = EditorSession::attach(
            MemorySurface::new(),
            MemorySelection::new(),
            &source,
            catalog(),
            EmojiAreaOptions::default(),
        );
        session.run_deferred();

        for edit in edits {
            let mut surface = session.surface().clone();
            match edit {
                Edit::Type(chunk) => {
                    let _ = session.selection_mut().type_text(&mut surface, chunk);
                }
                Edit::Backspace => {
                    let _ = session.selection_mut().delete_backward(&mut surface);
                }
                Edit::MoveCaret(position) => session.selection_mut().set_caret(position),
                Edit::Insert => {
                    session.insert("people", "smile");
                    surface = session.surface().clone();
                }
            }
            *session.surface_mut() = surface;
            session.handle_event(SurfaceEvent::Input);

            let value = session.val();
            prop_assert_eq!(session.last_text_value(), value.as_str());
            prop_assert_eq!(session.nodes().to_text(), value);
            prop_assert!(session.nodes().is_normalized());
        }
    }
}
