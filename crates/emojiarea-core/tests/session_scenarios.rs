//! End-to-end editing sessions over the in-memory platform.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use emojiarea_core::{
    CatalogConfig, ContentNode, EditorPosition, EditorRange, EditorSession, EmojiAreaOptions,
    InsertOutcome, MemorySelection, MemorySurface, NodeSequence, PictogramCatalog,
    Reconciliation, RemapStrategy, SurfaceEvent, SurfaceNode, map_caret, serialize, tokenize,
};

fn catalog() -> Arc<PictogramCatalog> {
    let config = CatalogConfig::from_toml_str(
        r#"
        path = "img/emoji"

        [[groups]]
        id = "people"
        name = "People"
        icons = { smile = "smile.png", a = "a.png", b = "b.png" }
        "#,
    )
    .unwrap();
    Arc::new(PictogramCatalog::from_config(&config).unwrap())
}

type Session = EditorSession<MemorySurface, MemorySelection>;

fn attach(source: &str) -> Session {
    EditorSession::attach(
        MemorySurface::new(),
        MemorySelection::new(),
        source,
        catalog(),
        EmojiAreaOptions::default(),
    )
}

fn type_text(session: &mut Session, text: &str) -> Reconciliation {
    let mut surface = session.surface().clone();
    session
        .selection_mut()
        .type_text(&mut surface, text)
        .unwrap();
    *session.surface_mut() = surface;
    session.handle_event(SurfaceEvent::Input).unwrap()
}

#[test]
fn test_text_with_known_token_round_trips() {
    let catalog = catalog();
    let seq = tokenize("hi :smile: there", &catalog);
    insta::assert_snapshot!(seq.to_string(), @r#"["hi ", <:smile:>, " there"]"#);

    let session = attach("hi :smile: there");
    assert_eq!(session.val(), "hi :smile: there");
    assert_eq!(session.nodes(), &seq);
}

#[test]
fn test_adjacent_tokens_get_anchors() {
    let seq = tokenize(":a::b:", &catalog());
    insta::assert_snapshot!(seq.to_string(), @r#"["", <:a:>, "", <:b:>, ""]"#);
}

#[test]
fn test_unknown_token_passes_through() {
    let seq = tokenize(":unknown:", &catalog());
    assert_eq!(seq.as_single_text(), Some(":unknown:"));
}

#[test]
fn test_caret_before_inserted_pictogram_is_unaffected() {
    let catalog = catalog();
    // "abcde" with :smile: dropped in at offset 3
    let children = vec![
        SurfaceNode::text("abc"),
        SurfaceNode::Image(catalog.lookup("smile").unwrap().clone()),
        SurfaceNode::text("de"),
    ];
    let new = NodeSequence::from_nodes(vec![
        ContentNode::text("abc"),
        ContentNode::pictogram(catalog.lookup("smile").unwrap().clone()),
        ContentNode::text("de"),
    ]);
    let caret = EditorRange::collapsed(EditorPosition::in_node(0, 2));
    let mapped = map_caret(&children, caret, &new);
    assert_eq!(mapped.range, caret);
    assert_eq!(mapped.strategy, RemapStrategy::FromStart);
}

#[test]
fn test_insert_without_selection_is_a_no_op() {
    let mut session = attach("hello");
    let before = session.surface().mutation_count();
    assert_eq!(
        session.insert("people", "smile"),
        InsertOutcome::SelectionUnavailable
    );
    assert_eq!(session.val(), "hello");
    assert_eq!(session.surface().mutation_count(), before);
}

#[test]
fn test_own_change_event_does_not_recurse() {
    let fired = Rc::new(RefCell::new(0));
    let mut session = attach("");
    let counter = fired.clone();
    session.set_change_observer(move |_| *counter.borrow_mut() += 1);
    session.run_deferred();

    for (i, chunk) in ["hi ", ":smile", ":", " x"].into_iter().enumerate() {
        type_text(&mut session, chunk);
        // Feed the session's own synthetic events back in.
        for event in session.surface_mut().take_events() {
            assert_eq!(
                session.handle_event(event),
                Some(Reconciliation::Unchanged)
            );
        }
        assert_eq!(*fired.borrow(), i + 1);
    }
    assert_eq!(session.val(), "hi :smile: x");
}

#[test]
fn test_typing_completes_token_and_caret_follows() {
    let mut session = attach("");
    session.run_deferred();

    assert_eq!(type_text(&mut session, "hi :smile"), Reconciliation::TextOnly);
    let outcome = type_text(&mut session, ":");
    assert!(matches!(outcome, Reconciliation::Rendered { caret: Some(_) }));
    assert_eq!(session.nodes().pictogram_count(), 1);
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(2, 0)
    );

    // Keeps typing after the pictogram.
    type_text(&mut session, "!");
    assert_eq!(session.val(), "hi :smile:!");
    insta::assert_snapshot!(session.nodes().to_string(), @r#"["hi ", <:smile:>, "!"]"#);
}

#[test]
fn test_typing_before_pictogram_keeps_caret() {
    let mut session = attach("ab:smile:cd");
    session
        .selection_mut()
        .set_caret(EditorPosition::in_node(0, 1));

    type_text(&mut session, "X");
    assert_eq!(session.val(), "aXb:smile:cd");
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(0, 2)
    );
}

#[test]
fn test_backspace_removes_pictogram() {
    let mut session = attach("a:smile:b");
    session
        .selection_mut()
        .set_caret(EditorPosition::in_node(2, 0));

    let mut surface = session.surface().clone();
    session
        .selection_mut()
        .delete_backward(&mut surface)
        .unwrap();
    *session.surface_mut() = surface;

    let outcome = session.handle_event(SurfaceEvent::KeyUp).unwrap();
    assert!(matches!(outcome, Reconciliation::Rendered { .. }));
    assert_eq!(session.val(), "ab");
    assert_eq!(session.nodes().as_single_text(), Some("ab"));
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(0, 1)
    );
}

#[test]
fn test_clearing_is_accepted_without_render() {
    let mut session = attach(":smile:");
    session.surface_mut().set_children(Vec::new());
    let mutations = session.surface().mutation_count();

    assert_eq!(session.on_surface_changed(), Reconciliation::AcceptedEmpty);
    assert_eq!(session.surface().mutation_count(), mutations);
    assert!(session.nodes().is_empty());
    assert_eq!(session.last_text_value(), "");
}

#[test]
fn test_pasted_blocks_serialize_as_lines() {
    let mut session = attach("");
    session.surface_mut().set_children(vec![
        SurfaceNode::text("one"),
        SurfaceNode::Block(vec![SurfaceNode::text("two :smile:")]),
    ]);
    session.handle_event(SurfaceEvent::Paste);
    assert_eq!(session.val(), "one\ntwo :smile:");
    assert_eq!(session.nodes().pictogram_count(), 1);
    assert_eq!(serialize(session.surface().nodes()), "one\ntwo :smile:");
}

#[test]
fn test_enter_keeps_caret_on_the_new_line() {
    let mut session = attach("hello");
    // contenteditable wraps the new empty line in <div><br></div>
    session.surface_mut().set_children(vec![
        SurfaceNode::text("hello"),
        SurfaceNode::Block(vec![SurfaceNode::LineBreak]),
    ]);
    session
        .selection_mut()
        .set_caret(EditorPosition::in_node(1, 0));

    let outcome = session.handle_event(SurfaceEvent::Input).unwrap();
    let Reconciliation::Rendered { caret: Some(mapped) } = outcome else {
        panic!("expected a re-render, got {outcome:?}");
    };
    assert_eq!(mapped.range.start, EditorPosition::in_node(0, 6));
    assert_eq!(session.val(), "hello\n");
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(0, 6)
    );

    // Typing on the new line goes after the newline.
    type_text(&mut session, "x");
    assert_eq!(session.val(), "hello\nx");
}

#[test]
fn test_caret_at_start_of_pasted_block() {
    let mut session = attach("one");
    session.surface_mut().set_children(vec![
        SurfaceNode::text("one"),
        SurfaceNode::Block(vec![SurfaceNode::text("two :smile:")]),
    ]);
    session
        .selection_mut()
        .set_caret(EditorPosition::in_node(1, 0));
    session.handle_event(SurfaceEvent::Paste);

    insta::assert_snapshot!(session.nodes().to_string(), @r#"["one\ntwo ", <:smile:>, ""]"#);
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(0, 4)
    );
}

#[test]
fn test_picker_insertion_uses_saved_selection() {
    let mut session = attach("abcde");
    session.handle_event(SurfaceEvent::Focus);
    session
        .selection_mut()
        .set_caret(EditorPosition::in_node(0, 3));

    // Pressing the trigger saves the caret, then focus moves away.
    session.save_selection();
    session.handle_event(SurfaceEvent::Blur);
    session.selection_mut().clear();
    session.open_picker();

    let outcome = session.pick("people", "smile");
    assert!(matches!(outcome, InsertOutcome::Inserted(Reconciliation::Rendered { .. })));
    assert_eq!(session.val(), "abc:smile:de");
    assert!(session.saved_selection().is_none());
    assert!(!session.picker().unwrap().is_visible());
    assert_eq!(
        session.selection().primary().unwrap().start,
        EditorPosition::in_node(2, 0)
    );
}
