//! Attaching an editor session to a `<textarea>`.
//!
//! The textarea is hidden and a contenteditable `<div>` takes its place. Every
//! accepted value is written back to the textarea right away; the textarea's
//! `change` event follows after the current event, so forms keep working.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use emojiarea_core::{
    ButtonPlan, ButtonPosition, EditorSession, EmojiAreaOptions, InsertOutcome, PickerKey,
    PictogramCatalog, PlatformError, SurfaceEvent,
};
use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlTextAreaElement, Node};

use crate::dom::DomSurface;
use crate::menu::{MenuClick, MenuView};
use crate::selection::DomSelection;

pub const EDITOR_CLASS: &str = "emojiarea-editor";
pub const BUTTON_CLASS: &str = "emojiarea-button";

pub type BrowserSession = EditorSession<DomSurface, DomSelection>;

/// Events on the editor that feed the session.
const SURFACE_EVENTS: &[SurfaceEvent] = &[
    SurfaceEvent::Input,
    SurfaceEvent::KeyUp,
    SurfaceEvent::Paste,
    SurfaceEvent::Change,
    SurfaceEvent::Focus,
    SurfaceEvent::Blur,
];

/// A live, attached field. Dropping it removes the listeners; call
/// [`detach`](Self::detach) to also restore the textarea.
pub struct EmojiArea {
    session: Rc<RefCell<BrowserSession>>,
    source: HtmlTextAreaElement,
    editor: HtmlElement,
    /// The trigger, and whether it was created here.
    button: Option<(Element, bool)>,
    menu: Rc<MenuView>,
    _listeners: Vec<EventListener>,
}

/// Replace `source` with an emoji-aware editor.
pub fn attach(
    source: &HtmlTextAreaElement,
    catalog: Arc<PictogramCatalog>,
    options: EmojiAreaOptions,
) -> Result<EmojiArea, PlatformError> {
    let document = source.owner_document().ok_or("textarea is not in a document")?;
    let editor = create_editor(&document, source)?;

    let surface = DomSurface::new(editor.clone())?;
    let mut session = EditorSession::attach(
        surface,
        DomSelection::new(),
        &source.value(),
        catalog,
        options,
    );

    let field = source.clone();
    session.set_change_observer(move |value| {
        field.set_value(value);
        // Host handlers may call back into the area; fire once the session is released.
        let field = field.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match web_sys::Event::new("change") {
                Ok(event) => {
                    let _ = field.dispatch_event(&event);
                }
                Err(e) => {
                    tracing::warn!(target: "emojiarea::browser", "change event failed: {:?}", e)
                }
            }
        });
    });

    let button = place_button(&document, &editor, session.button_plan())?;
    let session = Rc::new(RefCell::new(session));
    let menu = Rc::new(MenuView::new(&document)?);

    let mut listeners = Vec::new();
    for &event in SURFACE_EVENTS {
        let session = session.clone();
        listeners.push(EventListener::new(&editor, event.as_str(), move |_| {
            // The session's own synthetic events arrive while it is borrowed.
            match session.try_borrow_mut() {
                Ok(mut session) => {
                    session.handle_event(event);
                }
                Err(_) => tracing::trace!(
                    target: "emojiarea::browser",
                    event = event.as_str(),
                    "re-entrant event ignored"
                ),
            }
        }));
    }

    if let Some((trigger, _)) = &button {
        listeners.extend(button_listeners(trigger, &session, &menu));
    }
    listeners.extend(menu_listeners(&document, button.as_ref(), &session, &menu));

    let deferred = session.clone();
    wasm_bindgen_futures::spawn_local(async move {
        if let Ok(mut session) = deferred.try_borrow_mut() {
            session.run_deferred();
        }
    });

    tracing::debug!(target: "emojiarea::browser", "attached to textarea");

    Ok(EmojiArea {
        session,
        source: source.clone(),
        editor,
        button,
        menu,
        _listeners: listeners,
    })
}

impl EmojiArea {
    /// Current value.
    ///
    /// While the session is busy (called from inside one of its own
    /// listeners) this is the last value written to the textarea.
    pub fn val(&self) -> String {
        match self.session.try_borrow() {
            Ok(session) => session.val(),
            Err(_) => self.source.value(),
        }
    }

    /// Insert a pictogram at the saved or live selection.
    pub fn insert(&self, group: &str, token: &str) -> Result<InsertOutcome, PlatformError> {
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| "session is busy")?;
        Ok(session.insert(group, token))
    }

    pub fn session(&self) -> Rc<RefCell<BrowserSession>> {
        self.session.clone()
    }

    pub fn editor(&self) -> &HtmlElement {
        &self.editor
    }

    pub fn button(&self) -> Option<&Element> {
        self.button.as_ref().map(|(el, _)| el)
    }

    pub fn menu(&self) -> &MenuView {
        &self.menu
    }

    /// Remove the editor, menu and any created trigger, and show the
    /// textarea again.
    pub fn detach(self) {
        drop(self._listeners);
        self.menu.remove();
        if let Some((button, true)) = &self.button {
            button.remove();
        }
        self.editor.remove();
        if let Err(e) = self.source.style().remove_property("display") {
            tracing::warn!(target: "emojiarea::browser", "could not show textarea: {:?}", e);
        }
        tracing::debug!(target: "emojiarea::browser", "detached");
    }
}

fn create_editor(
    document: &Document,
    source: &HtmlTextAreaElement,
) -> Result<HtmlElement, PlatformError> {
    let editor = document
        .create_element("div")
        .map_err(|e| format!("create_element failed: {:?}", e))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| "editor is not an HtmlElement")?;
    editor.set_class_name(EDITOR_CLASS);
    editor
        .set_attribute("contenteditable", "true")
        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
    // Re-rendered lines are "\n" inside text nodes.
    editor
        .style()
        .set_property("white-space", "pre-wrap")
        .map_err(|e| format!("set_property failed: {:?}", e))?;

    let parent = source.parent_node().ok_or("textarea has no parent")?;
    parent
        .insert_before(&editor, source.next_sibling().as_ref())
        .map_err(|e| format!("insert_before failed: {:?}", e))?;
    source
        .style()
        .set_property("display", "none")
        .map_err(|e| format!("set_property failed: {:?}", e))?;
    Ok(editor)
}

/// Resolve the trigger element. The bool is true when it was created here.
fn place_button(
    document: &Document,
    editor: &HtmlElement,
    plan: ButtonPlan,
) -> Result<Option<(Element, bool)>, PlatformError> {
    match plan {
        ButtonPlan::Suppressed => Ok(None),
        ButtonPlan::Existing { id } => {
            let found = document.get_element_by_id(&id);
            if found.is_none() {
                tracing::warn!(target: "emojiarea::browser", %id, "trigger element not found");
            }
            Ok(found.map(|el| (el, false)))
        }
        ButtonPlan::Create { label, position } => {
            let button = document
                .create_element("a")
                .map_err(|e| format!("create_element failed: {:?}", e))?;
            button.set_class_name(BUTTON_CLASS);
            button
                .set_attribute("href", "javascript:void(0)")
                .map_err(|e| format!("set_attribute failed: {:?}", e))?;
            button.set_text_content(Some(&label));

            let parent = editor.parent_node().ok_or("editor has no parent")?;
            let reference: Option<Node> = match position {
                ButtonPosition::Before => Some(editor.clone().into()),
                ButtonPosition::After => editor.next_sibling(),
            };
            parent
                .insert_before(&button, reference.as_ref())
                .map_err(|e| format!("insert_before failed: {:?}", e))?;
            Ok(Some((button, true)))
        }
    }
}

fn button_listeners(
    trigger: &Element,
    session: &Rc<RefCell<BrowserSession>>,
    menu: &Rc<MenuView>,
) -> [EventListener; 2] {
    // mousedown fires before the editor loses focus.
    let on_down = {
        let session = session.clone();
        EventListener::new(trigger, "mousedown", move |_| {
            if let Ok(mut session) = session.try_borrow_mut() {
                session.save_selection();
            }
        })
    };
    let on_click = {
        let session = session.clone();
        let menu = menu.clone();
        EventListener::new(trigger, "click", move |_| {
            let Ok(mut session) = session.try_borrow_mut() else {
                return;
            };
            if let Err(e) = menu.render(session.open_picker()) {
                tracing::warn!(target: "emojiarea::browser", "menu render failed: {e}");
            }
        })
    };
    [on_down, on_click]
}

fn menu_listeners(
    document: &Document,
    button: Option<&(Element, bool)>,
    session: &Rc<RefCell<BrowserSession>>,
    menu: &Rc<MenuView>,
) -> [EventListener; 3] {
    let on_pick = {
        let session = session.clone();
        let root = menu.root().clone();
        let menu = menu.clone();
        EventListener::new(&root, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Ok(mut session) = session.try_borrow_mut() else {
                return;
            };
            match menu.classify(&target) {
                MenuClick::Tab(group) => {
                    if let Some(picker) = session.picker_mut() {
                        picker.select_group(&group);
                    }
                }
                MenuClick::Item { group, token } => {
                    let outcome = session.pick(&group, &token);
                    tracing::debug!(target: "emojiarea::browser", %token, ?outcome, "picked");
                }
                MenuClick::Nothing => return,
            }
            redraw(&menu, &session);
        })
    };

    let on_key = {
        let session = session.clone();
        let menu = menu.clone();
        EventListener::new(document, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<web_sys::KeyboardEvent>().map(|k| k.key()) else {
                return;
            };
            let Ok(mut session) = session.try_borrow_mut() else {
                return;
            };
            if session.handle_picker_key(PickerKey::from_key(&key)) {
                redraw(&menu, &session);
            }
        })
    };

    let trigger: Option<Element> = button.map(|(el, _)| el.clone());
    let on_outside = {
        let session = session.clone();
        let menu = menu.clone();
        EventListener::new(document, "click", move |event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            let inside = |el: &Element| el.contains(Some(&target));
            let root: &Element = menu.root();
            if inside(root) || trigger.as_ref().is_some_and(inside) {
                return;
            }
            let Ok(mut session) = session.try_borrow_mut() else {
                return;
            };
            if session.picker().is_some_and(|p| p.is_visible()) {
                session.close_picker();
                redraw(&menu, &session);
            }
        })
    };

    [on_pick, on_key, on_outside]
}

fn redraw(menu: &MenuView, session: &BrowserSession) {
    let result = match session.picker() {
        Some(picker) => menu.render(picker),
        None => menu.hide(),
    };
    if let Err(e) = result {
        tracing::warn!(target: "emojiarea::browser", "menu render failed: {e}");
    }
}
