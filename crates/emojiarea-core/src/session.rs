//! The editor session: one attached field.
//!
//! The session owns the live node sequence and the last serialized value.
//! Every edit reported by the surface goes through [`EditorSession::on_surface_changed`],
//! which re-tokenizes, re-renders when the structure changed, and carries the
//! caret over. Nothing in here returns an error; collaborator failures are
//! logged and folded into the returned outcome.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{ImageHandle, PictogramCatalog};
use crate::node::NodeSequence;
use crate::options::{ButtonPlan, EmojiAreaOptions};
use crate::picker::{PickerChoice, PickerKey, PickerMenu};
use crate::platform::{SelectionProvider, SelectionSnapshot, Surface, SurfaceEvent};
use crate::position::{EditorPosition, EditorRange, MappedRange, map_caret};
use crate::surface::{SurfaceNode, render, serialize};
use crate::tokenize::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Reconciling an edit.
    Dirty,
    /// Inserting a picked pictogram.
    Composing,
}

/// What a call to [`EditorSession::on_surface_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Value matched the last known one.
    Unchanged,
    /// Surface was cleared; accepted without rendering.
    AcceptedEmpty,
    /// Value changed but the surface already shows it as one text node.
    TextOnly,
    /// Surface children were replaced. `caret` is where the caret went, if
    /// there was one to carry.
    Rendered { caret: Option<MappedRange> },
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        !matches!(self, Reconciliation::Unchanged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Reconciliation),
    /// No such pictogram in the catalog.
    UnknownPictogram,
    /// No selection to insert at, or the platform refused the insertion.
    SelectionUnavailable,
}

/// Follow-up work queued for after the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Put the caret after the last child, whatever it is by then.
    PlaceCaretAtEnd,
}

type ChangeObserver = Box<dyn FnMut(&str)>;

pub struct EditorSession<S: Surface, P: SelectionProvider<S>> {
    catalog: Arc<PictogramCatalog>,
    options: EmojiAreaOptions,
    surface: S,
    selection: P,
    nodes: NodeSequence,
    last_text_value: String,
    saved_selection: Option<SelectionSnapshot>,
    has_focus: bool,
    state: SessionState,
    picker: Option<PickerMenu>,
    deferred: VecDeque<DeferredTask>,
    on_change: Option<ChangeObserver>,
}

impl<S: Surface, P: SelectionProvider<S>> fmt::Debug for EditorSession<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("nodes", &self.nodes)
            .field("last_text_value", &self.last_text_value)
            .field("has_focus", &self.has_focus)
            .field("state", &self.state)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl<S: Surface, P: SelectionProvider<S>> EditorSession<S, P> {
    /// Take over `surface`, rendering `source` into it.
    ///
    /// Queues [`DeferredTask::PlaceCaretAtEnd`]; the host runs it with
    /// [`run_deferred`](Self::run_deferred) once the current event is done.
    pub fn attach(
        mut surface: S,
        selection: P,
        source: &str,
        catalog: Arc<PictogramCatalog>,
        options: EmojiAreaOptions,
    ) -> Self {
        let nodes = tokenize(source, &catalog);
        surface.clear_children();
        surface.append_children(&render(&nodes));
        let last_text_value = serialize(&surface.children());

        tracing::debug!(
            target: "emojiarea::session",
            nodes = nodes.len(),
            pictograms = nodes.pictogram_count(),
            "attached"
        );

        Self {
            catalog,
            options,
            surface,
            selection,
            nodes,
            last_text_value,
            saved_selection: None,
            has_focus: false,
            state: SessionState::Idle,
            picker: None,
            deferred: VecDeque::from([DeferredTask::PlaceCaretAtEnd]),
            on_change: None,
        }
    }

    /// Tear down, handing the collaborators back.
    pub fn detach(self) -> (S, P) {
        tracing::debug!(target: "emojiarea::session", "detached");
        (self.surface, self.selection)
    }

    /// Register the value-changed observer, replacing any previous one.
    pub fn set_change_observer(&mut self, observer: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(observer));
    }

    /// Current serialized value, read from the live surface.
    pub fn val(&self) -> String {
        serialize(&self.surface.children())
    }

    pub fn nodes(&self) -> &NodeSequence {
        &self.nodes
    }

    pub fn last_text_value(&self) -> &str {
        &self.last_text_value
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn catalog(&self) -> &PictogramCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &EmojiAreaOptions {
        &self.options
    }

    pub fn button_plan(&self) -> ButtonPlan {
        self.options.button_plan()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn selection(&self) -> &P {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut P {
        &mut self.selection
    }

    /// Route a surface event. Edit events reconcile; focus events only
    /// update focus tracking.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Option<Reconciliation> {
        match event {
            SurfaceEvent::Focus => {
                self.has_focus = true;
                None
            }
            SurfaceEvent::Blur => {
                self.has_focus = false;
                None
            }
            _ if event.is_edit() => Some(self.on_surface_changed()),
            _ => None,
        }
    }

    /// Bring the session in line with whatever the surface now holds.
    pub fn on_surface_changed(&mut self) -> Reconciliation {
        let value = self.val();
        if value == self.last_text_value {
            return Reconciliation::Unchanged;
        }

        if value.is_empty() {
            tracing::trace!(target: "emojiarea::session", "surface emptied");
            self.nodes = NodeSequence::new();
            self.accept(value);
            return Reconciliation::AcceptedEmpty;
        }

        let composing = self.state == SessionState::Composing;
        self.state = SessionState::Dirty;

        let children = self.surface.children();
        let snapshot = self.selection.capture(&self.surface);
        let nodes = tokenize(&value, &self.catalog);

        let outcome = match nodes.as_single_text() {
            Some(text) if matches!(children.as_slice(), [SurfaceNode::Text(live)] if live == text) => {
                tracing::trace!(target: "emojiarea::session", "plain text edit, render skipped");
                Reconciliation::TextOnly
            }
            _ => {
                let caret = snapshot
                    .primary()
                    .map(|range| map_caret(&children, range, &nodes));

                self.surface.clear_children();
                self.surface.append_children(&render(&nodes));

                if let Some(mapped) = caret {
                    let restored = SelectionSnapshot::single(mapped.range);
                    if let Err(e) = self.selection.restore(&self.surface, &restored) {
                        tracing::warn!(target: "emojiarea::session", "caret restore failed: {e}");
                    }
                }

                tracing::trace!(
                    target: "emojiarea::session",
                    old_children = children.len(),
                    new_nodes = nodes.len(),
                    ?caret,
                    "re-rendered"
                );
                Reconciliation::Rendered { caret }
            }
        };

        self.nodes = nodes;
        self.accept(value);
        self.state = if composing {
            SessionState::Composing
        } else {
            SessionState::Idle
        };
        outcome
    }

    /// Record `value` as current and tell everyone.
    fn accept(&mut self, value: String) {
        self.last_text_value = value;
        self.surface.dispatch_synthetic_event(SurfaceEvent::Change);
        if let Some(observer) = self.on_change.as_mut() {
            observer(&self.last_text_value);
        }
    }

    /// Insert `token` from `group` at the saved selection, or at the live
    /// selection when nothing was saved.
    pub fn insert(&mut self, group: &str, token: &str) -> InsertOutcome {
        let Some(image) = self.catalog.icon(group, token).cloned() else {
            tracing::debug!(target: "emojiarea::session", group, token, "insert: unknown pictogram");
            return InsertOutcome::UnknownPictogram;
        };
        self.insert_image(image)
    }

    /// Like [`insert`](Self::insert) with a global catalog lookup.
    pub fn insert_pictogram(&mut self, token: &str) -> InsertOutcome {
        let Some(image) = self.catalog.lookup(token).cloned() else {
            tracing::debug!(target: "emojiarea::session", token, "insert: unknown pictogram");
            return InsertOutcome::UnknownPictogram;
        };
        self.insert_image(image)
    }

    fn insert_image(&mut self, image: ImageHandle) -> InsertOutcome {
        self.state = SessionState::Composing;

        let snapshot = match self.saved_selection.take() {
            Some(saved) => {
                if let Err(e) = self.selection.restore(&self.surface, &saved) {
                    tracing::debug!(target: "emojiarea::session", "saved selection not restored: {e}");
                }
                saved
            }
            None => self.selection.capture(&self.surface),
        };

        if snapshot.is_empty() {
            tracing::debug!(target: "emojiarea::session", "no selection, insertion skipped");
            self.state = SessionState::Idle;
            return InsertOutcome::SelectionUnavailable;
        }

        let token = image.alt.clone();
        if let Err(e) =
            self.selection
                .replace_at(&mut self.surface, &snapshot, SurfaceNode::Image(image))
        {
            tracing::debug!(target: "emojiarea::session", %token, "insertion failed: {e}");
            self.state = SessionState::Idle;
            return InsertOutcome::SelectionUnavailable;
        }

        let outcome = self.on_surface_changed();
        self.state = SessionState::Idle;
        InsertOutcome::Inserted(outcome)
    }

    /// Remember the selection for a later insertion, if the surface has focus.
    ///
    /// Call when the picker trigger is pressed, before focus moves to it.
    pub fn save_selection(&mut self) {
        if self.has_focus {
            self.saved_selection = Some(self.selection.capture(&self.surface));
        }
    }

    pub fn saved_selection(&self) -> Option<&SelectionSnapshot> {
        self.saved_selection.as_ref()
    }

    /// Show the picker, building it on first use.
    pub fn open_picker(&mut self) -> &PickerMenu {
        let catalog = &self.catalog;
        let picker = self.picker.get_or_insert_with(|| PickerMenu::new(catalog));
        picker.show();
        picker
    }

    pub fn close_picker(&mut self) {
        if let Some(picker) = self.picker.as_mut() {
            picker.hide();
        }
    }

    pub fn picker(&self) -> Option<&PickerMenu> {
        self.picker.as_ref()
    }

    pub fn picker_mut(&mut self) -> Option<&mut PickerMenu> {
        self.picker.as_mut()
    }

    /// Forward a key to the open picker. True when it closed.
    pub fn handle_picker_key(&mut self, key: PickerKey) -> bool {
        self.picker
            .as_mut()
            .is_some_and(|picker| picker.handle_key(key))
    }

    /// Insert the picked pictogram and close the picker.
    pub fn pick(&mut self, group: &str, token: &str) -> InsertOutcome {
        let choice = self
            .picker
            .as_ref()
            .and_then(|picker| picker.choose(group, token));
        let outcome = match choice {
            Some(PickerChoice { group, token }) => self.insert(&group, &token),
            None => InsertOutcome::UnknownPictogram,
        };
        self.close_picker();
        outcome
    }

    pub fn schedule(&mut self, task: DeferredTask) {
        self.deferred.push_back(task);
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Run queued follow-up work against the live surface. Returns how many
    /// tasks ran.
    pub fn run_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::PlaceCaretAtEnd => self.place_caret_at_end(),
            }
            ran += 1;
        }
        ran
    }

    fn place_caret_at_end(&mut self) {
        self.on_surface_changed();
        let children = self.surface.children();
        let position = match children.last() {
            Some(SurfaceNode::Text(text)) => {
                EditorPosition::in_node(children.len() - 1, text.chars().count())
            }
            _ => EditorPosition::container(children.len()),
        };
        let snapshot = SelectionSnapshot::single(EditorRange::collapsed(position));
        if let Err(e) = self.selection.restore(&self.surface, &snapshot) {
            tracing::debug!(target: "emojiarea::session", "caret placement failed: {e}");
        }
    }
}
