//! Presenter of one trip point: a row that can be swapped for its editor.

use super::{DataChange, UserAction};
use crate::bus::UpdateKind;
use crate::dom::{Dom, NodeId, RenderPosition};
use crate::model::catalog::CatalogSnapshot;
use crate::model::event::{Event, EventId};
use crate::view::{
    replace_view, Callback, EditorMode, EventEditComponent, EventRowComponent, StatefulView,
    ViewResult,
};
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Whether the row or its editor is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default,
    Editing,
}

struct PointInner {
    dom: Dom,
    list: NodeId,
    catalog: Rc<CatalogSnapshot>,
    event: RefCell<Event>,
    row: RefCell<Option<StatefulView<EventRowComponent>>>,
    editor: RefCell<Option<StatefulView<EventEditComponent>>>,
    mode: Cell<Mode>,
    on_data_change: DataChange,
    on_mode_change: Callback,
}

#[derive(Clone)]
pub struct PointPresenter {
    inner: Rc<PointInner>,
}

impl PointPresenter {
    pub fn new(
        dom: &Dom,
        list: NodeId,
        catalog: Rc<CatalogSnapshot>,
        event: Event,
        on_data_change: DataChange,
        on_mode_change: Callback,
    ) -> Self {
        Self {
            inner: Rc::new(PointInner {
                dom: dom.clone(),
                list,
                catalog,
                event: RefCell::new(event),
                row: RefCell::new(None),
                editor: RefCell::new(None),
                mode: Cell::new(Mode::Default),
                on_data_change,
                on_mode_change,
            }),
        }
    }

    fn upgrade(weak: &Weak<PointInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn id(&self) -> EventId {
        self.inner.event.borrow().id.clone()
    }

    /// Entity the row currently shows.
    pub fn event(&self) -> Event {
        self.inner.event.borrow().clone()
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode.get()
    }

    pub fn row(&self) -> Option<StatefulView<EventRowComponent>> {
        self.inner.row.borrow().clone()
    }

    pub fn editor(&self) -> Option<StatefulView<EventEditComponent>> {
        self.inner.editor.borrow().clone()
    }

    /// Mounts a fresh row into the list.
    pub fn render(&self, position: RenderPosition) -> ViewResult<()> {
        let row = self.build_row();
        row.mount(self.inner.list, position)?;
        *self.inner.row.borrow_mut() = Some(row);
        Ok(())
    }

    /// Replaces whatever is shown with a row for `event`; an open editor closes.
    pub fn replace(&self, event: Event) -> ViewResult<()> {
        *self.inner.event.borrow_mut() = event;
        let fresh = self.build_row();
        let editor = self.editor();
        let current = self.row();
        match (&editor, &current) {
            (Some(editor), _) => replace_view(&fresh, editor)?,
            (None, Some(row)) => replace_view(&fresh, row)?,
            (None, None) => {
                fresh.mount(self.inner.list, RenderPosition::BeforeEnd)?;
            }
        }

        self.inner.editor.borrow_mut().take();
        *self.inner.row.borrow_mut() = Some(fresh);
        if let Some(editor) = editor {
            editor.destroy();
        }
        if let Some(row) = current {
            row.destroy();
        }
        self.inner.mode.set(Mode::Default);
        Ok(())
    }

    /// Re-renders the row only; an open editor keeps its state and DOM.
    pub fn refresh(&self, event: Event) -> ViewResult<()> {
        *self.inner.event.borrow_mut() = event.clone();
        match self.row() {
            Some(row) => row.update_element(|state| *state = event),
            None => Ok(()),
        }
    }

    /// Closes the editor, if open.
    pub fn reset_view(&self) {
        if self.mode() == Mode::Editing {
            if let Err(err) = self.close_editor() {
                warn!(
                    "event=point_mode module=presenter status=error id={} error={}",
                    self.id(),
                    err
                );
            }
        }
    }

    pub fn destroy(&self) {
        let row = self.inner.row.borrow_mut().take();
        let editor = self.inner.editor.borrow_mut().take();
        if let Some(editor) = editor {
            editor.destroy();
        }
        if let Some(row) = row {
            row.destroy();
        }
        self.inner.mode.set(Mode::Default);
    }

    fn open_editor(&self) -> ViewResult<()> {
        if self.mode() == Mode::Editing {
            return Ok(());
        }
        let on_mode_change = Rc::clone(&self.inner.on_mode_change);
        on_mode_change();

        let editor = self.build_editor();
        if let Some(row) = self.row() {
            replace_view(&editor, &row)?;
        }
        *self.inner.editor.borrow_mut() = Some(editor);
        self.inner.mode.set(Mode::Editing);
        debug!(
            "event=point_mode module=presenter status=ok id={} mode=editing",
            self.id()
        );
        Ok(())
    }

    fn close_editor(&self) -> ViewResult<()> {
        if let Some(editor) = self.editor() {
            if let Some(row) = self.row() {
                replace_view(&row, &editor)?;
            }
            self.inner.editor.borrow_mut().take();
            editor.destroy();
        }
        self.inner.mode.set(Mode::Default);
        debug!(
            "event=point_mode module=presenter status=ok id={} mode=default",
            self.id()
        );
        Ok(())
    }

    fn emit(&self, action: UserAction, kind: UpdateKind, event: Event) {
        let on_data_change = Rc::clone(&self.inner.on_data_change);
        on_data_change(action, kind, event);
    }

    fn build_row(&self) -> StatefulView<EventRowComponent> {
        let weak = Rc::downgrade(&self.inner);
        let on_edit: Callback = Rc::new(move || {
            let Some(point) = Self::upgrade(&weak) else {
                return;
            };
            if let Err(err) = point.open_editor() {
                warn!(
                    "event=point_mode module=presenter status=error id={} error={}",
                    point.id(),
                    err
                );
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let on_favorite: Callback = Rc::new(move || {
            if let Some(point) = Self::upgrade(&weak) {
                let mut event = point.event();
                event.is_favorite = !event.is_favorite;
                point.emit(UserAction::UpdateEvent, UpdateKind::Minor, event);
            }
        });

        StatefulView::new(
            &self.inner.dom,
            EventRowComponent::new(on_edit, on_favorite),
            self.event(),
        )
    }

    fn build_editor(&self) -> StatefulView<EventEditComponent> {
        let weak = Rc::downgrade(&self.inner);
        let on_submit = Rc::new(move |event: Event| {
            if let Some(point) = Self::upgrade(&weak) {
                point.emit(UserAction::UpdateEvent, UpdateKind::Patch, event);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let on_delete = Rc::new(move |event: Event| {
            if let Some(point) = Self::upgrade(&weak) {
                point.emit(UserAction::DeleteEvent, UpdateKind::Removed, event);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let on_rollup = Rc::new(move || {
            if let Some(point) = Self::upgrade(&weak) {
                point.reset_view();
            }
        });

        let component = EventEditComponent::new(
            EditorMode::Edit,
            Rc::clone(&self.inner.catalog),
            on_submit,
            on_delete,
            on_rollup,
        );
        let state = component.initial_state(&self.inner.event.borrow());
        StatefulView::new(&self.inner.dom, component, state)
    }
}
