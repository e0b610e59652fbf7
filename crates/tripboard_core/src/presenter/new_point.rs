//! Presenter of the creation form shown at the top of the list.

use super::{DataChange, UserAction};
use crate::bus::UpdateKind;
use crate::dom::{Dom, NodeId, RenderPosition};
use crate::model::catalog::CatalogSnapshot;
use crate::model::event::{Event, EventType};
use crate::view::{Callback, EditorMode, EventEditComponent, StatefulView, ViewResult};
use log::debug;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

const DEFAULT_EVENT_TYPE: EventType = EventType::Flight;

struct NewPointInner {
    dom: Dom,
    list: NodeId,
    catalog: Rc<CatalogSnapshot>,
    editor: RefCell<Option<StatefulView<EventEditComponent>>>,
    on_data_change: DataChange,
    on_cancel: Callback,
}

#[derive(Clone)]
pub struct NewPointPresenter {
    inner: Rc<NewPointInner>,
}

impl NewPointPresenter {
    pub fn new(
        dom: &Dom,
        list: NodeId,
        catalog: Rc<CatalogSnapshot>,
        on_data_change: DataChange,
        on_cancel: Callback,
    ) -> Self {
        Self {
            inner: Rc::new(NewPointInner {
                dom: dom.clone(),
                list,
                catalog,
                editor: RefCell::new(None),
                on_data_change,
                on_cancel,
            }),
        }
    }

    fn upgrade(weak: &Weak<NewPointInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Opens the form with a blank event; no-op when already open.
    pub fn init(&self) -> ViewResult<()> {
        if self.is_open() {
            return Ok(());
        }
        let editor = self.build_editor();
        editor.mount(self.inner.list, RenderPosition::AfterBegin)?;
        *self.inner.editor.borrow_mut() = Some(editor);
        debug!("event=new_point module=presenter status=opened");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.inner.editor.borrow().is_some()
    }

    pub fn editor(&self) -> Option<StatefulView<EventEditComponent>> {
        self.inner.editor.borrow().clone()
    }

    pub fn destroy(&self) {
        let editor = self.inner.editor.borrow_mut().take();
        if let Some(editor) = editor {
            editor.destroy();
            debug!("event=new_point module=presenter status=closed");
        }
    }

    fn cancel(&self) {
        self.destroy();
        let on_cancel = Rc::clone(&self.inner.on_cancel);
        on_cancel();
    }

    fn build_editor(&self) -> StatefulView<EventEditComponent> {
        let weak = Rc::downgrade(&self.inner);
        let on_submit = Rc::new(move |event: Event| {
            if let Some(form) = Self::upgrade(&weak) {
                let on_data_change = Rc::clone(&form.inner.on_data_change);
                on_data_change(UserAction::AddEvent, UpdateKind::Added, event);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let on_cancel = Rc::new(move |_event: Event| {
            if let Some(form) = Self::upgrade(&weak) {
                form.cancel();
            }
        });

        let component = EventEditComponent::new(
            EditorMode::Create,
            Rc::clone(&self.inner.catalog),
            on_submit,
            on_cancel,
            Rc::new(|| {}),
        );
        let state = component.initial_state(&Event::blank(DEFAULT_EVENT_TYPE));
        StatefulView::new(&self.inner.dom, component, state)
    }
}
