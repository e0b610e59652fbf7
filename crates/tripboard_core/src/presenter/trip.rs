//! Board presenter: list of points, creation form, header and status message.
//!
//! # Responsibility
//! - Follow `EventsModel` notifications at the granularity their kind asks for.
//! - Gate editing until the first `Init` and route intents into the model.
//!
//! # Invariants
//! - `Init` rebuilds every row; row kinds touch only the affected row.
//! - Rows appear in canonical list order.
//! - Opening one editor closes every other editor and the creation form.

use super::new_point::NewPointPresenter;
use super::point::PointPresenter;
use super::{DataChange, PresenterError, PresenterResult, UserAction};
use crate::bus::{HandlerResult, Notification, Subscription, UpdateKind};
use crate::dom::{Dom, NodeId, RenderPosition};
use crate::model::event::{Event, EventId};
use crate::model::events_model::EventsModel;
use crate::view::{
    Callback, EventListComponent, ListMessage, ListMessageComponent, StatefulView,
    TripSummaryComponent, ViewResult,
};
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct TripInner {
    model: Rc<EventsModel>,
    dom: Dom,
    container: NodeId,
    list: StatefulView<EventListComponent>,
    summary: StatefulView<TripSummaryComponent>,
    message: RefCell<Option<StatefulView<ListMessageComponent>>>,
    points: RefCell<Vec<PointPresenter>>,
    new_point: RefCell<Option<NewPointPresenter>>,
    ready: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
}

#[derive(Clone)]
pub struct TripPresenter {
    inner: Rc<TripInner>,
}

impl TripPresenter {
    /// Creates the board for `model`; nothing is mounted until `init`.
    pub fn new(model: Rc<EventsModel>, dom: &Dom, container: NodeId) -> Self {
        let summary = TripSummaryComponent::attach(dom, &model);
        Self {
            inner: Rc::new(TripInner {
                list: StatefulView::new(dom, EventListComponent, ()),
                summary,
                model,
                dom: dom.clone(),
                container,
                message: RefCell::new(None),
                points: RefCell::new(Vec::new()),
                new_point: RefCell::new(None),
                ready: Cell::new(false),
                subscription: RefCell::new(None),
            }),
        }
    }

    fn upgrade(weak: &Weak<TripInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Mounts the board and starts following the model.
    ///
    /// Shows the loading message until the first `Init`, or renders right
    /// away when the model is already initialized.
    pub fn init(&self) -> PresenterResult<()> {
        let container = self.inner.container;
        self.inner
            .summary
            .mount(container, RenderPosition::BeforeEnd)?;
        self.inner.list.mount(container, RenderPosition::BeforeEnd)?;

        let weak = Rc::downgrade(&self.inner);
        let subscription = self.inner.model.subscribe(move |notification| -> HandlerResult {
            match Self::upgrade(&weak) {
                Some(board) => Ok(board.handle_model_event(notification)?),
                None => Ok(()),
            }
        });
        *self.inner.subscription.borrow_mut() = Some(subscription);

        if self.inner.model.is_ready() {
            self.inner.ready.set(true);
            self.render_board()?;
        } else {
            self.show_message(ListMessage::Loading)?;
        }
        info!("event=board_init module=presenter status=ok ready={}", self.is_ready());
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.get()
    }

    /// Row presenters in display order.
    pub fn points(&self) -> Vec<PointPresenter> {
        self.inner.points.borrow().clone()
    }

    pub fn point(&self, id: &EventId) -> Option<PointPresenter> {
        self.inner
            .points
            .borrow()
            .iter()
            .find(|point| &point.id() == id)
            .cloned()
    }

    pub fn new_point(&self) -> Option<NewPointPresenter> {
        self.inner.new_point.borrow().clone()
    }

    /// Status message currently shown, if any.
    pub fn message(&self) -> Option<ListMessage> {
        self.inner.message.borrow().as_ref().map(StatefulView::state)
    }

    pub fn list_element(&self) -> ViewResult<NodeId> {
        self.inner.list.element()
    }

    pub fn summary(&self) -> StatefulView<TripSummaryComponent> {
        self.inner.summary.clone()
    }

    /// Opens the creation form at the top of the list.
    ///
    /// # Errors
    /// - `NotReady` before the first `Init`.
    pub fn create_point(&self) -> PresenterResult<()> {
        if !self.is_ready() {
            warn!("event=board_create module=presenter status=rejected reason=not_ready");
            return Err(PresenterError::NotReady);
        }
        self.reset_all_modes();
        if self.new_point().is_some() {
            return Ok(());
        }

        let form = NewPointPresenter::new(
            &self.inner.dom,
            self.list_element()?,
            self.inner.model.catalog(),
            self.data_change(),
            self.on_new_point_cancel(),
        );
        form.init()?;
        *self.inner.new_point.borrow_mut() = Some(form);
        self.hide_message();
        Ok(())
    }

    /// Closes every open row editor.
    pub fn reset_all_modes(&self) {
        for point in self.points() {
            point.reset_view();
        }
    }

    /// Applies a user intent to the model with the given update kind.
    ///
    /// # Errors
    /// - `NotReady` before the first `Init`.
    /// - `Model` when the model rejects the change.
    pub fn handle_view_action(
        &self,
        action: UserAction,
        kind: UpdateKind,
        event: Event,
    ) -> PresenterResult<()> {
        if !self.is_ready() {
            warn!(
                "event=board_action module=presenter status=rejected action={} reason=not_ready",
                action.as_str()
            );
            return Err(PresenterError::NotReady);
        }
        let model = Rc::clone(&self.inner.model);
        let id = event.id.clone();
        let outcome = match action {
            UserAction::UpdateEvent => model.update(kind, event),
            UserAction::AddEvent => model.add(kind, event),
            UserAction::DeleteEvent => model.remove(kind, &event),
        };
        outcome.map_err(|err| {
            error!(
                "event=board_action module=presenter status=error action={} kind={} id={} error={}",
                action.as_str(),
                kind,
                id,
                err
            );
            PresenterError::Model(err)
        })
    }

    /// Unsubscribes and removes every view of the board.
    pub fn destroy(&self) {
        let subscription = self.inner.subscription.borrow_mut().take();
        drop(subscription);
        self.clear_rows();
        self.hide_message();
        self.inner.list.destroy();
        self.inner.summary.destroy();
        debug!("event=board_destroy module=presenter status=ok");
    }

    fn handle_model_event(&self, notification: &Notification<Event>) -> PresenterResult<()> {
        debug!(
            "event=board_update module=presenter status=start kind={}",
            notification.kind
        );
        if notification.kind == UpdateKind::Init {
            self.inner.ready.set(true);
            return self.render_board();
        }
        let Some(event) = notification.payload.clone() else {
            warn!(
                "event=board_update module=presenter status=ignored kind={} reason=no_payload",
                notification.kind
            );
            return Ok(());
        };

        match notification.kind {
            UpdateKind::Patch => {
                if let Some(point) = self.point(&event.id) {
                    point.replace(event)?;
                }
            }
            UpdateKind::Minor => {
                if let Some(point) = self.point(&event.id) {
                    point.refresh(event)?;
                }
            }
            UpdateKind::Added => {
                self.close_new_point();
                self.hide_message();
                let point = self.make_point(event);
                point.render(RenderPosition::AfterBegin)?;
                self.inner.points.borrow_mut().insert(0, point);
            }
            UpdateKind::Removed => {
                let removed = {
                    let mut points = self.inner.points.borrow_mut();
                    points
                        .iter()
                        .position(|point| point.id() == event.id)
                        .map(|index| points.remove(index))
                };
                if let Some(point) = removed {
                    point.destroy();
                }
                self.show_empty_if_needed()?;
            }
            UpdateKind::Init => {}
        }
        Ok(())
    }

    fn render_board(&self) -> PresenterResult<()> {
        self.clear_rows();
        let events = self.inner.model.events();
        if events.is_empty() {
            self.show_message(ListMessage::Empty)?;
        } else {
            self.hide_message();
        }

        let mut points = Vec::with_capacity(events.len());
        for event in events.iter() {
            let point = self.make_point(event.clone());
            point.render(RenderPosition::BeforeEnd)?;
            points.push(point);
        }
        let count = points.len();
        *self.inner.points.borrow_mut() = points;
        info!("event=board_render module=presenter status=ok count={count}");
        Ok(())
    }

    fn clear_rows(&self) {
        self.close_new_point();
        let points = std::mem::take(&mut *self.inner.points.borrow_mut());
        for point in points {
            point.destroy();
        }
    }

    fn make_point(&self, event: Event) -> PointPresenter {
        let list = match self.list_element() {
            Ok(list) => list,
            Err(_) => self.inner.container,
        };
        PointPresenter::new(
            &self.inner.dom,
            list,
            self.inner.model.catalog(),
            event,
            self.data_change(),
            self.on_mode_change(),
        )
    }

    fn data_change(&self) -> DataChange {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |action: UserAction, kind: UpdateKind, event: Event| {
            if let Some(board) = Self::upgrade(&weak) {
                let _ = board.handle_view_action(action, kind, event);
            }
        })
    }

    fn on_mode_change(&self) -> Callback {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(board) = Self::upgrade(&weak) {
                board.close_new_point();
                board.reset_all_modes();
                if let Err(err) = board.show_empty_if_needed() {
                    warn!("event=board_mode module=presenter status=error error={err}");
                }
            }
        })
    }

    fn on_new_point_cancel(&self) -> Callback {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(board) = Self::upgrade(&weak) {
                board.inner.new_point.borrow_mut().take();
                if let Err(err) = board.show_empty_if_needed() {
                    warn!("event=board_cancel module=presenter status=error error={err}");
                }
            }
        })
    }

    fn close_new_point(&self) {
        let form = self.inner.new_point.borrow_mut().take();
        if let Some(form) = form {
            form.destroy();
        }
    }

    fn show_empty_if_needed(&self) -> PresenterResult<()> {
        if self.inner.points.borrow().is_empty() && self.new_point().is_none() {
            self.show_message(ListMessage::Empty)?;
        }
        Ok(())
    }

    fn show_message(&self, message: ListMessage) -> PresenterResult<()> {
        let current = self.inner.message.borrow().clone();
        match current {
            Some(view) => view.update_element(|state| *state = message)?,
            None => {
                let view = StatefulView::new(&self.inner.dom, ListMessageComponent, message);
                view.mount(self.inner.container, RenderPosition::BeforeEnd)?;
                *self.inner.message.borrow_mut() = Some(view);
            }
        }
        Ok(())
    }

    fn hide_message(&self) {
        let view = self.inner.message.borrow_mut().take();
        if let Some(view) = view {
            view.destroy();
        }
    }
}
