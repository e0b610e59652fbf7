//! Canonical trip event list.
//!
//! # Responsibility
//! - Own the single in-memory copy of server events.
//! - Load and adapt server data, then expose CRUD that broadcasts changes.
//!
//! # Invariants
//! - Event ids are unique within the list at all times.
//! - Mutations swap in a new list; readers holding an older snapshot keep a
//!   consistent view and never observe a partial mutation.
//! - `initialize` emits exactly one `UpdateKind::Init`, on success or failure.
//! - Subscribers have been notified before a mutating method returns.
//! - No `RefCell` borrow is held across an `.await` or a notification.
//! - Dropping a suspended `initialize` puts the status back where it was.
//!
//! # See also
//! - `model::adapter` for the wire conversion rules.
//! - `bus` for delivery order and handler failure isolation.

use crate::api::{RawEvent, TransportError, TripApi};
use crate::bus::{HandlerResult, Notification, NotificationBus, Subscription, UpdateKind};
use crate::model::adapter::{AdaptError, EventAdapter};
use crate::model::catalog::{CatalogSnapshot, DestinationsModel, OffersModel};
use crate::model::event::{Event, EventId};
use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors surfaced to callers of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Target of `update`/`remove` is not in the list.
    NotFound(EventId),
    /// `add` would break id uniqueness.
    DuplicateId(EventId),
    /// `initialize` is suspended; mutations and a second load are rejected.
    InitializationInFlight,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::DuplicateId(id) => write!(f, "event id already exists: {id}"),
            Self::InitializationInFlight => write!(f, "model initialization is in flight"),
        }
    }
}

impl Error for ModelError {}

/// Reason a load degraded to an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Transport(TransportError),
    Adaptation(AdaptError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::Adaptation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Adaptation(err) => Some(err),
        }
    }
}

impl From<TransportError> for LoadError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<AdaptError> for LoadError {
    fn from(value: AdaptError) -> Self {
        Self::Adaptation(value)
    }
}

/// Result of a completed `initialize`; both variants count as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Loaded { count: usize },
    Degraded(LoadError),
}

/// Readiness of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// `initialize` has not run yet.
    Pending,
    /// `initialize` is suspended on the transport.
    Loading,
    /// At least one `initialize` completed.
    Ready,
}

/// Holds `ModelStatus::Loading` for one `initialize` call and restores the
/// previous status if the call is dropped before it finishes.
struct LoadingGuard<'a> {
    status: &'a Cell<ModelStatus>,
    previous: ModelStatus,
}

impl<'a> LoadingGuard<'a> {
    fn enter(status: &'a Cell<ModelStatus>) -> Self {
        let previous = status.replace(ModelStatus::Loading);
        Self { status, previous }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.status.get() == ModelStatus::Loading {
            self.status.set(self.previous);
            warn!(
                "event=model_init module=model status=cancelled restored={:?}",
                self.previous
            );
        }
    }
}

/// Owner of the canonical event list.
pub struct EventsModel {
    api: Rc<dyn TripApi>,
    destinations: Rc<DestinationsModel>,
    offers: Rc<OffersModel>,
    events: RefCell<Rc<Vec<Event>>>,
    catalog: RefCell<Rc<CatalogSnapshot>>,
    status: Cell<ModelStatus>,
    bus: NotificationBus<Event>,
}

impl EventsModel {
    pub fn new(
        api: Rc<dyn TripApi>,
        destinations: Rc<DestinationsModel>,
        offers: Rc<OffersModel>,
    ) -> Self {
        Self {
            api,
            destinations,
            offers,
            events: RefCell::new(Rc::new(Vec::new())),
            catalog: RefCell::new(Rc::new(CatalogSnapshot::default())),
            status: Cell::new(ModelStatus::Pending),
            bus: NotificationBus::new(),
        }
    }

    /// Builds the model and both catalog providers over one transport.
    pub fn with_api(api: Rc<dyn TripApi>) -> Self {
        let destinations = Rc::new(DestinationsModel::new(Rc::clone(&api)));
        let offers = Rc::new(OffersModel::new(Rc::clone(&api)));
        Self::new(api, destinations, offers)
    }

    /// Current snapshot of the canonical list.
    pub fn events(&self) -> Rc<Vec<Event>> {
        Rc::clone(&self.events.borrow())
    }

    /// Reference data captured at the last `initialize`.
    pub fn catalog(&self) -> Rc<CatalogSnapshot> {
        Rc::clone(&self.catalog.borrow())
    }

    pub fn status(&self) -> ModelStatus {
        self.status.get()
    }

    pub fn is_ready(&self) -> bool {
        self.status.get() == ModelStatus::Ready
    }

    pub fn bus(&self) -> &NotificationBus<Event> {
        &self.bus
    }

    /// Registers a change handler; see [`NotificationBus::subscribe`].
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(
        &self,
        handler: impl Fn(&Notification<Event>) -> HandlerResult + 'static,
    ) -> Subscription {
        self.bus.subscribe(handler)
    }

    /// Loads catalogs and events, then replaces the list and emits `Init`.
    ///
    /// Transport and adaptation failures degrade to an empty list and are
    /// reported as `InitOutcome::Degraded`.
    ///
    /// # Errors
    /// - `InitializationInFlight` when another `initialize` is suspended; no
    ///   notification is emitted in that case.
    pub async fn initialize(&self) -> ModelResult<InitOutcome> {
        if self.status.get() == ModelStatus::Loading {
            warn!("event=model_init module=model status=rejected reason=in_flight");
            return Err(ModelError::InitializationInFlight);
        }
        let _loading = LoadingGuard::enter(&self.status);
        let started_at = Instant::now();
        info!("event=model_init module=model status=start");

        let loaded = self.load().await;
        let outcome = match loaded {
            Ok(events) => {
                let count = events.len();
                *self.events.borrow_mut() = Rc::new(events);
                info!(
                    "event=model_init module=model status=ok count={} duration_ms={}",
                    count,
                    started_at.elapsed().as_millis()
                );
                InitOutcome::Loaded { count }
            }
            Err(err) => {
                *self.events.borrow_mut() = Rc::new(Vec::new());
                warn!(
                    "event=model_init module=model status=degraded duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                InitOutcome::Degraded(err)
            }
        };
        *self.catalog.borrow_mut() = Rc::new(CatalogSnapshot::capture(
            &self.destinations,
            &self.offers,
        ));
        self.status.set(ModelStatus::Ready);

        self.bus.notify(UpdateKind::Init, None);
        Ok(outcome)
    }

    async fn load(&self) -> Result<Vec<Event>, LoadError> {
        tokio::try_join!(self.destinations.init(), self.offers.init())?;
        let raw = self.api.events().await?;
        let adapter = EventAdapter::new(&self.destinations, &self.offers);
        Ok(adapter.to_client_all(&raw)?)
    }

    /// Replaces the event with the same id, keeping its position.
    pub fn update(&self, kind: UpdateKind, event: Event) -> ModelResult<()> {
        self.ensure_not_loading()?;
        let current = self.events();
        let index = position_of(&current, &event.id)?;

        let mut next = Vec::with_capacity(current.len());
        next.extend_from_slice(&current[..index]);
        next.push(event.clone());
        next.extend_from_slice(&current[index + 1..]);
        *self.events.borrow_mut() = Rc::new(next);

        info!(
            "event=model_update module=model status=ok kind={} id={}",
            kind, event.id
        );
        self.bus.notify(kind, Some(event));
        Ok(())
    }

    /// Prepends a new event.
    pub fn add(&self, kind: UpdateKind, event: Event) -> ModelResult<()> {
        self.ensure_not_loading()?;
        let current = self.events();
        if current.iter().any(|existing| existing.id == event.id) {
            return Err(ModelError::DuplicateId(event.id));
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(event.clone());
        next.extend_from_slice(&current);
        *self.events.borrow_mut() = Rc::new(next);

        info!(
            "event=model_add module=model status=ok kind={} id={}",
            kind, event.id
        );
        self.bus.notify(kind, Some(event));
        Ok(())
    }

    /// Removes the event with the same id; the stored entity is broadcast.
    pub fn remove(&self, kind: UpdateKind, event: &Event) -> ModelResult<()> {
        self.ensure_not_loading()?;
        let current = self.events();
        let index = position_of(&current, &event.id)?;

        let mut next = Vec::with_capacity(current.len().saturating_sub(1));
        next.extend_from_slice(&current[..index]);
        next.extend_from_slice(&current[index + 1..]);
        let removed = current[index].clone();
        *self.events.borrow_mut() = Rc::new(next);

        info!(
            "event=model_remove module=model status=ok kind={} id={}",
            kind, removed.id
        );
        self.bus.notify(kind, Some(removed));
        Ok(())
    }

    /// Converts an event to wire shape for a future transport write.
    pub fn to_wire(&self, event: &Event) -> Result<RawEvent, AdaptError> {
        EventAdapter::new(&self.destinations, &self.offers).to_server(event)
    }

    fn ensure_not_loading(&self) -> ModelResult<()> {
        if self.status.get() == ModelStatus::Loading {
            warn!("event=model_mutation module=model status=rejected reason=in_flight");
            return Err(ModelError::InitializationInFlight);
        }
        Ok(())
    }
}

fn position_of(events: &[Event], id: &EventId) -> ModelResult<usize> {
    events
        .iter()
        .position(|event| &event.id == id)
        .ok_or_else(|| ModelError::NotFound(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::{EventsModel, ModelError, ModelStatus};
    use crate::api::FixtureApi;
    use crate::bus::UpdateKind;
    use crate::model::event::{Event, EventType};
    use std::rc::Rc;

    #[test]
    fn update_on_empty_model_is_not_found() {
        let model = EventsModel::with_api(Rc::new(FixtureApi::default()));
        let event = Event::blank(EventType::Drive);
        let err = model
            .update(UpdateKind::Patch, event.clone())
            .expect_err("missing event");
        assert_eq!(err, ModelError::NotFound(event.id));
        assert_eq!(model.status(), ModelStatus::Pending);
    }

    #[test]
    fn old_snapshots_survive_mutation() {
        let model = EventsModel::with_api(Rc::new(FixtureApi::default()));
        let first = Event::blank(EventType::Bus);
        model.add(UpdateKind::Added, first.clone()).expect("add");
        let before = model.events();

        model.remove(UpdateKind::Removed, &first).expect("remove");

        assert_eq!(before.len(), 1);
        assert!(model.events().is_empty());
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let model = EventsModel::with_api(Rc::new(FixtureApi::default()));
        let event = Event::blank(EventType::Ship);
        model.add(UpdateKind::Added, event.clone()).expect("add");
        let err = model
            .add(UpdateKind::Added, event.clone())
            .expect_err("duplicate");
        assert_eq!(err, ModelError::DuplicateId(event.id));
        assert_eq!(model.events().len(), 1);
    }
}
