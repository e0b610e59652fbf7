#![allow(dead_code)]

use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::Notify;
use tripboard_core::api::{
    RawDestination, RawEvent, RawOfferGroup, TransportResult, TripApi,
};
use tripboard_core::bus::{HandlerResult, Notification, Subscription, UpdateKind};
use tripboard_core::{Event, EventsModel, FixtureApi};

/// Model over the demo fixture, not yet initialized.
pub fn demo_model() -> Rc<EventsModel> {
    Rc::new(EventsModel::with_api(Rc::new(FixtureApi::demo())))
}

/// Model over the demo fixture after one successful load.
pub async fn ready_model() -> Rc<EventsModel> {
    let model = demo_model();
    model.initialize().await.expect("demo load");
    model
}

/// Records every notification kind the model broadcasts.
pub fn record_kinds(model: &EventsModel) -> (Rc<RefCell<Vec<UpdateKind>>>, Subscription) {
    let kinds = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kinds);
    let subscription = model.subscribe(move |notification: &Notification<Event>| -> HandlerResult {
        sink.borrow_mut().push(notification.kind);
        Ok(())
    });
    (kinds, subscription)
}

/// Transport whose `events` endpoint waits until `gate` is notified.
pub struct GatedApi {
    pub inner: FixtureApi,
    pub gate: Rc<Notify>,
}

impl GatedApi {
    pub fn demo() -> (Self, Rc<Notify>) {
        let gate = Rc::new(Notify::new());
        (
            Self {
                inner: FixtureApi::demo(),
                gate: Rc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait(?Send)]
impl TripApi for GatedApi {
    async fn events(&self) -> TransportResult<Vec<RawEvent>> {
        self.gate.notified().await;
        self.inner.events().await
    }

    async fn destinations(&self) -> TransportResult<Vec<RawDestination>> {
        self.inner.destinations().await
    }

    async fn offers(&self) -> TransportResult<Vec<RawOfferGroup>> {
        self.inner.offers().await
    }
}
