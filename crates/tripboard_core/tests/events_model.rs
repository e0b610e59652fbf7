mod common;

use common::{demo_model, ready_model, record_kinds, GatedApi};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio::task::LocalSet;
use tripboard_core::api::{FailurePoint, FixtureData, RawEvent};
use tripboard_core::bus::{HandlerResult, Notification, UpdateKind};
use tripboard_core::{
    Event, EventId, EventType, EventsModel, FixtureApi, InitOutcome, ModelError, ModelStatus,
    Offer,
};

fn taxi_record() -> RawEvent {
    RawEvent {
        id: "1".to_string(),
        kind: "Taxi".to_string(),
        base_price: 30,
        date_from: Some("2024-01-01T10:00".to_string()),
        date_to: Some("2024-01-01T11:00".to_string()),
        is_favorite: false,
        destination: Some("Amsterdam".to_string()),
        offers: vec!["luggage".to_string()],
    }
}

fn single_taxi_model() -> Rc<EventsModel> {
    let demo = FixtureApi::demo();
    let data = FixtureData {
        events: vec![taxi_record()],
        ..demo.data().clone()
    };
    Rc::new(EventsModel::with_api(Rc::new(FixtureApi::new(data))))
}

fn drive(id: &str, price: u32) -> Event {
    let mut event = Event::blank(EventType::Drive);
    event.id = EventId::new(id);
    event.base_price = price;
    event
}

fn ids(events: &[Event]) -> Vec<String> {
    events.iter().map(|event| event.id.to_string()).collect()
}

#[tokio::test]
async fn initialize_adapts_the_taxi_record() {
    let model = single_taxi_model();
    let (kinds, _subscription) = record_kinds(&model);

    let outcome = model.initialize().await.expect("initialize");

    assert_eq!(outcome, InitOutcome::Loaded { count: 1 });
    assert_eq!(*kinds.borrow(), vec![UpdateKind::Init]);
    let events = model.events();
    assert_eq!(events.len(), 1);
    let taxi = &events[0];
    assert_eq!(taxi.kind, EventType::Taxi);
    assert_eq!(taxi.base_price, 30);
    assert_eq!(taxi.destination.as_deref(), Some("Amsterdam"));
    assert_eq!(
        taxi.offers,
        vec![Offer {
            id: "luggage".to_string(),
            title: "Add luggage".to_string(),
            price: 30,
        }]
    );
}

#[tokio::test]
async fn removing_the_taxi_fires_one_removed_notification() {
    let model = single_taxi_model();
    model.initialize().await.expect("initialize");
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    let _subscription = model.subscribe(move |notification: &Notification<Event>| -> HandlerResult {
        sink.borrow_mut().push(notification.clone());
        Ok(())
    });

    let taxi = model.events()[0].clone();
    model
        .remove(UpdateKind::Removed, &taxi)
        .expect("remove existing event");

    assert!(model.events().is_empty());
    let removed = removed.borrow();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kind, UpdateKind::Removed);
    assert_eq!(removed[0].payload.as_ref(), Some(&taxi));
}

#[tokio::test]
async fn exactly_one_init_on_success_and_on_failure() {
    for api in [
        FixtureApi::demo(),
        FixtureApi::demo().with_failure(FailurePoint::Events),
        FixtureApi::demo().with_failure(FailurePoint::Offers),
    ] {
        let model = EventsModel::with_api(Rc::new(api));
        let (kinds, _subscription) = record_kinds(&model);
        assert_eq!(model.status(), ModelStatus::Pending);

        model.initialize().await.expect("initialize never errors here");

        assert_eq!(*kinds.borrow(), vec![UpdateKind::Init]);
        assert!(model.is_ready());
    }
}

#[tokio::test]
async fn failed_load_degrades_to_an_empty_list() {
    let model = EventsModel::with_api(Rc::new(
        FixtureApi::demo().with_failure(FailurePoint::Destinations),
    ));

    let outcome = model.initialize().await.expect("initialize");

    assert!(matches!(outcome, InitOutcome::Degraded(_)));
    assert!(model.events().is_empty());
    assert_eq!(model.status(), ModelStatus::Ready);
}

#[tokio::test]
async fn one_bad_record_empties_the_whole_batch() {
    let demo = FixtureApi::demo();
    let mut data = demo.data().clone();
    data.events.push(RawEvent {
        id: "ghost".to_string(),
        destination: Some("Atlantis".to_string()),
        offers: Vec::new(),
        ..taxi_record()
    });
    let model = EventsModel::with_api(Rc::new(FixtureApi::new(data)));

    let outcome = model.initialize().await.expect("initialize");

    assert!(matches!(outcome, InitOutcome::Degraded(_)));
    assert!(model.events().is_empty());
}

#[tokio::test]
async fn missing_targets_fail_without_mutating() {
    let model = ready_model().await;
    let (kinds, _subscription) = record_kinds(&model);
    let before = model.events();
    let stranger = drive("missing", 1);

    assert_eq!(
        model.update(UpdateKind::Patch, stranger.clone()),
        Err(ModelError::NotFound(stranger.id.clone()))
    );
    assert_eq!(
        model.remove(UpdateKind::Removed, &stranger),
        Err(ModelError::NotFound(stranger.id.clone()))
    );

    assert_eq!(*model.events(), *before);
    assert!(kinds.borrow().is_empty());
}

#[tokio::test]
async fn mutations_match_a_replayed_reference_list() {
    let model = ready_model().await;
    let mirror: Rc<RefCell<Vec<Event>>> = Rc::new(RefCell::new(model.events().to_vec()));
    let sink = Rc::clone(&mirror);
    let _subscription = model.subscribe(move |notification: &Notification<Event>| -> HandlerResult {
        let mut list = sink.borrow_mut();
        let Some(event) = notification.payload.clone() else {
            return Ok(());
        };
        match notification.kind {
            UpdateKind::Added => list.insert(0, event),
            UpdateKind::Removed => list.retain(|existing| existing.id != event.id),
            UpdateKind::Patch | UpdateKind::Minor => {
                if let Some(slot) = list.iter_mut().find(|existing| existing.id == event.id) {
                    *slot = event;
                }
            }
            UpdateKind::Init => {}
        }
        Ok(())
    });

    model.add(UpdateKind::Added, drive("a", 10)).unwrap();
    model.add(UpdateKind::Added, drive("b", 20)).unwrap();
    model.update(UpdateKind::Patch, drive("a", 11)).unwrap();
    model.remove(UpdateKind::Removed, &drive("2", 0)).unwrap();
    model.update(UpdateKind::Minor, drive("b", 21)).unwrap();
    model.add(UpdateKind::Added, drive("c", 30)).unwrap();
    model.remove(UpdateKind::Removed, &drive("a", 0)).unwrap();

    let events = model.events();
    assert_eq!(*events, *mirror.borrow());
    assert_eq!(ids(&events), vec!["c", "b", "1", "3"]);
    assert_eq!(events[1].base_price, 21);
    let unique: HashSet<_> = events.iter().map(|event| event.id.clone()).collect();
    assert_eq!(unique.len(), events.len());
    assert_eq!(
        model.add(UpdateKind::Added, drive("c", 0)),
        Err(ModelError::DuplicateId(EventId::new("c")))
    );
}

#[tokio::test]
async fn load_in_flight_rejects_a_second_load_and_mutations() {
    let (api, gate) = GatedApi::demo();
    let model = Rc::new(EventsModel::with_api(Rc::new(api)));
    let (kinds, _subscription) = record_kinds(&model);

    LocalSet::new()
        .run_until(async {
            let loader = Rc::clone(&model);
            let first = tokio::task::spawn_local(async move { loader.initialize().await });
            while model.status() != ModelStatus::Loading {
                tokio::task::yield_now().await;
            }

            assert_eq!(
                model.initialize().await,
                Err(ModelError::InitializationInFlight)
            );
            assert_eq!(
                model.add(UpdateKind::Added, drive("early", 1)),
                Err(ModelError::InitializationInFlight)
            );

            gate.notify_one();
            let outcome = first.await.expect("join").expect("initialize");
            assert_eq!(outcome, InitOutcome::Loaded { count: 3 });
        })
        .await;

    assert_eq!(*kinds.borrow(), vec![UpdateKind::Init]);
    assert!(model.is_ready());
}

#[tokio::test]
async fn dropping_a_suspended_load_does_not_wedge_the_model() {
    let (api, gate) = GatedApi::demo();
    let model = EventsModel::with_api(Rc::new(api));
    let (kinds, _subscription) = record_kinds(&model);

    tokio::select! {
        biased;
        _ = model.initialize() => panic!("events endpoint is still gated"),
        _ = tokio::task::yield_now() => {}
    }

    assert_eq!(model.status(), ModelStatus::Pending);
    assert!(kinds.borrow().is_empty());
    assert_eq!(model.add(UpdateKind::Added, drive("early", 1)), Ok(()));

    gate.notify_one();
    let outcome = model.initialize().await.expect("second load runs");
    assert_eq!(outcome, InitOutcome::Loaded { count: 3 });
    assert_eq!(*kinds.borrow(), vec![UpdateKind::Added, UpdateKind::Init]);
}

#[tokio::test]
async fn subscribers_hear_changes_in_subscription_order() {
    let model = demo_model();
    let log = Rc::new(RefCell::new(Vec::new()));
    let subscriptions: Vec<_> = ["header", "list", "footer"]
        .into_iter()
        .map(|name| {
            let log = Rc::clone(&log);
            model.subscribe(move |notification: &Notification<Event>| -> HandlerResult {
                log.borrow_mut().push(format!("{name}:{}", notification.kind));
                Ok(())
            })
        })
        .collect();

    model.initialize().await.expect("initialize");
    model.add(UpdateKind::Added, drive("x", 1)).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "header:init",
            "list:init",
            "footer:init",
            "header:added",
            "list:added",
            "footer:added",
        ]
    );
    drop(subscriptions);
    assert_eq!(model.bus().subscriber_count(), 0);
}

#[tokio::test]
async fn adapted_events_convert_back_to_their_wire_ids() {
    let model = ready_model().await;
    let demo = FixtureApi::demo();

    for (event, raw) in model.events().iter().zip(&demo.data().events) {
        let wire = model.to_wire(event).expect("known catalog entries");
        assert_eq!(wire.destination, raw.destination);
        assert_eq!(wire.offers, raw.offers);
        assert_eq!(&wire, raw);
    }
}
