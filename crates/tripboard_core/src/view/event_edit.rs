//! Trip point editor form.
//!
//! # Responsibility
//! - Edit a private copy of one event; hand the entity back only on submit.
//! - Re-render sections that depend on type or destination in place.
//!
//! # Invariants
//! - Typing, toggling offers and editing times/price never re-render.
//! - Type and known-destination changes reconcile so the details sections
//!   match the state while focus stays in the edited control.

use super::format::{format_edit_time, parse_edit_time};
use super::state::{event_to_state, state_to_event, EditState};
use super::stateful::{Binding, StatefulView, UpdateMode, ViewComponent};
use super::{Callback, EventCallback};
use crate::dom::{DomEvent, DomEventKind, Selector};
use crate::model::catalog::CatalogSnapshot;
use crate::model::event::{Event, EventType};
use log::{debug, warn};
use maud::{html, Markup};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static OFFER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^event-offer-(?P<id>.+)$").expect("valid offer name regex"));

pub const DESTINATION_INPUT: &str = "event-destination";
pub const PRICE_INPUT: &str = "event-price";
pub const START_TIME_INPUT: &str = "event-start-time";
pub const END_TIME_INPUT: &str = "event-end-time";
pub const TYPE_INPUT: &str = "event-type";
pub const OFFER_INPUT_PREFIX: &str = "event-offer-";

/// Editing an existing point or filling the creation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Edit,
    Create,
}

pub struct EventEditComponent {
    mode: EditorMode,
    catalog: Rc<CatalogSnapshot>,
    on_submit: EventCallback,
    on_reset: EventCallback,
    on_rollup: Callback,
}

impl EventEditComponent {
    /// `on_reset` means delete in `Edit` mode and cancel in `Create` mode.
    pub fn new(
        mode: EditorMode,
        catalog: Rc<CatalogSnapshot>,
        on_submit: EventCallback,
        on_reset: EventCallback,
        on_rollup: Callback,
    ) -> Self {
        Self {
            mode,
            catalog,
            on_submit,
            on_reset,
            on_rollup,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Editor state for `event` under this component's catalog.
    pub fn initial_state(&self, event: &Event) -> EditState {
        event_to_state(event, &self.catalog)
    }

    fn submit(view: &StatefulView<Self>, _event: &DomEvent) {
        let entity = view.with_state(state_to_event);
        if let Err(err) = entity.validate() {
            warn!("event=editor_submit module=view status=rejected error={err}");
            return;
        }
        let on_submit = Rc::clone(&view.component().on_submit);
        on_submit(entity);
    }

    fn reset(view: &StatefulView<Self>, _event: &DomEvent) {
        let entity = view.with_state(state_to_event);
        let on_reset = Rc::clone(&view.component().on_reset);
        on_reset(entity);
    }

    fn rollup(view: &StatefulView<Self>, _event: &DomEvent) {
        let on_rollup = Rc::clone(&view.component().on_rollup);
        on_rollup();
    }

    fn destination_input(view: &StatefulView<Self>, event: &DomEvent) {
        let name = event.value.clone().unwrap_or_default();
        let catalog = Rc::clone(&view.component().catalog);
        let mode = if catalog.has_destination(&name) {
            UpdateMode::Reconcile
        } else {
            UpdateMode::Silent
        };
        let outcome = view.set_state(mode, |state| {
            state.event.destination = (!name.trim().is_empty()).then_some(name);
            state.refresh_flags(&catalog);
        });
        log_outcome("destination", outcome);
    }

    fn type_change(view: &StatefulView<Self>, event: &DomEvent) {
        let value = event.value.clone().unwrap_or_default();
        let kind = match value.parse::<EventType>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("event=editor_input module=view status=rejected field=type error={err}");
                return;
            }
        };
        let catalog = Rc::clone(&view.component().catalog);
        let outcome = view.update_element(|state| {
            state.event.kind = kind;
            state.event.offers.clear();
            state.refresh_flags(&catalog);
        });
        log_outcome("type", outcome);
    }

    fn offer_toggle(view: &StatefulView<Self>, event: &DomEvent) {
        let name = view
            .dom()
            .with(|document| document.attr(event.target, "name").map(str::to_string));
        let Some(offer_id) = name.as_deref().and_then(offer_id_from_name) else {
            return;
        };
        let catalog = Rc::clone(&view.component().catalog);
        let checked = event.checked;
        let outcome = view.set_state(UpdateMode::Silent, |state| {
            let kind = state.event.kind;
            let selected: Vec<_> = catalog
                .offers_for(kind)
                .iter()
                .filter(|offer| {
                    if offer.id == offer_id {
                        checked
                    } else {
                        state.event.has_offer(&offer.id)
                    }
                })
                .cloned()
                .collect();
            state.event.offers = selected;
        });
        log_outcome("offers", outcome);
    }

    fn price_input(view: &StatefulView<Self>, event: &DomEvent) {
        let value = event.value.clone().unwrap_or_default();
        let trimmed = value.trim();
        let price = if trimmed.is_empty() {
            0
        } else {
            match trimmed.parse::<u32>() {
                Ok(price) => price,
                Err(_) => {
                    debug!("event=editor_input module=view status=ignored field=price");
                    return;
                }
            }
        };
        let outcome = view.set_state(UpdateMode::Silent, |state| state.event.base_price = price);
        log_outcome("price", outcome);
    }

    fn start_time_change(view: &StatefulView<Self>, event: &DomEvent) {
        Self::time_change(view, event, true);
    }

    fn end_time_change(view: &StatefulView<Self>, event: &DomEvent) {
        Self::time_change(view, event, false);
    }

    fn time_change(view: &StatefulView<Self>, event: &DomEvent, start: bool) {
        let value = event.value.clone().unwrap_or_default();
        let parsed = match parse_edit_time(&value) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("event=editor_input module=view status=rejected field=time error={err}");
                return;
            }
        };
        let outcome = view.set_state(UpdateMode::Silent, |state| {
            if start {
                state.event.date_from = parsed;
            } else {
                state.event.date_to = parsed;
            }
        });
        log_outcome("time", outcome);
    }
}

fn offer_id_from_name(name: &str) -> Option<String> {
    OFFER_NAME_RE
        .captures(name)
        .and_then(|captures| captures.name("id"))
        .map(|id| id.as_str().to_string())
}

fn log_outcome(field: &str, outcome: super::ViewResult<()>) {
    if let Err(err) = outcome {
        warn!("event=editor_input module=view status=error field={field} error={err}");
    }
}

impl ViewComponent for EventEditComponent {
    type State = EditState;

    fn name(&self) -> &'static str {
        match self.mode {
            EditorMode::Edit => "event_edit",
            EditorMode::Create => "event_create",
        }
    }

    fn template(&self, state: &EditState) -> Markup {
        let event = &state.event;
        let offers = self.catalog.offers_for(event.kind);
        let destination = state
            .has_destination
            .then(|| event.destination.as_deref())
            .flatten()
            .and_then(|name| self.catalog.destination_by_name(name));
        let reset_label = match self.mode {
            EditorMode::Edit => "Delete",
            EditorMode::Create => "Cancel",
        };

        html! {
            form class="event event--edit" action="#" method="post" data-event-id=(event.id.as_str()) {
                header class="event__header" {
                    div class="event__type-wrapper" {
                        label class="event__type event__type-btn" for="event-type-toggle-1" {
                            span class="visually-hidden" { "Choose event type" }
                            img class="event__type-icon" width="17" height="17"
                                src=(format!("img/icons/{}.png", event.kind.slug())) alt="Event type icon";
                        }
                        input class="event__type-toggle visually-hidden" id="event-type-toggle-1" type="checkbox";
                        div class="event__type-list" {
                            fieldset class="event__type-group" {
                                legend class="visually-hidden" { "Event type" }
                                @for kind in EventType::ALL {
                                    div class="event__type-item" {
                                        input class="event__type-input visually-hidden"
                                            id=(format!("event-type-{}-1", kind.slug()))
                                            type="radio" name=(TYPE_INPUT) value=(kind.slug())
                                            checked[kind == event.kind];
                                        label class=(format!("event__type-label event__type-label--{}", kind.slug()))
                                            for=(format!("event-type-{}-1", kind.slug())) { (kind.as_str()) }
                                    }
                                }
                            }
                        }
                    }
                    div class="event__field-group event__field-group--destination" {
                        label class="event__label event__type-output" for="event-destination-1" { (event.kind.as_str()) }
                        input class="event__input event__input--destination" id="event-destination-1"
                            type="text" name=(DESTINATION_INPUT)
                            value=(event.destination.as_deref().unwrap_or_default())
                            list="destination-list-1";
                        datalist id="destination-list-1" {
                            @for known in &self.catalog.destinations {
                                option value=(known.name) {}
                            }
                        }
                    }
                    div class="event__field-group event__field-group--time" {
                        label class="visually-hidden" for="event-start-time-1" { "From" }
                        input class="event__input event__input--time" id="event-start-time-1"
                            type="text" name=(START_TIME_INPUT) value=(format_edit_time(event.date_from));
                        " - "
                        label class="visually-hidden" for="event-end-time-1" { "To" }
                        input class="event__input event__input--time" id="event-end-time-1"
                            type="text" name=(END_TIME_INPUT) value=(format_edit_time(event.date_to));
                    }
                    div class="event__field-group event__field-group--price" {
                        label class="event__label" for="event-price-1" {
                            span class="visually-hidden" { "Price" }
                            "€"
                        }
                        input class="event__input event__input--price" id="event-price-1"
                            type="text" name=(PRICE_INPUT) value=(event.base_price);
                    }
                    button class="event__save-btn btn btn--blue" type="submit" { "Save" }
                    button class="event__reset-btn" type="reset" { (reset_label) }
                    @if self.mode == EditorMode::Edit {
                        button class="event__rollup-btn" type="button" {
                            span class="visually-hidden" { "Close event" }
                        }
                    }
                }
                @if state.has_offers || destination.is_some() {
                    section class="event__details" {
                        @if state.has_offers {
                            section class="event__section event__section--offers" {
                                h3 class="event__section-title event__section-title--offers" { "Offers" }
                                div class="event__available-offers" {
                                    @for offer in offers {
                                        div class="event__offer-selector" {
                                            input class="event__offer-checkbox visually-hidden"
                                                id=(format!("{}{}-1", OFFER_INPUT_PREFIX, offer.id))
                                                type="checkbox"
                                                name=(format!("{}{}", OFFER_INPUT_PREFIX, offer.id))
                                                checked[event.has_offer(&offer.id)];
                                            label class="event__offer-label"
                                                for=(format!("{}{}-1", OFFER_INPUT_PREFIX, offer.id)) {
                                                span class="event__offer-title" { (offer.title) }
                                                " +€ "
                                                span class="event__offer-price" { (offer.price) }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        @if let Some(destination) = destination {
                            section class="event__section event__section--destination" {
                                h3 class="event__section-title event__section-title--destination" { "Destination" }
                                p class="event__destination-description" { (destination.description) }
                                @if !destination.pictures.is_empty() {
                                    div class="event__photos-container" {
                                        div class="event__photos-tape" {
                                            @for picture in &destination.pictures {
                                                img class="event__photo" src=(picture.src) alt=(picture.description);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn bindings(&self) -> Vec<Binding<Self>> {
        let mut bindings = vec![
            Binding::root(DomEventKind::Submit, Self::submit),
            Binding::root(DomEventKind::Reset, Self::reset),
            Binding::on(
                Selector::name(DESTINATION_INPUT),
                DomEventKind::Input,
                Self::destination_input,
            ),
            Binding::on(Selector::name(TYPE_INPUT), DomEventKind::Change, Self::type_change),
            Binding::on(
                Selector::name_prefix(OFFER_INPUT_PREFIX),
                DomEventKind::Change,
                Self::offer_toggle,
            ),
            Binding::on(Selector::name(PRICE_INPUT), DomEventKind::Input, Self::price_input),
            Binding::on(
                Selector::name(START_TIME_INPUT),
                DomEventKind::Change,
                Self::start_time_change,
            ),
            Binding::on(
                Selector::name(END_TIME_INPUT),
                DomEventKind::Change,
                Self::end_time_change,
            ),
        ];
        if self.mode == EditorMode::Edit {
            bindings.push(Binding::on(
                Selector::class("event__rollup-btn"),
                DomEventKind::Click,
                Self::rollup,
            ));
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::{offer_id_from_name, EditorMode, EventEditComponent};
    use crate::dom::{Dom, RenderPosition, Selector};
    use crate::model::catalog::{CatalogSnapshot, Destination, Picture};
    use crate::model::event::{Event, EventType, Offer};
    use crate::view::StatefulView;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    fn offer(id: &str, title: &str, price: u32) -> Offer {
        Offer {
            id: id.to_string(),
            title: title.to_string(),
            price,
        }
    }

    fn catalog() -> Rc<CatalogSnapshot> {
        let mut offers = BTreeMap::new();
        offers.insert(
            EventType::Taxi,
            vec![offer("luggage", "Add luggage", 30), offer("comfort", "Switch to comfort class", 100)],
        );
        offers.insert(EventType::Bus, vec![offer("seats", "Choose seats", 5)]);
        let destination = |name: &str| Destination {
            id: name.to_string(),
            name: name.to_string(),
            description: format!("About {name}"),
            pictures: vec![Picture {
                src: format!("https://example.test/{name}.jpg"),
                description: name.to_string(),
            }],
        };
        Rc::new(CatalogSnapshot {
            destinations: vec![destination("Amsterdam"), destination("Geneva")],
            offers,
        })
    }

    struct Harness {
        dom: Dom,
        view: StatefulView<EventEditComponent>,
        submitted: Rc<RefCell<Vec<Event>>>,
        reset: Rc<RefCell<Vec<Event>>>,
    }

    fn harness(event: &Event) -> Harness {
        let dom = Dom::new();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        let reset = Rc::new(RefCell::new(Vec::new()));
        let (submit_log, reset_log) = (Rc::clone(&submitted), Rc::clone(&reset));
        let component = EventEditComponent::new(
            EditorMode::Edit,
            catalog(),
            Rc::new(move |event| submit_log.borrow_mut().push(event)),
            Rc::new(move |event| reset_log.borrow_mut().push(event)),
            Rc::new(|| {}),
        );
        let state = component.initial_state(event);
        let view = StatefulView::new(&dom, component, state);
        view.mount(dom.body(), RenderPosition::BeforeEnd).unwrap();
        Harness {
            dom,
            view,
            submitted,
            reset,
        }
    }

    fn taxi() -> Event {
        let mut event = Event::blank(EventType::Taxi);
        event.destination = Some("Amsterdam".to_string());
        event.base_price = 30;
        event.offers.push(offer("luggage", "Add luggage", 30));
        event
    }

    impl Harness {
        fn control(&self, name: &str) -> crate::dom::NodeId {
            self.dom
                .query(self.view.element().unwrap(), &Selector::name(name))
                .unwrap()
        }
    }

    #[test]
    fn offer_names_map_to_catalog_ids() {
        assert_eq!(offer_id_from_name("event-offer-luggage"), Some("luggage".to_string()));
        assert_eq!(offer_id_from_name("event-price"), None);
    }

    #[test]
    fn silent_inputs_reach_the_submitted_entity() {
        let h = harness(&taxi());
        let before = h.view.render_count();

        h.dom.type_into(h.control("event-price"), "45").unwrap();
        h.dom.toggle(h.control("event-offer-comfort")).unwrap();
        h.dom.change_value(h.control("event-start-time"), "01/02/24 09:00").unwrap();
        h.dom.change_value(h.control("event-end-time"), "01/02/24 10:30").unwrap();
        h.dom.submit(h.view.element().unwrap()).unwrap();

        assert_eq!(h.view.render_count(), before);
        let submitted = h.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        let entity = &submitted[0];
        assert_eq!(entity.base_price, 45);
        let ids: Vec<_> = entity.offers.iter().map(|offer| offer.id.as_str()).collect();
        assert_eq!(ids, vec!["luggage", "comfort"]);
        assert_eq!(entity.total_price(), 175);
        assert!(entity.date_from.is_some() && entity.date_to > entity.date_from);
    }

    #[test]
    fn type_change_reconciles_and_clears_offers() {
        let h = harness(&taxi());
        let old_root = h.view.element().unwrap();

        let bus_radio = h
            .dom
            .with(|document| {
                document
                    .query_all(old_root, &Selector::name("event-type"))
                    .into_iter()
                    .find(|node| document.value(*node) == "bus")
            })
            .unwrap();
        h.dom.select_radio(bus_radio).unwrap();

        assert_ne!(h.view.element().unwrap(), old_root);
        let state = h.view.state();
        assert_eq!(state.event.kind, EventType::Bus);
        assert!(state.event.offers.is_empty());
        assert!(h
            .dom
            .query(h.view.element().unwrap(), &Selector::name("event-offer-seats"))
            .is_some());
    }

    #[test]
    fn unknown_destination_is_silent_and_stripped_on_submit() {
        let h = harness(&taxi());
        let before = h.view.render_count();

        h.dom.type_into(h.control("event-destination"), "Atlan").unwrap();
        assert_eq!(h.view.render_count(), before);

        h.dom.type_into(h.control("event-destination"), "Geneva").unwrap();
        assert_eq!(h.view.render_count(), before + 1);
        let description = h
            .dom
            .with(|document| {
                let root = h.view.element().unwrap();
                document
                    .query(root, &Selector::class("event__destination-description"))
                    .map(|node| document.text_content(node))
            })
            .unwrap();
        assert_eq!(description, "About Geneva");

        h.dom.type_into(h.control("event-destination"), "Nowhere").unwrap();
        h.dom.submit(h.view.element().unwrap()).unwrap();
        assert_eq!(h.submitted.borrow()[0].destination, None);
    }

    #[test]
    fn reset_hands_back_the_entity_and_invalid_range_blocks_submit() {
        let h = harness(&taxi());
        h.dom.change_value(h.control("event-start-time"), "02/02/24 12:00").unwrap();
        h.dom.change_value(h.control("event-end-time"), "02/02/24 11:00").unwrap();
        h.dom.submit(h.view.element().unwrap()).unwrap();
        assert!(h.submitted.borrow().is_empty());

        h.dom.reset(h.view.element().unwrap()).unwrap();
        assert_eq!(h.reset.borrow().len(), 1);
    }
}
