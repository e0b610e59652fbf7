//! Read-only trip point row.

use super::format::{format_day, format_duration, format_time};
use super::stateful::{Binding, StatefulView, ViewComponent};
use super::Callback;
use crate::dom::{DomEvent, DomEventKind, Selector};
use crate::model::event::Event;
use maud::{html, Markup};
use std::rc::Rc;

pub struct EventRowComponent {
    on_edit: Callback,
    on_favorite: Callback,
}

impl EventRowComponent {
    pub fn new(on_edit: Callback, on_favorite: Callback) -> Self {
        Self {
            on_edit,
            on_favorite,
        }
    }

    fn edit_click(view: &StatefulView<Self>, _event: &DomEvent) {
        let on_edit = Rc::clone(&view.component().on_edit);
        on_edit();
    }

    fn favorite_click(view: &StatefulView<Self>, _event: &DomEvent) {
        let on_favorite = Rc::clone(&view.component().on_favorite);
        on_favorite();
    }
}

impl ViewComponent for EventRowComponent {
    type State = Event;

    fn name(&self) -> &'static str {
        "event_row"
    }

    fn template(&self, event: &Event) -> Markup {
        let favorite_class = if event.is_favorite {
            "event__favorite-btn event__favorite-btn--active"
        } else {
            "event__favorite-btn"
        };
        let datetime = event
            .date_from
            .map(|value| value.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        html! {
            li class="trip-events__item" data-event-id=(event.id.as_str()) {
                div class="event" {
                    time class="event__date" datetime=(datetime) { (format_day(event.date_from)) }
                    div class="event__type" {
                        img class="event__type-icon" width="42" height="42"
                            src=(format!("img/icons/{}.png", event.kind.slug())) alt="Event type icon";
                    }
                    h3 class="event__title" {
                        (event.kind.as_str()) " " (event.destination.as_deref().unwrap_or_default())
                    }
                    div class="event__schedule" {
                        p class="event__time" {
                            time class="event__start-time" { (format_time(event.date_from)) }
                            " - "
                            time class="event__end-time" { (format_time(event.date_to)) }
                        }
                        p class="event__duration" { (format_duration(event.date_from, event.date_to)) }
                    }
                    p class="event__price" {
                        "€ " span class="event__price-value" { (event.base_price) }
                    }
                    h4 class="visually-hidden" { "Offers:" }
                    ul class="event__selected-offers" {
                        @for offer in &event.offers {
                            li class="event__offer" {
                                span class="event__offer-title" { (offer.title) }
                                " +€ "
                                span class="event__offer-price" { (offer.price) }
                            }
                        }
                    }
                    button class=(favorite_class) type="button" {
                        span class="visually-hidden" { "Add to favorite" }
                    }
                    button class="event__rollup-btn" type="button" {
                        span class="visually-hidden" { "Open event" }
                    }
                }
            }
        }
    }

    fn bindings(&self) -> Vec<Binding<Self>> {
        vec![
            Binding::on(
                Selector::class("event__rollup-btn"),
                DomEventKind::Click,
                Self::edit_click,
            ),
            Binding::on(
                Selector::class("event__favorite-btn"),
                DomEventKind::Click,
                Self::favorite_click,
            ),
        ]
    }
}
