//! Trip header with route, date span and total cost.
//!
//! The view follows the model on its own: it owns a bus subscription and
//! re-renders from the current snapshot on every notification.

use super::format::format_day;
use super::stateful::{StatefulView, ViewComponent};
use crate::bus::HandlerResult;
use crate::dom::Dom;
use crate::model::event::Event;
use crate::model::events_model::EventsModel;
use maud::{html, Markup};
use std::rc::Rc;

const MAX_ROUTE_STOPS: usize = 3;

/// Aggregates shown in the trip header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripSummary {
    pub route: String,
    pub dates: String,
    pub total: u64,
}

impl TripSummary {
    /// Summarizes events in chronological order; undated events sort last.
    pub fn from_events(events: &[Event]) -> Self {
        let mut ordered: Vec<&Event> = events.iter().collect();
        ordered.sort_by_key(|event| (event.date_from.is_none(), event.date_from));

        let mut stops: Vec<&str> = Vec::new();
        for name in ordered.iter().filter_map(|event| event.destination.as_deref()) {
            if stops.last() != Some(&name) {
                stops.push(name);
            }
        }
        let route = match stops.as_slice() {
            [] => String::new(),
            [first, .., last] if stops.len() > MAX_ROUTE_STOPS => format!("{first} - ... - {last}"),
            _ => stops.join(" - "),
        };

        let start = ordered.iter().filter_map(|event| event.date_from).min();
        let end = ordered.iter().filter_map(|event| event.date_to).max();
        let dates = match (start, end) {
            (Some(start), Some(end)) => format!("{} - {}", format_day(Some(start)), format_day(Some(end))),
            (Some(start), None) => format_day(Some(start)),
            _ => String::new(),
        };

        Self {
            route,
            dates,
            total: events.iter().map(Event::total_price).sum(),
        }
    }
}

pub struct TripSummaryComponent;

impl TripSummaryComponent {
    /// Builds the header view and keeps it in sync with `model`.
    pub fn attach(dom: &Dom, model: &Rc<EventsModel>) -> StatefulView<Self> {
        let view = StatefulView::new(dom, Self, TripSummary::from_events(&model.events()));
        let weak_view = view.downgrade();
        let weak_model = Rc::downgrade(model);
        let subscription = model.subscribe(move |_| -> HandlerResult {
            let (Some(view), Some(model)) = (weak_view.upgrade(), weak_model.upgrade()) else {
                return Ok(());
            };
            let summary = TripSummary::from_events(&model.events());
            view.update_element(|state| *state = summary)?;
            Ok(())
        });
        view.own_subscription(subscription);
        view
    }
}

impl ViewComponent for TripSummaryComponent {
    type State = TripSummary;

    fn name(&self) -> &'static str {
        "trip_summary"
    }

    fn template(&self, summary: &TripSummary) -> Markup {
        html! {
            section class="trip-main__trip-info trip-info" {
                div class="trip-info__main" {
                    h1 class="trip-info__title" { (summary.route) }
                    p class="trip-info__dates" { (summary.dates) }
                }
                p class="trip-info__cost" {
                    "Total: € " span class="trip-info__cost-value" { (summary.total) }
                }
            }
        }
    }
}
