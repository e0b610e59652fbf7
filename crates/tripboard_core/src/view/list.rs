//! List container and list status message.

use super::stateful::ViewComponent;
use maud::{html, Markup};

/// `ul` that rows and editors are mounted into.
pub struct EventListComponent;

impl ViewComponent for EventListComponent {
    type State = ();

    fn name(&self) -> &'static str {
        "event_list"
    }

    fn template(&self, _state: &()) -> Markup {
        html! {
            ul class="trip-events__list" {}
        }
    }
}

/// Status shown instead of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMessage {
    Loading,
    Empty,
}

impl ListMessage {
    pub fn text(self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::Empty => "Click New Event to create your first point",
        }
    }
}

pub struct ListMessageComponent;

impl ViewComponent for ListMessageComponent {
    type State = ListMessage;

    fn name(&self) -> &'static str {
        "list_message"
    }

    fn template(&self, message: &ListMessage) -> Markup {
        html! {
            p class="trip-events__msg" { (message.text()) }
        }
    }
}
