//! Editor view state and the transient-flag derivation.
//!
//! # Invariants
//! - `derive_view_flags` is the only place the flags are computed.
//! - `state_to_event` never leaks flags or hidden sections into the entity.

use crate::model::catalog::CatalogSnapshot;
use crate::model::event::Event;

/// UI-only flags derived from an entity and the catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFlags {
    /// The destination resolves and its section is shown.
    pub has_destination: bool,
    /// The entity type has catalog offers and the offers section is shown.
    pub has_offers: bool,
}

pub fn derive_view_flags(event: &Event, catalog: &CatalogSnapshot) -> ViewFlags {
    ViewFlags {
        has_destination: event
            .destination
            .as_deref()
            .is_some_and(|name| catalog.has_destination(name)),
        has_offers: !catalog.offers_for(event.kind).is_empty(),
    }
}

/// Private state of one open editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    /// Structural copy of the edited entity.
    pub event: Event,
    pub has_destination: bool,
    pub has_offers: bool,
}

impl EditState {
    /// Recomputes flags after a field change.
    pub fn refresh_flags(&mut self, catalog: &CatalogSnapshot) {
        let flags = derive_view_flags(&self.event, catalog);
        self.has_destination = flags.has_destination;
        self.has_offers = flags.has_offers;
    }
}

pub fn event_to_state(event: &Event, catalog: &CatalogSnapshot) -> EditState {
    let flags = derive_view_flags(event, catalog);
    EditState {
        event: event.clone(),
        has_destination: flags.has_destination,
        has_offers: flags.has_offers,
    }
}

pub fn state_to_event(state: &EditState) -> Event {
    let mut event = state.event.clone();
    if !state.has_destination {
        event.destination = None;
    }
    if !state.has_offers {
        event.offers.clear();
    }
    event
}
