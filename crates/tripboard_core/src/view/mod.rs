//! Renderable views over the in-process DOM.
//!
//! # Responsibility
//! - Provide `StatefulView`, the self-reconciling render unit.
//! - Provide the concrete trip components (row, editor, list, message, summary).
//!
//! # Invariants
//! - Templates are pure functions of (state, catalog snapshot).
//! - Views never hold references into the model's canonical list.

pub mod event_edit;
pub mod event_row;
pub mod format;
pub mod list;
pub mod state;
pub mod stateful;
pub mod summary;

use crate::model::event::Event;
use std::rc::Rc;

pub use event_edit::{EditorMode, EventEditComponent};
pub use event_row::EventRowComponent;
pub use list::{EventListComponent, ListMessage, ListMessageComponent};
pub use state::{derive_view_flags, event_to_state, state_to_event, EditState, ViewFlags};
pub use stateful::{
    replace_view, Binding, StatefulView, Target, UpdateMode, ViewComponent, ViewError,
    ViewPhase, ViewResult, WeakView,
};
pub use summary::{TripSummary, TripSummaryComponent};

/// Intent callback without payload.
pub type Callback = Rc<dyn Fn()>;
/// Intent callback carrying the entity the view produced.
pub type EventCallback = Rc<dyn Fn(Event)>;
