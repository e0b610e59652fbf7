//! Presenters: route model notifications to views and user intents to the model.
//!
//! # Responsibility
//! - Decide which views to create, replace or destroy per notification.
//! - Translate view callbacks into `EventsModel` calls with an update kind.
//!
//! # Invariants
//! - A row-level notification touches only the affected row.
//! - At most one editor is open at a time.
//! - Presenters never hold a `RefCell` borrow across a call into the model,
//!   the bus or a view.
//!
//! # See also
//! - `view::stateful` for the render and handler lifecycle.

pub mod new_point;
pub mod point;
pub mod trip;

use crate::bus::UpdateKind;
use crate::model::event::Event;
use crate::model::events_model::ModelError;
use crate::view::ViewError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub use new_point::NewPointPresenter;
pub use point::{Mode, PointPresenter};
pub use trip::TripPresenter;

pub type PresenterResult<T> = Result<T, PresenterError>;

/// User intent produced by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    UpdateEvent,
    AddEvent,
    DeleteEvent,
}

impl UserAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateEvent => "update",
            Self::AddEvent => "add",
            Self::DeleteEvent => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterError {
    /// The model has not delivered its first `Init` yet.
    NotReady,
    Model(ModelError),
    View(ViewError),
}

impl Display for PresenterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "board is not initialized yet"),
            Self::Model(err) => write!(f, "{err}"),
            Self::View(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PresenterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotReady => None,
            Self::Model(err) => Some(err),
            Self::View(err) => Some(err),
        }
    }
}

impl From<ModelError> for PresenterError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<ViewError> for PresenterError {
    fn from(value: ViewError) -> Self {
        Self::View(value)
    }
}

/// Route from a view's intent back to the board.
pub type DataChange = Rc<dyn Fn(UserAction, UpdateKind, Event)>;
