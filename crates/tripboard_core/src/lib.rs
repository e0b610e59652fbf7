//! Core of the trip board: event model, notification bus and stateful views.
//! Views render into an in-process document so the whole UI flow runs headless.

pub mod api;
pub mod bus;
pub mod config;
pub mod dom;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod view;

pub use api::{FixtureApi, FixtureData, TransportError, TripApi};
pub use bus::{Notification, NotificationBus, Subscription, UpdateKind};
pub use config::{ConfigError, CoreConfig};
pub use dom::{Document, Dom, DomError, NodeId};
pub use logging::{
    default_log_level, init_logging, logging_status, LogSink, LoggingConfig, LoggingError,
};
pub use model::catalog::CatalogSnapshot;
pub use model::event::{Event, EventId, EventType, Offer};
pub use model::events_model::{EventsModel, InitOutcome, ModelError, ModelStatus};
pub use presenter::{PresenterError, TripPresenter, UserAction};
pub use view::{StatefulView, UpdateMode, ViewComponent};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
