//! Trip domain model.
//!
//! # Responsibility
//! - Define the client-side event entity and the reference catalogs.
//! - Own the canonical event list and the wire adapter feeding it.
//!
//! # Invariants
//! - `EventsModel` is the only writer of the canonical list.
//! - Views receive structural copies, never references into the list.
//!
//! # See also
//! - `api` for the transport the model loads through.

pub mod adapter;
pub mod catalog;
pub mod event;
pub mod events_model;
