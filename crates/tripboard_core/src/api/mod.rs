//! Remote transport contract and wire records.
//!
//! # Responsibility
//! - Define the asynchronous read contract the model loads data through.
//! - Define serde shapes for raw server records.
//!
//! # Invariants
//! - Transport failures are opaque to the model; it never inspects them.
//! - Wire records are never shown to views; the adapter converts them first.
//!
//! # See also
//! - `api::fixture` for the in-process implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod fixture;

pub use fixture::{FailurePoint, FixtureApi, FixtureData};

pub type TransportResult<T> = Result<T, TransportError>;

/// Opaque transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Endpoint that failed, e.g. `events`.
    pub endpoint: &'static str,
    pub message: String,
}

impl TransportError {
    pub fn new(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self {
            endpoint,
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport `{}` failed: {}", self.endpoint, self.message)
    }
}

impl Error for TransportError {}

/// Raw trip event as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub base_price: u32,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub is_favorite: bool,
    /// Destination identifier.
    pub destination: Option<String>,
    /// Offer identifiers for this event's type.
    #[serde(default)]
    pub offers: Vec<String>,
}

/// Raw destination picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPicture {
    pub src: String,
    #[serde(default)]
    pub description: String,
}

/// Raw destination catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDestination {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pictures: Vec<RawPicture>,
}

/// Raw offer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOffer {
    pub id: String,
    pub title: String,
    pub price: u32,
}

/// Raw offers for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOfferGroup {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub offers: Vec<RawOffer>,
}

/// Asynchronous read contract of the remote trip service.
///
/// The UI layer is single-threaded, so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait TripApi {
    async fn events(&self) -> TransportResult<Vec<RawEvent>>;
    async fn destinations(&self) -> TransportResult<Vec<RawDestination>>;
    async fn offers(&self) -> TransportResult<Vec<RawOfferGroup>>;
}
