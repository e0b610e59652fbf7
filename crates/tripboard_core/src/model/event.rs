//! Trip event domain model.
//!
//! # Responsibility
//! - Define the client-side shape of one trip point (`Event`).
//! - Own the closed `EventType` enumeration and its wire spelling.
//!
//! # Invariants
//! - `id` is stable and never reassigned after creation.
//! - `date_to` is not earlier than `date_from` when both are set.
//! - Selected offers keep their catalog `id` so wire conversion is lossless.
//!
//! # See also
//! - `model::adapter` for how wire records map onto `Event`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, unique identifier of one trip event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates an id for an event created on the client.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Closed set of trip event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventType {
    /// Short ride, usually between a station and a hotel.
    Taxi,
    Bus,
    Train,
    /// Ferry or cruise leg.
    Ship,
    /// Self-driven or rented car.
    Drive,
    Flight,
    /// Hotel or apartment stay, spelled `Check-in`.
    CheckIn,
    Sightseeing,
    Restaurant,
}

impl EventType {
    /// Every type in display order.
    pub const ALL: [EventType; 9] = [
        EventType::Taxi,
        EventType::Bus,
        EventType::Train,
        EventType::Ship,
        EventType::Drive,
        EventType::Flight,
        EventType::CheckIn,
        EventType::Sightseeing,
        EventType::Restaurant,
    ];

    /// Canonical label, also used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Taxi => "Taxi",
            Self::Bus => "Bus",
            Self::Train => "Train",
            Self::Ship => "Ship",
            Self::Drive => "Drive",
            Self::Flight => "Flight",
            Self::CheckIn => "Check-in",
            Self::Sightseeing => "Sightseeing",
            Self::Restaurant => "Restaurant",
        }
    }

    /// Lowercase slug used for icons and element ids.
    pub fn slug(self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    /// Parses case-insensitively; `check-in` and `checkin` both map to `CheckIn`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized || kind.slug().replace('-', "") == normalized)
            .ok_or_else(|| UnknownEventType(value.to_string()))
    }
}

impl Serialize for EventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse error for unknown event type labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl Display for UnknownEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event type: `{}`", self.0)
    }
}

impl Error for UnknownEventType {}

/// One purchasable extra, as offered by the catalog for an event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Catalog identifier, kept for wire conversion.
    pub id: String,
    pub title: String,
    pub price: u32,
}

/// Client-side trip event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub date_from: Option<NaiveDateTime>,
    pub date_to: Option<NaiveDateTime>,
    pub base_price: u32,
    /// Destination name resolved against the catalog.
    pub destination: Option<String>,
    pub offers: Vec<Offer>,
    pub is_favorite: bool,
}

impl Event {
    /// Creates a blank event with a generated id, used by the creation form.
    pub fn blank(kind: EventType) -> Self {
        Self {
            id: EventId::generate(),
            kind,
            date_from: None,
            date_to: None,
            base_price: 0,
            destination: None,
            offers: Vec::new(),
            is_favorite: false,
        }
    }

    /// Checks the time-range invariant.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if to < from {
                return Err(EventValidationError::EndBeforeStart {
                    id: self.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Base price plus every selected offer.
    pub fn total_price(&self) -> u64 {
        u64::from(self.base_price)
            + self
                .offers
                .iter()
                .map(|offer| u64::from(offer.price))
                .sum::<u64>()
    }

    pub fn has_offer(&self, offer_id: &str) -> bool {
        self.offers.iter().any(|offer| offer.id == offer_id)
    }
}

/// Entity-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EndBeforeStart { id: EventId },
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndBeforeStart { id } => write!(f, "event {id} ends before it starts"),
        }
    }
}

impl Error for EventValidationError {}

#[cfg(test)]
mod tests {
    use super::{Event, EventId, EventType, EventValidationError, Offer};
    use chrono::NaiveDate;

    #[test]
    fn parses_types_case_insensitively() {
        assert_eq!("taxi".parse::<EventType>().unwrap(), EventType::Taxi);
        assert_eq!("Check-in".parse::<EventType>().unwrap(), EventType::CheckIn);
        assert_eq!("checkin".parse::<EventType>().unwrap(), EventType::CheckIn);
        assert!("rocket".parse::<EventType>().is_err());
    }

    #[test]
    fn validate_rejects_end_before_start() {
        let mut event = Event::blank(EventType::Bus);
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        event.date_from = day.and_hms_opt(12, 0, 0);
        event.date_to = day.and_hms_opt(11, 0, 0);

        let err = event.validate().expect_err("end before start must fail");
        assert_eq!(
            err,
            EventValidationError::EndBeforeStart {
                id: event.id.clone()
            }
        );
    }

    #[test]
    fn total_price_includes_selected_offers() {
        let mut event = Event::blank(EventType::Taxi);
        event.base_price = 20;
        event.offers.push(Offer {
            id: "luggage".to_string(),
            title: "Add luggage".to_string(),
            price: 30,
        });
        assert_eq!(event.total_price(), 50);
        assert!(event.has_offer("luggage"));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(EventId::generate(), EventId::generate());
    }
}
