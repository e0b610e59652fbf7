//! Wire <-> client conversion for trip events.
//!
//! # Responsibility
//! - Rename wire fields and parse wire timestamps.
//! - Resolve destination and offer identifiers against the catalogs.
//! - Convert client events back to wire shape without losing identifiers.
//!
//! # Invariants
//! - Unknown identifiers are hard errors; nothing is silently dropped.
//! - `to_server(to_client(raw))` recovers the destination id and offer ids.

use crate::api::RawEvent;
use crate::model::catalog::{DestinationsModel, OffersModel};
use crate::model::event::{Event, EventId, EventType};
use chrono::{DateTime, NaiveDateTime, Timelike};
use std::error::Error;
use std::fmt::{Display, Formatter};

const WIRE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const WIRE_TIME_OUTPUT: &str = "%Y-%m-%dT%H:%M";
const WIRE_TIME_OUTPUT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const WIRE_TIME_OUTPUT_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Record-level adaptation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptError {
    UnknownType { id: String, value: String },
    UnknownDestination { id: String, destination: String },
    UnknownDestinationName { id: String, name: String },
    UnknownOffer { id: String, kind: EventType, offer: String },
    InvalidTime { id: String, field: &'static str, value: String },
    InvalidTimeRange { id: String },
    DuplicateId(EventId),
}

impl Display for AdaptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType { id, value } => write!(f, "event {id}: unknown type `{value}`"),
            Self::UnknownDestination { id, destination } => {
                write!(f, "event {id}: unknown destination id `{destination}`")
            }
            Self::UnknownDestinationName { id, name } => {
                write!(f, "event {id}: unknown destination name `{name}`")
            }
            Self::UnknownOffer { id, kind, offer } => {
                write!(f, "event {id}: unknown offer `{offer}` for {kind}")
            }
            Self::InvalidTime { id, field, value } => {
                write!(f, "event {id}: invalid `{field}` value `{value}`")
            }
            Self::InvalidTimeRange { id } => write!(f, "event {id}: date_to is before date_from"),
            Self::DuplicateId(id) => write!(f, "duplicate event id: {id}"),
        }
    }
}

impl Error for AdaptError {}

/// Converts records using the loaded reference catalogs.
pub struct EventAdapter<'a> {
    destinations: &'a DestinationsModel,
    offers: &'a OffersModel,
}

impl<'a> EventAdapter<'a> {
    pub fn new(destinations: &'a DestinationsModel, offers: &'a OffersModel) -> Self {
        Self {
            destinations,
            offers,
        }
    }

    /// Adapts one wire record to client form.
    pub fn to_client(&self, raw: &RawEvent) -> Result<Event, AdaptError> {
        let kind = raw
            .kind
            .parse::<EventType>()
            .map_err(|_| AdaptError::UnknownType {
                id: raw.id.clone(),
                value: raw.kind.clone(),
            })?;

        let destination = match raw.destination.as_deref() {
            None => None,
            Some(destination_id) => Some(
                self.destinations
                    .get_by_id(destination_id)
                    .map_err(|_| AdaptError::UnknownDestination {
                        id: raw.id.clone(),
                        destination: destination_id.to_string(),
                    })?
                    .name,
            ),
        };

        let offers = raw
            .offers
            .iter()
            .map(|offer_id| {
                self.offers
                    .find(kind, offer_id)
                    .map_err(|_| AdaptError::UnknownOffer {
                        id: raw.id.clone(),
                        kind,
                        offer: offer_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let event = Event {
            id: EventId::new(raw.id.as_str()),
            kind,
            date_from: parse_wire_time(&raw.id, "date_from", raw.date_from.as_deref())?,
            date_to: parse_wire_time(&raw.id, "date_to", raw.date_to.as_deref())?,
            base_price: raw.base_price,
            destination,
            offers,
            is_favorite: raw.is_favorite,
        };
        event
            .validate()
            .map_err(|_| AdaptError::InvalidTimeRange { id: raw.id.clone() })?;
        Ok(event)
    }

    /// Adapts a batch; the first failing record fails the whole batch.
    pub fn to_client_all(&self, raw: &[RawEvent]) -> Result<Vec<Event>, AdaptError> {
        let mut events = Vec::with_capacity(raw.len());
        for record in raw {
            let event = self.to_client(record)?;
            if events.iter().any(|existing: &Event| existing.id == event.id) {
                return Err(AdaptError::DuplicateId(event.id));
            }
            events.push(event);
        }
        Ok(events)
    }

    /// Converts a client event back to wire shape.
    pub fn to_server(&self, event: &Event) -> Result<RawEvent, AdaptError> {
        let destination = match event.destination.as_deref() {
            None => None,
            Some(name) => Some(
                self.destinations
                    .get_by_name(name)
                    .map_err(|_| AdaptError::UnknownDestinationName {
                        id: event.id.to_string(),
                        name: name.to_string(),
                    })?
                    .id,
            ),
        };

        Ok(RawEvent {
            id: event.id.to_string(),
            kind: event.kind.as_str().to_string(),
            base_price: event.base_price,
            date_from: event.date_from.map(format_wire_time),
            date_to: event.date_to.map(format_wire_time),
            is_favorite: event.is_favorite,
            destination,
            offers: event.offers.iter().map(|offer| offer.id.clone()).collect(),
        })
    }
}

fn parse_wire_time(
    id: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, AdaptError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(with_offset.naive_utc()));
    }
    WIRE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(Some)
        .ok_or_else(|| AdaptError::InvalidTime {
            id: id.to_string(),
            field,
            value: value.to_string(),
        })
}

/// Shortest wire form that keeps every stored digit.
///
/// Times are held as UTC wall clock, so an RFC 3339 input such as
/// `2024-01-01T12:00:00.500+02:00` comes back as `2024-01-01T10:00:00.500`;
/// the offset itself is not kept.
fn format_wire_time(value: NaiveDateTime) -> String {
    let format = if value.nanosecond() != 0 {
        WIRE_TIME_OUTPUT_FRACTION
    } else if value.second() != 0 {
        WIRE_TIME_OUTPUT_SECONDS
    } else {
        WIRE_TIME_OUTPUT
    };
    value.format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_wire_time, parse_wire_time, AdaptError};
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn parses_minute_precision_and_rfc3339() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0);
        assert_eq!(
            parse_wire_time("1", "date_from", Some("2024-01-01T10:00")).unwrap(),
            expected
        );
        assert_eq!(
            parse_wire_time("1", "date_from", Some("2024-01-01T10:00:00.000Z")).unwrap(),
            expected
        );
        assert_eq!(parse_wire_time("1", "date_from", None).unwrap(), None);
    }

    #[test]
    fn rejects_garbage_time() {
        let err = parse_wire_time("9", "date_to", Some("tomorrow")).unwrap_err();
        assert!(matches!(
            err,
            AdaptError::InvalidTime {
                field: "date_to",
                ..
            }
        ));
    }

    #[test]
    fn formats_without_seconds_when_possible() {
        let value = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 0)
            .unwrap();
        assert_eq!(format_wire_time(value), "2024-05-06T07:08");
        let with_seconds = value.with_second(9).unwrap();
        assert_eq!(format_wire_time(with_seconds), "2024-05-06T07:08:09");
    }

    #[test]
    fn fractional_seconds_survive_the_way_back() {
        let parsed = parse_wire_time("1", "date_from", Some("2024-01-01T10:00:00.500Z"))
            .unwrap()
            .unwrap();
        assert_eq!(format_wire_time(parsed), "2024-01-01T10:00:00.500");

        let shifted = parse_wire_time("1", "date_to", Some("2024-01-01T12:30:00+02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(format_wire_time(shifted), "2024-01-01T10:30");
    }
}
