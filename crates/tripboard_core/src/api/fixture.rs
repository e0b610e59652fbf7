//! In-process `TripApi` backed by fixture data.
//!
//! Used by the CLI smoke binary and by tests. Data can come from a JSON
//! document or from the built-in demo catalog.

use super::{
    RawDestination, RawEvent, RawOffer, RawOfferGroup, RawPicture, TransportError,
    TransportResult, TripApi,
};
use crate::model::event::EventType;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DEMO_PHOTO_SRC: &str = "https://loremflickr.com/248/152?random=";

/// Endpoint that a fixture is told to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Events,
    Destinations,
    Offers,
}

/// Serializable fixture payload, one list per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub destinations: Vec<RawDestination>,
    #[serde(default)]
    pub offers: Vec<RawOfferGroup>,
}

/// Fixture loading failure.
#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for FixtureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read fixture: {err}"),
            Self::Parse(err) => write!(f, "failed to parse fixture: {err}"),
        }
    }
}

impl Error for FixtureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for FixtureError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Fixture-backed transport.
#[derive(Debug, Clone, Default)]
pub struct FixtureApi {
    data: FixtureData,
    failure: Option<FailurePoint>,
}

impl FixtureApi {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data,
            failure: None,
        }
    }

    /// Makes one endpoint fail with a transport error.
    pub fn with_failure(mut self, point: FailurePoint) -> Self {
        self.failure = Some(point);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, FixtureError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Built-in catalog with a few sample events.
    pub fn demo() -> Self {
        Self::new(FixtureData {
            events: demo_events(),
            destinations: demo_destinations(),
            offers: demo_offers(),
        })
    }

    pub fn data(&self) -> &FixtureData {
        &self.data
    }

    fn check(&self, point: FailurePoint, endpoint: &'static str) -> TransportResult<()> {
        if self.failure == Some(point) {
            debug!("event=fixture_failure module=api endpoint={endpoint}");
            return Err(TransportError::new(endpoint, "injected fixture failure"));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl TripApi for FixtureApi {
    async fn events(&self) -> TransportResult<Vec<RawEvent>> {
        self.check(FailurePoint::Events, "events")?;
        Ok(self.data.events.clone())
    }

    async fn destinations(&self) -> TransportResult<Vec<RawDestination>> {
        self.check(FailurePoint::Destinations, "destinations")?;
        Ok(self.data.destinations.clone())
    }

    async fn offers(&self) -> TransportResult<Vec<RawOfferGroup>> {
        self.check(FailurePoint::Offers, "offers")?;
        Ok(self.data.offers.clone())
    }
}

fn offer(id: &str, title: &str, price: u32) -> RawOffer {
    RawOffer {
        id: id.to_string(),
        title: title.to_string(),
        price,
    }
}

/// Offer catalog of the demo data set.
pub fn demo_offers() -> Vec<RawOfferGroup> {
    let luggage = || offer("luggage", "Add luggage", 30);
    let comfort = || offer("comfort", "Switch to comfort class", 100);
    let seats = || offer("seats", "Choose seats", 5);
    let meal = || offer("meal", "Add meal", 15);

    EventType::ALL
        .into_iter()
        .map(|kind| {
            let offers = match kind {
                EventType::Taxi => vec![luggage(), comfort()],
                EventType::Bus | EventType::Train | EventType::Flight => {
                    vec![luggage(), comfort(), seats(), meal()]
                }
                EventType::Ship | EventType::CheckIn => vec![luggage(), comfort(), meal()],
                EventType::Drive => vec![comfort()],
                EventType::Sightseeing => vec![offer("train", "Travel by train", 40)],
                EventType::Restaurant => Vec::new(),
            };
            RawOfferGroup {
                kind: kind.as_str().to_string(),
                offers,
            }
        })
        .collect()
}

/// Destination catalog of the demo data set.
pub fn demo_destinations() -> Vec<RawDestination> {
    let destination = |name: &str, description: &str, photos: &[u32]| RawDestination {
        id: name.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        pictures: photos
            .iter()
            .map(|n| RawPicture {
                src: format!("{DEMO_PHOTO_SRC}{n}"),
                description: format!("{name} photo"),
            })
            .collect(),
    };

    vec![
        destination(
            "Amsterdam",
            "Canal boat tours and the old harbour districts.",
            &[1, 2, 3, 4],
        ),
        destination(
            "Geneva",
            "Lakeside promenades with a view of the Alps.",
            &[5, 6, 7, 8, 9],
        ),
        destination(
            "Chamonix",
            "Mountain town at the foot of Mont Blanc.",
            &[10, 11, 12],
        ),
    ]
}

fn demo_events() -> Vec<RawEvent> {
    vec![
        RawEvent {
            id: "1".to_string(),
            kind: "Taxi".to_string(),
            base_price: 30,
            date_from: Some("2024-01-01T10:00".to_string()),
            date_to: Some("2024-01-01T11:00".to_string()),
            is_favorite: false,
            destination: Some("Amsterdam".to_string()),
            offers: vec!["luggage".to_string()],
        },
        RawEvent {
            id: "2".to_string(),
            kind: "Flight".to_string(),
            base_price: 420,
            date_from: Some("2024-01-02T08:30".to_string()),
            date_to: Some("2024-01-02T10:15".to_string()),
            is_favorite: true,
            destination: Some("Geneva".to_string()),
            offers: vec!["seats".to_string(), "meal".to_string()],
        },
        RawEvent {
            id: "3".to_string(),
            kind: "Sightseeing".to_string(),
            base_price: 80,
            date_from: Some("2024-01-03T09:00".to_string()),
            date_to: Some("2024-01-04T18:00".to_string()),
            is_favorite: false,
            destination: Some("Chamonix".to_string()),
            offers: Vec::new(),
        },
    ]
}
