//! Read-only reference catalogs (destinations and offers).
//!
//! # Responsibility
//! - Load reference data through the transport once per model initialization.
//! - Resolve destination ids/names and offer ids for the adapter.
//! - Produce immutable snapshots for view templates.
//!
//! # Invariants
//! - Catalogs are replaced wholesale on `init`; they are never edited in place.
//! - The core never mutates reference data after loading.

use crate::api::{RawDestination, RawOfferGroup, TransportResult, TripApi};
use crate::model::event::{EventType, Offer};
use log::{info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Destination photo reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub src: String,
    pub description: String,
}

/// Destination catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pictures: Vec<Picture>,
}

impl From<RawDestination> for Destination {
    fn from(value: RawDestination) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            pictures: value
                .pictures
                .into_iter()
                .map(|picture| Picture {
                    src: picture.src,
                    description: picture.description,
                })
                .collect(),
        }
    }
}

/// Catalog lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DestinationNotFound(String),
    OfferNotFound { kind: EventType, id: String },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DestinationNotFound(key) => write!(f, "destination not found: {key}"),
            Self::OfferNotFound { kind, id } => write!(f, "offer `{id}` not found for {kind}"),
        }
    }
}

impl Error for CatalogError {}

/// Destination reference-data provider.
pub struct DestinationsModel {
    api: Rc<dyn TripApi>,
    destinations: RefCell<Vec<Destination>>,
}

impl DestinationsModel {
    pub fn new(api: Rc<dyn TripApi>) -> Self {
        Self {
            api,
            destinations: RefCell::new(Vec::new()),
        }
    }

    /// Fetches and replaces the destination catalog.
    pub async fn init(&self) -> TransportResult<()> {
        let raw = self.api.destinations().await?;
        let loaded: Vec<Destination> = raw.into_iter().map(Destination::from).collect();
        info!(
            "event=catalog_load module=catalog status=ok kind=destinations count={}",
            loaded.len()
        );
        *self.destinations.borrow_mut() = loaded;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Destination, CatalogError> {
        self.destinations
            .borrow()
            .iter()
            .find(|destination| destination.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::DestinationNotFound(id.to_string()))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Destination, CatalogError> {
        self.destinations
            .borrow()
            .iter()
            .find(|destination| destination.name == name)
            .cloned()
            .ok_or_else(|| CatalogError::DestinationNotFound(name.to_string()))
    }

    pub fn all(&self) -> Vec<Destination> {
        self.destinations.borrow().clone()
    }
}

/// Offer reference-data provider.
pub struct OffersModel {
    api: Rc<dyn TripApi>,
    groups: RefCell<BTreeMap<EventType, Vec<Offer>>>,
}

impl OffersModel {
    pub fn new(api: Rc<dyn TripApi>) -> Self {
        Self {
            api,
            groups: RefCell::new(BTreeMap::new()),
        }
    }

    /// Fetches and replaces the offer catalog.
    ///
    /// Groups with an unknown type label are skipped.
    pub async fn init(&self) -> TransportResult<()> {
        let raw = self.api.offers().await?;
        let groups = group_offers(raw);
        info!(
            "event=catalog_load module=catalog status=ok kind=offers types={}",
            groups.len()
        );
        *self.groups.borrow_mut() = groups;
        Ok(())
    }

    /// Offer slice for one type; empty when the type has no offers.
    pub fn get_by_type(&self, kind: EventType) -> Vec<Offer> {
        self.groups
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, kind: EventType, id: &str) -> Result<Offer, CatalogError> {
        self.groups
            .borrow()
            .get(&kind)
            .and_then(|offers| offers.iter().find(|offer| offer.id == id))
            .cloned()
            .ok_or_else(|| CatalogError::OfferNotFound {
                kind,
                id: id.to_string(),
            })
    }

    pub fn all(&self) -> BTreeMap<EventType, Vec<Offer>> {
        self.groups.borrow().clone()
    }
}

fn group_offers(raw: Vec<RawOfferGroup>) -> BTreeMap<EventType, Vec<Offer>> {
    let mut groups = BTreeMap::new();
    for group in raw {
        let kind = match group.kind.parse::<EventType>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("event=catalog_load module=catalog status=skipped error={err}");
                continue;
            }
        };
        let offers = group
            .offers
            .into_iter()
            .map(|offer| Offer {
                id: offer.id,
                title: offer.title,
                price: offer.price,
            })
            .collect();
        groups.insert(kind, offers);
    }
    groups
}

/// Immutable copy of both catalogs handed to view templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub destinations: Vec<Destination>,
    pub offers: BTreeMap<EventType, Vec<Offer>>,
}

impl CatalogSnapshot {
    pub fn capture(destinations: &DestinationsModel, offers: &OffersModel) -> Self {
        Self {
            destinations: destinations.all(),
            offers: offers.all(),
        }
    }

    pub fn offers_for(&self, kind: EventType) -> &[Offer] {
        self.offers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn destination_by_name(&self, name: &str) -> Option<&Destination> {
        self.destinations
            .iter()
            .find(|destination| destination.name == name)
    }

    pub fn has_destination(&self, name: &str) -> bool {
        self.destination_by_name(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, CatalogSnapshot, DestinationsModel, OffersModel};
    use crate::api::FixtureApi;
    use crate::model::event::EventType;
    use std::rc::Rc;

    #[tokio::test]
    async fn resolves_destinations_by_id_and_name() {
        let api = Rc::new(FixtureApi::demo());
        let destinations = DestinationsModel::new(api);
        destinations.init().await.expect("init");

        assert_eq!(destinations.get_by_id("Geneva").unwrap().name, "Geneva");
        assert_eq!(
            destinations.get_by_name("Chamonix").unwrap().pictures.len(),
            3
        );
        assert_eq!(
            destinations.get_by_id("Paris").unwrap_err(),
            CatalogError::DestinationNotFound("Paris".to_string())
        );
    }

    #[tokio::test]
    async fn offers_slice_is_empty_for_types_without_offers() {
        let api = Rc::new(FixtureApi::demo());
        let offers = OffersModel::new(api);
        offers.init().await.expect("init");

        assert!(offers.get_by_type(EventType::Restaurant).is_empty());
        assert_eq!(offers.get_by_type(EventType::Bus).len(), 4);
        assert_eq!(offers.find(EventType::Taxi, "comfort").unwrap().price, 100);
        assert!(offers.find(EventType::Taxi, "meal").is_err());

        let snapshot = CatalogSnapshot {
            destinations: Vec::new(),
            offers: offers.all(),
        };
        assert_eq!(snapshot.offers_for(EventType::Drive).len(), 1);
    }
}
