//! Owns the fetched asset and rate snapshots.
//!
//! Fetches may overlap (a new search fires before the previous one returns),
//! so every request gets a ticket and only the newest ticket of a collection
//! is allowed to touch its snapshot.

use crate::coincap::client::{AssetQuery, MarketSource};
use crate::coincap::error::MarketError;
use crate::coincap::model::{Asset, Rate};
use tracing::debug;
use tracing::instrument;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Absent,
    Loading,
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Assets,
    Rates,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: CollectionKind,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug)]
struct Collection<T> {
    kind: CollectionKind,
    items: Option<Vec<T>>,
    loading: bool,
    generation: u64,
}

impl<T> Collection<T> {
    fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: None,
            loading: false,
            generation: 0,
        }
    }

    fn availability(&self) -> Availability {
        match (self.loading, &self.items) {
            (true, _) => Availability::Loading,
            (false, Some(_)) => Availability::Ready,
            (false, None) => Availability::Absent,
        }
    }

    fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        self.loading = true;
        RequestTicket {
            kind: self.kind,
            generation: self.generation,
        }
    }

    fn complete(&mut self, ticket: RequestTicket, result: Result<Vec<T>, MarketError>) -> Completion {
        if ticket.kind != self.kind || ticket.generation != self.generation {
            debug!(
                "Dropping stale {:?} response #{} (latest is #{})",
                ticket.kind, ticket.generation, self.generation
            );
            return Completion::Stale;
        }

        self.loading = false;
        match result {
            Ok(items) => {
                debug!("Replacing {:?} snapshot with {} entries", self.kind, items.len());
                self.items = Some(items);
                Completion::Applied
            }
            Err(error) => {
                warn!(
                    "Failed to load {:?} (request #{}), keeping previous snapshot: {}",
                    self.kind, ticket.generation, error
                );
                Completion::Failed
            }
        }
    }
}

#[derive(Debug)]
pub struct ListingController {
    assets: Collection<Asset>,
    rates: Collection<Rate>,
}

impl Default for ListingController {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingController {
    pub fn new() -> Self {
        Self {
            assets: Collection::new(CollectionKind::Assets),
            rates: Collection::new(CollectionKind::Rates),
        }
    }

    pub fn assets(&self) -> Option<&[Asset]> {
        self.assets.items.as_deref()
    }

    pub fn rates(&self) -> Option<&[Rate]> {
        self.rates.items.as_deref()
    }

    pub fn assets_availability(&self) -> Availability {
        self.assets.availability()
    }

    pub fn rates_availability(&self) -> Availability {
        self.rates.availability()
    }

    pub fn begin_assets(&mut self) -> RequestTicket {
        self.assets.begin()
    }

    pub fn begin_rates(&mut self) -> RequestTicket {
        self.rates.begin()
    }

    pub fn complete_assets(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Asset>, MarketError>,
    ) -> Completion {
        self.assets.complete(ticket, result)
    }

    pub fn complete_rates(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Rate>, MarketError>,
    ) -> Completion {
        self.rates.complete(ticket, result)
    }

    #[instrument(skip(self, source))]
    pub async fn load_assets<S: MarketSource>(&mut self, source: &S, query: &AssetQuery) -> Completion {
        let ticket = self.begin_assets();
        let result = source.fetch_assets_list(query).await;
        self.complete_assets(ticket, result)
    }

    #[instrument(skip(self, source))]
    pub async fn load_rates<S: MarketSource>(&mut self, source: &S) -> Completion {
        let ticket = self.begin_rates();
        let result = source.fetch_rates_list().await;
        self.complete_rates(ticket, result)
    }

    /// Flips the current asset order in place. This is not a sort: a fresh
    /// fetch brings back the server order.
    pub fn reverse_order(&mut self) {
        if let Some(items) = self.assets.items.as_mut() {
            items.reverse();
        }
    }
}
