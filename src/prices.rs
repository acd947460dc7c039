//! Prices
//!
//! Append-only price observations and the price book that answers lookup
//! queries over them. The optimizer and comparator only ever see the
//! [`PriceRepository`] contract, never a concrete storage mechanism.

use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::products::ProductId;

/// Errors raised at the price book boundary.
#[derive(Debug, Error, PartialEq)]
pub enum PriceBookError {
    /// A recorded price must be strictly positive.
    #[error("price for {product} must be positive, got {minor_units} minor units")]
    NonPositivePrice {
        /// Product the observation was for
        product: ProductId,
        /// Offending amount in minor units
        minor_units: i64,
    },

    /// An observation's currency differs from the book currency.
    #[error("observation has currency {0}, but price book has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),
}

/// A single historical price observation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation<'a> {
    /// Stable product identity, derived from the product name
    pub product: ProductId,

    /// Product name as originally entered
    pub product_name: String,

    /// Free-text store label
    pub store: String,

    /// Observed unit price
    pub price: Money<'a, Currency>,

    /// When the price was observed
    pub observed_at: DateTime<Utc>,
}

impl<'a> PriceObservation<'a> {
    /// Creates an observation, deriving the product identity from the name.
    #[must_use]
    pub fn new(
        product_name: impl Into<String>,
        store: impl Into<String>,
        price: Money<'a, Currency>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let product_name = product_name.into();

        Self {
            product: ProductId::new(&product_name),
            product_name,
            store: store.into(),
            price,
            observed_at,
        }
    }
}

/// One store's effective price for a product: the most recent observation
/// for that `(product, store)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint<'a> {
    /// Store label, in its first-seen spelling
    pub store: String,

    /// Most recently observed unit price at this store
    pub price: Money<'a, Currency>,

    /// When that price was observed
    pub observed_at: DateTime<Utc>,
}

/// Case-insensitive identity for free-text store labels.
pub(crate) fn store_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Synchronous read/write contract for price history storage.
///
/// The comparator and optimizer depend only on this trait, so the backing
/// store can be swapped (in-memory, file, database) without touching the
/// algorithms.
pub trait PriceRepository<'a> {
    /// Currency every price in this repository is denominated in.
    fn currency(&self) -> &'static Currency;

    /// Appends an observation.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceBookError`] if the price is not strictly positive
    /// or its currency differs from the repository currency.
    fn record(&mut self, observation: PriceObservation<'a>) -> Result<(), PriceBookError>;

    /// All observations recorded for the product, in no guaranteed order.
    fn observations_for(&self, product: &ProductId) -> &[PriceObservation<'a>];

    /// Effective price per store for the product: the latest observation
    /// for each store, sorted alphabetically by store label.
    ///
    /// Stores are identified case-insensitively; the first-seen spelling
    /// of the label is kept for display.
    fn effective_prices(&self, product: &ProductId) -> Vec<PricePoint<'a>> {
        let mut latest: FxHashMap<String, (String, &PriceObservation<'a>)> = FxHashMap::default();

        for observation in self.observations_for(product) {
            match latest.entry(store_key(&observation.store)) {
                Entry::Occupied(mut slot) => {
                    // Later-recorded observations win timestamp ties.
                    if observation.observed_at >= slot.get().1.observed_at {
                        slot.get_mut().1 = observation;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert((observation.store.clone(), observation));
                }
            }
        }

        let mut points: Vec<PricePoint<'a>> = latest
            .into_values()
            .map(|(label, observation)| PricePoint {
                store: label,
                price: observation.price,
                observed_at: observation.observed_at,
            })
            .collect();

        points.sort_by_cached_key(|point| store_key(&point.store));
        points
    }

    /// The cheapest effective price currently known for the product, or
    /// `None` when nothing is recorded.
    ///
    /// Ties are broken alphabetically by store label.
    fn cheapest_option(&self, product: &ProductId) -> Option<PricePoint<'a>> {
        // `effective_prices` is alphabetical and `min_by_key` keeps the
        // first of equal elements, so the tie-break falls out of the sort.
        self.effective_prices(product)
            .into_iter()
            .min_by_key(|point| point.price.to_minor_units())
    }
}

/// In-memory, append-only price book.
#[derive(Debug)]
pub struct PriceBook<'a> {
    observations: FxHashMap<ProductId, Vec<PriceObservation<'a>>>,
    currency: &'static Currency,
}

impl<'a> PriceBook<'a> {
    /// Creates an empty price book denominated in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            observations: FxHashMap::default(),
            currency,
        }
    }

    /// Number of products with at least one observation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the book has no observations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl<'a> PriceRepository<'a> for PriceBook<'a> {
    fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn record(&mut self, observation: PriceObservation<'a>) -> Result<(), PriceBookError> {
        let minor_units = observation.price.to_minor_units();

        if minor_units <= 0 {
            return Err(PriceBookError::NonPositivePrice {
                product: observation.product.clone(),
                minor_units,
            });
        }

        let observed_currency = observation.price.currency();

        if observed_currency != self.currency {
            return Err(PriceBookError::CurrencyMismatch(
                observed_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        self.observations
            .entry(observation.product.clone())
            .or_default()
            .push(observation);

        Ok(())
    }

    fn observations_for(&self, product: &ProductId) -> &[PriceObservation<'a>] {
        self.observations.get(product).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rusty_money::iso::{ARS, USD};
    use testresult::TestResult;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single().unwrap_or_default()
    }

    fn milk(store: &str, minor: i64, day: u32) -> PriceObservation<'static> {
        PriceObservation::new("Leche Entera", store, Money::from_minor(minor, ARS), at(day))
    }

    #[test]
    fn record_groups_by_normalized_product() -> TestResult {
        let mut book = PriceBook::new(ARS);

        book.record(milk("Coto", 500, 1))?;
        book.record(PriceObservation::new(
            "  leche   entera ",
            "Dia",
            Money::from_minor(450, ARS),
            at(2),
        ))?;

        let product = ProductId::new("Leche Entera");
        assert_eq!(book.observations_for(&product).len(), 2);
        assert_eq!(book.len(), 1);

        Ok(())
    }

    #[test]
    fn record_rejects_non_positive_price() {
        let mut book = PriceBook::new(ARS);

        let err = book.record(milk("Coto", 0, 1));

        assert!(matches!(
            err,
            Err(PriceBookError::NonPositivePrice { minor_units: 0, .. })
        ));
    }

    #[test]
    fn record_rejects_currency_mismatch() {
        let mut book = PriceBook::new(ARS);

        let err = book.record(PriceObservation::new(
            "Leche Entera",
            "Coto",
            Money::from_minor(500, USD),
            at(1),
        ));

        assert_eq!(
            err,
            Err(PriceBookError::CurrencyMismatch(
                USD.iso_alpha_code,
                ARS.iso_alpha_code
            ))
        );
    }

    #[test]
    fn effective_prices_take_latest_per_store() -> TestResult {
        let mut book = PriceBook::new(ARS);

        book.record(milk("Coto", 500, 1))?;
        book.record(milk("coto", 520, 5))?;
        book.record(milk("Dia", 480, 3))?;

        let points = book.effective_prices(&ProductId::new("leche entera"));

        assert_eq!(points.len(), 2);
        let prices: Vec<(String, i64)> = points
            .iter()
            .map(|p| (p.store.clone(), p.price.to_minor_units()))
            .collect();
        assert_eq!(prices, vec![("Coto".into(), 520), ("Dia".into(), 480)]);

        Ok(())
    }

    #[test]
    fn cheapest_option_prefers_lowest_then_alphabetical() -> TestResult {
        let mut book = PriceBook::new(ARS);

        book.record(milk("Vea", 450, 1))?;
        book.record(milk("Dia", 450, 1))?;
        book.record(milk("Coto", 500, 1))?;

        let cheapest = book
            .cheapest_option(&ProductId::new("Leche Entera"))
            .ok_or("expected a cheapest option")?;

        assert_eq!(cheapest.store, "Dia");
        assert_eq!(cheapest.price, Money::from_minor(450, ARS));

        Ok(())
    }

    #[test]
    fn cheapest_option_without_observations_is_none() {
        let book = PriceBook::new(ARS);

        assert_eq!(book.cheapest_option(&ProductId::new("Yerba")), None);
    }
}
