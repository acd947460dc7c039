//! Product price comparison
//!
//! Turns the raw observation history for one product into a ranked,
//! explainable per-store summary: latest price, average price, sample
//! count and a cheap/normal/dear badge per store, plus the maximum
//! possible saving across stores.

use std::{collections::hash_map::Entry, fmt};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};

use crate::{
    percent::{percent_points, percent_points_minor},
    prices::{PriceRepository, store_key},
    products::ProductId,
    thresholds::Thresholds,
};

/// How a store's latest price sits against its own historical average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBadge {
    /// Latest price is materially below the store's average.
    Barato,
    /// Latest price is in line with the store's average.
    Normal,
    /// Latest price is materially above the store's average.
    Caro,
}

impl fmt::Display for TrendBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Barato => "barato",
            Self::Normal => "normal",
            Self::Caro => "caro",
        })
    }
}

/// Per-store summary for one product, derived fresh on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary<'a> {
    /// Store label, first-seen spelling
    pub store: String,

    /// Most recent observed price at this store
    pub latest_price: Money<'a, Currency>,

    /// Mean of all observed prices at this store, in minor units
    pub avg_price: Decimal,

    /// Number of observations behind the average
    pub data_points: usize,

    /// Latest vs average, in rounded percent points
    pub delta_vs_avg_percent: i32,

    /// Badge derived from `delta_vs_avg_percent`
    pub badge: TrendBadge,

    /// 1-based position in the ranking; rank 1 is cheapest
    pub rank: usize,
}

/// Ranked per-store comparison for a single product.
#[derive(Debug, Clone)]
pub struct ProductComparison<'a> {
    product: ProductId,
    summaries: Vec<StoreSummary<'a>>,
    currency: &'static Currency,
}

impl<'a> ProductComparison<'a> {
    /// Builds the comparison for a product, or `None` when no store has
    /// any observation for it.
    ///
    /// Stores are ranked ascending by latest price; ties are broken
    /// alphabetically by store label.
    #[must_use]
    pub fn for_product(
        repository: &impl PriceRepository<'a>,
        product_name: &str,
        thresholds: &Thresholds,
    ) -> Option<Self> {
        let product = ProductId::new(product_name);

        let mut per_store: FxHashMap<String, StoreAccumulator<'a>> = FxHashMap::default();

        for observation in repository.observations_for(&product) {
            match per_store.entry(store_key(&observation.store)) {
                Entry::Occupied(mut slot) => {
                    slot.get_mut().push(observation.price, observation.observed_at);
                }
                Entry::Vacant(slot) => {
                    slot.insert(StoreAccumulator::first(
                        observation.store.clone(),
                        observation.price,
                        observation.observed_at,
                    ));
                }
            }
        }

        if per_store.is_empty() {
            return None;
        }

        let mut summaries: Vec<StoreSummary<'a>> = per_store
            .into_values()
            .map(|accumulator| accumulator.into_summary(thresholds))
            .collect();

        summaries.sort_by_cached_key(|summary| {
            (summary.latest_price.to_minor_units(), store_key(&summary.store))
        });

        for (index, summary) in summaries.iter_mut().enumerate() {
            summary.rank = index + 1;
        }

        Some(Self {
            product,
            summaries,
            currency: repository.currency(),
        })
    }

    /// Product the comparison is for.
    #[must_use]
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Ranked summaries, cheapest first.
    #[must_use]
    pub fn summaries(&self) -> &[StoreSummary<'a>] {
        &self.summaries
    }

    /// Cheapest store by latest price.
    #[must_use]
    pub fn cheapest(&self) -> Option<&StoreSummary<'a>> {
        self.summaries.first()
    }

    /// Dearest store by latest price.
    #[must_use]
    pub fn dearest(&self) -> Option<&StoreSummary<'a>> {
        self.summaries.last()
    }

    /// Maximum possible saving: dearest latest price minus cheapest
    /// latest price.
    ///
    /// `None` when fewer than two stores have data, since a single store
    /// has nothing to compare against.
    #[must_use]
    pub fn max_saving(&self) -> Option<Money<'a, Currency>> {
        if self.summaries.len() < 2 {
            return None;
        }

        let cheapest = self.cheapest()?.latest_price.to_minor_units();
        let dearest = self.dearest()?.latest_price.to_minor_units();

        Some(Money::from_minor(dearest - cheapest, self.currency))
    }

    /// [`Self::max_saving`] as rounded percent points of the dearest
    /// store's latest price.
    #[must_use]
    pub fn max_saving_percent(&self) -> Option<i32> {
        let saving = self.max_saving()?.to_minor_units();
        let dearest = self.dearest()?.latest_price.to_minor_units();

        Some(percent_points_minor(saving, dearest))
    }
}

/// Running aggregate for one store while grouping observations.
#[derive(Debug)]
struct StoreAccumulator<'a> {
    label: String,
    latest: (DateTime<Utc>, Money<'a, Currency>),
    total_minor: i64,
    count: usize,
}

impl<'a> StoreAccumulator<'a> {
    fn first(label: String, price: Money<'a, Currency>, observed_at: DateTime<Utc>) -> Self {
        Self {
            label,
            latest: (observed_at, price),
            total_minor: price.to_minor_units(),
            count: 1,
        }
    }

    fn push(&mut self, price: Money<'a, Currency>, observed_at: DateTime<Utc>) {
        // Later-recorded observations win timestamp ties, as in the book.
        if observed_at >= self.latest.0 {
            self.latest = (observed_at, price);
        }

        self.total_minor += price.to_minor_units();
        self.count += 1;
    }

    fn into_summary(self, thresholds: &Thresholds) -> StoreSummary<'a> {
        let latest_price = self.latest.1;

        let avg_price = (Decimal::from(self.total_minor) / Decimal::from(self.count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let delta_vs_avg_percent = percent_points(
            Decimal::from(latest_price.to_minor_units()) - avg_price,
            avg_price,
        );

        let badge = if delta_vs_avg_percent <= -thresholds.badge_delta_percent {
            TrendBadge::Barato
        } else if delta_vs_avg_percent >= thresholds.badge_delta_percent {
            TrendBadge::Caro
        } else {
            TrendBadge::Normal
        };

        StoreSummary {
            store: self.label,
            latest_price,
            avg_price,
            data_points: self.count,
            delta_vs_avg_percent,
            badge,
            rank: 0,
        }
    }
}
