//! Cart optimizer
//!
//! Given a cart snapshot and the price history, decides the cheapest way
//! to acquire everything and explains the decision: a per-store ranking,
//! the best single-store option, the best per-item split across stores,
//! and which of the two strategies is worth recommending.
//!
//! The whole computation is a single synchronous pass over immutable
//! snapshots. Missing or partial price data is never an error; it
//! degrades to [`OptimizationResult::has_enough_data`] being `false` or
//! to entries in [`OptimizationResult::missing_products`].

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    cart::CartItem,
    percent::percent_points_minor,
    prices::{PricePoint, PriceRepository, store_key},
    thresholds::Thresholds,
};

pub mod report;

/// Errors raised by the optimizer.
///
/// Only invariant violations are fatal; insufficient data is an expected
/// outcome reported through the result itself.
#[derive(Debug, Error, PartialEq)]
pub enum OptimizerError {
    /// A cart item reached the optimizer with quantity 0. The cart model
    /// never stores such entries, so this is a bug upstream.
    #[error("cart item {product} has quantity 0")]
    NonPositiveQuantity {
        /// Offending product name
        product: String,
    },

    /// A non-positive effective price reached the optimizer. The price
    /// book rejects these at its boundary, so this is a bug upstream.
    #[error("price for {product} at {store} is not positive")]
    NonPositivePrice {
        /// Offending product name
        product: String,
        /// Store the price was observed at
        store: String,
    },
}

/// Position badge for a ranked store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBadge {
    /// Rank 1: the cheapest single-store candidate.
    Cheapest,
    /// Neither cheapest nor flagged dearest.
    Mid,
    /// Last rank, only assigned when more than two stores are ranked.
    Expensive,
}

impl fmt::Display for RankBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cheapest => "cheapest",
            Self::Mid => "mid",
            Self::Expensive => "expensive",
        })
    }
}

/// One store's entry in the cart-total ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRanking<'a> {
    /// Store label, first-seen spelling
    pub store: String,

    /// Cart total at this store, over the priced items it carries
    pub total: Money<'a, Currency>,

    /// Number of priced cart items this store has a price for
    pub items_found: usize,

    /// Display names of priced cart items this store lacks
    pub items_missing: SmallVec<[String; 4]>,

    /// `items_found` over the number of priced items, in percent points
    pub coverage_percent: i32,

    /// 1-based position; rank 1 is cheapest
    pub rank: usize,

    /// How much dearer this store is than the best one
    pub difference_vs_best: Money<'a, Currency>,

    /// `difference_vs_best` relative to the best total, in percent points
    pub percent_more_vs_best: i32,

    /// Position badge
    pub badge: RankBadge,
}

/// One cart item assigned to a store in a shopping plan.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedItem<'a> {
    /// Display name of the product
    pub product_name: String,

    /// Desired quantity
    pub quantity: u32,

    /// Effective unit price at the assigned store
    pub unit_price: Money<'a, Currency>,

    /// `unit_price * quantity`
    pub line_total: Money<'a, Currency>,
}

/// A per-store shopping sub-list within a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreAllocation<'a> {
    /// Store to buy these items at
    pub store: String,

    /// Items assigned to this store
    pub items: Vec<AllocatedItem<'a>>,

    /// Sum of the assigned line totals
    pub subtotal: Money<'a, Currency>,
}

/// Option A: buy everything at the single best-ranked store.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleStoreOption<'a> {
    /// The best-ranked store
    pub store: String,

    /// Cart total there, over the priced items it carries
    pub total: Money<'a, Currency>,

    /// Share of priced items the store carries, in percent points
    pub coverage_percent: i32,

    /// Priced items the store has no price for
    pub items_missing: SmallVec<[String; 4]>,
}

/// Option B: buy each item wherever it is cheapest.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStoreOption<'a> {
    /// Per-store sub-lists, alphabetical by store
    pub allocations: Vec<StoreAllocation<'a>>,

    /// Sum across all sub-lists
    pub total: Money<'a, Currency>,
}

/// Which shopping strategy the optimizer recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Buy everything at the best single store.
    SingleStore,
    /// Split the shop across several stores.
    MultiStore,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SingleStore => "single_store",
            Self::MultiStore => "multi_store",
        })
    }
}

/// The chosen plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision<'a> {
    /// Winning strategy
    pub strategy: Strategy,

    /// The winning plan's per-store sub-lists
    pub allocations: Vec<StoreAllocation<'a>>,

    /// The winning plan's total
    pub total: Money<'a, Currency>,

    /// Spread between the worst ranked store's total and the chosen plan
    pub savings_vs_worst: Money<'a, Currency>,
}

/// The full two-option comparison. Only produced when at least two
/// stores survive the coverage filter; with one valid store there is
/// nothing to optimize against.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization<'a> {
    /// Option A: best single store
    pub single_store: SingleStoreOption<'a>,

    /// Option B: best per-item split
    pub multi_store: MultiStoreOption<'a>,

    /// Option A total minus Option B total, clamped at zero
    pub savings: Money<'a, Currency>,

    /// `savings` relative to Option A's total, in percent points
    pub savings_percent: i32,

    /// The recommended plan
    pub decision: Decision<'a>,
}

/// Immutable result of one optimizer invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult<'a> {
    has_enough_data: bool,
    missing_products: Vec<String>,
    ranking: Vec<StoreRanking<'a>>,
    optimization: Option<Optimization<'a>>,
    currency: &'static Currency,
}

impl<'a> OptimizationResult<'a> {
    fn insufficient(missing_products: Vec<String>, currency: &'static Currency) -> Self {
        Self {
            has_enough_data: false,
            missing_products,
            ranking: Vec::new(),
            optimization: None,
            currency,
        }
    }

    /// Whether enough price data existed to rank at least one store.
    #[must_use]
    pub fn has_enough_data(&self) -> bool {
        self.has_enough_data
    }

    /// Cart items with zero price observations, by display name. These
    /// are excluded from all monetary figures but remain in the cart.
    #[must_use]
    pub fn missing_products(&self) -> &[String] {
        &self.missing_products
    }

    /// Stores that passed the coverage filter, cheapest first.
    #[must_use]
    pub fn ranking(&self) -> &[StoreRanking<'a>] {
        &self.ranking
    }

    /// The two-option comparison, when at least two stores were ranked.
    #[must_use]
    pub fn optimization(&self) -> Option<&Optimization<'a>> {
        self.optimization.as_ref()
    }

    /// Currency of all monetary figures in this result.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// The optimizer itself: thresholds plus the single-pass algorithm.
#[derive(Debug, Clone, Default)]
pub struct CartOptimizer {
    thresholds: Thresholds,
}

/// A cart item together with its effective per-store prices.
#[derive(Debug)]
struct PricedItem<'a, 'c> {
    item: &'c CartItem,
    points: Vec<PricePoint<'a>>,
}

/// Per-store running totals while tallying the cart.
#[derive(Debug)]
struct StoreTally {
    label: String,
    total_minor: i64,
    found: FxHashSet<usize>,
}

impl CartOptimizer {
    /// Creates an optimizer with the given thresholds.
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in effect.
    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Runs the full ranking and allocation algorithm over a cart
    /// snapshot and the price repository.
    ///
    /// Deterministic: the same `(cart, prices)` snapshots always produce
    /// the same result. Ties are broken alphabetically by store label
    /// throughout.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizerError`] only for invariant violations
    /// (non-positive quantity or price reaching the core); missing data
    /// is reported through the result, never as an error.
    pub fn optimize<'a>(
        &self,
        cart: &[CartItem],
        prices: &impl PriceRepository<'a>,
    ) -> Result<OptimizationResult<'a>, OptimizerError> {
        let currency = prices.currency();

        let (priced, missing_products) = partition_priced(cart, prices)?;

        if priced.is_empty() {
            return Ok(OptimizationResult::insufficient(missing_products, currency));
        }

        let ranking = self.rank_stores(&priced, currency);

        if ranking.is_empty() {
            return Ok(OptimizationResult::insufficient(missing_products, currency));
        }

        let optimization = if ranking.len() < 2 {
            None
        } else {
            Some(self.compare_options(&priced, &ranking, currency))
        };

        Ok(OptimizationResult {
            has_enough_data: true,
            missing_products,
            ranking,
            optimization,
            currency,
        })
    }

    /// Steps 3-5: per-store totals, coverage filter, ranking.
    fn rank_stores<'a>(
        &self,
        priced: &[PricedItem<'a, '_>],
        currency: &'static Currency,
    ) -> Vec<StoreRanking<'a>> {
        let mut tallies: FxHashMap<String, StoreTally> = FxHashMap::default();

        for (index, priced_item) in priced.iter().enumerate() {
            let quantity = i64::from(priced_item.item.quantity);

            for point in &priced_item.points {
                let tally = tallies
                    .entry(store_key(&point.store))
                    .or_insert_with(|| StoreTally {
                        label: point.store.clone(),
                        total_minor: 0,
                        found: FxHashSet::default(),
                    });

                tally.total_minor += point.price.to_minor_units() * quantity;
                tally.found.insert(index);
            }
        }

        let mut survivors: Vec<StoreTally> = tallies
            .into_values()
            .filter(|tally| self.thresholds.covers(tally.found.len(), priced.len()))
            .collect();

        survivors.sort_by_cached_key(|tally| (tally.total_minor, store_key(&tally.label)));

        let best_total = survivors.first().map_or(0, |tally| tally.total_minor);
        let ranked_count = survivors.len();

        survivors
            .into_iter()
            .enumerate()
            .map(|(index, tally)| {
                let items_missing: SmallVec<[String; 4]> = priced
                    .iter()
                    .enumerate()
                    .filter(|(item_index, _)| !tally.found.contains(item_index))
                    .map(|(_, priced_item)| priced_item.item.product_name.clone())
                    .collect();

                let badge = if index == 0 {
                    RankBadge::Cheapest
                } else if ranked_count > 2 && index == ranked_count - 1 {
                    // A two-store comparison never flags the runner-up as
                    // expensive; that would overstate the spread.
                    RankBadge::Expensive
                } else {
                    RankBadge::Mid
                };

                StoreRanking {
                    store: tally.label,
                    total: Money::from_minor(tally.total_minor, currency),
                    items_found: tally.found.len(),
                    items_missing,
                    coverage_percent: percent_points_minor(
                        i64::try_from(tally.found.len()).unwrap_or(i64::MAX),
                        i64::try_from(priced.len()).unwrap_or(i64::MAX),
                    ),
                    rank: index + 1,
                    difference_vs_best: Money::from_minor(tally.total_minor - best_total, currency),
                    percent_more_vs_best: percent_points_minor(
                        tally.total_minor - best_total,
                        best_total,
                    ),
                    badge,
                }
            })
            .collect()
    }

    /// Steps 6-10: the two options, savings and the strategy decision.
    fn compare_options<'a>(
        &self,
        priced: &[PricedItem<'a, '_>],
        ranking: &[StoreRanking<'a>],
        currency: &'static Currency,
    ) -> Optimization<'a> {
        let best = ranking.first();

        let single_store = SingleStoreOption {
            store: best.map_or_else(String::new, |entry| entry.store.clone()),
            total: best.map_or_else(|| Money::from_minor(0, currency), |entry| entry.total),
            coverage_percent: best.map_or(0, |entry| entry.coverage_percent),
            items_missing: best.map_or_else(SmallVec::new, |entry| entry.items_missing.clone()),
        };

        let single_allocations =
            allocate_to_store(priced, &single_store.store, currency);

        let multi_store = allocate_cheapest(priced, currency);

        let single_total = single_store.total.to_minor_units();
        let multi_total = multi_store.total.to_minor_units();

        // Clamped: a multi-store split can come out dearer when the best
        // single store lacks some of the priced items.
        let savings_minor = (single_total - multi_total).max(0);
        let savings = Money::from_minor(savings_minor, currency);
        let savings_percent = percent_points_minor(savings_minor, single_total);

        let strategy = if savings_minor >= self.thresholds.multi_store_savings_floor
            && multi_store.allocations.len() > 1
        {
            Strategy::MultiStore
        } else {
            Strategy::SingleStore
        };

        let (allocations, total) = match strategy {
            Strategy::MultiStore => (multi_store.allocations.clone(), multi_store.total),
            Strategy::SingleStore => (single_allocations, single_store.total),
        };

        let worst_total = ranking.last().map_or(single_total, |entry| {
            entry.total.to_minor_units()
        });

        let decision = Decision {
            strategy,
            allocations,
            total,
            savings_vs_worst: Money::from_minor(worst_total - total.to_minor_units(), currency),
        };

        Optimization {
            single_store,
            multi_store,
            savings,
            savings_percent,
            decision,
        }
    }
}

/// Step 1: effective prices per cart item, and the defensive boundary
/// checks for quantities and prices.
fn partition_priced<'a, 'c>(
    cart: &'c [CartItem],
    prices: &impl PriceRepository<'a>,
) -> Result<(Vec<PricedItem<'a, 'c>>, Vec<String>), OptimizerError> {
    let mut priced = Vec::with_capacity(cart.len());
    let mut missing_products = Vec::new();

    for item in cart {
        if item.quantity == 0 {
            return Err(OptimizerError::NonPositiveQuantity {
                product: item.product_name.clone(),
            });
        }

        let points = prices.effective_prices(&item.product);

        if points.is_empty() {
            missing_products.push(item.product_name.clone());
            continue;
        }

        for point in &points {
            if point.price.to_minor_units() <= 0 {
                return Err(OptimizerError::NonPositivePrice {
                    product: item.product_name.clone(),
                    store: point.store.clone(),
                });
            }
        }

        priced.push(PricedItem { item, points });
    }

    Ok((priced, missing_products))
}

/// Builds the single-store plan: the priced items the given store
/// carries, at its effective prices.
fn allocate_to_store<'a>(
    priced: &[PricedItem<'a, '_>],
    store: &str,
    currency: &'static Currency,
) -> Vec<StoreAllocation<'a>> {
    let key = store_key(store);

    let items: Vec<AllocatedItem<'a>> = priced
        .iter()
        .filter_map(|priced_item| {
            priced_item
                .points
                .iter()
                .find(|point| store_key(&point.store) == key)
                .map(|point| allocated_item(priced_item.item, point, currency))
        })
        .collect();

    if items.is_empty() {
        return Vec::new();
    }

    let subtotal_minor: i64 = items.iter().map(|item| item.line_total.to_minor_units()).sum();

    vec![StoreAllocation {
        store: store.to_string(),
        items,
        subtotal: Money::from_minor(subtotal_minor, currency),
    }]
}

/// Step 7: pick the globally cheapest store per item and group the
/// assignments into per-store sub-lists, alphabetical by store.
fn allocate_cheapest<'a>(
    priced: &[PricedItem<'a, '_>],
    currency: &'static Currency,
) -> MultiStoreOption<'a> {
    let mut groups: FxHashMap<String, StoreAllocation<'a>> = FxHashMap::default();

    for priced_item in priced {
        // `effective_prices` is alphabetical and `min_by_key` keeps the
        // first of equal elements, so price ties resolve to the
        // alphabetically first store.
        let Some(point) = priced_item
            .points
            .iter()
            .min_by_key(|point| point.price.to_minor_units())
        else {
            continue;
        };

        let allocated = allocated_item(priced_item.item, point, currency);

        let group = groups
            .entry(store_key(&point.store))
            .or_insert_with(|| StoreAllocation {
                store: point.store.clone(),
                items: Vec::new(),
                subtotal: Money::from_minor(0, currency),
            });

        group.subtotal = Money::from_minor(
            group.subtotal.to_minor_units() + allocated.line_total.to_minor_units(),
            currency,
        );
        group.items.push(allocated);
    }

    let mut allocations: Vec<StoreAllocation<'a>> = groups.into_values().collect();
    allocations.sort_by_cached_key(|allocation| store_key(&allocation.store));

    let total_minor: i64 = allocations
        .iter()
        .map(|allocation| allocation.subtotal.to_minor_units())
        .sum();

    MultiStoreOption {
        allocations,
        total: Money::from_minor(total_minor, currency),
    }
}

fn allocated_item<'a>(
    item: &CartItem,
    point: &PricePoint<'a>,
    currency: &'static Currency,
) -> AllocatedItem<'a> {
    let line_minor = point.price.to_minor_units() * i64::from(item.quantity);

    AllocatedItem {
        product_name: item.product_name.clone(),
        quantity: item.quantity,
        unit_price: point.price,
        line_total: Money::from_minor(line_minor, currency),
    }
}
