//! Changuito prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartItem, CartRepository},
    comparison::{ProductComparison, StoreSummary, TrendBadge},
    fixtures::{Fixture, FixtureError},
    optimizer::{
        AllocatedItem, CartOptimizer, Decision, MultiStoreOption, Optimization,
        OptimizationResult, OptimizerError, RankBadge, SingleStoreOption, StoreAllocation,
        StoreRanking, Strategy,
        report::{RankingReport, ReportError},
    },
    prices::{PriceBook, PriceBookError, PriceObservation, PricePoint, PriceRepository},
    products::{ProductId, normalize_product_name},
    thresholds::Thresholds,
};
