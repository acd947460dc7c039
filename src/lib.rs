//! Changuito
//!
//! Changuito is a multi-store grocery price tracking and shopping cart
//! optimisation engine: it records price observations per product per
//! store, compares and ranks stores for a single product, and decides the
//! cheapest way to fulfil a whole cart, either at one store or split
//! across several.

pub mod cart;
pub mod comparison;
pub mod fixtures;
pub mod optimizer;
pub mod prelude;
pub mod prices;
pub mod products;
pub mod thresholds;

mod percent;
