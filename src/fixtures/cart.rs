//! Cart fixture file format

use serde::Deserialize;

/// Top-level shape of a `cart.yml` file.
#[derive(Debug, Deserialize)]
pub(crate) struct CartFixture {
    /// Items to add, in order
    pub items: Vec<CartItemFixture>,
}

/// One cart entry.
#[derive(Debug, Deserialize)]
pub(crate) struct CartItemFixture {
    /// Product name as a shopper would type it
    pub product: String,

    /// Desired quantity
    pub quantity: u32,
}
