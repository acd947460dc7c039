//! Price fixture file format

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level shape of a `prices.yml` file.
#[derive(Debug, Deserialize)]
pub(crate) struct PricesFixture {
    /// ISO alpha code for every price in the file
    pub currency: String,

    /// Observations, in recording order
    pub observations: Vec<ObservationFixture>,
}

/// One observation entry.
#[derive(Debug, Deserialize)]
pub(crate) struct ObservationFixture {
    /// Product name as a shopper would type it
    pub product: String,

    /// Store label
    pub store: String,

    /// Unit price in minor units
    pub price: i64,

    /// Observation timestamp
    pub observed_at: DateTime<Utc>,
}
