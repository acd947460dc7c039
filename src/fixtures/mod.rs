//! Fixtures
//!
//! YAML-driven scenario loading for integration tests: a price book and
//! a cart described under `fixtures/<set>/`.

use std::{fs, path::PathBuf};

use rusty_money::{Money, iso};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartItem, CartRepository},
    prices::{PriceBook, PriceBookError, PriceObservation, PriceRepository},
};

pub mod cart;
pub mod prices;

/// Fixture parsing errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Observation rejected by the price book
    #[error(transparent)]
    PriceBook(#[from] PriceBookError),

    /// Item rejected by the cart
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// A loaded scenario: price book plus cart.
#[derive(Debug)]
pub struct Fixture {
    book: PriceBook<'static>,
    cart: Cart,
}

impl Fixture {
    /// Loads the named fixture set from `./fixtures/<name>/`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if a file cannot be read or parsed, the
    /// currency code is unknown, or an entry violates a model invariant.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_dir(PathBuf::from("./fixtures").join(name))
    }

    /// Loads `prices.yml` and `cart.yml` from the given directory.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_set`].
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let dir = dir.into();

        let book = load_prices(&dir)?;
        let cart = load_cart(&dir)?;

        Ok(Self { book, cart })
    }

    /// The loaded price book.
    #[must_use]
    pub fn book(&self) -> &PriceBook<'static> {
        &self.book
    }

    /// The loaded cart.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Snapshot of the loaded cart, ready for the optimizer.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.cart.snapshot()
    }
}

fn load_prices(dir: &std::path::Path) -> Result<PriceBook<'static>, FixtureError> {
    let contents = fs::read_to_string(dir.join("prices.yml"))?;
    let fixture: prices::PricesFixture = serde_norway::from_str(&contents)?;

    let currency = iso::find(&fixture.currency)
        .ok_or_else(|| FixtureError::UnknownCurrency(fixture.currency.clone()))?;

    let mut book = PriceBook::new(currency);

    for observation in fixture.observations {
        book.record(PriceObservation::new(
            observation.product,
            observation.store,
            Money::from_minor(observation.price, currency),
            observation.observed_at,
        ))?;
    }

    Ok(book)
}

fn load_cart(dir: &std::path::Path) -> Result<Cart, FixtureError> {
    let contents = fs::read_to_string(dir.join("cart.yml"))?;
    let fixture: cart::CartFixture = serde_norway::from_str(&contents)?;

    let mut loaded = Cart::new();

    for item in fixture.items {
        loaded.add(&item.product, item.quantity)?;
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn comprehensive_set_loads() -> TestResult {
        let fixture = Fixture::from_set("comprehensive")?;

        assert_eq!(fixture.cart().len(), 5);
        assert!(!fixture.book().is_empty());
        assert_eq!(fixture.book().currency().iso_alpha_code, "ARS");

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("prices.yml"),
            "currency: ZZZ\nobservations: []\n",
        )?;
        fs::write(dir.path().join("cart.yml"), "items: []\n")?;

        let err = Fixture::from_dir(dir.path());

        assert!(matches!(err, Err(FixtureError::UnknownCurrency(code)) if code == "ZZZ"));

        Ok(())
    }
}
