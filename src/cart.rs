//! Cart
//!
//! The user's product wishlist, keyed by normalized product identity.
//! The optimizer only ever reads a [`Cart::snapshot`]; it never mutates
//! the cart.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::products::ProductId;

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Items are always added with a positive quantity.
    #[error("cannot add {0:?} with quantity 0")]
    ZeroQuantityAdd(String),
}

/// One cart entry. At most one entry exists per [`ProductId`].
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    /// Stable product identity
    pub product: ProductId,

    /// Product name as first entered
    pub product_name: String,

    /// Desired quantity, always at least 1
    pub quantity: u32,

    /// When the product was first added
    pub added_at: DateTime<Utc>,
}

/// Synchronous read contract for cart storage.
///
/// The optimizer depends on this trait only, so the concrete persistence
/// behind the cart is swappable.
pub trait CartRepository {
    /// A point-in-time copy of the cart items, in insertion order.
    fn snapshot(&self) -> Vec<CartItem>;
}

/// In-memory cart. Every mutator returns the new full item list.
#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, merging with an existing entry for the same
    /// normalized identity.
    ///
    /// Merging sums quantities and keeps the original entry's
    /// `added_at` and first-seen display name.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantityAdd`] when `quantity` is 0.
    pub fn add(&mut self, product_name: &str, quantity: u32) -> Result<&[CartItem], CartError> {
        self.add_at(product_name, quantity, Utc::now())
    }

    /// Adds a product with an explicit timestamp for the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantityAdd`] when `quantity` is 0.
    pub fn add_at(
        &mut self,
        product_name: &str,
        quantity: u32,
        added_at: DateTime<Utc>,
    ) -> Result<&[CartItem], CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantityAdd(product_name.to_string()));
        }

        let product = ProductId::new(product_name);

        if let Some(existing) = self.items.iter_mut().find(|item| item.product == product) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product,
                product_name: product_name.trim().to_string(),
                quantity,
                added_at,
            });
        }

        Ok(&self.items)
    }

    /// Sets an item's quantity exactly; 0 removes the item.
    ///
    /// Unknown products are a no-op, so the cart never stores
    /// non-positive quantities.
    pub fn update_quantity(&mut self, product: &ProductId, quantity: u32) -> &[CartItem] {
        if quantity == 0 {
            return self.remove(product);
        }

        if let Some(existing) = self.items.iter_mut().find(|item| &item.product == product) {
            existing.quantity = quantity;
        }

        &self.items
    }

    /// Removes the matching entry; a no-op when absent.
    pub fn remove(&mut self, product: &ProductId) -> &[CartItem] {
        self.items.retain(|item| &item.product != product);

        &self.items
    }

    /// Empties the cart.
    pub fn clear(&mut self) -> &[CartItem] {
        self.items.clear();

        &self.items
    }

    /// Iterate over the items in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartRepository for Cart {
    fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn add_merges_spelling_variants_into_one_entry() -> TestResult {
        let mut cart = Cart::new();

        cart.add("Leche Entera", 2)?;
        cart.add("  leche   ENTERA ", 3)?;
        let items = cart.add("Leché Entera", 1)?;

        assert_eq!(items.len(), 1);
        let item = items.first().ok_or("expected one item")?;
        assert_eq!(item.quantity, 6);
        assert_eq!(item.product_name, "Leche Entera");

        Ok(())
    }

    #[test]
    fn add_keeps_original_added_at() -> TestResult {
        let mut cart = Cart::new();

        cart.add("Pan", 1)?;
        let first_added = cart.snapshot().first().map(|item| item.added_at);

        cart.add("pan", 1)?;
        let after_merge = cart.snapshot().first().map(|item| item.added_at);

        assert_eq!(first_added, after_merge);

        Ok(())
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut cart = Cart::new();

        let err = cart.add("Pan", 0);

        assert_eq!(err, Err(CartError::ZeroQuantityAdd("Pan".to_string())));
    }

    #[test]
    fn update_quantity_sets_exactly() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Pan", 2)?;

        let items = cart.update_quantity(&ProductId::new("pan"), 5);

        assert_eq!(items.first().map(|item| item.quantity), Some(5));

        Ok(())
    }

    #[test]
    fn update_quantity_zero_removes() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Pan", 2)?;

        let items = cart.update_quantity(&ProductId::new("pan"), 0);

        assert!(items.is_empty());

        Ok(())
    }

    #[test]
    fn remove_missing_is_a_no_op() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Pan", 1)?;

        let items = cart.remove(&ProductId::new("yerba"));

        assert_eq!(items.len(), 1);

        Ok(())
    }

    #[test]
    fn clear_empties_the_cart() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Pan", 1)?;
        cart.add("Yerba", 1)?;

        assert!(cart.clear().is_empty());
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn snapshot_preserves_insertion_order() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Pan", 1)?;
        cart.add("Yerba", 1)?;
        cart.add("Leche", 1)?;

        let names: Vec<String> = cart
            .snapshot()
            .into_iter()
            .map(|item| item.product_name)
            .collect();

        assert_eq!(names, vec!["Pan", "Yerba", "Leche"]);

        Ok(())
    }
}
