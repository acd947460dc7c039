//! Products
//!
//! Product identity is derived from the product name, so the same product
//! typed with different capitalisation, accents or spacing maps to a
//! single [`ProductId`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable product identifier derived from a normalized product name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Derives the identifier for the given product name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(normalize_product_name(name))
    }

    /// Returns the normalized slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Normalizes a product name into a stable slug.
///
/// Lowercases, folds Latin diacritics to their base letter, trims, and
/// collapses internal whitespace runs to single underscores. Total and
/// idempotent: normalizing an already-normalized slug is a no-op.
#[must_use]
pub fn normalize_product_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            // Leading runs never emit a separator; `trim` already removed them.
            pending_separator = !slug.is_empty();
            continue;
        }

        if pending_separator {
            slug.push('_');
            pending_separator = false;
        }

        slug.push(fold_diacritic(ch));
    }

    slug
}

/// Folds a single accented Latin character to its base letter.
///
/// Characters outside the mapping pass through unchanged, which keeps the
/// normalization total for arbitrary input.
const fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize_product_name("  Leche   Entera  "), "leche_entera");
        assert_eq!(
            normalize_product_name("leche entera"),
            normalize_product_name("  Leche Entera  ")
        );
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize_product_name("Azúcar"), "azucar");
        assert_eq!(normalize_product_name("CAFÉ con Ñoquis"), "cafe_con_noquis");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_product_name("Pan  Lactál");
        let twice = normalize_product_name(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn is_total_on_empty_and_symbols() {
        assert_eq!(normalize_product_name(""), "");
        assert_eq!(normalize_product_name("   "), "");
        assert_eq!(normalize_product_name("7-Up 500ml"), "7-up_500ml");
    }

    #[test]
    fn product_id_equates_spelling_variants() {
        assert_eq!(ProductId::new("Yerba Mate"), ProductId::new("yerba  mate"));
        assert_eq!(ProductId::new("Café").as_str(), "cafe");
    }
}
