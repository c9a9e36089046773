//! Product registry: product records, activation state and rating counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trustledger_canonical::{AccountId, ProductId, Timestamp};

use crate::errors::LedgerError;

/// A registered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identity, immutable.
    pub product_id: ProductId,
    /// Owner, immutable. Never allowed to review the product.
    pub vendor: AccountId,
    /// Gate on new reviews.
    pub is_active: bool,
    /// Accepted reviews so far.
    pub total_reviews: u64,
    /// Sum of accepted ratings.
    pub sum_of_ratings: u128,
    /// Registration time.
    pub created_at: Timestamp,
}

/// Counter values for one product after a prospective rating.
///
/// Produced by [`ProductRegistry::stage_rating`] without touching the store;
/// written by [`ProductRegistry::apply`] once the whole transition is known
/// to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    /// Product the counters belong to.
    pub product_id: ProductId,
    /// New review count.
    pub total_reviews: u64,
    /// New rating sum.
    pub sum_of_ratings: u128,
}

/// Owns every [`Product`] record.
#[derive(Debug, Default)]
pub struct ProductRegistry {
    products: BTreeMap<ProductId, Product>,
}

impl ProductRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a registration without writing it.
    pub fn check_new(&self, product_id: ProductId, vendor: AccountId) -> Result<(), LedgerError> {
        if product_id.is_zero() {
            return Err(LedgerError::InvalidInput("product id is zero".to_string()));
        }
        if vendor.is_zero() {
            return Err(LedgerError::InvalidInput("vendor is zero".to_string()));
        }
        if self.products.contains_key(&product_id) {
            return Err(LedgerError::AlreadyExists(product_id));
        }
        Ok(())
    }

    /// Registers an active product with zero counters.
    pub fn add(
        &mut self,
        product_id: ProductId,
        vendor: AccountId,
        at: Timestamp,
    ) -> Result<&Product, LedgerError> {
        self.check_new(product_id, vendor)?;
        let product = self.products.entry(product_id).or_insert(Product {
            product_id,
            vendor,
            is_active: true,
            total_reviews: 0,
            sum_of_ratings: 0,
            created_at: at,
        });
        Ok(product)
    }

    /// Toggles the review gate. Historical reviews and scores are untouched.
    pub fn set_active(
        &mut self,
        product_id: ProductId,
        is_active: bool,
    ) -> Result<&Product, LedgerError> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| LedgerError::not_found("product", product_id))?;
        product.is_active = is_active;
        Ok(product)
    }

    /// Looks up a product.
    pub fn get(&self, product_id: ProductId) -> Result<&Product, LedgerError> {
        self.products
            .get(&product_id)
            .ok_or_else(|| LedgerError::not_found("product", product_id))
    }

    /// Whether the product is registered.
    pub fn exists(&self, product_id: ProductId) -> bool {
        self.products.contains_key(&product_id)
    }

    /// Computes the counters after adding `rating`, failing on overflow.
    pub fn stage_rating(
        &self,
        product_id: ProductId,
        rating: u8,
    ) -> Result<CounterUpdate, LedgerError> {
        let product = self.get(product_id)?;
        let total_reviews = product
            .total_reviews
            .checked_add(1)
            .ok_or(LedgerError::Overflow("total_reviews"))?;
        let sum_of_ratings = product
            .sum_of_ratings
            .checked_add(u128::from(rating))
            .ok_or(LedgerError::Overflow("sum_of_ratings"))?;
        Ok(CounterUpdate {
            product_id,
            total_reviews,
            sum_of_ratings,
        })
    }

    /// Writes staged counters. Both counters change together.
    pub fn apply(&mut self, update: CounterUpdate) {
        debug_assert!(self.products.contains_key(&update.product_id));
        if let Some(product) = self.products.get_mut(&update.product_id) {
            product.total_reviews = update.total_reviews;
            product.sum_of_ratings = update.sum_of_ratings;
        }
    }

    /// Number of registered products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.products.keys().copied()
    }

    #[cfg(test)]
    pub(crate) fn force_counters(&mut self, product_id: ProductId, total: u64, sum: u128) {
        if let Some(p) = self.products.get_mut(&product_id) {
            p.total_reviews = total;
            p.sum_of_ratings = sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor() -> AccountId {
        AccountId::from_bytes([0x0a; 20])
    }

    #[test]
    fn add_then_get() {
        let mut registry = ProductRegistry::new();
        let id = ProductId::from_label("p1");
        registry.add(id, vendor(), Timestamp(5)).unwrap();

        let product = registry.get(id).unwrap();
        assert!(product.is_active);
        assert_eq!(product.total_reviews, 0);
        assert_eq!(product.sum_of_ratings, 0);
        assert_eq!(product.created_at, Timestamp(5));
        assert!(registry.exists(id));
    }

    #[test]
    fn rejects_zero_and_duplicates() {
        let mut registry = ProductRegistry::new();
        let id = ProductId::from_label("p1");
        assert!(matches!(
            registry.add(ProductId::ZERO, vendor(), Timestamp(0)),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.add(id, AccountId::ZERO, Timestamp(0)),
            Err(LedgerError::InvalidInput(_))
        ));
        registry.add(id, vendor(), Timestamp(0)).unwrap();
        assert_eq!(
            registry.add(id, vendor(), Timestamp(1)).unwrap_err(),
            LedgerError::AlreadyExists(id)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let mut registry = ProductRegistry::new();
        let id = ProductId::from_label("ghost");
        assert_eq!(registry.get(id).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(registry.set_active(id, false).unwrap_err().code(), "NOT_FOUND");
        assert!(!registry.exists(id));
    }

    #[test]
    fn staging_does_not_write() {
        let mut registry = ProductRegistry::new();
        let id = ProductId::from_label("p1");
        registry.add(id, vendor(), Timestamp(0)).unwrap();

        let update = registry.stage_rating(id, 80).unwrap();
        assert_eq!(update.total_reviews, 1);
        assert_eq!(update.sum_of_ratings, 80);
        assert_eq!(registry.get(id).unwrap().total_reviews, 0);

        registry.apply(update);
        assert_eq!(registry.get(id).unwrap().sum_of_ratings, 80);
    }

    #[test]
    fn staging_detects_counter_overflow() {
        let mut registry = ProductRegistry::new();
        let id = ProductId::from_label("p1");
        registry.add(id, vendor(), Timestamp(0)).unwrap();

        registry.force_counters(id, u64::MAX, 0);
        assert_eq!(
            registry.stage_rating(id, 1).unwrap_err(),
            LedgerError::Overflow("total_reviews")
        );

        registry.force_counters(id, 1, u128::MAX);
        assert_eq!(
            registry.stage_rating(id, 1).unwrap_err(),
            LedgerError::Overflow("sum_of_ratings")
        );
    }
}
