//! Cart operations.

use serde::Serialize;

use common::{CartEntryId, ItemId, Money, UserId};
use store::{CartLine, CartMutation, MarketStore};

use crate::error::DomainError;

/// The user's cart joined with current catalog data, plus computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_price: Money,
    pub item_count: usize,
}

/// Service for cart mutations and reads.
///
/// Client-supplied quantities are normalized to at least 1 rather than
/// rejected; downstream clients rely on the permissive clamp.
pub struct CartService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds an item to the user's cart, incrementing the existing row when
    /// the item is already in it.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: i64,
    ) -> Result<CartMutation, DomainError> {
        let quantity = normalize_quantity(quantity);
        Ok(self.store.add_cart_entry(user_id, item_id, quantity).await?)
    }

    /// Sets the quantity of one of the user's cart rows.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        entry_id: CartEntryId,
        quantity: i64,
    ) -> Result<u32, DomainError> {
        let quantity = normalize_quantity(quantity);
        Ok(self
            .store
            .set_cart_quantity(user_id, entry_id, quantity)
            .await?)
    }

    /// Removes one of the user's cart rows.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, entry_id: CartEntryId) -> Result<(), DomainError> {
        Ok(self.store.remove_cart_entry(user_id, entry_id).await?)
    }

    /// Empties the user's cart. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<(), DomainError> {
        Ok(self.store.clear_cart(user_id).await?)
    }

    /// Returns the cart with current prices and computed totals.
    /// Side-effect-free.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, DomainError> {
        let lines = self.store.get_cart(user_id).await?;
        let total_price: Money = lines
            .iter()
            .map(|line| line.price.multiply(line.quantity))
            .sum();
        Ok(CartView {
            item_count: lines.len(),
            total_price,
            lines,
        })
    }
}

/// Clamps a client-supplied quantity to the valid range. Non-positive
/// values become 1; the upper bound is the storage column range.
fn normalize_quantity(quantity: i64) -> u32 {
    quantity.clamp(1, i64::from(i32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_non_positive_to_one() {
        assert_eq!(normalize_quantity(0), 1);
        assert_eq!(normalize_quantity(-5), 1);
        assert_eq!(normalize_quantity(1), 1);
    }

    #[test]
    fn normalize_keeps_large_values_within_column_range() {
        assert_eq!(normalize_quantity(40), 40);
        assert_eq!(normalize_quantity(i64::MAX), i32::MAX as u32);
    }
}
