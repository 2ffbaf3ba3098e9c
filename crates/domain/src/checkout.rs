//! The checkout engine: cart → order, as one unit of work.

use common::UserId;
use store::{CheckoutReceipt, MarketStore, StoreError};

use crate::error::DomainError;

/// Service converting a cart into an order.
///
/// Validation failures are detected before any storage call; the atomic
/// snapshot/insert/flip/drain/append unit itself lives in the store so that
/// it runs under the backend's transaction discipline.
pub struct CheckoutService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> CheckoutService<S> {
    /// Creates a new checkout service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order from the user's cart.
    ///
    /// Fails with `MissingField` when `shipping_address` or
    /// `payment_method` is empty, with `EmptyCart` when there is nothing to
    /// buy, and with a storage error (after full rollback) otherwise.
    #[tracing::instrument(skip(self, shipping_address, payment_method))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<CheckoutReceipt, DomainError> {
        if shipping_address.trim().is_empty() {
            return Err(DomainError::MissingField("shipping_address"));
        }
        if payment_method.trim().is_empty() {
            return Err(DomainError::MissingField("payment_method"));
        }

        match self
            .store
            .checkout(user_id, shipping_address, payment_method)
            .await
        {
            Ok(receipt) => {
                metrics::counter!("checkout_orders_placed_total").increment(1);
                tracing::info!(
                    %user_id,
                    order_id = %receipt.order_id,
                    total_cents = receipt.total_amount.cents(),
                    "order placed"
                );
                Ok(receipt)
            }
            Err(StoreError::EmptyCart) => Err(DomainError::EmptyCart),
            Err(err) => {
                metrics::counter!("checkout_failures_total").increment(1);
                Err(DomainError::Store(err))
            }
        }
    }
}
