//! Domain error types.

use thiserror::Error;

use common::OrderId;
use store::StoreError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required request field was missing or empty.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Checkout was attempted against an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order does not exist or does not belong to the requesting user.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// An error occurred in the storage layer.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
