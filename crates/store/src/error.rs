use thiserror::Error;

use common::{CartEntryId, ItemId, UserId};

/// Errors that can occur when interacting with the marketplace store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced catalog item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The cart entry does not exist or belongs to another user.
    #[error("Cart entry {entry_id} not found for user {user_id}")]
    CartEntryNotFound {
        user_id: UserId,
        entry_id: CartEntryId,
    },

    /// Checkout was attempted against an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A non-database backend failure (in-memory store, injected faults).
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
