//! Storage layer for the marketplace checkout core.
//!
//! The [`MarketStore`] trait covers the per-user cart, the catalog reads and
//! the availability flip that checkout owns, the atomic checkout unit, and
//! the order/history reads. Two implementations are provided:
//! [`InMemoryStore`] for tests and development, [`PostgresStore`] for
//! production.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{CartEntryId, ItemId, Money, OrderId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    CartEntry, CartLine, CartMutation, CheckoutReceipt, Donation, Item, NewDonation, NewItem,
    Order, OrderDetails, OrderHistoryRow, OrderLine, HISTORY_NOTES_PLACED, HISTORY_STATUS_PLACED,
    ORDER_STATUS_PENDING,
};
pub use postgres::PostgresStore;
pub use store::MarketStore;
