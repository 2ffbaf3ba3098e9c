//! Row types shared by the store implementations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use common::{CartEntryId, ItemId, Money, OrderId, UserId};

/// Status a new order is created with. Later transitions are written by
/// fulfillment, outside this core, so statuses stay opaque text.
pub const ORDER_STATUS_PENDING: &str = "pending";

/// Status of the single history row appended at order creation.
pub const HISTORY_STATUS_PLACED: &str = "placed";

/// Notes of the single history row appended at order creation.
pub const HISTORY_NOTES_PLACED: &str = "Order placed successfully";

/// A catalog listing. Single-unit marketplace model: one row, one sellable
/// unit, availability is a boolean that checkout flips to false.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub seller_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Money,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a catalog listing (the catalog collaborator seam).
#[derive(Debug, Clone)]
pub struct NewItem {
    pub seller_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Money,
}

/// A row in a user's cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    pub id: CartEntryId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// A cart row joined with the current catalog name and price.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub cart_id: CartEntryId,
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Outcome of adding an item to the cart: a fresh row, or an increment of
/// the existing `(user, item)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    Added {
        entry_id: CartEntryId,
        quantity: u32,
    },
    Incremented {
        entry_id: CartEntryId,
        new_quantity: u32,
    },
}

impl CartMutation {
    /// The cart row the mutation landed on.
    pub fn entry_id(&self) -> CartEntryId {
        match self {
            CartMutation::Added { entry_id, .. } => *entry_id,
            CartMutation::Incremented { entry_id, .. } => *entry_id,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// An order line joined with the catalog name and description.
///
/// `price` is the price frozen at sale time, decoupled from later catalog
/// price changes.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub price: Money,
}

/// An append-only order history row.
#[derive(Debug, Clone, Serialize)]
pub struct OrderHistoryRow {
    pub id: i64,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full order view: the order, its lines, and its status history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub status_history: Vec<OrderHistoryRow>,
}

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total_amount: Money,
}

/// A scheduled donation, read by the history timeline. Donation CRUD lives
/// outside this core; the center display name is stored denormalized.
#[derive(Debug, Clone, Serialize)]
pub struct Donation {
    pub id: i64,
    pub user_id: UserId,
    pub center_name: String,
    pub status: String,
    pub scheduled_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields for recording a donation (the donation collaborator seam).
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub user_id: UserId,
    pub center_name: String,
    pub status: String,
    pub scheduled_date: NaiveDate,
}
