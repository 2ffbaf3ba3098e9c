use async_trait::async_trait;

use common::{CartEntryId, ItemId, OrderId, UserId};

use crate::Result;
use crate::model::{
    CartLine, CartMutation, CheckoutReceipt, Donation, Item, NewDonation, NewItem, Order,
    OrderDetails,
};

/// Core trait for marketplace store implementations.
///
/// Covers the per-user cart, the catalog surface checkout depends on, the
/// atomic checkout unit, and the order/history reads. All implementations
/// must be thread-safe (Send + Sync); each method is an independent unit of
/// work with no shared in-process state between requests beyond the store
/// itself.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Inserts a catalog listing.
    ///
    /// Listing CRUD belongs to the external item service; this is its write
    /// seam, used by that service and by tests.
    async fn insert_item(&self, item: NewItem) -> Result<Item>;

    /// Reads a catalog listing.
    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>>;

    /// Adds an item to the user's cart.
    ///
    /// If a `(user, item)` row already exists its quantity is incremented by
    /// `quantity` rather than duplicating the row. Fails with
    /// [`StoreError::ItemNotFound`](crate::StoreError::ItemNotFound) when the
    /// catalog has no such item.
    async fn add_cart_entry(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<CartMutation>;

    /// Sets the quantity of a cart row.
    ///
    /// Fails with `CartEntryNotFound` when the row is absent or owned by a
    /// different user.
    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        entry_id: CartEntryId,
        quantity: u32,
    ) -> Result<u32>;

    /// Removes a cart row. Fails with `CartEntryNotFound` when the row is
    /// absent or owned by a different user.
    async fn remove_cart_entry(&self, user_id: UserId, entry_id: CartEntryId) -> Result<()>;

    /// Deletes every cart row of the user. Idempotent.
    async fn clear_cart(&self, user_id: UserId) -> Result<()>;

    /// Returns the user's cart joined with current catalog name and price.
    ///
    /// Entries whose catalog item no longer exists are dropped, matching
    /// inner-join semantics. Side-effect-free.
    async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Converts the user's cart into an order, as one atomic unit.
    ///
    /// Snapshot the cart joined with current catalog prices, compute the
    /// total, insert the order (status `"pending"`), insert one order line
    /// per cart row with the price frozen at sale time, flip every purchased
    /// item unavailable, delete the user's cart rows, and append the
    /// `"placed"` history row. All of it commits or none of it does; on any
    /// failure the cart is left exactly as it was.
    ///
    /// Two concurrent checkouts by the same user serialize: the loser
    /// observes the emptied cart and fails with `EmptyCart`.
    async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<CheckoutReceipt>;

    /// Reads an order with its lines and status history.
    ///
    /// Returns `None` when the order does not exist or does not belong to
    /// `user_id`; callers must not be able to read other users' orders.
    async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Option<OrderDetails>>;

    /// The user's orders, newest first.
    async fn purchases(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// The user's donations, newest first.
    async fn donations(&self, user_id: UserId) -> Result<Vec<Donation>>;

    /// Items listed by the user that have been sold, newest first.
    async fn sold_items(&self, user_id: UserId) -> Result<Vec<Item>>;

    /// Records a donation (the donation collaborator's write seam).
    async fn record_donation(&self, donation: NewDonation) -> Result<Donation>;
}
