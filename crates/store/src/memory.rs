use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use common::{CartEntryId, ItemId, Money, OrderId, UserId};

use crate::model::{
    CartEntry, CartLine, CartMutation, CheckoutReceipt, Donation, Item, NewDonation, NewItem,
    Order, OrderDetails, OrderHistoryRow, OrderLine, HISTORY_NOTES_PLACED, HISTORY_STATUS_PLACED,
    ORDER_STATUS_PENDING,
};
use crate::store::MarketStore;
use crate::{Result, StoreError};

/// An order line as stored, before joining with the catalog.
#[derive(Debug, Clone)]
struct StoredOrderLine {
    order_id: OrderId,
    item_id: ItemId,
    quantity: u32,
    price: Money,
}

#[derive(Default)]
struct MemoryState {
    items: HashMap<ItemId, Item>,
    cart: Vec<CartEntry>,
    orders: Vec<Order>,
    order_lines: Vec<StoredOrderLine>,
    order_history: Vec<OrderHistoryRow>,
    donations: Vec<Donation>,
    next_item_id: i64,
    next_cart_id: i64,
    next_order_id: i64,
    next_history_id: i64,
    next_donation_id: i64,
    fail_next_checkout: bool,
}

impl MemoryState {
    fn cart_snapshot(&self, user_id: UserId) -> Vec<CartLine> {
        self.cart
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .filter_map(|entry| {
                // Inner-join semantics: entries whose item vanished are dropped.
                let item = self.items.get(&entry.item_id)?;
                Some(CartLine {
                    cart_id: entry.id,
                    item_id: entry.item_id,
                    name: item.name.clone(),
                    price: item.price,
                    quantity: entry.quantity,
                    created_at: entry.created_at,
                })
            })
            .collect()
    }
}

/// In-memory store implementation for testing and development.
///
/// All state lives behind a single `RwLock`; the write guard taken by
/// [`checkout`](MarketStore::checkout) is the serialization point that keeps
/// two concurrent checkouts of the same cart from both draining it.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot simulated storage failure inside the next checkout,
    /// after the order id has been computed but before anything is written.
    /// Test hook for the rollback contract.
    pub async fn fail_next_checkout(&self) {
        self.state.write().await.fail_next_checkout = true;
    }

    /// Total number of orders placed, across all users.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all state.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn insert_item(&self, item: NewItem) -> Result<Item> {
        let mut state = self.state.write().await;
        state.next_item_id += 1;
        let now = Utc::now();
        let stored = Item {
            id: ItemId::new(state.next_item_id),
            seller_id: item.seller_id,
            name: item.name,
            description: item.description,
            category: item.category,
            price: item.price,
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        Ok(self.state.read().await.items.get(&item_id).cloned())
    }

    async fn add_cart_entry(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<CartMutation> {
        let mut state = self.state.write().await;
        if !state.items.contains_key(&item_id) {
            return Err(StoreError::ItemNotFound(item_id));
        }

        if let Some(entry) = state
            .cart
            .iter_mut()
            .find(|entry| entry.user_id == user_id && entry.item_id == item_id)
        {
            entry.quantity += quantity;
            return Ok(CartMutation::Incremented {
                entry_id: entry.id,
                new_quantity: entry.quantity,
            });
        }

        state.next_cart_id += 1;
        let entry = CartEntry {
            id: CartEntryId::new(state.next_cart_id),
            user_id,
            item_id,
            quantity,
            created_at: Utc::now(),
        };
        let entry_id = entry.id;
        state.cart.push(entry);
        Ok(CartMutation::Added { entry_id, quantity })
    }

    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        entry_id: CartEntryId,
        quantity: u32,
    ) -> Result<u32> {
        let mut state = self.state.write().await;
        let entry = state
            .cart
            .iter_mut()
            .find(|entry| entry.id == entry_id && entry.user_id == user_id)
            .ok_or(StoreError::CartEntryNotFound { user_id, entry_id })?;
        entry.quantity = quantity;
        Ok(quantity)
    }

    async fn remove_cart_entry(&self, user_id: UserId, entry_id: CartEntryId) -> Result<()> {
        let mut state = self.state.write().await;
        let position = state
            .cart
            .iter()
            .position(|entry| entry.id == entry_id && entry.user_id == user_id)
            .ok_or(StoreError::CartEntryNotFound { user_id, entry_id })?;
        state.cart.remove(position);
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.cart.retain(|entry| entry.user_id != user_id);
        Ok(())
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        Ok(self.state.read().await.cart_snapshot(user_id))
    }

    async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<CheckoutReceipt> {
        // The write guard is held for the whole unit: snapshot, order
        // creation, availability flips, cart drain, history append.
        let mut state = self.state.write().await;

        let lines = state.cart_snapshot(user_id);
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let total_amount: Money = lines
            .iter()
            .map(|line| line.price.multiply(line.quantity))
            .sum();
        let order_id = OrderId::new(state.next_order_id + 1);

        if state.fail_next_checkout {
            state.fail_next_checkout = false;
            return Err(StoreError::Backend(
                "simulated storage failure during checkout".to_string(),
            ));
        }

        // Nothing before this point has mutated state; everything after this
        // point happens under the same guard, so the unit is all-or-nothing.
        let now = Utc::now();
        state.next_order_id += 1;
        state.orders.push(Order {
            id: order_id,
            user_id,
            total_amount,
            shipping_address: shipping_address.to_string(),
            payment_method: payment_method.to_string(),
            status: ORDER_STATUS_PENDING.to_string(),
            created_at: now,
        });

        for line in &lines {
            state.order_lines.push(StoredOrderLine {
                order_id,
                item_id: line.item_id,
                quantity: line.quantity,
                price: line.price,
            });
            if let Some(item) = state.items.get_mut(&line.item_id) {
                item.is_available = false;
                item.updated_at = now;
            }
        }

        state.cart.retain(|entry| entry.user_id != user_id);

        state.next_history_id += 1;
        let history_id = state.next_history_id;
        state.order_history.push(OrderHistoryRow {
            id: history_id,
            user_id,
            order_id,
            status: HISTORY_STATUS_PLACED.to_string(),
            notes: Some(HISTORY_NOTES_PLACED.to_string()),
            created_at: now,
        });

        Ok(CheckoutReceipt {
            order_id,
            total_amount,
        })
    }

    async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Option<OrderDetails>> {
        let state = self.state.read().await;
        let Some(order) = state
            .orders
            .iter()
            .find(|order| order.id == order_id && order.user_id == user_id)
        else {
            return Ok(None);
        };

        let items = state
            .order_lines
            .iter()
            .filter(|line| line.order_id == order_id)
            .map(|line| {
                let item = state.items.get(&line.item_id);
                OrderLine {
                    item_id: line.item_id,
                    name: item.map(|i| i.name.clone()).unwrap_or_default(),
                    description: item.and_then(|i| i.description.clone()),
                    quantity: line.quantity,
                    price: line.price,
                }
            })
            .collect();

        let mut status_history: Vec<OrderHistoryRow> = state
            .order_history
            .iter()
            .filter(|row| row.order_id == order_id)
            .cloned()
            .collect();
        status_history.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Some(OrderDetails {
            order: order.clone(),
            items,
            status_history,
        }))
    }

    async fn purchases(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn donations(&self, user_id: UserId) -> Result<Vec<Donation>> {
        let state = self.state.read().await;
        let mut donations: Vec<Donation> = state
            .donations
            .iter()
            .filter(|donation| donation.user_id == user_id)
            .cloned()
            .collect();
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(donations)
    }

    async fn sold_items(&self, user_id: UserId) -> Result<Vec<Item>> {
        let state = self.state.read().await;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.seller_id == user_id && !item.is_available)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    async fn record_donation(&self, donation: NewDonation) -> Result<Donation> {
        let mut state = self.state.write().await;
        state.next_donation_id += 1;
        let stored = Donation {
            id: state.next_donation_id,
            user_id: donation.user_id,
            center_name: donation.center_name,
            status: donation.status,
            scheduled_date: donation.scheduled_date,
            created_at: Utc::now(),
        };
        state.donations.push(stored.clone());
        Ok(stored)
    }
}
