//! Unified order-history read model.
//!
//! Merges three independent feeds — the user's orders, donations, and sold
//! listings — into one newest-first timeline. Each call recomputes the
//! merge from the store; nothing is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{Money, OrderId, UserId};
use store::{MarketStore, OrderDetails};

use crate::error::DomainError;

/// Maximum number of timeline entries returned per call.
pub const TIMELINE_LIMIT: usize = 50;

/// Which table a timeline entry came from. Category is determined by the
/// table of origin, never by item identity, so an entry can only appear in
/// one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineCategory {
    Purchase,
    Donation,
    Sale,
}

/// One row of the unified history timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub category: TimelineCategory,
    pub title: String,
    pub status: String,
    /// Effective date shown to the user: order creation, donation schedule,
    /// or sale date.
    pub date: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

/// Read-only service over orders, donations, and sales.
pub struct HistoryService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> HistoryService<S> {
    /// Creates a new history service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's unified timeline, newest first, capped at
    /// [`TIMELINE_LIMIT`] entries.
    #[tracing::instrument(skip(self))]
    pub async fn timeline(&self, user_id: UserId) -> Result<Vec<TimelineEntry>, DomainError> {
        let orders = self.store.purchases(user_id).await?;
        let donations = self.store.donations(user_id).await?;
        let sales = self.store.sold_items(user_id).await?;

        let mut entries: Vec<TimelineEntry> = Vec::new();

        entries.extend(orders.into_iter().map(|order| TimelineEntry {
            id: order.id.as_i64(),
            category: TimelineCategory::Purchase,
            title: format!("Order #{}", order.id),
            status: order.status,
            date: order.created_at.format("%Y-%m-%d").to_string(),
            amount: order.total_amount,
            created_at: order.created_at,
        }));

        entries.extend(donations.into_iter().map(|donation| TimelineEntry {
            id: donation.id,
            category: TimelineCategory::Donation,
            title: format!("Donation to {}", donation.center_name),
            status: donation.status,
            date: donation.scheduled_date.format("%Y-%m-%d").to_string(),
            amount: Money::zero(),
            created_at: donation.created_at,
        }));

        entries.extend(sales.into_iter().map(|item| TimelineEntry {
            id: item.id.as_i64(),
            category: TimelineCategory::Sale,
            title: format!("Sale: {}", item.name),
            status: "sold".to_string(),
            date: item.updated_at.format("%Y-%m-%d").to_string(),
            amount: item.price,
            created_at: item.created_at,
        }));

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(TIMELINE_LIMIT);
        Ok(entries)
    }

    /// An order with its lines and status history. Fails with
    /// `OrderNotFound` when the order is absent or owned by another user;
    /// the ownership check is mandatory.
    #[tracing::instrument(skip(self))]
    pub async fn order_details(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetails, DomainError> {
        self.store
            .get_order(user_id, order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }
}
