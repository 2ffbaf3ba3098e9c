use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use common::{CartEntryId, ItemId, Money, OrderId, UserId};

use crate::model::{
    CartLine, CartMutation, CheckoutReceipt, Donation, Item, NewDonation, NewItem, Order,
    OrderDetails, OrderHistoryRow, OrderLine, HISTORY_NOTES_PLACED, HISTORY_STATUS_PLACED,
    ORDER_STATUS_PENDING,
};
use crate::store::MarketStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed marketplace store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::new(row.try_get("id")?),
            seller_id: UserId::new(row.try_get("seller_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            price: Money::from_cents(row.try_get("price")?),
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            total_amount: Money::from_cents(row.try_get("total_amount")?),
            shipping_address: row.try_get("shipping_address")?,
            payment_method: row.try_get("payment_method")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_history(row: PgRow) -> Result<OrderHistoryRow> {
        Ok(OrderHistoryRow {
            id: row.try_get("id")?,
            user_id: UserId::new(row.try_get("user_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            status: row.try_get("status")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_donation(row: PgRow) -> Result<Donation> {
        Ok(Donation {
            id: row.try_get("id")?,
            user_id: UserId::new(row.try_get("user_id")?),
            center_name: row.try_get("center_name")?,
            status: row.try_get("status")?,
            scheduled_date: row.try_get("scheduled_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn insert_item(&self, item: NewItem) -> Result<Item> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (seller_id, name, description, category, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, seller_id, name, description, category, price, is_available, created_at, updated_at
            "#,
        )
        .bind(item.seller_id.as_i64())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(item.price.cents())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }

    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(
            r#"
            SELECT id, seller_id, name, description, category, price, is_available, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn add_cart_entry(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<CartMutation> {
        let existing =
            sqlx::query("SELECT id, quantity FROM cart WHERE user_id = $1 AND item_id = $2")
                .bind(user_id.as_i64())
                .bind(item_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        if let Some(row) = existing {
            let entry_id: i64 = row.try_get("id")?;
            let new_quantity = row.try_get::<i32, _>("quantity")? + quantity as i32;
            sqlx::query("UPDATE cart SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(entry_id)
                .execute(&self.pool)
                .await?;
            return Ok(CartMutation::Incremented {
                entry_id: CartEntryId::new(entry_id),
                new_quantity: new_quantity as u32,
            });
        }

        let item_exists = sqlx::query("SELECT id FROM items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        if item_exists.is_none() {
            return Err(StoreError::ItemNotFound(item_id));
        }

        let entry_id: i64 = sqlx::query_scalar(
            "INSERT INTO cart (user_id, item_id, quantity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id.as_i64())
        .bind(item_id.as_i64())
        .bind(quantity as i32)
        .fetch_one(&self.pool)
        .await?;

        Ok(CartMutation::Added {
            entry_id: CartEntryId::new(entry_id),
            quantity,
        })
    }

    async fn set_cart_quantity(
        &self,
        user_id: UserId,
        entry_id: CartEntryId,
        quantity: u32,
    ) -> Result<u32> {
        let result = sqlx::query("UPDATE cart SET quantity = $1 WHERE id = $2 AND user_id = $3")
            .bind(quantity as i32)
            .bind(entry_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartEntryNotFound { user_id, entry_id });
        }
        Ok(quantity)
    }

    async fn remove_cart_entry(&self, user_id: UserId, entry_id: CartEntryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM cart WHERE id = $1 AND user_id = $2")
            .bind(entry_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartEntryNotFound { user_id, entry_id });
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id AS cart_id, c.item_id, c.quantity, c.created_at, i.name, i.price
            FROM cart c
            JOIN items i ON i.id = c.item_id
            WHERE c.user_id = $1
            ORDER BY c.created_at
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CartLine {
                    cart_id: CartEntryId::new(row.try_get("cart_id")?),
                    item_id: ItemId::new(row.try_get("item_id")?),
                    name: row.try_get("name")?,
                    price: Money::from_cents(row.try_get("price")?),
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<CheckoutReceipt> {
        let mut tx = self.pool.begin().await?;

        // Snapshot the cart joined with current prices. FOR UPDATE locks the
        // cart and item rows, so a concurrent checkout of the same cart
        // blocks here and re-reads the drained cart after this one commits.
        let rows = sqlx::query(
            r#"
            SELECT c.item_id, c.quantity, i.price
            FROM cart c
            JOIN items i ON i.id = c.item_id
            WHERE c.user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let item_id: i64 = row.try_get("item_id")?;
            let quantity: i32 = row.try_get("quantity")?;
            let price: i64 = row.try_get("price")?;
            lines.push((item_id, quantity, price));
        }

        let total_cents: i64 = lines
            .iter()
            .map(|(_, quantity, price)| price * i64::from(*quantity))
            .sum();
        tracing::debug!(%user_id, lines = lines.len(), total_cents, "checkout snapshot taken");

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, total_amount, shipping_address, payment_method, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id.as_i64())
        .bind(total_cents)
        .bind(shipping_address)
        .bind(payment_method)
        .bind(ORDER_STATUS_PENDING)
        .fetch_one(&mut *tx)
        .await?;

        for (item_id, quantity, price) in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, item_id, quantity, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(item_id)
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE items SET is_available = FALSE, updated_at = now() WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO order_history (user_id, order_id, status, notes) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id.as_i64())
        .bind(order_id)
        .bind(HISTORY_STATUS_PLACED)
        .bind(HISTORY_NOTES_PLACED)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CheckoutReceipt {
            order_id: OrderId::new(order_id),
            total_amount: Money::from_cents(total_cents),
        })
    }

    async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Option<OrderDetails>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, shipping_address, payment_method, status, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(order_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Self::row_to_order(row)?;

        let item_rows = sqlx::query(
            r#"
            SELECT oi.item_id, oi.quantity, oi.price, i.name, i.description
            FROM order_items oi
            JOIN items i ON i.id = oi.item_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .into_iter()
            .map(|row| {
                Ok(OrderLine {
                    item_id: ItemId::new(row.try_get("item_id")?),
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    price: Money::from_cents(row.try_get("price")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let history_rows = sqlx::query(
            r#"
            SELECT id, user_id, order_id, status, notes, created_at
            FROM order_history
            WHERE order_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let status_history = history_rows
            .into_iter()
            .map(Self::row_to_history)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderDetails {
            order,
            items,
            status_history,
        }))
    }

    async fn purchases(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, shipping_address, payment_method, status, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn donations(&self, user_id: UserId) -> Result<Vec<Donation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, center_name, status, scheduled_date, created_at
            FROM donations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_donation).collect()
    }

    async fn sold_items(&self, user_id: UserId) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, seller_id, name, description, category, price, is_available, created_at, updated_at
            FROM items
            WHERE seller_id = $1 AND is_available = FALSE
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn record_donation(&self, donation: NewDonation) -> Result<Donation> {
        let row = sqlx::query(
            r#"
            INSERT INTO donations (user_id, center_name, status, scheduled_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, center_name, status, scheduled_date, created_at
            "#,
        )
        .bind(donation.user_id.as_i64())
        .bind(&donation.center_name)
        .bind(&donation.status)
        .bind(donation.scheduled_date)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_donation(row)
    }
}
