//! Store-level tests for cart operations and the atomic checkout unit.

use common::{CartEntryId, ItemId, Money, UserId};
use store::{CartMutation, InMemoryStore, MarketStore, NewItem, StoreError};

fn listing(seller: i64, name: &str, price_cents: i64) -> NewItem {
    NewItem {
        seller_id: UserId::new(seller),
        name: name.to_string(),
        description: Some(format!("{name} in good condition")),
        category: Some("clothing".to_string()),
        price: Money::from_cents(price_cents),
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn add_creates_entry_then_increments() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Jacket", 1500)).await.unwrap();

        let first = store.add_cart_entry(user, item.id, 2).await.unwrap();
        let CartMutation::Added { entry_id, quantity } = first else {
            panic!("expected a new entry, got {first:?}");
        };
        assert_eq!(quantity, 2);

        let second = store.add_cart_entry(user, item.id, 3).await.unwrap();
        assert_eq!(
            second,
            CartMutation::Incremented {
                entry_id,
                new_quantity: 5
            }
        );

        // Still a single row for the (user, item) pair.
        let lines = store.get_cart(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn add_unknown_item_fails() {
        let store = InMemoryStore::new();
        let err = store
            .add_cart_entry(UserId::new(3), ItemId::new(404), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn set_quantity_checks_ownership() {
        let store = InMemoryStore::new();
        let owner = UserId::new(3);
        let stranger = UserId::new(4);
        let item = store.insert_item(listing(9, "Scarf", 500)).await.unwrap();
        let mutation = store.add_cart_entry(owner, item.id, 1).await.unwrap();

        let err = store
            .set_cart_quantity(stranger, mutation.entry_id(), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CartEntryNotFound { .. }));

        let updated = store
            .set_cart_quantity(owner, mutation.entry_id(), 7)
            .await
            .unwrap();
        assert_eq!(updated, 7);
    }

    #[tokio::test]
    async fn remove_missing_entry_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .remove_cart_entry(UserId::new(3), CartEntryId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CartEntryNotFound { .. }));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Belt", 300)).await.unwrap();
        store.add_cart_entry(user, item.id, 1).await.unwrap();

        store.clear_cart(user).await.unwrap();
        store.clear_cart(user).await.unwrap();
        assert!(store.get_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_cart_joins_catalog_name_and_price() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Boots", 2499)).await.unwrap();
        store.add_cart_entry(user, item.id, 2).await.unwrap();

        let lines = store.get_cart(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Boots");
        assert_eq!(lines[0].price.cents(), 2499);
        assert_eq!(lines[0].item_id, item.id);
    }
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn checkout_drains_cart_and_flips_availability() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let seller = UserId::new(9);
        let jacket = store
            .insert_item(listing(seller.as_i64(), "Jacket", 1500))
            .await
            .unwrap();
        let scarf = store
            .insert_item(listing(seller.as_i64(), "Scarf", 999))
            .await
            .unwrap();
        store.add_cart_entry(user, jacket.id, 2).await.unwrap();
        store.add_cart_entry(user, scarf.id, 1).await.unwrap();

        let receipt = store.checkout(user, "1 Main St", "card").await.unwrap();
        assert_eq!(receipt.total_amount.cents(), 3999);

        assert!(store.get_cart(user).await.unwrap().is_empty());
        assert!(!store.get_item(jacket.id).await.unwrap().unwrap().is_available);
        assert!(!store.get_item(scarf.id).await.unwrap().unwrap().is_available);

        let details = store
            .get_order(user, receipt.order_id)
            .await
            .unwrap()
            .expect("order must exist for its owner");
        assert_eq!(details.order.status, "pending");
        assert_eq!(details.order.total_amount.cents(), 3999);
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.status_history.len(), 1);
        assert_eq!(details.status_history[0].status, "placed");
    }

    #[tokio::test]
    async fn checkout_freezes_price_at_sale_time() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Lamp", 1000)).await.unwrap();
        store.add_cart_entry(user, item.id, 1).await.unwrap();

        let receipt = store.checkout(user, "1 Main St", "card").await.unwrap();
        let details = store
            .get_order(user, receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.items[0].price.cents(), 1000);
    }

    #[tokio::test]
    async fn empty_cart_fails_without_creating_an_order() {
        let store = InMemoryStore::new();
        let err = store
            .checkout(UserId::new(3), "1 Main St", "card")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyCart));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn second_checkout_of_same_cart_sees_empty_cart() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Chair", 4500)).await.unwrap();
        store.add_cart_entry(user, item.id, 1).await.unwrap();

        store.checkout(user, "1 Main St", "card").await.unwrap();
        let err = store.checkout(user, "1 Main St", "card").await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyCart));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn failure_mid_checkout_leaves_no_trace() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Desk", 8000)).await.unwrap();
        store.add_cart_entry(user, item.id, 1).await.unwrap();

        store.fail_next_checkout().await;
        let err = store.checkout(user, "1 Main St", "card").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        // No order, item still available, cart exactly as it was.
        assert_eq!(store.order_count().await, 0);
        assert!(store.get_item(item.id).await.unwrap().unwrap().is_available);
        let lines = store.get_cart(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1);

        // The failure is one-shot; a retry succeeds.
        let receipt = store.checkout(user, "1 Main St", "card").await.unwrap();
        assert_eq!(receipt.total_amount.cents(), 8000);
    }

    #[tokio::test]
    async fn concurrent_checkouts_double_spend_is_impossible() {
        let store = InMemoryStore::new();
        let user = UserId::new(3);
        let item = store.insert_item(listing(9, "Bike", 12000)).await.unwrap();
        store.add_cart_entry(user, item.id, 1).await.unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.checkout(user, "1 Main St", "card").await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.checkout(user, "1 Main St", "card").await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let empty_carts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::EmptyCart)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(empty_carts, 1);
        assert_eq!(store.order_count().await, 1);
    }
}

mod reads {
    use super::*;
    use chrono::NaiveDate;
    use store::NewDonation;

    #[tokio::test]
    async fn order_is_invisible_to_other_users() {
        let store = InMemoryStore::new();
        let buyer = UserId::new(3);
        let other = UserId::new(4);
        let item = store.insert_item(listing(9, "Vase", 700)).await.unwrap();
        store.add_cart_entry(buyer, item.id, 1).await.unwrap();
        let receipt = store.checkout(buyer, "1 Main St", "card").await.unwrap();

        assert!(store.get_order(other, receipt.order_id).await.unwrap().is_none());
        assert!(store.get_order(buyer, receipt.order_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sold_items_lists_only_unavailable_listings_of_the_seller() {
        let store = InMemoryStore::new();
        let seller = UserId::new(9);
        let buyer = UserId::new(3);
        let sold = store
            .insert_item(listing(seller.as_i64(), "Hat", 400))
            .await
            .unwrap();
        store
            .insert_item(listing(seller.as_i64(), "Gloves", 600))
            .await
            .unwrap();
        store.add_cart_entry(buyer, sold.id, 1).await.unwrap();
        store.checkout(buyer, "1 Main St", "card").await.unwrap();

        let sales = store.sold_items(seller).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id, sold.id);
    }

    #[tokio::test]
    async fn donations_are_scoped_to_the_user() {
        let store = InMemoryStore::new();
        store
            .record_donation(NewDonation {
                user_id: UserId::new(3),
                center_name: "Goodwill Downtown".to_string(),
                status: "scheduled".to_string(),
                scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(store.donations(UserId::new(3)).await.unwrap().len(), 1);
        assert!(store.donations(UserId::new(4)).await.unwrap().is_empty());
    }
}
