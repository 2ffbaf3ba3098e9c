//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::{CartEntryId, ItemId, Money};
use serde::{Deserialize, Serialize};
use store::{CartLine, CartMutation, MarketStore};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub item_id: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub success: bool,
    pub cart_items: Vec<CartLine>,
    pub total_price: Money,
    pub item_count: usize,
}

#[derive(Serialize)]
pub struct AddToCartResponse {
    pub success: bool,
    pub message: &'static str,
    pub cart_item_id: CartEntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_quantity: Option<u32>,
}

#[derive(Serialize)]
pub struct UpdateQuantityResponse {
    pub success: bool,
    pub message: &'static str,
    pub cart_item_id: CartEntryId,
    pub new_quantity: u32,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

// -- Handlers --

/// GET /cart — the cart joined with current prices, plus computed totals.
#[tracing::instrument(skip(state, headers))]
pub async fn get_cart<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    let view = state.cart.get_cart(user.user_id).await?;

    Ok(Json(CartResponse {
        success: true,
        cart_items: view.lines,
        total_price: view.total_price,
        item_count: view.item_count,
    }))
}

/// POST /cart — add an item, incrementing the row if it is already there.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    let (Some(item_id), Some(quantity)) = (req.item_id, req.quantity) else {
        return Err(ApiError::BadRequest(
            "Item ID and quantity are required".to_string(),
        ));
    };

    let mutation = state
        .cart
        .add_item(user.user_id, ItemId::new(item_id), quantity)
        .await?;

    let response = match mutation {
        CartMutation::Added { entry_id, .. } => AddToCartResponse {
            success: true,
            message: "Item added to cart",
            cart_item_id: entry_id,
            new_quantity: None,
        },
        CartMutation::Incremented {
            entry_id,
            new_quantity,
        } => AddToCartResponse {
            success: true,
            message: "Item quantity updated in cart",
            cart_item_id: entry_id,
            new_quantity: Some(new_quantity),
        },
    };

    Ok(Json(response))
}

/// PUT /cart/{id} — set the quantity of a cart row.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<UpdateQuantityResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    let Some(quantity) = req.quantity else {
        return Err(ApiError::BadRequest("Quantity is required".to_string()));
    };

    let entry_id = CartEntryId::new(id);
    let new_quantity = state
        .cart
        .update_quantity(user.user_id, entry_id, quantity)
        .await?;

    Ok(Json(UpdateQuantityResponse {
        success: true,
        message: "Cart item updated",
        cart_item_id: entry_id,
        new_quantity,
    }))
}

/// DELETE /cart/{id} — remove a cart row.
#[tracing::instrument(skip(state, headers))]
pub async fn remove<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    state.cart.remove(user.user_id, CartEntryId::new(id)).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Item removed from cart",
    }))
}

/// DELETE /cart — empty the cart.
#[tracing::instrument(skip(state, headers))]
pub async fn clear<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    state.cart.clear(user.user_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Cart cleared",
    }))
}
