//! Checkout and order-history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::{Money, OrderId};
use domain::{DomainError, TimelineEntry};
use serde::{Deserialize, Serialize};
use store::{MarketStore, Order, OrderHistoryRow, OrderLine};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: &'static str,
    pub order_id: OrderId,
    pub total_amount: Money,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<TimelineEntry>,
}

#[derive(Serialize)]
pub struct OrderDetailsResponse {
    pub success: bool,
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub status_history: Vec<OrderHistoryRow>,
}

// -- Handlers --

/// POST /checkout — convert the cart into an order, atomically.
#[tracing::instrument(skip(state, headers, req))]
pub async fn checkout<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;

    let receipt = state
        .checkout
        .checkout(
            user.user_id,
            req.shipping_address.as_deref().unwrap_or(""),
            req.payment_method.as_deref().unwrap_or(""),
        )
        .await
        .map_err(|err| match err {
            // Storage failures roll the whole unit back; the caller gets a
            // generic failure, never a partial order.
            DomainError::Store(store_err) => {
                tracing::error!(error = %store_err, "checkout failed");
                ApiError::Internal("Checkout failed".to_string())
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(CheckoutResponse {
        success: true,
        message: "Order placed successfully",
        order_id: receipt.order_id,
        total_amount: receipt.total_amount,
    }))
}

/// GET /orders/history — unified purchase/donation/sale timeline.
#[tracing::instrument(skip(state, headers))]
pub async fn history<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    let history = state.history.timeline(user.user_id).await?;

    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

/// GET /orders/{id} — an order with its lines and status history.
#[tracing::instrument(skip(state, headers))]
pub async fn details<S: MarketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetailsResponse>, ApiError> {
    let user = state.tokens.authenticate(&headers)?;
    let details = state
        .history
        .order_details(user.user_id, OrderId::new(id))
        .await?;

    Ok(Json(OrderDetailsResponse {
        success: true,
        order: details.order,
        items: details.items,
        status_history: details.status_history,
    }))
}
