//! Point-of-sale endpoints: checkout, payment completion, customer
//! annotation.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rms_core::{validation, CartLine, PaymentMethod};
use rms_db::PaymentRequest;

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cashier_id: String,
    pub cart: Vec<CartLineDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale_id: String,
    pub receipt_number: String,
    pub total_cents: i64,
    pub discount_cents: i64,
}

/// `POST /api/pos/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let cart: Vec<CartLine> = request
        .cart
        .into_iter()
        .map(|line| CartLine {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect();

    let receipt = state.checkout.checkout(&request.cashier_id, &cart).await?;

    Ok(Json(CheckoutResponse {
        sale_id: receipt.sale_id,
        receipt_number: receipt.receipt_number,
        total_cents: receipt.total_cents,
        discount_cents: receipt.discount_cents,
    }))
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestDto {
    pub payment_method: PaymentMethod,
    pub cash_received_cents: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub sale_id: String,
    pub receipt_number: String,
    pub change_cents: Option<i64>,
}

/// `POST /api/pos/sales/{id}/payment`
pub async fn complete_payment(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Json(request): Json<PaymentRequestDto>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let outcome = state
        .checkout
        .complete_payment(
            &sale_id,
            PaymentRequest {
                method: request.payment_method,
                cash_received_cents: request.cash_received_cents,
            },
        )
        .await?;

    Ok(Json(PaymentResponse {
        sale_id: outcome.sale_id,
        receipt_number: outcome.receipt_number,
        change_cents: outcome.change_cents,
    }))
}

// =============================================================================
// Customer Annotation
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub customer_name: String,
    pub customer_mobile: String,
}

/// `POST /api/pos/sales/{id}/customer`
///
/// The one mutation allowed on a completed sale.
pub async fn set_customer(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Json(request): Json<CustomerRequest>,
) -> Result<(), ApiError> {
    validation::validate_customer_mobile(&request.customer_mobile)?;

    state
        .db
        .sales()
        .set_customer_details(&sale_id, &request.customer_name, &request.customer_mobile)
        .await?;

    Ok(())
}
