//! Product endpoints: catalog create and the sale-facing search.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use rms_core::{validation, Product, ValidationError, SEARCH_RESULT_LIMIT};
use rms_db::repository::product::generate_product_id;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Matched against name and barcode. Empty returns default results.
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub barcode: String,
    pub price_cents: i64,
    pub discount_bps: u32,
    /// Retail price with the product's own discount applied, so the POS
    /// screen shows what the customer pays without re-deriving it.
    pub discounted_price_cents: i64,
    pub stock_quantity: i64,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let discounted_price_cents = p.discounted_price().cents();
        ProductDto {
            id: p.id,
            name: p.name,
            barcode: p.barcode,
            price_cents: p.price_cents,
            discount_bps: p.discount_bps,
            discounted_price_cents,
            stock_quantity: p.stock_quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub barcode: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    #[serde(default)]
    pub discount_bps: u32,
    /// Opening stock. Later movements go through the audited adjustment
    /// and checkout paths only.
    #[serde(default)]
    pub stock_quantity: i64,
    pub category_id: Option<String>,
}

/// `POST /api/pos/products`
///
/// Field rules are checked before any row is written; a duplicate barcode
/// comes back as a 400.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    validation::validate_product_fields(
        &request.name,
        &request.barcode,
        request.price_cents,
        request.cost_cents,
        request.discount_bps,
    )?;

    if request.stock_quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        name: request.name.trim().to_string(),
        barcode: request.barcode,
        price_cents: request.price_cents,
        cost_cents: request.cost_cents,
        discount_bps: request.discount_bps,
        stock_quantity: request.stock_quantity,
        category_id: request.category_id,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;

    Ok(Json(ProductDto::from(product)))
}

/// `GET /api/pos/products/search?q=...`
///
/// In-stock products only, best-discount first, capped at 50 rows.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let query = validation::validate_search_query(&params.q)?;

    let products = state
        .db
        .products()
        .search(&query, SEARCH_RESULT_LIMIT)
        .await?;

    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}
