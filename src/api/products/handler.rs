//! Product API Handlers
//!
//! Every catalog write re-captures `offer_price` from the product's
//! category offer, so the stored effective price is always consistent with
//! the offer that was active at write time.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{
    CategoryOffer, Product, ProductCreate, ProductUpdate, Variant, VariantCreate, VariantUpdate,
};
use crate::db::repository::{
    CategoryRepository, ProductRepository, VariantRepository, parse_record_id,
};
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize, Validate)]
pub struct ProductCreateRequest {
    #[validate(length(min = 3))]
    pub name: String,
    #[validate(length(min = 1))]
    pub code: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductUpdateRequest {
    #[validate(length(min = 3))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
}

/// Product with its variants resolved
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

/// The offer currently attached to the product's category, for price capture
async fn category_offer(
    state: &ServerState,
    category: &surrealdb::RecordId,
) -> AppResult<Option<CategoryOffer>> {
    let repo = CategoryRepository::new(state.get_db());
    let category = repo
        .find_by_id(&category.to_string())
        .await?
        .ok_or_else(|| AppError::validation(format!("Category {category} does not exist")))?;
    Ok(category.offer)
}

/// List all products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.get_db());
    Ok(ok(repo.find_all().await?))
}

/// Get a product with its variants
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<ProductDetail>>> {
    let products = ProductRepository::new(state.get_db());
    let product = products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    let variants = match &product.id {
        Some(rid) => {
            VariantRepository::new(state.get_db())
                .find_by_product(rid)
                .await?
        }
        None => Vec::new(),
    };

    Ok(ok(ProductDetail { product, variants }))
}

/// Create a product (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreateRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let category = parse_record_id("category", &payload.category)?;
    let brand = payload
        .brand
        .as_deref()
        .map(|b| parse_record_id("brand", b))
        .transpose()?;
    let offer = category_offer(&state, &category).await?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .create(
            ProductCreate {
                name: payload.name,
                code: payload.code,
                description: payload.description,
                category,
                brand,
                price: payload.price,
                stock: payload.stock,
            },
            offer.as_ref(),
        )
        .await?;

    Ok(ok(product))
}

/// Update a product (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdateRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = ProductRepository::new(state.get_db());
    let existing = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    let category = match &payload.category {
        Some(c) => parse_record_id("category", c)?,
        None => existing.category.clone(),
    };
    let brand = payload
        .brand
        .as_deref()
        .map(|b| parse_record_id("brand", b))
        .transpose()?;
    let offer = category_offer(&state, &category).await?;

    let product = repo
        .update(
            &id,
            ProductUpdate {
                name: payload.name,
                description: payload.description,
                category: Some(category),
                brand,
                price: payload.price,
                stock: payload.stock,
            },
            offer.as_ref(),
        )
        .await?;

    Ok(ok(product))
}

/// Soft-delete a product (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;
    let repo = ProductRepository::new(state.get_db());
    repo.soft_delete(&id).await?;
    Ok(ok(true))
}

// =============================================================================
// Variants
// =============================================================================

/// List a product's variants
pub async fn list_variants(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Variant>>>> {
    let products = ProductRepository::new(state.get_db());
    let product = products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    let rid = product
        .id
        .ok_or_else(|| AppError::internal("Product without id"))?;

    let variants = VariantRepository::new(state.get_db())
        .find_by_product(&rid)
        .await?;
    Ok(ok(variants))
}

/// Add a variant under a product (admin). The product stops carrying its
/// own price/stock once variants exist.
pub async fn create_variant(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<VariantCreate>,
) -> AppResult<Json<AppResponse<Variant>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let products = ProductRepository::new(state.get_db());
    let product = products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    let rid = product
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Product without id"))?;

    let offer = category_offer(&state, &product.category).await?;
    let variants = VariantRepository::new(state.get_db());
    let variant = variants.create(rid.clone(), payload, offer.as_ref()).await?;

    if !product.has_variants {
        products.set_has_variants(&rid, true).await?;
    }

    Ok(ok(variant))
}

/// Update a variant (admin)
pub async fn update_variant(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((id, variant_id)): Path<(String, String)>,
    Json(payload): Json<VariantUpdate>,
) -> AppResult<Json<AppResponse<Variant>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let products = ProductRepository::new(state.get_db());
    let product = products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;

    let offer = category_offer(&state, &product.category).await?;
    let variants = VariantRepository::new(state.get_db());
    let variant = variants.update(&variant_id, payload, offer.as_ref()).await?;
    Ok(ok(variant))
}

/// Delete a variant (admin)
pub async fn delete_variant(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((id, variant_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<bool>>> {
    require_admin(&user)?;

    let products = ProductRepository::new(state.get_db());
    let product = products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    let rid = product
        .id
        .ok_or_else(|| AppError::internal("Product without id"))?;

    let variants = VariantRepository::new(state.get_db());
    variants.delete(&variant_id).await?;

    if variants.find_by_product(&rid).await?.is_empty() {
        products.set_has_variants(&rid, false).await?;
    }

    Ok(ok(true))
}
