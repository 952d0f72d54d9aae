//! Listing route handlers: browse, create, buy, delete.

use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use torget_core::price::{format_price, parse_price};
use torget_core::{ListingId, UserId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::market::{ListingWithPhotos, NewListing};

/// Photo reference in a listing response. `key` is the handle for
/// `GET /photos/{key}`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    pub id: String,
    pub key: String,
    pub created_at: String,
}

/// Listing response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Decimal price string, e.g. "125.50".
    pub price: String,
    pub seller_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    pub created_at: String,
    pub photos: Vec<PhotoResponse>,
}

impl ListingResponse {
    fn from_model(lwp: &ListingWithPhotos) -> Self {
        Self {
            id: lwp.listing.id.to_string(),
            title: lwp.listing.title.clone(),
            description: lwp.listing.description.clone(),
            price: format_price(lwp.listing.price_cents),
            seller_id: lwp.listing.seller_id.to_string(),
            buyer_id: lwp.listing.buyer_id.map(|b| b.to_string()),
            created_at: lwp.listing.created_at.clone(),
            photos: lwp
                .photos
                .iter()
                .map(|p| PhotoResponse {
                    id: p.id.to_string(),
                    key: p.blob_key.clone(),
                    created_at: p.created_at.clone(),
                })
                .collect(),
        }
    }
}

/// Query parameters for DELETE /listings.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: String,
}

/// GET /listings
#[utoipa::path(
    get,
    path = "/listings",
    responses(
        (status = 200, description = "All listings still for sale, newest first", body = Vec<ListingResponse>)
    )
)]
pub async fn list_listings(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let open = ctx.market.list_open()?;
    let responses: Vec<ListingResponse> = open.iter().map(ListingResponse::from_model).collect();
    Ok(Json(responses))
}

/// POST /listings
///
/// Multipart form: `title`, `description`, `price` (decimal string), and
/// any number of `photos` file parts.
#[utoipa::path(
    post,
    path = "/listings",
    responses(
        (status = 200, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Invalid form data"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Photo storage failed")
    )
)]
pub async fn create_listing(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    mut multipart: Multipart,
) -> Result<Json<ListingResponse>, AppError> {
    let mut title = String::new();
    let mut description = String::new();
    let mut price_raw = String::new();
    let mut photos: Vec<Vec<u8>> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        torget_core::Error::Validation(format!("invalid multipart body: {e}"))
    })? {
        match field.name() {
            Some("title") => {
                title = field.text().await.map_err(|e| {
                    torget_core::Error::Validation(format!("invalid title field: {e}"))
                })?;
            }
            Some("description") => {
                description = field.text().await.map_err(|e| {
                    torget_core::Error::Validation(format!("invalid description field: {e}"))
                })?;
            }
            Some("price") => {
                price_raw = field.text().await.map_err(|e| {
                    torget_core::Error::Validation(format!("invalid price field: {e}"))
                })?;
            }
            Some("photos") => {
                let bytes = field.bytes().await.map_err(|e| {
                    torget_core::Error::Validation(format!("invalid photo upload: {e}"))
                })?;
                photos.push(bytes.to_vec());
            }
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    if title.trim().is_empty() {
        return Err(torget_core::Error::Validation("title is required".into()).into());
    }
    let price_cents = parse_price(&price_raw)?;

    let created = ctx.market.create_listing(
        NewListing {
            title,
            description,
            price_cents,
            photos,
        },
        user_id,
    )?;

    Ok(Json(ListingResponse::from_model(&created)))
}

/// PUT /listings/{id}/buy
#[utoipa::path(
    put,
    path = "/listings/{id}/buy",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing bought", body = ListingResponse),
        (status = 404, description = "Listing not found"),
        (status = 409, description = "Listing already sold")
    )
)]
pub async fn buy_listing(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing_id: ListingId = id
        .parse()
        .map_err(|_| torget_core::Error::Validation("Invalid listing ID".into()))?;

    let bought = ctx.market.buy(listing_id, user_id)?;
    Ok(Json(ListingResponse::from_model(&bought)))
}

/// DELETE /listings?id={id}
#[utoipa::path(
    delete,
    path = "/listings",
    params(("id" = String, Query, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing removed", body = ListingResponse),
        (status = 403, description = "Caller is not the seller"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn delete_listing(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    let listing_id: ListingId = params
        .id
        .parse()
        .map_err(|_| torget_core::Error::Validation("Invalid listing ID".into()))?;

    let removed = ctx.market.delete(listing_id, user_id)?;
    Ok(Json(ListingResponse::from_model(&removed)))
}
