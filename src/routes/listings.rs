use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::listing_dto::{
        CreateListingPayload, ListingListResponse, ListingResponse, UpdateListingPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    services::filter::ListingFilters,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/public/listings",
    responses(
        (status = 200, description = "Published listings, featured first", body = Json<ListingListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn browse_listings(
    State(state): State<AppState>,
    Query(filters): Query<ListingFilters>,
) -> Result<impl IntoResponse> {
    let listings = state.listings_service.browse(&filters).await?;
    Ok(Json(ListingListResponse {
        items: listings.into_iter().map(ListingResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/public/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing detail", body = Json<ListingResponse>),
        (status = 404, description = "Listing not found or not published")
    )
)]
#[axum::debug_handler]
pub async fn get_public_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let listing = state.listings_service.get(id).await?;
    if listing.status != "published" {
        return Err(Error::NotFound(format!("listing {} not found", id)));
    }
    Ok(Json(ListingResponse::from(listing)))
}

#[utoipa::path(
    post,
    path = "/api/employer/listings",
    request_body = CreateListingPayload,
    responses(
        (status = 201, description = "Listing created", body = Json<ListingResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListingPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let employer_id = claims.user_id()?;
    let listing = state.listings_service.create(employer_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ListingResponse::from(listing))))
}

#[axum::debug_handler]
pub async fn list_my_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.user_id()?;
    let listings = state.listings_service.list_for_employer(employer_id).await?;
    Ok(Json(ListingListResponse {
        items: listings.into_iter().map(ListingResponse::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/employer/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = UpdateListingPayload,
    responses(
        (status = 200, description = "Listing updated", body = Json<ListingResponse>),
        (status = 403, description = "Listing belongs to another employer"),
        (status = 404, description = "Listing not found")
    )
)]
#[axum::debug_handler]
pub async fn update_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let employer_id = claims.user_id()?;
    let listing = state
        .listings_service
        .update(employer_id, id, payload)
        .await?;
    Ok(Json(ListingResponse::from(listing)))
}

#[utoipa::path(
    delete,
    path = "/api/employer/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 404, description = "Listing not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.user_id()?;
    state.listings_service.delete(employer_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Featuring is the one paid employer action; the charge comes off the
// employer's points ledger.
#[axum::debug_handler]
pub async fn feature_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.user_id()?;
    let listing = state.listings_service.feature(employer_id, id).await?;
    Ok(Json(ListingResponse::from(listing)))
}
