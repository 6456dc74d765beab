use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::CurrentUser,
    error::ApiError,
    items::{
        dto::{
            page_offset, validate_page_params, AiMetadata, AiSearchPage, AiSearchParams,
            ItemCreate, ItemPage, ItemUpdate, ListParams, Pagination,
        },
        repo::Item,
    },
    state::AppState,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/search/ai", get(ai_search))
        .route(
            "/items/:id",
            patch(update_item).get(get_item).delete(delete_item),
        )
}

/// Existence before ownership: a truly absent row is NotFound, an
/// existing row owned by someone else is Forbidden.
fn authorize_access(item: Option<Item>, requester_id: Uuid) -> Result<Item, ApiError> {
    let item = item.ok_or(ApiError::NotFound("Item not found"))?;
    if item.user_id != requester_id {
        return Err(ApiError::Forbidden("Not authorized to access this item"));
    }
    Ok(item)
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 255 {
        return Err(ApiError::Validation(
            "Name must be between 1 and 255 characters".into(),
        ));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<(), ApiError> {
    if location.is_empty() || location.len() > 1000 {
        return Err(ApiError::Validation(
            "Location must be between 1 and 1000 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, user, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ItemCreate>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    validate_name(&payload.name)?;
    validate_location(&payload.location)?;

    let item = Item::create(&state.db, user.id, &payload.name, &payload.location)
        .await
        .map_err(ApiError::Internal)?;

    info!(item_id = %item.id, user_id = %user.id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, user))]
pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ItemPage>, ApiError> {
    validate_page_params(params.page, params.page_size)?;

    let page = fetch_page(
        &state,
        user.id,
        params.query.as_deref(),
        params.page,
        params.page_size,
    )
    .await?;
    Ok(Json(page))
}

#[instrument(skip(state, user))]
pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
    let item = Item::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let item = authorize_access(item, user.id)?;
    Ok(Json(item))
}

#[instrument(skip(state, user, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<Item>, ApiError> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(location) = &payload.location {
        validate_location(location)?;
    }

    let item = Item::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let item = authorize_access(item, user.id)?;

    let updated = Item::update(
        &state.db,
        item.id,
        payload.name.as_deref(),
        payload.location.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(item_id = %updated.id, user_id = %user.id, "item updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let item = Item::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let item = authorize_access(item, user.id)?;

    Item::delete(&state.db, item.id)
        .await
        .map_err(ApiError::Internal)?;

    info!(item_id = %item.id, user_id = %user.id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn ai_search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<AiSearchParams>,
) -> Result<Json<AiSearchPage>, ApiError> {
    validate_page_params(params.page, params.page_size)?;

    // The extractor never fails; remote errors degrade to the local
    // keyword fallback internally.
    let extracted = state.extractor.extract(&params.query).await;
    info!(original = %params.query, extracted = %extracted, "ai search terms");

    let page = fetch_page(
        &state,
        user.id,
        Some(extracted.as_str()),
        params.page,
        params.page_size,
    )
    .await?;

    Ok(Json(AiSearchPage {
        data: page.data,
        pagination: page.pagination,
        ai_metadata: AiMetadata {
            original_query: params.query,
            extracted_terms: extracted,
        },
    }))
}

async fn fetch_page(
    state: &AppState,
    user_id: Uuid,
    filter: Option<&str>,
    page: i64,
    page_size: i64,
) -> Result<ItemPage, ApiError> {
    let total_items = Item::count(&state.db, user_id, filter)
        .await
        .map_err(ApiError::Internal)?;

    let offset = page_offset(page, page_size);
    let data = Item::list_page(&state.db, user_id, filter, page_size, offset)
        .await
        .map_err(ApiError::Internal)?;

    Ok(ItemPage {
        data,
        pagination: Pagination::compute(page, page_size, total_items),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn item_owned_by(user_id: Uuid) -> Item {
        Item {
            id: Uuid::new_v4(),
            user_id,
            name: "Keys".into(),
            location: "Kitchen drawer".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn missing_item_is_not_found() {
        let err = authorize_access(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn foreign_item_is_forbidden() {
        let owner = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let err = authorize_access(Some(item_owned_by(owner)), requester).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn owned_item_is_allowed() {
        let owner = Uuid::new_v4();
        let item = authorize_access(Some(item_owned_by(owner)), owner).expect("allowed");
        assert_eq!(item.user_id, owner);
    }

    #[test]
    fn name_and_location_limits() {
        assert!(validate_name("Keys").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
        assert!(validate_location(&"x".repeat(1000)).is_ok());
        assert!(validate_location("").is_err());
        assert!(validate_location(&"x".repeat(1001)).is_err());
    }
}
