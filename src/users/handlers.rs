use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{MessageResponse, PublicUser},
        extractors::AuthUser,
    },
    error::AppResult,
    extract::{AppJson, AppPath},
    state::AppState,
    users::dto::{AddFavoriteRequest, CountryCode, UpdateProfileRequest},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/user/profile",
        get(get_profile).put(update_profile).delete(delete_account),
    )
}

pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/user/favorites", get(list_favorites).post(add_favorite))
        .route("/user/favorites/:country_code", delete(remove_favorite))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state.profiles.get_profile(user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let update = payload.validate()?;
    let user = state.profiles.update_profile(user_id, update).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.profiles.delete_account(user_id).await?;
    Ok(Json(MessageResponse::new("User account deleted successfully")))
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.profiles.list_favorites(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<AddFavoriteRequest>,
) -> AppResult<Json<Vec<String>>> {
    let code = payload.validate()?;
    Ok(Json(state.profiles.add_favorite(user_id, code).await?))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(country_code): AppPath<String>,
) -> AppResult<Json<Vec<String>>> {
    let code = CountryCode::parse(&country_code)?;
    Ok(Json(state.profiles.remove_favorite(user_id, code).await?))
}
