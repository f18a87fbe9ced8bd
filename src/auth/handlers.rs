use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
    },
    error::AppResult,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/user/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let registration = payload.validate()?;
    let user = state.auth.register(registration).await?;
    let token = state.auth.issue_token(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.auth.login(payload.validate()?).await?;
    Ok(Json(AuthResponse {
        token: session.token,
        user: PublicUser::from(session.user),
    }))
}

/// Tokens are stateless, so there is nothing to revoke; the client drops its
/// copy and the token lapses at `exp`.
#[instrument(skip(_state))]
pub async fn logout(
    State(_state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<MessageResponse> {
    info!(user_id = %user_id, "user logged out");
    Json(MessageResponse::new("Logged out successfully"))
}
