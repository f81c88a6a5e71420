//! Registration, login and session endpoints

use crate::api::MessageResponse;
use crate::domain::{Advertiser, LoginInput, RegisterInput, User};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub advertiser: Advertiser,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: User,
    pub advertiser: Option<Advertiser>,
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Auth",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 422, description = "Validation failed")
    )
)]
/// Create a user with its advertiser and return a bearer token
pub async fn register<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    let account = state.auth_service().register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: account.user,
            advertiser: account.advertiser,
            token: account.token,
            message: "Registration successful".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 422, description = "Invalid credentials")
    )
)]
pub async fn login<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.auth_service().login(input).await?;

    Ok(Json(LoginResponse {
        user,
        token,
        message: "Login successful".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Unauthenticated")
    )
)]
/// Revoke the token used for this request
pub async fn logout<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>> {
    state.auth_service().logout(auth.token_id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user and advertiser", body = ProfileResponse),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn profile<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>> {
    let (user, advertiser) = state.auth_service().profile(auth.user_id).await?;
    Ok(Json(ProfileResponse { user, advertiser }))
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn current_user<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<Json<User>> {
    Ok(Json(state.auth_service().current_user(auth.user_id).await?))
}
