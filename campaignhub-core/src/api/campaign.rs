//! Campaign endpoints

use crate::api::{default_page, deserialize_page, deserialize_per_page, MessageResponse, PaginatedResponse};
use crate::domain::{
    ActivityStatus, CampaignFilter, CampaignWithPayouts, CreateCampaignInput, StringUuid,
    UpdateCampaignInput, UpdateStatusInput,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::policy::{self, PolicyAction};
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for `GET /api/campaigns`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCampaignsQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// `active` or `paused`
    pub activity_status: Option<String>,
    #[serde(default = "default_page", deserialize_with = "deserialize_page")]
    pub page: i64,
    #[serde(default, deserialize_with = "deserialize_per_page")]
    pub per_page: Option<i64>,
}

impl ListCampaignsQuery {
    fn filter(&self) -> Result<CampaignFilter> {
        let status = match self.activity_status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<ActivityStatus>().map_err(|_| {
                AppError::BadRequest("activity_status must be one of: active, paused".to_string())
            })?),
        };

        Ok(CampaignFilter {
            title_contains: self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            status,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    params(ListCampaignsQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of the caller's campaigns", body = PaginatedResponse<CampaignWithPayouts>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "No associated advertiser")
    )
)]
/// List the caller's campaigns, newest first
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<PaginatedResponse<CampaignWithPayouts>>> {
    let filter = query.filter()?;
    let per_page = state.config().pagination.per_page(query.per_page);

    let (campaigns, total) = state
        .campaign_service()
        .list(&auth, &filter, query.page, per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        campaigns, query.page, per_page, total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Campaigns",
    request_body = CreateCampaignInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Campaign created", body = CampaignWithPayouts),
        (status = 403, description = "No associated advertiser"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    body: std::result::Result<Json<CreateCampaignInput>, JsonRejection>,
) -> Result<Response> {
    // No advertiser means 403 whatever the body holds
    policy::require_advertiser(&auth, PolicyAction::Create)?;
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let campaign = state.campaign_service().create(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(campaign)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Campaign", body = CampaignWithPayouts),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CampaignWithPayouts>> {
    let campaign = state.campaign_service().get(&auth, parse_id(&id)?).await?;
    Ok(Json(campaign))
}

#[utoipa::path(
    put,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign id")),
    request_body = UpdateCampaignInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Campaign updated", body = CampaignWithPayouts),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Campaign not found"),
        (status = 422, description = "Validation failed")
    )
)]
/// Update fields; a supplied `payouts` list replaces the existing set
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateCampaignInput>,
) -> Result<Json<CampaignWithPayouts>> {
    let campaign = state
        .campaign_service()
        .update(&auth, parse_id(&id)?, input)
        .await?;
    Ok(Json(campaign))
}

#[utoipa::path(
    patch,
    path = "/api/campaigns/{id}/status",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign id")),
    request_body = UpdateStatusInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status changed", body = CampaignWithPayouts),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Campaign not found"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_status<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatusInput>,
) -> Result<Json<CampaignWithPayouts>> {
    let campaign = state
        .campaign_service()
        .update_status(&auth, parse_id(&id)?, input)
        .await?;
    Ok(Json(campaign))
}

#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = String, Path, description = "Campaign id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Campaign deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .campaign_service()
        .delete(&auth, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("Campaign deleted successfully.")))
}

/// Ids that are not UUIDs can never match a row.
fn parse_id(raw: &str) -> Result<StringUuid> {
    StringUuid::parse_str(raw).map_err(|_| AppError::NotFound("Campaign not found".to_string()))
}
