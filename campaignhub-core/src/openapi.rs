//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates handler path annotations and domain schemas into a single
//! OpenAPI specification. Swagger UI is served in non-production environments.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CampaignHub Core API",
        version = "0.1.0",
        description = "Advertiser campaign management with per-country payouts",
        license(name = "Proprietary"),
        contact(name = "CampaignHub Team")
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Registration, login and personal access tokens"),
        (name = "Campaigns", description = "Campaigns and their payouts"),
    ),
    components(
        schemas(
            crate::api::PaginationMeta,
            crate::api::MessageResponse,
            crate::api::health::HealthResponse,
            crate::api::auth::RegisterResponse,
            crate::api::auth::LoginResponse,
            crate::api::auth::ProfileResponse,

            crate::domain::StringUuid,
            crate::domain::User,
            crate::domain::Advertiser,
            crate::domain::RegisterInput,
            crate::domain::LoginInput,

            crate::domain::Campaign,
            crate::domain::CampaignWithPayouts,
            crate::domain::ActivityStatus,
            crate::domain::CreateCampaignInput,
            crate::domain::UpdateCampaignInput,
            crate::domain::UpdateStatusInput,
            crate::domain::Payout,
            crate::domain::NewPayout,
            crate::domain::Country,
        ),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,

        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::profile,
        crate::api::auth::current_user,

        crate::api::campaign::list,
        crate::api::campaign::create,
        crate::api::campaign::get,
        crate::api::campaign::update,
        crate::api::campaign::update_status,
        crate::api::campaign::delete,
    ),
)]
pub struct ApiDoc;

/// Security scheme definition added via modify
impl ApiDoc {
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(c) = doc.components.as_mut() {
            c.security_schemes.insert(
                "bearer_auth".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}
