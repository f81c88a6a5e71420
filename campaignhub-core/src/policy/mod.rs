//! Campaign ownership policy for HTTP handlers.
//!
//! A principal may list or create campaigns only when it has an advertiser,
//! and may view, update or delete a campaign only when that advertiser owns it.

use crate::domain::{Campaign, StringUuid};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

pub const NO_ADVERTISER_MESSAGE: &str = "No associated advertiser found.";
pub const UNAUTHORIZED_ACTION_MESSAGE: &str = "This action is unauthorized.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    ViewAny,
    Create,
    View,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy)]
pub enum ResourceScope<'a> {
    Collection,
    Campaign(&'a Campaign),
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub action: PolicyAction,
    pub scope: ResourceScope<'a>,
}

pub fn can_view_any(advertiser_id: Option<StringUuid>) -> bool {
    advertiser_id.is_some()
}

pub fn can_create(advertiser_id: Option<StringUuid>) -> bool {
    advertiser_id.is_some()
}

pub fn can_view(advertiser_id: Option<StringUuid>, campaign: &Campaign) -> bool {
    owns(advertiser_id, campaign)
}

pub fn can_update(advertiser_id: Option<StringUuid>, campaign: &Campaign) -> bool {
    owns(advertiser_id, campaign)
}

pub fn can_delete(advertiser_id: Option<StringUuid>, campaign: &Campaign) -> bool {
    owns(advertiser_id, campaign)
}

fn owns(advertiser_id: Option<StringUuid>, campaign: &Campaign) -> bool {
    advertiser_id == Some(campaign.advertiser_id)
}

/// Map a policy decision to `Ok(())` or `AppError::Forbidden`.
pub fn enforce(auth: &AuthUser, input: &PolicyInput<'_>) -> PolicyResult<()> {
    let advertiser_id = auth.advertiser_id;

    let allowed = match (input.action, input.scope) {
        (PolicyAction::ViewAny, _) => can_view_any(advertiser_id),
        (PolicyAction::Create, _) => can_create(advertiser_id),
        (PolicyAction::View, ResourceScope::Campaign(c)) => can_view(advertiser_id, c),
        (PolicyAction::Update, ResourceScope::Campaign(c)) => can_update(advertiser_id, c),
        (PolicyAction::Delete, ResourceScope::Campaign(c)) => can_delete(advertiser_id, c),
        (_, ResourceScope::Collection) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "{:?} requires a campaign scope",
                input.action
            )))
        }
    };

    if allowed {
        return Ok(());
    }

    match input.action {
        PolicyAction::ViewAny | PolicyAction::Create => {
            Err(AppError::Forbidden(NO_ADVERTISER_MESSAGE.to_string()))
        }
        _ => Err(AppError::Forbidden(UNAUTHORIZED_ACTION_MESSAGE.to_string())),
    }
}

/// Resolve the principal's advertiser for collection-level actions.
pub fn require_advertiser(auth: &AuthUser, action: PolicyAction) -> PolicyResult<StringUuid> {
    enforce(
        auth,
        &PolicyInput {
            action,
            scope: ResourceScope::Collection,
        },
    )?;
    auth.advertiser_id
        .ok_or_else(|| AppError::Forbidden(NO_ADVERTISER_MESSAGE.to_string()))
}
