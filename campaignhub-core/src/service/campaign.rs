//! Campaign business logic

use crate::domain::{
    Campaign, CampaignFilter, CampaignWithPayouts, CreateCampaignInput, Payout, StringUuid,
    UpdateCampaignInput, UpdateStatusInput,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::policy::{self, PolicyAction, PolicyInput, ResourceScope};
use crate::repository::CampaignRepository;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;

pub struct CampaignService<C: CampaignRepository> {
    repo: Arc<C>,
}

impl<C: CampaignRepository> CampaignService<C> {
    pub fn new(repo: Arc<C>) -> Self {
        Self { repo }
    }

    /// One page of the caller's campaigns plus the unpaged total.
    pub async fn list(
        &self,
        auth: &AuthUser,
        filter: &CampaignFilter,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<CampaignWithPayouts>, i64)> {
        let advertiser_id = policy::require_advertiser(auth, PolicyAction::ViewAny)?;
        let offset = (page - 1).saturating_mul(per_page);

        let campaigns = self
            .repo
            .list_for_advertiser(advertiser_id, filter, offset, per_page)
            .await?;
        let total = self.repo.count_for_advertiser(advertiser_id, filter).await?;

        Ok((self.attach_payouts(campaigns).await?, total))
    }

    pub async fn create(
        &self,
        auth: &AuthUser,
        input: CreateCampaignInput,
    ) -> Result<CampaignWithPayouts> {
        let advertiser_id = policy::require_advertiser(auth, PolicyAction::Create)?;
        let new_campaign = input.into_new_campaign()?;

        let campaign = self.repo.create(advertiser_id, &new_campaign).await?;
        record_mutation("create");
        tracing::info!(campaign_id = %campaign.id, %advertiser_id, "Created campaign");

        self.load(campaign).await
    }

    pub async fn get(&self, auth: &AuthUser, id: StringUuid) -> Result<CampaignWithPayouts> {
        let campaign = self.authorize(auth, id, PolicyAction::View).await?;
        self.load(campaign).await
    }

    /// Apply the given fields; a supplied payout list replaces the stored one.
    pub async fn update(
        &self,
        auth: &AuthUser,
        id: StringUuid,
        input: UpdateCampaignInput,
    ) -> Result<CampaignWithPayouts> {
        let campaign = self.authorize(auth, id, PolicyAction::Update).await?;
        let changes = input.into_changes()?;

        if changes.is_empty() {
            return self.load(campaign).await;
        }

        // Payouts alone leave the campaign row and its updated_at untouched
        if changes.title.is_none() && changes.landing_page_url.is_none() {
            let payouts = changes.payouts.unwrap_or_default();
            let payouts = self.repo.replace_payouts(id, &payouts).await?;
            record_mutation("update");
            tracing::info!(campaign_id = %id, count = payouts.len(), "Replaced campaign payouts");
            return Ok(CampaignWithPayouts { campaign, payouts });
        }

        let updated = self.repo.update(id, &changes).await?;
        record_mutation("update");
        self.load(updated).await
    }

    pub async fn update_status(
        &self,
        auth: &AuthUser,
        id: StringUuid,
        input: UpdateStatusInput,
    ) -> Result<CampaignWithPayouts> {
        self.authorize(auth, id, PolicyAction::Update).await?;
        let status = input.into_status()?;

        let updated = self.repo.update_status(id, status).await?;
        record_mutation("update_status");
        tracing::info!(campaign_id = %id, status = %status, "Changed campaign status");
        self.load(updated).await
    }

    pub async fn delete(&self, auth: &AuthUser, id: StringUuid) -> Result<()> {
        self.authorize(auth, id, PolicyAction::Delete).await?;
        self.repo.delete(id).await?;
        record_mutation("delete");
        Ok(())
    }

    /// Fetch by id without an owner filter, then apply the ownership policy.
    async fn authorize(
        &self,
        auth: &AuthUser,
        id: StringUuid,
        action: PolicyAction,
    ) -> Result<Campaign> {
        let campaign = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        policy::enforce(
            auth,
            &PolicyInput {
                action,
                scope: ResourceScope::Campaign(&campaign),
            },
        )?;
        Ok(campaign)
    }

    async fn load(&self, campaign: Campaign) -> Result<CampaignWithPayouts> {
        let payouts = self.repo.list_payouts(&[campaign.id]).await?;
        Ok(CampaignWithPayouts { campaign, payouts })
    }

    async fn attach_payouts(&self, campaigns: Vec<Campaign>) -> Result<Vec<CampaignWithPayouts>> {
        if campaigns.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<StringUuid> = campaigns.iter().map(|c| c.id).collect();
        let mut by_campaign: HashMap<StringUuid, Vec<Payout>> = HashMap::new();
        for payout in self.repo.list_payouts(&ids).await? {
            by_campaign.entry(payout.campaign_id).or_default().push(payout);
        }

        Ok(campaigns
            .into_iter()
            .map(|campaign| {
                let payouts = by_campaign.remove(&campaign.id).unwrap_or_default();
                CampaignWithPayouts { campaign, payouts }
            })
            .collect())
    }
}

fn record_mutation(operation: &'static str) {
    counter!("campaignhub_campaign_mutations_total", "operation" => operation).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityStatus, Country, NewCampaign};
    use crate::policy::{NO_ADVERTISER_MESSAGE, UNAUTHORIZED_ACTION_MESSAGE};
    use crate::repository::campaign::MockCampaignRepository;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn principal(advertiser_id: Option<StringUuid>) -> AuthUser {
        AuthUser {
            user_id: StringUuid::new_v4(),
            email: "ann@example.com".to_string(),
            advertiser_id,
            token_id: StringUuid::new_v4(),
        }
    }

    fn owned_campaign(advertiser_id: StringUuid) -> Campaign {
        Campaign {
            advertiser_id,
            title: "Spring Sale".to_string(),
            landing_page_url: "https://example.com".to_string(),
            ..Default::default()
        }
    }

    fn payout(campaign_id: StringUuid, country: Country) -> Payout {
        Payout {
            id: StringUuid::new_v4(),
            campaign_id,
            country,
            payout_value: Decimal::new(10000, 2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(repo: MockCampaignRepository) -> CampaignService<MockCampaignRepository> {
        CampaignService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_create_persists_paused_campaign_with_payouts() {
        let advertiser_id = StringUuid::new_v4();
        let mut repo = MockCampaignRepository::new();
        repo.expect_create()
            .withf(move |adv, input: &NewCampaign| {
                *adv == advertiser_id && input.payouts.len() == 2 && input.title == "Spring Sale"
            })
            .returning(|adv, input| {
                Ok(Campaign {
                    advertiser_id: adv,
                    title: input.title.clone(),
                    landing_page_url: input.landing_page_url.clone(),
                    ..Default::default()
                })
            });
        repo.expect_list_payouts().returning(|ids| {
            Ok(vec![
                payout(ids[0], Country::Estonia),
                payout(ids[0], Country::Spain),
            ])
        });

        let input: CreateCampaignInput = serde_json::from_value(json!({
            "title": "Spring Sale",
            "landing_page_url": "https://example.com",
            "payouts": [
                {"country": "Estonia", "payout_value": 100},
                {"country": "Spain", "payout_value": 150}
            ]
        }))
        .unwrap();

        let created = service(repo)
            .create(&principal(Some(advertiser_id)), input)
            .await
            .unwrap();

        assert_eq!(created.campaign.activity_status, ActivityStatus::Paused);
        assert_eq!(created.payouts.len(), 2);
    }

    #[tokio::test]
    async fn test_create_without_advertiser_is_forbidden() {
        let mut repo = MockCampaignRepository::new();
        repo.expect_create().never();

        let err = service(repo)
            .create(&principal(None), CreateCampaignInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(msg) if msg == NO_ADVERTISER_MESSAGE));
    }

    #[tokio::test]
    async fn test_create_with_duplicate_countries_is_rejected() {
        let mut repo = MockCampaignRepository::new();
        repo.expect_create().never();

        let input: CreateCampaignInput = serde_json::from_value(json!({
            "title": "Spring Sale",
            "landing_page_url": "https://example.com",
            "payouts": [
                {"country": "estonia", "payout_value": 10},
                {"country": "Estonia", "payout_value": 20}
            ]
        }))
        .unwrap();

        let err = service(repo)
            .create(&principal(Some(StringUuid::new_v4())), input)
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains("payouts", "Each payout must have a unique country."))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_non_owner_is_forbidden() {
        let campaign = owned_campaign(StringUuid::new_v4());
        let id = campaign.id;
        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));

        let err = service(repo)
            .get(&principal(Some(StringUuid::new_v4())), id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(msg) if msg == UNAUTHORIZED_ACTION_MESSAGE));
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = service(repo)
            .get(&principal(Some(StringUuid::new_v4())), StringUuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_with_empty_body_does_not_write() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_update().never();
        repo.expect_replace_payouts().never();
        repo.expect_list_payouts().returning(|_| Ok(vec![]));

        let result = service(repo)
            .update(&principal(Some(advertiser_id)), id, UpdateCampaignInput::default())
            .await
            .unwrap();

        assert_eq!(result.campaign.title, "Spring Sale");
    }

    #[tokio::test]
    async fn test_update_validates_before_writing() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_update().never();
        repo.expect_replace_payouts().never();

        let input: UpdateCampaignInput = serde_json::from_value(json!({
            "payouts": [
                {"country": "Estonia", "payout_value": 1},
                {"country": "Spain", "payout_value": 1},
                {"country": "Bulgaria", "payout_value": 1},
                {"country": "Spain", "payout_value": 1}
            ]
        }))
        .unwrap();

        let err = service(repo)
            .update(&principal(Some(advertiser_id)), id, input)
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains("payouts", "A maximum of 3 payouts are allowed."));
                assert!(fields.contains("payouts", "Each payout must have a unique country."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_payouts_only_replaces_payouts() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_update().never();
        repo.expect_replace_payouts()
            .withf(move |campaign_id, payouts| {
                *campaign_id == id
                    && payouts.iter().map(|p| p.country).collect::<Vec<_>>()
                        == [Country::Spain, Country::Estonia]
            })
            .times(1)
            .returning(|campaign_id, payouts| {
                Ok(payouts
                    .iter()
                    .map(|p| payout(campaign_id, p.country))
                    .collect())
            });

        let input: UpdateCampaignInput = serde_json::from_value(json!({
            "payouts": [
                {"country": "Spain", "payout_value": 2},
                {"country": "Estonia", "payout_value": 1}
            ]
        }))
        .unwrap();

        let result = service(repo)
            .update(&principal(Some(advertiser_id)), id, input)
            .await
            .unwrap();

        assert_eq!(result.campaign.title, "Spring Sale");
        assert_eq!(result.payouts.len(), 2);
        assert_eq!(result.payouts[0].country, Country::Spain);
    }

    #[tokio::test]
    async fn test_update_title_and_payouts_writes_once() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;
        let renamed = Campaign {
            title: "Renamed".to_string(),
            ..campaign.clone()
        };

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_replace_payouts().never();
        repo.expect_update()
            .withf(|_, changes| {
                changes.title.as_deref() == Some("Renamed")
                    && changes.payouts.as_ref().map(Vec::len) == Some(1)
            })
            .times(1)
            .returning(move |_, _| Ok(renamed.clone()));
        repo.expect_list_payouts()
            .returning(move |_| Ok(vec![payout(id, Country::Bulgaria)]));

        let input: UpdateCampaignInput = serde_json::from_value(json!({
            "title": "Renamed",
            "payouts": [{"country": "Bulgaria", "payout_value": 3}]
        }))
        .unwrap();

        let result = service(repo)
            .update(&principal(Some(advertiser_id)), id, input)
            .await
            .unwrap();

        assert_eq!(result.campaign.title, "Renamed");
        assert_eq!(result.payouts[0].country, Country::Bulgaria);
    }

    #[tokio::test]
    async fn test_update_status_flips_status() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;
        let updated = Campaign {
            activity_status: ActivityStatus::Active,
            ..campaign.clone()
        };

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_update_status()
            .withf(|_, status| *status == ActivityStatus::Active)
            .returning(move |_, _| Ok(updated.clone()));
        repo.expect_list_payouts().returning(|_| Ok(vec![]));

        let input = UpdateStatusInput {
            activity_status: Some(json!("active")),
        };
        let result = service(repo)
            .update_status(&principal(Some(advertiser_id)), id, input)
            .await
            .unwrap();

        assert_eq!(result.campaign.activity_status, ActivityStatus::Active);
    }

    #[tokio::test]
    async fn test_update_status_non_owner_is_forbidden() {
        let campaign = owned_campaign(StringUuid::new_v4());
        let id = campaign.id;
        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_update_status().never();

        let input = UpdateStatusInput {
            activity_status: Some(json!("active")),
        };
        let err = service(repo)
            .update_status(&principal(Some(StringUuid::new_v4())), id, input)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_owner() {
        let advertiser_id = StringUuid::new_v4();
        let campaign = owned_campaign(advertiser_id);
        let id = campaign.id;

        let mut repo = MockCampaignRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(campaign.clone())));
        repo.expect_delete().times(1).returning(|_| Ok(()));

        service(repo)
            .delete(&principal(Some(advertiser_id)), id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_groups_payouts_by_campaign() {
        let advertiser_id = StringUuid::new_v4();
        let first = owned_campaign(advertiser_id);
        let second = owned_campaign(advertiser_id);
        let (first_id, second_id) = (first.id, second.id);

        let mut repo = MockCampaignRepository::new();
        repo.expect_list_for_advertiser()
            .withf(|_, _, offset, limit| *offset == 10 && *limit == 10)
            .returning(move |_, _, _, _| Ok(vec![first.clone(), second.clone()]));
        repo.expect_count_for_advertiser().returning(|_, _| Ok(12));
        repo.expect_list_payouts().returning(move |_| {
            Ok(vec![
                payout(first_id, Country::Estonia),
                payout(second_id, Country::Spain),
                payout(first_id, Country::Bulgaria),
            ])
        });

        let (items, total) = service(repo)
            .list(&principal(Some(advertiser_id)), &CampaignFilter::default(), 2, 10)
            .await
            .unwrap();

        assert_eq!(total, 12);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].payouts.len(), 2);
        assert_eq!(items[1].payouts[0].country, Country::Spain);
    }

    #[tokio::test]
    async fn test_list_without_advertiser_is_forbidden() {
        let err = service(MockCampaignRepository::new())
            .list(&principal(None), &CampaignFilter::default(), 1, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(msg) if msg == NO_ADVERTISER_MESSAGE));
    }
}
