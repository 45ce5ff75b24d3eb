//! Simulated plan changes
//!
//! No payment provider is involved: an upgrade is granted as soon as it is
//! requested. Both directions start a fresh billing cycle.

use crate::error::{Result, StoryMagicError};
use crate::metrics::record_subscription_change;
use crate::models::{find_plan, PlanTier, Subscription, SubscriptionPlan};
use crate::storage::StoryStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Move `subscription` to the paid plan `plan_id`
///
/// # Errors
///
/// Returns `StoryMagicError::InvalidPlan` if `plan_id` is unknown or `free`
pub fn apply_upgrade(
    subscription: &mut Subscription,
    plan_id: &str,
    now: DateTime<Utc>,
) -> Result<&'static SubscriptionPlan> {
    let plan = find_plan(plan_id)
        .filter(|plan| plan.id != PlanTier::Free)
        .ok_or_else(|| StoryMagicError::InvalidPlan(plan_id.to_string()))?;

    *subscription = Subscription::fresh(plan.id, now);
    Ok(plan)
}

/// Move `subscription` back to the free plan
pub fn apply_downgrade(subscription: &mut Subscription, now: DateTime<Utc>) -> &'static SubscriptionPlan {
    *subscription = Subscription::fresh(PlanTier::Free, now);
    PlanTier::Free.plan()
}

/// Applies plan changes and persists them
#[derive(Clone)]
pub struct SubscriptionManager {
    store: Arc<dyn StoryStore>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Upgrade the user with `email` to `plan_id`
    ///
    /// Returns the new plan together with the stored subscription state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlan` for unknown or free plan ids, `NotFound` when
    /// no user has `email`, or a storage error
    pub async fn upgrade(
        &self,
        email: &str,
        plan_id: &str,
    ) -> Result<(&'static SubscriptionPlan, Subscription)> {
        // Plan is checked before the user lookup
        if find_plan(plan_id).map_or(true, |plan| plan.id == PlanTier::Free) {
            return Err(StoryMagicError::InvalidPlan(plan_id.to_string()).into());
        }

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| StoryMagicError::NotFound("User".to_string()))?;

        let mut subscription = user.subscription.clone();
        let previous = subscription.plan;
        let plan = apply_upgrade(&mut subscription, plan_id, Utc::now())?;
        self.store
            .update_subscription(&user.id, &subscription)
            .await?;

        tracing::info!(
            user_id = %user.id,
            from = %previous,
            to = %plan.id,
            "Simulated subscription upgrade"
        );
        record_subscription_change(plan.id.as_str());
        Ok((plan, subscription))
    }

    /// Downgrade the user with `email` to the free plan
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no user has `email`, or a storage error
    pub async fn downgrade(&self, email: &str) -> Result<(&'static SubscriptionPlan, Subscription)> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| StoryMagicError::NotFound("User".to_string()))?;

        let mut subscription = user.subscription.clone();
        let previous = subscription.plan;
        let plan = apply_downgrade(&mut subscription, Utc::now());
        self.store
            .update_subscription(&user.id, &subscription)
            .await?;

        tracing::info!(
            user_id = %user.id,
            from = %previous,
            "Subscription downgraded to free"
        );
        record_subscription_change(plan.id.as_str());
        Ok((plan, subscription))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionStatus;
    use crate::storage::memory::DEMO_EMAIL;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn manager() -> (SubscriptionManager, MemoryStore) {
        let memory = MemoryStore::with_demo_data().unwrap();
        (SubscriptionManager::new(Arc::new(memory.clone())), memory)
    }

    #[test]
    fn test_apply_upgrade_resets_cycle() {
        let now = Utc::now();
        let mut sub = Subscription::fresh(PlanTier::Free, now - Duration::days(10));
        sub.stories_this_month = 3;

        let plan = apply_upgrade(&mut sub, "premium", now).unwrap();
        assert_eq!(plan.id, PlanTier::Premium);
        assert_eq!(sub.plan, PlanTier::Premium);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.stories_this_month, 0);
        assert_eq!(sub.reset_date, now + Duration::days(30));
    }

    #[test]
    fn test_apply_upgrade_rejects_free_and_unknown() {
        let now = Utc::now();
        let mut sub = Subscription::fresh(PlanTier::Basic, now);
        sub.stories_this_month = 4;
        let before = sub.clone();

        for id in ["free", "gold", ""] {
            let err = apply_upgrade(&mut sub, id, now).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<StoryMagicError>(),
                Some(StoryMagicError::InvalidPlan(_))
            ));
            assert_eq!(sub, before);
        }
    }

    #[test]
    fn test_apply_downgrade() {
        let now = Utc::now();
        let mut sub = Subscription::fresh(PlanTier::Premium, now);
        sub.stories_this_month = 40;

        let plan = apply_downgrade(&mut sub, now);
        assert_eq!(plan.id, PlanTier::Free);
        assert_eq!(sub.stories_this_month, 0);
        assert_eq!(sub.plan, PlanTier::Free);
    }

    #[tokio::test]
    async fn test_upgrade_persists() {
        let (manager, memory) = manager();
        let (plan, sub) = manager.upgrade(DEMO_EMAIL, "basic").await.unwrap();
        assert_eq!(plan.name, "Basic");
        assert_eq!(sub.stories_this_month, 0);

        let user = memory.get_user_by_email(DEMO_EMAIL).await.unwrap().unwrap();
        assert_eq!(user.subscription.plan, PlanTier::Basic);
    }

    #[tokio::test]
    async fn test_downgrade_persists() {
        let (manager, memory) = manager();
        manager.upgrade(DEMO_EMAIL, "premium").await.unwrap();
        manager.downgrade(DEMO_EMAIL).await.unwrap();

        let user = memory.get_user_by_email(DEMO_EMAIL).await.unwrap().unwrap();
        assert_eq!(user.subscription.plan, PlanTier::Free);
    }

    #[tokio::test]
    async fn test_invalid_plan_wins_over_unknown_user() {
        let (manager, _) = manager();
        let err = manager
            .upgrade("nobody@example.com", "free")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoryMagicError>(),
            Some(StoryMagicError::InvalidPlan(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (manager, _) = manager();
        let err = manager.downgrade("nobody@example.com").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoryMagicError>(),
            Some(StoryMagicError::NotFound(_))
        ));
    }
}
