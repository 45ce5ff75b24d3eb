//! Monthly story quota
//!
//! Decides whether a user may generate another story in the current
//! billing cycle. The lazy cycle reset is applied inside the same
//! evaluation, so a user whose reset date has passed is checked against a
//! zeroed counter rather than being waved through.

use crate::error::{Result, StoryMagicError};
use crate::models::{billing_cycle, PlanTier, Subscription, User};
use chrono::{DateTime, Duration, Utc};

/// Outcome of a quota evaluation
///
/// # Fields
///
/// * `plan` - Plan the decision was made against
/// * `allowed` - Whether one more story may be generated
/// * `used` - Stories generated this cycle (after any reset)
/// * `limit` - Plan allowance, `None` when unlimited
/// * `reset` - Whether the evaluation rolled the cycle over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub plan: PlanTier,
    pub allowed: bool,
    pub used: u32,
    pub limit: Option<u32>,
    pub reset: bool,
}

impl QuotaDecision {
    /// Stories left this cycle, or `None` when unlimited
    ///
    /// # Examples
    ///
    /// ```
    /// use storymagic::models::{PlanTier, Subscription};
    /// use storymagic::subscription::quota::evaluate;
    /// use chrono::Utc;
    ///
    /// let now = Utc::now();
    /// let mut sub = Subscription::fresh(PlanTier::Free, now);
    /// sub.stories_this_month = 1;
    /// assert_eq!(evaluate(&mut sub, now).remaining(), Some(2));
    /// ```
    pub fn remaining(&self) -> Option<u32> {
        self.limit.map(|max| max.saturating_sub(self.used))
    }

    /// Convert a denial into `StoryMagicError::QuotaExceeded`
    pub fn ensure_allowed(self) -> Result<Self> {
        if self.allowed {
            return Ok(self);
        }
        Err(StoryMagicError::QuotaExceeded {
            plan: self.plan.to_string(),
            used: self.used,
            limit: self.limit.unwrap_or(0),
        }
        .into())
    }
}

/// Roll the billing cycle over if its reset date has passed
///
/// Zeroes the counter and advances the reset date by whole cycles until it
/// lies in the future. Returns `true` when a reset happened.
pub fn refresh_cycle(subscription: &mut Subscription, now: DateTime<Utc>) -> bool {
    if now <= subscription.reset_date {
        return false;
    }

    let cycle_secs = billing_cycle().num_seconds();
    let behind_secs = (now - subscription.reset_date).num_seconds();
    let cycles = behind_secs / cycle_secs + 1;

    subscription.stories_this_month = 0;
    subscription.reset_date = subscription.reset_date + Duration::seconds(cycle_secs * cycles);

    tracing::debug!(
        reset_date = %subscription.reset_date,
        cycles,
        "Billing cycle rolled over"
    );
    true
}

/// Apply any pending cycle reset, then check the plan allowance
///
/// Mutates `subscription` only when a reset happens; the caller is
/// responsible for persisting it (see [`QuotaDecision::reset`]).
pub fn evaluate(subscription: &mut Subscription, now: DateTime<Utc>) -> QuotaDecision {
    let reset = refresh_cycle(subscription, now);
    let limit = subscription.plan.plan().stories_per_month.limit();
    let used = subscription.stories_this_month;

    QuotaDecision {
        plan: subscription.plan,
        allowed: limit.map_or(true, |max| used < max),
        used,
        limit,
        reset,
    }
}

/// Pure predicate: may `user` generate another story at `now`?
pub fn can_generate(user: &User, now: DateTime<Utc>) -> bool {
    let mut subscription = user.subscription.clone();
    evaluate(&mut subscription, now).allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(plan: PlanTier, used: u32) -> (Subscription, DateTime<Utc>) {
        let now = Utc::now();
        let mut sub = Subscription::fresh(plan, now);
        sub.stories_this_month = used;
        (sub, now)
    }

    #[test]
    fn test_limited_plans_deny_at_limit() {
        for (plan, limit) in [(PlanTier::Free, 3), (PlanTier::Basic, 25)] {
            let (mut sub, now) = subscription(plan, limit - 1);
            assert!(evaluate(&mut sub, now).allowed);

            let (mut sub, now) = subscription(plan, limit);
            let decision = evaluate(&mut sub, now);
            assert!(!decision.allowed);
            assert_eq!(decision.remaining(), Some(0));
        }
    }

    #[test]
    fn test_unlimited_plan_always_allows() {
        for used in [0, 3, 25, 10_000, u32::MAX] {
            let (mut sub, now) = subscription(PlanTier::Premium, used);
            let decision = evaluate(&mut sub, now);
            assert!(decision.allowed);
            assert_eq!(decision.limit, None);
            assert_eq!(decision.remaining(), None);
        }
    }

    #[test]
    fn test_no_reset_before_reset_date() {
        let (mut sub, now) = subscription(PlanTier::Free, 2);
        let before = sub.reset_date;
        assert!(!refresh_cycle(&mut sub, now));
        assert_eq!(sub.stories_this_month, 2);
        assert_eq!(sub.reset_date, before);
    }

    #[test]
    fn test_reset_zeroes_counter_and_advances_date() {
        let (mut sub, now) = subscription(PlanTier::Free, 3);
        sub.reset_date = now - Duration::days(1);

        let decision = evaluate(&mut sub, now);
        assert!(decision.reset);
        assert!(decision.allowed);
        assert_eq!(decision.used, 0);
        assert_eq!(sub.stories_this_month, 0);
        assert!(sub.reset_date > now);
        assert_eq!(sub.reset_date, now - Duration::days(1) + Duration::days(30));
    }

    #[test]
    fn test_reset_skips_whole_missed_cycles() {
        let (mut sub, now) = subscription(PlanTier::Basic, 25);
        let stale = now - Duration::days(95);
        sub.reset_date = stale;

        assert!(refresh_cycle(&mut sub, now));
        assert_eq!(sub.reset_date, stale + Duration::days(120));
        assert!(sub.reset_date > now);
        assert!(sub.reset_date - now <= Duration::days(30));
    }

    #[test]
    fn test_can_generate_does_not_mutate() {
        let now = Utc::now();
        let mut sub = Subscription::fresh(PlanTier::Free, now);
        sub.stories_this_month = 3;
        sub.reset_date = now - Duration::hours(1);
        let user = User {
            id: "u".to_string(),
            parent_name: "P".to_string(),
            email: "p@example.com".to_string(),
            password_hash: String::new(),
            subscription: sub.clone(),
            children: vec![],
            created_at: now,
        };

        assert!(can_generate(&user, now));
        assert_eq!(user.subscription, sub);
    }

    #[test]
    fn test_ensure_allowed_maps_to_quota_error() {
        let (mut sub, now) = subscription(PlanTier::Free, 3);
        let err = evaluate(&mut sub, now).ensure_allowed().unwrap_err();
        match err.downcast_ref::<StoryMagicError>() {
            Some(StoryMagicError::QuotaExceeded { plan, used, limit }) => {
                assert_eq!(plan, "free");
                assert_eq!(*used, 3);
                assert_eq!(*limit, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
