//! Premium visibility rule for predictions.
//!
//! A premium prediction's detail is visible iff the requester holds a paid tier
//! or has an access grant for that prediction. Free predictions are visible to
//! everyone, anonymous requesters included.

use chrono::{DateTime, Utc};

use crate::config::AccessConfig;
use crate::entities::{prediction_entity, user_entity};

/// Outcome of the checks that need no grant lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
    /// Free-tier user on a premium prediction: the answer depends on a grant row.
    NeedsGrant,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    enforce_subscription_expiry: bool,
}

impl AccessPolicy {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            enforce_subscription_expiry: config.enforce_subscription_expiry,
        }
    }

    /// Whether the user's tier unlocks premium content at `now`.
    ///
    /// Expiry is only consulted when enforcement is switched on; a paid tier
    /// without an expiry date never lapses.
    pub fn has_paid_tier(&self, user: &user_entity::Model, now: DateTime<Utc>) -> bool {
        if !user.subscription_tier.is_paid() {
            return false;
        }
        if !self.enforce_subscription_expiry {
            return true;
        }
        user.subscription_expiry.is_none_or(|expiry| expiry > now)
    }

    pub fn decide(
        &self,
        user: Option<&user_entity::Model>,
        prediction: &prediction_entity::Model,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        if !prediction.is_premium {
            return AccessDecision::Allowed;
        }
        match user {
            None => AccessDecision::Denied,
            Some(u) if self.has_paid_tier(u, now) => AccessDecision::Allowed,
            Some(_) => AccessDecision::NeedsGrant,
        }
    }

    pub fn can_view_prediction(
        &self,
        user: Option<&user_entity::Model>,
        prediction: &prediction_entity::Model,
        has_grant: bool,
        now: DateTime<Utc>,
    ) -> bool {
        match self.decide(user, prediction, now) {
            AccessDecision::Allowed => true,
            AccessDecision::Denied => false,
            AccessDecision::NeedsGrant => has_grant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::predictions::PredictionStatus;
    use crate::entities::users::{SubscriptionTier, UserRole};
    use chrono::Duration;

    fn user(tier: SubscriptionTier, expiry: Option<DateTime<Utc>>) -> user_entity::Model {
        user_entity::Model {
            id: "u-1".into(),
            email: Some("fan@example.com".into()),
            first_name: None,
            last_name: None,
            profile_image_url: None,
            subscription_tier: tier,
            subscription_expiry: expiry,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn prediction(is_premium: bool) -> prediction_entity::Model {
        prediction_entity::Model {
            id: 7,
            match_date: Utc::now(),
            team1: "Nantes".into(),
            team2: "Rennes".into(),
            venue: None,
            championship: "Ligue 1".into(),
            prediction_type: "1N2".into(),
            prediction: "2".into(),
            odds: Some(2.4),
            confidence: Some(4),
            analysis: Some("Rennes in form".into()),
            status: PredictionStatus::Scheduled,
            actual_result: None,
            is_premium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lenient() -> AccessPolicy {
        AccessPolicy::new(&AccessConfig::default())
    }

    fn strict() -> AccessPolicy {
        AccessPolicy::new(&AccessConfig {
            enforce_subscription_expiry: true,
            ..AccessConfig::default()
        })
    }

    #[test]
    fn test_free_prediction_visible_to_everyone() {
        let policy = lenient();
        let p = prediction(false);
        let now = Utc::now();
        assert!(policy.can_view_prediction(None, &p, false, now));
        for tier in [SubscriptionTier::Free, SubscriptionTier::Pro, SubscriptionTier::Expert] {
            assert!(policy.can_view_prediction(Some(&user(tier, None)), &p, false, now));
        }
    }

    #[test]
    fn test_premium_prediction_hidden_from_anonymous() {
        let policy = lenient();
        let p = prediction(true);
        assert_eq!(policy.decide(None, &p, Utc::now()), AccessDecision::Denied);
        // A grant flag cannot help a requester without identity
        assert!(!policy.can_view_prediction(None, &p, true, Utc::now()));
    }

    #[test]
    fn test_free_tier_needs_grant() {
        let policy = lenient();
        let p = prediction(true);
        let u = user(SubscriptionTier::Free, None);
        let now = Utc::now();
        assert_eq!(policy.decide(Some(&u), &p, now), AccessDecision::NeedsGrant);
        assert!(policy.can_view_prediction(Some(&u), &p, true, now));
        assert!(!policy.can_view_prediction(Some(&u), &p, false, now));
    }

    #[test]
    fn test_paid_tiers_see_everything_without_grant() {
        let policy = lenient();
        let p = prediction(true);
        let now = Utc::now();
        for tier in [SubscriptionTier::Pro, SubscriptionTier::Expert] {
            let u = user(tier, None);
            assert_eq!(policy.decide(Some(&u), &p, now), AccessDecision::Allowed);
            assert!(policy.can_view_prediction(Some(&u), &p, false, now));
        }
    }

    #[test]
    fn test_expired_tier_still_counts_without_enforcement() {
        let now = Utc::now();
        let u = user(SubscriptionTier::Pro, Some(now - Duration::days(3)));
        assert!(lenient().can_view_prediction(Some(&u), &prediction(true), false, now));
    }

    #[test]
    fn test_expired_tier_falls_back_to_grant_with_enforcement() {
        let now = Utc::now();
        let p = prediction(true);
        let expired = user(SubscriptionTier::Expert, Some(now - Duration::days(1)));
        let active = user(SubscriptionTier::Expert, Some(now + Duration::days(1)));
        let open_ended = user(SubscriptionTier::Pro, None);

        let policy = strict();
        assert_eq!(policy.decide(Some(&expired), &p, now), AccessDecision::NeedsGrant);
        assert!(policy.can_view_prediction(Some(&expired), &p, true, now));
        assert!(policy.can_view_prediction(Some(&active), &p, false, now));
        assert!(policy.can_view_prediction(Some(&open_ended), &p, false, now));
    }
}
