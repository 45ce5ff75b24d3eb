//! Subscription plan catalog
//!
//! Plans are static configuration: the only per-user state is the chosen
//! [`PlanTier`]. Allowances use [`StoryAllowance`] internally and the `-1`
//! unlimited sentinel on the wire.

use super::keyword::keyword_enum;
use serde::{Serialize, Serializer};

keyword_enum! {
    /// Plan tier bounding monthly story quota and feature set
    pub enum PlanTier {
        /// Entry tier, small monthly allowance
        Free => "free",
        /// Paid tier with a larger allowance
        Basic => "basic",
        /// Paid tier without a monthly limit
        Premium => "premium",
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Free
    }
}

impl PlanTier {
    /// Resolve a stored plan id, defaulting to the free tier when unknown
    pub fn parse_or_free(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::debug!("Unknown plan id '{}', treating as free", raw);
            PlanTier::Free
        })
    }

    /// The catalog entry for this tier
    pub fn plan(&self) -> &'static SubscriptionPlan {
        match self {
            PlanTier::Free => &PLANS[0],
            PlanTier::Basic => &PLANS[1],
            PlanTier::Premium => &PLANS[2],
        }
    }
}

/// Number of stories a plan grants per billing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryAllowance {
    /// At most this many stories per cycle
    Limited(u32),
    /// No monthly cap
    Unlimited,
}

impl StoryAllowance {
    /// Wire representation: the limit, or `-1` for unlimited
    pub fn as_sentinel(&self) -> i64 {
        match self {
            StoryAllowance::Limited(n) => i64::from(*n),
            StoryAllowance::Unlimited => -1,
        }
    }

    /// The numeric limit, or `None` when unlimited
    pub fn limit(&self) -> Option<u32> {
        match self {
            StoryAllowance::Limited(n) => Some(*n),
            StoryAllowance::Unlimited => None,
        }
    }
}

impl Serialize for StoryAllowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_sentinel())
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    /// Plan id (`free`, `basic`, `premium`)
    pub id: PlanTier,
    /// Display name
    pub name: &'static str,
    /// Monthly price in USD
    #[serde(rename = "price")]
    pub monthly_price: f64,
    /// Stories allowed per billing cycle
    pub stories_per_month: StoryAllowance,
    /// Marketing feature list
    pub features: &'static [&'static str],
}

static PLANS: [SubscriptionPlan; 3] = [
    SubscriptionPlan {
        id: PlanTier::Free,
        name: "Free",
        monthly_price: 0.0,
        stories_per_month: StoryAllowance::Limited(3),
        features: &[
            "3 stories per month",
            "Basic story themes",
            "Standard length stories",
        ],
    },
    SubscriptionPlan {
        id: PlanTier::Basic,
        name: "Basic",
        monthly_price: 9.99,
        stories_per_month: StoryAllowance::Limited(25),
        features: &[
            "25 stories per month",
            "All story themes",
            "Longer stories",
            "Save favorite stories",
        ],
    },
    SubscriptionPlan {
        id: PlanTier::Premium,
        name: "Premium",
        monthly_price: 19.99,
        stories_per_month: StoryAllowance::Unlimited,
        features: &[
            "Unlimited stories",
            "All themes + exclusive ones",
            "Extra long stories",
            "Multiple children profiles",
            "Story illustrations",
            "PDF downloads",
        ],
    },
];

/// All plans, cheapest first
pub fn catalog() -> &'static [SubscriptionPlan] {
    &PLANS
}

/// Look up a plan by its id
pub fn find_plan(id: &str) -> Option<&'static SubscriptionPlan> {
    id.parse::<PlanTier>().ok().map(|tier| tier.plan())
}
