//! Ledger record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle of a referral's commission. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Approved,
    Paid,
}

impl ReferralStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Paid];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Whether `next` is a forward move from `self`. Staying put is not a move.
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }

    /// Commission in this state still counts towards pending earnings.
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| Error::UnknownValue {
                kind: "referral status",
                value: s.to_string(),
            })
    }
}

/// A customer conversion attributed to one affiliate.
///
/// `paid_at` is set if and only if `status` is [`ReferralStatus::Paid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub id: String,
    pub affiliate_id: String,
    pub customer_email: String,
    pub product_name: String,
    pub product_value: Decimal,
    pub commission: Decimal,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Caller-supplied part of a new referral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReferral {
    pub affiliate_id: String,
    pub customer_email: String,
    pub product_name: String,
    pub product_value: Decimal,
    pub commission: Decimal,
}

impl NewReferral {
    /// Build a referral whose commission is `rate` of the product value,
    /// rounded to cents.
    pub fn from_sale(
        affiliate_id: impl Into<String>,
        customer_email: impl Into<String>,
        product_name: impl Into<String>,
        product_value: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            affiliate_id: affiliate_id.into(),
            customer_email: customer_email.into(),
            product_name: product_name.into(),
            product_value,
            commission: (product_value * rate).round_dp(2),
        }
    }
}

/// A trackable URL with click and conversion counters.
///
/// Counters only grow and `conversions <= clicks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateLink {
    pub id: String,
    pub affiliate_id: String,
    pub url: String,
    pub clicks: u64,
    pub conversions: u64,
    pub created_at: DateTime<Utc>,
}

/// What a status update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated {
        from: ReferralStatus,
        to: ReferralStatus,
    },
    /// Already in the requested state; nothing was touched.
    Unchanged,
    /// No referral has that id; nothing was touched.
    NotFound,
}

/// Answer to a request for an extra named tracking link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedLinkRequest {
    /// Name was blank.
    Rejected,
    /// Named links are not available yet; nothing was created.
    Unsupported { name: String },
}

/// Admin-side referral search.
#[derive(Debug, Clone, Default)]
pub struct ReferralFilter {
    /// Case-insensitive substring of customer email or product name.
    pub search: Option<String>,
    pub status: Option<ReferralStatus>,
    pub affiliate_id: Option<String>,
}

impl ReferralFilter {
    pub fn matches(&self, referral: &Referral) -> bool {
        if let Some(status) = self.status
            && referral.status != status
        {
            return false;
        }
        if let Some(affiliate) = &self.affiliate_id
            && &referral.affiliate_id != affiliate
        {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(needle) if !needle.is_empty() => {
                referral.customer_email.to_lowercase().contains(&needle)
                    || referral.product_name.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}
