//! Aggregates computed over the ledger.
//!
//! Every dashboard figure is derived here so the views never re-sum
//! commissions on their own.

use rust_decimal::Decimal;
use serde::Serialize;

/// Percentage of clicks that converted. Zero when there were no clicks.
#[allow(clippy::cast_precision_loss)]
pub fn conversion_rate(conversions: u64, clicks: u64) -> f64 {
    if clicks == 0 {
        return 0.0;
    }
    100.0 * conversions as f64 / clicks as f64
}

/// One affiliate's headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateStats {
    /// Commission already paid out.
    pub total_earnings: Decimal,
    /// Commission still pending or approved.
    pub pending_earnings: Decimal,
    pub total_referrals: usize,
    /// From the primary link; 0 when it has no clicks.
    pub conversion_rate: f64,
}

/// Program-wide numbers for the admin overview and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramTotals {
    pub total_revenue: Decimal,
    pub total_commissions: Decimal,
    pub pending_commissions: Decimal,
    pub approved_commissions: Decimal,
    pub paid_commissions: Decimal,
    /// Distinct affiliates with at least one referral.
    pub active_affiliates: usize,
    pub total_referrals: usize,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// 1-based month number.
    pub month: u32,
    pub revenue: Decimal,
    pub commissions: Decimal,
    pub referrals: usize,
}

impl MonthlySummary {
    pub const fn empty(month: u32) -> Self {
        Self {
            month,
            revenue: Decimal::ZERO,
            commissions: Decimal::ZERO,
            referrals: 0,
        }
    }

    /// Short English month name, e.g. `Jan`.
    pub fn label(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        self.month
            .checked_sub(1)
            .and_then(|i| NAMES.get(i as usize))
            .copied()
            .unwrap_or("?")
    }
}
