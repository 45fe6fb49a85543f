//! Referral ledger.
//!
//! Owns every [`Referral`] and [`AffiliateLink`] for the lifetime of the
//! process. Nothing here is persisted; a fresh ledger starts from the seed
//! data. Lookups that miss never fail loudly: they report `NotFound`/`None`
//! or contribute zero to an aggregate.

pub mod stats;
pub mod types;

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::ProgramConfig;
use crate::error::{Error, Result};
use crate::identity::User;
use crate::seed;

pub use stats::{AffiliateStats, MonthlySummary, ProgramTotals, conversion_rate};
pub use types::{
    AffiliateLink, NamedLinkRequest, NewReferral, Referral, ReferralFilter, ReferralStatus,
    StatusUpdate,
};

/// Render a tracking URL: `<base_url>/?ref=<code>`.
pub fn link_url(base_url: &str, code: &str) -> String {
    format!("{}/?ref={code}", base_url.trim_end_matches('/'))
}

/// In-memory store of referrals and tracking links.
#[derive(Debug, Clone)]
pub struct Ledger {
    referrals: Vec<Referral>,
    links: Vec<AffiliateLink>,
    program: ProgramConfig,
}

impl Ledger {
    /// An empty ledger.
    pub const fn new(program: ProgramConfig) -> Self {
        Self {
            referrals: Vec::new(),
            links: Vec::new(),
            program,
        }
    }

    /// A ledger holding the mock dataset.
    pub fn seeded(program: ProgramConfig) -> Self {
        Self {
            referrals: seed::referrals(),
            links: seed::links(&program.base_url),
            program,
        }
    }

    pub const fn program(&self) -> &ProgramConfig {
        &self.program
    }

    // ---- referrals ----

    /// Append a referral. It always starts out pending; the commission is
    /// taken as given, but the product value may not be negative.
    pub fn add_referral(&mut self, new: NewReferral) -> Result<&Referral> {
        if new.product_value < Decimal::ZERO {
            return Err(Error::NegativeAmount(new.product_value));
        }
        let referral = Referral {
            id: uuid::Uuid::new_v4().to_string(),
            affiliate_id: new.affiliate_id,
            customer_email: new.customer_email,
            product_name: new.product_name,
            product_value: new.product_value,
            commission: new.commission,
            status: ReferralStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
        };
        info!(
            referral_id = %referral.id,
            affiliate_id = %referral.affiliate_id,
            commission = %referral.commission,
            "Referral added"
        );
        self.referrals.push(referral);
        Ok(&self.referrals[self.referrals.len() - 1])
    }

    /// Add a referral whose commission is the program rate of `product_value`.
    pub fn record_sale(
        &mut self,
        affiliate_id: &str,
        customer_email: &str,
        product_name: &str,
        product_value: Decimal,
    ) -> Result<&Referral> {
        let rate = self.program.commission_rate;
        self.add_referral(NewReferral::from_sale(
            affiliate_id,
            customer_email,
            product_name,
            product_value,
            rate,
        ))
    }

    /// Move a referral to `status`.
    ///
    /// Unknown ids and no-op moves leave the ledger untouched. Moving
    /// backwards is refused. Entering `paid` stamps `paid_at`.
    pub fn update_referral_status(
        &mut self,
        id: &str,
        status: ReferralStatus,
    ) -> Result<StatusUpdate> {
        let Some(referral) = self.referrals.iter_mut().find(|r| r.id == id) else {
            debug!(referral_id = id, "Status update for unknown referral ignored");
            return Ok(StatusUpdate::NotFound);
        };

        let from = referral.status;
        if from == status {
            return Ok(StatusUpdate::Unchanged);
        }
        if !from.can_advance_to(status) {
            return Err(Error::InvalidTransition { from, to: status });
        }

        referral.status = status;
        if status == ReferralStatus::Paid {
            referral.paid_at = Some(Utc::now());
        }
        info!(referral_id = id, %from, to = %status, "Referral status changed");
        Ok(StatusUpdate::Updated { from, to: status })
    }

    pub fn referral(&self, id: &str) -> Option<&Referral> {
        self.referrals.iter().find(|r| r.id == id)
    }

    /// Every referral, in insertion order.
    pub fn referrals(&self) -> &[Referral] {
        &self.referrals
    }

    /// One affiliate's referrals, newest first.
    pub fn referrals_for(&self, affiliate_id: &str) -> Vec<&Referral> {
        let mut out: Vec<_> = self
            .referrals
            .iter()
            .filter(|r| r.affiliate_id == affiliate_id)
            .collect();
        out.sort_by_key(|r| Reverse(r.created_at));
        out
    }

    /// The `limit` newest referrals, across the program or for one affiliate.
    pub fn recent_referrals(&self, affiliate_id: Option<&str>, limit: usize) -> Vec<&Referral> {
        let mut out: Vec<_> = self
            .referrals
            .iter()
            .filter(|r| affiliate_id.is_none_or(|a| r.affiliate_id == a))
            .collect();
        out.sort_by_key(|r| Reverse(r.created_at));
        out.truncate(limit);
        out
    }

    /// Referrals matching `filter`, in insertion order.
    pub fn search_referrals(&self, filter: &ReferralFilter) -> Vec<&Referral> {
        self.referrals.iter().filter(|r| filter.matches(r)).collect()
    }

    // ---- links ----

    /// The primary tracking URL for `affiliate_id`.
    ///
    /// Uses the viewer's slug when the viewer is that affiliate, otherwise the
    /// raw id. Pure: the same inputs always give the same URL.
    pub fn generate_affiliate_link(&self, affiliate_id: &str, viewer: Option<&User>) -> String {
        let code = viewer
            .filter(|u| u.id == affiliate_id)
            .and_then(|u| u.slug.as_deref())
            .unwrap_or(affiliate_id);
        link_url(&self.program.base_url, code)
    }

    pub fn links(&self) -> &[AffiliateLink] {
        &self.links
    }

    pub fn links_for(&self, affiliate_id: &str) -> Vec<&AffiliateLink> {
        self.links
            .iter()
            .filter(|l| l.affiliate_id == affiliate_id)
            .collect()
    }

    /// The first link registered for an affiliate.
    pub fn primary_link(&self, affiliate_id: &str) -> Option<&AffiliateLink> {
        self.links.iter().find(|l| l.affiliate_id == affiliate_id)
    }

    pub fn record_click(&mut self, link_id: &str) -> Option<&AffiliateLink> {
        let link = self.links.iter_mut().find(|l| l.id == link_id)?;
        link.clicks = link.clicks.saturating_add(1);
        debug!(link_id, clicks = link.clicks, "Click recorded");
        Some(&*link)
    }

    /// Count a conversion. Refused when every click has already converted.
    pub fn record_conversion(&mut self, link_id: &str) -> Result<Option<&AffiliateLink>> {
        let Some(link) = self.links.iter_mut().find(|l| l.id == link_id) else {
            return Ok(None);
        };
        if link.conversions >= link.clicks {
            return Err(Error::ConversionExceedsClicks {
                link_id: link_id.to_string(),
            });
        }
        link.conversions += 1;
        debug!(link_id, conversions = link.conversions, "Conversion recorded");
        Ok(Some(&*link))
    }

    /// Ask for an extra named link. Named links are not offered yet, so this
    /// never creates anything.
    pub fn request_named_link(&self, affiliate_id: &str, name: &str) -> NamedLinkRequest {
        let name = name.trim();
        if name.is_empty() {
            return NamedLinkRequest::Rejected;
        }
        debug!(affiliate_id, name, "Named link requested");
        NamedLinkRequest::Unsupported {
            name: name.to_string(),
        }
    }

    // ---- aggregates ----

    pub fn affiliate_stats(&self, affiliate_id: &str) -> AffiliateStats {
        let mut total_earnings = Decimal::ZERO;
        let mut pending_earnings = Decimal::ZERO;
        let mut total_referrals = 0;

        for r in self.referrals.iter().filter(|r| r.affiliate_id == affiliate_id) {
            total_referrals += 1;
            if r.status == ReferralStatus::Paid {
                total_earnings += r.commission;
            } else if r.status.is_outstanding() {
                pending_earnings += r.commission;
            }
        }

        let conversion_rate = self
            .primary_link(affiliate_id)
            .map_or(0.0, |l| conversion_rate(l.conversions, l.clicks));

        AffiliateStats {
            total_earnings,
            pending_earnings,
            total_referrals,
            conversion_rate,
        }
    }

    pub fn program_totals(&self) -> ProgramTotals {
        let mut totals = ProgramTotals {
            total_revenue: Decimal::ZERO,
            total_commissions: Decimal::ZERO,
            pending_commissions: Decimal::ZERO,
            approved_commissions: Decimal::ZERO,
            paid_commissions: Decimal::ZERO,
            active_affiliates: 0,
            total_referrals: self.referrals.len(),
            total_clicks: 0,
            total_conversions: 0,
            conversion_rate: 0.0,
        };
        let mut affiliates = HashSet::new();

        for r in &self.referrals {
            totals.total_revenue += r.product_value;
            totals.total_commissions += r.commission;
            match r.status {
                ReferralStatus::Pending => totals.pending_commissions += r.commission,
                ReferralStatus::Approved => totals.approved_commissions += r.commission,
                ReferralStatus::Paid => totals.paid_commissions += r.commission,
            }
            affiliates.insert(r.affiliate_id.as_str());
        }
        totals.active_affiliates = affiliates.len();

        for l in &self.links {
            totals.total_clicks += l.clicks;
            totals.total_conversions += l.conversions;
        }
        totals.conversion_rate = conversion_rate(totals.total_conversions, totals.total_clicks);
        totals
    }

    /// Revenue, commissions and referral counts for each month of `year`,
    /// optionally restricted to one affiliate.
    pub fn monthly_breakdown(&self, year: i32, affiliate_id: Option<&str>) -> Vec<MonthlySummary> {
        let mut months: Vec<_> = (1..=12).map(MonthlySummary::empty).collect();
        for r in &self.referrals {
            if r.created_at.year() != year || affiliate_id.is_some_and(|a| r.affiliate_id != a) {
                continue;
            }
            if let Some(m) = months.get_mut(r.created_at.month0() as usize) {
                m.revenue += r.product_value;
                m.commissions += r.commission;
                m.referrals += 1;
            }
        }
        months
    }
}
