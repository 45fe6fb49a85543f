//! Referral subcommands: list, add, approve, pay.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;

use affiliate_core::Role;
use affiliate_core::ledger::{NewReferral, Referral, ReferralFilter, ReferralStatus, StatusUpdate};
use affiliate_core::report::short_date;
use clap::Subcommand;
use rust_decimal::Decimal;

use crate::app::App;
use crate::fmt::{money, truncate};

/// Referral subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ReferralAction {
    /// List referrals. Affiliates only ever see their own.
    List {
        /// Only referrals in this status (pending, approved, paid)
        #[arg(short, long)]
        status: Option<ReferralStatus>,
        /// Match customer email or product name
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Only this affiliate's referrals (admin)
        #[arg(short, long)]
        affiliate: Option<String>,
        /// Show only the most recent N
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Record a referral (admin). It starts out pending.
    Add {
        #[arg(short, long)]
        affiliate: String,
        #[arg(short, long)]
        customer: String,
        #[arg(short, long)]
        product: String,
        /// Sale value in dollars
        #[arg(short, long)]
        value: Decimal,
        /// Commission in dollars; defaults to the program rate of the value
        #[arg(long)]
        commission: Option<Decimal>,
    },
    /// Approve a pending commission (admin)
    Approve {
        /// Referral ID
        id: String,
    },
    /// Mark a commission as paid (admin)
    Pay {
        /// Referral ID
        id: String,
    },
}

/// Execute a referral subcommand.
pub fn run(action: ReferralAction, app: &mut App, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        ReferralAction::List {
            status,
            search,
            affiliate,
            limit,
        } => {
            let user = app.signed_in()?;
            let affiliate_id = match user.role {
                Role::Affiliate => Some(user.id.clone()),
                Role::Admin => affiliate,
            };
            let filter = ReferralFilter {
                search,
                status,
                affiliate_id,
            };
            let mut referrals = app.ledger.search_referrals(&filter);
            referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if let Some(limit) = limit {
                referrals.truncate(limit);
            }
            print_table(out, &referrals)
        }
        ReferralAction::Add {
            affiliate,
            customer,
            product,
            value,
            commission,
        } => {
            app.require(Role::Admin)?;
            let referral = match commission {
                Some(commission) => app.ledger.add_referral(NewReferral {
                    affiliate_id: affiliate,
                    customer_email: customer,
                    product_name: product,
                    product_value: value,
                    commission,
                })?,
                None => app
                    .ledger
                    .record_sale(&affiliate, &customer, &product, value)?,
            };
            writeln!(
                out,
                "Referral {} added: {} commission on {}.",
                referral.id,
                money(referral.commission),
                money(referral.product_value)
            )?;
            Ok(())
        }
        ReferralAction::Approve { id } => set_status(app, &id, ReferralStatus::Approved, out),
        ReferralAction::Pay { id } => set_status(app, &id, ReferralStatus::Paid, out),
    }
}

fn set_status(
    app: &mut App,
    id: &str,
    status: ReferralStatus,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    app.require(Role::Admin)?;
    match app.ledger.update_referral_status(id, status)? {
        StatusUpdate::Updated { from, to } => {
            writeln!(out, "Referral {id}: {from} -> {to}")?;
            app.toaster.success(format!("Commission {to} successfully"));
        }
        StatusUpdate::Unchanged => writeln!(out, "Referral {id} is already {status}.")?,
        StatusUpdate::NotFound => writeln!(out, "Referral {id} not found.")?,
    }
    Ok(())
}

fn print_table(out: &mut impl Write, referrals: &[&Referral]) -> anyhow::Result<()> {
    if referrals.is_empty() {
        writeln!(out, "No referrals found.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<36}  {:<10}  {:<9}  {:<24}  {:<18}  {:>10}  {:>10}  {:<8}  PAID",
        "ID", "DATE", "AFFILIATE", "CUSTOMER", "PRODUCT", "VALUE", "COMMISSION", "STATUS"
    )?;
    for r in referrals {
        writeln!(
            out,
            "{:<36}  {:<10}  {:<9}  {:<24}  {:<18}  {:>10}  {:>10}  {:<8}  {}",
            r.id,
            short_date(r.created_at),
            truncate(&r.affiliate_id, 9),
            truncate(&r.customer_email, 24),
            truncate(&r.product_name, 18),
            money(r.product_value),
            money(r.commission),
            r.status,
            r.paid_at.map_or_else(|| "-".to_string(), short_date),
        )?;
    }
    writeln!(out, "\n{} referral(s)", referrals.len())?;
    Ok(())
}
