//! Dashboard overviews: `stats` for either role and the admin `affiliates` table.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;

use affiliate_core::Role;
use affiliate_core::ledger::{MonthlySummary, Referral};
use affiliate_core::report::short_date;
use chrono::{Datelike, Utc};

use crate::app::App;
use crate::fmt::{money, percent, truncate};

#[derive(clap::Args, Debug, Default)]
pub struct StatsArgs {
    /// Year for the monthly breakdown (defaults to the current year)
    #[arg(short, long)]
    pub year: Option<i32>,
    /// How many recent referrals to show
    #[arg(long, default_value_t = 5)]
    pub recent: usize,
    /// Print the headline numbers as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct AffiliatesArgs {
    /// Match affiliate name or email
    #[arg(short = 'q', long)]
    pub search: Option<String>,
}

/// Show the signed-in user's overview: their own numbers for an affiliate,
/// program totals for an admin.
pub fn run(args: &StatsArgs, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    let user = app.signed_in()?;
    let year = args.year.unwrap_or_else(|| Utc::now().year());
    let scope = match user.role {
        Role::Affiliate => Some(user.id.as_str()),
        Role::Admin => None,
    };

    match scope {
        Some(affiliate_id) => {
            let stats = app.ledger.affiliate_stats(affiliate_id);
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
                return Ok(());
            }
            writeln!(out, "Welcome back, {}!", user.full_name)?;
            writeln!(out)?;
            writeln!(out, "Total Earnings:   {}", money(stats.total_earnings))?;
            writeln!(out, "Pending Earnings: {}", money(stats.pending_earnings))?;
            writeln!(out, "Total Referrals:  {}", stats.total_referrals)?;
            writeln!(out, "Conversion Rate:  {}", percent(stats.conversion_rate))?;
            writeln!(
                out,
                "Referral Link:    {}",
                app.ledger.generate_affiliate_link(affiliate_id, Some(user))
            )?;
        }
        None => {
            let totals = app.ledger.program_totals();
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&totals)?)?;
                return Ok(());
            }
            writeln!(out, "Program Overview")?;
            writeln!(out)?;
            writeln!(out, "Total Revenue:       {}", money(totals.total_revenue))?;
            writeln!(out, "Total Commissions:   {}", money(totals.total_commissions))?;
            writeln!(out, "  Pending:           {}", money(totals.pending_commissions))?;
            writeln!(out, "  Approved:          {}", money(totals.approved_commissions))?;
            writeln!(out, "  Paid:              {}", money(totals.paid_commissions))?;
            writeln!(out, "Active Affiliates:   {}", totals.active_affiliates)?;
            writeln!(out, "Total Referrals:     {}", totals.total_referrals)?;
            writeln!(
                out,
                "Clicks/Conversions:  {}/{} ({})",
                totals.total_clicks,
                totals.total_conversions,
                percent(totals.conversion_rate)
            )?;
        }
    }

    writeln!(out, "\nRecent Referrals")?;
    recent(out, &app.ledger.recent_referrals(scope, args.recent))?;

    writeln!(out, "\nMonthly Breakdown ({year})")?;
    monthly(out, &app.ledger.monthly_breakdown(year, scope))
}

fn recent(out: &mut impl Write, referrals: &[&Referral]) -> anyhow::Result<()> {
    if referrals.is_empty() {
        writeln!(out, "  No referrals yet.")?;
    }
    for r in referrals {
        writeln!(
            out,
            "  {:<10}  {:<24}  {:<18}  {:>10}  {}",
            short_date(r.created_at),
            truncate(&r.customer_email, 24),
            truncate(&r.product_name, 18),
            money(r.commission),
            r.status
        )?;
    }
    Ok(())
}

fn monthly(out: &mut impl Write, months: &[MonthlySummary]) -> anyhow::Result<()> {
    let active: Vec<_> = months.iter().filter(|m| m.referrals > 0).collect();
    if active.is_empty() {
        writeln!(out, "  No activity.")?;
        return Ok(());
    }
    writeln!(
        out,
        "  {:<5}  {:>9}  {:>12}  {:>12}",
        "MONTH", "REFERRALS", "REVENUE", "COMMISSIONS"
    )?;
    for m in active {
        writeln!(
            out,
            "  {:<5}  {:>9}  {:>12}  {:>12}",
            m.label(),
            m.referrals,
            money(m.revenue),
            money(m.commissions)
        )?;
    }
    Ok(())
}

/// Admin table of affiliates with their numbers.
pub fn affiliates(args: &AffiliatesArgs, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    app.require(Role::Admin)?;
    let rows = app.identity.affiliates(args.search.as_deref());
    if rows.is_empty() {
        writeln!(out, "No affiliates found.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<36}  {:<20}  {:<24}  {:>9}  {:>10}  {:>10}  {:>7}  JOINED",
        "ID", "NAME", "EMAIL", "REFERRALS", "EARNED", "PENDING", "CONV"
    )?;
    for u in &rows {
        let stats = app.ledger.affiliate_stats(&u.id);
        writeln!(
            out,
            "{:<36}  {:<20}  {:<24}  {:>9}  {:>10}  {:>10}  {:>7}  {}",
            u.id,
            truncate(&u.full_name, 20),
            truncate(&u.email, 24),
            stats.total_referrals,
            money(stats.total_earnings),
            money(stats.pending_earnings),
            percent(stats.conversion_rate),
            short_date(u.created_at)
        )?;
    }
    writeln!(out, "\n{} affiliate(s)", rows.len())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    use crate::app::tests::{app, output, signed_in_as};

    fn args_for(year: i32) -> StatsArgs {
        StatsArgs {
            year: Some(year),
            recent: 5,
            json: false,
        }
    }

    #[test]
    fn affiliate_sees_own_numbers() {
        let app = signed_in_as(Role::Affiliate);
        let mut buf = Vec::new();
        run(&args_for(2024), &app, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Welcome back, John Affiliate!"));
        assert!(text.contains("Total Earnings:   $0.00"));
        assert!(text.contains("Pending Earnings: $119.40"));
        assert!(text.contains("Total Referrals:  2"));
        assert!(text.contains("Conversion Rate:  8.3%"));
        assert!(text.contains("https://mysite.com/?ref=john-affiliate"));
        assert!(text.contains("Jan"));
    }

    #[test]
    fn admin_sees_program_totals() {
        let app = signed_in_as(Role::Admin);
        let mut buf = Vec::new();
        run(&args_for(2024), &app, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Total Revenue:       $398.00"));
        assert!(text.contains("  Approved:          $89.70"));
        assert!(text.contains("Active Affiliates:   1"));
        assert!(text.contains("Clicks/Conversions:  145/12 (8.3%)"));
    }

    #[test]
    fn year_without_referrals_has_no_activity() {
        let app = signed_in_as(Role::Admin);
        let mut buf = Vec::new();
        run(&args_for(1999), &app, &mut buf).unwrap();
        assert!(output(buf).ends_with("No activity.\n"));
    }

    #[test]
    fn json_output_parses() {
        let app = signed_in_as(Role::Affiliate);
        let mut buf = Vec::new();
        let args = StatsArgs {
            json: true,
            ..args_for(2024)
        };
        run(&args, &app, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["total_referrals"], 2);
        assert_eq!(value["pending_earnings"], "119.40");
    }

    #[test]
    fn stats_need_a_session() {
        let app = app();
        assert!(run(&StatsArgs::default(), &app, &mut io::sink()).is_err());
    }

    #[test]
    fn affiliates_table_is_admin_only() {
        let app = signed_in_as(Role::Affiliate);
        assert!(affiliates(&AffiliatesArgs::default(), &app, &mut io::sink()).is_err());

        let app = signed_in_as(Role::Admin);
        let mut buf = Vec::new();
        affiliates(&AffiliatesArgs::default(), &app, &mut buf).unwrap();
        let text = output(buf);
        assert!(text.contains("John Affiliate"));
        assert!(!text.contains("Admin User"));
        assert!(text.contains("1 affiliate(s)"));
    }

    #[test]
    fn affiliate_search_without_match() {
        let app = signed_in_as(Role::Admin);
        let mut buf = Vec::new();
        let args = AffiliatesArgs {
            search: Some("nobody".into()),
        };
        affiliates(&args, &app, &mut buf).unwrap();
        assert_eq!(output(buf), "No affiliates found.\n");
    }
}
