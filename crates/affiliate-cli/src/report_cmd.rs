//! CSV export: the program report for admins, earnings for affiliates.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;
use std::path::PathBuf;

use affiliate_core::Role;
use affiliate_core::ledger::{Referral, ReferralFilter, ReferralStatus};
use affiliate_core::report::{ReportKind, export_csv};
use chrono::Utc;
use tracing::info;

use crate::app::App;

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Directory to write the CSV file into
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,
    /// Write the CSV to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
    /// Only referrals in this status (admin report)
    #[arg(short, long)]
    pub status: Option<ReferralStatus>,
}

/// Export the signed-in user's report.
pub fn run(args: &ReportArgs, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    let user = app.signed_in()?;
    let (kind, referrals): (_, Vec<&Referral>) = match user.role {
        Role::Admin => (
            ReportKind::Admin,
            app.ledger.search_referrals(&ReferralFilter {
                status: args.status,
                ..ReferralFilter::default()
            }),
        ),
        Role::Affiliate => (ReportKind::Earnings, app.ledger.referrals_for(&user.id)),
    };
    let csv = export_csv(kind, referrals.iter().copied());

    if args.stdout {
        writeln!(out, "{csv}")?;
        return Ok(());
    }

    std::fs::create_dir_all(&args.out_dir)?;
    let path = args.out_dir.join(kind.file_name(Utc::now().date_naive()));
    std::fs::write(&path, csv)?;
    info!(path = %path.display(), rows = referrals.len(), "Report exported");

    writeln!(out, "Report written to {}", path.display())?;
    app.toaster.success("Report exported successfully");
    Ok(())
}
