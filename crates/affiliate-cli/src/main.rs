//! Affiliate Hub CLI
//!
//! Admin and affiliate dashboards in the terminal. Each run starts from the
//! seed data; the signed-in user is kept between runs in the session file.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use affiliate_cli::app::App;
use affiliate_cli::auth_cmd::{self, AuthAction};
use affiliate_cli::link_cmd::{self, LinkAction};
use affiliate_cli::referral_cmd::{self, ReferralAction};
use affiliate_cli::report_cmd::{self, ReportArgs};
use affiliate_cli::stats_cmd::{self, AffiliatesArgs, StatsArgs};
use affiliate_core::config::{load_config, parse_rate};
use affiliate_core::tracing_init::{crate_directives, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "affiliate-hub")]
#[command(version, about = "Affiliate program dashboards", long_about = None)]
struct Cli {
    /// Session file to use instead of the configured one
    #[arg(long, global = true)]
    session_path: Option<PathBuf>,

    /// Base URL that referral links point at
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Commission rate for new sales, between 0 and 1
    #[arg(long, global = true)]
    commission_rate: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "AFFILIATE_HUB_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in, sign out, and manage your profile
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse and manage referrals
    Referrals {
        #[command(subcommand)]
        action: ReferralAction,
    },
    /// Dashboard overview for the signed-in user
    Stats(StatsArgs),
    /// List affiliates with their numbers (admin)
    Affiliates(AffiliatesArgs),
    /// Referral links and click tracking
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// Export referrals as CSV
    Report(ReportArgs),
}

fn dispatch(command: Commands, app: &mut App, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Auth { action } => auth_cmd::run(action, app, out),
        Commands::Referrals { action } => referral_cmd::run(action, app, out),
        Commands::Stats(args) => stats_cmd::run(&args, app, out),
        Commands::Affiliates(args) => stats_cmd::affiliates(&args, app, out),
        Commands::Links { action } => link_cmd::run(action, app, out),
        Commands::Report(args) => report_cmd::run(&args, app, out),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config().context("Failed to load configuration")?;
    if let Some(path) = cli.session_path {
        config.session.path = Some(path);
    }
    if let Some(url) = cli.base_url {
        config.program.base_url = url;
    }
    if let Some(rate) = cli.commission_rate.as_deref() {
        config.program.commission_rate = parse_rate(rate)?;
    }

    init_tracing(&crate_directives(&config.log_level), cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting affiliate-hub");

    let mut app = App::new(config);
    // Prompts block on the terminal, so commands run off the async workers.
    tokio::task::spawn_blocking(move || {
        let mut out = io::stdout().lock();
        dispatch(cli.command, &mut app, &mut out)
    })
    .await?
}
