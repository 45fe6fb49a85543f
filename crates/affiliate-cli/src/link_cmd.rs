//! Tracking link subcommands: show, create, click, convert.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;

use affiliate_core::Role;
use affiliate_core::ledger::{AffiliateLink, NamedLinkRequest, conversion_rate};
use clap::Subcommand;

use crate::app::App;
use crate::fmt::percent;

/// Link subcommand actions.
#[derive(Subcommand, Debug)]
pub enum LinkAction {
    /// Show the referral link and tracked link counters
    Show {
        /// Whose links to show (admin; defaults to all)
        #[arg(short, long)]
        affiliate: Option<String>,
    },
    /// Request an extra named link
    Create {
        /// Name for the link
        name: String,
    },
    /// Count a click on a tracked link
    Click {
        /// Link ID
        id: String,
    },
    /// Count a conversion on a tracked link
    Convert {
        /// Link ID
        id: String,
    },
}

/// Execute a link subcommand.
pub fn run(action: LinkAction, app: &mut App, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        LinkAction::Show { affiliate } => show(app, affiliate.as_deref(), out),
        LinkAction::Create { name } => {
            let user = app.require(Role::Affiliate)?;
            match app.ledger.request_named_link(&user.id, &name) {
                NamedLinkRequest::Rejected => anyhow::bail!("Link name cannot be empty"),
                NamedLinkRequest::Unsupported { name } => {
                    writeln!(out, "Link \"{name}\" was not created.")?;
                    app.toaster
                        .info("Custom link creation feature coming soon!");
                }
            }
            Ok(())
        }
        LinkAction::Click { id } => {
            match app.ledger.record_click(&id) {
                Some(link) => writeln!(out, "Link {id}: {} click(s)", link.clicks)?,
                None => writeln!(out, "Link {id} not found.")?,
            }
            Ok(())
        }
        LinkAction::Convert { id } => {
            match app.ledger.record_conversion(&id)? {
                Some(link) => writeln!(
                    out,
                    "Link {id}: {} conversion(s) from {} click(s)",
                    link.conversions, link.clicks
                )?,
                None => writeln!(out, "Link {id} not found.")?,
            }
            Ok(())
        }
    }
}

fn show(app: &App, affiliate: Option<&str>, out: &mut impl Write) -> anyhow::Result<()> {
    let user = app.signed_in()?;
    let links = match user.role {
        Role::Affiliate => {
            writeln!(
                out,
                "Your referral link: {}",
                app.ledger.generate_affiliate_link(&user.id, Some(user))
            )?;
            writeln!(out)?;
            app.ledger.links_for(&user.id)
        }
        Role::Admin => match affiliate {
            Some(id) => {
                writeln!(
                    out,
                    "Referral link: {}",
                    app.ledger.generate_affiliate_link(id, Some(user))
                )?;
                writeln!(out)?;
                app.ledger.links_for(id)
            }
            None => app.ledger.links().iter().collect(),
        },
    };
    print_links(out, &links)
}

fn print_links(out: &mut impl Write, links: &[&AffiliateLink]) -> anyhow::Result<()> {
    if links.is_empty() {
        writeln!(out, "No tracked links.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<36}  {:<9}  {:>7}  {:>11}  {:>6}  URL",
        "ID", "AFFILIATE", "CLICKS", "CONVERSIONS", "RATE"
    )?;
    for l in links {
        writeln!(
            out,
            "{:<36}  {:<9}  {:>7}  {:>11}  {:>6}  {}",
            l.id,
            l.affiliate_id,
            l.clicks,
            l.conversions,
            percent(conversion_rate(l.conversions, l.clicks)),
            l.url
        )?;
    }
    Ok(())
}
