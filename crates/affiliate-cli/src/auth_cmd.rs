//! Auth subcommands: login, register, logout, status, profile.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;

use affiliate_core::identity::ProfileUpdate;
use affiliate_core::{Error, Role, User};
use dialoguer::Password;

use crate::app::App;

/// Account type offered at registration.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    Affiliate,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Affiliate => Self::Affiliate,
        }
    }
}

/// Auth subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum AuthAction {
    /// Sign in with email and password.
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted.
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and sign in.
    Register {
        #[arg(short, long)]
        email: String,
        /// Full name; affiliates get their link slug from it.
        #[arg(short, long)]
        name: String,
        #[arg(short, long, value_enum, default_value_t = RoleArg::Affiliate)]
        role: RoleArg,
        /// Prompted for (with confirmation) when omitted.
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and clear the saved session.
    Logout,
    /// Show who is signed in.
    Status,
    /// Update profile settings.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// PayPal address for payouts; pass an empty string to clear it.
        #[arg(long)]
        paypal: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
}

/// Execute an auth subcommand.
pub fn run(action: AuthAction, app: &mut App, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        AuthAction::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => Password::new().with_prompt("Password").interact()?,
            };
            let user = app.identity.login(&email, &password)?;
            signed_in(out, user)
        }
        AuthAction::Register {
            email,
            name,
            role,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()?,
            };
            let user = app
                .identity
                .register(&email, &password, &name, role.into())?;
            writeln!(out, "Account created.")?;
            signed_in(out, user)
        }
        AuthAction::Logout => {
            app.identity.logout();
            writeln!(out, "Signed out.")?;
            Ok(())
        }
        AuthAction::Status => status(app, out),
        AuthAction::Profile {
            name,
            email,
            paypal,
            new_password,
            confirm_password,
        } => {
            let update = ProfileUpdate {
                full_name: name,
                email,
                paypal_email: paypal,
                new_password,
                confirm_password,
            };
            profile(app, update, out)
        }
    }
}

fn signed_in(out: &mut impl Write, user: &User) -> anyhow::Result<()> {
    writeln!(out, "Signed in as {} ({})", user.full_name, user.role)?;
    writeln!(out, "Dashboard: {}", user.role.home_path())?;
    Ok(())
}

fn status(app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    let Some(user) = app.identity.current_user() else {
        writeln!(out, "Not signed in")?;
        return Ok(());
    };
    writeln!(out, "Signed in as: {}", user.full_name)?;
    writeln!(out, "Email:        {}", user.email)?;
    writeln!(out, "Role:         {}", user.role)?;
    writeln!(out, "User ID:      {}", user.id)?;
    if user.role == Role::Affiliate {
        writeln!(
            out,
            "PayPal:       {}",
            user.paypal_email.as_deref().unwrap_or("not set")
        )?;
        writeln!(
            out,
            "Referral link: {}",
            app.ledger.generate_affiliate_link(&user.id, Some(user))
        )?;
    }
    Ok(())
}

fn profile(app: &mut App, update: ProfileUpdate, out: &mut impl Write) -> anyhow::Result<()> {
    match app.identity.update_profile(update) {
        Ok(user) => {
            writeln!(out, "Name:   {}", user.full_name)?;
            writeln!(out, "Email:  {}", user.email)?;
            writeln!(
                out,
                "PayPal: {}",
                user.paypal_email.as_deref().unwrap_or("not set")
            )?;
            app.toaster.success("Profile updated successfully!");
            Ok(())
        }
        Err(Error::PasswordMismatch) => {
            app.toaster.error(Error::PasswordMismatch.to_string());
            anyhow::bail!("Profile not updated")
        }
        Err(e) => Err(e.into()),
    }
}
