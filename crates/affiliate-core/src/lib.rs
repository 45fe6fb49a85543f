//! Affiliate Hub Core Library
//!
//! Domain model behind the admin and affiliate dashboards:
//! - Referral ledger with the commission lifecycle and all aggregates
//! - Identity provider with a persisted session slot and role guard
//! - Toast broadcaster with timed expiry
//! - CSV export, configuration, and common error types

pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod notifications;
pub mod report;
pub mod seed;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use identity::{IdentityProvider, Role, User};
pub use ledger::{Ledger, Referral, ReferralStatus};
pub use notifications::{Severity, Toaster};
