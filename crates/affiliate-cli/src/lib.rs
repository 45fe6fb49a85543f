//! Affiliate Hub CLI Library
//!
//! Command implementations behind the `affiliate-hub` binary. Every command
//! runs against an [`app::App`] built fresh from the seed data and writes its
//! output to a caller-supplied writer.

pub mod app;
pub mod auth_cmd;
pub mod fmt;
pub mod link_cmd;
pub mod referral_cmd;
pub mod report_cmd;
pub mod stats_cmd;
