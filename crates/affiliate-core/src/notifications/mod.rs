//! Toast notifications.
//!
//! A [`Toaster`] is the one shared broadcaster for short-lived user-facing
//! messages. Any component holding a handle may publish; every subscriber is
//! called with the full list of visible toasts whenever it changes.

pub mod toaster;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub use toaster::{Subscription, Toaster};

/// How a toast should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toast identifier: publish time in milliseconds plus a per-toaster sequence
/// number, so two toasts in the same millisecond still differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToastId(String);

impl ToastId {
    pub(crate) fn new(millis: i64, seq: u64) -> Self {
        Self(format!("{millis}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub ttl: Duration,
    expires_at: Instant,
}

impl Toast {
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the toast's time is up at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
