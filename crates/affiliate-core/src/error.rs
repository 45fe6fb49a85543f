//! Error types for the Affiliate Hub core library.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::identity::Role;
use crate::ledger::ReferralStatus;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Affiliate Hub operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An operation needs a signed-in user and there is none.
    #[error("Not signed in")]
    NotSignedIn,

    /// The signed-in user has the wrong role for this view.
    #[error("This action requires the {required} role")]
    Forbidden { required: Role },

    /// New password and its confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Referral status may only move forward.
    #[error("Cannot move referral from {from} to {to}")]
    InvalidTransition {
        from: ReferralStatus,
        to: ReferralStatus,
    },

    /// Recording a conversion would exceed the link's clicks.
    #[error("Link {link_id} has no unconverted clicks left")]
    ConversionExceedsClicks { link_id: String },

    /// A sale cannot be worth less than nothing.
    #[error("Product value must not be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Text that names none of the known values, e.g. a misspelt status.
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session slot could not be read or written
    #[error("Session storage error: {0}")]
    Session(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
