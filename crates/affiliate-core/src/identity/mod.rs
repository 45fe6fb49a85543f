//! Identity provider: mock user directory plus the persisted session slot.
//!
//! The ledger only ever reads [`IdentityProvider::current_user`]; all writes
//! to identity state go through this module.

pub mod guard;
pub mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::seed::{self, MOCK_PASSWORD};

pub use guard::{Access, authorize, require_role};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// Which dashboard a user belongs to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Affiliate,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Affiliate => "affiliate",
        }
    }

    /// Landing view for this role.
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Affiliate => "/affiliate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "affiliate" => Ok(Self::Affiliate),
            other => Err(Error::UnknownValue {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// A dashboard account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paypal_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl User {
    /// What a tracking link should carry for this user: the slug, else the id.
    pub fn ref_code(&self) -> &str {
        self.slug.as_deref().unwrap_or(&self.id)
    }
}

/// Editable profile fields. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub paypal_email: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Derive a link slug from a display name: lowercase, whitespace runs become `-`.
pub fn slugify(full_name: &str) -> String {
    WHITESPACE_RE
        .replace_all(&full_name.to_lowercase(), "-")
        .into_owned()
}

/// Mock authentication backed by an in-memory directory.
pub struct IdentityProvider {
    directory: Vec<User>,
    current: Option<User>,
    store: Box<dyn SessionStore>,
}

impl IdentityProvider {
    /// Create a provider over the built-in directory. Call [`Self::restore`]
    /// to pick up a previous session.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            directory: seed::users(),
            current: None,
            store,
        }
    }

    /// Read the session slot once. A slot that cannot be read is treated as
    /// signed out.
    pub fn restore(&mut self) -> Option<&User> {
        match self.store.load() {
            Ok(user) => self.current = user,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session");
                self.current = None;
            }
        }
        self.current.as_ref()
    }

    pub const fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// All known accounts, including ones registered this session.
    pub fn users(&self) -> &[User] {
        &self.directory
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.directory.iter().find(|u| u.id == id)
    }

    /// Affiliate accounts, optionally filtered by a case-insensitive match on
    /// name or email.
    pub fn affiliates(&self, search: Option<&str>) -> Vec<&User> {
        let needle = search.map(str::to_lowercase).unwrap_or_default();
        self.directory
            .iter()
            .filter(|u| u.role == Role::Affiliate)
            .filter(|u| {
                needle.is_empty()
                    || u.full_name.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&User> {
        let user = self
            .directory
            .iter()
            .find(|u| u.email == email)
            .filter(|_| password == MOCK_PASSWORD)
            .cloned()
            .ok_or_else(|| {
                warn!(email, "Login rejected");
                Error::InvalidCredentials
            })?;

        self.store.save(&user)?;
        info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(&*self.current.insert(user))
    }

    /// Create an account and sign it in. Affiliates get a slug derived from
    /// their name.
    pub fn register(
        &mut self,
        email: &str,
        _password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<&User> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            full_name: full_name.to_string(),
            created_at: Utc::now(),
            paypal_email: None,
            slug: (role == Role::Affiliate).then(|| slugify(full_name)),
        };

        self.store.save(&user)?;
        self.directory.push(user.clone());
        info!(user_id = %user.id, role = %user.role, slug = ?user.slug, "Registered");
        Ok(&*self.current.insert(user))
    }

    /// Drop the session. Never fails; a slot that cannot be cleared is logged.
    pub fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            info!(user_id = %user.id, "Signed out");
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session slot");
        }
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<&User> {
        let mut user = self.current.clone().ok_or(Error::NotSignedIn)?;

        if update.new_password.is_some() && update.new_password != update.confirm_password {
            return Err(Error::PasswordMismatch);
        }
        if let Some(name) = update.full_name {
            user.full_name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(paypal) = update.paypal_email {
            user.paypal_email = Some(paypal).filter(|p| !p.is_empty());
        }

        self.store.save(&user)?;
        if let Some(entry) = self.directory.iter_mut().find(|u| u.id == user.id) {
            *entry = user.clone();
        }
        info!(user_id = %user.id, "Profile updated");
        Ok(&*self.current.insert(user))
    }
}

impl fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("users", &self.directory.len())
            .field("current", &self.current.as_ref().map(|u| &u.id))
            .finish_non_exhaustive()
    }
}
