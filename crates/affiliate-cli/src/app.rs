//! Per-invocation application state.
//!
//! Every run starts from the seed ledger; only the signed-in user survives
//! between runs, through the session slot.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use affiliate_core::config::Config;
use affiliate_core::identity::{
    FileSessionStore, MemorySessionStore, SessionStore, require_role,
};
use affiliate_core::notifications::{Subscription, Toast, ToastId};
use affiliate_core::{Error, IdentityProvider, Ledger, Role, Severity, Toaster, User};
use tracing::{debug, warn};

/// Everything a command can touch.
pub struct App {
    pub config: Config,
    pub identity: IdentityProvider,
    pub ledger: Ledger,
    pub toaster: Toaster,
    _toast_printer: Option<Subscription>,
}

impl App {
    /// Build state over the configured session file and echo toasts to stderr.
    pub fn new(config: Config) -> Self {
        let store: Box<dyn SessionStore> = match config.session.resolved_path() {
            Some(path) => Box::new(FileSessionStore::new(path)),
            None => {
                warn!("Cannot determine home directory, session will not persist");
                Box::new(MemorySessionStore::default())
            }
        };
        let mut app = Self::with_store(config, store);
        app._toast_printer = Some(app.toaster.subscribe(toast_printer()));
        app
    }

    /// Build state over an explicit session store. Toasts are kept but not
    /// printed.
    pub fn with_store(config: Config, store: Box<dyn SessionStore>) -> Self {
        let mut identity = IdentityProvider::new(store);
        if let Some(user) = identity.restore() {
            debug!(user_id = %user.id, role = %user.role, "Session restored");
        }
        Self {
            ledger: Ledger::seeded(config.program.clone()),
            toaster: Toaster::from_config(&config.notifications),
            identity,
            config,
            _toast_printer: None,
        }
    }

    /// The signed-in user, whatever their role.
    pub fn signed_in(&self) -> anyhow::Result<&User> {
        Ok(self.identity.current_user().ok_or(Error::NotSignedIn)?)
    }

    /// The signed-in user, who must hold `role`.
    pub fn require(&self, role: Role) -> anyhow::Result<&User> {
        Ok(require_role(self.identity.current_user(), role)?)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("identity", &self.identity)
            .field("toaster", &self.toaster)
            .finish_non_exhaustive()
    }
}

/// One-line rendering of a toast.
pub fn render_toast(toast: &Toast) -> String {
    let marker = match toast.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
        Severity::Warning => "warn",
        Severity::Info => "info",
    };
    format!("[{marker}] {}", toast.message)
}

/// Subscriber that writes each toast to stderr once, when it first shows up.
fn toast_printer() -> impl Fn(&[Toast]) + Send + Sync + 'static {
    let shown: Mutex<HashSet<ToastId>> = Mutex::default();
    move |toasts| {
        let mut shown = shown.lock().unwrap_or_else(PoisonError::into_inner);
        let mut err = io::stderr().lock();
        for toast in toasts {
            if shown.insert(toast.id.clone()) {
                let _ = writeln!(err, "{}", render_toast(toast));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A fresh app with nobody signed in.
    pub(crate) fn app() -> App {
        App::with_store(Config::default(), Box::new(MemorySessionStore::default()))
    }

    /// A fresh app signed in as the seeded user for `role`.
    pub(crate) fn signed_in_as(role: Role) -> App {
        let mut app = app();
        let email = match role {
            Role::Admin => "admin@example.com",
            Role::Affiliate => "affiliate@example.com",
        };
        app.identity.login(email, "password").unwrap();
        app
    }

    pub(crate) fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    pub(crate) fn last_toast(app: &App) -> Option<(Severity, String)> {
        app.toaster
            .visible()
            .last()
            .map(|t| (t.severity, t.message.clone()))
    }

    #[test]
    fn session_survives_into_next_app() {
        let store = MemorySessionStore::default();
        let mut first = App::with_store(Config::default(), Box::new(store.clone()));
        first.identity.login("admin@example.com", "password").unwrap();

        let second = App::with_store(Config::default(), Box::new(store));
        assert_eq!(second.signed_in().unwrap().id, "1");
    }

    #[test]
    fn signed_out_app_refuses_commands() {
        let app = app();
        let err = app.signed_in().unwrap_err();
        assert!(err.to_string().contains("Not signed in"), "{err}");
    }

    #[test]
    fn role_check_uses_current_user() {
        let app = signed_in_as(Role::Affiliate);
        assert!(app.require(Role::Affiliate).is_ok());
        assert!(app.require(Role::Admin).is_err());
    }

    #[test]
    fn file_backed_app_restores_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.path = Some(dir.path().join("session.json"));

        let mut first = App::new(config.clone());
        first.identity.login("affiliate@example.com", "password").unwrap();

        let second = App::new(config);
        assert_eq!(
            second.signed_in().unwrap().slug.as_deref(),
            Some("john-affiliate")
        );
    }

    #[test]
    fn toast_rendering_marks_severity() {
        let app = app();
        app.toaster.success("Report exported successfully");
        let toast = app.toaster.visible().pop().unwrap();
        assert_eq!(render_toast(&toast), "[ok] Report exported successfully");
    }
}
