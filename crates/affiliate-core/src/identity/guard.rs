//! Role guard for the two dashboards.

use super::{Role, User};
use crate::error::{Error, Result};

/// Outcome of checking a viewer against a view's required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Nobody is signed in.
    SignIn,
    /// Signed in with the other role; send them to their own dashboard.
    Redirect(&'static str),
}

/// Decide whether `user` may open a view. `required: None` admits any
/// signed-in user.
pub fn authorize(user: Option<&User>, required: Option<Role>) -> Access {
    match (user, required) {
        (None, _) => Access::SignIn,
        (Some(u), Some(role)) if u.role != role => Access::Redirect(u.role.home_path()),
        (Some(_), _) => Access::Granted,
    }
}

/// [`authorize`] as a `Result`, for callers that just want the user back.
pub fn require_role(user: Option<&User>, role: Role) -> Result<&User> {
    match authorize(user, Some(role)) {
        Access::Granted => user.ok_or(Error::NotSignedIn),
        Access::SignIn => Err(Error::NotSignedIn),
        Access::Redirect(_) => Err(Error::Forbidden { required: role }),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn anonymous_must_sign_in() {
        assert_eq!(authorize(None, Some(Role::Admin)), Access::SignIn);
        assert_eq!(authorize(None, None), Access::SignIn);
    }

    #[test]
    fn wrong_role_is_redirected_home() {
        let users = seed::users();
        assert_eq!(
            authorize(Some(&users[1]), Some(Role::Admin)),
            Access::Redirect("/affiliate")
        );
        assert_eq!(
            authorize(Some(&users[0]), Some(Role::Affiliate)),
            Access::Redirect("/admin")
        );
    }

    #[test]
    fn matching_role_is_granted() {
        let users = seed::users();
        assert_eq!(authorize(Some(&users[0]), Some(Role::Admin)), Access::Granted);
        assert_eq!(authorize(Some(&users[1]), None), Access::Granted);
    }

    #[test]
    fn require_role_maps_to_errors() {
        let users = seed::users();
        assert!(matches!(
            require_role(Some(&users[1]), Role::Admin),
            Err(Error::Forbidden {
                required: Role::Admin
            })
        ));
        assert!(matches!(
            require_role(None, Role::Admin),
            Err(Error::NotSignedIn)
        ));
        assert_eq!(require_role(Some(&users[0]), Role::Admin).unwrap().id, "1");
    }
}
