//! Route paths the front-end can be on.

use std::fmt;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const ADMIN: &str = "/admin";
pub const DISPLAY: &str = "/display";
pub const CHANGE_PASSWORD: &str = "/profile/change-password";

/// Routes reachable without a session.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[LOGIN, REGISTER];

/// A navigation target. `force_logout` is the one-shot escape that lets an
/// explicit sign-out land on the login page without being bounced to `/`;
/// it only lives as long as the route it was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub force_logout: bool,
}

impl Route {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: normalize(&path.into()),
            force_logout: false,
        }
    }

    /// Login page reached through an explicit sign-out.
    pub fn signed_out() -> Self {
        Self {
            path: LOGIN.to_string(),
            force_logout: true,
        }
    }

    pub fn is(&self, path: &str) -> bool {
        self.path == normalize(path)
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::to(HOME)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force_logout {
            write!(f, "{} (signed out)", self.path)
        } else {
            f.write_str(&self.path)
        }
    }
}

/// Strips query string and trailing slash so `/login/` and `/login?x=1` match `/login`.
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
