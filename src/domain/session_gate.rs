//! Route gate: decides what the viewer may see for a session and route.
//!
//! Rules are checked in priority order and only the first match may act, so
//! two rules can never issue competing navigations in one evaluation:
//!
//! 1. pending session -> loading placeholder, no navigation
//! 2. signed out on a protected route -> go to `/login`
//! 3. signed in on a public route (no force-logout escape) -> go to `/`
//! 4. signed in with `mustChangePassword` off the change page -> go there, block children
//! 5. otherwise -> render children

use crate::domain::routes::{self, Route};
use crate::domain::{AuthStatus, SessionStatus};

/// What the front-end should draw for this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRender {
    Loading,
    /// Transitional placeholder while a navigation completes.
    Redirecting,
    /// Hard gate: protected content is not rendered.
    MustChangePassword,
    Children,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub render: GateRender,
    /// Navigation to issue now. `None` if no rule asks for one or it was already issued.
    pub navigate: Option<Route>,
}

impl GateDecision {
    fn render(render: GateRender) -> Self {
        Self {
            render,
            navigate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GateKey {
    auth: AuthStatus,
    path: String,
    must_change_password: bool,
}

/// Stateless decision table plus the memory needed to navigate once per reason.
#[derive(Debug, Clone)]
pub struct SessionGate {
    public_routes: Vec<String>,
    last_navigation: Option<GateKey>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(routes::DEFAULT_PUBLIC_ROUTES.iter().copied())
    }
}

impl SessionGate {
    pub fn new<I, S>(public_routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            public_routes: public_routes
                .into_iter()
                .map(|r| routes::normalize(r.as_ref()))
                .collect(),
            last_navigation: None,
        }
    }

    pub fn is_public(&self, route: &Route) -> bool {
        self.public_routes.iter().any(|p| *p == route.path)
    }

    /// Evaluate the table for `status` on `route`.
    pub fn evaluate(&mut self, status: &SessionStatus, route: &Route) -> GateDecision {
        let key = GateKey {
            auth: status.auth_status(),
            path: route.path.clone(),
            must_change_password: status.must_change_password(),
        };

        let (render, target) = match key.auth {
            AuthStatus::Pending => return GateDecision::render(GateRender::Loading),
            AuthStatus::Unauthenticated if !self.is_public(route) => {
                (GateRender::Redirecting, routes::LOGIN)
            }
            AuthStatus::Authenticated if self.is_public(route) && !route.force_logout => {
                (GateRender::Redirecting, routes::HOME)
            }
            AuthStatus::Authenticated
                if key.must_change_password && !route.is(routes::CHANGE_PASSWORD) =>
            {
                (GateRender::MustChangePassword, routes::CHANGE_PASSWORD)
            }
            _ => {
                self.last_navigation = None;
                return GateDecision::render(GateRender::Children);
            }
        };

        if self.last_navigation.as_ref() == Some(&key) {
            return GateDecision::render(render);
        }
        self.last_navigation = Some(key);
        GateDecision {
            render,
            navigate: Some(Route::to(target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Session;

    fn authed(must_change_password: bool) -> SessionStatus {
        SessionStatus::Authenticated(Session {
            subject_id: "u1".into(),
            must_change_password,
        })
    }

    #[test]
    fn test_pending_renders_loading_without_navigation() {
        let mut gate = SessionGate::default();
        for path in ["/", "/login", "/admin", routes::CHANGE_PASSWORD] {
            let d = gate.evaluate(&SessionStatus::Pending, &Route::to(path));
            assert_eq!(d.render, GateRender::Loading);
            assert_eq!(d.navigate, None);
        }
    }

    #[test]
    fn test_unauthenticated_redirects_once() {
        let mut gate = SessionGate::default();
        let route = Route::to("/dashboard");
        let first = gate.evaluate(&SessionStatus::Unauthenticated, &route);
        assert_eq!(first.render, GateRender::Redirecting);
        assert_eq!(first.navigate, Some(Route::to("/login")));
        let again = gate.evaluate(&SessionStatus::Unauthenticated, &route);
        assert_eq!(again.render, GateRender::Redirecting);
        assert_eq!(again.navigate, None);
    }

    #[test]
    fn test_unauthenticated_on_login_renders_children() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&SessionStatus::Unauthenticated, &Route::to("/login"));
        assert_eq!(d.render, GateRender::Children);
        assert_eq!(d.navigate, None);
    }

    #[test]
    fn test_authenticated_on_login_goes_home() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&authed(false), &Route::to("/login"));
        assert_eq!(d.render, GateRender::Redirecting);
        assert_eq!(d.navigate, Some(Route::to("/")));
    }

    #[test]
    fn test_force_logout_escape_is_not_bounced() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&authed(false), &Route::signed_out());
        assert_eq!(d.render, GateRender::Children);
        assert_eq!(d.navigate, None);
    }

    #[test]
    fn test_must_change_password_blocks_children() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&authed(true), &Route::to("/settings"));
        assert_eq!(d.render, GateRender::MustChangePassword);
        assert_eq!(d.navigate, Some(Route::to(routes::CHANGE_PASSWORD)));
        let again = gate.evaluate(&authed(true), &Route::to("/settings"));
        assert_eq!(again.render, GateRender::MustChangePassword);
        assert_eq!(again.navigate, None);
    }

    #[test]
    fn test_change_password_page_renders_for_flagged_user() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&authed(true), &Route::to(routes::CHANGE_PASSWORD));
        assert_eq!(d.render, GateRender::Children);
        assert_eq!(d.navigate, None);
    }

    #[test]
    fn test_login_rule_wins_over_password_rule() {
        let mut gate = SessionGate::default();
        let d = gate.evaluate(&authed(true), &Route::to("/login"));
        assert_eq!(d.navigate, Some(Route::to("/")));
    }

    #[test]
    fn test_same_reason_navigates_again_after_children_rendered() {
        let mut gate = SessionGate::default();
        let admin = Route::to("/admin");
        assert!(gate.evaluate(&SessionStatus::Unauthenticated, &admin).navigate.is_some());
        gate.evaluate(&SessionStatus::Unauthenticated, &Route::to("/login"));
        assert!(gate.evaluate(&SessionStatus::Unauthenticated, &admin).navigate.is_some());
    }

    #[test]
    fn test_custom_public_routes() {
        let mut gate = SessionGate::new(["/login", "/register/"]);
        let d = gate.evaluate(&SessionStatus::Unauthenticated, &Route::to("/register"));
        assert_eq!(d.render, GateRender::Children);
    }
}
