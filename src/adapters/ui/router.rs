//! Terminal router. Implements Navigator: navigation records the target and
//! the route loop renders it on its next pass.

use crate::domain::Route;
use crate::ports::Navigator;
use tokio::sync::watch;
use tracing::debug;

pub struct TerminalRouter {
    current: watch::Sender<Route>,
}

impl TerminalRouter {
    pub fn new(start: Route) -> Self {
        let (current, _) = watch::channel(start);
        Self { current }
    }

    /// Fires whenever a navigation happens.
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for TerminalRouter {
    fn default() -> Self {
        Self::new(Route::default())
    }
}

impl Navigator for TerminalRouter {
    fn navigate(&self, route: Route) {
        debug!(to = %route, "navigate");
        self.current.send_replace(route);
    }

    fn current(&self) -> Route {
        self.current.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_replaces_current() {
        let router = TerminalRouter::default();
        let rx = router.subscribe();
        router.navigate(Route::to("/login"));
        assert_eq!(router.current(), Route::to("/login"));
        assert!(rx.has_changed().unwrap());
    }
}
