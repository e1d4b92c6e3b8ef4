//! Session context and route gating.
//!
//! Holds the one explicit copy of the session status: resolved once at
//! start, re-checked on a fixed interval, dropped on sign-out. Every route
//! evaluation reads it, runs the gate, and performs at most the one
//! navigation the gate returns.

use crate::domain::routes::{self, Route};
use crate::domain::validation::{validate_password_change, validate_registration};
use crate::domain::{
    Credentials, DomainError, GateDecision, PasswordChange, Registration, Session, SessionGate,
    SessionStatus,
};
use crate::ports::{Navigator, SessionOracle};
use crate::shared::timer::ScopedTimer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{info, warn};

struct SessionInner {
    oracle: Arc<dyn SessionOracle>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionInner {
    /// Ask the oracle. On failure keep what we had: `Pending` stays `Pending`.
    async fn refresh(&self) -> SessionStatus {
        match self.oracle.status().await {
            Ok(status) => {
                let previous = self.status_tx.send_replace(status.clone());
                if previous.auth_status() != status.auth_status()
                    || previous.must_change_password() != status.must_change_password()
                {
                    info!(
                        auth = ?status.auth_status(),
                        must_change_password = status.must_change_password(),
                        "session status changed"
                    );
                }
                status
            }
            Err(e) => {
                warn!(error = %e, "session oracle unreachable; keeping last status");
                self.status_tx.borrow().clone()
            }
        }
    }
}

pub struct SessionService {
    inner: Arc<SessionInner>,
    navigator: Arc<dyn Navigator>,
    gate: Mutex<SessionGate>,
    refresh_timer: Mutex<Option<ScopedTimer>>,
    refresh_every: Duration,
    min_password_len: usize,
}

impl SessionService {
    pub fn new(
        oracle: Arc<dyn SessionOracle>,
        navigator: Arc<dyn Navigator>,
        public_routes: Vec<String>,
        refresh_every: Duration,
        min_password_len: usize,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Pending);
        Self {
            inner: Arc::new(SessionInner { oracle, status_tx }),
            navigator,
            gate: Mutex::new(SessionGate::new(public_routes)),
            refresh_timer: Mutex::new(None),
            refresh_every,
            min_password_len,
        }
    }

    /// Resolve the session once and start the periodic re-check.
    pub async fn start(&self) -> SessionStatus {
        let status = self.inner.refresh().await;
        self.arm_refresh().await;
        status
    }

    pub async fn refresh(&self) -> SessionStatus {
        self.inner.refresh().await
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Watch channel that changes whenever the session status is replaced.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Run the gate for `route` and issue its navigation, if any.
    pub async fn evaluate(&self, route: &Route) -> GateDecision {
        let status = self.status();
        let decision = self.gate.lock().await.evaluate(&status, route);
        if let Some(target) = &decision.navigate {
            info!(from = %route, to = %target, render = ?decision.render, "gate navigation");
            self.navigator.navigate(target.clone());
        }
        decision
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        let session = self.inner.oracle.sign_in(credentials).await?;
        info!(
            subject = %session.subject_id,
            must_change_password = session.must_change_password,
            "signed in"
        );
        self.inner
            .status_tx
            .send_replace(SessionStatus::Authenticated(session.clone()));
        self.arm_refresh().await;
        Ok(session)
    }

    /// Tear down the session context and go to the login page with the
    /// force-logout escape so the gate does not bounce back to `/`.
    pub async fn sign_out(&self) -> Result<(), DomainError> {
        self.refresh_timer.lock().await.take();
        let result = self.inner.oracle.sign_out().await;
        if let Err(e) = &result {
            warn!(error = %e, "oracle sign-out failed; clearing local session anyway");
        }
        self.inner
            .status_tx
            .send_replace(SessionStatus::Unauthenticated);
        self.navigator.navigate(Route::signed_out());
        info!("signed out");
        result
    }

    /// Create an account, then send the viewer to the login page to sign in with it.
    pub async fn register(&self, registration: &Registration) -> Result<(), DomainError> {
        validate_registration(registration, self.min_password_len)?;
        self.inner.oracle.register(registration).await?;
        info!(email = %registration.email.trim(), "account registered");
        self.navigator.navigate(Route::to(routes::LOGIN));
        Ok(())
    }

    /// Validate, change the password, then re-read the session so the
    /// `mustChangePassword` gate lifts.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError> {
        validate_password_change(change, self.min_password_len)?;
        if !matches!(self.status(), SessionStatus::Authenticated(_)) {
            return Err(DomainError::Auth("not signed in".into()));
        }
        self.inner.oracle.change_password(change).await?;
        let status = self.inner.refresh().await;
        if status.must_change_password() {
            // Oracle still reports the old flag (stale token); the change itself succeeded.
            if let SessionStatus::Authenticated(mut session) = status {
                session.must_change_password = false;
                self.inner
                    .status_tx
                    .send_replace(SessionStatus::Authenticated(session));
            }
        }
        info!("password changed");
        self.navigator.navigate(Route::to(routes::HOME));
        Ok(())
    }

    async fn arm_refresh(&self) {
        let mut slot = self.refresh_timer.lock().await;
        slot.take();
        let inner = Arc::clone(&self.inner);
        let every = self.refresh_every;
        *slot = Some(ScopedTimer::spawn("session-refresh", async move {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                interval.tick().await;
                inner.refresh().await;
            }
        }));
    }
}
