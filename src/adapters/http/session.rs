//! Session oracle over the panel's credentials auth routes.
//!
//! Sign-in is the csrf handshake: fetch a token from `/api/auth/csrf`, post
//! it with the credentials to `/api/auth/callback/credentials`, then read
//! the session back. The session token carries `mustChangePassword` as of
//! sign-in, so `status` re-reads the live flag from
//! `/api/users/check-password-status`.

use super::client::ApiClient;
use crate::domain::{
    Credentials, DomainError, PasswordChange, Registration, Session, SessionStatus,
};
use crate::ports::SessionOracle;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsrfResponse {
    csrf_token: String,
}

/// `/api/auth/session` body. Signed out is `{}`.
#[derive(Debug, Default, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    must_change_password: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordStatus {
    must_change_password: bool,
}

/// `{ url }` returned by the callback when asked for JSON.
#[derive(Debug, Default, Deserialize)]
struct CallbackResponse {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl SessionResponse {
    fn into_session(self) -> Option<Session> {
        let user = self.user?;
        let subject_id = user.id.or(user.email)?;
        Some(Session {
            subject_id,
            must_change_password: user.must_change_password.unwrap_or(false),
        })
    }
}

/// The callback answers 200 even for bad credentials; failure shows up as `error=` in the url.
fn callback_rejected(res: &CallbackResponse) -> bool {
    res.url.as_deref().is_some_and(|u| u.contains("error="))
}

pub struct HttpSessionOracle {
    api: ApiClient,
}

impl HttpSessionOracle {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn csrf_token(&self) -> Result<String, DomainError> {
        let res: CsrfResponse = self.api.get_json("/api/auth/csrf").await?;
        Ok(res.csrf_token)
    }

    async fn read_session(&self) -> Result<Option<Session>, DomainError> {
        let res: SessionResponse = self
            .api
            .get_json("/api/auth/session")
            .await
            .map_err(|e| DomainError::Session(e.to_string()))?;
        Ok(res.into_session())
    }
}

#[async_trait::async_trait]
impl SessionOracle for HttpSessionOracle {
    async fn status(&self) -> Result<SessionStatus, DomainError> {
        let Some(mut session) = self.read_session().await? else {
            return Ok(SessionStatus::Unauthenticated);
        };
        match self
            .api
            .get_json::<PasswordStatus>("/api/users/check-password-status")
            .await
        {
            Ok(live) => session.must_change_password = live.must_change_password,
            Err(e) => warn!(error = %e, "password status check failed; using session flag"),
        }
        Ok(SessionStatus::Authenticated(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        let csrf_token = self.csrf_token().await?;
        let form = [
            ("csrfToken", csrf_token.as_str()),
            ("email", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
            ("json", "true"),
        ];
        let res = self
            .api
            .send(
                self.api
                    .request(Method::POST, "/api/auth/callback/credentials")
                    .form(&form),
            )
            .await?;
        let body: CallbackResponse = res.json().await.unwrap_or_default();
        if callback_rejected(&body) {
            return Err(DomainError::Auth("invalid email or password".into()));
        }
        let session = self
            .read_session()
            .await?
            .ok_or_else(|| DomainError::Auth("invalid email or password".into()))?;
        debug!(subject = %session.subject_id, "panel session established");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), DomainError> {
        let csrf_token = self.csrf_token().await?;
        let form = [("csrfToken", csrf_token.as_str()), ("json", "true")];
        self.api
            .send(
                self.api
                    .request(Method::POST, "/api/auth/signout")
                    .form(&form),
            )
            .await?;
        Ok(())
    }

    /// `POST /api/users`. The panel answers 400 with `{error}` for a taken email,
    /// which the client maps to `DomainError::Validation`.
    async fn register(&self, registration: &Registration) -> Result<(), DomainError> {
        let res = self
            .api
            .send(self.api.request(Method::POST, "/api/users").json(registration))
            .await?;
        debug!(status = res.status().as_u16(), "account registered on panel");
        Ok(())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError> {
        let body = ChangePasswordBody {
            current_password: &change.current_password,
            new_password: &change.new_password,
        };
        let res = self
            .api
            .send(
                self.api
                    .request(Method::POST, "/api/users/change-password")
                    .json(&body),
            )
            .await?;
        debug!(status = res.status().as_u16(), "password changed on panel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::error_for_status;
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_taken_email_is_validation_error() {
        let err = error_for_status(StatusCode::BAD_REQUEST, r#"{"error":"El email ya está en uso"}"#);
        assert!(matches!(err, DomainError::Validation(m) if m == "El email ya está en uso"));
    }

    #[test]
    fn test_empty_session_body_is_signed_out() {
        let res: SessionResponse = serde_json::from_str("{}").unwrap();
        assert!(res.into_session().is_none());
    }

    #[test]
    fn test_session_body_with_flag() {
        let res: SessionResponse = serde_json::from_str(
            r#"{"user":{"id":"u1","email":"a@b.c","mustChangePassword":true},"expires":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let session = res.into_session().unwrap();
        assert_eq!(session.subject_id, "u1");
        assert!(session.must_change_password);
    }

    #[test]
    fn test_callback_error_url_is_rejection() {
        let bad = CallbackResponse {
            url: Some("http://localhost:3000/api/auth/error?error=CredentialsSignin".into()),
        };
        let ok = CallbackResponse {
            url: Some("http://localhost:3000/".into()),
        };
        assert!(callback_rejected(&bad));
        assert!(!callback_rejected(&ok));
    }
}
