//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP or terminal types here; adapters map their payloads into these.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which collection an offering belongs to. Courses and masters share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferingKind {
    Course,
    Master,
}

impl OfferingKind {
    pub const ALL: [OfferingKind; 2] = [OfferingKind::Course, OfferingKind::Master];

    /// Collection segment used by the panel API (`/api/courses`, `/api/masters`).
    pub fn collection(self) -> &'static str {
        match self {
            OfferingKind::Course => "courses",
            OfferingKind::Master => "masters",
        }
    }
}

impl fmt::Display for OfferingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferingKind::Course => write!(f, "course"),
            OfferingKind::Master => write!(f, "master"),
        }
    }
}

/// A course or master (degree program) as published on the display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub title: String,
    pub description: String,
    pub modality: String,
    pub duration: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    /// Informational only; offerings are never filtered by it.
    #[serde(deserialize_with = "deserialize_date")]
    pub end_date: NaiveDate,
    pub form_url: String,
    /// Rendered QR image (data URI or URL). Produced by the store from `form_url`.
    #[serde(rename = "qrCode", default)]
    pub qr_image: String,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of an offering. Id, QR image and creation time belong to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingDraft {
    pub title: String,
    pub description: String,
    pub modality: String,
    pub duration: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub form_url: String,
}

impl From<&Offering> for OfferingDraft {
    fn from(o: &Offering) -> Self {
        Self {
            title: o.title.clone(),
            description: o.description.clone(),
            modality: o.modality.clone(),
            duration: o.duration.clone(),
            start_date: o.start_date,
            end_date: o.end_date,
            form_url: o.form_url.clone(),
        }
    }
}

/// A news announcement shown in the full-screen interstitial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub image: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub publish_date: NaiveDate,
    /// Absent (or stored as an empty string) means "show indefinitely".
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl NewsItem {
    /// Eligible for display while `now < end_date` (midnight UTC), or always without an end date.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.end_date {
            None => true,
            Some(end) => now < end.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub publish_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<&NewsItem> for NewsDraft {
    fn from(n: &NewsItem) -> Self {
        Self {
            title: n.title.clone(),
            content: n.content.clone(),
            image: n.image.clone(),
            publish_date: n.publish_date,
            end_date: n.end_date,
        }
    }
}

/// An authenticated viewer as reported by the session oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: String,
    pub must_change_password: bool,
}

/// Authentication status without the session payload. Used as the gate's dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    Pending,
    Unauthenticated,
    Authenticated,
}

/// Current session value threaded into the gate on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// The oracle has not answered yet.
    #[default]
    Pending,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionStatus {
    pub fn auth_status(&self) -> AuthStatus {
        match self {
            SessionStatus::Pending => AuthStatus::Pending,
            SessionStatus::Unauthenticated => AuthStatus::Unauthenticated,
            SessionStatus::Authenticated(_) => AuthStatus::Authenticated,
        }
    }

    /// `mustChangePassword`; only meaningful when authenticated.
    pub fn must_change_password(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(s) if s.must_change_password)
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// New panel account. The name is optional; the panel defaults it.
#[derive(Clone, Serialize)]
pub struct Registration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// Accepts `YYYY-MM-DD` (HTML date inputs) or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw:?}")))
}

/// The panel stores a missing end date as `""`; treat that like `null`.
fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s:?}"))),
    }
}

fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_item_from_panel_json() {
        let json = r#"{
            "id": "n1",
            "title": "Open day",
            "content": "Campus tour at noon",
            "image": null,
            "publishDate": "2025-03-01",
            "endDate": "",
            "createdAt": "2025-03-01T10:00:00.000Z"
        }"#;
        let item: NewsItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.end_date, None);
        assert_eq!(item.image, None);
        assert_eq!(item.publish_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_offering_reads_qr_code_field() {
        let json = r#"{
            "id": "c1",
            "title": "Rust 101",
            "description": "Systems programming",
            "modality": "Online",
            "duration": "8 weeks",
            "startDate": "2025-04-01T00:00:00.000Z",
            "endDate": "2025-06-01",
            "formUrl": "https://forms.example.edu/rust",
            "qrCode": "data:image/png;base64,AAAA",
            "createdAt": "2025-03-01T10:00:00.000Z"
        }"#;
        let offering: Offering = serde_json::from_str(json).unwrap();
        assert_eq!(offering.qr_image, "data:image/png;base64,AAAA");
        assert_eq!(offering.start_date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
    }

    #[test]
    fn test_news_active_until_end_date() {
        let json = r#"{"id":"n","title":"t","content":"c","publishDate":"2025-01-01",
            "endDate":"2025-02-01","createdAt":"2025-01-01T00:00:00Z"}"#;
        let item: NewsItem = serde_json::from_str(json).unwrap();
        let before = DateTime::parse_from_rfc3339("2025-01-31T23:59:59Z").unwrap().to_utc();
        let at = DateTime::parse_from_rfc3339("2025-02-01T00:00:00Z").unwrap().to_utc();
        assert!(item.is_active_at(before));
        assert!(!item.is_active_at(at));
    }

    #[test]
    fn test_must_change_password_only_when_authenticated() {
        assert!(!SessionStatus::Pending.must_change_password());
        assert!(!SessionStatus::Unauthenticated.must_change_password());
        let s = SessionStatus::Authenticated(Session {
            subject_id: "u1".into(),
            must_change_password: true,
        });
        assert!(s.must_change_password());
        assert_eq!(s.auth_status(), AuthStatus::Authenticated);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let c = Credentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{c:?}").contains("hunter2"));
    }

    #[test]
    fn test_registration_body_omits_missing_name() {
        let r = Registration {
            name: None,
            email: "a@b.c".into(),
            password: "hunter22".into(),
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({"email": "a@b.c", "password": "hunter22"})
        );
        assert!(!format!("{r:?}").contains("hunter22"));
    }
}
