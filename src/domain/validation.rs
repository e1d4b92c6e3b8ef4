//! Admin and account form rules. Checked before anything is sent to a store.

use crate::domain::{DomainError, NewsDraft, OfferingDraft, PasswordChange, Registration};

/// Minimum length for a new password.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;
/// Minimum title length for offerings and news.
pub const MIN_TITLE_LEN: usize = 3;
/// Minimum length of an offering description or a news body.
pub const MIN_BODY_LEN: usize = 10;

pub fn validate_offering(draft: &OfferingDraft) -> Result<(), DomainError> {
    require_min("title", &draft.title, MIN_TITLE_LEN)?;
    require_min("description", &draft.description, MIN_BODY_LEN)?;
    require("modality", &draft.modality)?;
    require("duration", &draft.duration)?;
    validate_form_url(&draft.form_url)?;
    if draft.end_date <= draft.start_date {
        return Err(DomainError::Validation(
            "end date must be after start date".into(),
        ));
    }
    Ok(())
}

pub fn validate_news(draft: &NewsDraft) -> Result<(), DomainError> {
    require_min("title", &draft.title, MIN_TITLE_LEN)?;
    require_min("content", &draft.content, MIN_BODY_LEN)?;
    if let Some(end) = draft.end_date {
        if end <= draft.publish_date {
            return Err(DomainError::Validation(
                "end date must be after publish date".into(),
            ));
        }
    }
    if let Some(image) = draft.image.as_deref() {
        let image = image.trim();
        let ok = image.starts_with("data:")
            || reqwest::Url::parse(image)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
        if !ok {
            return Err(DomainError::Validation(
                "image must be an http(s) URL or a data: URI".into(),
            ));
        }
    }
    Ok(())
}

/// Enrollment links must be absolute `https://` URLs.
pub fn validate_form_url(raw: &str) -> Result<(), DomainError> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|_| DomainError::Validation(format!("invalid form URL: {raw}")))?;
    if url.scheme() != "https" {
        return Err(DomainError::Validation(
            "form URL must start with https://".into(),
        ));
    }
    Ok(())
}

/// Email present with an `@`, password at least `min_len` characters.
pub fn validate_registration(reg: &Registration, min_len: usize) -> Result<(), DomainError> {
    let email = reg.email.trim();
    require("email", email)?;
    if !email.contains('@') {
        return Err(DomainError::Validation("email is not valid".into()));
    }
    require("password", &reg.password)?;
    if reg.password.chars().count() < min_len {
        return Err(DomainError::Validation(format!(
            "password must be at least {min_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_password_change(
    change: &PasswordChange,
    min_len: usize,
) -> Result<(), DomainError> {
    if change.current_password.is_empty()
        || change.new_password.is_empty()
        || change.confirm_password.is_empty()
    {
        return Err(DomainError::Validation("all fields are required".into()));
    }
    if change.new_password.chars().count() < min_len {
        return Err(DomainError::Validation(format!(
            "new password must be at least {min_len} characters"
        )));
    }
    if change.new_password != change.confirm_password {
        return Err(DomainError::Validation("passwords do not match".into()));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Required, and at least `min` characters once trimmed.
fn require_min(field: &str, value: &str, min: usize) -> Result<(), DomainError> {
    require(field, value)?;
    if value.trim().chars().count() < min {
        return Err(DomainError::Validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offering() -> OfferingDraft {
        OfferingDraft {
            title: "Data Science".into(),
            description: "Introduction to data work".into(),
            modality: "Hybrid".into(),
            duration: "6 months".into(),
            start_date: date(2025, 3, 1),
            end_date: date(2025, 9, 1),
            form_url: "https://forms.example.edu/ds".into(),
        }
    }

    #[test]
    fn test_valid_offering() {
        assert!(validate_offering(&offering()).is_ok());
    }

    #[test]
    fn test_offering_requires_https() {
        let mut d = offering();
        d.form_url = "http://forms.example.edu/ds".into();
        assert!(matches!(validate_offering(&d), Err(DomainError::Validation(_))));
        d.form_url = "not a url".into();
        assert!(validate_offering(&d).is_err());
    }

    #[test]
    fn test_offering_date_range() {
        let mut d = offering();
        d.end_date = d.start_date;
        assert!(validate_offering(&d).is_err());
    }

    #[test]
    fn test_offering_blank_title() {
        let mut d = offering();
        d.title = "   ".into();
        let err = validate_offering(&d).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_offering_minimum_lengths() {
        let mut d = offering();
        d.title = "AI".into();
        let err = validate_offering(&d).unwrap_err();
        assert!(err.to_string().contains("title must be at least 3"));
        d.title = "A.I".into();
        assert!(validate_offering(&d).is_ok());
        d.description = "Too short".into();
        let err = validate_offering(&d).unwrap_err();
        assert!(err.to_string().contains("description must be at least 10"));
        d.description = "  Ten chars!  ".into();
        assert!(validate_offering(&d).is_ok());
    }

    #[test]
    fn test_registration_rules() {
        let reg = |email: &str, password: &str| Registration {
            name: None,
            email: email.into(),
            password: password.into(),
        };
        assert!(validate_registration(&reg("new@uni.edu", "secret1"), 6).is_ok());
        assert!(validate_registration(&reg("  ", "secret1"), 6).is_err());
        assert!(validate_registration(&reg("not-an-email", "secret1"), 6).is_err());
        let err = validate_registration(&reg("new@uni.edu", "12345"), 6).unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }

    #[test]
    fn test_news_minimum_lengths() {
        let n = NewsDraft {
            title: "Hi".into(),
            content: "Short".into(),
            image: None,
            publish_date: date(2025, 2, 1),
            end_date: None,
        };
        assert!(validate_news(&n).unwrap_err().to_string().contains("title"));
        let n = NewsDraft {
            title: "Open day".into(),
            ..n
        };
        assert!(validate_news(&n).unwrap_err().to_string().contains("content"));
    }

    #[test]
    fn test_news_end_date_optional() {
        let mut n = NewsDraft {
            title: "Enrollment open".into(),
            content: "Applications close in March".into(),
            image: Some("https://cdn.example.edu/banner.png".into()),
            publish_date: date(2025, 2, 1),
            end_date: None,
        };
        assert!(validate_news(&n).is_ok());
        n.end_date = Some(date(2025, 1, 1));
        assert!(validate_news(&n).is_err());
        n.end_date = Some(date(2025, 3, 1));
        n.image = Some("ftp://nope".into());
        assert!(validate_news(&n).is_err());
        n.image = Some("data:image/png;base64,AAAA".into());
        assert!(validate_news(&n).is_ok());
    }

    #[test]
    fn test_password_change_rules() {
        let mut c = PasswordChange {
            current_password: "old".into(),
            new_password: "abc".into(),
            confirm_password: "abc".into(),
        };
        assert!(validate_password_change(&c, 6).is_err());
        c.new_password = "abcdef".into();
        assert!(validate_password_change(&c, 6).is_err());
        c.confirm_password = "abcdef".into();
        assert!(validate_password_change(&c, 6).is_ok());
        c.current_password.clear();
        assert!(validate_password_change(&c, 6).is_err());
    }
}
