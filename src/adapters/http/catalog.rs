//! Offering and news stores backed by the panel's REST routes.
//!
//! `/api/{courses|masters|news}` for list and create, `/{id}` for update and
//! delete. The server renders the QR image from `formUrl` on write.

use super::client::ApiClient;
use crate::domain::{DomainError, NewsDraft, NewsItem, Offering, OfferingDraft, OfferingKind};
use crate::ports::{NewsStore, OfferingStore};
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

pub struct HttpOfferingStore {
    api: ApiClient,
}

impl HttpOfferingStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

fn collection_path(kind: OfferingKind) -> String {
    format!("/api/{}", kind.collection())
}

#[async_trait::async_trait]
impl OfferingStore for HttpOfferingStore {
    async fn list(&self, kind: OfferingKind) -> Result<Vec<Offering>, DomainError> {
        let items: Vec<Offering> = self.api.get_json(&collection_path(kind)).await?;
        debug!(kind = %kind, count = items.len(), "offerings fetched");
        Ok(items)
    }

    async fn create(
        &self,
        kind: OfferingKind,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        self.api
            .send_json(Method::POST, &collection_path(kind), draft)
            .await
    }

    async fn update(
        &self,
        kind: OfferingKind,
        id: &str,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        let path = format!("{}/{}", collection_path(kind), id);
        self.api.send_json(Method::PUT, &path, draft).await
    }

    async fn delete(&self, kind: OfferingKind, id: &str) -> Result<(), DomainError> {
        self.api
            .delete(&format!("{}/{}", collection_path(kind), id))
            .await
    }
}

/// Wire shape of a news write. The panel stores a missing end date as `""`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsBody<'a> {
    title: &'a str,
    content: &'a str,
    image: Option<&'a str>,
    publish_date: String,
    end_date: String,
}

impl<'a> From<&'a NewsDraft> for NewsBody<'a> {
    fn from(d: &'a NewsDraft) -> Self {
        Self {
            title: &d.title,
            content: &d.content,
            image: d.image.as_deref().filter(|s| !s.trim().is_empty()),
            publish_date: d.publish_date.format("%Y-%m-%d").to_string(),
            end_date: d
                .end_date
                .map(|e| e.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

const NEWS_PATH: &str = "/api/news";

pub struct HttpNewsStore {
    api: ApiClient,
}

impl HttpNewsStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl NewsStore for HttpNewsStore {
    async fn list(&self) -> Result<Vec<NewsItem>, DomainError> {
        let items: Vec<NewsItem> = self.api.get_json(NEWS_PATH).await?;
        debug!(count = items.len(), "news fetched");
        Ok(items)
    }

    async fn create(&self, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        self.api
            .send_json(Method::POST, NEWS_PATH, &NewsBody::from(draft))
            .await
    }

    async fn update(&self, id: &str, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        let path = format!("{}/{}", NEWS_PATH, id);
        self.api
            .send_json(Method::PUT, &path, &NewsBody::from(draft))
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.api.delete(&format!("{}/{}", NEWS_PATH, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_collection_paths() {
        assert_eq!(collection_path(OfferingKind::Course), "/api/courses");
        assert_eq!(collection_path(OfferingKind::Master), "/api/masters");
    }

    #[test]
    fn test_news_body_sends_empty_end_date() {
        let draft = NewsDraft {
            title: "Open day".into(),
            content: "Campus tours".into(),
            image: Some("  ".into()),
            publish_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            end_date: None,
        };
        let json = serde_json::to_value(NewsBody::from(&draft)).unwrap();
        assert_eq!(json["endDate"], "");
        assert_eq!(json["publishDate"], "2025-04-01");
        assert!(json["image"].is_null());
    }

    #[test]
    fn test_offering_list_payload_parses() {
        let body = r#"[{
            "id": "c1", "title": "Rust", "description": "Systems", "modality": "Online",
            "duration": "8 weeks", "startDate": "2025-03-01", "endDate": "2025-05-01T00:00:00.000Z",
            "formUrl": "https://forms.example.edu/rust", "qrCode": "data:image/png;base64,AA==",
            "createdAt": "2025-01-10T09:00:00.000Z"
        }]"#;
        let items: Vec<Offering> = serde_json::from_str(body).unwrap();
        assert_eq!(items[0].qr_image, "data:image/png;base64,AA==");
        assert_eq!(items[0].end_date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
    }
}
