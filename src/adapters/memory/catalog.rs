//! Implements OfferingStore and NewsStore over vectors behind a RwLock.
//!
//! Lists are kept newest-first: creates insert at the front.

use crate::domain::{DomainError, NewsDraft, NewsItem, Offering, OfferingDraft, OfferingKind};
use crate::ports::{NewsStore, OfferingStore};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use qrcode::QrCode;
use qrcode::render::svg;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::warn;

/// QR image used when the form URL cannot be encoded (same fallback the panel uses).
const PLACEHOLDER_QR: &str = "/placeholder.svg";
const QR_SIZE: u32 = 200;

/// SVG QR code of `form_url` as a `data:` URI, 200 px wide like the panel's.
fn qr_data_uri(form_url: &str) -> String {
    match QrCode::new(form_url.as_bytes()) {
        Ok(code) => {
            let image = code
                .render::<svg::Color>()
                .min_dimensions(QR_SIZE, QR_SIZE)
                .build();
            format!("data:image/svg+xml;base64,{}", STANDARD.encode(image))
        }
        Err(e) => {
            warn!(error = %e, "QR encoding failed; using placeholder");
            PLACEHOLDER_QR.to_string()
        }
    }
}

#[derive(Default)]
pub struct MemoryOfferingStore {
    items: RwLock<HashMap<OfferingKind, Vec<Offering>>>,
    next_id: AtomicU64,
}

impl MemoryOfferingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(id: String, draft: &OfferingDraft) -> Offering {
        Offering {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            modality: draft.modality.clone(),
            duration: draft.duration.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            form_url: draft.form_url.clone(),
            qr_image: qr_data_uri(&draft.form_url),
            created_at: Utc::now(),
        }
    }
}

#[async_trait::async_trait]
impl OfferingStore for MemoryOfferingStore {
    async fn list(&self, kind: OfferingKind) -> Result<Vec<Offering>, DomainError> {
        Ok(self
            .items
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        kind: OfferingKind,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let offering = Self::build(format!("{kind}-{n}"), draft);
        self.items
            .write()
            .await
            .entry(kind)
            .or_default()
            .insert(0, offering.clone());
        Ok(offering)
    }

    async fn update(
        &self,
        kind: OfferingKind,
        id: &str,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        let mut items = self.items.write().await;
        let slot = items
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|o| o.id == id))
            .ok_or_else(|| DomainError::Store(format!("{kind} {id} not found")))?;
        let created_at = slot.created_at;
        *slot = Offering {
            created_at,
            ..Self::build(id.to_string(), draft)
        };
        Ok(slot.clone())
    }

    async fn delete(&self, kind: OfferingKind, id: &str) -> Result<(), DomainError> {
        let mut items = self.items.write().await;
        let list = items.entry(kind).or_default();
        let before = list.len();
        list.retain(|o| o.id != id);
        if list.len() == before {
            return Err(DomainError::Store(format!("{kind} {id} not found")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNewsStore {
    items: RwLock<Vec<NewsItem>>,
    next_id: AtomicU64,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn news_from_draft(id: String, draft: &NewsDraft) -> NewsItem {
    NewsItem {
        id,
        title: draft.title.clone(),
        content: draft.content.clone(),
        image: draft.image.clone().filter(|s| !s.trim().is_empty()),
        publish_date: draft.publish_date,
        end_date: draft.end_date,
        created_at: Utc::now(),
    }
}

#[async_trait::async_trait]
impl NewsStore for MemoryNewsStore {
    async fn list(&self) -> Result<Vec<NewsItem>, DomainError> {
        Ok(self.items.read().await.clone())
    }

    async fn create(&self, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let item = news_from_draft(format!("news-{n}"), draft);
        self.items.write().await.insert(0, item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DomainError::Store(format!("news {id} not found")))?;
        let created_at = slot.created_at;
        *slot = NewsItem {
            created_at,
            ..news_from_draft(id.to_string(), draft)
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|n| n.id != id);
        if items.len() == before {
            return Err(DomainError::Store(format!("news {id} not found")));
        }
        Ok(())
    }
}
