//! Catalog use case: pulls courses, masters and news from the stores, feeds
//! the display, and runs admin writes.
//!
//! - News eligibility (`now < endDate`, or no end date) is applied here,
//!   before the display ever sees the list
//! - Every successful write is followed by a full refresh of all three lists
//! - A failed list keeps the previous snapshot for that list
//! - Refreshes run one at a time, so an older fetch never publishes over a newer one

use crate::domain::validation::{validate_news, validate_offering};
use crate::domain::{DomainError, NewsDraft, NewsItem, Offering, OfferingDraft, OfferingKind};
use crate::ports::{NewsStore, OfferingStore};
use crate::shared::timer::ScopedTimer;
use crate::usecases::display_scheduler::DisplayHandle;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{info, warn};

/// Last successfully fetched lists. News here is unfiltered (the admin sees expired items too).
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub courses: Vec<Offering>,
    pub masters: Vec<Offering>,
    pub news: Vec<NewsItem>,
}

impl CatalogSnapshot {
    pub fn offerings(&self, kind: OfferingKind) -> &[Offering] {
        match kind {
            OfferingKind::Course => &self.courses,
            OfferingKind::Master => &self.masters,
        }
    }
}

/// Result of one refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub courses: usize,
    pub masters: usize,
    pub news_active: usize,
    pub news_expired: usize,
    /// Lists that could not be fetched this round.
    pub failures: usize,
}

/// Keep only items still eligible at `now`, preserving order.
pub fn filter_active_news(items: &[NewsItem], now: DateTime<Utc>) -> Vec<NewsItem> {
    items
        .iter()
        .filter(|n| n.is_active_at(now))
        .cloned()
        .collect()
}

pub struct CatalogService {
    offerings: Arc<dyn OfferingStore>,
    news: Arc<dyn NewsStore>,
    display: DisplayHandle,
    snapshot: RwLock<CatalogSnapshot>,
    /// Held from fetch to publish.
    refresh_lock: Mutex<()>,
}

impl CatalogService {
    pub fn new(
        offerings: Arc<dyn OfferingStore>,
        news: Arc<dyn NewsStore>,
        display: DisplayHandle,
    ) -> Self {
        Self {
            offerings,
            news,
            display,
            snapshot: RwLock::new(CatalogSnapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Fetch all three lists concurrently and hand them to the display.
    pub async fn refresh(&self) -> Result<RefreshStats, DomainError> {
        self.refresh_at(Utc::now()).await
    }

    /// `refresh` with an explicit clock for the news filter.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<RefreshStats, DomainError> {
        let _serial = self.refresh_lock.lock().await;
        let (courses, masters, news) = tokio::join!(
            self.offerings.list(OfferingKind::Course),
            self.offerings.list(OfferingKind::Master),
            self.news.list(),
        );

        let mut stats = RefreshStats::default();
        let mut snapshot = self.snapshot.write().await;

        for (kind, result) in [(OfferingKind::Course, courses), (OfferingKind::Master, masters)] {
            match result {
                Ok(items) => {
                    self.display.replace_offerings(kind, items.clone())?;
                    match kind {
                        OfferingKind::Course => snapshot.courses = items,
                        OfferingKind::Master => snapshot.masters = items,
                    }
                }
                Err(e) => {
                    stats.failures += 1;
                    warn!(kind = %kind, error = %e, "offering refresh failed; keeping previous list");
                }
            }
        }

        match news {
            Ok(items) => {
                self.display.replace_news(filter_active_news(&items, now))?;
                snapshot.news = items;
            }
            Err(e) => {
                stats.failures += 1;
                warn!(error = %e, "news refresh failed; keeping previous list");
            }
        }

        stats.courses = snapshot.courses.len();
        stats.masters = snapshot.masters.len();
        stats.news_active = snapshot.news.iter().filter(|n| n.is_active_at(now)).count();
        stats.news_expired = snapshot.news.len() - stats.news_active;
        if stats.news_expired > 0 || stats.failures > 0 {
            info!(?stats, "catalog refreshed");
        }
        Ok(stats)
    }

    /// Re-fetch on a fixed interval until the returned timer is dropped.
    pub fn start_polling(self: &Arc<Self>, every: Duration) -> ScopedTimer {
        let this = Arc::clone(self);
        ScopedTimer::spawn("catalog-refresh", async move {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                interval.tick().await;
                if let Err(e) = this.refresh().await {
                    warn!(error = %e, "catalog polling stopped");
                    break;
                }
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin writes
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_offering(
        &self,
        kind: OfferingKind,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        validate_offering(draft)?;
        let created = self.offerings.create(kind, draft).await?;
        info!(kind = %kind, id = %created.id, title = %created.title, "offering created");
        self.refresh().await?;
        Ok(created)
    }

    pub async fn update_offering(
        &self,
        kind: OfferingKind,
        id: &str,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError> {
        validate_offering(draft)?;
        let updated = self.offerings.update(kind, id, draft).await?;
        info!(kind = %kind, id, "offering updated");
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_offering(&self, kind: OfferingKind, id: &str) -> Result<(), DomainError> {
        self.offerings.delete(kind, id).await?;
        info!(kind = %kind, id, "offering deleted");
        self.refresh().await?;
        Ok(())
    }

    pub async fn create_news(&self, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        validate_news(draft)?;
        let created = self.news.create(draft).await?;
        info!(id = %created.id, title = %created.title, "news created");
        self.refresh().await?;
        Ok(created)
    }

    pub async fn update_news(&self, id: &str, draft: &NewsDraft) -> Result<NewsItem, DomainError> {
        validate_news(draft)?;
        let updated = self.news.update(id, draft).await?;
        info!(id, "news updated");
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_news(&self, id: &str) -> Result<(), DomainError> {
        self.news.delete(id).await?;
        info!(id, "news deleted");
        self.refresh().await?;
        Ok(())
    }
}
