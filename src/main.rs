//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the gate, the display schedule and the catalog live in use cases.

use campus_display::adapters::http::{ApiClient, HttpNewsStore, HttpOfferingStore, HttpSessionOracle};
use campus_display::adapters::memory::{MemoryNewsStore, MemoryOfferingStore, MemorySessionOracle};
use campus_display::adapters::ui::progress::spinner;
use campus_display::adapters::ui::router::TerminalRouter;
use campus_display::adapters::ui::tui::TuiInputPort;
use campus_display::domain::routes::Route;
use campus_display::domain::{NewsDraft, OfferingDraft, OfferingKind};
use campus_display::ports::{InputPort, NewsStore, OfferingStore, SessionOracle};
use campus_display::shared::config::AppConfig;
use campus_display::usecases::{CatalogService, DisplayScheduler, DisplayTimings, SessionService};
use chrono::{Days, Local};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Offline demo account. The password must be changed on first sign-in.
const OFFLINE_EMAIL: &str = "admin@localhost";
const OFFLINE_PASSWORD: &str = "changeme";

struct Adapters {
    session: Arc<dyn SessionOracle>,
    offerings: Arc<dyn OfferingStore>,
    news: Arc<dyn NewsStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    campus_display::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be read; using defaults");
        AppConfig::default()
    });

    // --- Adapters: panel API, or in-memory for offline demos ---
    let adapters = if cfg.is_offline() {
        info!(email = OFFLINE_EMAIL, "offline mode: in-memory stores and demo account");
        println!("Offline mode. Sign in as {OFFLINE_EMAIL} / {OFFLINE_PASSWORD}");
        offline_adapters().await?
    } else {
        let base_url = cfg.api_base_url_or_default();
        info!(url = %base_url, "using panel API");
        let api = ApiClient::new(base_url).map_err(|e| anyhow::anyhow!("{}", e))?;
        Adapters {
            session: Arc::new(HttpSessionOracle::new(api.clone())),
            offerings: Arc::new(HttpOfferingStore::new(api.clone())),
            news: Arc::new(HttpNewsStore::new(api)),
        }
    };

    // --- Display scheduler (single owner of carousel and news state) ---
    let timings = DisplayTimings::from_config(&cfg).map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(
        carousel_ms = timings.carousel.as_millis() as u64,
        news_cycle_ms = timings.news_cycle.as_millis() as u64,
        news_visible_ms = timings.news_visible.as_millis() as u64,
        "display timings"
    );
    let (scheduler, display) =
        DisplayScheduler::new(timings).map_err(|e| anyhow::anyhow!("{}", e))?;
    let scheduler_task = tokio::spawn(scheduler.run());

    // --- Catalog: first load, then polling ---
    let catalog = Arc::new(CatalogService::new(
        adapters.offerings,
        adapters.news,
        display.clone(),
    ));
    let pb = spinner("Loading catalog…");
    match catalog.refresh().await {
        Ok(stats) => info!(?stats, "catalog loaded"),
        Err(e) => warn!(error = %e, "initial catalog load failed"),
    }
    pb.finish_and_clear();
    let refresh_every = Duration::from_secs(cfg.refresh_interval_secs_or_default().max(1));
    let _polling = catalog.start_polling(refresh_every);

    // --- Session: resolve once, then re-check on an interval ---
    let router = Arc::new(TerminalRouter::new(Route::default()));
    let session = Arc::new(SessionService::new(
        adapters.session,
        router.clone(),
        cfg.public_routes_or_default(),
        Duration::from_secs(cfg.session_refresh_secs_or_default().max(1)),
        cfg.min_password_len_or_default(),
    ));
    let status = session.start().await;
    info!(auth = ?status.auth_status(), "session resolved");

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::clone(&session),
        Arc::clone(&catalog),
        display.clone(),
        router,
    ));

    // --- Run (route loop until the user quits) ---
    let result = input_port.run().await;

    if let Err(e) = display.shutdown() {
        warn!(error = %e, "display scheduler already stopped");
    }
    let _ = scheduler_task.await;
    result.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// In-memory adapters with the demo account and a small sample catalog.
async fn offline_adapters() -> anyhow::Result<Adapters> {
    let session = MemorySessionOracle::new().with_account(OFFLINE_EMAIL, OFFLINE_PASSWORD, true);
    let offerings = MemoryOfferingStore::new();
    let news = MemoryNewsStore::new();

    let today = Local::now().date_naive();
    let later = |days: u64| today.checked_add_days(Days::new(days)).unwrap_or(today);
    let samples = [
        (OfferingKind::Course, "Introduction to Rust", "Online", "6 weeks"),
        (OfferingKind::Course, "Data Analysis with Python", "Hybrid", "8 weeks"),
        (OfferingKind::Master, "Master in Software Engineering", "On campus", "2 years"),
    ];
    for (kind, title, modality, duration) in samples {
        let draft = OfferingDraft {
            title: title.to_string(),
            description: format!("{title}. Enrolment is open."),
            modality: modality.to_string(),
            duration: duration.to_string(),
            start_date: later(14),
            end_date: later(120),
            form_url: "https://forms.example.edu/enrol".to_string(),
        };
        offerings
            .create(kind, &draft)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    news.create(&NewsDraft {
        title: "Open house".to_string(),
        content: "Visit the continuing education centre this Friday.".to_string(),
        image: None,
        publish_date: today,
        end_date: Some(later(7)),
    })
    .await
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(Adapters {
        session: Arc::new(session),
        offerings: Arc::new(offerings),
        news: Arc::new(news),
    })
}
