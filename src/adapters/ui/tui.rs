//! Implements InputPort. Inquire-based pages driven by the session gate.
//!
//! Every pass of the route loop evaluates the gate for the current route and
//! renders what it says: a spinner while the session resolves, a notice
//! while a redirect is pending, or the page itself.

use crate::adapters::ui::display::run_display;
use crate::adapters::ui::progress::spinner;
use crate::adapters::ui::router::TerminalRouter;
use crate::domain::entities::parse_date;
use crate::domain::routes::{self, Route};
use crate::domain::{
    Credentials, DomainError, GateRender, NewsDraft, NewsItem, Offering, OfferingDraft,
    OfferingKind, PasswordChange, Registration,
};
use crate::ports::{InputPort, Navigator};
use crate::usecases::{CatalogService, DisplayHandle, SessionService};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use inquire::error::InquireResult;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::validator::Validation;
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Select, Text};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long to wait for a pending session before asking the oracle again.
const PENDING_RECHECK: Duration = Duration::from_secs(2);
const REDIRECT_SETTLE: Duration = Duration::from_millis(50);

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let accent = Color::Rgb {
        r: 0x93,
        g: 0x33,
        b: 0xea,
    };
    let blue = Color::Rgb {
        r: 0x1d,
        g: 0x4e,
        b: 0xd8,
    };
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(accent))
        .with_answered_prompt_prefix(Styled::new("✔").with_fg(blue))
        .with_highlighted_option_prefix(Styled::new("➤").with_fg(accent))
        .with_answer(StyleSheet::new().with_fg(blue))
        .with_help_message(StyleSheet::new().with_fg(Color::DarkGrey));
    inquire::set_global_render_config(config);
}

/// Run a blocking prompt off the async workers. `Ok(None)` means the user backed out (Esc / Ctrl-C).
async fn ask<T, F>(prompt: F) -> Result<Option<T>, DomainError>
where
    F: FnOnce() -> InquireResult<T> + Send + 'static,
    T: Send + 'static,
{
    let answer = tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| DomainError::Ui(format!("prompt task failed: {}", e)))?;
    match answer {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

fn date_validator(input: &str) -> Result<Validation, inquire::error::CustomUserError> {
    Ok(match parse_date(input) {
        Some(_) => Validation::Valid,
        None => Validation::Invalid("Use YYYY-MM-DD".into()),
    })
}

fn optional_date_validator(input: &str) -> Result<Validation, inquire::error::CustomUserError> {
    if input.trim().is_empty() {
        return Ok(Validation::Valid);
    }
    date_validator(input)
}

fn prompt_date(label: &str, initial: Option<NaiveDate>) -> InquireResult<NaiveDate> {
    let initial = initial
        .unwrap_or_else(|| Local::now().date_naive())
        .format("%Y-%m-%d")
        .to_string();
    let raw = Text::new(label)
        .with_initial_value(&initial)
        .with_validator(date_validator)
        .prompt()?;
    parse_date(&raw).ok_or_else(|| InquireError::Custom("invalid date".into()))
}

fn prompt_text(label: &str, initial: &str) -> InquireResult<String> {
    Text::new(label).with_initial_value(initial).prompt()
}

fn offering_form(kind: OfferingKind, existing: Option<OfferingDraft>) -> InquireResult<OfferingDraft> {
    let e = existing.as_ref();
    println!("{} details (Esc to cancel)", capitalize(&kind.to_string()));
    Ok(OfferingDraft {
        title: prompt_text("Title:", e.map_or("", |d| d.title.as_str()))?,
        description: prompt_text("Description:", e.map_or("", |d| d.description.as_str()))?,
        modality: prompt_text("Modality:", e.map_or("", |d| d.modality.as_str()))?,
        duration: prompt_text("Duration:", e.map_or("", |d| d.duration.as_str()))?,
        start_date: prompt_date("Start date:", e.map(|d| d.start_date))?,
        end_date: prompt_date("End date:", e.map(|d| d.end_date))?,
        form_url: Text::new("Sign-up form URL (https):")
            .with_initial_value(e.map_or("", |d| d.form_url.as_str()))
            .prompt()?,
    })
}

fn news_form(existing: Option<NewsDraft>) -> InquireResult<NewsDraft> {
    let e = existing.as_ref();
    println!("News details (Esc to cancel)");
    let title = prompt_text("Title:", e.map_or("", |d| d.title.as_str()))?;
    let content = prompt_text("Content:", e.map_or("", |d| d.content.as_str()))?;
    let image = prompt_text(
        "Image URL (optional):",
        e.and_then(|d| d.image.as_deref()).unwrap_or(""),
    )?;
    let publish_date = prompt_date("Publish date:", e.map(|d| d.publish_date))?;
    let end_initial = e
        .and_then(|d| d.end_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let end_raw = Text::new("End date (empty = no end):")
        .with_initial_value(&end_initial)
        .with_validator(optional_date_validator)
        .prompt()?;
    Ok(NewsDraft {
        title,
        content,
        image: Some(image).filter(|s| !s.trim().is_empty()),
        publish_date,
        end_date: parse_date(&end_raw),
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn offering_label(o: &Offering) -> String {
    format!(
        "{} [{} · {} → {}]",
        o.title,
        o.modality,
        o.start_date.format("%Y-%m-%d"),
        o.end_date.format("%Y-%m-%d")
    )
}

fn news_label(n: &NewsItem, today: NaiveDate) -> String {
    let window = match n.end_date {
        Some(end) if end <= today => format!("expired {}", end.format("%Y-%m-%d")),
        Some(end) => format!("until {}", end.format("%Y-%m-%d")),
        None => "no end".to_string(),
    };
    format!("{} [{}]", n.title, window)
}

/// Pick one entry from `labels`. Returns its index, or `None` when the user backs out.
async fn pick(message: &str, labels: Vec<String>) -> Result<Option<usize>, DomainError> {
    if labels.is_empty() {
        println!("Nothing here yet.");
        return Ok(None);
    }
    let message = message.to_string();
    let chosen = ask(move || Select::new(&message, labels).raw_prompt()).await?;
    Ok(chosen.map(|option| option.index))
}

async fn confirm(message: &str) -> Result<bool, DomainError> {
    let message = message.to_string();
    Ok(ask(move || Confirm::new(&message).with_default(false).prompt())
        .await?
        .unwrap_or(false))
}

/// Report a failed action without leaving the page.
fn report(action: &str, result: Result<(), DomainError>) {
    match result {
        Ok(()) => println!("✔ {}", action),
        Err(e) => {
            warn!(action, error = %e, "action failed");
            println!("✘ {}: {}", action, e);
        }
    }
}

/// Whether the route loop keeps going.
enum Flow {
    Continue,
    Exit,
}

const LOGIN_SIGN_IN: &str = "Sign in";
const LOGIN_REGISTER: &str = "Create an account";

const HOME_DISPLAY: &str = "Public display";
const HOME_ADMIN: &str = "Administration";
const HOME_PASSWORD: &str = "Change password";
const HOME_SIGN_OUT: &str = "Sign out";
const HOME_QUIT: &str = "Quit";

const ADMIN_COURSES: &str = "Courses";
const ADMIN_MASTERS: &str = "Masters";
const ADMIN_NEWS: &str = "News";
const ADMIN_REFRESH: &str = "Refresh from panel";
const BACK: &str = "Back";

const ACTION_CREATE: &str = "Create";
const ACTION_EDIT: &str = "Edit";
const ACTION_DELETE: &str = "Delete";

/// TUI adapter. Inquire prompts plus the crossterm display.
pub struct TuiInputPort {
    session: Arc<SessionService>,
    catalog: Arc<CatalogService>,
    display: DisplayHandle,
    router: Arc<TerminalRouter>,
}

impl TuiInputPort {
    pub fn new(
        session: Arc<SessionService>,
        catalog: Arc<CatalogService>,
        display: DisplayHandle,
        router: Arc<TerminalRouter>,
    ) -> Self {
        Self {
            session,
            catalog,
            display,
            router,
        }
    }

    /// Wait for the session to resolve, nudging the oracle now and then.
    async fn wait_for_session(&self) {
        let pb = spinner("Checking session…");
        let mut rx = self.session.subscribe();
        if tokio::time::timeout(PENDING_RECHECK, rx.changed()).await.is_err() {
            self.session.refresh().await;
        }
        pb.finish_and_clear();
    }

    async fn page(&self, route: &Route) -> Result<Flow, DomainError> {
        match route.path.as_str() {
            routes::LOGIN => self.login_page().await,
            routes::REGISTER => self.register_page().await,
            routes::HOME => self.home_page().await,
            routes::ADMIN => self.admin_page().await,
            routes::DISPLAY => {
                if let Err(e) = run_display(self.display.clone()).await {
                    warn!(error = %e, "display closed with error");
                    println!("✘ Display unavailable: {}", e);
                }
                self.router.navigate(Route::to(routes::HOME));
                Ok(Flow::Continue)
            }
            routes::CHANGE_PASSWORD => self.change_password_page().await,
            other => {
                println!("Page not found: {}", other);
                self.router.navigate(Route::to(routes::HOME));
                Ok(Flow::Continue)
            }
        }
    }

    async fn login_page(&self) -> Result<Flow, DomainError> {
        let options = vec![LOGIN_SIGN_IN, LOGIN_REGISTER, HOME_QUIT];
        let choice = ask(move || Select::new("Welcome", options).prompt()).await?;
        match choice {
            Some(LOGIN_SIGN_IN) => self.sign_in_form().await,
            Some(LOGIN_REGISTER) => {
                self.router.navigate(Route::to(routes::REGISTER));
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Exit),
        }
    }

    async fn sign_in_form(&self) -> Result<Flow, DomainError> {
        println!("\nSign in to the panel (Esc to go back)");
        let answer = ask(|| {
            let email = Text::new("Email:").prompt()?;
            let password = Password::new("Password:")
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt()?;
            Ok(Credentials { email, password })
        })
        .await?;
        let Some(credentials) = answer else {
            return Ok(Flow::Continue);
        };
        match self.session.sign_in(&credentials).await {
            Ok(_) => self.router.navigate(Route::to(routes::HOME)),
            Err(DomainError::Auth(_)) => println!("✘ Invalid email or password"),
            Err(e) => println!("✘ Sign-in failed: {}", e),
        }
        Ok(Flow::Continue)
    }

    async fn register_page(&self) -> Result<Flow, DomainError> {
        println!("\nCreate a panel account (Esc to go back)");
        let answer = ask(|| {
            let name = Text::new("Name:")
                .with_help_message("Optional")
                .prompt()?;
            let email = Text::new("Email:").prompt()?;
            let password = Password::new("Password:")
                .with_display_mode(PasswordDisplayMode::Masked)
                .with_custom_confirmation_message("Confirm password:")
                .with_custom_confirmation_error_message("Passwords do not match")
                .prompt()?;
            let name = name.trim().to_string();
            Ok(Registration {
                name: (!name.is_empty()).then_some(name),
                email,
                password,
            })
        })
        .await?;
        let Some(registration) = answer else {
            self.router.navigate(Route::to(routes::LOGIN));
            return Ok(Flow::Continue);
        };
        match self.session.register(&registration).await {
            Ok(()) => println!("✔ Account created. Sign in to continue"),
            Err(e) => {
                warn!(error = %e, "registration failed");
                println!("✘ Registration failed: {}", e);
            }
        }
        Ok(Flow::Continue)
    }

    async fn home_page(&self) -> Result<Flow, DomainError> {
        let options = vec![HOME_DISPLAY, HOME_ADMIN, HOME_PASSWORD, HOME_SIGN_OUT, HOME_QUIT];
        let choice = ask(move || Select::new("Where to?", options).prompt()).await?;
        match choice {
            Some(HOME_DISPLAY) => self.router.navigate(Route::to(routes::DISPLAY)),
            Some(HOME_ADMIN) => self.router.navigate(Route::to(routes::ADMIN)),
            Some(HOME_PASSWORD) => self.router.navigate(Route::to(routes::CHANGE_PASSWORD)),
            Some(HOME_SIGN_OUT) => report("Signed out", self.session.sign_out().await),
            _ => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    async fn admin_page(&self) -> Result<Flow, DomainError> {
        let options = vec![ADMIN_COURSES, ADMIN_MASTERS, ADMIN_NEWS, ADMIN_REFRESH, BACK];
        let choice = ask(move || Select::new("Administration", options).prompt()).await?;
        match choice {
            Some(ADMIN_COURSES) => self.manage_offerings(OfferingKind::Course).await?,
            Some(ADMIN_MASTERS) => self.manage_offerings(OfferingKind::Master).await?,
            Some(ADMIN_NEWS) => self.manage_news().await?,
            Some(ADMIN_REFRESH) => {
                let pb = spinner("Refreshing…");
                let stats = self.catalog.refresh().await;
                pb.finish_and_clear();
                match stats {
                    Ok(s) => println!(
                        "✔ {} courses, {} masters, {} news ({} expired)",
                        s.courses,
                        s.masters,
                        s.news_active + s.news_expired,
                        s.news_expired
                    ),
                    Err(e) => println!("✘ Refresh failed: {}", e),
                }
            }
            _ => self.router.navigate(Route::to(routes::HOME)),
        }
        Ok(Flow::Continue)
    }

    async fn action(&self, title: String) -> Result<Option<&'static str>, DomainError> {
        let options = vec![ACTION_CREATE, ACTION_EDIT, ACTION_DELETE, BACK];
        Ok(ask(move || Select::new(&title, options).prompt())
            .await?
            .filter(|a| *a != BACK))
    }

    async fn manage_offerings(&self, kind: OfferingKind) -> Result<(), DomainError> {
        loop {
            let items = self.catalog.snapshot().await.offerings(kind).to_vec();
            let title = format!("{}s ({})", capitalize(&kind.to_string()), items.len());
            let Some(action) = self.action(title).await? else {
                return Ok(());
            };
            match action {
                ACTION_CREATE => {
                    if let Some(draft) = ask(move || offering_form(kind, None)).await? {
                        let result = self.catalog.create_offering(kind, &draft).await;
                        report("Saved", result.map(|o| info!(id = %o.id, "created from TUI")));
                    }
                }
                ACTION_EDIT => {
                    let labels = items.iter().map(offering_label).collect();
                    let Some(i) = pick("Edit which one?", labels).await? else {
                        continue;
                    };
                    let id = items[i].id.clone();
                    let existing = OfferingDraft::from(&items[i]);
                    if let Some(draft) = ask(move || offering_form(kind, Some(existing))).await? {
                        let result = self.catalog.update_offering(kind, &id, &draft).await;
                        report("Updated", result.map(|_| ()));
                    }
                }
                ACTION_DELETE => {
                    let labels = items.iter().map(offering_label).collect();
                    let Some(i) = pick("Delete which one?", labels).await? else {
                        continue;
                    };
                    if confirm(&format!("Delete \"{}\"?", items[i].title)).await? {
                        report("Deleted", self.catalog.delete_offering(kind, &items[i].id).await);
                    }
                }
                _ => {}
            }
        }
    }

    async fn manage_news(&self) -> Result<(), DomainError> {
        loop {
            let items = self.catalog.snapshot().await.news;
            let today = Local::now().date_naive();
            let title = format!("News ({})", items.len());
            let Some(action) = self.action(title).await? else {
                return Ok(());
            };
            match action {
                ACTION_CREATE => {
                    if let Some(draft) = ask(|| news_form(None)).await? {
                        report("Saved", self.catalog.create_news(&draft).await.map(|_| ()));
                    }
                }
                ACTION_EDIT => {
                    let labels = items.iter().map(|n| news_label(n, today)).collect();
                    let Some(i) = pick("Edit which one?", labels).await? else {
                        continue;
                    };
                    let id = items[i].id.clone();
                    let existing = NewsDraft::from(&items[i]);
                    if let Some(draft) = ask(move || news_form(Some(existing))).await? {
                        report("Updated", self.catalog.update_news(&id, &draft).await.map(|_| ()));
                    }
                }
                ACTION_DELETE => {
                    let labels = items.iter().map(|n| news_label(n, today)).collect();
                    let Some(i) = pick("Delete which one?", labels).await? else {
                        continue;
                    };
                    if confirm(&format!("Delete \"{}\"?", items[i].title)).await? {
                        report("Deleted", self.catalog.delete_news(&items[i].id).await);
                    }
                }
                _ => {}
            }
        }
    }

    async fn change_password_page(&self) -> Result<Flow, DomainError> {
        println!("\nChange password (Esc to go back)");
        let answer = ask(|| {
            let masked = |label: &str| {
                Password::new(label)
                    .without_confirmation()
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .prompt()
            };
            Ok(PasswordChange {
                current_password: masked("Current password:")?,
                new_password: masked("New password:")?,
                confirm_password: masked("Confirm new password:")?,
            })
        })
        .await?;
        let Some(change) = answer else {
            if self.session.status().must_change_password() {
                println!("A new password is required before continuing.");
            } else {
                self.router.navigate(Route::to(routes::HOME));
            }
            return Ok(Flow::Continue);
        };
        report("Password changed", self.session.change_password(&change).await);
        Ok(Flow::Continue)
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let route = self.router.current();
            let decision = self.session.evaluate(&route).await;
            match decision.render {
                GateRender::Loading => self.wait_for_session().await,
                GateRender::Redirecting | GateRender::MustChangePassword => {
                    if decision.render == GateRender::MustChangePassword {
                        println!("For security, you need to change your password before continuing.");
                    }
                    if decision.navigate.is_none() && self.router.current() == route {
                        // Navigation already issued for this state; let it land.
                        tokio::time::sleep(REDIRECT_SETTLE).await;
                    }
                }
                GateRender::Children => match self.page(&route).await? {
                    Flow::Continue => {}
                    Flow::Exit => break,
                },
            }
        }
        info!("leaving panel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_validators() {
        assert!(matches!(date_validator("2025-03-01").unwrap(), Validation::Valid));
        assert!(matches!(date_validator("03/01/2025").unwrap(), Validation::Invalid(_)));
        assert!(matches!(optional_date_validator("  ").unwrap(), Validation::Valid));
    }

    #[test]
    fn test_news_label_marks_expired() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let item = NewsItem {
            id: "n1".into(),
            title: "Enrolment".into(),
            content: String::new(),
            image: None,
            publish_date: today,
            end_date: Some(today),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(news_label(&item, today), "Enrolment [expired 2025-06-15]");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("course"), "Course");
        assert_eq!(capitalize(""), "");
    }
}
