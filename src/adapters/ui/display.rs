//! Full-screen public display.
//!
//! Redraws whenever the scheduler publishes a new view. Keys:
//! `←`/`→` step courses, `a`/`d` step masters, `x` closes the news overlay,
//! `q` or `Esc` leaves the display.

use crate::adapters::ui::banner::{ACCENT_PURPLE, CAMPUS_BLUE, rgb};
use crate::domain::{DomainError, NewsItem, Offering, OfferingKind};
use crate::usecases::{DisplayHandle, DisplayView, Step};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use crossterm::{QueueableCommand, cursor, execute};
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use std::io::{Stdout, Write, stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const KEY_POLL: Duration = Duration::from_millis(100);

/// What a key press asks the display to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKey {
    Quit,
    DismissNews,
    Step(OfferingKind, Step),
}

pub fn map_key(key: &KeyEvent) -> Option<DisplayKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(DisplayKey::Quit),
        KeyCode::Char('x') => Some(DisplayKey::DismissNews),
        KeyCode::Left => Some(DisplayKey::Step(OfferingKind::Course, Step::Prev)),
        KeyCode::Right => Some(DisplayKey::Step(OfferingKind::Course, Step::Next)),
        KeyCode::Char('a') => Some(DisplayKey::Step(OfferingKind::Master, Step::Prev)),
        KeyCode::Char('d') => Some(DisplayKey::Step(OfferingKind::Master, Step::Next)),
        _ => None,
    }
}

/// One line of the screen with its emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Heading(String),
    Title(String),
    Text(String),
    Muted(String),
    /// Pre-rendered block graphics, drawn whole or not at all.
    Code(String),
    Blank,
}

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Line::Heading(s)
            | Line::Title(s)
            | Line::Text(s)
            | Line::Muted(s)
            | Line::Code(s) => s,
            Line::Blank => "",
        }
    }
}

fn offering_lines(kind: OfferingKind, view: &DisplayView, out: &mut Vec<Line>) {
    let carousel = view.carousel(kind);
    let heading = match kind {
        OfferingKind::Course => "COURSES",
        OfferingKind::Master => "MASTERS",
    };
    match (carousel.current(), carousel.position()) {
        (Some(o), Some((pos, total))) => {
            out.push(Line::Heading(format!("{heading}  ({pos} of {total})")));
            push_offering(o, out);
        }
        _ => {
            out.push(Line::Heading(heading.to_string()));
            out.push(Line::Muted(format!("No {kind}s available")));
        }
    }
}

fn push_offering(o: &Offering, out: &mut Vec<Line>) {
    out.push(Line::Title(o.title.clone()));
    out.push(Line::Text(o.description.clone()));
    out.push(Line::Text(format!("Modality: {}   Duration: {}", o.modality, o.duration)));
    out.push(Line::Text(format!(
        "From {} to {}",
        o.start_date.format("%Y-%m-%d"),
        o.end_date.format("%Y-%m-%d")
    )));
    out.push(Line::Muted(format!("Sign up: {}", o.form_url)));
    out.extend(qr_lines(&o.form_url).into_iter().map(Line::Code));
}

/// Sign-up URL as a QR code, two modules per character cell, light on dark.
pub fn qr_lines(url: &str) -> Vec<String> {
    let Ok(code) = QrCode::new(url.as_bytes()) else {
        return Vec::new();
    };
    code.render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build()
        .lines()
        .map(str::to_string)
        .collect()
}

fn news_lines(item: &NewsItem, countdown: u32, out: &mut Vec<Line>) {
    out.push(Line::Heading("NEWS".to_string()));
    out.push(Line::Title(item.title.clone()));
    out.push(Line::Muted(format!("Published {}", item.publish_date.format("%Y-%m-%d"))));
    out.push(Line::Blank);
    for paragraph in item.content.lines() {
        out.push(Line::Text(paragraph.to_string()));
    }
    if let Some(image) = &item.image {
        out.push(Line::Muted(format!("Image: {image}")));
    }
    out.push(Line::Blank);
    out.push(Line::Muted(format!("Closing in {countdown}s   [x] close")));
}

/// Lines for one frame. The news overlay replaces the carousels while it is up.
pub fn frame_lines(view: &DisplayView) -> Vec<Line> {
    let mut out = Vec::new();
    if let Some(item) = view.news.visible_item() {
        news_lines(item, view.news.countdown(), &mut out);
        return out;
    }
    offering_lines(OfferingKind::Course, view, &mut out);
    out.push(Line::Blank);
    offering_lines(OfferingKind::Master, view, &mut out);
    out.push(Line::Blank);
    out.push(Line::Muted(
        "[←/→] courses   [a/d] masters   [q] back".to_string(),
    ));
    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
    t.push('…');
    t
}

fn draw(out: &mut Stdout, view: &DisplayView) -> std::io::Result<()> {
    let (width, height) = terminal::size()
        .map(|(w, h)| (w as usize, h as usize))
        .unwrap_or((80, 24));
    let width = width.max(10);
    out.queue(terminal::Clear(ClearType::All))?;
    for (row, line) in frame_lines(view).iter().enumerate().take(height) {
        if let Line::Code(s) = line {
            if s.chars().count() > width {
                continue;
            }
        }
        out.queue(cursor::MoveTo(0, row as u16))?;
        match line {
            Line::Heading(_) => {
                out.queue(SetForegroundColor(rgb(ACCENT_PURPLE)))?;
                out.queue(SetAttribute(Attribute::Bold))?;
            }
            Line::Title(_) => {
                out.queue(SetForegroundColor(rgb(CAMPUS_BLUE)))?;
                out.queue(SetAttribute(Attribute::Bold))?;
            }
            Line::Muted(_) => {
                out.queue(SetAttribute(Attribute::Dim))?;
            }
            Line::Text(_) | Line::Code(_) | Line::Blank => {}
        }
        out.queue(Print(truncate(line.text(), width)))?;
        out.queue(SetAttribute(Attribute::Reset))?;
        out.queue(ResetColor)?;
    }
    out.flush()
}

/// Restores the terminal however the display exits.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Blocking key reader. Stops when `stop` is set or the receiver is gone.
fn spawn_key_reader(tx: mpsc::UnboundedSender<DisplayKey>, stop: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(KEY_POLL) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if let Some(k) = map_key(&key) {
                            if tx.send(k).is_err() {
                                break;
                            }
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
}

/// Show the display until the user quits.
pub async fn run_display(handle: DisplayHandle) -> Result<(), DomainError> {
    let ui_err = |e: std::io::Error| DomainError::Ui(e.to_string());
    let mut views = handle.subscribe();
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));

    let _screen = ScreenGuard::enter().map_err(ui_err)?;
    spawn_key_reader(key_tx, Arc::clone(&stop));
    let mut out = stdout();
    draw(&mut out, &views.borrow_and_update()).map_err(ui_err)?;

    let result = loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break Err(DomainError::Scheduler("display scheduler stopped".into()));
                }
                let view = views.borrow_and_update().clone();
                if let Err(e) = draw(&mut out, &view) {
                    break Err(ui_err(e));
                }
            }
            key = keys.recv() => {
                let action = match key {
                    None | Some(DisplayKey::Quit) => break Ok(()),
                    Some(DisplayKey::DismissNews) => handle.dismiss_news(),
                    Some(DisplayKey::Step(kind, step)) => handle.step(kind, step),
                };
                if let Err(e) = action {
                    break Err(e);
                }
            }
        }
    };
    stop.store(true, Ordering::Relaxed);
    debug!("display closed");
    result
}
