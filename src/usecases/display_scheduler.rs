//! Public display runtime: two offering carousels and the news interstitial,
//! each on its own timer family.
//!
//! One actor task owns all cursor/visibility state. Commands arrive on one
//! channel, timer firings on another, and every change is published as a
//! `DisplayView` on a watch channel. Timers are `ScopedTimer`s: replacing one
//! aborts the old task first, and each firing carries the generation it was
//! armed under so anything already queued from a cancelled timer is dropped.

use crate::domain::{Carousel, DomainError, NewsItem, NewsModal, Offering, OfferingKind};
use crate::shared::config::{
    AppConfig, DEFAULT_CAROUSEL_INTERVAL_MS, DEFAULT_COUNTDOWN_TICK_MS, DEFAULT_NEWS_CYCLE_MS,
    DEFAULT_NEWS_VISIBLE_MS,
};
use crate::shared::timer::ScopedTimer;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Interval set for the three timer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTimings {
    pub carousel: Duration,
    pub news_cycle: Duration,
    pub news_visible: Duration,
    pub countdown_tick: Duration,
}

impl Default for DisplayTimings {
    fn default() -> Self {
        Self {
            carousel: Duration::from_millis(DEFAULT_CAROUSEL_INTERVAL_MS),
            news_cycle: Duration::from_millis(DEFAULT_NEWS_CYCLE_MS),
            news_visible: Duration::from_millis(DEFAULT_NEWS_VISIBLE_MS),
            countdown_tick: Duration::from_millis(DEFAULT_COUNTDOWN_TICK_MS),
        }
    }
}

impl DisplayTimings {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, DomainError> {
        let timings = Self {
            carousel: Duration::from_millis(cfg.carousel_interval_ms_or_default()),
            news_cycle: Duration::from_millis(cfg.news_cycle_ms_or_default()),
            news_visible: Duration::from_millis(cfg.news_visible_ms_or_default()),
            countdown_tick: Duration::from_millis(cfg.countdown_tick_ms_or_default()),
        };
        timings.validate()?;
        Ok(timings)
    }

    /// All periods non-zero; the interstitial must hide before the next opening.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.carousel.is_zero()
            || self.news_cycle.is_zero()
            || self.news_visible.is_zero()
            || self.countdown_tick.is_zero()
        {
            return Err(DomainError::Scheduler(
                "display intervals must be non-zero".into(),
            ));
        }
        if self.news_visible >= self.news_cycle {
            return Err(DomainError::Scheduler(format!(
                "news visible window ({} ms) must be shorter than the news cycle ({} ms)",
                self.news_visible.as_millis(),
                self.news_cycle.as_millis()
            )));
        }
        Ok(())
    }

    /// Countdown value when the modal opens (10 for 10 s / 1 s).
    pub fn countdown_start(&self) -> u32 {
        let steps = self.news_visible.as_millis() / self.countdown_tick.as_millis().max(1);
        u32::try_from(steps).unwrap_or(u32::MAX)
    }
}

/// Manual carousel navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prev,
    Next,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayView {
    pub courses: Carousel<Offering>,
    pub masters: Carousel<Offering>,
    pub news: NewsModal,
}

impl DisplayView {
    pub fn carousel(&self, kind: OfferingKind) -> &Carousel<Offering> {
        match kind {
            OfferingKind::Course => &self.courses,
            OfferingKind::Master => &self.masters,
        }
    }

    fn carousel_mut(&mut self, kind: OfferingKind) -> &mut Carousel<Offering> {
        match kind {
            OfferingKind::Course => &mut self.courses,
            OfferingKind::Master => &mut self.masters,
        }
    }
}

#[derive(Debug)]
enum DisplayCommand {
    ReplaceOfferings(OfferingKind, Vec<Offering>),
    ReplaceNews(Vec<NewsItem>),
    DismissNews,
    Step(OfferingKind, Step),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum TimerFired {
    Carousel { kind: OfferingKind, generation: u64 },
    NewsRearm { generation: u64 },
    NewsHide { arm: u64 },
    Countdown { arm: u64 },
}

/// Cloneable front for the scheduler task.
#[derive(Clone)]
pub struct DisplayHandle {
    commands: mpsc::UnboundedSender<DisplayCommand>,
    view: watch::Receiver<DisplayView>,
}

impl DisplayHandle {
    pub fn replace_offerings(
        &self,
        kind: OfferingKind,
        items: Vec<Offering>,
    ) -> Result<(), DomainError> {
        self.send(DisplayCommand::ReplaceOfferings(kind, items))
    }

    /// `items` must already be eligible (unexpired) and ordered.
    pub fn replace_news(&self, items: Vec<NewsItem>) -> Result<(), DomainError> {
        self.send(DisplayCommand::ReplaceNews(items))
    }

    /// Close the interstitial now. The cycle and the pending hide stay armed.
    pub fn dismiss_news(&self) -> Result<(), DomainError> {
        self.send(DisplayCommand::DismissNews)
    }

    pub fn step(&self, kind: OfferingKind, step: Step) -> Result<(), DomainError> {
        self.send(DisplayCommand::Step(kind, step))
    }

    pub fn shutdown(&self) -> Result<(), DomainError> {
        self.send(DisplayCommand::Shutdown)
    }

    /// Latest published frame.
    pub fn view(&self) -> DisplayView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayView> {
        self.view.clone()
    }

    fn send(&self, cmd: DisplayCommand) -> Result<(), DomainError> {
        self.commands
            .send(cmd)
            .map_err(|_| DomainError::Scheduler("display scheduler stopped".into()))
    }
}

/// A timer slot plus the generation its firings must carry to be accepted.
#[derive(Default)]
struct TimerSlot {
    generation: u64,
    timer: Option<ScopedTimer>,
}

impl TimerSlot {
    /// Cancel the current timer and open a new generation.
    fn reset(&mut self) -> u64 {
        self.timer = None;
        self.generation += 1;
        self.generation
    }

    /// Cancel for good. Later firings of any generation are stale.
    fn disarm(&mut self) -> Option<&'static str> {
        self.generation += 1;
        self.timer.take().and_then(cancel_live)
    }
}

/// Cancel `timer`, returning its label if it was still running.
fn cancel_live(timer: ScopedTimer) -> Option<&'static str> {
    let live = (!timer.is_finished()).then_some(timer.label());
    timer.cancel();
    live
}

/// The actor. Create with `new`, then drive with `run` on the runtime.
pub struct DisplayScheduler {
    timings: DisplayTimings,
    commands: mpsc::UnboundedReceiver<DisplayCommand>,
    timer_tx: mpsc::UnboundedSender<TimerFired>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    view_tx: watch::Sender<DisplayView>,
    state: DisplayView,
    courses_timer: TimerSlot,
    masters_timer: TimerSlot,
    news_cycle: TimerSlot,
    /// Hide and countdown timers of the current opening; generation counts openings.
    news_hide: TimerSlot,
    countdown: Option<ScopedTimer>,
}

impl DisplayScheduler {
    pub fn new(timings: DisplayTimings) -> Result<(Self, DisplayHandle), DomainError> {
        timings.validate()?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let state = DisplayView {
            news: NewsModal::new(timings.countdown_start()),
            ..Default::default()
        };
        let (view_tx, view_rx) = watch::channel(state.clone());
        let scheduler = Self {
            timings,
            commands: cmd_rx,
            timer_tx,
            timer_rx,
            view_tx,
            state,
            courses_timer: TimerSlot::default(),
            masters_timer: TimerSlot::default(),
            news_cycle: TimerSlot::default(),
            news_hide: TimerSlot::default(),
            countdown: None,
        };
        let handle = DisplayHandle {
            commands: cmd_tx,
            view: view_rx,
        };
        Ok((scheduler, handle))
    }

    /// Run until `shutdown` or every handle is dropped. All timers are
    /// disarmed on exit.
    pub async fn run(mut self) {
        info!(
            carousel_ms = self.timings.carousel.as_millis() as u64,
            news_cycle_ms = self.timings.news_cycle.as_millis() as u64,
            news_visible_ms = self.timings.news_visible.as_millis() as u64,
            "display scheduler started"
        );
        self.arm_carousel(OfferingKind::Course);
        self.arm_carousel(OfferingKind::Master);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(DisplayCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(fired) = self.timer_rx.recv() => self.handle_timer(fired),
            }
            self.view_tx.send_replace(self.state.clone());
        }

        let disarmed = self.disarm_all();
        info!(?disarmed, "display scheduler stopped");
    }

    fn handle_command(&mut self, cmd: DisplayCommand) {
        match cmd {
            DisplayCommand::ReplaceOfferings(kind, items) => {
                let count = items.len();
                let resized = self.state.carousel_mut(kind).replace(items);
                info!(kind = %kind, count, resized, "offering snapshot replaced");
                if resized {
                    self.arm_carousel(kind);
                }
            }
            DisplayCommand::ReplaceNews(items) => {
                let count = items.len();
                let resized = self.state.news.replace(items);
                info!(count, resized, "news snapshot replaced");
                if resized {
                    self.restart_news();
                }
            }
            DisplayCommand::DismissNews => {
                if self.state.news.is_visible() {
                    debug!(cursor = self.state.news.cursor(), "news dismissed");
                }
                self.state.news.dismiss();
                self.countdown = None;
            }
            DisplayCommand::Step(kind, step) => {
                let carousel = self.state.carousel_mut(kind);
                match step {
                    Step::Prev => carousel.prev(),
                    Step::Next => carousel.next(),
                }
            }
            DisplayCommand::Shutdown => {}
        }
    }

    fn handle_timer(&mut self, fired: TimerFired) {
        match fired {
            TimerFired::Carousel { kind, generation } => {
                if generation != self.carousel_slot(kind).generation {
                    return;
                }
                let carousel = self.state.carousel_mut(kind);
                carousel.advance();
                debug!(kind = %kind, cursor = carousel.cursor(), "carousel tick");
            }
            TimerFired::NewsRearm { generation } => {
                if generation == self.news_cycle.generation {
                    self.open_news();
                }
            }
            TimerFired::NewsHide { arm } => {
                if arm != self.news_hide.generation {
                    return;
                }
                self.state.news.hide_and_advance();
                self.news_hide.timer = None;
                self.countdown = None;
                debug!(cursor = self.state.news.cursor(), "news hidden");
            }
            TimerFired::Countdown { arm } => {
                if arm != self.news_hide.generation || !self.state.news.is_visible() {
                    return;
                }
                self.state.news.tick_countdown();
                if self.state.news.countdown() == 0 {
                    self.countdown = None;
                }
            }
        }
    }

    fn carousel_slot(&mut self, kind: OfferingKind) -> &mut TimerSlot {
        match kind {
            OfferingKind::Course => &mut self.courses_timer,
            OfferingKind::Master => &mut self.masters_timer,
        }
    }

    /// (Re)arm a carousel family. Runs even for 0/1 items; the tick is then a no-op.
    fn arm_carousel(&mut self, kind: OfferingKind) {
        let period = self.timings.carousel;
        let tx = self.timer_tx.clone();
        let slot = self.carousel_slot(kind);
        let generation = slot.reset();
        let label = match kind {
            OfferingKind::Course => "courses-carousel",
            OfferingKind::Master => "masters-carousel",
        };
        slot.timer = Some(ScopedTimer::repeating(
            label,
            period,
            tx,
            TimerFired::Carousel { kind, generation },
        ));
    }

    /// Cancel every news timer of the previous snapshot, then start a new
    /// cycle that opens immediately. Empty snapshots leave everything inert.
    fn restart_news(&mut self) {
        self.countdown = None;
        self.news_hide.reset();
        let generation = self.news_cycle.reset();
        if self.state.news.items().is_empty() {
            return;
        }
        self.news_cycle.timer = Some(ScopedTimer::repeating(
            "news-cycle",
            self.timings.news_cycle,
            self.timer_tx.clone(),
            TimerFired::NewsRearm { generation },
        ));
        self.open_news();
    }

    /// Show the modal and schedule its hide and countdown.
    fn open_news(&mut self) {
        if !self.state.news.arm() {
            return;
        }
        self.countdown = None;
        let arm = self.news_hide.reset();
        self.news_hide.timer = Some(ScopedTimer::one_shot(
            "news-hide",
            self.timings.news_visible,
            self.timer_tx.clone(),
            TimerFired::NewsHide { arm },
        ));
        self.countdown = Some(ScopedTimer::repeating(
            "news-countdown",
            self.timings.countdown_tick,
            self.timer_tx.clone(),
            TimerFired::Countdown { arm },
        ));
        debug!(cursor = self.state.news.cursor(), "news shown");
    }

    /// Cancel every timer. Returns the labels of those that were still running.
    fn disarm_all(&mut self) -> Vec<&'static str> {
        let countdown = self.countdown.take().and_then(cancel_live);
        [
            countdown,
            self.news_hide.disarm(),
            self.news_cycle.disarm(),
            self.courses_timer.disarm(),
            self.masters_timer.disarm(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use tokio::time::Instant;

    fn offering(id: &str) -> Offering {
        Offering {
            id: id.to_string(),
            title: format!("Offering {id}"),
            description: "desc".to_string(),
            modality: "Online".to_string(),
            duration: "8 weeks".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            form_url: format!("https://forms.example.edu/{id}"),
            qr_image: String::new(),
            created_at: Utc::now(),
        }
    }

    fn news(id: &str) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: format!("News {id}"),
            content: "body".to_string(),
            image: None,
            publish_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
            created_at: Utc::now(),
        }
    }

    fn start() -> (DisplayHandle, Instant) {
        let (scheduler, handle) = DisplayScheduler::new(DisplayTimings::default()).unwrap();
        let t0 = Instant::now();
        tokio::spawn(scheduler.run());
        (handle, t0)
    }

    async fn at(t0: Instant, ms: u64) {
        tokio::time::sleep_until(t0 + Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_every_running_timer() {
        let (mut scheduler, _handle) = DisplayScheduler::new(DisplayTimings::default()).unwrap();
        scheduler.arm_carousel(OfferingKind::Course);
        scheduler.arm_carousel(OfferingKind::Master);
        scheduler.handle_command(DisplayCommand::ReplaceNews(vec![news("n1")]));
        assert!(scheduler.state.news.is_visible());

        let mut disarmed = scheduler.disarm_all();
        disarmed.sort_unstable();
        assert_eq!(
            disarmed,
            vec![
                "courses-carousel",
                "masters-carousel",
                "news-countdown",
                "news-cycle",
                "news-hide"
            ]
        );
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(scheduler.timer_rx.try_recv().is_err());
        assert!(scheduler.disarm_all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_carousel_advances_every_interval() {
        let (handle, t0) = start();
        handle
            .replace_offerings(OfferingKind::Course, vec![offering("a"), offering("b"), offering("c")])
            .unwrap();
        at(t0, 7_999).await;
        assert_eq!(handle.view().courses.cursor(), 0);
        at(t0, 8_001).await;
        assert_eq!(handle.view().courses.cursor(), 1);
        at(t0, 16_001).await;
        assert_eq!(handle.view().courses.cursor(), 2);
        at(t0, 24_001).await;
        assert_eq!(handle.view().courses.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_item_carousel_stays_put() {
        let (handle, t0) = start();
        handle
            .replace_offerings(OfferingKind::Master, vec![offering("m")])
            .unwrap();
        at(t0, 40_001).await;
        let view = handle.view();
        assert_eq!(view.masters.cursor(), 0);
        assert_eq!(view.masters.current().unwrap().id, "m");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_displayed_course_wraps_cursor() {
        let (handle, t0) = start();
        handle
            .replace_offerings(OfferingKind::Course, vec![offering("a"), offering("b"), offering("c")])
            .unwrap();
        at(t0, 16_001).await;
        assert_eq!(handle.view().courses.cursor(), 2);
        handle
            .replace_offerings(OfferingKind::Course, vec![offering("a"), offering("b")])
            .unwrap();
        at(t0, 16_002).await;
        let view = handle.view();
        assert_eq!(view.courses.cursor(), 0);
        assert_eq!(view.courses.current().unwrap().id, "a");
        // Timer was re-armed from the replacement (16_001), not from t0.
        at(t0, 24_000).await;
        assert_eq!(handle.view().courses.cursor(), 0);
        at(t0, 24_003).await;
        assert_eq!(handle.view().courses.cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_news_visible_ten_of_every_fifteen_seconds() {
        let (handle, t0) = start();
        handle
            .replace_news(vec![news("a"), news("b"), news("c")])
            .unwrap();
        for cycle in 0..4u64 {
            let base = cycle * 15_000;
            at(t0, base + 1).await;
            let view = handle.view();
            assert!(view.news.is_visible(), "cycle {cycle} opening");
            assert_eq!(view.news.cursor() as u64, cycle % 3);
            at(t0, base + 9_999).await;
            assert!(handle.view().news.is_visible(), "cycle {cycle} end of window");
            at(t0, base + 10_001).await;
            let view = handle.view();
            assert!(!view.news.is_visible(), "cycle {cycle} hidden");
            assert_eq!(view.news.cursor() as u64, (cycle + 1) % 3);
            at(t0, base + 14_999).await;
            assert!(!handle.view().news.is_visible());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_while_visible() {
        let (handle, t0) = start();
        handle.replace_news(vec![news("a")]).unwrap();
        at(t0, 1).await;
        assert_eq!(handle.view().news.countdown(), 10);
        at(t0, 3_500).await;
        assert_eq!(handle.view().news.countdown(), 7);
        at(t0, 9_500).await;
        assert_eq!(handle.view().news.countdown(), 1);
        at(t0, 15_001).await;
        assert_eq!(handle.view().news.countdown(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_dismiss_keeps_cursor_until_scheduled_hide() {
        let (handle, t0) = start();
        handle.replace_news(vec![news("a"), news("b")]).unwrap();
        at(t0, 2_000).await;
        handle.dismiss_news().unwrap();
        at(t0, 2_001).await;
        let view = handle.view();
        assert!(!view.news.is_visible());
        assert_eq!(view.news.cursor(), 0);
        at(t0, 9_999).await;
        assert_eq!(handle.view().news.cursor(), 0);
        at(t0, 10_001).await;
        let view = handle.view();
        assert!(!view.news.is_visible());
        assert_eq!(view.news.cursor(), 1);
        at(t0, 15_001).await;
        let view = handle.view();
        assert!(view.news.is_visible());
        assert_eq!(view.news.visible_item().unwrap().id, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_news_never_shows() {
        let (handle, t0) = start();
        handle.replace_news(Vec::new()).unwrap();
        at(t0, 45_001).await;
        assert!(!handle.view().news.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_news_emptied_while_visible_goes_inert() {
        let (handle, t0) = start();
        handle.replace_news(vec![news("a"), news("b")]).unwrap();
        at(t0, 3_000).await;
        assert!(handle.view().news.is_visible());
        handle.replace_news(Vec::new()).unwrap();
        at(t0, 3_001).await;
        assert!(!handle.view().news.is_visible());
        for ms in [10_001, 15_001, 30_001] {
            at(t0, ms).await;
            let view = handle.view();
            assert!(!view.news.is_visible());
            assert!(view.news.visible_item().is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_length_news_refresh_keeps_phase() {
        let (handle, t0) = start();
        handle.replace_news(vec![news("a"), news("b")]).unwrap();
        at(t0, 12_000).await;
        handle.replace_news(vec![news("c"), news("d")]).unwrap();
        at(t0, 12_001).await;
        assert!(!handle.view().news.is_visible());
        at(t0, 15_001).await;
        assert_eq!(handle.view().news.visible_item().unwrap().id, "d");
    }

    #[tokio::test(start_paused = true)]
    async fn test_carousels_advance_while_modal_open() {
        let (handle, t0) = start();
        handle
            .replace_offerings(OfferingKind::Course, vec![offering("a"), offering("b")])
            .unwrap();
        handle
            .replace_offerings(OfferingKind::Master, vec![offering("x"), offering("y"), offering("z")])
            .unwrap();
        handle.replace_news(vec![news("n")]).unwrap();
        at(t0, 8_001).await;
        let view = handle.view();
        assert!(view.news.is_visible());
        assert_eq!(view.courses.cursor(), 1);
        assert_eq!(view.masters.cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_steps_wrap() {
        let (handle, t0) = start();
        handle
            .replace_offerings(OfferingKind::Course, vec![offering("a"), offering("b"), offering("c")])
            .unwrap();
        handle.step(OfferingKind::Course, Step::Prev).unwrap();
        at(t0, 1).await;
        assert_eq!(handle.view().courses.cursor(), 2);
        handle.step(OfferingKind::Course, Step::Next).unwrap();
        at(t0, 2).await;
        assert_eq!(handle.view().courses.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_scheduler() {
        let (handle, t0) = start();
        handle.shutdown().unwrap();
        at(t0, 1).await;
        assert!(matches!(
            handle.dismiss_news(),
            Err(DomainError::Scheduler(_))
        ));
    }

    #[test]
    fn test_timings_validation() {
        assert!(DisplayTimings::default().validate().is_ok());
        assert_eq!(DisplayTimings::default().countdown_start(), 10);
        let overlapping = DisplayTimings {
            news_visible: Duration::from_secs(15),
            ..Default::default()
        };
        assert!(overlapping.validate().is_err());
        let zero = DisplayTimings {
            carousel: Duration::ZERO,
            ..Default::default()
        };
        assert!(DisplayScheduler::new(zero).is_err());
    }
}
