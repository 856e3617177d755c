//! Debate playback.
//!
//! Reveals a case's script one line per tick, accepts injected arguments
//! while running, and shows the verdict a short delay after the last line.
//! All guards (start while running, inject while not running, empty
//! injection) are silent no-ops.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::case::{ResolvedCase, Verdict};
use crate::config::{PlaybackConfig, RebuttalsConfig};
use crate::participant::{Message, Speaker};
use crate::scheduler::{ManualScheduler, Scheduler, TimerId};

/// Where the live session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Running,
    Completed,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Events emitted during playback.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// A new session began.
    Started { title: String, total: usize },
    /// The next script line was revealed.
    MessageRevealed { message: Message, progress: f64 },
    /// An argument and its canned replies were appended.
    ArgumentInjected { messages: Vec<Message> },
    /// The final script line is out; the verdict follows after a delay.
    Completed,
    /// The verdict is now visible.
    VerdictRevealed { verdict: Verdict },
    /// The session was discarded.
    Reset,
}

/// Callback for playback events.
pub type PlaybackCallback = Box<dyn Fn(PlaybackEvent) + Send + Sync>;

/// State of one playback run. Replaced wholesale on start and reset.
#[derive(Debug, Default)]
struct PlaybackSession {
    phase: PlaybackPhase,
    title: Option<String>,
    script: Vec<Message>,
    cursor: usize,
    transcript: Vec<Message>,
    verdict: Option<Verdict>,
    verdict_visible: bool,
    tick_timer: Option<TimerId>,
    verdict_timer: Option<TimerId>,
}

impl PlaybackSession {
    fn running(case: &ResolvedCase) -> Self {
        Self {
            phase: PlaybackPhase::Running,
            title: Some(case.title.clone()),
            script: case.script.iter().map(|line| Message::parse(line)).collect(),
            verdict: Some(case.verdict.clone()),
            ..Self::default()
        }
    }
}

/// Drives a single playback session on top of a [`Scheduler`].
pub struct PlaybackEngine<S: Scheduler> {
    scheduler: S,
    timing: PlaybackConfig,
    rebuttals: RebuttalsConfig,
    session: PlaybackSession,
    callback: Option<PlaybackCallback>,
}

impl<S: Scheduler> PlaybackEngine<S> {
    /// Create an idle engine with the default cadence and replies.
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            timing: PlaybackConfig::default(),
            rebuttals: RebuttalsConfig::default(),
            session: PlaybackSession::default(),
            callback: None,
        }
    }

    /// Override cadence and canned replies.
    pub fn with_settings(mut self, timing: PlaybackConfig, rebuttals: RebuttalsConfig) -> Self {
        self.timing = timing;
        self.rebuttals = rebuttals;
        self
    }

    /// Set a callback for playback events.
    pub fn with_callback(mut self, callback: PlaybackCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Begin playing `case`. Does nothing while a session is running.
    pub fn start(&mut self, case: &ResolvedCase) {
        if self.phase() == PlaybackPhase::Running {
            debug!(title = %case.title, "start ignored, playback already running");
            return;
        }

        self.disarm();
        self.session = PlaybackSession::running(case);
        self.session.tick_timer = Some(self.scheduler.schedule_repeating(self.timing.tick_interval()));

        info!(title = %case.title, lines = self.session.script.len(), "playback started");
        self.emit_event(PlaybackEvent::Started {
            title: case.title.clone(),
            total: self.session.script.len(),
        });
    }

    /// Append an argument and the two canned replies. Only while running;
    /// blank text is ignored.
    pub fn inject_argument(&mut self, text: &str) {
        if self.phase() != PlaybackPhase::Running {
            debug!(phase = %self.phase(), "injection ignored, playback not running");
            return;
        }
        if text.trim().is_empty() {
            debug!("injection ignored, empty argument");
            return;
        }

        let messages = vec![
            Message::spoken(Speaker::User, text),
            Message::spoken(Speaker::Ai, &self.rebuttals.ai),
            Message::spoken(Speaker::Student, &self.rebuttals.student),
        ];
        self.session.transcript.extend(messages.iter().cloned());
        self.emit_event(PlaybackEvent::ArgumentInjected { messages });
    }

    /// Cancel all timers and return to an empty idle session.
    pub fn reset(&mut self) {
        self.disarm();
        self.session = PlaybackSession::default();
        info!("playback reset");
        self.emit_event(PlaybackEvent::Reset);
    }

    /// Reset, then start `case` from a clean session.
    pub fn run_demo(&mut self, case: &ResolvedCase) {
        self.reset();
        self.start(case);
    }

    /// Deliver a timer firing. Firings for timers that are no longer armed
    /// are dropped.
    pub fn handle_timer(&mut self, id: TimerId) {
        if self.session.tick_timer == Some(id) {
            self.tick();
        } else if self.session.verdict_timer == Some(id) {
            self.session.verdict_timer = None;
            self.session.verdict_visible = true;
            if let Some(verdict) = self.session.verdict.clone() {
                info!(winner = %verdict.winner, "verdict revealed");
                self.emit_event(PlaybackEvent::VerdictRevealed { verdict });
            }
        } else {
            debug!(?id, "ignoring stale timer");
        }
    }

    fn tick(&mut self) {
        if self.phase() != PlaybackPhase::Running {
            return;
        }

        let total = self.session.script.len();
        if self.session.cursor < total {
            let message = self.session.script[self.session.cursor].clone();
            self.session.transcript.push(message.clone());
            self.session.cursor += 1;
            self.emit_event(PlaybackEvent::MessageRevealed {
                message,
                progress: self.progress(),
            });
        }

        if self.session.cursor == total {
            self.complete();
        }
    }

    fn complete(&mut self) {
        if let Some(timer) = self.session.tick_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.session.phase = PlaybackPhase::Completed;
        self.session.verdict_timer = Some(self.scheduler.schedule_once(self.timing.verdict_delay()));
        info!(lines = self.session.transcript.len(), "playback completed");
        self.emit_event(PlaybackEvent::Completed);
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.session.tick_timer.take() {
            self.scheduler.cancel(timer);
        }
        if let Some(timer) = self.session.verdict_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    /// Emit an event if a callback is registered.
    fn emit_event(&self, event: PlaybackEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.session.phase
    }

    /// Index of the next unrevealed script line.
    pub fn cursor(&self) -> usize {
        self.session.cursor
    }

    /// Percentage of the script revealed, 0 for an empty script.
    pub fn progress(&self) -> f64 {
        let total = self.session.script.len();
        if total == 0 {
            0.0
        } else {
            100.0 * self.session.cursor as f64 / total as f64
        }
    }

    /// Messages revealed so far, including injected ones.
    pub fn transcript(&self) -> &[Message] {
        &self.session.transcript
    }

    /// The verdict, once it has been revealed.
    pub fn verdict(&self) -> Option<&Verdict> {
        self.session
            .verdict
            .as_ref()
            .filter(|_| self.session.verdict_visible)
    }

    pub fn is_verdict_visible(&self) -> bool {
        self.session.verdict_visible
    }

    /// Title of the case being played, if a session is live.
    pub fn case_title(&self) -> Option<&str> {
        self.session.title.as_deref()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl PlaybackEngine<ManualScheduler> {
    /// Move the virtual clock forward by `by`, delivering every timer that
    /// comes due on the way, in deadline order.
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some(id) = self.scheduler.pop_due(until) {
            self.handle_timer(id);
        }
        self.scheduler.settle(until);
    }
}
