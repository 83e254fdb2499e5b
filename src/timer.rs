//! Countdown state machine driven by an absolute deadline.

use crate::{
    clock::Clock,
    effects::{Cue, CuePlayer, Notifier, Permission},
    error::{Error, Result},
    history::{HistoryLog, Session},
    store::{self, Storage},
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const MAX_MINUTES: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Focus,
    Break,
}

impl Mode {
    pub fn other(self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "FOCUS",
            Self::Break => "RELAX",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::Break => "Break",
        }
    }

    pub fn quote(self) -> &'static str {
        match self {
            Self::Focus => "\"I only show you the best of me.\"",
            Self::Break => "\"Take a breath. You earned this.\"",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Reads each setting independently; anything absent, malformed or out of
    /// range keeps its default.
    pub fn load(storage: &dyn Storage) -> Self {
        let mut settings = Self::default();
        let minutes = |key: &str| {
            store::load::<u32>(storage, key).filter(|m| {
                let ok = *m <= MAX_MINUTES;
                if !ok {
                    tracing::warn!(key, minutes = *m, "stored duration out of range, using default");
                }
                ok
            })
        };
        if let Some(m) = minutes(store::FOCUS_DURATION) {
            settings.focus_minutes = m;
        }
        if let Some(m) = minutes(store::BREAK_DURATION) {
            settings.break_minutes = m;
        }
        if let Some(on) = store::load::<bool>(storage, store::SOUND_ENABLED) {
            settings.sound_enabled = on;
        }
        settings
    }

    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.focus_minutes,
            Mode::Break => self.break_minutes,
        }
    }
}

/// Parses a duration like `25`, `25m`, `1h` or `1h30m` into whole minutes.
pub fn parse_minutes(s: &str) -> Result<u32> {
    let invalid = || Error::InvalidDuration(s.to_owned());
    let input = s.trim().to_lowercase();
    let mut total_secs: u64 = 0;
    let mut num = String::new();

    for c in input.chars() {
        let unit = match c {
            '0'..='9' => {
                num.push(c);
                continue;
            }
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let n: u64 = num.parse().map_err(|_| invalid())?;
        total_secs = total_secs.saturating_add(n.saturating_mul(unit));
        num.clear();
    }
    if !num.is_empty() {
        let n: u64 = num.parse().map_err(|_| invalid())?;
        total_secs = total_secs.saturating_add(n.saturating_mul(60));
    }

    if total_secs % 60 != 0 {
        return Err(invalid());
    }
    let minutes = u32::try_from(total_secs / 60).map_err(|_| invalid())?;
    if (1..=MAX_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(invalid())
    }
}

pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed fraction of a countdown, in `0.0..=1.0`. A zero-length countdown
/// has made no progress.
pub fn progress(total_seconds: u32, time_left: u32) -> f64 {
    if total_seconds == 0 {
        return 0.0;
    }
    let elapsed = total_seconds as f64 - time_left as f64;
    (elapsed / total_seconds as f64).clamp(0.0, 1.0)
}

/// Whole seconds from `now` until `deadline`, rounded up and never negative.
fn seconds_until(deadline: DateTime<Local>, now: DateTime<Local>) -> u32 {
    let ms = (deadline - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        u32::try_from((ms + 999) / 1000).unwrap_or(u32::MAX)
    }
}

pub struct Timer {
    mode: Mode,
    time_left: u32,
    is_running: bool,
    deadline: Option<DateTime<Local>>,
    settings: Settings,
    history: HistoryLog,
    storage: Rc<dyn Storage>,
    clock: Rc<dyn Clock>,
    cues: Box<dyn CuePlayer>,
    notifier: Box<dyn Notifier>,
}

impl Timer {
    pub fn new(
        storage: Rc<dyn Storage>,
        clock: Rc<dyn Clock>,
        cues: Box<dyn CuePlayer>,
        mut notifier: Box<dyn Notifier>,
    ) -> Self {
        let settings = Settings::load(storage.as_ref());
        let history = HistoryLog::load(storage.clone());

        if notifier.permission() == Permission::Default {
            let granted = notifier.request_permission();
            tracing::debug!(?granted, "notification permission requested");
        }

        Self {
            mode: Mode::Focus,
            time_left: settings.focus_minutes.saturating_mul(60),
            is_running: false,
            deadline: None,
            settings,
            history,
            storage,
            clock,
            cues,
            notifier,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn deadline(&self) -> Option<DateTime<Local>> {
        self.deadline
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn duration_for(&self, mode: Mode) -> u32 {
        self.settings.minutes_for(mode)
    }

    pub fn total_seconds(&self) -> u32 {
        self.duration_for(self.mode).saturating_mul(60)
    }

    pub fn progress(&self) -> f64 {
        progress(self.total_seconds(), self.time_left)
    }

    pub fn display(&self) -> String {
        format_time(self.time_left)
    }

    /// Starts the countdown toward a fresh deadline. A countdown already at
    /// zero completes instead of running.
    pub fn start(&mut self) -> Option<Session> {
        if self.is_running {
            return None;
        }
        if self.time_left == 0 {
            return Some(self.complete());
        }
        let deadline = self.clock.now() + chrono::Duration::seconds(i64::from(self.time_left));
        self.deadline = Some(deadline);
        self.is_running = true;
        tracing::info!(mode = ?self.mode, time_left = self.time_left, "timer started");
        None
    }

    pub fn pause(&mut self) -> Option<Session> {
        if !self.is_running {
            return None;
        }
        if let Some(session) = self.sync() {
            return Some(session);
        }
        self.is_running = false;
        self.deadline = None;
        tracing::info!(mode = ?self.mode, time_left = self.time_left, "timer paused");
        None
    }

    pub fn toggle(&mut self) -> Option<Session> {
        if self.is_running { self.pause() } else { self.start() }
    }

    pub fn reset(&mut self) {
        self.is_running = false;
        self.deadline = None;
        self.time_left = self.total_seconds();
        tracing::info!(mode = ?self.mode, "timer reset");
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.is_running = false;
        self.deadline = None;
        self.time_left = self.total_seconds();
        tracing::info!(?mode, "mode switched");
    }

    /// Recomputes the remaining time from the deadline. Returns the recorded
    /// session if this tick crossed zero.
    pub fn tick(&mut self) -> Option<Session> {
        self.sync()
    }

    pub fn on_visibility_restored(&mut self) -> Option<Session> {
        self.sync()
    }

    fn sync(&mut self) -> Option<Session> {
        let deadline = match (self.is_running, self.deadline) {
            (true, Some(deadline)) => deadline,
            _ => return None,
        };
        self.time_left = seconds_until(deadline, self.clock.now());
        if self.time_left == 0 {
            Some(self.complete())
        } else {
            None
        }
    }

    fn complete(&mut self) -> Session {
        let finished = self.mode;
        let minutes = self.duration_for(finished);

        self.is_running = false;
        self.deadline = None;

        if self.settings.sound_enabled {
            self.cues.play(Cue::Chime);
        }

        let (title, body) = match finished {
            Mode::Focus => ("Focus complete", "Take a breath. You earned this."),
            Mode::Break => ("Break complete", "Back to focus."),
        };
        self.notifier.notify(title, body);

        let session = Session::new(finished, minutes, self.clock.now());
        self.history.append(session.clone());
        tracing::info!(mode = ?finished, duration = minutes, "session completed");

        self.mode = finished.other();
        self.time_left = self.total_seconds();
        session
    }

    /// Applies and persists new durations. An idle timer is resized to the
    /// new duration immediately; a running countdown keeps its length until
    /// the next reset, switch or completion.
    pub fn set_durations(&mut self, focus_minutes: u32, break_minutes: u32) -> Result<()> {
        for m in [focus_minutes, break_minutes] {
            if !(1..=MAX_MINUTES).contains(&m) {
                return Err(Error::InvalidDuration(m.to_string()));
            }
        }

        self.settings.focus_minutes = focus_minutes;
        self.settings.break_minutes = break_minutes;
        store::persist(self.storage.as_ref(), store::FOCUS_DURATION, &focus_minutes);
        store::persist(self.storage.as_ref(), store::BREAK_DURATION, &break_minutes);
        tracing::info!(focus_minutes, break_minutes, "durations updated");

        if !self.is_running {
            self.time_left = self.total_seconds();
        }
        Ok(())
    }

    pub fn set_focus_minutes(&mut self, minutes: u32) -> Result<()> {
        self.set_durations(minutes, self.settings.break_minutes)
    }

    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<()> {
        self.set_durations(self.settings.focus_minutes, minutes)
    }

    /// Command-line overrides; not persisted.
    pub fn override_durations(&mut self, focus_minutes: Option<u32>, break_minutes: Option<u32>) {
        if let Some(m) = focus_minutes {
            self.settings.focus_minutes = m;
        }
        if let Some(m) = break_minutes {
            self.settings.break_minutes = m;
        }
        if !self.is_running {
            self.time_left = self.total_seconds();
        }
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        store::persist(self.storage.as_ref(), store::SOUND_ENABLED, &enabled);
    }

    /// Not persisted.
    pub fn mute(&mut self) {
        self.settings.sound_enabled = false;
    }

    pub fn click(&self) {
        if self.settings.sound_enabled {
            self.cues.play(Cue::Click);
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        effects::{RecordingCues, RecordingNotifier},
        store::MemoryStorage,
    };

    struct Harness {
        timer: Timer,
        clock: ManualClock,
        cues: RecordingCues,
        storage: Rc<MemoryStorage>,
    }

    fn harness_with(storage: Rc<MemoryStorage>) -> Harness {
        let clock = ManualClock::default();
        let cues = RecordingCues::default();
        let timer = Timer::new(
            storage.clone(),
            Rc::new(clock.clone()),
            Box::new(cues.clone()),
            Box::new(RecordingNotifier::new(true)),
        );
        Harness { timer, clock, cues, storage }
    }

    fn harness() -> Harness {
        harness_with(Rc::new(MemoryStorage::new()))
    }

    #[test]
    fn defaults_to_a_paused_focus_countdown() {
        let h = harness();
        assert_eq!(h.timer.mode(), Mode::Focus);
        assert_eq!(h.timer.time_left(), 25 * 60);
        assert!(!h.timer.is_running());
        assert_eq!(h.timer.display(), "25:00");
    }

    #[test]
    fn malformed_settings_keep_defaults() {
        let storage = Rc::new(MemoryStorage::new());
        storage.write(store::FOCUS_DURATION, "NaN").unwrap();
        storage.write(store::BREAK_DURATION, "10").unwrap();
        let h = harness_with(storage);
        assert_eq!(h.timer.settings().focus_minutes, 25);
        assert_eq!(h.timer.settings().break_minutes, 10);
    }

    #[test]
    fn out_of_range_settings_keep_defaults() {
        let storage = Rc::new(MemoryStorage::new());
        storage.write(store::FOCUS_DURATION, "100000000").unwrap();
        storage.write(store::BREAK_DURATION, &(MAX_MINUTES + 1).to_string()).unwrap();
        let h = harness_with(storage);
        assert_eq!(h.timer.settings().focus_minutes, 25);
        assert_eq!(h.timer.settings().break_minutes, 5);
        assert_eq!(h.timer.time_left(), 1500);
        assert_eq!(h.timer.total_seconds(), 1500);
    }

    #[test]
    fn huge_override_saturates_instead_of_overflowing() {
        let mut h = harness();
        h.timer.override_durations(Some(u32::MAX), None);
        assert_eq!(h.timer.total_seconds(), u32::MAX);
        assert_eq!(h.timer.time_left(), u32::MAX);
    }

    #[test]
    fn pause_at_deadline_completes_instead_of_stopping_at_zero() {
        let mut h = harness();
        h.timer.start();
        h.clock.advance_secs(25 * 60);
        let session = h.timer.pause().expect("completion on pause");
        assert_eq!(session.mode, Mode::Focus);
        assert_eq!(h.timer.mode(), Mode::Break);
        assert_eq!(h.timer.time_left(), 300);
        assert!(!h.timer.is_running());
        assert_eq!(h.timer.history().len(), 1);
        assert!(h.timer.pause().is_none());
    }

    #[test]
    fn reset_restores_full_duration_in_either_mode() {
        let mut h = harness();
        h.timer.set_durations(40, 8).unwrap();
        for mode in [Mode::Focus, Mode::Break] {
            h.timer.switch_mode(mode);
            h.timer.start();
            h.clock.advance_secs(90);
            h.timer.tick();
            h.timer.reset();
            assert_eq!(h.timer.time_left(), h.timer.duration_for(mode) * 60);
            assert!(!h.timer.is_running());
        }
    }

    #[test]
    fn tick_rounds_partial_seconds_up() {
        let mut h = harness();
        h.timer.start();
        h.clock.advance_millis(100);
        h.timer.tick();
        assert_eq!(h.timer.time_left(), 1500);
        h.clock.advance_millis(900);
        h.timer.tick();
        assert_eq!(h.timer.time_left(), 1499);
    }

    #[test]
    fn late_ticks_do_not_drift() {
        let mut h = harness();
        h.timer.start();
        // A single tick after a long stall lands exactly on the deadline math.
        h.clock.advance_millis(61_250);
        h.timer.tick();
        assert_eq!(h.timer.time_left(), 1500 - 61);
    }

    #[test]
    fn pause_keeps_remaining_seconds_and_drops_deadline() {
        let mut h = harness();
        h.timer.start();
        h.clock.advance_secs(10);
        assert!(h.timer.pause().is_none());
        assert_eq!(h.timer.time_left(), 1490);
        assert!(h.timer.deadline().is_none());

        h.clock.advance_secs(100);
        h.timer.tick();
        assert_eq!(h.timer.time_left(), 1490);

        h.timer.start();
        h.clock.advance_secs(5);
        h.timer.tick();
        assert_eq!(h.timer.time_left(), 1485);
    }

    #[test]
    fn completion_fires_once_and_flips_mode() {
        let mut h = harness();
        h.timer.start();
        h.clock.advance_secs(25 * 60);
        let session = h.timer.tick().expect("completion");
        assert_eq!(session.mode, Mode::Focus);
        assert_eq!(session.duration, 25);

        for _ in 0..5 {
            h.clock.advance_millis(100);
            assert!(h.timer.tick().is_none());
        }
        assert_eq!(h.timer.history().len(), 1);
        assert_eq!(h.timer.mode(), Mode::Break);
        assert_eq!(h.timer.time_left(), 5 * 60);
        assert!(!h.timer.is_running());
        assert_eq!(h.cues.count(Cue::Chime), 1);
    }

    #[test]
    fn starting_at_zero_completes_immediately() {
        let storage = Rc::new(MemoryStorage::new());
        storage.write(store::FOCUS_DURATION, "0").unwrap();
        let mut h = harness_with(storage);
        assert_eq!(h.timer.time_left(), 0);
        assert_eq!(h.timer.progress(), 0.0);

        let session = h.timer.start().expect("immediate completion");
        assert_eq!(session.duration, 0);
        assert!(!h.timer.is_running());
        assert_eq!(h.timer.mode(), Mode::Break);
        assert_eq!(h.timer.time_left(), 300);
    }

    #[test]
    fn muted_timer_plays_no_cues() {
        let mut h = harness();
        h.timer.set_sound_enabled(false);
        h.timer.click();
        h.timer.start();
        h.clock.advance_secs(1500);
        h.timer.tick();
        assert!(h.cues.played().is_empty());
        assert_eq!(store::load::<bool>(h.storage.as_ref(), store::SOUND_ENABLED), Some(false));
    }

    #[test]
    fn invalid_durations_are_rejected() {
        let mut h = harness();
        assert!(h.timer.set_focus_minutes(0).is_err());
        assert!(h.timer.set_break_minutes(MAX_MINUTES + 1).is_err());
        assert_eq!(h.timer.settings().focus_minutes, 25);
    }

    #[test]
    fn cli_overrides_are_not_persisted() {
        let mut h = harness();
        h.timer.override_durations(Some(50), None);
        assert_eq!(h.timer.time_left(), 3000);
        assert_eq!(store::load::<u32>(h.storage.as_ref(), store::FOCUS_DURATION), None);
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress(1500, 1500), 0.0);
        assert_eq!(progress(1500, 0), 1.0);
        assert_eq!(progress(0, 0), 0.0);
        assert_eq!(progress(600, 1200), 0.0);
        assert!((progress(100, 25) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(240 * 60), "240:00");
    }

    #[test]
    fn parses_minute_durations() {
        assert_eq!(parse_minutes("25").unwrap(), 25);
        assert_eq!(parse_minutes("25m").unwrap(), 25);
        assert_eq!(parse_minutes("1h30m").unwrap(), 90);
        assert_eq!(parse_minutes(" 2H ").unwrap(), 120);
        assert_eq!(parse_minutes("120s").unwrap(), 2);
        assert!(parse_minutes("90s").is_err());
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("5h").is_err());
        assert!(parse_minutes("abc").is_err());
        assert!(parse_minutes("").is_err());
    }
}
