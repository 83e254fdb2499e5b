//! Read-only aggregation over the history log. Nothing here is cached;
//! callers recompute from the current sessions whenever they render.

use crate::{history::Session, timer::Mode};
use chrono::{Duration, NaiveDate, Timelike};
use std::collections::HashSet;

const FLOWING_SESSIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vibe {
    Building,
    Flowing,
}

impl Vibe {
    pub fn label(self) -> &'static str {
        match self {
            Self::Building => "Building",
            Self::Flowing => "Flowing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakTime {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PeakTime {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    pub focus_minutes: u64,
    pub focus_sessions: usize,
    pub vibe: Vibe,
    pub peak_time: Option<PeakTime>,
    pub streak_days: u32,
    pub message: &'static str,
}

impl Insights {
    /// Total focus as `Hh Mm`.
    pub fn focus_total(&self) -> String {
        format!("{}h {}m", self.focus_minutes / 60, self.focus_minutes % 60)
    }
}

pub fn insights(sessions: &[Session], today: NaiveDate) -> Insights {
    let focus: Vec<&Session> = sessions.iter().filter(|s| s.mode == Mode::Focus).collect();
    let focus_minutes = focus.iter().map(|s| u64::from(s.duration)).sum();
    let focus_sessions = focus.len();

    Insights {
        focus_minutes,
        focus_sessions,
        vibe: if focus_sessions > FLOWING_SESSIONS { Vibe::Flowing } else { Vibe::Building },
        peak_time: peak_hour(&focus).map(PeakTime::from_hour),
        streak_days: streak(&focus, today),
        message: message(focus_sessions, focus_minutes),
    }
}

fn message(sessions: usize, minutes: u64) -> &'static str {
    if sessions == 0 {
        "The journey of a thousand miles begins with a single step."
    } else if minutes > 120 {
        "You're in the zone. Pure energy."
    } else if minutes > 60 {
        "Solid progress. Keep the rhythm."
    } else {
        "Building momentum."
    }
}

/// Busiest completion hour; ties go to the earliest hour.
fn peak_hour(focus: &[&Session]) -> Option<u32> {
    let mut buckets = [0usize; 24];
    for at in focus.iter().filter_map(|s| s.completed_at) {
        buckets[at.hour() as usize] += 1;
    }
    let (hour, &count) = buckets
        .iter()
        .enumerate()
        .max_by(|(ha, a), (hb, b)| a.cmp(b).then(hb.cmp(ha)))?;
    (count > 0).then_some(hour as u32)
}

/// Consecutive days with a focus completion, counting back from today, or
/// from yesterday when today has none yet.
fn streak(focus: &[&Session], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = focus
        .iter()
        .filter_map(|s| s.completed_at)
        .map(|at| at.date_naive())
        .collect();

    let mut day = if days.contains(&today) { today } else { today - Duration::days(1) };
    let mut count = 0;
    while days.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn session(mode: Mode, duration: u32, day: u32, hour: u32) -> Session {
        let at = Local.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap();
        Session::new(mode, duration, at)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn empty_history() {
        let i = insights(&[], today());
        assert_eq!(i.focus_minutes, 0);
        assert_eq!(i.focus_sessions, 0);
        assert_eq!(i.vibe, Vibe::Building);
        assert_eq!(i.peak_time, None);
        assert_eq!(i.streak_days, 0);
        assert_eq!(i.message, "The journey of a thousand miles begins with a single step.");
    }

    #[test]
    fn only_focus_sessions_count() {
        let sessions = vec![
            session(Mode::Focus, 25, 15, 9),
            session(Mode::Break, 5, 15, 9),
            session(Mode::Focus, 50, 15, 10),
        ];
        let i = insights(&sessions, today());
        assert_eq!(i.focus_minutes, 75);
        assert_eq!(i.focus_sessions, 2);
        assert_eq!(i.focus_total(), "1h 15m");
        assert_eq!(i.message, "Solid progress. Keep the rhythm.");
    }

    #[test]
    fn huge_durations_do_not_overflow_the_total() {
        let sessions = vec![session(Mode::Focus, u32::MAX, 15, 9), session(Mode::Focus, u32::MAX, 15, 10)];
        let i = insights(&sessions, today());
        assert_eq!(i.focus_minutes, 2 * u64::from(u32::MAX));
        assert_eq!(i.message, "You're in the zone. Pure energy.");
    }

    #[test]
    fn six_sessions_is_flowing() {
        let sessions: Vec<_> = (0..6).map(|h| session(Mode::Focus, 25, 15, 8 + h)).collect();
        let i = insights(&sessions, today());
        assert_eq!(i.vibe, Vibe::Flowing);
        assert_eq!(i.message, "You're in the zone. Pure energy.");
    }

    #[test]
    fn peak_time_uses_busiest_hour() {
        let sessions = vec![
            session(Mode::Focus, 25, 14, 9),
            session(Mode::Focus, 25, 14, 19),
            session(Mode::Focus, 25, 15, 19),
            session(Mode::Break, 5, 15, 9),
            session(Mode::Break, 5, 15, 9),
        ];
        assert_eq!(insights(&sessions, today()).peak_time, Some(PeakTime::Evening));
    }

    #[test]
    fn peak_time_ties_pick_earliest_hour() {
        let sessions = vec![session(Mode::Focus, 25, 15, 22), session(Mode::Focus, 25, 15, 13)];
        assert_eq!(insights(&sessions, today()).peak_time, Some(PeakTime::Afternoon));
    }

    #[test]
    fn streak_counts_back_from_today_or_yesterday() {
        let sessions = vec![
            session(Mode::Focus, 25, 14, 9),
            session(Mode::Focus, 25, 13, 9),
            session(Mode::Focus, 25, 11, 9),
        ];
        assert_eq!(insights(&sessions, today()).streak_days, 2);

        let mut with_today = sessions.clone();
        with_today.insert(0, session(Mode::Focus, 25, 15, 8));
        assert_eq!(insights(&with_today, today()).streak_days, 3);

        let stale = vec![session(Mode::Focus, 25, 12, 9)];
        assert_eq!(insights(&stale, today()).streak_days, 0);
    }
}
