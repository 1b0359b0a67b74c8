//! Opening hours for the queue.
//!
//! Timezone handling stays in here: callers hand in a UTC instant and get
//! back a three-way [`WindowState`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant. Used by tests and `queuebot check --at`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Where `now` falls relative to the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowState {
    NotYetOpen(DateTime<Tz>),
    Open,
    Closed(DateTime<Tz>),
}

/// `[start, end)` window in a named timezone, or always open when disabled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeWindow {
    bounds: Option<(DateTime<Tz>, DateTime<Tz>)>,
}

impl TimeWindow {
    /// A window that never blocks.
    pub fn disabled() -> Self {
        Self { bounds: None }
    }

    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if start >= end {
            return Err(Error::Config(format!(
                "queue window start ({}) must be before end ({})",
                start, end
            )));
        }
        Ok(Self {
            bounds: Some((start, end)),
        })
    }

    /// Build from local wall-clock times in `tz`.
    ///
    /// Times that fall in a DST gap or overlap are rejected.
    pub fn from_local(start: NaiveDateTime, end: NaiveDateTime, tz: Tz) -> Result<Self> {
        let localize = |naive: NaiveDateTime| {
            tz.from_local_datetime(&naive).single().ok_or_else(|| {
                Error::Config(format!("{} is not a unique local time in {}", naive, tz))
            })
        };
        Self::new(localize(start)?, localize(end)?)
    }

    pub fn is_enabled(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn state(&self, now: DateTime<Utc>) -> WindowState {
        let Some((start, end)) = self.bounds else {
            return WindowState::Open;
        };

        if now < start {
            WindowState::NotYetOpen(start)
        } else if now >= end {
            WindowState::Closed(end)
        } else {
            WindowState::Open
        }
    }
}

/// Render a window boundary the way replies show it, e.g. `9:00 AM, Monday 02 January.`
pub fn format_instant(instant: &DateTime<Tz>) -> String {
    instant.format("%-I:%M %p, %A %d %B.").to_string()
}

/// One-line summary of a window state for operator output.
pub fn format_window_state(state: &WindowState) -> String {
    match state {
        WindowState::NotYetOpen(start) => format!("not yet open, opens {}", format_instant(start)),
        WindowState::Open => "open".to_string(),
        WindowState::Closed(end) => format!("closed since {}", format_instant(end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::{Asia::Singapore, Europe::London};

    fn local(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::from_local(local(9, 0), local(17, 0), Singapore).unwrap()
    }

    #[test]
    fn test_disabled_is_always_open() {
        let w = TimeWindow::disabled();
        assert!(!w.is_enabled());
        assert_eq!(w.state(Utc::now()), WindowState::Open);
    }

    #[test]
    fn test_three_way_state() {
        let w = window();

        // 00:59 UTC == 08:59 SGT
        let before = Utc.with_ymd_and_hms(2023, 1, 2, 0, 59, 0).unwrap();
        assert!(matches!(w.state(before), WindowState::NotYetOpen(_)));

        let during = Utc.with_ymd_and_hms(2023, 1, 2, 1, 0, 0).unwrap();
        assert_eq!(w.state(during), WindowState::Open);

        // End is exclusive.
        let at_end = Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap();
        assert!(matches!(w.state(at_end), WindowState::Closed(_)));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let err = TimeWindow::from_local(local(17, 0), local(9, 0), Singapore);
        assert!(err.is_err());
    }

    #[test]
    fn test_format_instant_in_local_offset() {
        let start = Singapore.from_local_datetime(&local(9, 5)).unwrap();
        assert_eq!(format_instant(&start), "9:05 AM, Monday 02 January.");
    }

    #[test]
    fn test_follows_daylight_saving() {
        let day = NaiveDate::from_ymd_opt(2023, 7, 3).unwrap();
        let w = TimeWindow::from_local(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(17, 0, 0).unwrap(),
            London,
        )
        .unwrap();

        // BST is UTC+1, so 09:00 local is 08:00 UTC.
        let opening = Utc.with_ymd_and_hms(2023, 7, 3, 8, 0, 0).unwrap();
        assert_eq!(w.state(opening), WindowState::Open);
        let just_before = Utc.with_ymd_and_hms(2023, 7, 3, 7, 59, 0).unwrap();
        match w.state(just_before) {
            WindowState::NotYetOpen(start) => {
                assert_eq!(format_instant(&start), "9:00 AM, Monday 03 July.")
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_rejects_time_in_dst_gap() {
        let day = NaiveDate::from_ymd_opt(2023, 3, 26).unwrap();
        let err = TimeWindow::from_local(
            day.and_hms_opt(1, 30, 0).unwrap(),
            day.and_hms_opt(17, 0, 0).unwrap(),
            London,
        );
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
