//! Calendar helpers: the run's "now" anchor, business-day snapping and
//! recency-skewed timestamps.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use time::{Date, Duration, OffsetDateTime, UtcOffset, Weekday};

use crate::config::{CalendarConfig, DayWindow};
use crate::errors::GenerationError;
use crate::sampling::triangular;

/// Mode of the due-date offset, as a share of the window.
const DUE_MODE_SHARE: f64 = 0.35;

/// Completion may trail the due date by at most this much.
const COMPLETION_GRACE: Duration = Duration::days(14);

/// Minimum gap between creation and completion.
const MIN_WORK: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct Calendar {
    now: OffsetDateTime,
    business_days: Vec<Weekday>,
    recency: Beta<f64>,
}

impl Calendar {
    /// Builds a calendar anchored at `now` (or the current UTC time), truncated
    /// to whole seconds.
    pub fn new(
        now: Option<OffsetDateTime>,
        config: &CalendarConfig,
    ) -> Result<Self, GenerationError> {
        if config.business_days.is_empty() {
            return Err(GenerationError::config(
                "calendar.business_days",
                "at least one business day is required",
            ));
        }

        let now = now.unwrap_or_else(OffsetDateTime::now_utc);
        let now = OffsetDateTime::from_unix_timestamp(now.unix_timestamp())
            .map_err(|e| GenerationError::config("now", e.to_string()))?
            .to_offset(UtcOffset::UTC);

        let recency = Beta::new(config.recency_alpha, config.recency_beta)
            .map_err(|e| GenerationError::config("calendar.recency", e.to_string()))?;

        Ok(Self {
            now,
            business_days: config.business_days.clone(),
            recency,
        })
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    pub fn today(&self) -> Date {
        self.now.date()
    }

    pub fn is_business_day(&self, date: Date) -> bool {
        self.business_days.contains(&date.weekday())
    }

    /// Moves `date` forward to the next business day; business days are kept.
    pub fn snap_forward(&self, date: Date) -> Date {
        let mut date = date;
        while !self.is_business_day(date) {
            date = date.saturating_add(Duration::DAY);
        }
        date
    }

    /// The latest business day strictly before `date`.
    pub fn latest_business_day_before(&self, date: Date) -> Date {
        let mut date = date.saturating_sub(Duration::DAY);
        while !self.is_business_day(date) {
            date = date.saturating_sub(Duration::DAY);
        }
        date
    }

    /// Timestamp in `[start, end]` skewed toward `end`.
    pub fn recent_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> OffsetDateTime {
        if start >= end {
            return start;
        }
        let span = (end - start).whole_seconds() as f64;
        let frac = self.recency.sample(rng);
        start + Duration::seconds((span * (1.0 - frac)).round() as i64)
    }

    /// Timestamp uniformly in `[start, end]`.
    pub fn uniform_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> OffsetDateTime {
        if start >= end {
            return start;
        }
        let span = (end - start).whole_seconds();
        start + Duration::seconds(rng.gen_range(0..=span))
    }

    /// Due date `window` days after `from`, favoring the early part of the
    /// window and snapped forward to a business day.
    pub fn due_from(&self, from: OffsetDateTime, window: DayWindow, rng: &mut impl Rng) -> Date {
        let (min, max) = (window.min as f64, window.max as f64);
        let mode = min + (max - min) * DUE_MODE_SHARE;
        let offset = (triangular(min, max, mode, rng).round() as i64).clamp(window.min, window.max);
        self.snap_forward(from.date().saturating_add(Duration::days(offset)))
    }

    /// Completion timestamp for work created at `created`.
    ///
    /// The result lies in `[created + 1h, min(created + max_days, due + 14d, now)]`
    /// and is skewed toward the late end. Returns `None` only when less than an
    /// hour separates `created` from now.
    pub fn completion_after(
        &self,
        created: OffsetDateTime,
        due: Option<Date>,
        max_days: i64,
        rng: &mut impl Rng,
    ) -> Option<OffsetDateTime> {
        let earliest = created + MIN_WORK;
        if earliest > self.now {
            return None;
        }

        let mut latest = (created + Duration::days(max_days)).min(self.now);
        if let Some(due) = due {
            latest = latest.min(due.midnight().assume_utc() + COMPLETION_GRACE);
        }

        if latest <= earliest {
            return Some(earliest);
        }
        Some(self.recent_between(earliest, latest, rng))
    }

    /// Incomplete with a due date before today.
    pub fn is_overdue(&self, due: Option<Date>, completed_at: Option<OffsetDateTime>) -> bool {
        match (due, completed_at) {
            (Some(due), None) => due < self.today(),
            _ => false,
        }
    }
}
