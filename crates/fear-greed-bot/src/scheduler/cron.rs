//! Five-field cron expressions
//!
//! `minute hour day-of-month month day-of-week`, each field accepting `*`,
//! numbers, `a-b` ranges, `/n` steps and `,` lists. Day-of-week 0 and 7 are
//! both Sunday. When both day fields are restricted a day matches if either
//! does, as in Vixie cron.

use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How far ahead `next_after` searches before giving up
const SEARCH_HORIZON_DAYS: i64 = 366 * 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid cron expression `{expression}`: {reason}")]
pub struct CronError {
    pub expression: String,
    pub reason: String,
}

/// Allowed values of one field as a bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Field {
    bits: u64,
    /// False when the field was written as `*` or `*/n`
    restricted: bool,
}

impl Field {
    fn contains(self, value: u32) -> bool {
        value < 64 && self.bits & (1u64 << value) != 0
    }

    fn parse(text: &str, name: &str, min: u32, max: u32) -> Result<Self, String> {
        let mut bits = 0u64;

        for part in text.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step
                        .parse()
                        .map_err(|_| format!("{name}: invalid step `{step}`"))?;
                    if step == 0 {
                        return Err(format!("{name}: step must be positive"));
                    }
                    (range, step)
                }
                None => (part, 1),
            };

            let value = |s: &str| -> Result<u32, String> {
                let v: u32 = s
                    .parse()
                    .map_err(|_| format!("{name}: invalid value `{s}`"))?;
                if (min..=max).contains(&v) {
                    Ok(v)
                } else {
                    Err(format!("{name}: {v} outside {min}-{max}"))
                }
            };

            let (start, end) = if range == "*" {
                (min, max)
            } else if let Some((a, b)) = range.split_once('-') {
                let (a, b) = (value(a)?, value(b)?);
                if a > b {
                    return Err(format!("{name}: empty range {a}-{b}"));
                }
                (a, b)
            } else {
                let a = value(range)?;
                // `5/15` means every 15 starting at 5
                if part.contains('/') { (a, max) } else { (a, a) }
            };

            for v in (start..=end).step_by(step as usize) {
                bits |= 1u64 << v;
            }
        }

        Ok(Self {
            bits,
            restricted: !text.starts_with('*'),
        })
    }
}

/// A parsed cron schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: Field,
    hours: Field,
    days_of_month: Field,
    months: Field,
    days_of_week: Field,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let error = |reason: String| CronError {
            expression: expression.to_string(),
            reason,
        };

        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(error(format!("expected 5 fields, found {}", fields.len())));
        };

        let mut days_of_week = Field::parse(dow, "day-of-week", 0, 7).map_err(error)?;
        if days_of_week.contains(7) {
            days_of_week.bits = (days_of_week.bits & !(1u64 << 7)) | 1;
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes: Field::parse(minute, "minute", 0, 59).map_err(error)?,
            hours: Field::parse(hour, "hour", 0, 23).map_err(error)?,
            days_of_month: Field::parse(dom, "day-of-month", 1, 31).map_err(error)?,
            months: Field::parse(month, "month", 1, 12).map_err(error)?,
            days_of_week,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// `HH:MM` when the schedule fires once a day at a fixed time
    pub fn daily_time(&self) -> Option<String> {
        let single = |f: Field| f.bits.count_ones() == 1;
        let every_day = !self.days_of_month.restricted
            && !self.months.restricted
            && !self.days_of_week.restricted;

        if every_day && single(self.minutes) && single(self.hours) {
            Some(format!(
                "{:02}:{:02}",
                self.hours.bits.trailing_zeros(),
                self.minutes.bits.trailing_zeros()
            ))
        } else {
            None
        }
    }

    /// Human-facing description: the daily time, or the raw expression
    pub fn describe(&self) -> String {
        self.daily_time()
            .unwrap_or_else(|| self.expression.clone())
    }

    fn matches_day(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self
            .days_of_week
            .contains(date.weekday().num_days_from_sunday());

        if self.days_of_month.restricted && self.days_of_week.restricted {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// First matching minute strictly after `after`, in `after`'s timezone.
    ///
    /// Local times that do not exist (DST gaps) are skipped; ambiguous ones
    /// resolve to the earliest instant still after `after`.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let local = after.naive_local();
        let mut t = local.date().and_hms_opt(local.hour(), local.minute(), 0)? + TimeDelta::minutes(1);
        let horizon = t + TimeDelta::days(SEARCH_HORIZON_DAYS);

        while t <= horizon {
            let date = t.date();

            if !self.months.contains(date.month()) {
                t = first_of_next_month(date)?;
                continue;
            }
            if !self.matches_day(date) {
                t = date.succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.hours.contains(t.hour()) {
                t = date.and_hms_opt(t.hour(), 0, 0)? + TimeDelta::hours(1);
                continue;
            }
            if self.minutes.contains(t.minute()) {
                let found = match tz.from_local_datetime(&t) {
                    LocalResult::Single(dt) => Some(dt).filter(|dt| dt > after),
                    LocalResult::Ambiguous(earliest, latest) => {
                        [earliest, latest].into_iter().find(|dt| dt > after)
                    }
                    LocalResult::None => None,
                };
                if found.is_some() {
                    return found;
                }
            }
            t += TimeDelta::minutes(1);
        }

        None
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDateTime> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
