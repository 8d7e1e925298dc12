//! Reminder date and time input: shortcut buttons, a permissive date parser,
//! and 12/24-hour clock times, all interpreted in the configured UTC offset.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Month, NaiveDate, NaiveTime, TimeZone, Utc,
    Weekday,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{LedgerError, Result};
use crate::ports::DateShortcut;

/// Hours offered as time buttons.
pub const TIME_SLOTS: [u32; 5] = [9, 10, 14, 17, 20];

static IN_N_UNITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^in\s+(\d{1,3})\s+(day|days|week|weeks)$").expect("relative date regex")
});
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("iso date regex"));
static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{2}|\d{4}))?$").expect("numeric date regex")
});
static DAY_NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)(?:\s+(\d{4}))?$").expect("named month regex")
});
static NAMED_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$")
        .expect("named month regex")
});
static TWELVE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?:[:.](\d{2}))?\s*([ap])\.?m\.?$").expect("12-hour regex")
});
static TWENTY_FOUR_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})(?:[:.h](\d{2}))?$").expect("24-hour regex"));

/// The owner's calendar day at `now`.
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

pub fn resolve_shortcut(shortcut: DateShortcut, today: NaiveDate) -> NaiveDate {
    let weekday = i64::from(today.weekday().num_days_from_monday());
    let days = match shortcut {
        DateShortcut::Today => 0,
        DateShortcut::Tomorrow => 1,
        // Saturday; on a Saturday that is today
        DateShortcut::ThisWeekend => (5 - weekday).rem_euclid(7),
        DateShortcut::NextMonday => match (7 - weekday) % 7 {
            0 => 7,
            days => days,
        },
        DateShortcut::NextWeek => 7,
    };
    today + Duration::days(days)
}

/// Parses a typed date relative to `today`. Dates before `today` are rejected
/// with [`LedgerError::PastDateTime`].
pub fn parse_date(input: &str, today: NaiveDate, offset: FixedOffset) -> Result<NaiveDate> {
    let text = input.trim().to_lowercase();
    let date = interpret_date(&text, today)
        .ok_or_else(|| LedgerError::UnparsableDateTime(input.trim().to_string()))?;
    if date < today {
        return Err(LedgerError::PastDateTime(start_of_day(date, offset)));
    }
    Ok(date)
}

fn interpret_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let shortcut = match text {
        "today" | "now" => Some(DateShortcut::Today),
        "tomorrow" | "tmrw" => Some(DateShortcut::Tomorrow),
        "this weekend" | "weekend" => Some(DateShortcut::ThisWeekend),
        "next monday" => Some(DateShortcut::NextMonday),
        "next week" => Some(DateShortcut::NextWeek),
        _ => None,
    };
    if let Some(shortcut) = shortcut {
        return Some(resolve_shortcut(shortcut, today));
    }

    let day_name = text.strip_prefix("next ").unwrap_or(text);
    if let Ok(weekday) = Weekday::from_str(day_name) {
        return Some(next_weekday(today, weekday));
    }

    if let Some(caps) = IN_N_UNITS.captures(text) {
        let count: i64 = caps[1].parse().ok()?;
        let days = if caps[2].starts_with("week") {
            count * 7
        } else {
            count
        };
        return today.checked_add_signed(Duration::days(days));
    }

    if let Some(caps) = ISO_DATE.captures(text) {
        let year = caps[1].parse().ok()?;
        let (month, day) = (caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DAY_MONTH.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).map(|m| m.as_str());
        return day_month_year(today, day, month, year);
    }

    if let Some(caps) = DAY_NAMED_MONTH.captures(text) {
        let month = month_number(&caps[2])?;
        return day_month_year(today, caps[1].parse().ok()?, month, caps.get(3).map(|m| m.as_str()));
    }

    if let Some(caps) = NAMED_MONTH_DAY.captures(text) {
        let month = month_number(&caps[1])?;
        return day_month_year(today, caps[2].parse().ok()?, month, caps.get(3).map(|m| m.as_str()));
    }

    None
}

/// Without an explicit year the nearest upcoming occurrence is used.
fn day_month_year(today: NaiveDate, day: u32, month: u32, year: Option<&str>) -> Option<NaiveDate> {
    match year {
        Some(year) => {
            let year: i32 = year.parse().ok()?;
            let year = if year < 100 { 2000 + year } else { year };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    Month::from_str(name).ok().map(|month| month.number_from_month())
}

/// Next `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let days = match (target - current).rem_euclid(7) {
        0 => 7,
        days => days,
    };
    today + Duration::days(days)
}

/// Parses `9am`, `2:30 PM`, `14:30`, `14h30` or a bare hour such as `14`.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let text = input.trim().to_lowercase();
    let unparsable = || LedgerError::UnparsableDateTime(input.trim().to_string());

    if let Some(caps) = TWELVE_HOUR.captures(&text) {
        let hour: u32 = caps[1].parse().map_err(|_| unparsable())?;
        let minute = minutes(caps.get(2)).ok_or_else(unparsable)?;
        if !(1..=12).contains(&hour) {
            return Err(unparsable());
        }
        let hour = match (&caps[3], hour) {
            ("a", 12) => 0,
            ("a", hour) => hour,
            ("p", 12) => 12,
            (_, hour) => hour + 12,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(unparsable);
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(&text) {
        let hour: u32 = caps[1].parse().map_err(|_| unparsable())?;
        let minute = minutes(caps.get(2)).ok_or_else(unparsable)?;
        return NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(unparsable);
    }

    Err(unparsable())
}

fn minutes(group: Option<regex::Match<'_>>) -> Option<u32> {
    match group {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

pub fn slot_time(hour: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| LedgerError::UnparsableDateTime(format!("{}:00", hour)))
}

/// Local date and time to a UTC instant.
pub fn combine(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Result<DateTime<Utc>> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| LedgerError::UnparsableDateTime(format!("{} {}", date, time)))
}

/// Rejects instants that are not strictly after `now`.
pub fn ensure_future(instant: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if instant > now {
        Ok(instant)
    } else {
        Err(LedgerError::PastDateTime(instant))
    }
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    combine(date, NaiveTime::default(), offset).unwrap_or_else(|_| Utc.from_utc_datetime(&midnight))
}

/// `2025-06-02 14:30` in the owner's offset.
pub fn format_local(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}
