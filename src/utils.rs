use crate::error::{BillChartError, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day number of 1970-01-01 in the spreadsheet serial calendar.
const SERIAL_UNIX_EPOCH: i64 = 25569;
const SECONDS_PER_DAY: f64 = 86400.0;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rounds to two decimal places (cents).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders an amount the way it reads on a receipt: `100`, `12.5`, `0.1`.
pub fn format_amount(amount: f64) -> String {
    let amount = round2(amount);
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

/// A calendar month bucket, ordered chronologically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(BillChartError::DateError(format!(
                "Invalid month {} for year {}: must be between 1 and 12",
                month, year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            BillChartError::DateError(format!("Period {} has no first day", self))
        })
    }

    pub fn last_day(&self) -> Result<NaiveDate> {
        last_day_of_month(self.year, self.month)
    }

    /// Every calendar day of the month, ascending.
    pub fn days(&self) -> Result<Vec<NaiveDate>> {
        let first = self.first_day()?;
        let last = self.last_day()?;
        Ok(first.iter_days().take_while(|d| *d <= last).collect())
    }

    /// `[first day 00:00:00, last day 23:59:59]`
    pub fn range(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let start = self.first_day()?.and_time(NaiveTime::MIN);
        let end_time = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| BillChartError::DateError("Invalid end-of-day time".to_string()))?;
        let end = self.last_day()?.and_time(end_time);
        Ok((start, end))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| {
            BillChartError::DateError(format!(
                "Cannot compute last day of {:04}-{:02}",
                year, month
            ))
        })
}

/// Parses a period string in the format "YYYY-MM"
pub fn parse_period_string(period: &str) -> Result<PeriodKey> {
    let start_str = format!("{}-01", period.trim());
    let start_date = NaiveDate::parse_from_str(&start_str, DATE_FORMAT).map_err(|_| {
        BillChartError::DateError(format!(
            "Invalid date format in period: {}. Expected YYYY-MM",
            period
        ))
    })?;

    Ok(PeriodKey::of(start_date))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(time: NaiveDateTime) -> String {
    time.format(DATETIME_FORMAT).to_string()
}

/// Converts a spreadsheet day serial into a calendar date-time.
///
/// The integer part counts days from the spreadsheet epoch, the fractional part
/// encodes the time of day, truncated to whole seconds.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }

    let whole_days = serial.floor();
    let unix_days = whole_days as i64 - SERIAL_UNIX_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let date = if unix_days >= 0 {
        epoch.checked_add_days(Days::new(unix_days as u64))?
    } else {
        epoch.checked_sub_days(Days::new(unix_days.unsigned_abs()))?
    };

    // The small bias absorbs binary representation error, e.g. 0.5 stored as 0.49999...
    let fractional_day = serial - whole_days + 0.000_000_1;
    let total_seconds = (SECONDS_PER_DAY * fractional_day).floor() as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(total_seconds.min(86_399), 0)?;

    Some(date.and_time(time))
}

/// Parses the textual timestamp shapes found in exports.
pub fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
