//! Period labels and the sampling date range.

use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;

use crate::error::{Result, ScreenError};

/// Lookback period written as a compact label: `20d`, `3w`, `2m`, `3y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    magnitude: u32,
    unit: PeriodUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    /// Fixed day multipliers. Months and years are flat 30/365 day
    /// approximations, not calendar lookups.
    fn days(self) -> u32 {
        match self {
            PeriodUnit::Day => 1,
            PeriodUnit::Week => 7,
            PeriodUnit::Month => 30,
            PeriodUnit::Year => 365,
        }
    }
}

impl Period {
    pub fn parse(label: &str) -> Result<Self> {
        let re = Regex::new(r"^(\d+)([dwmy])$").unwrap();
        let caps = re
            .captures(label.trim())
            .ok_or_else(|| ScreenError::BadPeriod(label.to_string()))?;

        let magnitude: u32 = caps[1]
            .parse()
            .map_err(|_| ScreenError::BadPeriod(label.to_string()))?;
        if magnitude == 0 {
            return Err(ScreenError::BadPeriod(label.to_string()));
        }

        let unit = match &caps[2] {
            "d" => PeriodUnit::Day,
            "w" => PeriodUnit::Week,
            "m" => PeriodUnit::Month,
            _ => PeriodUnit::Year,
        };

        Ok(Self { magnitude, unit })
    }

    pub fn days(self) -> u32 {
        self.magnitude * self.unit.days()
    }
}

/// Calendar window the candle history is sampled over: `multiple`
/// periods back from the end date, end date inclusive.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(period: Period, multiple: u32) -> Self {
        Self::ending(Utc::now().date_naive(), period, multiple)
    }

    fn ending(end: NaiveDate, period: Period, multiple: u32) -> Self {
        let days = i64::from(multiple) * i64::from(period.days());
        Self {
            start: end - Duration::days(days),
            end,
        }
    }
}
