//! Calendar-month reporting periods.

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One calendar-month reporting interval, the row key of every violation
/// table.
///
/// Orders chronologically (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period from a year and a 1-based month.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPeriodError`] if `month` is not in `1..=12` or the
    /// year is outside the range `chrono` can represent.
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidPeriodError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(InvalidPeriodError {
                value: format!("{year}-{month}"),
            });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// 1-based calendar month.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        // Validated in every constructor.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Human-readable label such as `"May 2023"`.
    #[must_use]
    pub fn label(self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{:04}-{:02}", self.year, self.month))
    }
}

impl std::str::FromStr for Period {
    type Err = InvalidPeriodError;

    /// Accepts `YYYY-MM`, `YYYY-MM-DD` and ISO 8601 datetimes, which covers
    /// every month encoding seen in the published statistics exports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || InvalidPeriodError {
            value: s.to_string(),
        };

        if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        for fmt in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::from_date(dt.date()));
            }
        }

        Err(err())
    }
}

impl TryFrom<String> for Period {
    type Error = InvalidPeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// Error returned when a string or year/month pair is not a valid [`Period`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPeriodError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidPeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid period '{}': expected YYYY-MM, YYYY-MM-DD or an ISO 8601 datetime",
            self.value
        )
    }
}

impl std::error::Error for InvalidPeriodError {}
