//! Calendar month periods
//!
//! A period is the closed interval `[first_day, last_day]` of one month.
//! Tokens are `YYYY-MM` (a single-digit month is accepted on input).

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl Period {
    /// Resolve an optional month token; absent or blank means the current month
    pub fn resolve(token: Option<&str>) -> Result<Self> {
        match token.map(str::trim) {
            None | Some("") => Self::current(),
            Some(t) => Self::parse(t),
        }
    }

    pub fn current() -> Result<Self> {
        let today = Local::now().date_naive();
        Self::from_year_month(today.year(), today.month())
    }

    /// Parse a `YYYY-MM` / `YYYY-M` token
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = || Error::InvalidPeriod(token.to_string());

        let (year, month) = token.split_once('-').ok_or_else(invalid)?;
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || !digits(year) || month.is_empty() || month.len() > 2 || !digits(month)
        {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::from_year_month(year, month).map_err(|_| invalid())
    }

    pub fn from_year_month(year: i32, month: u32) -> Result<Self> {
        let invalid = || Error::InvalidPeriod(format!("{}-{}", year, month));

        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(invalid)?;

        Ok(Self {
            first_day,
            last_day,
        })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }

    /// Canonical `YYYY-MM` token
    pub fn token(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }

    /// Human label, e.g. `September, 2025`
    pub fn label(&self) -> String {
        self.first_day.format("%B, %Y").to_string()
    }

    pub fn prev(&self) -> Self {
        let (year, month) = if self.month() == 1 {
            (self.year() - 1, 12)
        } else {
            (self.year(), self.month() - 1)
        };
        // Adjacent months of a valid month are always valid
        Self::from_year_month(year, month).unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        let (year, month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        Self::from_year_month(year, month).unwrap_or(*self)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Token of the month before `token`
pub fn prev_month_token(token: &str) -> Result<String> {
    Ok(Period::parse(token)?.prev().token())
}

/// Token of the month after `token`
pub fn next_month_token(token: &str) -> Result<String> {
    Ok(Period::parse(token)?.next().token())
}
