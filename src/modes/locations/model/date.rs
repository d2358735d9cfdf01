use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

use crate::modes::locations::error::DateError;

/// A Modes date with year, month or day granularity.
///
/// Field order drives comparison; a missing month or day sorts before any
/// present one, so `2020 < 1.2020 < 1.1.2020`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PartialDate {
    pub year: u16,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl PartialDate {
    pub fn year(year: u16) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    /// Builds a full date, rejecting days that do not exist.
    pub fn ymd(year: u16, month: u8, day: u8) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .ok_or_else(|| DateError::OutOfRange(format!("{day}.{month}.{year}")))
            .and_then(Self::try_from)
    }

    pub fn today() -> Result<Self, DateError> {
        Self::try_from(Local::now().date_naive())
    }
}

impl TryFrom<NaiveDate> for PartialDate {
    type Error = DateError;

    /// Fails for years outside `0..=65535`, which Modes cannot express.
    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        let out_of_range = || DateError::OutOfRange(date.to_string());
        Ok(Self {
            year: u16::try_from(date.year()).map_err(|_| out_of_range())?,
            month: Some(u8::try_from(date.month()).map_err(|_| out_of_range())?),
            day: Some(u8::try_from(date.day()).map_err(|_| out_of_range())?),
        })
    }
}

impl FromStr for PartialDate {
    type Err = DateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DateError::Empty);
        }

        let fields: Vec<&str> = trimmed.split('.').collect();
        let numbers = fields
            .iter()
            .map(|field| {
                if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
                    return Err(DateError::NotNumeric(trimmed.to_string()));
                }
                field
                    .parse::<u16>()
                    .map_err(|_| DateError::OutOfRange(trimmed.to_string()))
            })
            .collect::<Result<Vec<u16>, DateError>>()?;

        let out_of_range = || DateError::OutOfRange(trimmed.to_string());
        let parse_month = |value: u16| match u8::try_from(value) {
            Ok(month @ 1..=12) => Ok(month),
            _ => Err(out_of_range()),
        };

        match numbers.as_slice() {
            [year] => Ok(Self::year(*year)),
            [m, year] => Ok(Self {
                year: *year,
                month: Some(parse_month(*m)?),
                day: None,
            }),
            [d, m, year] => {
                let day = u8::try_from(*d).map_err(|_| out_of_range())?;
                Self::ymd(*year, parse_month(*m)?, day).map_err(|_| out_of_range())
            }
            _ => Err(DateError::BadFieldCount(trimmed.to_string())),
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.day, self.month) {
            (Some(day), Some(month)) => write!(f, "{day}.{month}.{}", self.year),
            (None, Some(month)) => write!(f, "{month}.{}", self.year),
            _ => write!(f, "{}", self.year),
        }
    }
}

/// A date as found on a location record, kept verbatim when it does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDate {
    Valid(PartialDate),
    Invalid(String),
}

impl RecordDate {
    pub fn parse(raw: &str) -> Self {
        match raw.parse() {
            Ok(date) => RecordDate::Valid(date),
            Err(_) => RecordDate::Invalid(raw.to_string()),
        }
    }

    pub fn valid(&self) -> Option<PartialDate> {
        match self {
            RecordDate::Valid(date) => Some(*date),
            RecordDate::Invalid(_) => None,
        }
    }
}

impl From<PartialDate> for RecordDate {
    fn from(date: PartialDate) -> Self {
        RecordDate::Valid(date)
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDate::Valid(date) => write!(f, "{date}"),
            RecordDate::Invalid(raw) => f.write_str(raw),
        }
    }
}
