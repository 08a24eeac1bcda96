//! Ledger generation: resolve missing dates, then delegate to a writer.

use std::sync::Arc;

use thiserror::Error;
use time::{Date, Month, OffsetDateTime};
use tracing::info;

use crate::domain::settings::LedgerSettings;
use crate::ledger::{LedgerWriter, WriterError};

use super::random::{RandomRange, RangeError};

const START_YEARS_AGO: (i64, i64) = (2, 10);
const BIRTH_YEARS_AGO: (i64, i64) = (20, 40);
const MONTH_RANGE: (i64, i64) = (1, 12);
const DAY_RANGE: (i64, i64) = (1, 28);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("derived date is not representable: {0}")]
    InvalidDate(String),
    #[error(transparent)]
    Writer(#[from] WriterError),
    #[error("generation task failed: {0}")]
    Task(String),
}

/// Dates actually handed to the ledger writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDates {
    pub start: Date,
    pub end: Date,
    pub birth: Date,
}

/// Produces ledger text from settings, filling in unset dates at random.
pub struct Generator {
    writer: Arc<dyn LedgerWriter>,
    rng: Arc<RandomRange>,
    today: fn() -> Date,
}

impl Generator {
    pub fn new(writer: Arc<dyn LedgerWriter>, rng: Arc<RandomRange>) -> Self {
        Self {
            writer,
            rng,
            today: today_utc,
        }
    }

    /// Replace the clock used when `end` is unset.
    pub fn with_today(mut self, today: fn() -> Date) -> Self {
        self.today = today;
        self
    }

    pub fn generate_for(
        &self,
        settings: &LedgerSettings,
        seed: Option<u64>,
    ) -> Result<String, GenerateError> {
        self.generate(settings.start, settings.end, settings.birth, seed)
    }

    /// Generate a ledger.
    ///
    /// Every random draw made while deriving dates reseeds the shared stream
    /// with `seed` when one is given.
    pub fn generate(
        &self,
        start: Option<Date>,
        end: Option<Date>,
        birth: Option<Date>,
        seed: Option<u64>,
    ) -> Result<String, GenerateError> {
        let dates = self.resolve(start, end, birth, seed)?;

        info!(
            target = "beancount_example::generator",
            start = %dates.start,
            end = %dates.end,
            birth = %dates.birth,
            "Generating random data"
        );

        let text = self
            .writer
            .write(dates.birth, dates.start, dates.end, true, &self.rng)?;
        Ok(text)
    }

    /// Fill in unset dates without writing a ledger.
    pub fn resolve(
        &self,
        start: Option<Date>,
        end: Option<Date>,
        birth: Option<Date>,
        seed: Option<u64>,
    ) -> Result<ResolvedDates, GenerateError> {
        let end = end.unwrap_or_else(self.today);
        let start = match start {
            Some(start) => start,
            None => self.derive(end, START_YEARS_AGO, seed)?,
        };
        let birth = match birth {
            Some(birth) => birth,
            None => self.derive(end, BIRTH_YEARS_AGO, seed)?,
        };

        Ok(ResolvedDates { start, end, birth })
    }

    fn derive(
        &self,
        end: Date,
        years_ago: (i64, i64),
        seed: Option<u64>,
    ) -> Result<Date, GenerateError> {
        let offset = self.rng.sample(years_ago.0, years_ago.1, seed)?;
        let month = self.rng.sample(MONTH_RANGE.0, MONTH_RANGE.1, seed)?;
        let day = self.rng.sample(DAY_RANGE.0, DAY_RANGE.1, seed)?;

        let year = i64::from(end.year()) - offset;
        let year = i32::try_from(year)
            .map_err(|_| GenerateError::InvalidDate(format!("year {year} out of range")))?;
        let month = u8::try_from(month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or_else(|| GenerateError::InvalidDate(format!("month {month} out of range")))?;
        let day = u8::try_from(day)
            .map_err(|_| GenerateError::InvalidDate(format!("day {day} out of range")))?;

        Date::from_calendar_date(year, month, day)
            .map_err(|err| GenerateError::InvalidDate(err.to_string()))
    }
}

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
