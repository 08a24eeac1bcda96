//! Ledger generation settings sourced from the process environment.

use std::fmt;

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use super::error::DomainError;

pub const START_VAR: &str = "START";
pub const END_VAR: &str = "END";
pub const BIRTH_VAR: &str = "BIRTH";

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Dates driving ledger generation.
///
/// Any date left unset is derived when the ledger is generated, so two
/// settings values compare equal only when all three fields match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LedgerSettings {
    /// First day covered by the generated entries.
    pub start: Option<Date>,
    /// Last day covered by the generated entries.
    pub end: Option<Date>,
    /// Fictional birth date of the ledger owner.
    pub birth: Option<Date>,
}

impl LedgerSettings {
    pub fn new(start: Option<Date>, end: Option<Date>, birth: Option<Date>) -> Self {
        Self { start, end, birth }
    }

    /// Read `START`, `END` and `BIRTH` from the process environment.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// Missing or blank values leave the field unset. A malformed value fails
    /// the whole load; no partially populated settings are returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let start = parse_optional_date(START_VAR, lookup(START_VAR))?;
        let end = parse_optional_date(END_VAR, lookup(END_VAR))?;
        let birth = parse_optional_date(BIRTH_VAR, lookup(BIRTH_VAR))?;

        Ok(Self { start, end, birth })
    }
}

impl fmt::Display for LedgerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start={} end={} birth={}",
            display_date(self.start),
            display_date(self.end),
            display_date(self.birth)
        )
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw, ISO_DATE)
}

fn parse_optional_date(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<Date>, DomainError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }

    match parse_iso_date(&raw) {
        Ok(date) => Ok(Some(date)),
        Err(_) => Err(DomainError::invalid_setting(name, raw)),
    }
}

fn display_date(date: Option<Date>) -> String {
    date.map(|date| date.to_string())
        .unwrap_or_else(|| "unset".to_string())
}
