//! The last-synced timestamp and its persisted text form.

use std::fmt;

use chrono::NaiveDateTime;

use crate::errors::ParameterError;

/// Persisted watermark format (no timezone, whole seconds).
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Creation time of the most recently synced account record.
///
/// Rows whose `users.created` or `accounts.created` is strictly greater than
/// the watermark make up the next delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(NaiveDateTime);

impl Watermark {
    pub fn new(ts: NaiveDateTime) -> Self {
        Self(ts)
    }

    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value.trim(), WATERMARK_FORMAT).map(Self)
    }

    /// Parses the raw parameter value, naming the parameter in the error.
    pub fn from_parameter(name: &str, value: &str) -> Result<Self, ParameterError> {
        Self::parse(value).map_err(|e| ParameterError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected {WATERMARK_FORMAT}, got {value:?}: {e}"),
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    /// Text form written back to the parameter store. Sub-second precision
    /// is dropped.
    pub fn to_parameter_value(&self) -> String {
        self.0.format(WATERMARK_FORMAT).to_string()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WATERMARK_FORMAT))
    }
}

/// Result of folding a delta's `accounts_created` values into the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    To(Watermark),
    /// Every `accounts_created` in the delta was null.
    NoAccountTimestamps,
    /// The newest `accounts_created` does not move past the current value.
    NotNewer { candidate: Watermark },
}

/// Decides the next watermark from the current one and the delta's
/// `accounts_created` column. Never moves backwards.
pub fn next_watermark<I>(current: &Watermark, accounts_created: I) -> Advance
where
    I: IntoIterator<Item = Option<NaiveDateTime>>,
{
    match accounts_created.into_iter().flatten().max() {
        None => Advance::NoAccountTimestamps,
        Some(max) => {
            let candidate = Watermark::new(max);
            if candidate > *current {
                Advance::To(candidate)
            } else {
                Advance::NotNewer { candidate }
            }
        }
    }
}
