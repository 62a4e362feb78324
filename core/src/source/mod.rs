pub mod mysql;
pub mod query;

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::SourceError;
use crate::watermark::Watermark;

pub use mysql::MySqlConnector;
pub use query::DeltaQuery;

/// One column value of a delta row, decoded from whatever the source returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Non-UTF-8 payloads (BIT, binary blobs); staged as `0x`-prefixed hex.
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text written to the staged file. Null becomes an empty field.
    pub fn to_csv_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => u8::from(*b).to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::UInt(u) => u.to_string(),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.1}"),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bytes(b) => format!("0x{}", hex::encode(b)),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Cell::DateTime(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }

    fn as_timestamp(&self, column: &str) -> Result<Option<NaiveDateTime>, SourceError> {
        match self {
            Cell::Null => Ok(None),
            Cell::DateTime(ts) => Ok(Some(*ts)),
            Cell::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(Some)
                .map_err(|e| SourceError::Decode {
                    column: column.to_string(),
                    reason: e.to_string(),
                }),
            other => Err(SourceError::Decode {
                column: column.to_string(),
                reason: format!("expected a timestamp, got {other:?}"),
            }),
        }
    }
}

/// A users/accounts outer-joined row.
///
/// `cells` holds every selected column in query order: `users.*`,
/// `accounts.*`, then `users_created` and `accounts_created`. The two trailing
/// timestamps are also kept typed for the watermark computation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaRow {
    pub cells: Vec<Cell>,
    pub users_created: Option<NaiveDateTime>,
    pub accounts_created: Option<NaiveDateTime>,
}

impl DeltaRow {
    pub fn from_cells(cells: Vec<Cell>) -> Result<Self, SourceError> {
        let n = cells.len();
        if n < 2 {
            return Err(SourceError::Decode {
                column: query::ACCOUNTS_CREATED.to_string(),
                reason: format!("row has {n} columns, expected the two creation timestamps"),
            });
        }
        let users_created = cells[n - 2].as_timestamp(query::USERS_CREATED)?;
        let accounts_created = cells[n - 1].as_timestamp(query::ACCOUNTS_CREATED)?;

        Ok(Self {
            cells,
            users_created,
            accounts_created,
        })
    }
}

/// The rows returned by one delta query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaBatch {
    pub rows: Vec<DeltaRow>,
}

impl DeltaBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn accounts_created(&self) -> impl Iterator<Item = Option<NaiveDateTime>> + '_ {
        self.rows.iter().map(|row| row.accounts_created)
    }
}

/// An open connection to the relational source.
pub trait DeltaSource: Send {
    /// Runs the two-armed delta query for rows created after `since`.
    fn fetch_delta(
        &mut self,
        query: &DeltaQuery,
        since: &Watermark,
    ) -> impl Future<Output = Result<DeltaBatch, SourceError>> + Send;

    /// Releases the connection.
    fn close(self) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Opens [`DeltaSource`] connections. Holds credentials, not a live connection.
pub trait SourceConnector: Send + Sync {
    type Source: DeltaSource;

    fn connect(&self) -> impl Future<Output = Result<Self::Source, SourceError>> + Send;
}
