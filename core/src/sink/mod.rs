pub mod redshift;

use std::fmt;
use std::future::Future;

use crate::errors::WarehouseError;

pub use redshift::RedshiftConnector;

/// The warehouse bulk-load statement for one staged artifact.
///
/// Rendered as `COPY <table> FROM '<uri>' IAM_ROLE '<role>' CSV IGNOREHEADER <n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStatement {
    pub table: String,
    pub source_uri: String,
    pub iam_role: String,
    pub ignore_header_rows: u32,
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl fmt::Display for CopyStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "COPY {}\nFROM {}\nIAM_ROLE {}\nCSV\nIGNOREHEADER {};",
            self.table,
            quote_literal(&self.source_uri),
            quote_literal(&self.iam_role),
            self.ignore_header_rows
        )
    }
}

/// An open warehouse session.
pub trait Warehouse: Send {
    /// Runs `statement` inside a transaction and commits it. Nothing is
    /// committed when this returns an error.
    fn bulk_load(
        &mut self,
        statement: &CopyStatement,
    ) -> impl Future<Output = Result<(), WarehouseError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), WarehouseError>> + Send;
}

pub trait WarehouseConnector: Send + Sync {
    type Session: Warehouse;

    fn connect(&self) -> impl Future<Output = Result<Self::Session, WarehouseError>> + Send;
}
