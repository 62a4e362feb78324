//! MySQL delta source over `sqlx`.

use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::errors::SourceError;
use crate::parameters::DatabaseCredentials;
use crate::source::{Cell, DeltaBatch, DeltaQuery, DeltaRow, DeltaSource, SourceConnector};
use crate::watermark::Watermark;

pub struct MySqlConnector {
    options: MySqlConnectOptions,
    database: String,
}

impl MySqlConnector {
    pub fn new(credentials: &DatabaseCredentials, database: &str) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .username(&credentials.user)
            .password(&credentials.password)
            .database(database);

        if let Some(port) = credentials.port {
            options = options.port(port);
        }

        Self {
            options,
            database: database.to_string(),
        }
    }
}

impl SourceConnector for MySqlConnector {
    type Source = MySqlDeltaSource;

    async fn connect(&self) -> Result<MySqlDeltaSource, SourceError> {
        let conn = self
            .options
            .connect()
            .await
            .map_err(|e| SourceError::Connection {
                source: Box::new(e),
            })?;

        info!("Connected to MySQL database {}", self.database);
        Ok(MySqlDeltaSource { conn })
    }
}

pub struct MySqlDeltaSource {
    conn: MySqlConnection,
}

impl DeltaSource for MySqlDeltaSource {
    async fn fetch_delta(
        &mut self,
        query: &DeltaQuery,
        since: &Watermark,
    ) -> Result<DeltaBatch, SourceError> {
        let sql = query.sql();
        debug!("Running delta query: {}", sql);

        let rows = sqlx::query(&sql)
            .bind(since.timestamp())
            .bind(since.timestamp())
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| SourceError::Query {
                source: Box::new(e),
            })?;

        let rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DeltaBatch { rows })
    }

    async fn close(self) -> Result<(), SourceError> {
        self.conn.close().await.map_err(|e| SourceError::Close {
            source: Box::new(e),
        })
    }
}

fn decode_row(row: &MySqlRow) -> Result<DeltaRow, SourceError> {
    let cells = row
        .columns()
        .iter()
        .map(|column| decode_cell(row, column))
        .collect::<Result<Vec<_>, _>>()?;
    DeltaRow::from_cells(cells)
}

fn decode_cell(row: &MySqlRow, column: &MySqlColumn) -> Result<Cell, SourceError> {
    let idx = column.ordinal();
    let decode_err = |e: sqlx::Error| SourceError::Decode {
        column: column.name().to_string(),
        reason: e.to_string(),
    };

    if row.try_get_raw(idx).map_err(decode_err)?.is_null() {
        return Ok(Cell::Null);
    }

    // Integer widths are decoded by buffer length, so all signed/unsigned
    // variants go through i64/u64 without a compatibility check.
    let type_name = column.type_info().name();
    let cell = match type_name {
        "BOOLEAN" => Cell::Bool(row.try_get::<bool, _>(idx).map_err(decode_err)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Cell::Int(row.try_get_unchecked::<i64, _>(idx).map_err(decode_err)?)
        }
        name if name.ends_with("UNSIGNED") => {
            Cell::UInt(row.try_get_unchecked::<u64, _>(idx).map_err(decode_err)?)
        }
        "FLOAT" => Cell::Float(f64::from(row.try_get::<f32, _>(idx).map_err(decode_err)?)),
        "DOUBLE" => Cell::Float(row.try_get::<f64, _>(idx).map_err(decode_err)?),
        "DATETIME" | "TIMESTAMP" => Cell::DateTime(
            row.try_get_unchecked::<chrono::NaiveDateTime, _>(idx)
                .map_err(decode_err)?,
        ),
        "DATE" => Cell::Date(
            row.try_get::<chrono::NaiveDate, _>(idx)
                .map_err(decode_err)?,
        ),
        "TIME" => Cell::Time(
            row.try_get::<chrono::NaiveTime, _>(idx)
                .map_err(decode_err)?,
        ),
        // DECIMAL, character types, JSON, ENUM/SET and blobs arrive as bytes.
        _ => {
            let bytes = row
                .try_get_unchecked::<Vec<u8>, _>(idx)
                .map_err(decode_err)?;
            match String::from_utf8(bytes) {
                Ok(text) => Cell::Text(text),
                Err(e) => Cell::Bytes(e.into_bytes()),
            }
        }
    };

    Ok(cell)
}
