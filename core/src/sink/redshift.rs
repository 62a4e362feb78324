//! Redshift session over the Postgres wire protocol.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use tracing::{debug, info};

use crate::errors::WarehouseError;
use crate::parameters::DatabaseCredentials;
use crate::sink::{CopyStatement, Warehouse, WarehouseConnector};

/// Redshift's default port, used when the credentials carry none.
pub const DEFAULT_PORT: u16 = 5439;

pub struct RedshiftConnector {
    options: PgConnectOptions,
}

impl RedshiftConnector {
    pub fn new(credentials: &DatabaseCredentials, database: &str) -> Self {
        let options = PgConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port.unwrap_or(DEFAULT_PORT))
            .username(&credentials.user)
            .password(&credentials.password)
            .database(database);

        Self { options }
    }
}

impl WarehouseConnector for RedshiftConnector {
    type Session = RedshiftSession;

    async fn connect(&self) -> Result<RedshiftSession, WarehouseError> {
        let conn = self
            .options
            .connect()
            .await
            .map_err(|e| WarehouseError::Connection {
                source: Box::new(e),
            })?;

        info!("Connected to Redshift");
        Ok(RedshiftSession { conn })
    }
}

pub struct RedshiftSession {
    conn: PgConnection,
}

impl Warehouse for RedshiftSession {
    async fn bulk_load(&mut self, statement: &CopyStatement) -> Result<(), WarehouseError> {
        let sql = statement.to_string();
        let load_err = |e: sqlx::Error| WarehouseError::Load {
            table: statement.table.clone(),
            source: Box::new(e),
        };

        let mut tx = self.conn.begin().await.map_err(load_err)?;
        debug!("Executing {}", sql);
        // An argument-less `&str` goes over the simple-query protocol; dropping
        // `tx` on error rolls back.
        (&mut *tx)
            .execute(sql.as_str())
            .await
            .map_err(load_err)?;

        tx.commit().await.map_err(|e| WarehouseError::Commit {
            table: statement.table.clone(),
            source: Box::new(e),
        })?;

        info!("Loaded {} into {}", statement.source_uri, statement.table);
        Ok(())
    }

    async fn close(self) -> Result<(), WarehouseError> {
        self.conn.close().await.map_err(|e| WarehouseError::Close {
            source: Box::new(e),
        })
    }
}
