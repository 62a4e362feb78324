pub mod ssm;

use std::fmt;
use std::future::Future;

use crate::config::ParameterNames;
use crate::errors::{ParameterError, Result};

pub use ssm::SsmParameterStore;

/// Key-value store of decrypted string parameters shared by both stages.
///
/// Holds the watermark, the staged filename pointer and the database
/// credentials. There is no versioning; the last `put` wins.
pub trait ParameterStore: Send + Sync {
    fn get(&self, name: &str) -> impl Future<Output = Result<String>> + Send;

    fn put(
        &self,
        name: &str,
        value: &str,
        description: Option<&str>,
        overwrite: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Login details for one database, as read from the parameter store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: Option<u16>,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16> {
    value.trim().parse::<u16>().map_err(|e| {
        ParameterError::InvalidValue {
            name: name.to_string(),
            reason: format!("not a port number: {e}"),
        }
        .into()
    })
}

pub async fn load_source_credentials<P: ParameterStore>(
    store: &P,
    names: &ParameterNames,
) -> Result<DatabaseCredentials> {
    let user = store.get(&names.source_user).await?;
    let password = store.get(&names.source_password).await?;
    let host = store.get(&names.source_host).await?;
    let port = match &names.source_port {
        Some(port_name) => Some(parse_port(port_name, &store.get(port_name).await?)?),
        None => None,
    };

    Ok(DatabaseCredentials {
        user,
        password,
        host,
        port,
    })
}

pub async fn load_warehouse_credentials<P: ParameterStore>(
    store: &P,
    names: &ParameterNames,
) -> Result<DatabaseCredentials> {
    let user = store.get(&names.warehouse_user).await?;
    let password = store.get(&names.warehouse_password).await?;
    let host = store.get(&names.warehouse_host).await?;
    let port = parse_port(&names.warehouse_port, &store.get(&names.warehouse_port).await?)?;

    Ok(DatabaseCredentials {
        user,
        password,
        host,
        port: Some(port),
    })
}
