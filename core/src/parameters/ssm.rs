use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::ParameterType;
use tracing::debug;

use crate::errors::{ParameterError, Result};
use crate::parameters::ParameterStore;

/// AWS Systems Manager Parameter Store backend.
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_parameter_not_found() {
                    ParameterError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    ParameterError::Read {
                        name: name.to_string(),
                        reason: service_error.to_string(),
                    }
                }
            })?;

        let value = response
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| ParameterError::NotFound {
                name: name.to_string(),
            })?;

        debug!("Read parameter {}", name);
        Ok(value.to_string())
    }

    async fn put(
        &self,
        name: &str,
        value: &str,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .set_description(description.map(str::to_string))
            .r#type(ParameterType::String)
            .overwrite(overwrite)
            .send()
            .await
            .map_err(|e| ParameterError::Write {
                name: name.to_string(),
                reason: e.into_service_error().to_string(),
            })?;

        debug!("Wrote parameter {}", name);
        Ok(())
    }
}
