pub mod api;
pub mod data_sources;
pub mod error;
pub mod provider_data;
pub mod resources;
pub mod schema;

pub use error::{Error, Result};
pub use provider_data::NifiProviderData;

use serde_json::{Map, Value};
use std::path::PathBuf;

use api::tenants::TenantKind;
use api::{ClientCertificate, ClientConfig};
use data_sources::DataSource;
use resources::Resource;

pub const DEFAULT_API_PATH: &str = "nifi-api";

/// Resource kinds served by the provider.
pub const RESOURCE_TYPES: &[&str] = &[
    "nifi_process_group",
    "nifi_processor",
    "nifi_connection",
    "nifi_controller_service",
    "nifi_port",
    "nifi_funnel",
    "nifi_remote_process_group",
    "nifi_reporting_task",
    "nifi_user",
    "nifi_group",
];

pub const DATA_SOURCE_TYPES: &[&str] = &["nifi_root_process_group"];

/// Provider block settings, each falling back to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub host: String,
    pub api_path: String,
    pub admin_cert: Option<String>,
    pub admin_key: Option<String>,
}

impl ProviderConfig {
    pub fn from_values(values: &Map<String, Value>) -> Result<Self> {
        let host = setting(values, "host", "NIFI_HOST").ok_or_else(|| {
            Error::Configuration(
                "host is required (set in provider config or NIFI_HOST env var)".to_string(),
            )
        })?;

        Ok(Self {
            host,
            api_path: setting(values, "api_path", "NIFI_API_PATH")
                .unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
            admin_cert: setting(values, "admin_cert", "NIFI_ADMIN_CERT"),
            admin_key: setting(values, "admin_key", "NIFI_ADMIN_KEY"),
        })
    }

    /// Client certificate, when both halves are configured.
    pub fn certificate(&self) -> Option<ClientCertificate> {
        match (&self.admin_cert, &self.admin_key) {
            (Some(cert), Some(key)) => Some(ClientCertificate {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            _ => None,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            certificate: self.certificate(),
            ..Default::default()
        }
    }
}

fn setting(values: &Map<String, Value>, key: &str, env: &str) -> Option<String> {
    values
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok())
        .filter(|value| !value.is_empty())
}

#[derive(Default)]
pub struct NifiProvider {
    provider_data: Option<NifiProviderData>,
}

impl NifiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, values: &Map<String, Value>) -> Result<()> {
        let config = ProviderConfig::from_values(values)?;
        self.configure_with(&config, config.client_config())
    }

    /// Configure with an explicit client configuration (timeouts, polling).
    pub fn configure_with(
        &mut self,
        config: &ProviderConfig,
        client_config: ClientConfig,
    ) -> Result<()> {
        let client = api::Client::with_config(&config.host, &config.api_path, client_config)
            .map_err(|e| Error::Configuration(format!("Failed to create API client: {}", e)))?;
        tracing::info!("Configured NiFi provider for {}", client.base_url());

        self.provider_data = Some(NifiProviderData::new(client));
        Ok(())
    }

    pub fn provider_data(&self) -> Result<&NifiProviderData> {
        self.provider_data.as_ref().ok_or(Error::NotConfigured)
    }

    pub fn resource(&self, name: &str) -> Result<Box<dyn Resource>> {
        let data = self.provider_data()?.clone();

        match name {
            "nifi_process_group" => Ok(Box::new(resources::ProcessGroupResource::new(data))),
            "nifi_processor" => Ok(Box::new(resources::ProcessorResource::new(data))),
            "nifi_connection" => Ok(Box::new(resources::ConnectionResource::new(data))),
            "nifi_controller_service" => {
                Ok(Box::new(resources::ControllerServiceResource::new(data)))
            }
            "nifi_port" => Ok(Box::new(resources::PortResource::new(data))),
            "nifi_funnel" => Ok(Box::new(resources::FunnelResource::new(data))),
            "nifi_remote_process_group" => {
                Ok(Box::new(resources::RemoteProcessGroupResource::new(data)))
            }
            "nifi_reporting_task" => Ok(Box::new(resources::ReportingTaskResource::new(data))),
            "nifi_user" => Ok(Box::new(resources::TenantResource::new(data, TenantKind::User))),
            "nifi_group" => Ok(Box::new(resources::TenantResource::new(data, TenantKind::Group))),
            _ => Err(Error::Configuration(format!("Unknown resource: {}", name))),
        }
    }

    pub fn data_source(&self, name: &str) -> Result<Box<dyn DataSource>> {
        let data = self.provider_data()?.clone();

        match name {
            "nifi_root_process_group" => Ok(Box::new(
                data_sources::RootProcessGroupDataSource::new(data),
            )),
            _ => Err(Error::Configuration(format!("Unknown data source: {}", name))),
        }
    }
}
