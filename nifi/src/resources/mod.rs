//! Resource implementations
//!
//! Each resource reconciles one declarative resource kind against the
//! remote flow, ordering stop/drain/mutate/start steps so the server accepts
//! every change.

pub mod resource_connection;
pub mod resource_controller_service;
pub mod resource_funnel;
pub mod resource_port;
pub mod resource_process_group;
pub mod resource_processor;
pub mod resource_remote_process_group;
pub mod resource_reporting_task;
pub mod resource_tenant;

pub use resource_connection::ConnectionResource;
pub use resource_controller_service::ControllerServiceResource;
pub use resource_funnel::FunnelResource;
pub use resource_port::PortResource;
pub use resource_process_group::ProcessGroupResource;
pub use resource_processor::ProcessorResource;
pub use resource_remote_process_group::RemoteProcessGroupResource;
pub use resource_reporting_task::ReportingTaskResource;
pub use resource_tenant::TenantResource;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::schema::ResourceData;

#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &str;

    /// Create the entity and record its id and observed state.
    async fn create(&self, data: &mut ResourceData) -> Result<()>;

    /// Refresh observed state; clears the id when the entity is gone.
    async fn read(&self, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, data: &mut ResourceData) -> Result<()>;

    async fn exists(&self, data: &mut ResourceData) -> Result<bool>;

    /// Adopt an existing entity by id and read its observed state.
    async fn import_state(&self, id: &str) -> Result<ResourceData> {
        let mut data = ResourceData::new().with_id(id);
        self.read(&mut data).await?;
        if !data.has_id() {
            return Err(Error::ImportFailed {
                type_name: self.type_name().to_string(),
                id: id.to_string(),
            });
        }
        Ok(data)
    }
}

/// Treats NotFound as "already gone": clears the tracked id and yields
/// `None`. Every other outcome passes through.
pub(crate) fn found<T>(data: &mut ResourceData, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::info!("{}, removing from state", e);
            data.clear_id();
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn tracked_id(data: &ResourceData) -> Result<String> {
    if data.has_id() {
        Ok(data.id().to_string())
    } else {
        Err(Error::Schema("resource has no id".to_string()))
    }
}
