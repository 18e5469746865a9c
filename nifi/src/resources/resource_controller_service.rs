//! Controller service resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::controller_services::{ControllerService, ControllerServiceComponent};
use crate::api::lifecycle::{best_effort, OnFailure};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{Block, ResourceData};

/// Controller services are kept enabled: disabled around every change and
/// enabled again afterwards. Enabling may legitimately fail while the
/// service's configuration is invalid, so only a warning is logged then.
pub struct ControllerServiceResource {
    provider_data: NifiProviderData,
}

impl ControllerServiceResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    async fn enable(&self, service: &ControllerService) -> Result<()> {
        OnFailure::Warn.handle(
            &format!("enable controller service {}", service.component.id),
            self.client().controller_services().enable(service).await,
        )?;
        Ok(())
    }

    /// Disables the service when enabled, returning the freshest entity.
    async fn disable(&self, service: ControllerService) -> ControllerService {
        if !service.component.is_enabled() {
            return service;
        }
        let step = format!("disable controller service {}", service.component.id);
        best_effort(&step, self.client().controller_services().disable(&service).await)
            .unwrap_or(service)
    }
}

#[async_trait]
impl Resource for ControllerServiceResource {
    fn type_name(&self) -> &str {
        "nifi_controller_service"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let service = ControllerService::new(service_from(&data.component()?)?);

        let created = self.client().controller_services().create(&service).await?;
        tracing::info!("Controller service {} created", created.component.id);
        data.set_id(created.component.id.clone());
        data.set("parent_group_id", created.component.parent_group_id.clone());

        self.enable(&created).await?;
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(service) = found(data, self.client().controller_services().get(&id).await)?
        else {
            return Ok(());
        };

        data.set("parent_group_id", service.component.parent_group_id.clone());
        data.set_revision(service.revision);
        data.set_component(json!({
            "parent_group_id": service.component.parent_group_id,
            "name": service.component.name,
            "type": service.component.service_type,
            "properties": service.component.properties,
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(current) = found(data, self.client().controller_services().get(&id).await)?
        else {
            return Ok(());
        };

        let disabled = self.disable(current).await;
        let declared = service_from(&data.component()?)?;
        let desired = ControllerService {
            revision: disabled.revision,
            component: ControllerServiceComponent {
                id: id.clone(),
                ..declared
            },
        };

        let Some(updated) = found(data, self.client().controller_services().update(&desired).await)?
        else {
            return Ok(());
        };
        tracing::info!("Controller service {} updated", id);

        self.enable(&updated).await?;
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(current) = found(data, self.client().controller_services().get(&id).await)?
        else {
            return Ok(());
        };

        let disabled = self.disable(current).await;
        if found(data, self.client().controller_services().delete(&disabled).await)?.is_some() {
            tracing::info!("Controller service {} deleted", id);
        }
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().controller_services().get(&id).await)?.is_some())
    }
}

fn service_from(component: &Block<'_>) -> Result<ControllerServiceComponent> {
    Ok(ControllerServiceComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        name: component.required_str("name")?.to_string(),
        service_type: component.required_str("type")?.to_string(),
        state: None,
        properties: component.properties("properties"),
    })
}
