//! Controller service API implementation

use serde::{Deserialize, Serialize};

use super::common::{state_update, strip_null_properties, version_query, Entity, Properties};
use super::lifecycle::ServiceState;
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type ControllerService = Entity<ControllerServiceComponent>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_group_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ServiceState>,
    #[serde(default)]
    pub properties: Properties,
}

impl ControllerServiceComponent {
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.state,
            Some(ServiceState::Enabled) | Some(ServiceState::Enabling)
        )
    }
}

fn normalize(mut service: ControllerService) -> ControllerService {
    strip_null_properties(&mut service.component.properties);
    service
}

/// Controller services API
#[derive(Clone, Copy)]
pub struct ControllerServicesApi<'a> {
    client: &'a Client,
}

impl<'a> ControllerServicesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/controller-services
    pub async fn create(&self, service: &ControllerService) -> Result<ControllerService> {
        let path = format!(
            "/process-groups/{}/controller-services",
            service.component.parent_group_id
        );
        self.client
            .post(&path, service)
            .await
            .map(normalize)
            .map_err(|e| Error::create(EntityKind::ControllerService, e))
    }

    /// GET /controller-services/{id}
    pub async fn get(&self, id: &str) -> Result<ControllerService> {
        self.client
            .get(&format!("/controller-services/{}", id))
            .await
            .map(normalize)
            .map_err(|e| Error::read(EntityKind::ControllerService, id, e))
    }

    /// PUT /controller-services/{id}
    pub async fn update(&self, service: &ControllerService) -> Result<ControllerService> {
        let id = &service.component.id;
        self.client
            .put(&format!("/controller-services/{}", id), service)
            .await
            .map(normalize)
            .map_err(|e| Error::update(EntityKind::ControllerService, id, e))
    }

    /// DELETE /controller-services/{id}?version=N
    pub async fn delete(&self, service: &ControllerService) -> Result<()> {
        let id = &service.component.id;
        self.client
            .delete(&format!(
                "/controller-services/{}{}",
                id,
                version_query(&service.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::ControllerService, id, e))
    }

    pub async fn set_state(
        &self,
        service: &ControllerService,
        state: ServiceState,
    ) -> Result<ControllerService> {
        let id = &service.component.id;
        tracing::debug!("Setting controller service {} to {}", id, state);

        let body = state_update(service.revision, id, state);
        self.client
            .put(&format!("/controller-services/{}", id), &body)
            .await
            .map(normalize)
            .map_err(|e| Error::update(EntityKind::ControllerService, id, e))
    }

    /// Enable the service; no-op when already enabled.
    pub async fn enable(&self, service: &ControllerService) -> Result<ControllerService> {
        if service.component.state == Some(ServiceState::Enabled) {
            return Ok(service.clone());
        }
        self.set_state(service, ServiceState::Enabled).await
    }

    /// Disable the service; no-op when already disabled.
    pub async fn disable(&self, service: &ControllerService) -> Result<ControllerService> {
        if service.component.state == Some(ServiceState::Disabled) {
            return Ok(service.clone());
        }
        self.set_state(service, ServiceState::Disabled).await
    }
}
