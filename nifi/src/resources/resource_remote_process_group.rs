//! Remote process group resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::remote_process_groups::{
    RemoteProcessGroup, RemoteProcessGroupComponent, DEFAULT_TRANSPORT_PROTOCOL,
};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

pub struct RemoteProcessGroupResource {
    provider_data: NifiProviderData,
}

impl RemoteProcessGroupResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

#[async_trait]
impl Resource for RemoteProcessGroupResource {
    fn type_name(&self) -> &str {
        "nifi_remote_process_group"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let group = RemoteProcessGroup::new(remote_group_from(&data.component()?)?);

        let created = self.client().remote_process_groups().create(&group).await?;
        tracing::info!("Remote process group {} created", created.component.id);
        data.set_id(created.component.id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(group) = found(data, self.client().remote_process_groups().get(&id).await)?
        else {
            return Ok(());
        };

        data.set("parent_group_id", group.component.parent_group_id.clone());
        data.set_revision(group.revision);
        data.set_component(json!({
            "parent_group_id": group.component.parent_group_id,
            "name": group.component.name,
            "position": position_value(&group.component.position),
            "target_uris": group.component.target_uris,
            "transport_protocol": group.component.transport_protocol,
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(current) = found(data, self.client().remote_process_groups().get(&id).await)?
        else {
            return Ok(());
        };

        let desired = RemoteProcessGroup {
            revision: current.revision,
            component: RemoteProcessGroupComponent {
                id: id.clone(),
                ..remote_group_from(&data.component()?)?
            },
        };
        let updated = self.client().remote_process_groups().update(&desired).await;
        if found(data, updated)?.is_none() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        if let Some(current) = found(data, self.client().remote_process_groups().get(&id).await)? {
            found(data, self.client().remote_process_groups().delete(&current).await)?;
        }
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().remote_process_groups().get(&id).await)?.is_some())
    }
}

fn remote_group_from(component: &Block<'_>) -> Result<RemoteProcessGroupComponent> {
    Ok(RemoteProcessGroupComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        name: component.string_or("name", ""),
        position: component.position()?,
        target_uris: component.required_str("target_uris")?.to_string(),
        transport_protocol: component.string_or("transport_protocol", DEFAULT_TRANSPORT_PROTOCOL),
    })
}
