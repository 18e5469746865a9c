//! Process group resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::process_groups::{ProcessGroup, ProcessGroupComponent};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

pub struct ProcessGroupResource {
    provider_data: NifiProviderData,
}

impl ProcessGroupResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

#[async_trait]
impl Resource for ProcessGroupResource {
    fn type_name(&self) -> &str {
        "nifi_process_group"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let group = ProcessGroup::new(group_from(&data.component()?)?);

        let created = self.client().process_groups().create(&group).await?;
        tracing::info!("Process group {} created", created.component.id);
        data.set_id(created.component.id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(group) = found(data, self.client().process_groups().get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", group.component.parent_group_id.clone());
        data.set_revision(group.revision);
        data.set_component(json!({
            "parent_group_id": group.component.parent_group_id,
            "name": group.component.name,
            "position": position_value(&group.component.position),
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(current) = found(data, self.client().process_groups().get(&id).await)? else {
            return Ok(());
        };

        let desired = ProcessGroup {
            revision: current.revision,
            component: ProcessGroupComponent {
                id: id.clone(),
                ..group_from(&data.component()?)?
            },
        };
        if found(data, self.client().process_groups().update(&desired).await)?.is_none() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        if let Some(current) = found(data, self.client().process_groups().get(&id).await)? {
            found(data, self.client().process_groups().delete(&current).await)?;
        }
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().process_groups().get(&id).await)?.is_some())
    }
}

fn group_from(component: &Block<'_>) -> Result<ProcessGroupComponent> {
    Ok(ProcessGroupComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        name: component.required_str("name")?.to_string(),
        position: component.position()?,
    })
}
