//! Funnel resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::funnels::{Funnel, FunnelComponent};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

pub struct FunnelResource {
    provider_data: NifiProviderData,
}

impl FunnelResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

#[async_trait]
impl Resource for FunnelResource {
    fn type_name(&self) -> &str {
        "nifi_funnel"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let funnel = Funnel::new(funnel_from(&data.component()?)?);

        let created = self.client().funnels().create(&funnel).await?;
        tracing::info!("Funnel {} created", created.component.id);
        data.set_id(created.component.id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(funnel) = found(data, self.client().funnels().get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", funnel.component.parent_group_id.clone());
        data.set_revision(funnel.revision);
        data.set_component(json!({
            "parent_group_id": funnel.component.parent_group_id,
            "position": position_value(&funnel.component.position),
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        {
            let _guard = self.client().exclusive().await;
            let Some(current) = found(data, self.client().funnels().get(&id).await)? else {
                return Ok(());
            };
            let desired = Funnel {
                revision: current.revision,
                component: FunnelComponent {
                    id: id.clone(),
                    ..funnel_from(&data.component()?)?
                },
            };
            if found(data, self.client().funnels().update(&desired).await)?.is_none() {
                return Ok(());
            }
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let _guard = self.client().exclusive().await;
        if let Some(current) = found(data, self.client().funnels().get(&id).await)? {
            found(data, self.client().funnels().delete(&current).await)?;
        }
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().funnels().get(&id).await)?.is_some())
    }
}

fn funnel_from(component: &Block<'_>) -> Result<FunnelComponent> {
    Ok(FunnelComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        position: component.position()?,
    })
}
