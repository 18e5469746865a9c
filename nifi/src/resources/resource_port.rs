//! Input and output port resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::lifecycle::{best_effort, required, RunState};
use crate::api::ports::{Port, PortComponent, PortType};
use crate::api::Client;
use crate::error::{Error, Result};
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

pub struct PortResource {
    provider_data: NifiProviderData,
}

impl PortResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    async fn update_locked(
        &self,
        data: &mut ResourceData,
        id: &str,
        declared: PortComponent,
    ) -> Result<()> {
        let port_type = declared.port_type;
        let ports = self.client().ports(port_type);
        let Some(current) = found(data, ports.get(id).await)? else {
            return Ok(());
        };

        let stopped = if current.component.state == Some(RunState::Running) {
            required(&format!("stop {} {}", port_type, id), ports.stop(&current).await)?
        } else {
            current
        };

        let desired = Port {
            revision: stopped.revision,
            component: PortComponent {
                id: id.to_string(),
                state: None,
                ..declared
            },
        };
        let Some(updated) = found(data, ports.update(&desired).await)? else {
            return Ok(());
        };
        tracing::info!("Port {} updated", id);

        best_effort(&format!("start {} {}", port_type, id), ports.start(&updated).await);
        Ok(())
    }

    async fn delete_locked(
        &self,
        data: &mut ResourceData,
        id: &str,
        port_type: PortType,
    ) -> Result<()> {
        let ports = self.client().ports(port_type);
        let Some(current) = found(data, ports.get(id).await)? else {
            return Ok(());
        };

        let current = if current.component.state == Some(RunState::Stopped) {
            current
        } else {
            required(&format!("stop {} {}", port_type, id), ports.stop(&current).await)?;
            match found(data, ports.get(id).await)? {
                Some(fresh) => fresh,
                None => return Ok(()),
            }
        };

        if found(data, ports.delete(&current).await)?.is_some() {
            tracing::info!("Port {} deleted", id);
        }
        Ok(())
    }
}

fn port_type(data: &ResourceData) -> Result<PortType> {
    data.component()?.required_str("type")?.parse()
}

#[async_trait]
impl Resource for PortResource {
    fn type_name(&self) -> &str {
        "nifi_port"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let port = Port::new(port_from(&data.component()?)?);
        let ports = self.client().ports(port.component.port_type);

        let created = ports.create(&port).await?;
        tracing::info!("Port {} created", created.component.id);
        data.set_id(created.component.id.clone());
        data.set("parent_group_id", created.component.parent_group_id.clone());

        // An input port cannot run until something feeds it.
        if created.component.port_type == PortType::OutputPort {
            best_effort(
                &format!("start output port {}", created.component.id),
                ports.start(&created).await,
            );
        }
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let port_type = port_type(data)?;
        let Some(port) = found(data, self.client().ports(port_type).get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", port.component.parent_group_id.clone());
        data.set_revision(port.revision);
        data.set_component(json!({
            "parent_group_id": port.component.parent_group_id,
            "name": port.component.name,
            "type": port.component.port_type.to_string(),
            "comments": port.component.comments,
            "position": position_value(&port.component.position),
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let declared = port_from(&data.component()?)?;
        {
            let _guard = self.client().exclusive().await;
            self.update_locked(data, &id, declared).await?;
        }
        if !data.has_id() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let port_type = port_type(data)?;
        let _guard = self.client().exclusive().await;
        self.delete_locked(data, &id, port_type).await?;
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        let port_type = port_type(data)?;
        Ok(found(data, self.client().ports(port_type).get(&id).await)?.is_some())
    }

    /// The id alone does not say which kind of port it is, so both are tried.
    async fn import_state(&self, id: &str) -> Result<ResourceData> {
        for port_type in [PortType::InputPort, PortType::OutputPort] {
            let mut data = ResourceData::from_value(json!({
                "component": [{"type": port_type.to_string()}]
            }))?
            .with_id(id);
            self.read(&mut data).await?;
            if data.has_id() {
                return Ok(data);
            }
        }
        Err(Error::ImportFailed {
            type_name: self.type_name().to_string(),
            id: id.to_string(),
        })
    }
}

fn port_from(component: &Block<'_>) -> Result<PortComponent> {
    Ok(PortComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        name: component.required_str("name")?.to_string(),
        port_type: component.required_str("type")?.parse()?,
        comments: component.string_or("comments", ""),
        position: component.position()?,
        state: None,
    })
}
