//! Processor resource implementation

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::api::lifecycle::{best_effort, required, Endpoint, EndpointControl, OnFailure};
use crate::api::processors::{Processor, ProcessorComponent, ProcessorConfig};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

pub struct ProcessorResource {
    provider_data: NifiProviderData,
}

impl ProcessorResource {
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
        declared: ProcessorComponent,
    ) -> Result<()> {
        let client = self.client();
        let Some(current) = found(data, client.processors().get(id).await)? else {
            return Ok(());
        };

        let was_running = current.component.is_running();
        let revision = if was_running {
            required(
                &format!("stop processor {}", id),
                client.processors().stop(&current).await,
            )?
            .revision
        } else {
            current.revision
        };

        let desired = Processor {
            revision,
            component: ProcessorComponent {
                id: id.to_string(),
                state: None,
                relationships: Vec::new(),
                ..declared
            },
        };

        let updated = match remove_overlapping_connections(client, &desired).await {
            Ok(()) => client.processors().update(&desired).await,
            Err(e) => Err(e),
        };

        if was_running {
            self.restart(id, updated.as_ref().ok()).await;
        }
        found(data, updated)?;
        Ok(())
    }

    /// Starts the processor again after a locked sequence, refetching it
    /// when the sequence failed before producing a fresh revision.
    async fn restart(&self, id: &str, updated: Option<&Processor>) {
        let step = format!("start processor {}", id);
        let processors = self.client().processors();
        let current = match updated {
            Some(processor) => processor.clone(),
            None => match best_effort(&step, processors.get(id).await) {
                Some(processor) => processor,
                None => return,
            },
        };
        best_effort(&step, processors.start(&current).await);
    }

    async fn delete_locked(&self, data: &mut ResourceData, id: &str) -> Result<()> {
        let client = self.client();
        let Some(current) = found(data, client.processors().get(id).await)? else {
            return Ok(());
        };

        let current = if current.component.is_running() {
            required(
                &format!("stop processor {}", id),
                client.processors().stop(&current).await,
            )?
        } else {
            current
        };

        if found(data, client.processors().delete(&current).await)?.is_some() {
            tracing::info!("Processor {} deleted", id);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for ProcessorResource {
    fn type_name(&self) -> &str {
        "nifi_processor"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let processor = Processor::new(processor_from(&data.component()?)?);

        let created = self.client().processors().create(&processor).await?;
        tracing::info!("Processor {} created", created.component.id);

        data.set_id(created.component.id.clone());
        data.set("parent_group_id", created.component.parent_group_id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(processor) = found(data, self.client().processors().get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", processor.component.parent_group_id.clone());
        data.set_revision(processor.revision);
        data.set_component(processor_to_value(&processor.component));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let declared = processor_from(&data.component()?)?;
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
        let _guard = self.client().exclusive().await;
        self.delete_locked(data, &id).await?;
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().processors().get(&id).await)?.is_some())
    }
}

/// Resolves relationships that would be both auto-terminated and selected
/// by a connection leaving `processor`.
///
/// Overlapping names are removed from each such connection; a connection
/// left without relationships is purged and deleted. The destination of
/// every touched connection is stopped around the change and restarted if
/// it was running.
pub async fn remove_overlapping_connections(client: &Client, processor: &Processor) -> Result<()> {
    let auto_terminated: BTreeSet<&str> = processor
        .component
        .auto_terminated()
        .iter()
        .map(String::as_str)
        .collect();
    if auto_terminated.is_empty() {
        return Ok(());
    }

    let processor_id = processor.component.id.as_str();
    let connections = client
        .connections()
        .list_in_group(&processor.component.parent_group_id)
        .await?;

    for connection in connections {
        if connection.component.source.id != processor_id {
            continue;
        }
        let (overlapping, remaining): (Vec<String>, Vec<String>) = connection
            .component
            .selected_relationships
            .iter()
            .cloned()
            .partition(|name| auto_terminated.contains(name.as_str()));
        if overlapping.is_empty() {
            continue;
        }

        let connection_id = connection.component.id.clone();
        tracing::info!(
            "Connection {} selects auto-terminated relationships {:?}",
            connection_id,
            overlapping
        );

        let destination = Endpoint::try_from(&connection.component.destination)?;
        let record = required(
            &format!("stop {}", destination),
            destination.stop(client).await,
        )?;

        if remaining.is_empty() {
            client.connections().drop_data(&connection).await?;
            let fresh = client.connections().get(&connection_id).await?;
            client.connections().delete(&fresh).await?;
            tracing::info!("Connection {} deleted", connection_id);
        } else {
            let mut reduced = connection.clone();
            reduced.component.selected_relationships = remaining;
            client.connections().update(&reduced).await?;
            tracing::info!("Connection {} updated", connection_id);
        }

        OnFailure::Warn.handle(
            &format!("restart {}", destination),
            destination.restore(client, record).await,
        )?;
    }
    Ok(())
}

fn processor_from(component: &Block<'_>) -> Result<ProcessorComponent> {
    let config = component.single("config")?;
    let defaults = ProcessorConfig::default();

    Ok(ProcessorComponent {
        id: String::new(),
        parent_group_id: component.required_str("parent_group_id")?.to_string(),
        name: component.required_str("name")?.to_string(),
        processor_type: component.required_str("type")?.to_string(),
        position: Some(component.position()?),
        state: None,
        config: Some(ProcessorConfig {
            scheduling_strategy: config
                .string_or("scheduling_strategy", &defaults.scheduling_strategy),
            scheduling_period: config.string_or("scheduling_period", &defaults.scheduling_period),
            concurrently_schedulable_task_count: config
                .i64("concurrently_schedulable_task_count")
                .unwrap_or(defaults.concurrently_schedulable_task_count),
            properties: config.properties("properties"),
            auto_terminated_relationships: config.strings("auto_terminated_relationships"),
        }),
        relationships: Vec::new(),
    })
}

fn processor_to_value(component: &ProcessorComponent) -> Value {
    let config = component.config.clone().unwrap_or_default();
    json!({
        "parent_group_id": component.parent_group_id,
        "name": component.name,
        "type": component.processor_type,
        "position": position_value(&component.position.unwrap_or_default()),
        "config": [{
            "scheduling_strategy": config.scheduling_strategy,
            "scheduling_period": config.scheduling_period,
            "concurrently_schedulable_task_count": config.concurrently_schedulable_task_count,
            "properties": config.properties,
            "auto_terminated_relationships": config.auto_terminated_relationships,
        }],
    })
}
