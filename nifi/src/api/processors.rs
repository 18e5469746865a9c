//! Processor API implementation

use serde::{Deserialize, Serialize};

use super::common::{
    state_update, strip_null_properties, version_query, Entity, Position, Properties,
};
use super::lifecycle::RunState;
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type Processor = Entity<ProcessorComponent>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_group_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub processor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ProcessorConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    #[serde(default)]
    pub scheduling_strategy: String,
    #[serde(default)]
    pub scheduling_period: String,
    #[serde(default)]
    pub concurrently_schedulable_task_count: i64,
    #[serde(default)]
    pub properties: Properties,
    /// Authoritative on write; derived from `relationships` on read.
    #[serde(default)]
    pub auto_terminated_relationships: Vec<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            scheduling_strategy: "TIMER_DRIVEN".to_string(),
            scheduling_period: "0 sec".to_string(),
            concurrently_schedulable_task_count: 1,
            properties: Properties::new(),
            auto_terminated_relationships: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub name: String,
    #[serde(default)]
    pub auto_terminate: bool,
}

impl ProcessorComponent {
    pub fn is_running(&self) -> bool {
        self.state == Some(RunState::Running)
    }

    pub fn auto_terminated(&self) -> &[String] {
        self.config
            .as_ref()
            .map(|config| config.auto_terminated_relationships.as_slice())
            .unwrap_or(&[])
    }
}

/// Post-read normalization: drop unset properties and rebuild the
/// auto-terminated list from the per-relationship flags.
fn normalize(mut processor: Processor) -> Processor {
    let auto_terminated: Vec<String> = processor
        .component
        .relationships
        .iter()
        .filter(|relationship| relationship.auto_terminate)
        .map(|relationship| relationship.name.clone())
        .collect();

    let config = processor.component.config.get_or_insert_with(Default::default);
    strip_null_properties(&mut config.properties);
    config.auto_terminated_relationships = auto_terminated;

    processor
}

/// Processors API for processor operations
#[derive(Clone, Copy)]
pub struct ProcessorsApi<'a> {
    client: &'a Client,
}

impl<'a> ProcessorsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/processors
    pub async fn create(&self, processor: &Processor) -> Result<Processor> {
        let path = format!(
            "/process-groups/{}/processors",
            processor.component.parent_group_id
        );
        let created: Processor = self
            .client
            .post(&path, processor)
            .await
            .map_err(|e| Error::create(EntityKind::Processor, e))?;
        Ok(normalize(created))
    }

    /// GET /processors/{id}
    pub async fn get(&self, id: &str) -> Result<Processor> {
        let processor: Processor = self
            .client
            .get(&format!("/processors/{}", id))
            .await
            .map_err(|e| Error::read(EntityKind::Processor, id, e))?;
        Ok(normalize(processor))
    }

    /// PUT /processors/{id}
    pub async fn update(&self, processor: &Processor) -> Result<Processor> {
        let id = &processor.component.id;
        let updated: Processor = self
            .client
            .put(&format!("/processors/{}", id), processor)
            .await
            .map_err(|e| Error::update(EntityKind::Processor, id, e))?;
        Ok(normalize(updated))
    }

    /// DELETE /processors/{id}?version=N
    pub async fn delete(&self, processor: &Processor) -> Result<()> {
        let id = &processor.component.id;
        self.client
            .delete(&format!(
                "/processors/{}{}",
                id,
                version_query(&processor.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::Processor, id, e))
    }

    /// PUT /processors/{id} with `{revision, component:{id, state}}`
    pub async fn set_state(&self, processor: &Processor, state: RunState) -> Result<Processor> {
        let id = &processor.component.id;
        tracing::debug!("Setting processor {} to {}", id, state);

        let body = state_update(processor.revision, id, state);
        let updated: Processor = self
            .client
            .put(&format!("/processors/{}", id), &body)
            .await
            .map_err(|e| Error::update(EntityKind::Processor, id, e))?;
        Ok(normalize(updated))
    }

    /// Start the processor; no-op when already running.
    pub async fn start(&self, processor: &Processor) -> Result<Processor> {
        if processor.component.state == Some(RunState::Running) {
            return Ok(processor.clone());
        }
        self.set_state(processor, RunState::Running).await
    }

    /// Stop the processor; no-op when already stopped.
    pub async fn stop(&self, processor: &Processor) -> Result<Processor> {
        if processor.component.state == Some(RunState::Stopped) {
            return Ok(processor.clone());
        }
        self.set_state(processor, RunState::Stopped).await
    }
}
