//! Reporting task resource implementation

use async_trait::async_trait;
use serde_json::json;

use crate::api::reporting_tasks::{ReportingTask, ReportingTaskComponent};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{Block, ResourceData};

const DEFAULT_SCHEDULING_STRATEGY: &str = "TIMER_DRIVEN";
const DEFAULT_SCHEDULING_PERIOD: &str = "5 mins";

pub struct ReportingTaskResource {
    provider_data: NifiProviderData,
}

impl ReportingTaskResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }
}

#[async_trait]
impl Resource for ReportingTaskResource {
    fn type_name(&self) -> &str {
        "nifi_reporting_task"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let task = ReportingTask::new(task_from(&data.component()?)?);

        let created = self.client().reporting_tasks().create(&task).await?;
        tracing::info!("Reporting task {} created", created.component.id);
        data.set_id(created.component.id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(task) = found(data, self.client().reporting_tasks().get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", task.component.parent_group_id.clone());
        data.set_revision(task.revision);
        data.set_component(json!({
            "parent_group_id": task.component.parent_group_id,
            "name": task.component.name,
            "type": task.component.task_type,
            "comments": task.component.comments,
            "scheduling_strategy": task.component.scheduling_strategy,
            "scheduling_period": task.component.scheduling_period,
            "properties": task.component.properties,
        }));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(current) = found(data, self.client().reporting_tasks().get(&id).await)? else {
            return Ok(());
        };

        let desired = ReportingTask {
            revision: current.revision,
            component: ReportingTaskComponent {
                id: id.clone(),
                ..task_from(&data.component()?)?
            },
        };
        if found(data, self.client().reporting_tasks().update(&desired).await)?.is_none() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        if let Some(current) = found(data, self.client().reporting_tasks().get(&id).await)? {
            found(data, self.client().reporting_tasks().delete(&current).await)?;
        }
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().reporting_tasks().get(&id).await)?.is_some())
    }
}

fn task_from(component: &Block<'_>) -> Result<ReportingTaskComponent> {
    Ok(ReportingTaskComponent {
        id: String::new(),
        parent_group_id: component.string_or("parent_group_id", ""),
        name: component.required_str("name")?.to_string(),
        task_type: component.required_str("type")?.to_string(),
        comments: component.string_or("comments", ""),
        scheduling_strategy: component
            .string_or("scheduling_strategy", DEFAULT_SCHEDULING_STRATEGY),
        scheduling_period: component.string_or("scheduling_period", DEFAULT_SCHEDULING_PERIOD),
        state: None,
        properties: component.properties("properties"),
    })
}
