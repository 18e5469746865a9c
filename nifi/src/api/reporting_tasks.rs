//! Reporting task API implementation

use serde::{Deserialize, Serialize};

use super::common::{strip_null_properties, version_query, Entity, Properties};
use super::lifecycle::RunState;
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type ReportingTask = Entity<ReportingTaskComponent>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingTaskComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub scheduling_strategy: String,
    #[serde(default)]
    pub scheduling_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    #[serde(default)]
    pub properties: Properties,
}

fn normalize(mut task: ReportingTask) -> ReportingTask {
    strip_null_properties(&mut task.component.properties);
    task
}

#[derive(Clone, Copy)]
pub struct ReportingTasksApi<'a> {
    client: &'a Client,
}

impl<'a> ReportingTasksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /controller/reporting-tasks
    pub async fn create(&self, task: &ReportingTask) -> Result<ReportingTask> {
        self.client
            .post("/controller/reporting-tasks", task)
            .await
            .map(normalize)
            .map_err(|e| Error::create(EntityKind::ReportingTask, e))
    }

    /// GET /reporting-tasks/{id}
    pub async fn get(&self, id: &str) -> Result<ReportingTask> {
        self.client
            .get(&format!("/reporting-tasks/{}", id))
            .await
            .map(normalize)
            .map_err(|e| Error::read(EntityKind::ReportingTask, id, e))
    }

    /// PUT /reporting-tasks/{id}
    pub async fn update(&self, task: &ReportingTask) -> Result<ReportingTask> {
        let id = &task.component.id;
        self.client
            .put(&format!("/reporting-tasks/{}", id), task)
            .await
            .map(normalize)
            .map_err(|e| Error::update(EntityKind::ReportingTask, id, e))
    }

    /// DELETE /reporting-tasks/{id}?version=N
    pub async fn delete(&self, task: &ReportingTask) -> Result<()> {
        let id = &task.component.id;
        self.client
            .delete(&format!(
                "/reporting-tasks/{}{}",
                id,
                version_query(&task.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::ReportingTask, id, e))
    }
}
