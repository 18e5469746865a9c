//! Process group API implementation

use serde::{Deserialize, Serialize};

use super::common::{version_query, Entity, Position};
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type ProcessGroup = Entity<ProcessGroupComponent>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub parent_group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Position,
}

/// Process groups API
#[derive(Clone, Copy)]
pub struct ProcessGroupsApi<'a> {
    client: &'a Client,
}

impl<'a> ProcessGroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/process-groups
    pub async fn create(&self, group: &ProcessGroup) -> Result<ProcessGroup> {
        let path = format!(
            "/process-groups/{}/process-groups",
            group.component.parent_group_id
        );
        self.client
            .post(&path, group)
            .await
            .map_err(|e| Error::create(EntityKind::ProcessGroup, e))
    }

    /// GET /process-groups/{id}
    pub async fn get(&self, id: &str) -> Result<ProcessGroup> {
        self.client
            .get(&format!("/process-groups/{}", id))
            .await
            .map_err(|e| Error::read(EntityKind::ProcessGroup, id, e))
    }

    /// GET /process-groups/root
    pub async fn root(&self) -> Result<ProcessGroup> {
        self.get("root").await
    }

    /// PUT /process-groups/{id}
    pub async fn update(&self, group: &ProcessGroup) -> Result<ProcessGroup> {
        let id = &group.component.id;
        self.client
            .put(&format!("/process-groups/{}", id), group)
            .await
            .map_err(|e| Error::update(EntityKind::ProcessGroup, id, e))
    }

    /// DELETE /process-groups/{id}?version=N
    pub async fn delete(&self, group: &ProcessGroup) -> Result<()> {
        let id = &group.component.id;
        self.client
            .delete(&format!(
                "/process-groups/{}{}",
                id,
                version_query(&group.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::ProcessGroup, id, e))
    }
}
