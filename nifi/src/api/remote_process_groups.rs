//! Remote process group API implementation

use serde::{Deserialize, Serialize};

use super::common::{version_query, Entity, Position};
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type RemoteProcessGroup = Entity<RemoteProcessGroupComponent>;

pub const DEFAULT_TRANSPORT_PROTOCOL: &str = "HTTP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProcessGroupComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub parent_group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Position,
    /// Comma-separated list of remote instance URLs.
    #[serde(default)]
    pub target_uris: String,
    #[serde(default)]
    pub transport_protocol: String,
}

#[derive(Clone, Copy)]
pub struct RemoteProcessGroupsApi<'a> {
    client: &'a Client,
}

impl<'a> RemoteProcessGroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/remote-process-groups
    pub async fn create(&self, group: &RemoteProcessGroup) -> Result<RemoteProcessGroup> {
        let path = format!(
            "/process-groups/{}/remote-process-groups",
            group.component.parent_group_id
        );
        self.client
            .post(&path, group)
            .await
            .map_err(|e| Error::create(EntityKind::RemoteProcessGroup, e))
    }

    /// GET /remote-process-groups/{id}
    pub async fn get(&self, id: &str) -> Result<RemoteProcessGroup> {
        self.client
            .get(&format!("/remote-process-groups/{}", id))
            .await
            .map_err(|e| Error::read(EntityKind::RemoteProcessGroup, id, e))
    }

    /// PUT /remote-process-groups/{id}
    pub async fn update(&self, group: &RemoteProcessGroup) -> Result<RemoteProcessGroup> {
        let id = &group.component.id;
        self.client
            .put(&format!("/remote-process-groups/{}", id), group)
            .await
            .map_err(|e| Error::update(EntityKind::RemoteProcessGroup, id, e))
    }

    /// DELETE /remote-process-groups/{id}?version=N
    pub async fn delete(&self, group: &RemoteProcessGroup) -> Result<()> {
        let id = &group.component.id;
        self.client
            .delete(&format!(
                "/remote-process-groups/{}{}",
                id,
                version_query(&group.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::RemoteProcessGroup, id, e))
    }
}
