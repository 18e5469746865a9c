//! Funnel API implementation

use serde::{Deserialize, Serialize};

use super::common::{version_query, Entity, Position};
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type Funnel = Entity<FunnelComponent>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub parent_group_id: String,
    #[serde(default)]
    pub position: Position,
}

#[derive(Clone, Copy)]
pub struct FunnelsApi<'a> {
    client: &'a Client,
}

impl<'a> FunnelsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/funnels
    pub async fn create(&self, funnel: &Funnel) -> Result<Funnel> {
        let path = format!("/process-groups/{}/funnels", funnel.component.parent_group_id);
        self.client
            .post(&path, funnel)
            .await
            .map_err(|e| Error::create(EntityKind::Funnel, e))
    }

    /// GET /funnels/{id}
    pub async fn get(&self, id: &str) -> Result<Funnel> {
        self.client
            .get(&format!("/funnels/{}", id))
            .await
            .map_err(|e| Error::read(EntityKind::Funnel, id, e))
    }

    /// PUT /funnels/{id}
    pub async fn update(&self, funnel: &Funnel) -> Result<Funnel> {
        let id = &funnel.component.id;
        self.client
            .put(&format!("/funnels/{}", id), funnel)
            .await
            .map_err(|e| Error::update(EntityKind::Funnel, id, e))
    }

    /// DELETE /funnels/{id}?version=N
    pub async fn delete(&self, funnel: &Funnel) -> Result<()> {
        let id = &funnel.component.id;
        self.client
            .delete(&format!("/funnels/{}{}", id, version_query(&funnel.revision)))
            .await
            .map_err(|e| Error::delete(EntityKind::Funnel, id, e))
    }
}
