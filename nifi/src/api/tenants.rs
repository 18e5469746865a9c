//! Tenant (user and user group) API implementation

use serde::{Deserialize, Serialize};

use super::common::{version_query, ApiQueryParams, Entity, Position};
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type Tenant = Entity<TenantComponent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantKind {
    User,
    Group,
}

impl TenantKind {
    /// URL segment under `/tenants`.
    pub fn collection(&self) -> &'static str {
        match self {
            TenantKind::User => "users",
            TenantKind::Group => "user-groups",
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            TenantKind::User => EntityKind::User,
            TenantKind::Group => EntityKind::Group,
        }
    }
}

/// Weak reference to another tenant by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_group_id: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Group members; always empty for users.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<TenantRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    #[serde(default)]
    users: Vec<TenantRef>,
    #[serde(default)]
    user_groups: Vec<TenantRef>,
}

/// Tenants API, bound to users or user groups
#[derive(Clone, Copy)]
pub struct TenantsApi<'a> {
    client: &'a Client,
    kind: TenantKind,
}

impl<'a> TenantsApi<'a> {
    pub fn new(client: &'a Client, kind: TenantKind) -> Self {
        Self { client, kind }
    }

    fn collection_path(&self) -> String {
        format!("/tenants/{}", self.kind.collection())
    }

    fn path(&self, id: &str) -> String {
        format!("/tenants/{}/{}", self.kind.collection(), id)
    }

    /// POST /tenants/{users|user-groups}
    pub async fn create(&self, tenant: &Tenant) -> Result<Tenant> {
        self.client
            .post(&self.collection_path(), tenant)
            .await
            .map_err(|e| Error::create(self.kind.entity_kind(), e))
    }

    /// GET /tenants/{users|user-groups}/{id}
    pub async fn get(&self, id: &str) -> Result<Tenant> {
        self.client
            .get(&self.path(id))
            .await
            .map_err(|e| Error::read(self.kind.entity_kind(), id, e))
    }

    /// PUT /tenants/{users|user-groups}/{id}
    pub async fn update(&self, tenant: &Tenant) -> Result<Tenant> {
        let id = &tenant.component.id;
        self.client
            .put(&self.path(id), tenant)
            .await
            .map_err(|e| Error::update(self.kind.entity_kind(), id, e))
    }

    /// DELETE /tenants/{users|user-groups}/{id}?version=N
    pub async fn delete(&self, tenant: &Tenant) -> Result<()> {
        let id = &tenant.component.id;
        self.client
            .delete(&format!("{}{}", self.path(id), version_query(&tenant.revision)))
            .await
            .map_err(|e| Error::delete(self.kind.entity_kind(), id, e))
    }

    /// Ids of tenants of this kind matching `identity`.
    ///
    /// GET /tenants/search-results?q={identity}
    pub async fn search(&self, identity: &str) -> Result<Vec<String>> {
        let query = ApiQueryParams::new().add("q", identity).to_query_string();
        let results: SearchResults = self
            .client
            .get(&format!("/tenants/search-results{}", query))
            .await
            .map_err(|e| Error::read(self.kind.entity_kind(), identity, e))?;

        let matches = match self.kind {
            TenantKind::User => results.users,
            TenantKind::Group => results.user_groups,
        };
        Ok(matches.into_iter().map(|tenant| tenant.id).collect())
    }
}
