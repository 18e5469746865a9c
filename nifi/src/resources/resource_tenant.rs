//! User and user group resource implementation

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::tenants::{Tenant, TenantComponent, TenantKind, TenantRef};
use crate::api::Client;
use crate::error::{Error, Result};
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{position_value, Block, ResourceData};

/// Serves both `nifi_user` and `nifi_group`; the kind selects the
/// `/tenants/users` or `/tenants/user-groups` collection.
pub struct TenantResource {
    provider_data: NifiProviderData,
    kind: TenantKind,
}

impl TenantResource {
    pub fn new(provider_data: NifiProviderData, kind: TenantKind) -> Self {
        Self {
            provider_data,
            kind,
        }
    }

    pub fn user(provider_data: NifiProviderData) -> Self {
        Self::new(provider_data, TenantKind::User)
    }

    pub fn group(provider_data: NifiProviderData) -> Self {
        Self::new(provider_data, TenantKind::Group)
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    /// Id of the single tenant of this kind carrying `identity`.
    pub async fn resolve_identity(&self, identity: &str) -> Result<String> {
        let mut matches = self.client().tenants(self.kind).search(identity).await?;
        match matches.len() {
            0 => Err(Error::NotFound {
                kind: self.kind.entity_kind(),
                id: identity.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousIdentity {
                identity: identity.to_string(),
                count,
            }),
        }
    }

    fn tenant_from(&self, component: &Block<'_>) -> Result<TenantComponent> {
        let users = match self.kind {
            TenantKind::User => Vec::new(),
            TenantKind::Group => {
                let mut users: Vec<TenantRef> = component
                    .strings("users")
                    .into_iter()
                    .map(|id| TenantRef { id })
                    .collect();
                users.sort();
                users.dedup();
                users
            }
        };
        Ok(TenantComponent {
            id: String::new(),
            parent_group_id: component.string_or("parent_group_id", ""),
            identity: component.required_str("identity")?.to_string(),
            position: Some(component.position()?),
            users,
        })
    }

    fn tenant_to_value(&self, component: &TenantComponent) -> Value {
        let mut value = json!({
            "parent_group_id": component.parent_group_id,
            "identity": component.identity,
            "position": position_value(&component.position.unwrap_or_default()),
        });
        if self.kind == TenantKind::Group {
            let users: Vec<&str> = component.users.iter().map(|user| user.id.as_str()).collect();
            value["users"] = json!(users);
        }
        value
    }

    async fn update_locked(&self, data: &mut ResourceData, id: &str) -> Result<()> {
        let tenants = self.client().tenants(self.kind);
        let Some(current) = found(data, tenants.get(id).await)? else {
            return Ok(());
        };

        let desired = Tenant {
            revision: current.revision,
            component: TenantComponent {
                id: id.to_string(),
                ..self.tenant_from(&data.component()?)?
            },
        };
        if found(data, tenants.update(&desired).await)?.is_some() {
            tracing::info!("{} {} updated", self.kind.entity_kind(), id);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for TenantResource {
    fn type_name(&self) -> &str {
        match self.kind {
            TenantKind::User => "nifi_user",
            TenantKind::Group => "nifi_group",
        }
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let tenant = Tenant::new(self.tenant_from(&data.component()?)?);

        let created = self.client().tenants(self.kind).create(&tenant).await?;
        tracing::info!("{} {} created", self.kind.entity_kind(), created.component.id);
        data.set_id(created.component.id.clone());
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(tenant) = found(data, self.client().tenants(self.kind).get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", tenant.component.parent_group_id.clone());
        data.set_revision(tenant.revision);
        data.set_component(self.tenant_to_value(&tenant.component));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        {
            let _guard = self.client().exclusive().await;
            self.update_locked(data, &id).await?;
        }
        if !data.has_id() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let _guard = self.client().exclusive().await;
        let tenants = self.client().tenants(self.kind);
        if let Some(current) = found(data, tenants.get(&id).await)? {
            found(data, tenants.delete(&current).await)?;
        }
        data.clear_id();
        Ok(())
    }

    /// Without a tracked id the tenant is looked up by its declared identity
    /// and adopted when exactly one match exists.
    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        if data.has_id() {
            let id = data.id().to_string();
            return Ok(found(data, self.client().tenants(self.kind).get(&id).await)?.is_some());
        }

        let identity = data.component()?.required_str("identity")?.to_string();
        match self.resolve_identity(&identity).await {
            Ok(id) => {
                tracing::info!("Adopting {} {} ({})", self.kind.entity_kind(), id, identity);
                data.set_id(id);
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
