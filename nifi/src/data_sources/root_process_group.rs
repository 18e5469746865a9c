//! Root process group data source implementation

use async_trait::async_trait;

use crate::data_sources::DataSource;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::schema::ResourceData;

pub struct RootProcessGroupDataSource {
    provider_data: NifiProviderData,
}

impl RootProcessGroupDataSource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }
}

#[async_trait]
impl DataSource for RootProcessGroupDataSource {
    fn type_name(&self) -> &str {
        "nifi_root_process_group"
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let root = self.provider_data.client.process_groups().root().await?;
        tracing::debug!("Root process group is {}", root.component.id);

        data.set_id(root.component.id.clone());
        data.set("id", root.component.id);
        data.set("name", root.component.name);
        Ok(())
    }
}
