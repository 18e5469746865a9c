//! Data source implementations

pub mod root_process_group;

pub use root_process_group::RootProcessGroupDataSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::ResourceData;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &str;

    /// Look the object up and record its attributes.
    async fn read(&self, data: &mut ResourceData) -> Result<()>;
}
