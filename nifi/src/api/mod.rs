//! NiFi REST API client and entity repositories

pub mod client;
pub mod common;
pub mod connections;
pub mod controller_services;
pub mod error;
pub mod funnels;
pub mod lifecycle;
pub mod poll;
pub mod ports;
pub mod process_groups;
pub mod processors;
pub mod remote_process_groups;
pub mod reporting_tasks;
pub mod tenants;
pub mod transport;

#[cfg(test)]
pub mod test_helpers;

pub use client::Client;
pub use error::ApiError;
pub use transport::{ClientCertificate, ClientConfig};

impl Client {
    pub fn process_groups(&self) -> process_groups::ProcessGroupsApi<'_> {
        process_groups::ProcessGroupsApi::new(self)
    }

    pub fn processors(&self) -> processors::ProcessorsApi<'_> {
        processors::ProcessorsApi::new(self)
    }

    pub fn connections(&self) -> connections::ConnectionsApi<'_> {
        connections::ConnectionsApi::new(self)
    }

    pub fn controller_services(&self) -> controller_services::ControllerServicesApi<'_> {
        controller_services::ControllerServicesApi::new(self)
    }

    pub fn ports(&self, port_type: ports::PortType) -> ports::PortsApi<'_> {
        ports::PortsApi::new(self, port_type)
    }

    pub fn funnels(&self) -> funnels::FunnelsApi<'_> {
        funnels::FunnelsApi::new(self)
    }

    pub fn remote_process_groups(&self) -> remote_process_groups::RemoteProcessGroupsApi<'_> {
        remote_process_groups::RemoteProcessGroupsApi::new(self)
    }

    pub fn reporting_tasks(&self) -> reporting_tasks::ReportingTasksApi<'_> {
        reporting_tasks::ReportingTasksApi::new(self)
    }

    pub fn users(&self) -> tenants::TenantsApi<'_> {
        tenants::TenantsApi::new(self, tenants::TenantKind::User)
    }

    pub fn user_groups(&self) -> tenants::TenantsApi<'_> {
        tenants::TenantsApi::new(self, tenants::TenantKind::Group)
    }

    pub fn tenants(&self, kind: tenants::TenantKind) -> tenants::TenantsApi<'_> {
        tenants::TenantsApi::new(self, kind)
    }
}
