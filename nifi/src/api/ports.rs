//! Input/output port API implementation

use serde::{Deserialize, Serialize};
use std::fmt;

use super::common::{state_update, version_query, Entity, Position};
use super::lifecycle::RunState;
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type Port = Entity<PortComponent>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    #[default]
    InputPort,
    OutputPort,
}

impl PortType {
    /// URL segment of the port collection.
    pub fn collection(&self) -> &'static str {
        match self {
            PortType::InputPort => "input-ports",
            PortType::OutputPort => "output-ports",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortType::InputPort => "INPUT_PORT",
            PortType::OutputPort => "OUTPUT_PORT",
        })
    }
}

impl std::str::FromStr for PortType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INPUT_PORT" => Ok(PortType::InputPort),
            "OUTPUT_PORT" => Ok(PortType::OutputPort),
            other => Err(Error::Schema(format!("invalid port type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub parent_group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
}

/// Ports API, bound to one port type
#[derive(Clone, Copy)]
pub struct PortsApi<'a> {
    client: &'a Client,
    port_type: PortType,
}

impl<'a> PortsApi<'a> {
    pub fn new(client: &'a Client, port_type: PortType) -> Self {
        Self { client, port_type }
    }

    fn path(&self, id: &str) -> String {
        format!("/{}/{}", self.port_type.collection(), id)
    }

    /// POST /process-groups/{parentId}/{input-ports|output-ports}
    pub async fn create(&self, port: &Port) -> Result<Port> {
        let path = format!(
            "/process-groups/{}/{}",
            port.component.parent_group_id,
            self.port_type.collection()
        );
        self.client
            .post(&path, port)
            .await
            .map_err(|e| Error::create(EntityKind::Port, e))
    }

    /// GET /{input-ports|output-ports}/{id}
    pub async fn get(&self, id: &str) -> Result<Port> {
        self.client
            .get(&self.path(id))
            .await
            .map_err(|e| Error::read(EntityKind::Port, id, e))
    }

    /// PUT /{input-ports|output-ports}/{id}
    pub async fn update(&self, port: &Port) -> Result<Port> {
        let id = &port.component.id;
        self.client
            .put(&self.path(id), port)
            .await
            .map_err(|e| Error::update(EntityKind::Port, id, e))
    }

    /// DELETE /{input-ports|output-ports}/{id}?version=N
    pub async fn delete(&self, port: &Port) -> Result<()> {
        let id = &port.component.id;
        self.client
            .delete(&format!("{}{}", self.path(id), version_query(&port.revision)))
            .await
            .map_err(|e| Error::delete(EntityKind::Port, id, e))
    }

    /// Request a state change and wait for the port to report it.
    ///
    /// A 409 answer means the port is already transitioning and is only
    /// logged. Convergence follows the client's port polling policy.
    pub async fn set_state(&self, port: &Port, state: RunState) -> Result<Port> {
        let id = port.component.id.as_str();
        tracing::debug!("Setting {} {} to {}", self.port_type, id, state);

        let body = state_update(port.revision, id, state);
        match self.client.put::<Port, _>(&self.path(id), &body).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                tracing::warn!("Port {} answered 409 to state {}: {}", id, state, e)
            }
            Err(e) => return Err(Error::update(EntityKind::Port, id, e)),
        }

        let api = *self;
        let converged = self
            .client
            .port_poll()
            .run("port state", |_| async move {
                api.get(id)
                    .await
                    .map(|current| current.component.state == Some(state))
            })
            .await?;
        if converged {
            tracing::debug!("Port {} is {}", id, state);
        }

        self.get(id).await
    }

    /// Start the port; no-op when already running.
    pub async fn start(&self, port: &Port) -> Result<Port> {
        if port.component.state == Some(RunState::Running) {
            return Ok(port.clone());
        }
        self.set_state(port, RunState::Running).await
    }

    /// Stop the port; no-op when already stopped.
    pub async fn stop(&self, port: &Port) -> Result<Port> {
        if port.component.state == Some(RunState::Stopped) {
            return Ok(port.clone());
        }
        self.set_state(port, RunState::Stopped).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, port_json};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tokio_test::assert_ok;

    #[test]
    fn port_type_selects_collection() {
        assert_eq!(PortType::InputPort.collection(), "input-ports");
        assert_eq!(PortType::OutputPort.collection(), "output-ports");
        assert_eq!("OUTPUT_PORT".parse::<PortType>().unwrap(), PortType::OutputPort);
        assert!("FUNNEL".parse::<PortType>().is_err());
    }

    #[tokio::test]
    async fn create_uses_type_specific_collection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/nifi-api/process-groups/pg-1/output-ports")
            .match_body(Matcher::PartialJson(json!({"component": {"type": "OUTPUT_PORT"}})))
            .with_status(201)
            .with_body(port_json("o-1", "OUTPUT_PORT", "STOPPED", 1).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server);
        let port = Port::new(PortComponent {
            parent_group_id: "pg-1".to_string(),
            name: "egress".to_string(),
            port_type: PortType::OutputPort,
            ..Default::default()
        });

        let created = assert_ok!(client.ports(PortType::OutputPort).create(&port).await);
        assert_eq!(created.component.id, "o-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn set_state_polls_until_converged() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/nifi-api/output-ports/o-1")
            .match_body(Matcher::PartialJson(json!({"component": {"state": "RUNNING"}})))
            .with_body(port_json("o-1", "OUTPUT_PORT", "STOPPED", 2).to_string())
            .create_async()
            .await;
        let still_stopped = server
            .mock("GET", "/nifi-api/output-ports/o-1")
            .with_body(port_json("o-1", "OUTPUT_PORT", "STOPPED", 2).to_string())
            .expect(1)
            .create_async()
            .await;
        let _running = server
            .mock("GET", "/nifi-api/output-ports/o-1")
            .with_body(port_json("o-1", "OUTPUT_PORT", "RUNNING", 2).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server);
        let port: Port =
            serde_json::from_value(port_json("o-1", "OUTPUT_PORT", "STOPPED", 1)).unwrap();

        let started = assert_ok!(client.ports(PortType::OutputPort).start(&port).await);
        assert_eq!(started.component.state, Some(RunState::Running));
        put.assert_async().await;
        still_stopped.assert_async().await;
    }

    #[tokio::test]
    async fn conflicting_state_change_is_not_fatal() {
        let mut server = Server::new_async().await;
        let _put = server
            .mock("PUT", "/nifi-api/input-ports/i-1")
            .with_status(409)
            .with_body("port is already stopped")
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/nifi-api/input-ports/i-1")
            .with_body(port_json("i-1", "INPUT_PORT", "STOPPED", 3).to_string())
            .create_async()
            .await;

        let client = create_test_client(&server);
        let port: Port =
            serde_json::from_value(port_json("i-1", "INPUT_PORT", "RUNNING", 3)).unwrap();

        let stopped = assert_ok!(client.ports(PortType::InputPort).stop(&port).await);
        assert_eq!(stopped.component.state, Some(RunState::Stopped));
    }

    #[tokio::test]
    async fn convergence_timeout_is_not_fatal() {
        let mut server = Server::new_async().await;
        let _put = server
            .mock("PUT", "/nifi-api/input-ports/i-1")
            .with_body(port_json("i-1", "INPUT_PORT", "STOPPED", 3).to_string())
            .create_async()
            .await;
        let get = server
            .mock("GET", "/nifi-api/input-ports/i-1")
            .with_body(port_json("i-1", "INPUT_PORT", "STOPPED", 3).to_string())
            .expect(6)
            .create_async()
            .await;

        let client = create_test_client(&server);
        let port: Port =
            serde_json::from_value(port_json("i-1", "INPUT_PORT", "STOPPED", 2)).unwrap();

        let result = assert_ok!(client.ports(PortType::InputPort).start(&port).await);
        assert_eq!(result.component.state, Some(RunState::Stopped));
        get.assert_async().await;
    }
}
