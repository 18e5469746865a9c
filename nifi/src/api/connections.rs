//! Connection API implementation, including queue purging

use serde::{Deserialize, Serialize};

use super::common::{version_query, Entity, Position};
use super::Client;
use crate::error::{EntityKind, Error, Result};

pub type Connection = Entity<ConnectionComponent>;

pub const DEFAULT_BACK_PRESSURE_DATA_SIZE: &str = "1 GB";
pub const DEFAULT_BACK_PRESSURE_OBJECTS: i64 = 10000;

/// One end of a connection.
///
/// `hand_type` stays a plain string on the wire so connections to endpoint
/// kinds this provider does not manage can still be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHand {
    #[serde(rename = "type")]
    pub hand_type: String,
    pub id: String,
    #[serde(default)]
    pub group_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub parent_group_id: String,
    pub source: ConnectionHand,
    pub destination: ConnectionHand,
    #[serde(default)]
    pub selected_relationships: Vec<String>,
    #[serde(default)]
    pub bends: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_pressure_data_size_threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_pressure_object_threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DropRequestEntity {
    drop_request: DropRequest,
}

#[derive(Debug, Deserialize)]
struct DropRequest {
    id: String,
    #[serde(default)]
    finished: bool,
}

/// Connections API for connection operations
#[derive(Clone, Copy)]
pub struct ConnectionsApi<'a> {
    client: &'a Client,
}

impl<'a> ConnectionsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /process-groups/{parentId}/connections
    pub async fn create(&self, connection: &Connection) -> Result<Connection> {
        let path = format!(
            "/process-groups/{}/connections",
            connection.component.parent_group_id
        );
        self.client
            .post(&path, connection)
            .await
            .map_err(|e| Error::create(EntityKind::Connection, e))
    }

    /// GET /connections/{id}
    pub async fn get(&self, id: &str) -> Result<Connection> {
        self.client
            .get(&format!("/connections/{}", id))
            .await
            .map_err(|e| Error::read(EntityKind::Connection, id, e))
    }

    /// GET /process-groups/{id}/connections
    pub async fn list_in_group(&self, group_id: &str) -> Result<Vec<Connection>> {
        let list: ConnectionList = self
            .client
            .get(&format!("/process-groups/{}/connections", group_id))
            .await
            .map_err(|e| Error::read(EntityKind::ProcessGroup, group_id, e))?;
        Ok(list.connections)
    }

    /// PUT /connections/{id}
    pub async fn update(&self, connection: &Connection) -> Result<Connection> {
        let id = &connection.component.id;
        self.client
            .put(&format!("/connections/{}", id), connection)
            .await
            .map_err(|e| Error::update(EntityKind::Connection, id, e))
    }

    /// DELETE /connections/{id}?version=N
    pub async fn delete(&self, connection: &Connection) -> Result<()> {
        let id = &connection.component.id;
        self.client
            .delete(&format!(
                "/connections/{}{}",
                id,
                version_query(&connection.revision)
            ))
            .await
            .map_err(|e| Error::delete(EntityKind::Connection, id, e))
    }

    /// Purge the connection's queue.
    ///
    /// A failure to submit the drop request is an error. Polling exhaustion
    /// follows the client's drain policy, and the drop request is always
    /// removed afterwards.
    pub async fn drop_data(&self, connection: &Connection) -> Result<()> {
        let id = connection.component.id.as_str();
        let path = format!("/flowfile-queues/{}/drop-requests", id);

        let submitted: DropRequestEntity = self
            .client
            .post_empty(&path)
            .await
            .map_err(|e| Error::create(EntityKind::DropRequest, e))?;
        let drop_id = submitted.drop_request.id;
        let status_path = format!("{}/{}", path, drop_id);
        tracing::info!("Purging connection {} (drop request {})", id, drop_id);

        let drained = if submitted.drop_request.finished {
            Ok(true)
        } else {
            let client = self.client;
            let status_path = status_path.as_str();
            let drop_id = drop_id.as_str();
            self.client
                .drain_poll()
                .run("connection queue purge", |_| async move {
                    client
                        .get::<DropRequestEntity>(status_path)
                        .await
                        .map(|status| status.drop_request.finished)
                        .map_err(|e| Error::read(EntityKind::DropRequest, drop_id, e))
                })
                .await
        };

        if let Err(e) = self.client.delete(&status_path).await {
            tracing::warn!("Failed to remove drop request {}: {}", drop_id, e);
        }

        // Only a failing drain policy turns exhaustion into an error here;
        // failed status checks are retried by the poll loop.
        if drained? {
            tracing::debug!("Connection {} purged", id);
        } else {
            tracing::warn!("Failed to purge connection {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::poll::PollPolicy;
    use crate::api::test_helpers::{connection_json, create_test_client};
    use crate::api::transport::ClientConfig;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn drop_json(finished: bool) -> String {
        json!({"dropRequest": {"id": "drop-1", "finished": finished}}).to_string()
    }

    #[tokio::test]
    async fn list_in_group_unwraps_connections() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/nifi-api/process-groups/pg-1/connections")
            .with_body(
                json!({"connections": [
                    connection_json("c-1", &["success"], 1),
                    connection_json("c-2", &["failure"], 2)
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = create_test_client(&server);
        let connections = assert_ok!(client.connections().list_in_group("pg-1").await);

        assert_eq!(connections.len(), 2);
        assert_eq!(connections[1].component.selected_relationships, vec!["failure"]);
        assert_eq!(connections[0].component.source.hand_type, "PROCESSOR");
    }

    #[tokio::test]
    async fn drop_data_polls_until_finished_then_cleans_up() {
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", "/nifi-api/flowfile-queues/c-1/drop-requests")
            .match_header("content-type", Matcher::Missing)
            .with_status(202)
            .with_body(drop_json(false))
            .create_async()
            .await;
        let pending = server
            .mock("GET", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .with_body(drop_json(false))
            .expect(2)
            .create_async()
            .await;
        let finished = server
            .mock("GET", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .with_body(drop_json(true))
            .expect(1)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .with_body(drop_json(true))
            .create_async()
            .await;

        let client = create_test_client(&server);
        let connection: Connection =
            serde_json::from_value(connection_json("c-1", &["success"], 1)).unwrap();

        assert_ok!(client.connections().drop_data(&connection).await);

        submit.assert_async().await;
        pending.assert_async().await;
        finished.assert_async().await;
        cleanup.assert_async().await;
    }

    #[tokio::test]
    async fn drop_data_proceeds_when_purge_never_finishes() {
        let mut server = Server::new_async().await;
        let _submit = server
            .mock("POST", "/nifi-api/flowfile-queues/c-1/drop-requests")
            .with_body(drop_json(false))
            .create_async()
            .await;
        let status = server
            .mock("GET", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .with_body(drop_json(false))
            .expect(10)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .create_async()
            .await;

        let client = create_test_client(&server);
        let connection: Connection =
            serde_json::from_value(connection_json("c-1", &["success"], 1)).unwrap();

        assert_ok!(client.connections().drop_data(&connection).await);
        status.assert_async().await;
        cleanup.assert_async().await;
    }

    #[tokio::test]
    async fn drop_data_fails_when_submission_fails() {
        let mut server = Server::new_async().await;
        let _submit = server
            .mock("POST", "/nifi-api/flowfile-queues/c-1/drop-requests")
            .with_status(500)
            .create_async()
            .await;

        let client = create_test_client(&server);
        let connection: Connection =
            serde_json::from_value(connection_json("c-1", &["success"], 1)).unwrap();

        let result = client.connections().drop_data(&connection).await;
        assert!(matches!(
            result,
            Err(Error::CreateFailed {
                kind: EntityKind::DropRequest,
                ..
            })
        ));
    }

    #[test]
    fn unset_back_pressure_is_not_serialized() {
        let connection = Connection::new(ConnectionComponent {
            parent_group_id: "pg-1".to_string(),
            ..Default::default()
        });
        let body = serde_json::to_value(&connection).unwrap();
        assert!(body["component"].get("backPressureObjectThreshold").is_none());
    }

    #[tokio::test]
    async fn failing_drain_policy_reports_timeout_after_cleanup() {
        let mut server = Server::new_async().await;
        let _submit = server
            .mock("POST", "/nifi-api/flowfile-queues/c-1/drop-requests")
            .with_body(drop_json(false))
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", "/nifi-api/flowfile-queues/c-1/drop-requests/drop-1")
            .create_async()
            .await;

        let config = ClientConfig {
            drain_poll: PollPolicy::fixed(Duration::from_millis(1), 3).failing(),
            ..Default::default()
        };
        let client = Client::with_config(&server.host_with_port(), "nifi-api", config).unwrap();
        let connection: Connection =
            serde_json::from_value(connection_json("c-1", &["success"], 1)).unwrap();

        let result = client.connections().drop_data(&connection).await;
        assert!(matches!(result, Err(Error::ConvergenceTimeout { attempts: 3, .. })));
        cleanup.assert_async().await;
    }
}
