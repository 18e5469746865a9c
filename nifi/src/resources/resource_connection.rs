//! Connection resource implementation

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::connections::{
    Connection, ConnectionComponent, ConnectionHand, DEFAULT_BACK_PRESSURE_DATA_SIZE,
    DEFAULT_BACK_PRESSURE_OBJECTS,
};
use crate::api::lifecycle::{restore_all, start_all, stop_all, Endpoint, OnFailure};
use crate::api::Client;
use crate::error::Result;
use crate::provider_data::NifiProviderData;
use crate::resources::{found, tracked_id, Resource};
use crate::schema::{Block, ResourceData};

pub struct ConnectionResource {
    provider_data: NifiProviderData,
}

impl ConnectionResource {
    pub fn new(provider_data: NifiProviderData) -> Self {
        Self { provider_data }
    }

    fn client(&self) -> &Client {
        &self.provider_data.client
    }

    async fn update_locked(
        &self,
        data: &mut ResourceData,
        id: &str,
        declared: ConnectionComponent,
    ) -> Result<()> {
        let client = self.client();
        let Some(current) = found(data, client.connections().get(id).await)? else {
            return Ok(());
        };

        let stopped = stop_all(client, &endpoints(&current)?, OnFailure::Abort).await?;

        let desired = Connection {
            revision: current.revision,
            component: ConnectionComponent {
                id: id.to_string(),
                ..declared
            },
        };
        let updated = client.connections().update(&desired).await;

        restore_all(client, &stopped, OnFailure::Warn).await?;
        found(data, updated)?;
        Ok(())
    }

    async fn delete_locked(&self, data: &mut ResourceData, id: &str) -> Result<()> {
        let client = self.client();
        let Some(current) = found(data, client.connections().get(id).await)? else {
            return Ok(());
        };

        let stopped = stop_all(client, &endpoints(&current)?, OnFailure::Abort).await?;

        let deleted = purge_and_delete(client, &current).await;

        restore_all(client, &stopped, OnFailure::Warn).await?;
        if found(data, deleted)?.is_some() {
            tracing::info!("Connection {} deleted", id);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for ConnectionResource {
    fn type_name(&self) -> &str {
        "nifi_connection"
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let connection = Connection::new(connection_from(&data.component()?)?);
        let ends = endpoints(&connection)?;

        let created = self.client().connections().create(&connection).await?;
        tracing::info!("Connection {} created", created.component.id);
        data.set_id(created.component.id.clone());
        data.set("parent_group_id", created.component.parent_group_id.clone());

        start_all(self.client(), &ends, OnFailure::Warn).await?;
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let Some(connection) = found(data, self.client().connections().get(&id).await)? else {
            return Ok(());
        };

        data.set("parent_group_id", connection.component.parent_group_id.clone());
        data.set_revision(connection.revision);
        data.set_component(connection_to_value(&connection.component));
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let declared = connection_from(&data.component()?)?;
        {
            let _guard = self.client().exclusive().await;
            self.update_locked(data, &id, declared).await?;
        }
        if !data.has_id() {
            return Ok(());
        }
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = tracked_id(data)?;
        let _guard = self.client().exclusive().await;
        self.delete_locked(data, &id).await?;
        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &mut ResourceData) -> Result<bool> {
        let id = tracked_id(data)?;
        Ok(found(data, self.client().connections().get(&id).await)?.is_some())
    }
}

async fn purge_and_delete(client: &Client, connection: &Connection) -> Result<()> {
    client.connections().drop_data(connection).await?;
    // Draining bumps the revision.
    let fresh = client.connections().get(&connection.component.id).await?;
    client.connections().delete(&fresh).await
}

fn endpoints(connection: &Connection) -> Result<[Endpoint; 2]> {
    Ok([
        Endpoint::try_from(&connection.component.source)?,
        Endpoint::try_from(&connection.component.destination)?,
    ])
}

fn hand_from(block: &Block<'_>, parent_group_id: &str) -> Result<ConnectionHand> {
    let hand = ConnectionHand {
        hand_type: block.required_str("type")?.to_string(),
        id: block.required_str("id")?.to_string(),
        group_id: block.string_or("group_id", parent_group_id),
    };
    Endpoint::try_from(&hand)?;
    Ok(hand)
}

fn connection_from(component: &Block<'_>) -> Result<ConnectionComponent> {
    let parent_group_id = component.required_str("parent_group_id")?;
    let bends = component
        .blocks("bends")?
        .iter()
        .map(Block::as_position)
        .collect();

    Ok(ConnectionComponent {
        id: String::new(),
        parent_group_id: parent_group_id.to_string(),
        source: hand_from(&component.single("source")?, parent_group_id)?,
        destination: hand_from(&component.single("destination")?, parent_group_id)?,
        selected_relationships: component.strings("selected_relationships"),
        bends,
        back_pressure_data_size_threshold: Some(
            component.string_or(
                "back_pressure_data_size_threshold",
                DEFAULT_BACK_PRESSURE_DATA_SIZE,
            ),
        ),
        back_pressure_object_threshold: Some(
            component
                .i64("back_pressure_object_threshold")
                .unwrap_or(DEFAULT_BACK_PRESSURE_OBJECTS),
        ),
    })
}

fn hand_to_value(hand: &ConnectionHand) -> Value {
    json!([{
        "type": hand.hand_type,
        "id": hand.id,
        "group_id": hand.group_id,
    }])
}

fn connection_to_value(component: &ConnectionComponent) -> Value {
    let bends: Vec<Value> = component
        .bends
        .iter()
        .map(|bend| json!({"x": bend.x, "y": bend.y}))
        .collect();
    json!({
        "parent_group_id": component.parent_group_id,
        "source": hand_to_value(&component.source),
        "destination": hand_to_value(&component.destination),
        "selected_relationships": component.selected_relationships,
        "bends": bends,
        "back_pressure_data_size_threshold": component
            .back_pressure_data_size_threshold
            .as_deref()
            .unwrap_or(DEFAULT_BACK_PRESSURE_DATA_SIZE),
        "back_pressure_object_threshold": component
            .back_pressure_object_threshold
            .unwrap_or(DEFAULT_BACK_PRESSURE_OBJECTS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{connection_json, processor_json};
    use crate::error::Error;
    use crate::resources::test_support::{provider_data, resource_data};
    use mockito::{Matcher, Server};
    use tokio_test::{assert_err, assert_ok};

    fn desired(relationships: &[&str]) -> Value {
        json!({
            "component": [{
                "parent_group_id": "pg-1",
                "source": [{"type": "PROCESSOR", "id": "src"}],
                "destination": [{"type": "PROCESSOR", "id": "dst"}],
                "selected_relationships": relationships
            }]
        })
    }

    #[test]
    fn group_and_backpressure_defaults_are_filled() {
        let data = ResourceData::from_value(desired(&["success"])).unwrap();
        let component = connection_from(&data.component().unwrap()).unwrap();

        assert_eq!(component.source.group_id, "pg-1");
        assert_eq!(component.destination.group_id, "pg-1");
        assert_eq!(component.back_pressure_data_size_threshold.as_deref(), Some("1 GB"));
        assert_eq!(component.back_pressure_object_threshold, Some(10000));
        assert!(component.bends.is_empty());
    }

    #[test]
    fn unsupported_endpoint_type_is_rejected() {
        let data = ResourceData::from_value(json!({
            "component": [{
                "parent_group_id": "pg-1",
                "source": [{"type": "REMOTE_OUTPUT_PORT", "id": "r-1"}],
                "destination": [{"type": "PROCESSOR", "id": "dst"}]
            }]
        }))
        .unwrap();

        assert!(matches!(
            connection_from(&data.component().unwrap()),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn bends_are_read_in_order() {
        let data = ResourceData::from_value(json!({
            "component": [{
                "parent_group_id": "pg-1",
                "source": [{"type": "FUNNEL", "id": "f-1"}],
                "destination": [{"type": "FUNNEL", "id": "f-2"}],
                "bends": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}]
            }]
        }))
        .unwrap();
        let component = connection_from(&data.component().unwrap()).unwrap();

        assert_eq!(component.bends.len(), 2);
        assert_eq!(component.bends[1].x, 3.0);
    }

    #[tokio::test]
    async fn create_starts_both_endpoints() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/nifi-api/process-groups/pg-1/connections")
            .with_status(201)
            .with_body(connection_json("c-1", &["success"], 1).to_string())
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 1).to_string())
            .create_async()
            .await;
        let _src = server
            .mock("GET", "/nifi-api/processors/src")
            .with_body(processor_json("src", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let _dst = server
            .mock("GET", "/nifi-api/processors/dst")
            .with_body(processor_json("dst", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let start_src = server
            .mock("PUT", "/nifi-api/processors/src")
            .match_body(Matcher::PartialJson(json!({"component": {"state": "RUNNING"}})))
            .with_body(processor_json("src", "RUNNING", 2).to_string())
            .create_async()
            .await;
        let start_dst = server
            .mock("PUT", "/nifi-api/processors/dst")
            .match_body(Matcher::PartialJson(json!({"component": {"state": "RUNNING"}})))
            .with_body(processor_json("dst", "RUNNING", 2).to_string())
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = ResourceData::from_value(desired(&["success"])).unwrap();

        assert_ok!(resource.create(&mut data).await);
        assert_eq!(data.id(), "c-1");
        start_src.assert_async().await;
        start_dst.assert_async().await;
    }

    #[tokio::test]
    async fn failed_endpoint_start_does_not_fail_create() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/nifi-api/process-groups/pg-1/connections")
            .with_status(201)
            .with_body(connection_json("c-1", &["success"], 1).to_string())
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 1).to_string())
            .create_async()
            .await;
        let _processors = server
            .mock("GET", Matcher::Regex("^/nifi-api/processors/".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = ResourceData::from_value(desired(&["success"])).unwrap();

        assert_ok!(resource.create(&mut data).await);
        assert_eq!(data.id(), "c-1");
    }

    #[tokio::test]
    async fn update_restarts_only_previously_running_endpoints() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 2).to_string())
            .create_async()
            .await;
        let _src_running = server
            .mock("GET", "/nifi-api/processors/src")
            .with_body(processor_json("src", "RUNNING", 1).to_string())
            .expect(1)
            .create_async()
            .await;
        let _src_stopped = server
            .mock("GET", "/nifi-api/processors/src")
            .with_body(processor_json("src", "STOPPED", 2).to_string())
            .create_async()
            .await;
        let _dst = server
            .mock("GET", "/nifi-api/processors/dst")
            .with_body(processor_json("dst", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let stop_src = server
            .mock("PUT", "/nifi-api/processors/src")
            .match_body(Matcher::PartialJson(json!({"component": {"state": "STOPPED"}})))
            .with_body(processor_json("src", "STOPPED", 2).to_string())
            .create_async()
            .await;
        let start_src = server
            .mock("PUT", "/nifi-api/processors/src")
            .match_body(Matcher::PartialJson(json!({"component": {"state": "RUNNING"}})))
            .with_body(processor_json("src", "RUNNING", 3).to_string())
            .create_async()
            .await;
        let dst_put = server
            .mock("PUT", "/nifi-api/processors/dst")
            .expect(0)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/nifi-api/connections/c-1")
            .match_body(Matcher::PartialJson(json!({
                "revision": {"version": 2},
                "component": {"id": "c-1", "selectedRelationships": ["success", "failure"]}
            })))
            .with_body(connection_json("c-1", &["success", "failure"], 3).to_string())
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data("c-1", desired(&["success", "failure"]));

        assert_ok!(resource.update(&mut data).await);
        stop_src.assert_async().await;
        update.assert_async().await;
        start_src.assert_async().await;
        dst_put.assert_async().await;
    }

    #[tokio::test]
    async fn stale_revision_surfaces_as_conflict_after_restoring() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 2).to_string())
            .create_async()
            .await;
        let _src = server
            .mock("GET", "/nifi-api/processors/src")
            .with_body(processor_json("src", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let _dst = server
            .mock("GET", "/nifi-api/processors/dst")
            .with_body(processor_json("dst", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let _update = server
            .mock("PUT", "/nifi-api/connections/c-1")
            .with_status(409)
            .with_body("revision mismatch")
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data("c-1", desired(&["failure"]));

        let err = assert_err!(resource.update(&mut data).await);
        assert!(err.is_conflict());
        assert!(data.has_id());
    }

    #[tokio::test]
    async fn delete_drains_then_deletes_with_fresh_revision() {
        let mut server = Server::new_async().await;
        let _first = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 2).to_string())
            .expect(1)
            .create_async()
            .await;
        let _refetch = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 3).to_string())
            .create_async()
            .await;
        let _src = server
            .mock("GET", "/nifi-api/processors/src")
            .with_body(processor_json("src", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let _dst = server
            .mock("GET", "/nifi-api/processors/dst")
            .with_body(processor_json("dst", "STOPPED", 1).to_string())
            .create_async()
            .await;
        let drop = server
            .mock("POST", "/nifi-api/flowfile-queues/c-1/drop-requests")
            .with_body(json!({"dropRequest": {"id": "d-1", "finished": true}}).to_string())
            .create_async()
            .await;
        let _drop_cleanup = server
            .mock("DELETE", "/nifi-api/flowfile-queues/c-1/drop-requests/d-1")
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/nifi-api/connections/c-1")
            .match_query(Matcher::UrlEncoded("version".into(), "3".into()))
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data("c-1", desired(&["success"]));

        assert_ok!(resource.delete(&mut data).await);
        assert!(!data.has_id());
        drop.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn delete_of_missing_connection_succeeds() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_status(404)
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data("c-1", desired(&["success"]));

        assert_ok!(resource.delete(&mut data).await);
        assert!(!data.has_id());
    }

    #[tokio::test]
    async fn read_reports_observed_attributes() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/nifi-api/connections/c-1")
            .with_body(connection_json("c-1", &["success"], 4).to_string())
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data("c-1", desired(&["success"]));

        assert_ok!(resource.read(&mut data).await);
        let component = data.component().unwrap();
        assert_eq!(component.strings("selected_relationships"), vec!["success"]);
        assert_eq!(
            component.single("source").unwrap().str("id"),
            Some("src")
        );
        assert_eq!(data.get("revision"), Some(&json!([{"version": 4}])));
    }

    #[tokio::test]
    async fn invalid_update_leaves_running_endpoints_alone() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resource = ConnectionResource::new(provider_data(&server));
        let mut data = resource_data(
            "c-1",
            json!({
                "component": [{
                    "parent_group_id": "pg-1",
                    "source": [{"type": "PROCESSOR", "id": "src"}],
                    "selected_relationships": ["success"]
                }]
            }),
        );

        let err = assert_err!(resource.update(&mut data).await);
        assert!(matches!(err, Error::Schema(_)));
        get.assert_async().await;
        put.assert_async().await;
    }
}
