//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use mockito::ServerGuard;
use nifi::api::poll::PollPolicy;
use nifi::api::ClientConfig;
use nifi::schema::ResourceData;
use nifi::{NifiProvider, ProviderConfig};
use serde_json::{json, Value};

/// Provider configured against a mock server with millisecond polling.
pub fn provider(server: &ServerGuard) -> NifiProvider {
    let config = ProviderConfig {
        host: server.host_with_port(),
        api_path: "nifi-api".to_string(),
        admin_cert: None,
        admin_key: None,
    };
    let client_config = ClientConfig {
        drain_poll: PollPolicy::fixed(Duration::from_millis(1), 10),
        port_poll: PollPolicy::fixed(Duration::from_millis(1), 5),
        ..Default::default()
    };

    let mut provider = NifiProvider::new();
    provider.configure_with(&config, client_config).unwrap();
    provider
}

pub fn tracked(id: &str, value: Value) -> ResourceData {
    ResourceData::from_value(value).unwrap().with_id(id)
}

pub fn processor(id: &str, state: &str, version: i64, auto_terminated: &[&str]) -> String {
    let relationships: Vec<Value> = ["success", "failure"]
        .iter()
        .map(|name| json!({"name": name, "autoTerminate": auto_terminated.contains(name)}))
        .collect();
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "name": id,
            "type": "org.apache.nifi.processors.standard.LogAttribute",
            "position": {"x": 0.0, "y": 0.0},
            "state": state,
            "config": {
                "schedulingStrategy": "TIMER_DRIVEN",
                "schedulingPeriod": "0 sec",
                "concurrentlySchedulableTaskCount": 1,
                "properties": {}
            },
            "relationships": relationships
        }
    })
    .to_string()
}

pub fn connection(
    id: &str,
    source: &str,
    destination: &str,
    relationships: &[&str],
    version: i64,
) -> Value {
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "source": {"type": "PROCESSOR", "id": source, "groupId": "pg-1"},
            "destination": {"type": "PROCESSOR", "id": destination, "groupId": "pg-1"},
            "selectedRelationships": relationships,
            "backPressureDataSizeThreshold": "1 GB",
            "backPressureObjectThreshold": 10000
        }
    })
}

pub fn declared_processor(auto_terminated: &[&str]) -> Value {
    json!({
        "component": [{
            "parent_group_id": "pg-1",
            "name": "p-1",
            "type": "org.apache.nifi.processors.standard.LogAttribute",
            "config": [{"auto_terminated_relationships": auto_terminated}]
        }]
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
