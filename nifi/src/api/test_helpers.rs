//! Test helpers for the NiFi API

use std::time::Duration;

use serde_json::{json, Value};

use super::poll::PollPolicy;
use super::transport::ClientConfig;
use super::Client;

/// Client pointed at a mock server, with polling shrunk to milliseconds.
pub fn create_test_client(server: &mockito::ServerGuard) -> Client {
    let config = ClientConfig {
        drain_poll: PollPolicy::fixed(Duration::from_millis(1), 10),
        port_poll: PollPolicy::fixed(Duration::from_millis(1), 5),
        ..Default::default()
    };
    Client::with_config(&server.host_with_port(), "nifi-api", config).unwrap()
}

pub fn processor_json(id: &str, state: &str, version: i64) -> Value {
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "name": "generate_flowfile",
            "type": "org.apache.nifi.processors.standard.GenerateFlowFile",
            "position": {"x": 0.0, "y": 0.0},
            "state": state,
            "config": {
                "schedulingStrategy": "TIMER_DRIVEN",
                "schedulingPeriod": "0 sec",
                "concurrentlySchedulableTaskCount": 1,
                "properties": {"File Size": "0B", "Custom Text": null}
            },
            "relationships": [{"name": "success", "autoTerminate": false}]
        }
    })
}

pub fn port_json(id: &str, port_type: &str, state: &str, version: i64) -> Value {
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "name": "ingress",
            "type": port_type,
            "comments": "",
            "position": {"x": 0.0, "y": 0.0},
            "state": state
        }
    })
}

pub fn connection_json(id: &str, relationships: &[&str], version: i64) -> Value {
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "source": {"type": "PROCESSOR", "id": "src", "groupId": "pg-1"},
            "destination": {"type": "PROCESSOR", "id": "dst", "groupId": "pg-1"},
            "selectedRelationships": relationships,
            "bends": [],
            "backPressureDataSizeThreshold": "1 GB",
            "backPressureObjectThreshold": 10000
        }
    })
}

pub fn controller_service_json(id: &str, state: &str, version: i64) -> Value {
    json!({
        "revision": {"version": version},
        "component": {
            "id": id,
            "parentGroupId": "pg-1",
            "name": "pool",
            "type": "org.apache.nifi.dbcp.DBCPConnectionPool",
            "state": state,
            "properties": {"Max Total Connections": "8", "Validation query": null}
        }
    })
}
