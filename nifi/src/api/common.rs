//! Common types and utilities for the NiFi REST API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Optimistic-concurrency token carried by every mutable entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Envelope shared by every mutable entity: `{revision, component}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity<C> {
    #[serde(default)]
    pub revision: Revision,
    pub component: C,
}

impl<C> Entity<C> {
    pub fn new(component: C) -> Self {
        Self {
            revision: Revision::default(),
            component,
        }
    }
}

/// Component body of a run-state transition.
#[derive(Debug, Clone, Serialize)]
pub struct StateComponent<'a, S> {
    pub id: &'a str,
    pub state: S,
}

/// `{revision, component:{id, state}}` body used by every state PUT.
pub fn state_update<S>(revision: Revision, id: &str, state: S) -> Entity<StateComponent<'_, S>> {
    Entity {
        revision,
        component: StateComponent { id, state },
    }
}

/// Property map as returned by the server; values may be explicit nulls.
pub type Properties = BTreeMap<String, Value>;

/// Removes properties the server reports as declared-but-unset.
///
/// Processor and controller service types enumerate every property they
/// support; the ones left unset come back as `null` and would otherwise show
/// up as drift against the declared configuration.
pub fn strip_null_properties(properties: &mut Properties) {
    properties.retain(|_, value| !value.is_null());
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Query string used by every DELETE: the current revision.
pub fn version_query(revision: &Revision) -> String {
    ApiQueryParams::new()
        .add("version", revision.version)
        .to_query_string()
}
