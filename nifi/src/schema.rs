//! Bridge between declarative resource state and entity structs
//!
//! A resource instance is an id plus a JSON attribute tree. Nested blocks
//! (`component`, `position`, `bends`, ...) are lists of objects, so
//! cardinality has to be checked when reading them.

use serde_json::{json, Map, Value};

use crate::api::common::{Position, Properties, Revision};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    values: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds resource data from a JSON object of attributes.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self {
                id: String::new(),
                values,
            }),
            other => Err(Error::Schema(format!(
                "resource attributes must be an object, got {}",
                other
            ))),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Marks the resource as gone.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Top-level attributes viewed as a block.
    pub fn root(&self) -> Block<'_> {
        Block {
            name: "resource",
            values: &self.values,
        }
    }

    /// The single required `component` block.
    pub fn component(&self) -> Result<Block<'_>> {
        self.root().single("component")
    }

    pub fn set_component(&mut self, component: Value) {
        self.set("component", Value::Array(vec![component]));
    }

    pub fn set_revision(&mut self, revision: Revision) {
        self.set("revision", json!([{"version": revision.version}]));
    }
}

/// Read-only view of one nested block.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    name: &'a str,
    values: &'a Map<String, Value>,
}

impl<'a> Block<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    /// Non-empty string attribute.
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str> {
        self.str(key).ok_or_else(|| {
            Error::Schema(format!("{}.{} is required", self.name, key))
        })
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.str(key).unwrap_or(default).to_string()
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// List (or set) of strings; missing attributes read as empty.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String map such as processor properties.
    pub fn properties(&self, key: &str) -> Properties {
        self.get(key)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All nested blocks named `key`.
    pub fn blocks(&self, key: &'a str) -> Result<Vec<Block<'a>>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Object(values) => Ok(Block { name: key, values }),
                    _ => Err(Error::Schema(format!(
                        "{}.{} must contain blocks",
                        self.name, key
                    ))),
                })
                .collect(),
            Some(Value::Object(values)) => Ok(vec![Block { name: key, values }]),
            Some(_) => Err(Error::Schema(format!(
                "{}.{} must be a block",
                self.name, key
            ))),
        }
    }

    /// Exactly one nested block named `key`.
    pub fn single(&self, key: &'a str) -> Result<Block<'a>> {
        let mut blocks = self.blocks(key)?;
        if blocks.len() != 1 {
            return Err(Error::Schema(format!(
                "exactly one {}.{} block is required, found {}",
                self.name,
                key,
                blocks.len()
            )));
        }
        Ok(blocks.remove(0))
    }

    /// At most one nested block named `key`.
    pub fn optional(&self, key: &'a str) -> Result<Option<Block<'a>>> {
        let mut blocks = self.blocks(key)?;
        match blocks.len() {
            0 => Ok(None),
            1 => Ok(Some(blocks.remove(0))),
            n => Err(Error::Schema(format!(
                "at most one {}.{} block is allowed, found {}",
                self.name, key, n
            ))),
        }
    }

    /// Optional `position` block; absent means the origin.
    pub fn position(&self) -> Result<Position> {
        Ok(self
            .optional("position")?
            .map(|block| block.as_position())
            .unwrap_or_default())
    }

    pub fn as_position(&self) -> Position {
        Position {
            x: self.f64("x").unwrap_or_default(),
            y: self.f64("y").unwrap_or_default(),
        }
    }
}

/// Observed `position` block.
pub fn position_value(position: &Position) -> Value {
    json!([{"x": position.x, "y": position.y}])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: Value) -> ResourceData {
        ResourceData::from_value(value).unwrap()
    }

    #[test]
    fn component_requires_exactly_one_block() {
        let missing = data(json!({"parent_group_id": "pg-1"}));
        assert!(matches!(missing.component(), Err(Error::Schema(_))));

        let doubled = data(json!({"component": [{"name": "a"}, {"name": "b"}]}));
        match doubled.component() {
            Err(Error::Schema(message)) => assert!(message.contains("found 2")),
            other => panic!("Expected Schema error, got {:?}", other),
        }

        let single = data(json!({"component": [{"name": "a"}]}));
        assert_eq!(single.component().unwrap().str("name"), Some("a"));
    }

    #[test]
    fn empty_strings_read_as_absent() {
        let resource = data(json!({"component": [{"name": "", "type": "X"}]}));
        let component = resource.component().unwrap();

        assert_eq!(component.str("name"), None);
        assert!(component.required_str("name").is_err());
        assert_eq!(component.string_or("name", "fallback"), "fallback");
        assert_eq!(component.required_str("type").unwrap(), "X");
    }

    #[test]
    fn position_defaults_to_origin() {
        let resource = data(json!({"component": [{"position": [{"x": 1.5, "y": -2.0}]}]}));
        let position = resource.component().unwrap().position().unwrap();
        assert_eq!(position, Position { x: 1.5, y: -2.0 });

        let resource = data(json!({"component": [{}]}));
        assert_eq!(
            resource.component().unwrap().position().unwrap(),
            Position::default()
        );
    }

    #[test]
    fn strings_and_properties_tolerate_missing_attributes() {
        let resource = data(json!({"component": [{
            "auto_terminated_relationships": ["success", "failure"],
            "properties": {"File Size": "0B"}
        }]}));
        let component = resource.component().unwrap();

        assert_eq!(
            component.strings("auto_terminated_relationships"),
            vec!["success", "failure"]
        );
        assert!(component.strings("selected_relationships").is_empty());
        assert_eq!(component.properties("properties").len(), 1);
        assert!(component.properties("missing").is_empty());
    }

    #[test]
    fn id_lifecycle() {
        let mut resource = ResourceData::new().with_id("p-1");
        assert!(resource.has_id());
        resource.clear_id();
        assert!(!resource.has_id());
        resource.set_id("p-2");
        assert_eq!(resource.id(), "p-2");
    }

    #[test]
    fn non_object_attributes_are_rejected() {
        assert!(ResourceData::from_value(json!(["component"])).is_err());
    }
}
