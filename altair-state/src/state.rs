//! State file structures for persisting graph snapshots

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use altair_core::graph::ResourceGraph;
use altair_core::resource::{Resource, ResourceId, State, Value};

/// A snapshot of a synthesized resource graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Snapshot format version
    pub version: u32,
    /// Monotonically increasing number for each snapshot write
    pub serial: u64,
    /// Unique identifier for this snapshot lineage (prevents accidental
    /// overwrites with an unrelated stack's snapshot)
    pub lineage: String,
    /// Version of Altair that last wrote this snapshot
    pub altair_version: String,
    /// Fingerprint of the graph the snapshot was taken from
    pub fingerprint: Option<String>,
    /// All declared resources at snapshot time
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            altair_version: env!("CARGO_PKG_VERSION").to_string(),
            fingerprint: None,
            resources: Vec::new(),
        }
    }

    /// Snapshot a synthesized graph, keeping this file's lineage and serial
    pub fn record_graph(&mut self, graph: &ResourceGraph, provider: &str) {
        self.fingerprint = Some(format!("{:016x}", graph.fingerprint()));
        self.resources = graph
            .iter()
            .map(|entry| ResourceState::from_resource(&entry.binding, &entry.resource, provider))
            .collect();
    }

    /// Increment serial and stamp the current Altair version
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.altair_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by binding name
    pub fn find_resource(&self, binding: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.binding == binding)
    }

    /// Current states keyed by resource id, as the differ consumes them
    pub fn to_current_states(&self) -> HashMap<ResourceId, State> {
        self.resources
            .iter()
            .map(|r| {
                let id = ResourceId::new(r.resource_type.clone(), r.name.clone());
                let attributes = r
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), json_to_value(v)))
                    .collect();
                (id.clone(), State::existing(id, attributes))
            })
            .collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// One declared resource as recorded in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Graph binding name
    pub binding: String,
    /// Resource type (e.g., "vpc", "rds.db_instance")
    pub resource_type: String,
    /// Resource name
    pub name: String,
    /// Engine name (e.g., "aws")
    pub provider: String,
    /// All attributes of the resource as JSON values
    pub attributes: HashMap<String, serde_json::Value>,
    /// Whether this resource is a data source
    #[serde(default)]
    pub read_only: bool,
}

impl ResourceState {
    /// Record a declared resource
    pub fn from_resource(binding: &str, resource: &Resource, provider: &str) -> Self {
        Self {
            binding: binding.to_string(),
            resource_type: resource.id.resource_type.clone(),
            name: resource.id.name.clone(),
            provider: provider.to_string(),
            attributes: resource
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
            read_only: resource.read_only,
        }
    }
}

/// Flatten a core Value into JSON. References are rendered as
/// "${binding.attribute}" strings so the snapshot is self-contained.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let mut object = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                object.insert(key.clone(), value_to_json(&map[key]));
            }
            serde_json::Value::Object(object)
        }
        Value::Ref(binding, attr) => serde_json::Value::String(format!("${{{}.{}}}", binding, attr)),
    }
}

/// Inverse of `value_to_json`
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::String(s) => {
            if let Some(inner) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
                && let Some((binding, attr)) = inner.split_once('.')
            {
                return Value::Ref(binding.to_string(), attr.to_string());
            }
            Value::String(s.clone())
        }
        serde_json::Value::Number(n) => Value::Int(n.as_i64().unwrap_or_default()),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(object) => Value::Map(
            object
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
        serde_json::Value::Null => Value::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph
            .declare(
                "vpc",
                Resource::new("vpc", "main")
                    .with_attribute("cidr_block", Value::string("10.0.0.0/16")),
            )
            .unwrap();
        graph
            .declare(
                "admin_sg",
                Resource::new("security_group", "admin")
                    .with_attribute("vpc_id", Value::reference("vpc", "id")),
            )
            .unwrap();
        graph
    }

    #[test]
    fn new_state_file() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn increment_serial_keeps_lineage() {
        let mut state = StateFile::new();
        let lineage = state.lineage.clone();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
        assert_eq!(state.lineage, lineage);
    }

    #[test]
    fn record_graph_captures_resources_and_fingerprint() {
        let graph = sample_graph();
        let mut state = StateFile::new();
        state.record_graph(&graph, "aws");

        assert_eq!(state.resources.len(), 2);
        assert_eq!(
            state.fingerprint,
            Some(format!("{:016x}", graph.fingerprint()))
        );

        let sg = state.find_resource("admin_sg").unwrap();
        assert_eq!(sg.provider, "aws");
        assert_eq!(
            sg.attributes.get("vpc_id"),
            Some(&serde_json::json!("${vpc.id}"))
        );
    }

    #[test]
    fn current_states_round_trip_values() {
        let graph = sample_graph();
        let mut state = StateFile::new();
        state.record_graph(&graph, "aws");

        let current = state.to_current_states();
        let sg = current
            .get(&ResourceId::new("security_group", "admin"))
            .unwrap();
        assert!(sg.exists);
        assert_eq!(
            sg.attributes.get("vpc_id"),
            Some(&Value::reference("vpc", "id"))
        );
    }

    #[test]
    fn value_json_round_trip() {
        let values = [
            Value::string("plain"),
            Value::Int(20),
            Value::Bool(true),
            Value::reference("vpc", "id"),
            Value::List(vec![Value::reference("a", "id"), Value::Int(5)]),
        ];
        for value in values {
            assert_eq!(json_to_value(&value_to_json(&value)), value);
        }
    }

    #[test]
    fn dollar_string_without_dot_stays_a_string() {
        let json = serde_json::json!("${nodot}");
        assert_eq!(json_to_value(&json), Value::string("${nodot}"));
    }

    #[test]
    fn serialization_round_trip() {
        let mut state = StateFile::new();
        state.record_graph(&sample_graph(), "aws");
        state.increment_serial();

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.serial, state.serial);
        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.fingerprint, state.fingerprint);
        assert_eq!(deserialized.resources.len(), 2);
    }
}
