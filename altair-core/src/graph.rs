//! Graph - Ordered resource graph built by a stack definition
//!
//! A `ResourceGraph` is the synthesized desired state: declarations in the
//! order the stack made them, with every reference pointing at an already
//! declared binding. The provisioning engine derives its dependency order
//! from that structure.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::resource::{Resource, Value};

/// Error raised while declaring resources into a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Binding '{0}' is already declared")]
    DuplicateBinding(String),

    #[error(
        "Resource '{binding}' references undeclared binding '{target}' (in attribute '{used_in}')"
    )]
    UnknownReference {
        binding: String,
        target: String,
        used_in: String,
    },

    #[error("Resource '{0}' references itself")]
    SelfReference(String),
}

/// One declared resource with its graph binding name
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEntry {
    /// Binding name other declarations use to reference this resource
    pub binding: String,
    pub resource: Resource,
}

/// Dependency between two declared resources
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Target resource binding name
    pub target: String,
    /// Referenced attribute (e.g., "id")
    pub attribute: String,
    /// Where this reference is used (e.g., "security_group_id")
    pub used_in: String,
}

/// The synthesized desired-state resource graph
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    entries: Vec<GraphEntry>,
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource under a binding name.
    ///
    /// Declaration order is significant: every `Value::Ref` in the resource
    /// must point at a binding declared earlier, so the graph can never
    /// contain a forward reference or a cycle.
    pub fn declare(
        &mut self,
        binding: impl Into<String>,
        resource: Resource,
    ) -> Result<(), GraphError> {
        let binding = binding.into();

        if self.index.contains_key(&binding) {
            return Err(GraphError::DuplicateBinding(binding));
        }

        for (attr, value) in &resource.attributes {
            self.check_references(&binding, attr, value)?;
        }

        self.index.insert(binding.clone(), self.entries.len());
        self.entries.push(GraphEntry { binding, resource });
        Ok(())
    }

    fn check_references(
        &self,
        binding: &str,
        used_in: &str,
        value: &Value,
    ) -> Result<(), GraphError> {
        match value {
            Value::Ref(target, _) => {
                if target == binding {
                    return Err(GraphError::SelfReference(binding.to_string()));
                }
                if !self.index.contains_key(target) {
                    return Err(GraphError::UnknownReference {
                        binding: binding.to_string(),
                        target: target.clone(),
                        used_in: used_in.to_string(),
                    });
                }
                Ok(())
            }
            Value::List(items) => {
                for item in items {
                    self.check_references(binding, used_in, item)?;
                }
                Ok(())
            }
            Value::Map(map) => {
                for v in map.values() {
                    self.check_references(binding, used_in, v)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &GraphEntry> {
        self.entries.iter()
    }

    pub fn get(&self, binding: &str) -> Option<&GraphEntry> {
        self.index.get(binding).map(|i| &self.entries[*i])
    }

    /// All entries of a given resource type, in declaration order
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&GraphEntry> {
        self.entries
            .iter()
            .filter(|e| e.resource.id.resource_type == resource_type)
            .collect()
    }

    /// Desired resources in declaration order (input to the differ)
    pub fn resources(&self) -> Vec<Resource> {
        self.entries.iter().map(|e| e.resource.clone()).collect()
    }

    /// Extract the dependency edges encoded by references
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for entry in &self.entries {
            for (attr, value) in &entry.resource.attributes {
                collect_dependencies(&entry.binding, attr, value, &mut graph);
            }
        }
        graph
    }

    /// Canonical fingerprint of the graph.
    ///
    /// Hashes bindings and attributes in a stable order so two synthesis
    /// runs with unchanged inputs produce the same value.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for entry in &self.entries {
            entry.binding.hash(&mut hasher);
            entry.resource.id.resource_type.hash(&mut hasher);
            entry.resource.id.name.hash(&mut hasher);
            entry.resource.read_only.hash(&mut hasher);

            let mut keys: Vec<&String> = entry.resource.attributes.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(&mut hasher);
                hash_value(&entry.resource.attributes[key], &mut hasher);
            }
        }
        hasher.finish()
    }
}

fn hash_value(value: &Value, hasher: &mut DefaultHasher) {
    match value {
        Value::String(s) => {
            0u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Int(n) => {
            1u8.hash(hasher);
            n.hash(hasher);
        }
        Value::Bool(b) => {
            2u8.hash(hasher);
            b.hash(hasher);
        }
        Value::List(items) => {
            3u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Map(map) => {
            4u8.hash(hasher);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(hasher);
                hash_value(&map[key], hasher);
            }
        }
        Value::Ref(binding, attr) => {
            5u8.hash(hasher);
            binding.hash(hasher);
            attr.hash(hasher);
        }
    }
}

fn collect_dependencies(binding: &str, used_in: &str, value: &Value, graph: &mut DependencyGraph) {
    match value {
        Value::Ref(target, attribute) => {
            graph.add_edge(
                binding.to_string(),
                Dependency {
                    target: target.clone(),
                    attribute: attribute.clone(),
                    used_in: used_in.to_string(),
                },
            );
        }
        Value::List(items) => {
            for item in items {
                collect_dependencies(binding, used_in, item, graph);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_dependencies(binding, used_in, v, graph);
            }
        }
        _ => {}
    }
}

/// Dependency edges between declared resources
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Resource binding name -> list of dependencies
    pub edges: HashMap<String, Vec<Dependency>>,
    /// Reverse edges: target -> list of resources that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: String, dependency: Dependency) {
        let target = dependency.target.clone();
        self.edges.entry(from.clone()).or_default().push(dependency);
        self.reverse_edges.entry(target).or_default().push(from);
    }

    /// Get direct dependencies of a resource
    pub fn dependencies_of(&self, resource: &str) -> &[Dependency] {
        self.edges.get(resource).map_or(&[], |v| v.as_slice())
    }

    /// Get resources that depend on this resource
    pub fn dependents_of(&self, resource: &str) -> &[String] {
        self.reverse_edges
            .get(resource)
            .map_or(&[], |v| v.as_slice())
    }

    /// Check if the graph has any cycles.
    ///
    /// `ResourceGraph::declare` cannot produce one; this guards graphs
    /// assembled by other means.
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node in self.edges.keys() {
            if self.has_cycle_util(node, &mut visited, &mut rec_stack) {
                return true;
            }
        }
        false
    }

    fn has_cycle_util(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
    ) -> bool {
        if rec_stack.contains(node) {
            return true;
        }
        if visited.contains(node) {
            return false;
        }

        visited.insert(node.to_string());
        rec_stack.insert(node.to_string());

        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                if self.has_cycle_util(&dep.target, visited, rec_stack) {
                    return true;
                }
            }
        }

        rec_stack.remove(node);
        false
    }
}
