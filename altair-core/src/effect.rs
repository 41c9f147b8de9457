//! Effect - A single provisioning action as a value
//!
//! Effects are descriptions of side effects; nothing happens until an
//! engine interprets them.

use crate::resource::{Resource, ResourceId, State};

/// One provisioning action
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Resolve a data source or refresh current state
    Read(ResourceId),
    /// Create a resource that does not exist yet
    Create(Resource),
    /// Update an existing resource to the desired state
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete a resource no longer declared
    Delete(ResourceId),
}

impl Effect {
    /// Whether this effect mutates infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    /// The resource this effect targets
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) | Effect::Delete(id) => id,
            Effect::Create(resource) => &resource.id,
            Effect::Update { id, .. } => id,
        }
    }
}
