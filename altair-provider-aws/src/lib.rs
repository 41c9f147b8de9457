//! Altair AWS schemas
//!
//! Typed attribute schemas for the AWS resource kinds a stack definition
//! can declare. The schemas validate the synthesized graph before it is
//! handed to the provisioning engine; they perform no API calls.

pub mod ec2;
pub mod rds;
pub mod types;
pub mod validation;
pub mod vpc;

use std::collections::HashMap;

use altair_core::schema::ResourceSchema;

/// Engine name the schemas belong to
pub const PROVIDER_NAME: &str = "aws";

/// All schemas this provider defines
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = vpc::schemas();
    schemas.extend(ec2::schemas());
    schemas.extend(rds::schemas());
    schemas
}

/// Schemas keyed by resource type
pub fn schema_map() -> HashMap<String, ResourceSchema> {
    all_schemas()
        .into_iter()
        .map(|s| (s.resource_type.clone(), s))
        .collect()
}

/// Look up the schema for a resource type
pub fn schema_for(resource_type: &str) -> Option<ResourceSchema> {
    all_schemas()
        .into_iter()
        .find(|s| s.resource_type == resource_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_registry_has_no_duplicates() {
        let schemas = all_schemas();
        let map = schema_map();
        assert_eq!(schemas.len(), map.len());
    }

    #[test]
    fn known_types_resolve() {
        for ty in [
            "vpc",
            "subnet",
            "security_group",
            "security_group.ingress_rule",
            "ec2.instance",
            "rds.db_instance",
        ] {
            assert!(schema_for(ty).is_some(), "missing schema for {}", ty);
        }
        assert!(schema_for("gcs_bucket").is_none());
    }
}
