//! RDS resource schema definitions

use altair_core::resource::Value;
use altair_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as aws_types;
use crate::validation;

/// Relational engine type
pub fn engine() -> AttributeType {
    AttributeType::Enum(vec![
        "postgres".to_string(),
        "mysql".to_string(),
        "mariadb".to_string(),
    ])
}

/// Database identifier type (instance identifiers, database names)
fn db_identifier() -> AttributeType {
    AttributeType::Custom {
        name: "DbIdentifier".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validation::validate_db_identifier(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Master user name type
fn master_username() -> AttributeType {
    AttributeType::Custom {
        name: "MasterUsername".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validation::validate_master_username(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Returns the schema for a DB subnet group
pub fn db_subnet_group_schema() -> ResourceSchema {
    ResourceSchema::new("rds.db_subnet_group")
        .with_description("A group of subnets an RDS instance may occupy")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Subnet group name"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_description("Description of the subnet group"),
        )
        .attribute(
            AttributeSchema::new(
                "subnet_ids",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required()
            .with_description("Subnets the database may be placed in"),
        )
}

/// Returns the schema for an RDS database instance
///
/// Credentials are never embedded: `master_username` names the user and
/// `manage_master_user_password` instructs the engine to generate and
/// store the password in its secret store.
pub fn db_instance_schema() -> ResourceSchema {
    ResourceSchema::new("rds.db_instance")
        .with_description("A managed relational database instance")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Instance identifier"),
        )
        .attribute(
            AttributeSchema::new("engine", engine())
                .required()
                .with_description("Relational engine"),
        )
        .attribute(
            AttributeSchema::new("engine_version", AttributeType::String)
                .required()
                .with_description("Engine major version (e.g., 14)"),
        )
        .attribute(
            AttributeSchema::new("instance_class", aws_types::db_instance_class())
                .required()
                .with_description("Instance class (e.g., db.t3.micro)"),
        )
        .attribute(
            AttributeSchema::new("allocated_storage", types::positive_int())
                .required()
                .with_description("Initial storage in GiB"),
        )
        .attribute(
            AttributeSchema::new("max_allocated_storage", types::positive_int())
                .with_description("Storage autoscaling upper bound in GiB"),
        )
        .attribute(
            AttributeSchema::new("db_name", db_identifier())
                .with_description("Name of the initial database"),
        )
        .attribute(
            AttributeSchema::new("master_username", master_username())
                .required()
                .with_description("Master user name"),
        )
        .attribute(
            AttributeSchema::new("manage_master_user_password", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description("Generate and store the master password externally"),
        )
        .attribute(
            AttributeSchema::new("db_subnet_group", AttributeType::String)
                .required()
                .with_description("Subnet group placing the instance"),
        )
        .attribute(
            AttributeSchema::new(
                "security_group_ids",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required()
            .with_description("Security groups attached to the instance"),
        )
        .attribute(
            AttributeSchema::new("publicly_accessible", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Whether the instance gets a public endpoint"),
        )
}

/// Returns all RDS-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![db_subnet_group_schema(), db_instance_schema()]
}
