//! EC2 and IAM resource schema definitions

use altair_core::resource::Value;
use altair_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::types as aws_types;
use crate::validation;

/// Returns the schema for a machine image lookup
///
/// Declared read-only: the engine resolves the image id, nothing is
/// mutated.
pub fn machine_image_schema() -> ResourceSchema {
    ResourceSchema::new("ec2.machine_image")
        .with_description("A machine image lookup (data source)")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Lookup name (for identification)"),
        )
        .attribute(
            AttributeSchema::new("owner", AttributeType::String)
                .required()
                .with_description("Image owner alias or account (e.g., amazon)"),
        )
        .attribute(
            AttributeSchema::new("name_pattern", AttributeType::String)
                .required()
                .with_description("Image name pattern to match"),
        )
        .attribute(
            AttributeSchema::new("most_recent", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description("Select the most recent matching image"),
        )
        .attribute(
            AttributeSchema::new(
                "architecture",
                AttributeType::Enum(vec!["x86_64".to_string(), "arm64".to_string()]),
            )
            .with_default(Value::string("x86_64"))
            .with_description("Required image architecture"),
        )
}

/// Returns the schema for an EC2 instance
pub fn instance_schema() -> ResourceSchema {
    ResourceSchema::new("ec2.instance")
        .with_description("An AWS EC2 instance")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Instance name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("instance_type", aws_types::instance_type())
                .required()
                .with_description("Instance type (e.g., t3.micro)"),
        )
        .attribute(
            AttributeSchema::new("image_id", AttributeType::String)
                .required()
                .with_description("Machine image to launch from"),
        )
        .attribute(
            AttributeSchema::new("subnet_id", AttributeType::String)
                .required()
                .with_description("Subnet to place the instance in"),
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
            AttributeSchema::new("key_name", AttributeType::String)
                .with_description("Name of the key pair for SSH access"),
        )
        .attribute(
            AttributeSchema::new("iam_instance_profile", AttributeType::String)
                .with_description("Instance profile granting the instance its role"),
        )
        .attribute(
            AttributeSchema::new("tags", aws_types::tags_type())
                .with_description("The tags for the instance"),
        )
}

/// Returns the schema for an IAM role
pub fn iam_role_schema() -> ResourceSchema {
    ResourceSchema::new("iam.role")
        .with_description("An IAM role")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Role name"),
        )
        .attribute(
            AttributeSchema::new("assume_role_service", AttributeType::String)
                .required()
                .with_description("Service principal allowed to assume the role"),
        )
}

/// Returns the schema for an IAM instance profile
pub fn iam_instance_profile_schema() -> ResourceSchema {
    ResourceSchema::new("iam.instance_profile")
        .with_description("An IAM instance profile wrapping a role")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Instance profile name"),
        )
        .attribute(
            AttributeSchema::new("role", AttributeType::String)
                .required()
                .with_description("Role the profile carries"),
        )
}

/// Managed policy reference type
fn managed_policy() -> AttributeType {
    AttributeType::Custom {
        name: "ManagedPolicy".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validation::validate_managed_policy(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Returns the schema for attaching a managed policy to a role
pub fn iam_role_policy_attachment_schema() -> ResourceSchema {
    ResourceSchema::new("iam.role_policy_attachment")
        .with_description("Attaches a managed policy to an IAM role")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Attachment name (for identification)"),
        )
        .attribute(
            AttributeSchema::new("role", AttributeType::String)
                .required()
                .with_description("Role receiving the policy"),
        )
        .attribute(
            AttributeSchema::new("policy", managed_policy())
                .required()
                .with_description("Managed policy name or ARN"),
        )
}

/// Returns all EC2/IAM-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        machine_image_schema(),
        instance_schema(),
        iam_role_schema(),
        iam_instance_profile_schema(),
        iam_role_policy_attachment_schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn valid_machine_image_lookup() {
        let schema = machine_image_schema();
        let attrs = attrs(&[
            ("name", Value::string("al2023")),
            ("owner", Value::string("amazon")),
            ("name_pattern", Value::string("al2023-ami-*-x86_64")),
            ("most_recent", Value::Bool(true)),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn machine_image_rejects_bad_architecture() {
        let schema = machine_image_schema();
        let attrs = attrs(&[
            ("name", Value::string("al2023")),
            ("owner", Value::string("amazon")),
            ("name_pattern", Value::string("al2023-ami-*")),
            ("architecture", Value::string("sparc")),
        ]);

        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn valid_instance() {
        let schema = instance_schema();
        let attrs = attrs(&[
            ("name", Value::string("rag-app")),
            ("instance_type", Value::string("t3.micro")),
            ("image_id", Value::reference("al2023", "image_id")),
            ("subnet_id", Value::reference("public_a", "id")),
            (
                "security_group_ids",
                Value::List(vec![Value::reference("admin_sg", "id")]),
            ),
            ("key_name", Value::string("AS-RAG")),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn instance_missing_subnet() {
        let schema = instance_schema();
        let attrs = attrs(&[
            ("name", Value::string("rag-app")),
            ("instance_type", Value::string("t3.micro")),
            ("image_id", Value::reference("al2023", "image_id")),
            (
                "security_group_ids",
                Value::List(vec![Value::reference("admin_sg", "id")]),
            ),
        ]);

        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn valid_role_and_attachment() {
        let role = iam_role_schema();
        let role_attrs = attrs(&[
            ("name", Value::string("rag-app-role")),
            ("assume_role_service", Value::string("ec2.amazonaws.com")),
        ]);
        assert!(role.validate(&role_attrs).is_ok());

        let attachment = iam_role_policy_attachment_schema();
        let attachment_attrs = attrs(&[
            ("name", Value::string("ssm-core")),
            ("role", Value::reference("app_role", "name")),
            ("policy", Value::string("AmazonSSMManagedInstanceCore")),
        ]);
        assert!(attachment.validate(&attachment_attrs).is_ok());
    }
}
