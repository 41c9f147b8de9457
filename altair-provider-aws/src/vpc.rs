//! VPC resource schema definitions

use altair_core::resource::Value;
use altair_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::types as aws_types;

/// Port number type (with validation)
pub fn port_number() -> AttributeType {
    AttributeType::Custom {
        name: "PortNumber".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| {
            if let Value::Int(n) = value {
                if *n >= 0 && *n <= 65535 {
                    Ok(())
                } else {
                    Err("Port number must be between 0 and 65535".to_string())
                }
            } else {
                Err("Expected integer".to_string())
            }
        },
    }
}

/// Protocol type for security group rules
pub fn protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "tcp".to_string(),
        "udp".to_string(),
        "icmp".to_string(),
        "all".to_string(), // All traffic (-1)
    ])
}

/// Returns the schema for VPC
pub fn vpc_schema() -> ResourceSchema {
    ResourceSchema::new("vpc")
        .with_description("An AWS VPC (Virtual Private Cloud)")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("VPC name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("region", aws_types::aws_region())
                .with_description("The AWS region for the VPC"),
        )
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_description("The IPv4 network range for the VPC, in CIDR notation"),
        )
        .attribute(
            AttributeSchema::new("enable_dns_support", AttributeType::Bool)
                .with_description("Indicates whether DNS resolution is supported for the VPC"),
        )
        .attribute(
            AttributeSchema::new("enable_dns_hostnames", AttributeType::Bool).with_description(
                "Indicates whether instances launched in the VPC get DNS hostnames",
            ),
        )
        .attribute(
            AttributeSchema::new("tags", aws_types::tags_type())
                .with_description("The tags for the VPC"),
        )
}

/// Returns the schema for Subnet
pub fn subnet_schema() -> ResourceSchema {
    ResourceSchema::new("subnet")
        .with_description("An AWS VPC Subnet")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Subnet name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_description("VPC to create the subnet in"),
        )
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_description("The IPv4 CIDR block for the subnet"),
        )
        .attribute(
            AttributeSchema::new("availability_zone", aws_types::availability_zone())
                .required()
                .with_description("The availability zone for the subnet"),
        )
        .attribute(
            AttributeSchema::new("map_public_ip_on_launch", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Assign a public IP to instances launched in this subnet"),
        )
}

/// Returns the schema for Internet Gateway
pub fn internet_gateway_schema() -> ResourceSchema {
    ResourceSchema::new("internet_gateway")
        .with_description("An AWS Internet Gateway")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Internet Gateway name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_description("VPC to attach the Internet Gateway to"),
        )
}

/// Returns the schema for Elastic IP
pub fn eip_schema() -> ResourceSchema {
    ResourceSchema::new("eip")
        .with_description("An AWS Elastic IP address")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Elastic IP name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("domain", AttributeType::Enum(vec!["vpc".to_string()]))
                .with_default(Value::string("vpc"))
                .with_description("Scope of the address"),
        )
}

/// Returns the schema for NAT Gateway
pub fn nat_gateway_schema() -> ResourceSchema {
    ResourceSchema::new("nat_gateway")
        .with_description("An AWS NAT Gateway for private-subnet egress")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("NAT Gateway name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("subnet_id", AttributeType::String)
                .required()
                .with_description("Public subnet hosting the NAT Gateway"),
        )
        .attribute(
            AttributeSchema::new("allocation_id", AttributeType::String)
                .required()
                .with_description("Elastic IP allocation to associate"),
        )
}

/// Returns the schema for Route Table
pub fn route_table_schema() -> ResourceSchema {
    ResourceSchema::new("route_table")
        .with_description("An AWS VPC Route Table")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Route Table name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_description("VPC for the Route Table"),
        )
}

/// Returns the schema for Route
pub fn route_schema() -> ResourceSchema {
    ResourceSchema::new("route")
        .with_description("A route in an AWS VPC Route Table")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Route name (for identification)"),
        )
        .attribute(
            AttributeSchema::new("route_table_id", AttributeType::String)
                .required()
                .with_description("Route Table the route belongs to"),
        )
        .attribute(
            AttributeSchema::new("destination_cidr_block", types::cidr())
                .required()
                .with_description("Destination CIDR block"),
        )
        .attribute(
            AttributeSchema::new("gateway_id", AttributeType::String)
                .with_description("Internet Gateway ID (for internet-bound traffic)"),
        )
        .attribute(
            AttributeSchema::new("nat_gateway_id", AttributeType::String)
                .with_description("NAT Gateway ID (for private egress)"),
        )
}

/// Returns the schema for Route Table Association
pub fn route_table_association_schema() -> ResourceSchema {
    ResourceSchema::new("route_table_association")
        .with_description("Associates a subnet with a route table")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Association name (for identification)"),
        )
        .attribute(
            AttributeSchema::new("route_table_id", AttributeType::String)
                .required()
                .with_description("Route Table to associate"),
        )
        .attribute(
            AttributeSchema::new("subnet_id", AttributeType::String)
                .required()
                .with_description("Subnet to associate"),
        )
}

/// Returns the schema for Security Group
pub fn security_group_schema() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .with_description("An AWS VPC Security Group")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Security Group name (Name tag)"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_description("VPC for the Security Group"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_description("Description of the Security Group"),
        )
}

fn rule_common(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Rule name (for identification)"),
        )
        .attribute(
            AttributeSchema::new("security_group_id", AttributeType::String)
                .required()
                .with_description("Security Group the rule belongs to"),
        )
        .attribute(
            AttributeSchema::new("protocol", protocol())
                .required()
                .with_description("Protocol (tcp, udp, icmp, or all)"),
        )
        .attribute(
            AttributeSchema::new("from_port", port_number())
                .required()
                .with_description("Start of port range"),
        )
        .attribute(
            AttributeSchema::new("to_port", port_number())
                .required()
                .with_description("End of port range"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_description("What the rule allows"),
        )
}

/// Returns the schema for Security Group Ingress Rule
///
/// The source is either `cidr` or `source_security_group` (another
/// group's identifier); exactly one must be set.
pub fn security_group_ingress_rule_schema() -> ResourceSchema {
    rule_common(
        ResourceSchema::new("security_group.ingress_rule")
            .with_description("An inbound rule for an AWS VPC Security Group"),
    )
    .attribute(
        AttributeSchema::new("cidr", types::cidr()).with_description("Source CIDR block to allow"),
    )
    .attribute(
        AttributeSchema::new("source_security_group", AttributeType::String)
            .with_description("Source Security Group whose members are allowed"),
    )
}

/// Returns the schema for Security Group Egress Rule
pub fn security_group_egress_rule_schema() -> ResourceSchema {
    rule_common(
        ResourceSchema::new("security_group.egress_rule")
            .with_description("An outbound rule for an AWS VPC Security Group"),
    )
    .attribute(
        AttributeSchema::new("cidr", types::cidr())
            .with_description("Destination CIDR block to allow"),
    )
}

/// Returns all VPC-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        vpc_schema(),
        subnet_schema(),
        internet_gateway_schema(),
        eip_schema(),
        nat_gateway_schema(),
        route_table_schema(),
        route_schema(),
        route_table_association_schema(),
        security_group_schema(),
        security_group_ingress_rule_schema(),
        security_group_egress_rule_schema(),
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
    fn valid_vpc() {
        let schema = vpc_schema();
        let attrs = attrs(&[
            ("name", Value::string("rag-vpc")),
            ("cidr_block", Value::string("10.0.0.0/16")),
            ("enable_dns_support", Value::Bool(true)),
            ("enable_dns_hostnames", Value::Bool(true)),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn vpc_missing_cidr() {
        let schema = vpc_schema();
        let attrs = attrs(&[("name", Value::string("rag-vpc"))]);
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn valid_subnet() {
        let schema = subnet_schema();
        let attrs = attrs(&[
            ("name", Value::string("public-a")),
            ("vpc_id", Value::reference("vpc", "id")),
            ("cidr_block", Value::string("10.0.0.0/24")),
            ("availability_zone", Value::string("us-east-1a")),
            ("map_public_ip_on_launch", Value::Bool(true)),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn subnet_rejects_bad_az() {
        let schema = subnet_schema();
        let attrs = attrs(&[
            ("name", Value::string("public-a")),
            ("vpc_id", Value::reference("vpc", "id")),
            ("cidr_block", Value::string("10.0.0.0/24")),
            ("availability_zone", Value::string("us-east-1")),
        ]);

        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn valid_nat_gateway() {
        let schema = nat_gateway_schema();
        let attrs = attrs(&[
            ("name", Value::string("nat-a")),
            ("subnet_id", Value::reference("public_a", "id")),
            ("allocation_id", Value::reference("nat_eip_a", "allocation_id")),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn valid_route() {
        let schema = route_schema();
        let attrs = attrs(&[
            ("name", Value::string("public-default")),
            ("route_table_id", Value::reference("public_rt", "id")),
            ("destination_cidr_block", Value::string("0.0.0.0/0")),
            ("gateway_id", Value::reference("igw", "id")),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn valid_ingress_rule_with_cidr() {
        let schema = security_group_ingress_rule_schema();
        let attrs = attrs(&[
            ("name", Value::string("ssh-from-home")),
            ("security_group_id", Value::reference("admin_sg", "id")),
            ("protocol", Value::string("tcp")),
            ("from_port", Value::Int(22)),
            ("to_port", Value::Int(22)),
            ("cidr", Value::string("67.86.185.83/32")),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn valid_ingress_rule_with_group_source() {
        let schema = security_group_ingress_rule_schema();
        let attrs = attrs(&[
            ("name", Value::string("postgres-from-admin")),
            ("security_group_id", Value::reference("db_sg", "id")),
            ("protocol", Value::string("tcp")),
            ("from_port", Value::Int(5432)),
            ("to_port", Value::Int(5432)),
            ("source_security_group", Value::reference("admin_sg", "id")),
        ]);

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn ingress_rule_rejects_bad_port() {
        let schema = security_group_ingress_rule_schema();
        let attrs = attrs(&[
            ("name", Value::string("bad")),
            ("security_group_id", Value::reference("sg", "id")),
            ("protocol", Value::string("tcp")),
            ("from_port", Value::Int(22)),
            ("to_port", Value::Int(70000)),
        ]);

        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn ingress_rule_rejects_bad_protocol() {
        let schema = security_group_ingress_rule_schema();
        let attrs = attrs(&[
            ("name", Value::string("bad")),
            ("security_group_id", Value::reference("sg", "id")),
            ("protocol", Value::string("sctp")),
            ("from_port", Value::Int(22)),
            ("to_port", Value::Int(22)),
        ]);

        assert!(schema.validate(&attrs).is_err());
    }
}
