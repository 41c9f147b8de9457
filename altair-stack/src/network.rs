//! Network - The isolated virtual network and its expansion
//!
//! One declared network expands into the full set of resources an
//! internet-facing/private split needs: per-zone public and
//! private-with-egress subnets, an internet gateway, one NAT gateway per
//! zone, and the route tables wiring them together.

use altair_core::graph::{GraphError, ResourceGraph};
use altair_core::resource::{Resource, Value};

/// Declaration of the stack's virtual network
#[derive(Debug, Clone)]
pub struct NetworkPlan {
    /// Name prefix for every synthesized network resource
    pub name: String,
    /// IPv4 range of the network; subnets are carved from it as /24s
    pub cidr_block: String,
    /// Availability zones to span; one public and one private subnet each
    pub availability_zones: Vec<String>,
}

/// Bindings of the synthesized network resources
#[derive(Debug, Clone)]
pub struct NetworkHandles {
    pub vpc: String,
    /// One per availability zone, same order as the plan
    pub public_subnets: Vec<String>,
    /// One per availability zone, same order as the plan
    pub private_subnets: Vec<String>,
}

impl NetworkPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr_block: "10.0.0.0/16".to_string(),
            availability_zones: vec!["us-east-1a".to_string(), "us-east-1b".to_string()],
        }
    }

    /// Declare the network resources into the graph
    pub fn synthesize(&self, graph: &mut ResourceGraph) -> Result<NetworkHandles, GraphError> {
        let vpc = "vpc".to_string();
        graph.declare(
            &vpc,
            Resource::new("vpc", format!("{}-vpc", self.name))
                .with_attribute("cidr_block", Value::string(&self.cidr_block))
                .with_attribute("enable_dns_support", Value::Bool(true))
                .with_attribute("enable_dns_hostnames", Value::Bool(true)),
        )?;

        graph.declare(
            "igw",
            Resource::new("internet_gateway", format!("{}-igw", self.name))
                .with_attribute("vpc_id", Value::reference(&vpc, "id")),
        )?;

        let mut public_subnets = Vec::new();
        let mut private_subnets = Vec::new();

        // Public subnets take the low /24s, private the /24s from 128 up,
        // matching the usual two-tier carve of a /16
        for (i, az) in self.availability_zones.iter().enumerate() {
            let zone = zone_suffix(az);

            let public = format!("public_subnet_{}", zone);
            graph.declare(
                &public,
                Resource::new("subnet", format!("{}-public-{}", self.name, zone))
                    .with_attribute("vpc_id", Value::reference(&vpc, "id"))
                    .with_attribute("cidr_block", Value::string(self.subnet_cidr(i)))
                    .with_attribute("availability_zone", Value::string(az))
                    .with_attribute("map_public_ip_on_launch", Value::Bool(true)),
            )?;
            public_subnets.push(public);

            let private = format!("private_subnet_{}", zone);
            graph.declare(
                &private,
                Resource::new("subnet", format!("{}-private-{}", self.name, zone))
                    .with_attribute("vpc_id", Value::reference(&vpc, "id"))
                    .with_attribute("cidr_block", Value::string(self.subnet_cidr(128 + i)))
                    .with_attribute("availability_zone", Value::string(az)),
            )?;
            private_subnets.push(private);
        }

        // Shared route table for the public tier: default route to the IGW
        graph.declare(
            "public_route_table",
            Resource::new("route_table", format!("{}-public", self.name))
                .with_attribute("vpc_id", Value::reference(&vpc, "id")),
        )?;
        graph.declare(
            "public_default_route",
            Resource::new("route", format!("{}-public-default", self.name))
                .with_attribute("route_table_id", Value::reference("public_route_table", "id"))
                .with_attribute("destination_cidr_block", Value::string("0.0.0.0/0"))
                .with_attribute("gateway_id", Value::reference("igw", "id")),
        )?;

        for (i, az) in self.availability_zones.iter().enumerate() {
            let zone = zone_suffix(az);

            graph.declare(
                format!("public_rta_{}", zone),
                Resource::new(
                    "route_table_association",
                    format!("{}-public-{}", self.name, zone),
                )
                .with_attribute("route_table_id", Value::reference("public_route_table", "id"))
                .with_attribute("subnet_id", Value::reference(&public_subnets[i], "id")),
            )?;

            // Private-with-egress: one NAT gateway per zone, in that zone's
            // public subnet, with its own route table
            let eip = format!("nat_eip_{}", zone);
            graph.declare(
                &eip,
                Resource::new("eip", format!("{}-nat-{}", self.name, zone))
                    .with_attribute("domain", Value::string("vpc")),
            )?;

            let nat = format!("nat_gateway_{}", zone);
            graph.declare(
                &nat,
                Resource::new("nat_gateway", format!("{}-nat-{}", self.name, zone))
                    .with_attribute("subnet_id", Value::reference(&public_subnets[i], "id"))
                    .with_attribute("allocation_id", Value::reference(&eip, "allocation_id")),
            )?;

            let rt = format!("private_route_table_{}", zone);
            graph.declare(
                &rt,
                Resource::new("route_table", format!("{}-private-{}", self.name, zone))
                    .with_attribute("vpc_id", Value::reference(&vpc, "id")),
            )?;
            graph.declare(
                format!("private_default_route_{}", zone),
                Resource::new("route", format!("{}-private-default-{}", self.name, zone))
                    .with_attribute("route_table_id", Value::reference(&rt, "id"))
                    .with_attribute("destination_cidr_block", Value::string("0.0.0.0/0"))
                    .with_attribute("nat_gateway_id", Value::reference(&nat, "id")),
            )?;
            graph.declare(
                format!("private_rta_{}", zone),
                Resource::new(
                    "route_table_association",
                    format!("{}-private-{}", self.name, zone),
                )
                .with_attribute("route_table_id", Value::reference(&rt, "id"))
                .with_attribute("subnet_id", Value::reference(&private_subnets[i], "id")),
            )?;
        }

        Ok(NetworkHandles {
            vpc,
            public_subnets,
            private_subnets,
        })
    }

    /// Nth /24 of the network range
    fn subnet_cidr(&self, index: usize) -> String {
        let prefix = self
            .cidr_block
            .split('.')
            .take(2)
            .collect::<Vec<_>>()
            .join(".");
        format!("{}.{}.0/24", prefix, index)
    }
}

/// Zone letter of an availability zone ("us-east-1a" -> "a")
fn zone_suffix(az: &str) -> String {
    az.chars().last().map(|c| c.to_string()).unwrap_or_default()
}
