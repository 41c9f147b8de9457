//! Stack - The complete environment declaration
//!
//! Assembles network, access control, compute and database in a fixed
//! order, so every reference points at an already declared resource and
//! re-synthesis is deterministic.

use altair_core::graph::{GraphError, ResourceGraph};

use crate::access::{IngressPeer, IngressRule, SecurityGroupPlan, declare_ingress_rule};
use crate::compute::{ComputePlan, attach_managed_policy};
use crate::database::DatabasePlan;
use crate::network::NetworkPlan;

/// Administrative SSH source address
const ADMIN_SSH_CIDR: &str = "67.86.185.83/32";

/// Key pair referenced by the application instance
const KEY_PAIR_NAME: &str = "AS-RAG";

/// Managed policy granting remote session management
const SESSION_MANAGER_POLICY: &str = "AmazonSSMManagedInstanceCore";

/// The RAG application's runtime environment stack
#[derive(Debug, Clone)]
pub struct EnvironmentStack {
    pub name: String,
}

impl EnvironmentStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Synthesize the desired-state resource graph.
    ///
    /// Takes no external inputs; two calls produce identical graphs.
    pub fn synthesize(&self) -> Result<ResourceGraph, GraphError> {
        let mut graph = ResourceGraph::new();

        // 1. Network: two zones, public + private-with-egress each
        let network = NetworkPlan::new(&self.name).synthesize(&mut graph)?;

        // 2. Administrative group with SSH from the admin address
        SecurityGroupPlan::new(format!("{}-admin", self.name))
            .with_description("SSH access to the application instance")
            .synthesize(&mut graph, "admin_sg", &network.vpc)?;
        declare_ingress_rule(
            &mut graph,
            "admin_ssh_home",
            "admin_sg",
            IngressRule::tcp(
                format!("{}-ssh-home", self.name),
                22,
                IngressPeer::Ipv4(ADMIN_SSH_CIDR.to_string()),
            )
            .with_description("Allow SSH from the admin address"),
        )?;

        // 3. Application instance in the first public subnet
        let compute = ComputePlan::new(format!("{}-app", self.name))
            .with_key_name(KEY_PAIR_NAME)
            .synthesize(&mut graph, &network.public_subnets[0], "admin_sg")?;

        // 4. Database group: Postgres reachable from the admin group only
        SecurityGroupPlan::new(format!("{}-postgres", self.name))
            .with_description("Postgres access from the application tier")
            .with_allow_all_outbound(true)
            .synthesize(&mut graph, "db_sg", &network.vpc)?;
        declare_ingress_rule(
            &mut graph,
            "db_postgres_from_admin",
            "db_sg",
            IngressRule::tcp(
                format!("{}-postgres-from-admin", self.name),
                5432,
                IngressPeer::SecurityGroup("admin_sg".to_string()),
            )
            .with_description("Allow the application instance to reach Postgres"),
        )?;

        // 5. Broad SSH rule, declared after the instance exists. It
        // subsumes the narrow admin rule.
        declare_ingress_rule(
            &mut graph,
            "admin_ssh_any",
            "admin_sg",
            IngressRule::tcp(
                format!("{}-ssh-any", self.name),
                22,
                IngressPeer::AnyIpv4,
            )
            .with_description("Allow SSH from anywhere"),
        )?;

        // 6. Database in the private subnets
        DatabasePlan::new(format!("{}-postgres-db", self.name)).synthesize(
            &mut graph,
            &network.private_subnets,
            "db_sg",
        )?;

        // 7. Remote session management for the instance role
        attach_managed_policy(
            &mut graph,
            "app_ssm_policy",
            &compute.role,
            format!("{}-app-ssm", self.name),
            SESSION_MANAGER_POLICY,
        )?;

        Ok(graph)
    }
}

impl Default for EnvironmentStack {
    fn default() -> Self {
        Self::new("as-rag")
    }
}

/// Validate every declared resource against the AWS schemas
pub fn validate(graph: &ResourceGraph) -> Result<(), Vec<String>> {
    let schemas = altair_provider_aws::schema_map();
    let mut errors = Vec::new();

    for entry in graph.iter() {
        let resource = &entry.resource;
        match schemas.get(&resource.id.resource_type) {
            Some(schema) => {
                if let Err(type_errors) = schema.validate(&resource.attributes) {
                    for e in type_errors {
                        errors.push(format!("{}: {}", resource.id, e));
                    }
                }
            }
            None => errors.push(format!(
                "{}: unknown resource type '{}'",
                resource.id, resource.id.resource_type
            )),
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
