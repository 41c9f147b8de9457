//! Access - Security groups and their rules

use altair_core::graph::{GraphError, ResourceGraph};
use altair_core::resource::{Resource, Value};

/// Source of an inbound rule
#[derive(Debug, Clone, PartialEq)]
pub enum IngressPeer {
    /// A single CIDR block
    Ipv4(String),
    /// Any IPv4 address
    AnyIpv4,
    /// Members of another declared security group
    SecurityGroup(String),
}

/// One inbound rule
#[derive(Debug, Clone)]
pub struct IngressRule {
    pub name: String,
    pub protocol: String,
    pub from_port: i64,
    pub to_port: i64,
    pub peer: IngressPeer,
    pub description: Option<String>,
}

impl IngressRule {
    /// TCP rule on a single port
    pub fn tcp(name: impl Into<String>, port: i64, peer: IngressPeer) -> Self {
        Self {
            name: name.into(),
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            peer,
            description: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Declaration of one security group
#[derive(Debug, Clone)]
pub struct SecurityGroupPlan {
    pub name: String,
    pub description: Option<String>,
    /// Declare an unrestricted egress rule alongside the group
    pub allow_all_outbound: bool,
}

impl SecurityGroupPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            allow_all_outbound: false,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_allow_all_outbound(mut self, allow: bool) -> Self {
        self.allow_all_outbound = allow;
        self
    }

    /// Declare the group (and its egress rule, if unrestricted outbound
    /// was requested) under the given binding
    pub fn synthesize(
        &self,
        graph: &mut ResourceGraph,
        binding: &str,
        vpc_binding: &str,
    ) -> Result<(), GraphError> {
        let mut group = Resource::new("security_group", &self.name)
            .with_attribute("vpc_id", Value::reference(vpc_binding, "id"));
        if let Some(desc) = &self.description {
            group = group.with_attribute("description", Value::string(desc));
        }
        graph.declare(binding, group)?;

        if self.allow_all_outbound {
            graph.declare(
                format!("{}_egress", binding),
                Resource::new("security_group.egress_rule", format!("{}-egress", self.name))
                    .with_attribute("security_group_id", Value::reference(binding, "id"))
                    .with_attribute("protocol", Value::string("all"))
                    .with_attribute("from_port", Value::Int(0))
                    .with_attribute("to_port", Value::Int(65535))
                    .with_attribute("cidr", Value::string("0.0.0.0/0")),
            )?;
        }

        Ok(())
    }
}

/// Declare one inbound rule on an already declared group
pub fn declare_ingress_rule(
    graph: &mut ResourceGraph,
    binding: &str,
    group_binding: &str,
    rule: IngressRule,
) -> Result<(), GraphError> {
    let mut resource = Resource::new("security_group.ingress_rule", &rule.name)
        .with_attribute("security_group_id", Value::reference(group_binding, "id"))
        .with_attribute("protocol", Value::string(&rule.protocol))
        .with_attribute("from_port", Value::Int(rule.from_port))
        .with_attribute("to_port", Value::Int(rule.to_port));

    resource = match &rule.peer {
        IngressPeer::Ipv4(cidr) => resource.with_attribute("cidr", Value::string(cidr)),
        IngressPeer::AnyIpv4 => resource.with_attribute("cidr", Value::string("0.0.0.0/0")),
        IngressPeer::SecurityGroup(source) => {
            resource.with_attribute("source_security_group", Value::reference(source, "id"))
        }
    };

    if let Some(desc) = &rule.description {
        resource = resource.with_attribute("description", Value::string(desc));
    }

    graph.declare(binding, resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_vpc() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.declare("vpc", Resource::new("vpc", "test-vpc")).unwrap();
        graph
    }

    #[test]
    fn group_with_unrestricted_egress() {
        let mut graph = graph_with_vpc();
        SecurityGroupPlan::new("db-sg")
            .with_description("Database access")
            .with_allow_all_outbound(true)
            .synthesize(&mut graph, "db_sg", "vpc")
            .unwrap();

        assert!(graph.get("db_sg").is_some());
        let egress = &graph.get("db_sg_egress").unwrap().resource;
        assert_eq!(egress.attribute("cidr"), Some(&Value::string("0.0.0.0/0")));
        assert_eq!(egress.attribute("protocol"), Some(&Value::string("all")));
    }

    #[test]
    fn group_without_egress_rule() {
        let mut graph = graph_with_vpc();
        SecurityGroupPlan::new("admin-sg")
            .synthesize(&mut graph, "admin_sg", "vpc")
            .unwrap();

        assert!(graph.get("admin_sg").is_some());
        assert!(graph.get("admin_sg_egress").is_none());
    }

    #[test]
    fn cidr_peer_sets_cidr_attribute() {
        let mut graph = graph_with_vpc();
        SecurityGroupPlan::new("admin-sg")
            .synthesize(&mut graph, "admin_sg", "vpc")
            .unwrap();

        declare_ingress_rule(
            &mut graph,
            "ssh_home",
            "admin_sg",
            IngressRule::tcp("ssh-home", 22, IngressPeer::Ipv4("67.86.185.83/32".to_string())),
        )
        .unwrap();

        let rule = &graph.get("ssh_home").unwrap().resource;
        assert_eq!(rule.attribute("cidr"), Some(&Value::string("67.86.185.83/32")));
        assert_eq!(rule.attribute("source_security_group"), None);
    }

    #[test]
    fn group_peer_sets_source_reference() {
        let mut graph = graph_with_vpc();
        SecurityGroupPlan::new("admin-sg")
            .synthesize(&mut graph, "admin_sg", "vpc")
            .unwrap();
        SecurityGroupPlan::new("db-sg")
            .synthesize(&mut graph, "db_sg", "vpc")
            .unwrap();

        declare_ingress_rule(
            &mut graph,
            "postgres_from_admin",
            "db_sg",
            IngressRule::tcp(
                "postgres-from-admin",
                5432,
                IngressPeer::SecurityGroup("admin_sg".to_string()),
            ),
        )
        .unwrap();

        let rule = &graph.get("postgres_from_admin").unwrap().resource;
        assert_eq!(
            rule.attribute("source_security_group"),
            Some(&Value::reference("admin_sg", "id"))
        );
        assert_eq!(rule.attribute("cidr"), None);
    }

    #[test]
    fn rule_against_undeclared_group_fails() {
        let mut graph = graph_with_vpc();
        let err = declare_ingress_rule(
            &mut graph,
            "orphan",
            "missing_sg",
            IngressRule::tcp("orphan", 22, IngressPeer::AnyIpv4),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnknownReference { .. }));
    }
}
