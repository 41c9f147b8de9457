//! Database - The managed relational database instance

use altair_core::graph::{GraphError, ResourceGraph};
use altair_core::resource::{Resource, Value};

/// Declaration of the managed database
#[derive(Debug, Clone)]
pub struct DatabasePlan {
    pub name: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    /// Initial storage in GiB
    pub allocated_storage: i64,
    /// Storage autoscaling upper bound in GiB
    pub max_allocated_storage: i64,
    pub db_name: String,
    pub master_username: String,
}

/// Bindings of the synthesized database resources
#[derive(Debug, Clone)]
pub struct DatabaseHandles {
    pub subnet_group: String,
    pub instance: String,
}

impl DatabasePlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: "postgres".to_string(),
            engine_version: "14".to_string(),
            instance_class: "db.t3.micro".to_string(),
            allocated_storage: 20,
            max_allocated_storage: 100,
            db_name: "ASRagDB".to_string(),
            master_username: "postgres".to_string(),
        }
    }

    /// Declare the subnet group and database instance.
    ///
    /// The master password is generated and stored by the engine's secret
    /// store; the declaration never carries credential material.
    pub fn synthesize(
        &self,
        graph: &mut ResourceGraph,
        private_subnets: &[String],
        security_group_binding: &str,
    ) -> Result<DatabaseHandles, GraphError> {
        let subnet_group = "db_subnet_group".to_string();
        graph.declare(
            &subnet_group,
            Resource::new("rds.db_subnet_group", format!("{}-subnets", self.name))
                .with_attribute("description", Value::string("Private placement for the database"))
                .with_attribute(
                    "subnet_ids",
                    Value::List(
                        private_subnets
                            .iter()
                            .map(|s| Value::reference(s, "id"))
                            .collect(),
                    ),
                ),
        )?;

        let instance = "db_instance".to_string();
        graph.declare(
            &instance,
            Resource::new("rds.db_instance", &self.name)
                .with_attribute("engine", Value::string(&self.engine))
                .with_attribute("engine_version", Value::string(&self.engine_version))
                .with_attribute("instance_class", Value::string(&self.instance_class))
                .with_attribute("allocated_storage", Value::Int(self.allocated_storage))
                .with_attribute("max_allocated_storage", Value::Int(self.max_allocated_storage))
                .with_attribute("db_name", Value::string(&self.db_name))
                .with_attribute("master_username", Value::string(&self.master_username))
                .with_attribute("manage_master_user_password", Value::Bool(true))
                .with_attribute("db_subnet_group", Value::reference(&subnet_group, "name"))
                .with_attribute(
                    "security_group_ids",
                    Value::List(vec![Value::reference(security_group_binding, "id")]),
                )
                .with_attribute("publicly_accessible", Value::Bool(false)),
        )?;

        Ok(DatabaseHandles {
            subnet_group,
            instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_placement() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.declare("vpc", Resource::new("vpc", "test-vpc")).unwrap();
        for binding in ["private_subnet_a", "private_subnet_b"] {
            graph
                .declare(
                    binding,
                    Resource::new("subnet", binding)
                        .with_attribute("vpc_id", Value::reference("vpc", "id")),
                )
                .unwrap();
        }
        graph
            .declare(
                "db_sg",
                Resource::new("security_group", "db")
                    .with_attribute("vpc_id", Value::reference("vpc", "id")),
            )
            .unwrap();
        graph
    }

    #[test]
    fn synthesizes_subnet_group_and_instance() {
        let mut graph = graph_with_placement();
        let handles = DatabasePlan::new("as-rag-postgres")
            .synthesize(
                &mut graph,
                &["private_subnet_a".to_string(), "private_subnet_b".to_string()],
                "db_sg",
            )
            .unwrap();

        let group = &graph.get(&handles.subnet_group).unwrap().resource;
        match group.attribute("subnet_ids") {
            Some(Value::List(ids)) => assert_eq!(ids.len(), 2),
            other => panic!("Expected subnet list, got {:?}", other),
        }

        let instance = &graph.get(&handles.instance).unwrap().resource;
        assert_eq!(instance.attribute("allocated_storage"), Some(&Value::Int(20)));
        assert_eq!(
            instance.attribute("max_allocated_storage"),
            Some(&Value::Int(100))
        );
        assert_eq!(
            instance.attribute("manage_master_user_password"),
            Some(&Value::Bool(true))
        );
        assert_eq!(instance.attribute("master_password"), None);
    }

    #[test]
    fn defaults_match_environment() {
        let plan = DatabasePlan::new("as-rag-postgres");
        assert_eq!(plan.engine, "postgres");
        assert_eq!(plan.engine_version, "14");
        assert_eq!(plan.instance_class, "db.t3.micro");
        assert_eq!(plan.db_name, "ASRagDB");
        assert_eq!(plan.master_username, "postgres");
    }
}
