//! Compute - The application instance and its identity

use altair_core::graph::{GraphError, ResourceGraph};
use altair_core::resource::{Resource, Value};

/// Declaration of the application compute resource
#[derive(Debug, Clone)]
pub struct ComputePlan {
    pub name: String,
    pub instance_type: String,
    /// Named key pair for SSH access
    pub key_name: Option<String>,
}

/// Bindings of the synthesized compute resources
#[derive(Debug, Clone)]
pub struct ComputeHandles {
    pub image: String,
    pub role: String,
    pub instance_profile: String,
    pub instance: String,
}

impl ComputePlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_type: "t3.micro".to_string(),
            key_name: None,
        }
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    /// Declare the image lookup, role, instance profile and instance
    pub fn synthesize(
        &self,
        graph: &mut ResourceGraph,
        subnet_binding: &str,
        security_group_binding: &str,
    ) -> Result<ComputeHandles, GraphError> {
        // Latest Amazon Linux 2023; resolved by the engine at read time
        let image = "app_image".to_string();
        graph.declare(
            &image,
            Resource::new("ec2.machine_image", format!("{}-al2023", self.name))
                .with_attribute("owner", Value::string("amazon"))
                .with_attribute("name_pattern", Value::string("al2023-ami-*-x86_64"))
                .with_attribute("most_recent", Value::Bool(true))
                .with_read_only(true),
        )?;

        let role = "app_role".to_string();
        graph.declare(
            &role,
            Resource::new("iam.role", format!("{}-role", self.name))
                .with_attribute("assume_role_service", Value::string("ec2.amazonaws.com")),
        )?;

        let instance_profile = "app_instance_profile".to_string();
        graph.declare(
            &instance_profile,
            Resource::new("iam.instance_profile", format!("{}-profile", self.name))
                .with_attribute("role", Value::reference(&role, "name")),
        )?;

        let mut instance_resource = Resource::new("ec2.instance", &self.name)
            .with_attribute("instance_type", Value::string(&self.instance_type))
            .with_attribute("image_id", Value::reference(&image, "image_id"))
            .with_attribute("subnet_id", Value::reference(subnet_binding, "id"))
            .with_attribute(
                "security_group_ids",
                Value::List(vec![Value::reference(security_group_binding, "id")]),
            )
            .with_attribute(
                "iam_instance_profile",
                Value::reference(&instance_profile, "name"),
            );
        if let Some(key_name) = &self.key_name {
            instance_resource = instance_resource.with_attribute("key_name", Value::string(key_name));
        }

        let instance = "app_instance".to_string();
        graph.declare(&instance, instance_resource)?;

        Ok(ComputeHandles {
            image,
            role,
            instance_profile,
            instance,
        })
    }
}

/// Attach a managed policy to an already declared role
pub fn attach_managed_policy(
    graph: &mut ResourceGraph,
    binding: &str,
    role_binding: &str,
    name: impl Into<String>,
    policy: impl Into<String>,
) -> Result<(), GraphError> {
    graph.declare(
        binding,
        Resource::new("iam.role_policy_attachment", name)
            .with_attribute("role", Value::reference(role_binding, "name"))
            .with_attribute("policy", Value::string(policy)),
    )
}
