//! AWS-specific type definitions

use altair_core::resource::Value;
use altair_core::schema::AttributeType;

use crate::validation;

/// Valid AWS regions (in AWS format with hyphens)
const VALID_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ca-central-1",
    "sa-east-1",
];

/// AWS region type with custom validation
/// Accepts underscore ("us_east_1") and hyphen ("us-east-1") forms
pub fn aws_region() -> AttributeType {
    AttributeType::Custom {
        name: "Region".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                let normalized = normalize_region(s);
                if VALID_REGIONS.contains(&normalized.as_str()) {
                    Ok(())
                } else {
                    Err(format!(
                        "Invalid region '{}', expected one of: {}",
                        s,
                        VALID_REGIONS.join(", ")
                    ))
                }
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Normalize region string to AWS format (hyphens)
/// - "us_east_1" -> "us-east-1"
/// - "us-east-1" -> "us-east-1"
pub fn normalize_region(s: &str) -> String {
    s.replace('_', "-")
}

/// Availability zone type: a valid region followed by a zone letter
pub fn availability_zone() -> AttributeType {
    AttributeType::Custom {
        name: "AvailabilityZone".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                let normalized = normalize_region(s);
                let (region, zone) = normalized.split_at(normalized.len().saturating_sub(1));
                let zone_letter = zone.chars().next();
                if VALID_REGIONS.contains(&region)
                    && zone_letter.is_some_and(|c| c.is_ascii_lowercase())
                {
                    Ok(())
                } else {
                    Err(format!(
                        "Invalid availability zone '{}', expected a region plus zone letter (e.g., us-east-1a)",
                        s
                    ))
                }
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// EC2 instance type (e.g., "t3.micro")
pub fn instance_type() -> AttributeType {
    AttributeType::Custom {
        name: "InstanceType".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validation::validate_instance_type(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// RDS instance class (e.g., "db.t3.micro")
pub fn db_instance_class() -> AttributeType {
    AttributeType::Custom {
        name: "DbInstanceClass".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validation::validate_db_instance_class(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Tags type for AWS resources
/// Example: tags = { Environment = "production", Project = "rag" }
pub fn tags_type() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_accepts_aws_format() {
        let region_type = aws_region();
        assert!(
            region_type
                .validate(&Value::String("us-east-1".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn region_accepts_underscore_format() {
        let region_type = aws_region();
        assert!(
            region_type
                .validate(&Value::String("ap_northeast_1".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn region_rejects_invalid_region() {
        let region_type = aws_region();
        let result = region_type.validate(&Value::String("invalid-region".to_string()));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid region"));
        assert!(err.contains("us-east-1")); // Should suggest valid regions
    }

    #[test]
    fn region_rejects_availability_zone() {
        let region_type = aws_region();
        // us-east-1a is an AZ, not a region
        assert!(
            region_type
                .validate(&Value::String("us-east-1a".to_string()))
                .is_err()
        );
    }

    #[test]
    fn region_validates_all_valid_regions() {
        let region_type = aws_region();
        for region in VALID_REGIONS {
            assert!(
                region_type
                    .validate(&Value::String(region.to_string()))
                    .is_ok(),
                "Region {} should be valid",
                region
            );
        }
    }

    #[test]
    fn availability_zone_accepts_zone_suffix() {
        let az = availability_zone();
        assert!(az.validate(&Value::String("us-east-1a".to_string())).is_ok());
        assert!(az.validate(&Value::String("us-east-1b".to_string())).is_ok());
        assert!(
            az.validate(&Value::String("ap_northeast_1c".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn availability_zone_rejects_bare_region() {
        let az = availability_zone();
        assert!(az.validate(&Value::String("us-east-1".to_string())).is_err());
        assert!(az.validate(&Value::String("nowhere-9z".to_string())).is_err());
    }

    #[test]
    fn instance_type_accepts_class_dot_size() {
        let t = instance_type();
        assert!(t.validate(&Value::String("t3.micro".to_string())).is_ok());
        assert!(t.validate(&Value::String("m5.large".to_string())).is_ok());
    }

    #[test]
    fn instance_type_rejects_db_prefix() {
        let t = instance_type();
        assert!(
            t.validate(&Value::String("db.t3.micro".to_string()))
                .is_err()
        );
    }

    #[test]
    fn db_instance_class_requires_db_prefix() {
        let t = db_instance_class();
        assert!(t.validate(&Value::String("db.t3.micro".to_string())).is_ok());
        assert!(t.validate(&Value::String("t3.micro".to_string())).is_err());
    }
}
