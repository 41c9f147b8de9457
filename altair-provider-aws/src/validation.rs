//! Shared attribute validators backed by compiled patterns
//!
//! Schema validators are plain function pointers, so the compiled
//! expressions live in `OnceLock` statics here.

use std::sync::OnceLock;

use regex::Regex;

fn instance_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*\d[a-z]*\.[a-z0-9]+$").unwrap())
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,62}$").unwrap())
}

fn master_username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,15}$").unwrap())
}

fn managed_policy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Either a full ARN or a bare AWS managed policy name
    RE.get_or_init(|| {
        Regex::new(r"^(arn:aws:iam::(aws|\d{12}):policy/[A-Za-z0-9+=,.@_/-]+|[A-Za-z0-9+=,.@_-]+)$")
            .unwrap()
    })
}

/// Validate an EC2 instance type such as "t3.micro"
pub fn validate_instance_type(s: &str) -> Result<(), String> {
    if instance_type_re().is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "Invalid instance type '{}', expected class.size (e.g., t3.micro)",
            s
        ))
    }
}

/// Validate an RDS instance class such as "db.t3.micro"
pub fn validate_db_instance_class(s: &str) -> Result<(), String> {
    match s.strip_prefix("db.") {
        Some(rest) => validate_instance_type(rest)
            .map_err(|_| format!("Invalid DB instance class '{}', expected db.class.size", s)),
        None => Err(format!(
            "Invalid DB instance class '{}': must start with 'db.'",
            s
        )),
    }
}

/// Validate an RDS identifier or database name: starts with a letter,
/// alphanumeric, at most 63 characters
pub fn validate_db_identifier(s: &str) -> Result<(), String> {
    if identifier_re().is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "Invalid database identifier '{}': must begin with a letter and contain only alphanumeric characters (max 63)",
            s
        ))
    }
}

/// Validate an RDS master user name
pub fn validate_master_username(s: &str) -> Result<(), String> {
    if master_username_re().is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "Invalid master username '{}': must begin with a letter, alphanumeric or underscore, max 16 characters",
            s
        ))
    }
}

/// Validate a managed policy reference (bare name or full ARN)
pub fn validate_managed_policy(s: &str) -> Result<(), String> {
    if managed_policy_re().is_match(s) {
        Ok(())
    } else {
        Err(format!("Invalid managed policy reference '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_types() {
        assert!(validate_instance_type("t3.micro").is_ok());
        assert!(validate_instance_type("c6g.2xlarge").is_ok());
        assert!(validate_instance_type("micro").is_err());
        assert!(validate_instance_type("T3.micro").is_err());
    }

    #[test]
    fn db_instance_classes() {
        assert!(validate_db_instance_class("db.t3.micro").is_ok());
        assert!(validate_db_instance_class("db.r6g.large").is_ok());
        assert!(validate_db_instance_class("t3.micro").is_err());
        assert!(validate_db_instance_class("db.").is_err());
    }

    #[test]
    fn db_identifiers() {
        assert!(validate_db_identifier("ASRagDB").is_ok());
        assert!(validate_db_identifier("postgres14").is_ok());
        assert!(validate_db_identifier("1database").is_err());
        assert!(validate_db_identifier("has-hyphen").is_err());
        assert!(validate_db_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn master_usernames() {
        assert!(validate_master_username("postgres").is_ok());
        assert!(validate_master_username("admin_user").is_ok());
        assert!(validate_master_username("9admin").is_err());
        assert!(validate_master_username("much_too_long_username").is_err());
    }

    #[test]
    fn managed_policies() {
        assert!(validate_managed_policy("AmazonSSMManagedInstanceCore").is_ok());
        assert!(
            validate_managed_policy("arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore").is_ok()
        );
        assert!(validate_managed_policy("arn:aws:iam::123456789012:policy/custom/Team").is_ok());
        assert!(validate_managed_policy("has space").is_err());
    }
}
