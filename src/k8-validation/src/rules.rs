/// A single schema violation reported for one resource descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending location in the resource
    pub path: String,
    /// Schema keyword that failed, e.g. "type" or "required"
    pub constraint: String,
    /// Human readable rendering of the violation
    pub message: String,
}

/// Classifies a violation as expected (suppress it) or real. Some
/// fields in the master schema carry constraints which descriptors
/// violate in practice without being broken, these get stock rules.
pub trait ValidationRule {
    fn ignore(&self, violation: &Violation) -> bool;
}

fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

fn integer_type_mismatch(violation: &Violation, constraint: &str, field: &str) -> bool {
    violation.constraint.eq_ignore_ascii_case(constraint)
        && last_segment(&violation.path) == Some(field)
        && violation.message.contains("is not of type \"integer\"")
}

/// Port fields are declared as integers in parts of the master schema
/// while generated descriptors carry full port objects. The resulting
/// type mismatch is expected.
#[derive(Debug, Default)]
pub struct IgnorePortValidationRule;

impl IgnorePortValidationRule {
    pub const TYPE: &'static str = "type";

    pub fn new() -> Self {
        Self
    }
}

impl ValidationRule for IgnorePortValidationRule {
    fn ignore(&self, violation: &Violation) -> bool {
        integer_type_mismatch(violation, Self::TYPE, "ports")
    }
}

/// Memory limits are quantity strings like "512Mi", the master schema
/// marks them as integers
#[derive(Debug, Default)]
pub struct IgnoreResourceMemoryLimitRule;

impl IgnoreResourceMemoryLimitRule {
    pub const TYPE: &'static str = "type";

    pub fn new() -> Self {
        Self
    }
}

impl ValidationRule for IgnoreResourceMemoryLimitRule {
    fn ignore(&self, violation: &Violation) -> bool {
        integer_type_mismatch(violation, Self::TYPE, "memory")
    }
}

#[cfg(test)]
mod test {

    use super::IgnorePortValidationRule;
    use super::IgnoreResourceMemoryLimitRule;
    use super::ValidationRule;
    use super::Violation;

    fn violation(path: &str, constraint: &str, message: &str) -> Violation {
        Violation {
            path: path.to_owned(),
            constraint: constraint.to_owned(),
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_port_rule_matches_integer_mismatch() {
        let rule = IgnorePortValidationRule::new();
        let mismatch = violation(
            "/spec/ports",
            "type",
            r#"{"http":8080} is not of type "integer""#,
        );
        assert!(rule.ignore(&mismatch));

        // constraint type comparison is case insensitive
        let upper = violation(
            "/ports",
            "TYPE",
            r#"{"http":8080} is not of type "integer""#,
        );
        assert!(rule.ignore(&upper));
    }

    #[test]
    fn test_port_rule_leaves_other_violations_alone() {
        let rule = IgnorePortValidationRule::new();

        let other_field = violation("/spec/replicas", "type", r#""x" is not of type "integer""#);
        assert!(!rule.ignore(&other_field));

        let other_constraint = violation("/spec/ports", "required", "\"ports\" is a required property");
        assert!(!rule.ignore(&other_constraint));

        let other_type = violation("/spec/ports", "type", r#"8080 is not of type "object""#);
        assert!(!rule.ignore(&other_type));
    }

    #[test]
    fn test_memory_rule_matches_limit_field() {
        let rule = IgnoreResourceMemoryLimitRule::new();
        let mismatch = violation(
            "/spec/containers/0/resources/limits/memory",
            "type",
            r#""512Mi" is not of type "integer""#,
        );
        assert!(rule.ignore(&mismatch));
        assert!(!rule.ignore(&violation(
            "/spec/containers/0/resources/limits/cpu",
            "type",
            r#""250m" is not of type "integer""#,
        )));
    }
}
