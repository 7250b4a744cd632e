mod error;
mod rules;
mod validator;

pub use self::error::ConstraintViolations;
pub use self::error::ResourceViolations;
pub use self::error::ValidationError;
pub use self::rules::IgnorePortValidationRule;
pub use self::rules::IgnoreResourceMemoryLimitRule;
pub use self::rules::ValidationRule;
pub use self::rules::Violation;
pub use self::validator::default_rules;
pub use self::validator::ResourceValidator;
pub use self::validator::Target;
pub use self::validator::SCHEMA_JSON;
