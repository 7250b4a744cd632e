use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use crate::ConstraintViolations;
use crate::IgnorePortValidationRule;
use crate::IgnoreResourceMemoryLimitRule;
use crate::ResourceViolations;
use crate::ValidationError;
use crate::ValidationRule;
use crate::Violation;

/// Bundled master schema with per kind field constraints for
/// Kubernetes and OpenShift resources
pub const SCHEMA_JSON: &str = include_str!("../schema/kube-validation-schema.json");

/// Target platform the descriptors are generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Kubernetes,
    Openshift,
}

/// Stock ignore rules for a target platform. The master schema marks
/// some fields as integers which real descriptors carry as objects or
/// quantity strings, both platforms share these exceptions.
pub fn default_rules(_target: Target) -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(IgnorePortValidationRule::new()),
        Box::new(IgnoreResourceMemoryLimitRule::new()),
    ]
}

/// Validates resource descriptors against a kind specialized JSON
/// schema. The master schema holds one `properties` subtree per kind
/// under its `resources` object and is specialized at validation time,
/// so a single document covers every kind.
pub struct ResourceValidator {
    resources: Vec<PathBuf>,
    target: Target,
    rules: Vec<Box<dyn ValidationRule>>,
    schema: Value,
    stop_on_first_violation: bool,
}

impl ResourceValidator {
    /// Validate a single descriptor file or every file in a directory
    /// (non recursive). Starts with the bundled master schema, no
    /// ignore rules and fail fast reporting.
    pub fn new<P: AsRef<Path>>(input: P) -> Result<Self, ValidationError> {
        let input = input.as_ref();
        let resources = if input.is_dir() {
            // directory iteration order is platform dependent, sort for
            // a deterministic validation and reporting order
            let mut files: Vec<PathBuf> = fs::read_dir(input)?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            files.sort();
            files
        } else {
            vec![input.to_path_buf()]
        };

        let schema = serde_json::from_str(SCHEMA_JSON)
            .map_err(|err| ValidationError::Schema(err.to_string()))?;

        Ok(Self {
            resources,
            target: Target::Kubernetes,
            rules: Vec::new(),
            schema,
            stop_on_first_violation: true,
        })
    }

    /// Set the target platform and install its stock ignore rules
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self.rules = default_rules(target);
        self
    }

    pub fn with_rule(mut self, rule: Box<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replace the bundled master schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_schema_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ValidationError> {
        let file = File::open(path.as_ref())?;
        self.schema = serde_json::from_reader(file)
            .map_err(|err| ValidationError::Schema(err.to_string()))?;
        Ok(self)
    }

    /// Report every failing resource instead of stopping at the first
    pub fn aggregate_violations(mut self) -> Self {
        self.stop_on_first_violation = false;
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Validate all descriptors. Returns the number of resources
    /// processed when every one of them passes, otherwise the
    /// aggregated report of unignored violations.
    pub fn validate(&self) -> Result<usize, ValidationError> {
        let mut compiled: HashMap<String, Validator> = HashMap::new();
        let mut failed: Vec<ResourceViolations> = Vec::new();
        let mut count = 0;

        for resource in &self.resources {
            if !resource.is_file() {
                continue;
            }
            debug!("validating {}", resource.display());

            let doc = read_descriptor(resource)?;
            let kind = match doc.get("kind").and_then(Value::as_str) {
                Some(kind) => kind.to_lowercase(),
                None => {
                    return Err(ValidationError::MissingKind {
                        path: resource.clone(),
                    })
                }
            };

            let validator = match compiled.entry(kind) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let schema = specialize_schema(&self.schema, entry.key())?;
                    let validator = jsonschema::validator_for(&schema)
                        .map_err(|err| ValidationError::Schema(err.to_string()))?;
                    entry.insert(validator)
                }
            };

            let violations: Vec<Violation> = validator
                .iter_errors(&doc)
                .map(as_violation)
                .filter(|violation| !self.ignored(violation))
                .collect();

            if !violations.is_empty() {
                let report = ResourceViolations {
                    resource: resource.clone(),
                    violations,
                };
                if self.stop_on_first_violation {
                    return Err(ConstraintViolations {
                        resources: vec![report],
                    }
                    .into());
                }
                failed.push(report);
            }
            count += 1;
        }

        if failed.is_empty() {
            Ok(count)
        } else {
            Err(ConstraintViolations { resources: failed }.into())
        }
    }

    fn ignored(&self, violation: &Violation) -> bool {
        self.rules.iter().any(|rule| rule.ignore(violation))
    }
}

// YAML is a superset of JSON, one parse path handles both formats
fn read_descriptor(path: &Path) -> Result<Value, ValidationError> {
    let file = File::open(path)?;
    serde_yaml::from_reader(file).map_err(|source| ValidationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace the master schema's top level `properties` with the
/// subtree describing this kind. An unknown kind is an error, never
/// silently skipped.
fn specialize_schema(master: &Value, kind: &str) -> Result<Value, ValidationError> {
    let properties = master
        .get("resources")
        .and_then(|resources| resources.get(kind))
        .and_then(|entry| entry.get("properties"))
        .cloned()
        .ok_or_else(|| ValidationError::UnknownKind(kind.to_owned()))?;

    let mut schema = master.clone();
    let root = schema
        .as_object_mut()
        .ok_or_else(|| ValidationError::Schema("schema root must be an object".to_owned()))?;
    root.remove("id");
    root.remove("resources");
    root.insert("properties".to_owned(), properties);
    Ok(schema)
}

fn as_violation(error: jsonschema::ValidationError<'_>) -> Violation {
    let schema_path = error.schema_path.to_string();
    let constraint = schema_path.rsplit('/').next().unwrap_or_default().to_owned();
    Violation {
        path: error.instance_path.to_string(),
        constraint,
        message: error.to_string(),
    }
}
