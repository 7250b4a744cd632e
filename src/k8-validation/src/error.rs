use std::fmt;
use std::io::Error as IoError;
use std::path::PathBuf;

use serde_yaml::Error as SerdeYamlError;
use thiserror::Error;

use crate::Violation;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("failed to parse resource {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: SerdeYamlError,
    },
    #[error("invalid resource {}: 'kind' is missing from resource definition", .path.display())]
    MissingKind { path: PathBuf },
    #[error("unknown kind '{0}' in validation schema")]
    UnknownKind(String),
    #[error("invalid validation schema: {0}")]
    Schema(String),
    /// The descriptors themselves are non conformant, as opposed to a
    /// misconfigured or broken validation run
    #[error("{0}")]
    Constraint(#[from] ConstraintViolations),
}

/// All unignored violations of one resource descriptor
#[derive(Debug)]
pub struct ResourceViolations {
    pub resource: PathBuf,
    pub violations: Vec<Violation>,
}

/// Aggregated validation report, one entry per failing resource
#[derive(Debug)]
pub struct ConstraintViolations {
    pub resources: Vec<ResourceViolations>,
}

impl fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, entry) in self.resources.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "Invalid Resource : {}", entry.resource.display())?;
            for violation in &entry.violations {
                write!(
                    f,
                    "\n[message={}, violation type={}]",
                    violation.message, violation.constraint
                )?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ConstraintViolations {}
