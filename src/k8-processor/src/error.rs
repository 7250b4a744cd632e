use std::io::Error as IoError;

use serde_yaml::Error as SerdeYamlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("Yaml error: {0}")]
    SerdeError(#[from] SerdeYamlError),
    #[error("no {role} with name '{name}' found to include, please check spelling and your project dependencies")]
    MissingInclude { role: String, name: String },
    #[error("duplicate {role} name '{name}' among discovered units")]
    DuplicateName { role: String, name: String },
    #[error("cannot merge profiles with different names ({first} vs. {second})")]
    ProfileNameMismatch { first: String, second: String },
    #[error("no profile '{0}' defined")]
    MissingProfile(String),
}
