//! Configuration trees: values, paths, schema tables and typed access.
//!
//! This module handles everything on the loosely-typed side of the codec:
//! - Parsing YAML and JSON documents into [`ConfigMap`] trees
//! - Path-aware typed reads through [`Node`]
//! - Schema tables shared by the encoder and the validator
//! - Validation reports collecting every error and warning

pub mod parser;
pub mod path;
pub mod reader;
pub mod schema;
pub mod validator;
pub mod value;

pub use parser::{ConfigFormat, ConfigParser, find_config_file};
pub use path::FieldPath;
pub use reader::{ExclusivePolicy, Node};
pub use schema::{IntRange, SCHEMA, SchemaTable};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
pub use value::{ConfigMap, ConfigValue, MapBuilder};
