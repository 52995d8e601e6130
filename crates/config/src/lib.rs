//! Configuration schema, parsing, and validation.
//!
//! The embedding host hands the bridge a TOML document at registration time;
//! every field has a default so an empty document is a valid configuration.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::parse_config,
    schema::{IntakeConfig, LoggingConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate_toml_str},
};
