//! Passive data definitions for the raw model input, plus YAML parsing.

pub mod parser;
pub mod types;

pub use parser::{parse_models, parse_models_str};
pub use types::{FieldKind, ModelSet, RawEntity, RawField, ScalarKind};
