//! Transform Schema Registry
//!
//! Static catalog of known transform names, categories and parameter ranges.

pub mod catalog;
pub mod registry;

pub use registry::{ParameterRange, SchemaRegistry, TransformCategory, TransformSpec, ValueType};
