//! Policy Model
//!
//! The in-memory representation of a named, ordered transform pipeline and
//! its serializable YAML/JSON shape.

pub mod codec;
pub mod model;

pub use codec::{content_hash, decode, encode, PolicyFormat};
pub use model::{ParamValue, Parameters, Policy, Transform};
