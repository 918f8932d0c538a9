//! Configuration-driven construction of named types.

pub mod arguments;
pub mod descriptor;
pub mod registry;

pub use arguments::Arguments;
pub use descriptor::{DescriptorBuilder, FieldSpec, Loadable, Scalar, ScalarKind, TypeDescriptor};
pub use registry::{LoadOutcome, TypeRegistry};

/// A node of the parsed configuration tree.
pub type ConfigNode = serde_json::Value;
