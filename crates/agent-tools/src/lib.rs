//! Tool framework
//!
//! A `Tool` is a named, schema-described function the model may invoke.
//! Tools are collected in a `ToolRegistry`, which also produces the
//! definitions sent to the provider.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
