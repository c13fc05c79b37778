//! The tool facade.
//!
//! Tools are the only way callers reach the booking core. The registry
//! enforces the authorization gate in front of state-mutating tools and
//! converts every failure into user-facing text.

pub mod builtin;

mod registry;
mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolContext, ToolOutput, ToolSchema, optional_str, required_str};
