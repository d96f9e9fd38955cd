//! rolekit - Agent and tool definitions by name
//!
//! Reads declarative agent (`role/<name>/role.yaml`) and tool
//! (`tool/**/<name>.yaml`) definitions from a sandboxed directory tree:
//! - `rolekit_core`: document model, YAML-subset parser, emitter
//! - `rolekit_store`: name resolution, listing and schema validation

// Re-export all public modules
#[allow(ambiguous_glob_reexports)]
pub use rolekit_core::*;
#[allow(ambiguous_glob_reexports)]
pub use rolekit_store::*;
