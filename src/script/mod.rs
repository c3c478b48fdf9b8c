//! Script loading and discovery
//!
//! A script file is plain rhai source with a JSON metadata block in a
//! `/** ... */` comment. The block is parsed once into a
//! [`ScriptDescriptor`]; the body is kept verbatim and re-run by the
//! engine on every invocation.

mod descriptor;
mod library;

pub use descriptor::{LoadError, ScriptDescriptor};
pub use library::{ScriptLibrary, default_scripts_dir};
