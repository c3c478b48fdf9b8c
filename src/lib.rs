//! plume - scriptable text transformations
//!
//! A script is a rhai source file carrying a `/** ... */` JSON metadata
//! block and a `main(state)` entry point. The engine runs each invocation
//! in a fresh, isolated rhai sandbox:
//! - `state.fullText` / `state.selection` - the document and the selected
//!   substring, both read/write
//! - `state.text` - aliases the selection when one existed at the start of
//!   the invocation, otherwise the full document
//! - `state.postError(message)` - report a non-fatal problem to the host
//!
//! ```
//! use plume::{ScriptDescriptor, ScriptEngine};
//!
//! let source = r#"/**
//!     { "name": "Shout" }
//! **/
//! fn main(state) {
//!     state.text = state.text.to_upper();
//! }
//! "#;
//! let script = ScriptDescriptor::parse(source).unwrap();
//! let result = ScriptEngine::new()
//!     .apply(&script, "hello", "", |_| {})
//!     .unwrap();
//! assert_eq!(result.full_text, "HELLO");
//! ```

pub mod engine;
pub mod script;

pub use engine::{ApplyError, ExecutionBudget, ExecutionResult, ScriptEngine};
pub use script::{LoadError, ScriptDescriptor, ScriptLibrary};
