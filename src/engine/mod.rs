//! The transformation engine
//!
//! One [`ScriptEngine::apply`] call runs one script against one document:
//! build a fresh sandbox, bind `state`, evaluate the body, call
//! `main(state)`, read the state back. Each call is synchronous and
//! self-contained; the only thing shared across calls is the read-only
//! descriptor, so concurrent applies need no locking.

mod context;
mod state;

pub use context::ExecutionContext;
pub use state::{DocumentState, ErrorSink, ExecutionResult, TextTarget};

use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::script::ScriptDescriptor;

/// Why one invocation failed. The document is left untouched in every
/// case; extraction only happens after a successful run.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("script does not define a main(state) function")]
    EntryPointMissing,
    #[error("script error: {0}")]
    Runtime(String),
    #[error("script exceeded its execution budget")]
    Timeout,
}

/// Per-invocation execution limits. `None` means unlimited, which matches
/// a trusted-scripts setup; hosts running third-party scripts should set
/// both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionBudget {
    /// Cap on interpreter operations before the run is aborted.
    pub max_operations: Option<u64>,
    /// Wall-clock deadline for the whole invocation.
    pub timeout: Option<Duration>,
}

/// Applies scripts to documents.
pub struct ScriptEngine {
    budget: ExecutionBudget,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {
            budget: ExecutionBudget::default(),
        }
    }

    pub fn with_budget(budget: ExecutionBudget) -> Self {
        Self { budget }
    }

    /// Run one transformation.
    ///
    /// `on_error` receives the messages the script posts via
    /// `state.postError(..)`; those are advisory and never abort the run.
    /// Failures are propagated to the caller, never swallowed.
    pub fn apply(
        &self,
        script: &ScriptDescriptor,
        full_text: &str,
        selection: &str,
        on_error: impl Fn(&str) + 'static,
    ) -> Result<ExecutionResult, ApplyError> {
        debug!(script = %script.name, "applying script");
        let mut context =
            ExecutionContext::build(full_text, selection, Rc::new(on_error), &self.budget);
        context.invoke(&script.body)?;
        Ok(context.extract())
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn script(body: &str) -> ScriptDescriptor {
        let source = format!("/**\n    {{ \"name\": \"test\" }}\n**/\n{body}");
        ScriptDescriptor::parse(&source).unwrap()
    }

    const UPPERCASE: &str = "fn main(state) { state.text = state.text.to_upper(); }";

    #[test]
    fn selection_takes_precedence() {
        let result = ScriptEngine::new()
            .apply(&script(UPPERCASE), "hello world", "world", |_| {})
            .unwrap();
        assert_eq!(result.full_text, "hello world");
        assert_eq!(result.selection, "WORLD");
    }

    #[test]
    fn full_text_when_no_selection() {
        let result = ScriptEngine::new()
            .apply(&script(UPPERCASE), "hello world", "", |_| {})
            .unwrap();
        assert_eq!(result.full_text, "HELLO WORLD");
        assert_eq!(result.selection, "");
    }

    #[test]
    fn uppercase_is_idempotent() {
        let engine = ScriptEngine::new();
        let upper = script(UPPERCASE);
        let once = engine.apply(&upper, "Hello", "", |_| {}).unwrap();
        let twice = engine
            .apply(&upper, &once.full_text, "", |_| {})
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_entry_point_fails() {
        let err = ScriptEngine::new()
            .apply(&script("let x = 1;"), "doc", "", |_| {})
            .unwrap_err();
        assert!(matches!(err, ApplyError::EntryPointMissing));
    }

    #[test]
    fn script_exception_carries_original_message() {
        let err = ScriptEngine::new()
            .apply(
                &script("fn main(state) { throw \"kaboom\"; }"),
                "doc",
                "",
                |_| {},
            )
            .unwrap_err();
        match err {
            ApplyError::Runtime(message) => assert!(message.contains("kaboom")),
            other => panic!("expected runtime error, got {other:?}"),
        }
    }

    #[test]
    fn post_error_is_non_fatal_and_repeatable() {
        let body = r#"
            fn main(state) {
                state.postError("first");
                state.postError("second");
                state.text = "done";
            }
        "#;
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let result = ScriptEngine::new()
            .apply(&script(body), "doc", "", move |m| {
                sink.borrow_mut().push(m.to_string())
            })
            .unwrap();
        assert_eq!(result.full_text, "done");
        assert_eq!(
            *messages.borrow(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn invocations_are_isolated() {
        let engine = ScriptEngine::new();
        engine
            .apply(
                &script("let leaked = 42;\nfn main(state) {}"),
                "doc",
                "",
                |_| {},
            )
            .unwrap();

        // Top-level code can see the scope, so probe for the leak there.
        let probe = r#"
            state.text = if is_def_var("leaked") { "leaked" } else { "isolated" };
            fn main(state) {}
        "#;
        let result = engine.apply(&script(probe), "doc", "", |_| {}).unwrap();
        assert_eq!(result.full_text, "isolated");
    }

    #[test]
    fn runaway_script_hits_the_budget() {
        let engine = ScriptEngine::with_budget(ExecutionBudget {
            max_operations: Some(10_000),
            timeout: None,
        });
        let err = engine
            .apply(&script("fn main(state) { loop {} }"), "doc", "", |_| {})
            .unwrap_err();
        assert!(matches!(err, ApplyError::Timeout));
    }

    #[test]
    fn uppercase_sample_script() {
        let source = include_str!("../../scripts/uppercase.rhai");
        let upper = ScriptDescriptor::parse(source).unwrap();
        assert_eq!(upper.name, "Uppercase");
        let result = ScriptEngine::new()
            .apply(&upper, "hello world", "", |_| {})
            .unwrap();
        assert_eq!(result.full_text, "HELLO WORLD");
    }

    #[test]
    fn substitute_sample_script() {
        let source = include_str!("../../scripts/substitute.rhai");
        let substitute = ScriptDescriptor::parse(source).unwrap();
        let result = ScriptEngine::new()
            .apply(&substitute, "s/foo/bar/\nfoo baz foo", "", |_| {})
            .unwrap();
        assert_eq!(result.full_text, "bar baz bar");
    }

    #[test]
    fn reverse_lines_sample_script() {
        let source = include_str!("../../scripts/reverse_lines.rhai");
        let reverse = ScriptDescriptor::parse(source).unwrap();
        let result = ScriptEngine::new()
            .apply(&reverse, "a\nb\nc", "", |_| {})
            .unwrap();
        assert_eq!(result.full_text, "c\nb\na");
    }
}
