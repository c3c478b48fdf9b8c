//! Per-invocation rhai sandbox
//!
//! Every invocation gets a brand new `rhai::Engine` and `Scope`; nothing
//! is pooled or reused, so two invocations can never observe each other's
//! globals. The `state` object is the only binding the host injects.

use std::time::Instant;

use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, Scope};
use tracing::debug;

use super::state::{DocumentState, ErrorSink, ExecutionResult};
use super::{ApplyError, ExecutionBudget};

pub struct ExecutionContext {
    engine: Engine,
    scope: Scope<'static>,
    state: DocumentState,
}

impl ExecutionContext {
    /// Build a fresh sandbox with `state` bound into its scope.
    pub fn build(
        full_text: &str,
        selection: &str,
        sink: ErrorSink,
        budget: &ExecutionBudget,
    ) -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(64, 64);
        if let Some(ops) = budget.max_operations {
            engine.set_max_operations(ops);
        }
        if let Some(timeout) = budget.timeout {
            let deadline = Instant::now() + timeout;
            engine.on_progress(move |_| (Instant::now() >= deadline).then(|| Dynamic::UNIT));
        }

        engine
            .register_type_with_name::<DocumentState>("DocumentState")
            .register_get_set(
                "fullText",
                |s: &mut DocumentState| s.full_text(),
                |s: &mut DocumentState, v: String| s.set_full_text(v),
            )
            .register_get_set(
                "selection",
                |s: &mut DocumentState| s.selection(),
                |s: &mut DocumentState, v: String| s.set_selection(v),
            )
            .register_get_set(
                "text",
                |s: &mut DocumentState| s.text(),
                |s: &mut DocumentState, v: String| s.set_text(v),
            )
            .register_fn("postError", |s: &mut DocumentState, message: &str| {
                s.post_error(message)
            });

        let state = DocumentState::new(full_text.to_string(), selection.to_string(), sink);
        let mut scope = Scope::new();
        scope.push("state", state.clone());

        Self {
            engine,
            scope,
            state,
        }
    }

    /// Evaluate the script body, then call its `main(state)` entry point.
    ///
    /// Top-level statements run first (any side effects there are accepted
    /// script behavior, including `postError` calls), exactly once; the
    /// entry-point call does not re-evaluate them.
    pub fn invoke(&mut self, body: &str) -> Result<(), ApplyError> {
        let ast = self
            .engine
            .compile(body)
            .map_err(|e| ApplyError::Runtime(e.to_string()))?;
        self.engine
            .run_ast_with_scope(&mut self.scope, &ast)
            .map_err(map_eval_error)?;

        if !ast.iter_functions().any(|f| f.name == "main") {
            return Err(ApplyError::EntryPointMissing);
        }
        debug!("calling script entry point");

        let options = CallFnOptions::new().eval_ast(false);
        self.engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut self.scope,
                &ast,
                "main",
                (self.state.clone(),),
            )
            .map(|_| ())
            .map_err(map_eval_error)
    }

    /// Read the document state back out. Only the two state fields are
    /// inspected; any other globals the script created die with the scope.
    pub fn extract(&self) -> ExecutionResult {
        self.state.snapshot()
    }
}

fn map_eval_error(err: Box<EvalAltResult>) -> ApplyError {
    if is_budget_breach(&err) {
        return ApplyError::Timeout;
    }
    match *err {
        // A `main` defined with the wrong arity fails the lookup too.
        EvalAltResult::ErrorFunctionNotFound(ref signature, _)
            if signature == "main" || signature.starts_with("main (") =>
        {
            ApplyError::EntryPointMissing
        }
        ref other => ApplyError::Runtime(other.to_string()),
    }
}

fn is_budget_breach(err: &EvalAltResult) -> bool {
    match err {
        EvalAltResult::ErrorTooManyOperations(_) | EvalAltResult::ErrorTerminated(..) => true,
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => is_budget_breach(inner),
        _ => false,
    }
}
