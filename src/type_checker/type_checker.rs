use std::{mem, rc::Rc};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{
    ast::{
        ast::{Expr, Program},
        statements::ErrorMode,
        types::Type,
    },
    comptime::{comptime::ComptimeEvaluator, evaluator::LiteralEvaluator},
    errors::{
        diagnostics::{Diagnostics, Severity},
        errors::{Error, ErrorImpl},
    },
    scope::{
        collector::collect,
        scope::{ScopeId, ScopeTree, SymbolId},
    },
    Span,
};

use super::{
    cache::{ExprKey, TypeCache},
    context::ContextTracker,
    validate::validate_module,
};

#[derive(Debug, Clone)]
pub struct CheckerOptions {
    /// Maximum number of memoized expression types.
    pub cache_capacity: usize,
    /// Report invalid `as` casts as errors rather than warnings.
    pub strict_casts: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            cache_capacity: 4096,
            strict_casts: true,
        }
    }
}

/// State of the function whose body is being validated.
#[derive(Debug, Clone)]
pub struct FunctionFrame {
    pub name: String,
    /// Resolved return type; `None` when the declared type failed to resolve.
    pub return_type: Option<Type>,
    pub error_type: Option<Type>,
    pub error_mode: Option<ErrorMode>,
    pub self_group: Vec<String>,
    pub has_return: bool,
    pub has_throw: bool,
    pub is_static: bool,
    pub struct_scope: Option<ScopeId>,
}

/// One analysis session over a program.
///
/// Inference and validation are free functions borrowing the session
/// mutably; the session owns the scope tree, the diagnostics and every
/// piece of pass state.
pub struct TypeChecker {
    program: Rc<Program>,
    pub options: CheckerOptions,
    pub scopes: ScopeTree,
    pub diagnostics: Diagnostics,
    pub context: ContextTracker,
    pub evaluator: Box<dyn ComptimeEvaluator>,
    pub cache: TypeCache,
    /// Expressions whose inference is in flight.
    pub inference_stack: FxHashSet<ExprKey>,
    /// Type definitions whose resolution or cycle check is in flight.
    pub circular_stack: Vec<SymbolId>,
    pub frame: Option<FunctionFrame>,
    pub current_module: u32,
    pass_start: usize,
}

impl TypeChecker {
    /// Collects the program's scopes; duplicate declarations found there are
    /// part of the first pass's diagnostics.
    pub fn new(program: Program, options: CheckerOptions) -> Self {
        let mut diagnostics = Diagnostics::new();
        let scopes = collect(&program, &mut diagnostics);

        TypeChecker {
            program: Rc::new(program),
            cache: TypeCache::new(options.cache_capacity),
            options,
            scopes,
            diagnostics,
            context: ContextTracker::new(),
            evaluator: Box::new(LiteralEvaluator::new()),
            inference_stack: FxHashSet::default(),
            circular_stack: vec![],
            frame: None,
            current_module: 0,
            pass_start: 0,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn ComptimeEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Validates every module. Returns `false` iff an error was reported
    /// during this pass; warnings do not count.
    #[tracing::instrument(skip_all)]
    pub fn handle(&mut self) -> bool {
        let program = Rc::clone(&self.program);

        for (index, module) in program.modules.iter().enumerate() {
            self.current_module = index as u32;
            if let Err(error) = validate_module(self, module) {
                self.report_internal(error);
            }
        }

        let errors = self.diagnostics.errors_since(self.pass_start);
        debug!(errors, diagnostics = self.diagnostics.len(), "validation pass finished");
        self.pass_start = self.diagnostics.len();
        errors == 0
    }

    /// Clears the pass state so `handle` can run again.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.inference_stack.clear();
        self.circular_stack.clear();
        self.frame = None;
        self.context = ContextTracker::new();
        let global = self.scopes.global_scope();
        self.scopes.set_current_scope(global);
        self.pass_start = self.diagnostics.len();
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn expr_key(&self, expr: &Expr) -> ExprKey {
        ExprKey {
            module: self.current_module,
            node: expr.id,
            kind: mem::discriminant(&expr.kind),
        }
    }

    /// Turns a failure that escaped a statement into a diagnostic.
    pub fn report_internal(&mut self, error: Error) {
        let error = if matches!(error.get_impl(), ErrorImpl::InternalError { .. }) {
            error
        } else {
            Error::internal(error.to_string(), error.get_span().clone())
        };
        self.diagnostics.push(Severity::Error, error);
    }

    pub fn report_cast(&mut self, error: ErrorImpl, span: &Span) {
        if self.options.strict_casts {
            self.diagnostics.report_error(error, span.clone());
        } else {
            self.diagnostics.report_warning(error, span.clone());
        }
    }

    pub fn with_scope<R>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.scopes.current_scope();
        self.scopes.set_current_scope(scope);
        let result = f(self);
        self.scopes.set_current_scope(previous);
        result
    }

    pub fn with_expected<R>(&mut self, expected: Option<Type>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.context.push_expected(expected);
        let result = f(self);
        self.context.pop_expected();
        result
    }

    pub fn with_saved_state<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let snapshot = self.context.snapshot();
        let scope = self.scopes.current_scope();
        let result = f(self);
        self.scopes.set_current_scope(scope);
        self.context.restore(snapshot);
        result
    }

    /// Runs `f` as a trial: its diagnostics, cached types and frame changes
    /// are discarded. The flag tells whether the trial reported an error.
    pub fn speculate<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> (R, bool) {
        let reported = self.diagnostics.len();
        let frame = self.frame.clone();
        self.cache.begin_trial();
        let result = self.with_saved_state(f);
        self.cache.rollback_trial();
        let failed = self.diagnostics.errors_since(reported) > 0;
        self.diagnostics.truncate(reported);
        self.frame = frame;
        (result, failed)
    }

    pub fn with_loop<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.context.enter_loop();
        let result = f(self);
        self.context.exit_loop();
        result
    }

    pub fn with_circular_guard<R>(&mut self, symbol: SymbolId, f: impl FnOnce(&mut Self) -> R) -> R {
        self.circular_stack.push(symbol);
        let result = f(self);
        self.circular_stack.pop();
        result
    }

    /// Runs `f` with `frame` as the current function and hands back the
    /// frame as `f` left it. The outer frame is restored afterwards.
    pub fn with_function_frame<R>(
        &mut self,
        frame: FunctionFrame,
        f: impl FnOnce(&mut Self) -> R,
    ) -> (Option<FunctionFrame>, R) {
        let outer = self.frame.replace(frame);
        let loops = self.context.reset_loops();
        let result = f(self);
        self.context.restore_loops(loops);
        let finished = mem::replace(&mut self.frame, outer);
        (finished, result)
    }
}
