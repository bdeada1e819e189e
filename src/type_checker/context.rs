use crate::{ast::types::Type, Span};

/// Everything the tracker knows at one point of the walk. Cloned wholesale
/// for snapshot and restore.
#[derive(Debug, Clone, Default)]
pub struct ContextState {
    spans: Vec<Span>,
    module_name: String,
    module_path: String,
    loop_depth: usize,
    declarations: Vec<String>,
    expected: Vec<Option<Type>>,
}

/// Tracks where the checker currently is: the spans being walked, the
/// module, loop nesting, the declaration being validated and the type the
/// surrounding code expects from the current expression.
#[derive(Debug, Default)]
pub struct ContextTracker {
    state: ContextState,
}

impl ContextTracker {
    pub fn new() -> Self {
        ContextTracker::default()
    }

    pub fn push_span(&mut self, span: Span) {
        self.state.spans.push(span);
    }

    pub fn pop_span(&mut self) {
        self.state.spans.pop();
    }

    /// Innermost span being walked, or a null span outside any node.
    pub fn current_span(&self) -> Span {
        self.state.spans.last().cloned().unwrap_or_default()
    }

    pub fn set_module(&mut self, name: &str, path: &str) {
        self.state.module_name = name.to_string();
        self.state.module_path = path.to_string();
    }

    pub fn module_name(&self) -> &str {
        &self.state.module_name
    }

    pub fn module_path(&self) -> &str {
        &self.state.module_path
    }

    pub fn enter_loop(&mut self) {
        self.state.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.state.loop_depth = self.state.loop_depth.saturating_sub(1);
    }

    pub fn is_in_loop(&self) -> bool {
        self.state.loop_depth > 0
    }

    pub fn loop_depth(&self) -> usize {
        self.state.loop_depth
    }

    /// Function bodies start outside of any loop.
    pub fn reset_loops(&mut self) -> usize {
        std::mem::take(&mut self.state.loop_depth)
    }

    pub fn restore_loops(&mut self, depth: usize) {
        self.state.loop_depth = depth;
    }

    pub fn push_declaration(&mut self, name: &str) {
        self.state.declarations.push(name.to_string());
    }

    pub fn pop_declaration(&mut self) {
        self.state.declarations.pop();
    }

    pub fn current_declaration(&self) -> Option<&str> {
        self.state.declarations.last().map(String::as_str)
    }

    /// `None` masks any expectation of the enclosing expression.
    pub fn push_expected(&mut self, expected: Option<Type>) {
        self.state.expected.push(expected);
    }

    pub fn pop_expected(&mut self) {
        self.state.expected.pop();
    }

    pub fn current_expected(&self) -> Option<&Type> {
        self.state.expected.last().and_then(Option::as_ref)
    }

    pub fn snapshot(&self) -> ContextState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: ContextState) {
        self.state = state;
    }
}
