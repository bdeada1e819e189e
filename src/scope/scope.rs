use rustc_hash::FxHashMap;

use crate::{
    ast::{
        ast::{Expr, Mutability, NodeId, Visibility},
        statements::{ErrorDecl, ErrorMode},
        types::Type,
    },
    Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Struct,
    Enum,
    ErrorSet,
    Function,
    Block,
    Loop,
    Catch,
}

impl ScopeKind {
    /// Scopes whose variables only exist after their declaration runs.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            ScopeKind::Function | ScopeKind::Block | ScopeKind::Loop | ScopeKind::Catch
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    StructField,
    EnumVariant,
    Definition,
    Error,
    Use,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: Type,
    pub has_default: bool,
}

/// Everything the collector learned about a symbol beyond its name and kind.
#[derive(Debug, Clone, Default)]
pub struct SymbolMetadata {
    /// Declared parameters of a function (implicit `self` excluded).
    pub params: Vec<ParamInfo>,
    pub return_type: Option<Type>,
    pub error: Option<ErrorDecl>,
    /// Member scope of a struct/enum/error set, body scope of a function,
    /// target module scope of a `use`.
    pub scope: Option<ScopeId>,
    /// Declared type annotation (field, parameter, binding, variant payload).
    pub annotation: Option<Type>,
    /// Initializer or default value, used to type the symbol lazily.
    pub initializer: Option<Expr>,
    /// The type a type-denoting definition stands for, before resolution.
    pub type_value: Option<Type>,
    pub denotes_type: bool,
    pub is_method: bool,
    pub module: Option<String>,
}

impl SymbolMetadata {
    pub fn default_arg_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.has_default)
            .map(|(index, _)| index)
            .collect()
    }

    /// Arguments a call has to provide: everything up to the first default.
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .position(|param| param.has_default)
            .unwrap_or(self.params.len())
    }

    pub fn error_mode(&self) -> Option<ErrorMode> {
        self.error.as_ref().map(ErrorDecl::mode)
    }

    pub fn self_group(&self) -> &[String] {
        self.error.as_ref().map(ErrorDecl::self_group).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<Type>,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub metadata: SymbolMetadata,
    pub scope: ScopeId,
    pub span: Span,
    pub declared: bool,
    pub initialized: bool,
    pub used: bool,
    pub is_type_checked: bool,
}

impl Symbol {
    pub fn new(name: &str, kind: SymbolKind, span: Span) -> Self {
        Symbol {
            id: SymbolId(u32::MAX),
            name: name.to_string(),
            kind,
            ty: None,
            visibility: Visibility::Private,
            mutability: Mutability::Immutable,
            metadata: SymbolMetadata::default(),
            scope: ScopeId(u32::MAX),
            span,
            declared: false,
            initialized: false,
            used: false,
            is_type_checked: false,
        }
    }

    pub fn is_static(&self) -> bool {
        self.visibility == Visibility::Static
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub wildcard_imports: Vec<ScopeId>,
    symbols: FxHashMap<String, SymbolId>,
    order: Vec<SymbolId>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    /// Symbols in declaration order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.order
    }
}

/// The lexical scope tree and the symbols it owns.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
    global: ScopeId,
    node_scopes: FxHashMap<NodeId, ScopeId>,
    module_scopes: FxHashMap<String, ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut tree = ScopeTree {
            scopes: vec![],
            symbols: vec![],
            current: ScopeId(0),
            global: ScopeId(0),
            node_scopes: FxHashMap::default(),
            module_scopes: FxHashMap::default(),
        };
        tree.global = tree.create_scope(ScopeKind::Global, "<global>", None);
        tree.current = tree.global;
        tree
    }

    pub fn create_scope(&mut self, kind: ScopeKind, name: &str, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            kind,
            name: name.to_string(),
            parent,
            children: vec![],
            wildcard_imports: vec![],
            symbols: FxHashMap::default(),
            order: vec![],
        });
        if let Some(parent) = parent {
            self.scopes[parent.0 as usize].children.push(id);
        }
        id
    }

    pub fn register_module(&mut self, name: &str, scope: ScopeId) {
        self.module_scopes.insert(name.to_string(), scope);
    }

    pub fn module_scope(&self, name: &str) -> Option<ScopeId> {
        self.module_scopes.get(name).copied()
    }

    pub fn bind_node(&mut self, node: NodeId, scope: ScopeId) {
        self.node_scopes.insert(node, scope);
    }

    pub fn scope_for_node(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// Inserts `symbol` into `scope`. A name already taken in that scope is
    /// rejected and the existing symbol returned as the error.
    pub fn insert_symbol(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.scopes[scope.0 as usize].get(&symbol.name) {
            return Err(existing);
        }
        let id = SymbolId(self.symbols.len() as u32);
        symbol.id = id;
        symbol.scope = scope;
        let target = &mut self.scopes[scope.0 as usize];
        target.symbols.insert(symbol.name.clone(), id);
        target.order.push(id);
        self.symbols.push(symbol);
        Ok(id)
    }

    pub fn get_symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn get_scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn get_scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn set_current_scope(&mut self, id: ScopeId) {
        self.current = id;
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn scope_parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get_scope(id).parent
    }

    pub fn all_scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Innermost-first lookup starting at the current scope.
    pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        self.lookup_from(self.current, name)
    }

    /// Innermost-first lookup starting at `scope`.
    ///
    /// Locals not yet declared are skipped so an outer binding of the same
    /// name stays visible. A scope's wildcard imports are searched for
    /// public symbols after its own symbols.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let current = self.get_scope(id);
            if let Some(symbol_id) = current.get(name) {
                let symbol = self.get_symbol(symbol_id);
                let pending_local = current.kind.is_local()
                    && symbol.kind == SymbolKind::Variable
                    && !symbol.declared;
                if !pending_local {
                    return Some(symbol_id);
                }
            }
            for import in &current.wildcard_imports {
                if let Some(symbol_id) = self.get_scope(*import).get(name) {
                    if self.get_symbol(symbol_id).is_public() {
                        return Some(symbol_id);
                    }
                }
            }
            cursor = current.parent;
        }
        None
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.get_scope(scope).get(name)
    }

    pub fn find_child_scope_by_name(&self, parent: ScopeId, name: &str, kind: ScopeKind) -> Option<ScopeId> {
        self.get_scope(parent)
            .children
            .iter()
            .copied()
            .find(|child| {
                let scope = self.get_scope(*child);
                scope.kind == kind && scope.name == name
            })
    }

    pub fn find_scope_by_name(&self, name: &str, kind: ScopeKind) -> Option<ScopeId> {
        self.scopes
            .iter()
            .find(|scope| scope.kind == kind && scope.name == name)
            .map(|scope| scope.id)
    }

    /// Whether `scope` is `ancestor` or nested inside it.
    pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.scope_parent(id);
        }
        false
    }

    /// Nearest scope of `kind` enclosing `scope` (inclusive).
    pub fn enclosing(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            if self.get_scope(id).kind == kind {
                return Some(id);
            }
            cursor = self.scope_parent(id);
        }
        None
    }
}
