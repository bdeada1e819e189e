use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Expr, ExprKind, Module, Mutability, Program, Stmt, StmtKind, Visibility},
        expressions::{Literal, Postfix},
        statements::{Block, EnumDef, ErrorDecl, FuncDef, StructDef},
        types::{EnumType, EnumVariant, StructMember, StructType, Type},
    },
    errors::{diagnostics::Diagnostics, errors::ErrorImpl},
};

use super::scope::{ParamInfo, ScopeId, ScopeKind, ScopeTree, Symbol, SymbolId, SymbolKind};

/// Name of the implicit receiver of instance methods.
pub const SELF: &str = "self";
/// Name of the implicit receiver of `!selferr{...}` functions.
pub const SELF_ERR: &str = "selferr";

/// Builds the scope tree of a whole program.
///
/// Module scopes are created before any body is walked so `use` statements
/// can refer to modules declared later in the program.
pub fn collect(program: &Program, diagnostics: &mut Diagnostics) -> ScopeTree {
    let mut collector = Collector {
        tree: ScopeTree::new(),
        diagnostics,
    };

    let global = collector.tree.global_scope();
    let mut module_scopes = vec![];
    for module in &program.modules {
        let scope = collector.tree.create_scope(ScopeKind::Module, &module.name, Some(global));
        collector.tree.bind_node(module.id, scope);
        collector.tree.register_module(&module.name, scope);
        module_scopes.push(scope);
    }

    for (module, scope) in program.modules.iter().zip(module_scopes) {
        collector.collect_module(module, scope);
    }

    debug!(scopes = collector.tree.all_scopes().count(), "collected scope tree");
    collector.tree
}

struct Collector<'a> {
    tree: ScopeTree,
    diagnostics: &'a mut Diagnostics,
}

impl Collector<'_> {
    fn collect_module(&mut self, module: &Module, scope: ScopeId) {
        trace!(module = %module.name, "collecting module");
        for stmt in &module.body {
            self.collect_stmt(scope, stmt);
        }
    }

    fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Option<SymbolId> {
        let name = symbol.name.clone();
        let span = symbol.span.clone();
        match self.tree.insert_symbol(scope, symbol) {
            Ok(id) => Some(id),
            Err(_) => {
                self.diagnostics
                    .report_error(ErrorImpl::DuplicateSymbol { name }, span);
                None
            }
        }
    }

    fn collect_block(&mut self, parent: ScopeId, block: &Block, kind: ScopeKind) -> ScopeId {
        let scope = self.tree.create_scope(kind, "<block>", Some(parent));
        self.tree.bind_node(block.id, scope);
        for stmt in block.iter() {
            self.collect_stmt(scope, stmt);
        }
        scope
    }

    fn collect_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.collect_expr(scope, expr),
            StmtKind::Block(block) => {
                self.collect_block(scope, block, ScopeKind::Block);
            }
            StmtKind::Let(let_stmt) => {
                if let Some(value) = &let_stmt.value {
                    self.collect_expr(scope, value);
                }
                let mut symbol = Symbol::new(&let_stmt.name, SymbolKind::Variable, stmt.span.clone());
                symbol.visibility = let_stmt.visibility;
                symbol.mutability = let_stmt.mutability;
                symbol.initialized = let_stmt.value.is_some();
                symbol.metadata.annotation = let_stmt.ty.clone();
                symbol.metadata.initializer = let_stmt.value.clone();
                self.declare(scope, symbol);
            }
            StmtKind::Def(def) => {
                let mut symbol = Symbol::new(&def.name, SymbolKind::Definition, stmt.span.clone());
                symbol.visibility = def.visibility;
                symbol.initialized = true;
                symbol.metadata.annotation = def.ty.clone();

                match &def.value.kind {
                    ExprKind::Type(Type::ErrSet(members)) => {
                        let set_scope = self.tree.create_scope(ScopeKind::ErrorSet, &def.name, Some(scope));
                        self.tree.bind_node(stmt.id, set_scope);
                        for member in members {
                            let mut error = Symbol::new(member, SymbolKind::Error, stmt.span.clone());
                            error.visibility = Visibility::Public;
                            error.ty = Some(Type::ErrSet(members.clone()));
                            error.declared = true;
                            error.initialized = true;
                            self.declare(set_scope, error);
                        }
                        symbol.ty = Some(Type::ErrSet(members.clone()));
                        symbol.metadata.denotes_type = true;
                        symbol.metadata.scope = Some(set_scope);
                    }
                    ExprKind::Type(ty) => {
                        symbol.metadata.denotes_type = true;
                        symbol.metadata.type_value = Some(ty.clone());
                    }
                    _ => {
                        self.collect_expr(scope, &def.value);
                        symbol.metadata.initializer = Some(def.value.clone());
                    }
                }
                self.declare(scope, symbol);
            }
            StmtKind::Func(func) => self.collect_function(scope, func, None),
            StmtKind::Struct(def) => self.collect_struct(scope, def),
            StmtKind::Enum(def) => self.collect_enum(scope, def),
            StmtKind::Use(use_stmt) => {
                let target = self.tree.module_scope(&use_stmt.module);
                if use_stmt.wildcard {
                    if let Some(target) = target {
                        self.tree.get_scope_mut(scope).wildcard_imports.push(target);
                    }
                }
                let name = use_stmt.alias.as_deref().unwrap_or(&use_stmt.module);
                let mut symbol = Symbol::new(name, SymbolKind::Use, stmt.span.clone());
                symbol.declared = true;
                symbol.initialized = true;
                symbol.metadata.scope = target;
                symbol.metadata.module = Some(use_stmt.module.clone());
                self.declare(scope, symbol);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.collect_expr(scope, value);
                }
            }
            StmtKind::Throw(value) => self.collect_expr(scope, value),
            StmtKind::While(while_stmt) => {
                self.collect_expr(scope, &while_stmt.condition);
                self.collect_block(scope, &while_stmt.body, ScopeKind::Loop);
            }
            StmtKind::For(for_stmt) => {
                self.collect_expr(scope, &for_stmt.iterable);
                let body = self.tree.create_scope(ScopeKind::Loop, "<for>", Some(scope));
                self.tree.bind_node(for_stmt.body.id, body);
                let mut binding = Symbol::new(&for_stmt.binding, SymbolKind::Variable, stmt.span.clone());
                binding.declared = true;
                binding.initialized = true;
                self.declare(body, binding);
                for inner in for_stmt.body.iter() {
                    self.collect_stmt(body, inner);
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
        }
    }

    fn collect_function(&mut self, scope: ScopeId, func: &FuncDef, owner: Option<&Type>) {
        let body = self.tree.create_scope(ScopeKind::Function, &func.name, Some(scope));
        self.tree.bind_node(func.id, body);
        self.tree.bind_node(func.body.id, body);

        let is_method = owner.is_some();
        let mut symbol = Symbol::new(&func.name, SymbolKind::Function, func.span.clone());
        symbol.visibility = func.visibility;
        symbol.declared = true;
        symbol.initialized = true;
        symbol.metadata.params = func
            .params
            .iter()
            .filter(|param| !(is_method && param.name == SELF))
            .map(|param| ParamInfo {
                name: param.name.clone(),
                ty: param.ty.clone(),
                has_default: param.default.is_some(),
            })
            .collect();
        symbol.metadata.return_type = func.return_type.clone();
        symbol.metadata.error = func.error.clone();
        symbol.metadata.scope = Some(body);
        symbol.metadata.is_method = is_method;
        self.declare(scope, symbol);

        if let Some(owner) = owner {
            let has_explicit_self = func.params.iter().any(|param| param.name == SELF);
            if !func.is_static() && !has_explicit_self {
                let mut receiver = Symbol::new(SELF, SymbolKind::Parameter, func.span.clone());
                receiver.ty = Some(owner.clone());
                receiver.mutability = Mutability::Mutable;
                receiver.declared = true;
                receiver.initialized = true;
                self.declare(body, receiver);
            }
        }

        if let Some(ErrorDecl::SelfGroup(members)) = &func.error {
            let mut receiver = Symbol::new(SELF_ERR, SymbolKind::Error, func.span.clone());
            receiver.ty = Some(Type::ErrSet(members.clone()));
            receiver.declared = true;
            receiver.initialized = true;
            self.declare(body, receiver);
        }

        for param in &func.params {
            let mut parameter = Symbol::new(&param.name, SymbolKind::Parameter, param.span.clone());
            parameter.visibility = param.visibility;
            parameter.mutability = param.mutability;
            parameter.declared = true;
            parameter.initialized = true;
            parameter.metadata.annotation = Some(param.ty.clone());
            parameter.metadata.initializer = param.default.clone();
            if param.name == SELF {
                parameter.ty = owner.cloned();
            }
            self.declare(body, parameter);
        }

        for stmt in func.body.iter() {
            self.collect_stmt(body, stmt);
        }
    }

    fn collect_struct(&mut self, scope: ScopeId, def: &StructDef) {
        let members_scope = self.tree.create_scope(ScopeKind::Struct, &def.name, Some(scope));
        self.tree.bind_node(def.id, members_scope);

        let ty = Type::Struct(StructType {
            name: def.name.clone(),
            members: def
                .fields
                .iter()
                .map(|field| StructMember {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                })
                .collect(),
            scope: Some(members_scope),
        });

        let mut symbol = Symbol::new(&def.name, SymbolKind::Definition, def.span.clone());
        symbol.visibility = def.visibility;
        symbol.ty = Some(ty.clone());
        symbol.initialized = true;
        symbol.metadata.denotes_type = true;
        symbol.metadata.scope = Some(members_scope);
        self.declare(scope, symbol);

        for field in &def.fields {
            let mut member = Symbol::new(&field.name, SymbolKind::StructField, field.span.clone());
            member.visibility = field.visibility;
            member.mutability = field.mutability;
            member.declared = true;
            member.initialized = field.default.is_some();
            member.metadata.annotation = Some(field.ty.clone());
            member.metadata.initializer = field.default.clone();
            self.declare(members_scope, member);
        }

        for method in &def.methods {
            self.collect_function(members_scope, method, Some(&ty));
        }
    }

    fn collect_enum(&mut self, scope: ScopeId, def: &EnumDef) {
        let members_scope = self.tree.create_scope(ScopeKind::Enum, &def.name, Some(scope));
        self.tree.bind_node(def.id, members_scope);

        let ty = Type::Enum(EnumType {
            name: def.name.clone(),
            variants: def
                .variants
                .iter()
                .map(|variant| EnumVariant {
                    name: variant.name.clone(),
                    payload: variant.payload.clone(),
                })
                .collect(),
            scope: Some(members_scope),
        });

        let mut symbol = Symbol::new(&def.name, SymbolKind::Definition, def.span.clone());
        symbol.visibility = def.visibility;
        symbol.ty = Some(ty.clone());
        symbol.initialized = true;
        symbol.metadata.denotes_type = true;
        symbol.metadata.scope = Some(members_scope);
        self.declare(scope, symbol);

        for variant in &def.variants {
            let mut member = Symbol::new(&variant.name, SymbolKind::EnumVariant, variant.span.clone());
            member.visibility = Visibility::Public;
            member.ty = Some(ty.clone());
            member.declared = true;
            member.initialized = true;
            member.metadata.annotation = variant.payload.clone();
            self.declare(members_scope, member);
        }

        for method in &def.methods {
            self.collect_function(members_scope, method, Some(&ty));
        }
    }

    /// Expressions only matter to the collector where they open scopes.
    fn collect_expr(&mut self, scope: ScopeId, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(Literal::Array(elements)) | ExprKind::Tuple(elements) => {
                for element in elements {
                    self.collect_expr(scope, element);
                }
            }
            ExprKind::Literal(_)
            | ExprKind::Ident(_)
            | ExprKind::Type(_)
            | ExprKind::Unreachable => {}
            ExprKind::Paren(inner)
            | ExprKind::Typeof(inner)
            | ExprKind::Sizeof(inner)
            | ExprKind::Try(inner) => self.collect_expr(scope, inner),
            ExprKind::Object(object) => {
                for field in &object.fields {
                    self.collect_expr(scope, &field.value);
                }
            }
            ExprKind::Binary(binary) => {
                self.collect_expr(scope, &binary.left);
                self.collect_expr(scope, &binary.right);
            }
            ExprKind::Prefix(prefix) => self.collect_expr(scope, &prefix.operand),
            ExprKind::Postfix(postfix) => match postfix {
                Postfix::Call(call) => {
                    self.collect_expr(scope, &call.callee);
                    for arg in &call.args {
                        self.collect_expr(scope, arg);
                    }
                }
                Postfix::Index(index) => {
                    self.collect_expr(scope, &index.base);
                    self.collect_expr(scope, &index.index);
                }
                Postfix::Member(member) => self.collect_expr(scope, &member.base),
                Postfix::Increment(operand)
                | Postfix::Decrement(operand)
                | Postfix::Deref(operand) => self.collect_expr(scope, operand),
            },
            ExprKind::As(cast) => self.collect_expr(scope, &cast.expr),
            ExprKind::Orelse(orelse) => {
                self.collect_expr(scope, &orelse.left);
                self.collect_expr(scope, &orelse.right);
            }
            ExprKind::Range(range) => {
                if let Some(start) = &range.start {
                    self.collect_expr(scope, start);
                }
                if let Some(end) = &range.end {
                    self.collect_expr(scope, end);
                }
            }
            ExprKind::Catch(catch) => {
                self.collect_expr(scope, &catch.expr);
                let handler = self.tree.create_scope(ScopeKind::Catch, "<catch>", Some(scope));
                self.tree.bind_node(expr.id, handler);
                if let Some(binding) = &catch.binding {
                    let mut symbol = Symbol::new(binding, SymbolKind::Variable, expr.span.clone());
                    symbol.ty = Some(Type::err());
                    symbol.declared = true;
                    symbol.initialized = true;
                    self.declare(handler, symbol);
                }
                self.collect_stmt(handler, &catch.handler);
            }
            ExprKind::If(if_expr) => {
                self.collect_expr(scope, &if_expr.condition);
                self.collect_stmt(scope, &if_expr.then_branch);
                if let Some(else_branch) = &if_expr.else_branch {
                    self.collect_stmt(scope, else_branch);
                }
            }
            ExprKind::Match(match_expr) => {
                self.collect_expr(scope, &match_expr.subject);
                for case in &match_expr.cases {
                    self.collect_stmt(scope, &case.body);
                }
                if let Some(default) = &match_expr.default {
                    self.collect_stmt(scope, default);
                }
            }
        }
    }
}
