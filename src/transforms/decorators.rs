//! Decorator lowering pass: options, version dispatch, and the top-level
//! class visitor.
//!
//! The visitor recognises decorated classes anywhere in the program,
//! handles the two export-declaration shapes (splitting the export off,
//! since the pass reassigns the class binding), and implements named
//! evaluation: an anonymous decorated class expression on the right-hand
//! side of a variable initializer, simple assignment, default pattern,
//! object-literal property, or class-field initializer receives the name
//! of its binding target.
//!
//! Version dispatch is a table: the four supported revisions differ only
//! in helper name, flag encoding, receiver tracking, and superclass
//! pass-through.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ast::{NodeArena, NodeIndex, NodeKind, VarKind};
use crate::diagnostics::{codes, Diagnostic};
use crate::scope::Scope;
use crate::span::Span;

use super::decorators_class::{ClassLowering, ElementKind, Lowered};
use super::helpers::HelpersNeeded;

/// Supported revisions of the decorator proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoratorVersion {
    V2021_12,
    V2022_03,
    V2023_01,
    V2023_05,
}

impl DecoratorVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2021-12" => Some(DecoratorVersion::V2021_12),
            "2022-03" => Some(DecoratorVersion::V2022_03),
            "2023-01" => Some(DecoratorVersion::V2023_01),
            "2023-05" => Some(DecoratorVersion::V2023_05),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecoratorVersion::V2021_12 => "2021-12",
            DecoratorVersion::V2022_03 => "2022-03",
            DecoratorVersion::V2023_01 => "2023-01",
            DecoratorVersion::V2023_05 => "2023-05",
        }
    }

    /// Minimum host compiler version able to carry this revision.
    fn min_host(self) -> (u32, u32, u32) {
        match self {
            DecoratorVersion::V2021_12 => (7, 16, 0),
            DecoratorVersion::V2022_03 => (7, 19, 0),
            DecoratorVersion::V2023_01 | DecoratorVersion::V2023_05 => (7, 21, 0),
        }
    }

    /// The element flag of a decoration tuple: low 3 bits hold the kind;
    /// "2023-05" sets bit 3 for static and bit 4 for receiver pairs, the
    /// older revisions add the literal 5 for static instead.
    pub(crate) fn encode_flag(self, kind: ElementKind, is_static: bool, has_this: bool) -> u32 {
        let k = kind as u32;
        match self {
            DecoratorVersion::V2023_05 => {
                k | if is_static { 8 } else { 0 } | if has_this { 16 } else { 0 }
            }
            _ => k + if is_static { 5 } else { 0 },
        }
    }

    fn policy(self, apply_decs_2203_r_available: bool) -> VersionPolicy {
        match self {
            DecoratorVersion::V2021_12 => VersionPolicy {
                helper: "_applyDecs",
                record_shape: false,
                track_this: false,
                emit_super: false,
                set_function_name: false,
                brand_check: false,
            },
            DecoratorVersion::V2022_03 => VersionPolicy {
                helper: if apply_decs_2203_r_available {
                    "_applyDecs2203R"
                } else {
                    "_applyDecs2203"
                },
                record_shape: apply_decs_2203_r_available,
                track_this: false,
                emit_super: false,
                set_function_name: false,
                brand_check: false,
            },
            DecoratorVersion::V2023_01 => VersionPolicy {
                helper: "_applyDecs2301",
                record_shape: true,
                track_this: false,
                emit_super: false,
                set_function_name: false,
                brand_check: true,
            },
            DecoratorVersion::V2023_05 => VersionPolicy {
                helper: "_applyDecs2305",
                record_shape: true,
                track_this: true,
                emit_super: true,
                set_function_name: true,
                brand_check: true,
            },
        }
    }
}

/// Per-version emission policy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VersionPolicy {
    pub helper: &'static str,
    /// `{ e, c }` record return shape vs. the legacy flat array.
    pub record_shape: bool,
    /// Decorator receivers tracked (`[thisArg, dec]` pairs).
    pub track_this: bool,
    /// Superclass memoized and passed through to the helper.
    pub emit_super: bool,
    /// Inferred names bound through `setFunctionName`.
    pub set_function_name: bool,
    /// Instance brand check argument supported.
    pub brand_check: bool,
}

/// Options for constructing the pass.
#[derive(Clone, Debug)]
pub struct DecoratorOptions {
    /// One of "2021-12", "2022-03", "2023-01", "2023-05".
    pub version: String,
    /// How `super` references inside extracted private method bodies are
    /// rewritten. When unset, defaults from the deprecated `loose` flag;
    /// the explicit assumption always wins.
    pub constant_super: Option<bool>,
    /// Deprecated. Only seeds the `constant_super` default.
    pub loose: bool,
    /// Host compiler version, for the construction-time assertion.
    pub host_version: (u32, u32, u32),
    /// Whether the host helper registry carries `applyDecs2203R`; when it
    /// does not, "2022-03" falls back to the flat-shaped `applyDecs2203`.
    pub apply_decs_2203_r_available: bool,
}

impl Default for DecoratorOptions {
    fn default() -> Self {
        DecoratorOptions {
            version: "2023-05".to_string(),
            constant_super: None,
            loose: false,
            host_version: (7, 24, 0),
            apply_decs_2203_r_available: true,
        }
    }
}

/// An inferred name for named evaluation: a plain string, or a template
/// node (memoized computed key) cloned at each use site.
#[derive(Clone, Debug)]
pub(crate) enum NameRef {
    Str(String),
    Node(NodeIndex),
}

/// The decorator lowering pass. One instance per compilation; holds the
/// `Visited` guard and the helper usage tracker. No process-wide state.
#[derive(Debug)]
pub struct DecoratorLowering {
    version: DecoratorVersion,
    policy: VersionPolicy,
    constant_super: bool,
    visited: FxHashSet<NodeIndex>,
    helpers: HelpersNeeded,
}

impl DecoratorLowering {
    pub fn new(options: &DecoratorOptions) -> Result<Self, Diagnostic> {
        let Some(version) = DecoratorVersion::parse(&options.version) else {
            return Err(Diagnostic::config_error(
                format!(
                    "unknown decorator version {:?}; expected one of \
                     \"2021-12\", \"2022-03\", \"2023-01\", \"2023-05\"",
                    options.version
                ),
                codes::UNKNOWN_DECORATOR_VERSION,
            ));
        };
        let min = version.min_host();
        if options.host_version < min {
            return Err(Diagnostic::config_error(
                format!(
                    "decorator version \"{}\" requires host {}.{}.{} or newer",
                    version.as_str(),
                    min.0,
                    min.1,
                    min.2
                ),
                codes::HOST_VERSION_TOO_OLD,
            ));
        }
        Ok(DecoratorLowering {
            version,
            policy: version.policy(options.apply_decs_2203_r_available),
            constant_super: options.constant_super.unwrap_or(options.loose),
            visited: FxHashSet::default(),
            helpers: HelpersNeeded::default(),
        })
    }

    pub fn version(&self) -> DecoratorVersion {
        self.version
    }

    /// Which runtime helpers the rewritten program references.
    pub fn helpers(&self) -> &HelpersNeeded {
        &self.helpers
    }

    /// Rewrite every decorated class in the program. The tree is mutated
    /// in place; statement lists are rebuilt where classes expand into
    /// several statements.
    pub fn transform_program(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        program: NodeIndex,
    ) -> Result<(), Diagnostic> {
        let NodeKind::Program { stmts } = arena.kind(program).clone() else {
            return Ok(());
        };
        let stmts = self.visit_stmt_list(arena, scope, stmts)?;
        arena.replace_kind(program, NodeKind::Program { stmts });
        scope.crawl(arena, program);
        Ok(())
    }

    // =========================================================================
    // Statement traversal
    // =========================================================================

    fn visit_stmt_list(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        stmts: Vec<NodeIndex>,
    ) -> Result<Vec<NodeIndex>, Diagnostic> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let replaced = self.visit_stmt(arena, scope, stmt)?;
            // Locals allocated while visiting this statement are declared
            // right in front of it.
            let pending = scope.take_declared();
            if !pending.is_empty() {
                let names: Vec<&str> = pending.iter().map(String::as_str).collect();
                out.push(arena.var_decl(VarKind::Let, &names));
            }
            out.extend(replaced);
        }
        Ok(out)
    }

    fn visit_block(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        block: NodeIndex,
    ) -> Result<(), Diagnostic> {
        if let NodeKind::Block { stmts } = arena.kind(block).clone() {
            let stmts = self.visit_stmt_list(arena, scope, stmts)?;
            arena.replace_kind(block, NodeKind::Block { stmts });
        }
        Ok(())
    }

    /// Visit a statement position that cannot splice (an `if` branch, a
    /// loop body): multi-statement expansions get wrapped in a block.
    fn visit_nested_stmt(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        stmt: NodeIndex,
    ) -> Result<(), Diagnostic> {
        if matches!(arena.kind(stmt), NodeKind::Block { .. }) {
            return self.visit_block(arena, scope, stmt);
        }
        let replaced = self.visit_stmt(arena, scope, stmt)?;
        if replaced.len() > 1 {
            let hoisted: Vec<NodeIndex> = replaced
                .into_iter()
                .map(|s| if s == stmt { arena.hoist(stmt) } else { s })
                .collect();
            arena.replace_kind(stmt, NodeKind::Block { stmts: hoisted });
        }
        Ok(())
    }

    fn visit_stmt(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        stmt: NodeIndex,
    ) -> Result<Vec<NodeIndex>, Diagnostic> {
        match arena.kind(stmt).clone() {
            NodeKind::Class { .. } => match self.try_lower_class(arena, scope, stmt, None)? {
                Some(Lowered::Statements { stmts, .. }) => Ok(stmts),
                _ => Ok(vec![stmt]),
            },
            NodeKind::ExportNamed {
                declaration: Some(decl),
                specifiers,
            } if matches!(arena.kind(decl), NodeKind::Class { .. }) => {
                if !class_concerns_pass(arena, decl) {
                    return Ok(vec![stmt]);
                }
                if !has_any_decorators(arena, decl) {
                    // Accessor-only: keep the export wrapper.
                    match self.try_lower_class(arena, scope, decl, None)? {
                        Some(Lowered::Statements { mut stmts, .. }) => {
                            // Memoized computed keys precede the export.
                            let class_stmt = stmts.pop().expect("class statement");
                            arena.replace_kind(
                                stmt,
                                NodeKind::ExportNamed {
                                    declaration: Some(class_stmt),
                                    specifiers,
                                },
                            );
                            stmts.push(stmt);
                            return Ok(stmts);
                        }
                        _ => return Ok(vec![stmt]),
                    }
                }
                // Decorated: split unconditionally, the binding is
                // reassigned by the pass.
                let (mut stmts, binding) = match self.try_lower_class(arena, scope, decl, None)? {
                    Some(Lowered::Statements { stmts, binding }) => (stmts, binding),
                    _ => (vec![decl], class_binding_name(arena, decl)),
                };
                if let Some(name) = binding {
                    stmts.push(export_specifier_stmt(arena, &name, &name));
                }
                Ok(stmts)
            }
            NodeKind::ExportDefault { declaration } => {
                if !matches!(arena.kind(declaration), NodeKind::Class { .. }) {
                    self.visit_expr(arena, scope, declaration, None)?;
                    return Ok(vec![stmt]);
                }
                if !class_concerns_pass(arena, declaration) {
                    return Ok(vec![stmt]);
                }
                let decorated = has_any_decorators(arena, declaration);
                let named = class_binding_name(arena, declaration);
                if let Some(name) = named {
                    let (mut stmts, binding) =
                        match self.try_lower_class(arena, scope, declaration, None)? {
                            Some(Lowered::Statements { stmts, binding }) => (stmts, binding),
                            _ if decorated => (vec![declaration], Some(name)),
                            // Accessor-only: the declaration was rewritten
                            // in place, keep the export wrapper.
                            _ => return Ok(vec![stmt]),
                        };
                    if let Some(local) = binding {
                        stmts.push(export_specifier_stmt(arena, &local, "default"));
                    }
                    Ok(stmts)
                } else {
                    // Anonymous default: bind under a synthetic local and
                    // export it as `default`; named evaluation names the
                    // class "default".
                    set_class_expression(arena, declaration);
                    self.try_lower_class(
                        arena,
                        scope,
                        declaration,
                        Some(NameRef::Str("default".to_string())),
                    )?;
                    let local = scope.generate_uid("default");
                    let name_id = arena.ident(&local);
                    let declarator = arena.alloc(
                        NodeKind::VarDeclarator {
                            name: name_id,
                            init: Some(declaration),
                        },
                        Span::dummy(),
                    );
                    let decl = arena.alloc(
                        NodeKind::VarDecl {
                            kind: VarKind::Let,
                            declarators: vec![declarator],
                        },
                        Span::dummy(),
                    );
                    Ok(vec![decl, export_specifier_stmt(arena, &local, "default")])
                }
            }
            NodeKind::VarDecl { declarators, .. } => {
                for d in declarators {
                    if let NodeKind::VarDeclarator {
                        name,
                        init: Some(init),
                    } = arena.kind(d).clone()
                    {
                        let hint = arena.ident_name(name).map(|n| NameRef::Str(n.to_string()));
                        self.visit_expr(arena, scope, init, hint)?;
                    }
                }
                Ok(vec![stmt])
            }
            NodeKind::ExprStmt { expr } => {
                self.visit_expr(arena, scope, expr, None)?;
                Ok(vec![stmt])
            }
            NodeKind::Return { arg } => {
                if let Some(arg) = arg {
                    self.visit_expr(arena, scope, arg, None)?;
                }
                Ok(vec![stmt])
            }
            NodeKind::Block { .. } => {
                self.visit_block(arena, scope, stmt)?;
                Ok(vec![stmt])
            }
            NodeKind::If { test, cons, alt } => {
                self.visit_expr(arena, scope, test, None)?;
                self.visit_nested_stmt(arena, scope, cons)?;
                if let Some(alt) = alt {
                    self.visit_nested_stmt(arena, scope, alt)?;
                }
                Ok(vec![stmt])
            }
            NodeKind::ForOf { left, right, body } => {
                self.visit_expr(arena, scope, left, None)?;
                self.visit_expr(arena, scope, right, None)?;
                self.visit_nested_stmt(arena, scope, body)?;
                Ok(vec![stmt])
            }
            _ => {
                for child in arena.children(stmt) {
                    self.visit_expr(arena, scope, child, None)?;
                }
                Ok(vec![stmt])
            }
        }
    }

    // =========================================================================
    // Expression traversal and named evaluation
    // =========================================================================

    fn visit_expr(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        expr: NodeIndex,
        hint: Option<NameRef>,
    ) -> Result<(), Diagnostic> {
        match arena.kind(expr).clone() {
            NodeKind::Class { .. } => {
                self.try_lower_class(arena, scope, expr, hint)?;
                Ok(())
            }
            NodeKind::Assign { op, target, value } => {
                self.visit_expr(arena, scope, target, None)?;
                let hint = if matches!(op.as_str(), "=" | "&&=" | "||=" | "??=") {
                    arena.ident_name(target).map(|n| NameRef::Str(n.to_string()))
                } else {
                    None
                };
                self.visit_expr(arena, scope, value, hint)
            }
            NodeKind::AssignPattern { left, right } => {
                let hint = arena.ident_name(left).map(|n| NameRef::Str(n.to_string()));
                self.visit_expr(arena, scope, right, hint)
            }
            NodeKind::ObjectProp {
                key,
                value,
                computed,
            } => {
                let hint = self.property_name_hint(arena, scope, key, value, computed);
                if computed {
                    self.visit_expr(arena, scope, key, None)?;
                }
                self.visit_expr(arena, scope, value, hint)
            }
            NodeKind::VarDeclarator { name, init } => {
                if let Some(init) = init {
                    let hint = arena.ident_name(name).map(|n| NameRef::Str(n.to_string()));
                    self.visit_expr(arena, scope, init, hint)?;
                }
                Ok(())
            }
            NodeKind::FunctionExpr { id, params, body } => {
                let body = self.visit_stmt_list(arena, scope, body)?;
                arena.replace_kind(expr, NodeKind::FunctionExpr { id, params, body });
                Ok(())
            }
            NodeKind::Arrow { body, .. } => {
                if matches!(arena.kind(body), NodeKind::Block { .. }) {
                    self.visit_block(arena, scope, body)
                } else {
                    self.visit_expr(arena, scope, body, None)
                }
            }
            _ => {
                for child in arena.children(expr) {
                    self.visit_expr(arena, scope, child, None)?;
                }
                Ok(())
            }
        }
    }

    /// Named evaluation for object-literal properties. An effectful
    /// computed key in front of a decorated anonymous class is memoized
    /// through `toPropertyKey` and the memoized local becomes the name.
    fn property_name_hint(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        key: NodeIndex,
        value: NodeIndex,
        computed: bool,
    ) -> Option<NameRef> {
        if !is_anonymous_decorated_class(arena, value) {
            return None;
        }
        if !computed {
            return match arena.kind(key) {
                NodeKind::Ident { name } => Some(NameRef::Str(name.clone())),
                NodeKind::StringLit { value } => Some(NameRef::Str(value.clone())),
                NodeKind::NumberLit { text } => Some(NameRef::Str(text.clone())),
                _ => None,
            };
        }
        if scope.is_static(arena, key) {
            return Some(NameRef::Node(key));
        }
        self.helpers.to_property_key = true;
        let hoisted = arena.hoist(key);
        let local = scope.generate_declared_uid("ref");
        let callee = arena.ident("_toPropertyKey");
        let call = arena.call(callee, vec![hoisted]);
        let target = arena.ident(&local);
        arena.replace_kind(
            key,
            NodeKind::Assign {
                op: "=".to_string(),
                target,
                value: call,
            },
        );
        let template = arena.ident(&local);
        Some(NameRef::Node(template))
    }

    // =========================================================================
    // Per-class dispatch
    // =========================================================================

    fn try_lower_class(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        class: NodeIndex,
        hint: Option<NameRef>,
    ) -> Result<Option<Lowered>, Diagnostic> {
        if self.visited.contains(&class) {
            return Ok(None);
        }
        self.visited.insert(class);

        // Inner classes first: field initializers (a named-evaluation
        // position), method bodies, and static blocks may carry decorated
        // classes of their own.
        self.visit_class_members(arena, scope, class)?;

        let lowering = ClassLowering::new(
            arena,
            scope,
            &mut self.helpers,
            self.version,
            self.policy,
            self.constant_super,
            class,
            hint,
        );
        let result = lowering.run()?;
        if !matches!(result, Lowered::Untouched) {
            debug!("class lowered");
        }
        Ok(Some(result))
    }

    fn visit_class_members(
        &mut self,
        arena: &mut NodeArena,
        scope: &mut Scope,
        class: NodeIndex,
    ) -> Result<(), Diagnostic> {
        let NodeKind::Class { body, .. } = arena.kind(class).clone() else {
            return Ok(());
        };
        for m in body {
            match arena.kind(m).clone() {
                NodeKind::ClassField {
                    key,
                    value,
                    computed,
                    ..
                } => {
                    if let Some(value) = value {
                        let hint = if computed {
                            None
                        } else {
                            match arena.kind(key) {
                                NodeKind::Ident { name } => Some(NameRef::Str(name.clone())),
                                NodeKind::StringLit { value } => Some(NameRef::Str(value.clone())),
                                _ => None,
                            }
                        };
                        self.visit_expr(arena, scope, value, hint)?;
                    }
                }
                NodeKind::ClassPrivateField { key, value, .. } => {
                    if let Some(value) = value {
                        let hint = arena
                            .private_name_of(key)
                            .map(|n| NameRef::Str(format!("#{n}")));
                        self.visit_expr(arena, scope, value, hint)?;
                    }
                }
                NodeKind::ClassAccessor { value, .. } => {
                    if let Some(value) = value {
                        self.visit_expr(arena, scope, value, None)?;
                    }
                }
                NodeKind::ClassMethod {
                    key,
                    kind,
                    params,
                    body,
                    is_static,
                    computed,
                    decorators,
                } => {
                    let body = self.visit_stmt_list(arena, scope, body)?;
                    arena.replace_kind(
                        m,
                        NodeKind::ClassMethod {
                            key,
                            kind,
                            params,
                            body,
                            is_static,
                            computed,
                            decorators,
                        },
                    );
                }
                NodeKind::ClassPrivateMethod {
                    key,
                    kind,
                    params,
                    body,
                    is_static,
                    decorators,
                } => {
                    let body = self.visit_stmt_list(arena, scope, body)?;
                    arena.replace_kind(
                        m,
                        NodeKind::ClassPrivateMethod {
                            key,
                            kind,
                            params,
                            body,
                            is_static,
                            decorators,
                        },
                    );
                }
                NodeKind::StaticBlock { body } => {
                    let body = self.visit_stmt_list(arena, scope, body)?;
                    arena.replace_kind(m, NodeKind::StaticBlock { body });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tree queries
// =============================================================================

fn has_any_decorators(arena: &NodeArena, class: NodeIndex) -> bool {
    let NodeKind::Class {
        decorators, body, ..
    } = arena.kind(class)
    else {
        return false;
    };
    if !decorators.is_empty() {
        return true;
    }
    body.iter().any(|&m| match arena.kind(m) {
        NodeKind::ClassMethod { decorators, .. }
        | NodeKind::ClassPrivateMethod { decorators, .. }
        | NodeKind::ClassField { decorators, .. }
        | NodeKind::ClassPrivateField { decorators, .. }
        | NodeKind::ClassAccessor { decorators, .. } => !decorators.is_empty(),
        _ => false,
    })
}

/// Whether the pass has anything to do on this class: decorators anywhere,
/// or `accessor` members awaiting desugar.
fn class_concerns_pass(arena: &NodeArena, class: NodeIndex) -> bool {
    if has_any_decorators(arena, class) {
        return true;
    }
    let NodeKind::Class { body, .. } = arena.kind(class) else {
        return false;
    };
    body.iter()
        .any(|&m| matches!(arena.kind(m), NodeKind::ClassAccessor { .. }))
}

fn is_anonymous_decorated_class(arena: &NodeArena, expr: NodeIndex) -> bool {
    matches!(arena.kind(expr), NodeKind::Class { id: None, .. }) && has_any_decorators(arena, expr)
}

fn class_binding_name(arena: &NodeArena, class: NodeIndex) -> Option<String> {
    let NodeKind::Class { id, .. } = arena.kind(class) else {
        return None;
    };
    id.and_then(|i| arena.ident_name(i).map(str::to_string))
}

fn set_class_expression(arena: &mut NodeArena, class: NodeIndex) {
    if let NodeKind::Class {
        id,
        super_class,
        decorators,
        body,
        ..
    } = arena.kind(class).clone()
    {
        arena.replace_kind(
            class,
            NodeKind::Class {
                id,
                super_class,
                decorators,
                body,
                is_expression: true,
            },
        );
    }
}

/// `export { local as exported };`
fn export_specifier_stmt(arena: &mut NodeArena, local: &str, exported: &str) -> NodeIndex {
    let local_id = arena.ident(local);
    let exported_id = arena.ident(exported);
    let spec = arena.alloc(
        NodeKind::ExportSpecifier {
            local: local_id,
            exported: exported_id,
        },
        Span::dummy(),
    );
    arena.alloc(
        NodeKind::ExportNamed {
            declaration: None,
            specifiers: vec![spec],
        },
        Span::dummy(),
    )
}

#[cfg(test)]
#[path = "tests/decorators_tests.rs"]
mod decorators_tests;

#[cfg(test)]
#[path = "tests/decorators_version_tests.rs"]
mod decorators_version_tests;
