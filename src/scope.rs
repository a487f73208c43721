//! Scope services for the transform: fresh-identifier allocation, binding
//! rename, and scope-constancy queries.
//!
//! This is deliberately not a full binder. The transform only needs four
//! capabilities: allocate identifiers that cannot collide with anything in
//! the program, rename binding uses inside a subtree, decide whether an
//! expression can change value before class evaluation, and re-synchronize
//! after the tree has been perturbed (`crawl`).

use rustc_hash::FxHashSet;

use crate::ast::{NodeArena, NodeIndex, NodeKind};

#[derive(Default)]
pub struct Scope {
    /// Every identifier name observed anywhere in the program, plus every
    /// generated uid. Over-approximating keeps uids fresh.
    taken: FxHashSet<String>,
    /// Names introduced as bindings (declarators, params, function/class ids,
    /// generated uids).
    bindings: FxHashSet<String>,
    /// Names that appear as assignment or update targets.
    mutated: FxHashSet<String>,
    /// Every uid this scope has handed out. Survives `crawl`, so a uid not
    /// yet spliced into the tree stays reserved.
    generated: FxHashSet<String>,
    /// Uids allocated through `generate_declared_uid_identifier` that still
    /// need a `let` declaration emitted by the caller.
    declared_uids: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    /// Build a scope pre-populated from a program root.
    pub fn for_program(arena: &NodeArena, root: NodeIndex) -> Self {
        let mut scope = Scope::new();
        scope.crawl(arena, root);
        scope
    }

    /// Re-synchronize the name tables by walking the (possibly rewritten)
    /// tree. Generated uids stay reserved across crawls.
    pub fn crawl(&mut self, arena: &NodeArena, root: NodeIndex) {
        self.taken.clear();
        self.mutated.clear();
        self.bindings.clear();
        for name in &self.generated {
            self.taken.insert(name.clone());
            self.bindings.insert(name.clone());
        }

        let mut stack = vec![root];
        let mut children = Vec::new();
        while let Some(idx) = stack.pop() {
            match arena.kind(idx) {
                NodeKind::Ident { name } => {
                    self.taken.insert(name.clone());
                }
                NodeKind::VarDeclarator { name, .. } => {
                    self.collect_pattern_bindings(arena, *name);
                }
                NodeKind::FunctionExpr { id, params, .. } => {
                    if let Some(id) = id {
                        self.bind_ident(arena, *id);
                    }
                    for &p in params {
                        self.collect_pattern_bindings(arena, p);
                    }
                }
                NodeKind::Arrow { params, .. } => {
                    for &p in params {
                        self.collect_pattern_bindings(arena, p);
                    }
                }
                NodeKind::ClassMethod { params, .. } | NodeKind::ClassPrivateMethod { params, .. } => {
                    for &p in params.iter() {
                        self.collect_pattern_bindings(arena, p);
                    }
                }
                NodeKind::Class { id, .. } => {
                    if let Some(id) = id {
                        self.bind_ident(arena, *id);
                    }
                }
                NodeKind::Assign { target, .. } => {
                    self.collect_mutations(arena, *target);
                }
                NodeKind::Update { arg, .. } => {
                    self.collect_mutations(arena, *arg);
                }
                NodeKind::ForOf { left, .. } => {
                    self.collect_mutations(arena, *left);
                }
                _ => {}
            }
            children.clear();
            arena.push_children(idx, &mut children);
            stack.extend(children.iter().copied());
        }
    }

    fn bind_ident(&mut self, arena: &NodeArena, idx: NodeIndex) {
        if let Some(name) = arena.ident_name(idx) {
            self.taken.insert(name.to_string());
            self.bindings.insert(name.to_string());
        }
    }

    fn collect_pattern_bindings(&mut self, arena: &NodeArena, idx: NodeIndex) {
        match arena.kind(idx) {
            NodeKind::Ident { .. } => self.bind_ident(arena, idx),
            _ => {
                for child in arena.children(idx) {
                    self.collect_pattern_bindings(arena, child);
                }
            }
        }
    }

    fn collect_mutations(&mut self, arena: &NodeArena, target: NodeIndex) {
        match arena.kind(target) {
            NodeKind::Ident { name } => {
                self.mutated.insert(name.clone());
            }
            NodeKind::VarDecl { .. }
            | NodeKind::VarDeclarator { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::ObjectProp { .. }
            | NodeKind::RestElement { .. }
            | NodeKind::AssignPattern { .. } => {
                for child in arena.children(target) {
                    self.collect_mutations(arena, child);
                }
            }
            // Member targets mutate a property, not a binding.
            _ => {}
        }
    }

    // =========================================================================
    // Uid allocation
    // =========================================================================

    /// Allocate a fresh name based on `hint`: `_hint`, `_hint2`, `_hint3`, …
    pub fn generate_uid(&mut self, hint: &str) -> String {
        let base = hint.trim_start_matches('_');
        let base = if base.is_empty() { "ref" } else { base };
        let mut i = 0u32;
        loop {
            let candidate = if i == 0 {
                format!("_{base}")
            } else {
                format!("_{base}{}", i + 1)
            };
            if !self.taken.contains(&candidate) {
                self.taken.insert(candidate.clone());
                self.bindings.insert(candidate.clone());
                self.generated.insert(candidate.clone());
                return candidate;
            }
            i += 1;
        }
    }

    pub fn generate_uid_identifier(&mut self, arena: &mut NodeArena, hint: &str) -> NodeIndex {
        let name = self.generate_uid(hint);
        arena.ident(&name)
    }

    /// Allocate a uid whose hint is derived from the shape of `node`.
    pub fn generate_uid_identifier_based_on_node(
        &mut self,
        arena: &mut NodeArena,
        node: NodeIndex,
    ) -> NodeIndex {
        let hint = Self::hint_for_node(arena, node);
        self.generate_uid_identifier(arena, &hint)
    }

    /// Like [`Scope::generate_uid`], but also registers the name for a
    /// `let` declaration the caller emits. The pending names are drained
    /// through [`Scope::take_declared`].
    pub fn generate_declared_uid(&mut self, hint: &str) -> String {
        let name = self.generate_uid(hint);
        self.declared_uids.push(name.clone());
        name
    }

    pub fn generate_declared_uid_identifier(
        &mut self,
        arena: &mut NodeArena,
        hint: &str,
    ) -> NodeIndex {
        let name = self.generate_declared_uid(hint);
        arena.ident(&name)
    }

    pub fn take_declared(&mut self) -> Vec<String> {
        std::mem::take(&mut self.declared_uids)
    }

    fn hint_for_node(arena: &NodeArena, node: NodeIndex) -> String {
        match arena.kind(node) {
            NodeKind::Ident { name } => name.clone(),
            NodeKind::PrivateName { name } => name.clone(),
            NodeKind::Member { property, .. } => Self::hint_for_node(arena, *property),
            NodeKind::Call { callee, .. } => Self::hint_for_node(arena, *callee),
            NodeKind::StringLit { value } => {
                let cleaned: String = value
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if cleaned.is_empty() {
                    "ref".to_string()
                } else {
                    cleaned
                }
            }
            NodeKind::This => "this".to_string(),
            _ => "ref".to_string(),
        }
    }

    // =========================================================================
    // Rename
    // =========================================================================

    /// Rewrite every binding use of `from` under `root` to `to`.
    ///
    /// Non-binding identifier positions (member property names, non-computed
    /// object keys, export names) are left alone, and subtrees that rebind
    /// `from` (a nested function parameter or class id of the same name) are
    /// not descended into.
    pub fn rename(&mut self, arena: &mut NodeArena, root: NodeIndex, from: &str, to: &str) {
        let mut targets = Vec::new();
        Self::collect_rename_targets(arena, root, from, false, &mut targets);
        for idx in targets {
            arena.replace_kind(
                idx,
                NodeKind::Ident {
                    name: to.to_string(),
                },
            );
        }
        self.taken.insert(to.to_string());
        self.bindings.insert(to.to_string());
    }

    fn rebinds(arena: &NodeArena, idx: NodeIndex, name: &str) -> bool {
        let binds_in = |list: &[NodeIndex]| {
            list.iter().any(|&p| {
                let mut found = false;
                let mut stack = vec![p];
                while let Some(i) = stack.pop() {
                    if arena.ident_name(i) == Some(name) {
                        found = true;
                        break;
                    }
                    stack.extend(arena.children(i));
                }
                found
            })
        };
        match arena.kind(idx) {
            NodeKind::FunctionExpr { id, params, .. } => {
                id.map_or(false, |i| arena.ident_name(i) == Some(name)) || binds_in(params)
            }
            NodeKind::Arrow { params, .. } => binds_in(params),
            NodeKind::Class { id, .. } => id.map_or(false, |i| arena.ident_name(i) == Some(name)),
            _ => false,
        }
    }

    fn collect_rename_targets(
        arena: &NodeArena,
        idx: NodeIndex,
        from: &str,
        is_root: bool,
        out: &mut Vec<NodeIndex>,
    ) {
        // `is_root` lets the caller rename inside a class whose own id is
        // the renamed name without the id short-circuiting the walk.
        if !is_root && Self::rebinds(arena, idx, from) {
            return;
        }
        match arena.kind(idx) {
            NodeKind::Ident { name } if name == from => out.push(idx),
            NodeKind::Member {
                object, property, computed,
            } => {
                Self::collect_rename_targets(arena, *object, from, false, out);
                if *computed {
                    Self::collect_rename_targets(arena, *property, from, false, out);
                }
            }
            NodeKind::ObjectProp {
                key, value, computed,
            } => {
                if *computed {
                    Self::collect_rename_targets(arena, *key, from, false, out);
                }
                Self::collect_rename_targets(arena, *value, from, false, out);
            }
            NodeKind::ClassMethod { key, computed, params, body, decorators, .. } => {
                for &d in decorators {
                    Self::collect_rename_targets(arena, d, from, false, out);
                }
                if *computed {
                    Self::collect_rename_targets(arena, *key, from, false, out);
                }
                for &p in params {
                    Self::collect_rename_targets(arena, p, from, false, out);
                }
                for &s in body {
                    Self::collect_rename_targets(arena, s, from, false, out);
                }
            }
            NodeKind::ClassField { key, computed, value, decorators, .. }
            | NodeKind::ClassAccessor { key, computed, value, decorators, .. } => {
                for &d in decorators {
                    Self::collect_rename_targets(arena, d, from, false, out);
                }
                if *computed {
                    Self::collect_rename_targets(arena, *key, from, false, out);
                }
                if let Some(v) = value {
                    Self::collect_rename_targets(arena, *v, from, false, out);
                }
            }
            NodeKind::ExportSpecifier { local, .. } => {
                Self::collect_rename_targets(arena, *local, from, false, out);
            }
            NodeKind::Class { id: _, super_class, decorators, body, .. } => {
                for &d in decorators {
                    Self::collect_rename_targets(arena, d, from, false, out);
                }
                if let Some(s) = super_class {
                    Self::collect_rename_targets(arena, *s, from, false, out);
                }
                for &m in body {
                    Self::collect_rename_targets(arena, m, from, false, out);
                }
            }
            _ => {
                for child in arena.children(idx) {
                    Self::collect_rename_targets(arena, child, from, false, out);
                }
            }
        }
    }

    /// Public entry that renames inside a class body even when the class's
    /// own id carries the renamed name (the id itself is preserved).
    pub fn rename_inside(&mut self, arena: &mut NodeArena, root: NodeIndex, from: &str, to: &str) {
        let mut targets = Vec::new();
        Self::collect_rename_targets(arena, root, from, true, &mut targets);
        for idx in targets {
            arena.replace_kind(
                idx,
                NodeKind::Ident {
                    name: to.to_string(),
                },
            );
        }
        self.taken.insert(to.to_string());
        self.bindings.insert(to.to_string());
    }

    // =========================================================================
    // Constancy
    // =========================================================================

    /// Whether `expr` has no observable effect and no binding that can
    /// change value before class evaluation.
    pub fn is_static(&self, arena: &NodeArena, expr: NodeIndex) -> bool {
        match arena.kind(expr) {
            NodeKind::This
            | NodeKind::Super
            | NodeKind::NumberLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::Void0 => true,
            NodeKind::Ident { name } => {
                self.bindings.contains(name) && !self.mutated.contains(name)
            }
            _ => false,
        }
    }

    /// Memoize `expr` into a declared uid when it is not scope-constant.
    /// Returns the uid identifier, or `None` when memoization is useless.
    pub fn maybe_generate_memoised(
        &mut self,
        arena: &mut NodeArena,
        expr: NodeIndex,
    ) -> Option<NodeIndex> {
        if self.is_static(arena, expr) {
            None
        } else {
            let hint = Self::hint_for_node(arena, expr);
            Some(self.generate_declared_uid_identifier(arena, &hint))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_sequence() {
        let mut scope = Scope::new();
        assert_eq!(scope.generate_uid("init"), "_init");
        assert_eq!(scope.generate_uid("init"), "_init2");
        assert_eq!(scope.generate_uid("_init"), "_init3");
    }

    #[test]
    fn test_uid_avoids_taken_names() {
        let mut arena = NodeArena::new();
        let used = arena.ident("_dec");
        let stmt = arena.expr_stmt(used);
        let program = arena.alloc(NodeKind::Program { stmts: vec![stmt] }, crate::span::Span::dummy());
        let mut scope = Scope::for_program(&arena, program);
        assert_eq!(scope.generate_uid("dec"), "_dec2");
    }

    #[test]
    fn test_is_static_for_literals_and_constants() {
        let mut arena = NodeArena::new();
        let lit = arena.string("x");
        let scope = Scope::new();
        assert!(scope.is_static(&arena, lit));

        let mut arena = NodeArena::new();
        let decl_name = arena.ident("dec");
        let declarator = arena.alloc(
            NodeKind::VarDeclarator {
                name: decl_name,
                init: None,
            },
            crate::span::Span::dummy(),
        );
        let decl = arena.alloc(
            NodeKind::VarDecl {
                kind: crate::ast::VarKind::Const,
                declarators: vec![declarator],
            },
            crate::span::Span::dummy(),
        );
        let program = arena.alloc(NodeKind::Program { stmts: vec![decl] }, crate::span::Span::dummy());
        let scope = Scope::for_program(&arena, program);
        let reference = arena.ident("dec");
        assert!(scope.is_static(&arena, reference));
        let unknown = arena.ident("mystery");
        assert!(!scope.is_static(&arena, unknown));
    }

    #[test]
    fn test_mutated_binding_is_not_static() {
        let mut arena = NodeArena::new();
        let decl_name = arena.ident("dec");
        let declarator = arena.alloc(
            NodeKind::VarDeclarator {
                name: decl_name,
                init: None,
            },
            crate::span::Span::dummy(),
        );
        let decl = arena.alloc(
            NodeKind::VarDecl {
                kind: crate::ast::VarKind::Let,
                declarators: vec![declarator],
            },
            crate::span::Span::dummy(),
        );
        let target = arena.ident("dec");
        let value = arena.number("1");
        let assign = arena.assign(target, value);
        let stmt = arena.expr_stmt(assign);
        let program = arena.alloc(
            NodeKind::Program {
                stmts: vec![decl, stmt],
            },
            crate::span::Span::dummy(),
        );
        let scope = Scope::for_program(&arena, program);
        let reference = arena.ident("dec");
        assert!(!scope.is_static(&arena, reference));
    }

    #[test]
    fn test_rename_skips_member_properties() {
        let mut arena = NodeArena::new();
        let obj = arena.ident("a");
        let member = arena.member(obj, "a");
        let stmt = arena.expr_stmt(member);
        let mut scope = Scope::new();
        scope.rename(&mut arena, stmt, "a", "_a");
        let NodeKind::Member { object, property, .. } = arena.kind(member) else {
            panic!("member expected");
        };
        assert_eq!(arena.ident_name(*object), Some("_a"));
        assert_eq!(arena.ident_name(*property), Some("a"));
    }
}
