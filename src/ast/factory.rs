//! Node construction methods for the [`NodeArena`].
//!
//! All constructors allocate synthesized nodes with a dummy span; callers
//! that preserve a source node keep its span by cloning or rewriting the
//! node in place. `clone_node` is the deep-clone primitive the transform
//! uses to share an identifier between emission sites.

use crate::span::Span;

use super::{MethodKind, NodeArena, NodeIndex, NodeKind, VarKind};

impl NodeArena {
    pub fn ident(&mut self, name: &str) -> NodeIndex {
        self.alloc(
            NodeKind::Ident {
                name: name.to_string(),
            },
            Span::dummy(),
        )
    }

    pub fn private_name(&mut self, name: &str) -> NodeIndex {
        self.alloc(
            NodeKind::PrivateName {
                name: name.to_string(),
            },
            Span::dummy(),
        )
    }

    pub fn this_expr(&mut self) -> NodeIndex {
        self.alloc(NodeKind::This, Span::dummy())
    }

    pub fn super_expr(&mut self) -> NodeIndex {
        self.alloc(NodeKind::Super, Span::dummy())
    }

    pub fn string(&mut self, value: &str) -> NodeIndex {
        self.alloc(
            NodeKind::StringLit {
                value: value.to_string(),
            },
            Span::dummy(),
        )
    }

    pub fn number(&mut self, text: &str) -> NodeIndex {
        self.alloc(
            NodeKind::NumberLit {
                text: text.to_string(),
            },
            Span::dummy(),
        )
    }

    pub fn void_0(&mut self) -> NodeIndex {
        self.alloc(NodeKind::Void0, Span::dummy())
    }

    pub fn array(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(
            NodeKind::ArrayLit {
                elements: elements.into_iter().map(Some).collect(),
            },
            Span::dummy(),
        )
    }

    pub fn member(&mut self, object: NodeIndex, property: &str) -> NodeIndex {
        let prop = self.ident(property);
        self.alloc(
            NodeKind::Member {
                object,
                property: prop,
                computed: false,
            },
            Span::dummy(),
        )
    }

    pub fn member_private(&mut self, object: NodeIndex, name: &str) -> NodeIndex {
        let prop = self.private_name(name);
        self.alloc(
            NodeKind::Member {
                object,
                property: prop,
                computed: false,
            },
            Span::dummy(),
        )
    }

    pub fn member_computed(&mut self, object: NodeIndex, property: NodeIndex) -> NodeIndex {
        self.alloc(
            NodeKind::Member {
                object,
                property,
                computed: true,
            },
            Span::dummy(),
        )
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Call { callee, args }, Span::dummy())
    }

    pub fn new_expr(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::New { callee, args }, Span::dummy())
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.alloc(
            NodeKind::Assign {
                op: "=".to_string(),
                target,
                value,
            },
            Span::dummy(),
        )
    }

    pub fn seq(&mut self, exprs: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Seq { exprs }, Span::dummy())
    }

    pub fn binary(&mut self, op: &str, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.alloc(
            NodeKind::Binary {
                op: op.to_string(),
                left,
                right,
            },
            Span::dummy(),
        )
    }

    pub fn arrow(&mut self, params: Vec<NodeIndex>, body: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::Arrow { params, body }, Span::dummy())
    }

    pub fn function_expr(&mut self, params: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(
            NodeKind::FunctionExpr {
                id: None,
                params,
                body,
            },
            Span::dummy(),
        )
    }

    pub fn array_pattern(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(
            NodeKind::ArrayPattern {
                elements: elements.into_iter().map(Some).collect(),
            },
            Span::dummy(),
        )
    }

    pub fn object_prop(&mut self, key: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.alloc(
            NodeKind::ObjectProp {
                key,
                value,
                computed: false,
            },
            Span::dummy(),
        )
    }

    pub fn object_pattern(&mut self, props: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::ObjectPattern { props }, Span::dummy())
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::ExprStmt { expr }, Span::dummy())
    }

    pub fn block(&mut self, stmts: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Block { stmts }, Span::dummy())
    }

    pub fn ret(&mut self, arg: Option<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Return { arg }, Span::dummy())
    }

    pub fn var_decl(&mut self, kind: VarKind, names: &[&str]) -> NodeIndex {
        let declarators = names
            .iter()
            .map(|n| {
                let id = self.ident(n);
                self.alloc(NodeKind::VarDeclarator { name: id, init: None }, Span::dummy())
            })
            .collect();
        self.alloc(NodeKind::VarDecl { kind, declarators }, Span::dummy())
    }

    pub fn static_block(&mut self, body: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::StaticBlock { body }, Span::dummy())
    }

    pub fn class_method(
        &mut self,
        key: NodeIndex,
        kind: MethodKind,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        is_static: bool,
    ) -> NodeIndex {
        self.alloc(
            NodeKind::ClassMethod {
                key,
                kind,
                params,
                body,
                is_static,
                computed: false,
                decorators: Vec::new(),
            },
            Span::dummy(),
        )
    }

    pub fn class_private_field(
        &mut self,
        name: &str,
        value: Option<NodeIndex>,
        is_static: bool,
    ) -> NodeIndex {
        let key = self.private_name(name);
        self.alloc(
            NodeKind::ClassPrivateField {
                key,
                value,
                is_static,
                decorators: Vec::new(),
            },
            Span::dummy(),
        )
    }

    /// Deep-clone the subtree rooted at `idx` into fresh nodes.
    pub fn clone_node(&mut self, idx: NodeIndex) -> NodeIndex {
        let node = self.get(idx).clone();
        let kind = match node.kind {
            k @ (NodeKind::Ident { .. }
            | NodeKind::PrivateName { .. }
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::NumberLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::Void0
            | NodeKind::TypeOnlyMember
            | NodeKind::IndexSignature) => k,
            NodeKind::ArrayLit { elements } => NodeKind::ArrayLit {
                elements: self.clone_opt_list(elements),
            },
            NodeKind::ArrayPattern { elements } => NodeKind::ArrayPattern {
                elements: self.clone_opt_list(elements),
            },
            NodeKind::ObjectLit { props } => NodeKind::ObjectLit {
                props: self.clone_list(props),
            },
            NodeKind::ObjectPattern { props } => NodeKind::ObjectPattern {
                props: self.clone_list(props),
            },
            NodeKind::ObjectProp {
                key,
                value,
                computed,
            } => NodeKind::ObjectProp {
                key: self.clone_node(key),
                value: self.clone_node(value),
                computed,
            },
            NodeKind::Member {
                object,
                property,
                computed,
            } => NodeKind::Member {
                object: self.clone_node(object),
                property: self.clone_node(property),
                computed,
            },
            NodeKind::Call { callee, args } => NodeKind::Call {
                callee: self.clone_node(callee),
                args: self.clone_list(args),
            },
            NodeKind::New { callee, args } => NodeKind::New {
                callee: self.clone_node(callee),
                args: self.clone_list(args),
            },
            NodeKind::Assign { op, target, value } => NodeKind::Assign {
                op,
                target: self.clone_node(target),
                value: self.clone_node(value),
            },
            NodeKind::Seq { exprs } => NodeKind::Seq {
                exprs: self.clone_list(exprs),
            },
            NodeKind::Cond { test, cons, alt } => NodeKind::Cond {
                test: self.clone_node(test),
                cons: self.clone_node(cons),
                alt: self.clone_node(alt),
            },
            NodeKind::Unary { op, arg } => NodeKind::Unary {
                op,
                arg: self.clone_node(arg),
            },
            NodeKind::Spread { arg } => NodeKind::Spread {
                arg: self.clone_node(arg),
            },
            NodeKind::Update { op, prefix, arg } => NodeKind::Update {
                op,
                prefix,
                arg: self.clone_node(arg),
            },
            NodeKind::Binary { op, left, right } => NodeKind::Binary {
                op,
                left: self.clone_node(left),
                right: self.clone_node(right),
            },
            NodeKind::Arrow { params, body } => NodeKind::Arrow {
                params: self.clone_list(params),
                body: self.clone_node(body),
            },
            NodeKind::FunctionExpr { id, params, body } => NodeKind::FunctionExpr {
                id: id.map(|i| self.clone_node(i)),
                params: self.clone_list(params),
                body: self.clone_list(body),
            },
            NodeKind::RestElement { arg } => NodeKind::RestElement {
                arg: self.clone_node(arg),
            },
            NodeKind::AssignPattern { left, right } => NodeKind::AssignPattern {
                left: self.clone_node(left),
                right: self.clone_node(right),
            },
            NodeKind::ExprStmt { expr } => NodeKind::ExprStmt {
                expr: self.clone_node(expr),
            },
            NodeKind::VarDecl { kind, declarators } => NodeKind::VarDecl {
                kind,
                declarators: self.clone_list(declarators),
            },
            NodeKind::VarDeclarator { name, init } => NodeKind::VarDeclarator {
                name: self.clone_node(name),
                init: init.map(|i| self.clone_node(i)),
            },
            NodeKind::Return { arg } => NodeKind::Return {
                arg: arg.map(|i| self.clone_node(i)),
            },
            NodeKind::Block { stmts } => NodeKind::Block {
                stmts: self.clone_list(stmts),
            },
            NodeKind::Program { stmts } => NodeKind::Program {
                stmts: self.clone_list(stmts),
            },
            NodeKind::If { test, cons, alt } => NodeKind::If {
                test: self.clone_node(test),
                cons: self.clone_node(cons),
                alt: alt.map(|i| self.clone_node(i)),
            },
            NodeKind::ForOf { left, right, body } => NodeKind::ForOf {
                left: self.clone_node(left),
                right: self.clone_node(right),
                body: self.clone_node(body),
            },
            NodeKind::ExportNamed {
                declaration,
                specifiers,
            } => NodeKind::ExportNamed {
                declaration: declaration.map(|i| self.clone_node(i)),
                specifiers: self.clone_list(specifiers),
            },
            NodeKind::ExportSpecifier { local, exported } => NodeKind::ExportSpecifier {
                local: self.clone_node(local),
                exported: self.clone_node(exported),
            },
            NodeKind::ExportDefault { declaration } => NodeKind::ExportDefault {
                declaration: self.clone_node(declaration),
            },
            NodeKind::Class {
                id,
                super_class,
                decorators,
                body,
                is_expression,
            } => NodeKind::Class {
                id: id.map(|i| self.clone_node(i)),
                super_class: super_class.map(|i| self.clone_node(i)),
                decorators: self.clone_list(decorators),
                body: self.clone_list(body),
                is_expression,
            },
            NodeKind::Decorator { expr } => NodeKind::Decorator {
                expr: self.clone_node(expr),
            },
            NodeKind::ClassMethod {
                key,
                kind,
                params,
                body,
                is_static,
                computed,
                decorators,
            } => NodeKind::ClassMethod {
                key: self.clone_node(key),
                kind,
                params: self.clone_list(params),
                body: self.clone_list(body),
                is_static,
                computed,
                decorators: self.clone_list(decorators),
            },
            NodeKind::ClassPrivateMethod {
                key,
                kind,
                params,
                body,
                is_static,
                decorators,
            } => NodeKind::ClassPrivateMethod {
                key: self.clone_node(key),
                kind,
                params: self.clone_list(params),
                body: self.clone_list(body),
                is_static,
                decorators: self.clone_list(decorators),
            },
            NodeKind::ClassField {
                key,
                value,
                is_static,
                computed,
                decorators,
            } => NodeKind::ClassField {
                key: self.clone_node(key),
                value: value.map(|i| self.clone_node(i)),
                is_static,
                computed,
                decorators: self.clone_list(decorators),
            },
            NodeKind::ClassPrivateField {
                key,
                value,
                is_static,
                decorators,
            } => NodeKind::ClassPrivateField {
                key: self.clone_node(key),
                value: value.map(|i| self.clone_node(i)),
                is_static,
                decorators: self.clone_list(decorators),
            },
            NodeKind::ClassAccessor {
                key,
                value,
                is_static,
                computed,
                decorators,
            } => NodeKind::ClassAccessor {
                key: self.clone_node(key),
                value: value.map(|i| self.clone_node(i)),
                is_static,
                computed,
                decorators: self.clone_list(decorators),
            },
            NodeKind::StaticBlock { body } => NodeKind::StaticBlock {
                body: self.clone_list(body),
            },
        };
        self.alloc(kind, node.span)
    }

    fn clone_list(&mut self, list: Vec<NodeIndex>) -> Vec<NodeIndex> {
        list.into_iter().map(|i| self.clone_node(i)).collect()
    }

    fn clone_opt_list(&mut self, list: Vec<Option<NodeIndex>>) -> Vec<Option<NodeIndex>> {
        list.into_iter()
            .map(|e| e.map(|i| self.clone_node(i)))
            .collect()
    }

    // =========================================================================
    // Type predicates
    // =========================================================================

    pub fn is_class_declaration(&self, idx: NodeIndex) -> bool {
        matches!(
            self.kind(idx),
            NodeKind::Class {
                is_expression: false,
                ..
            }
        )
    }

    pub fn is_member_expression(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::Member { .. })
    }

    pub fn is_super(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::Super)
    }

    pub fn is_this_expression(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::This)
    }

    pub fn is_static_block(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::StaticBlock { .. })
    }

    pub fn is_class_private_property(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::ClassPrivateField { .. })
    }

    pub fn is_class_private_method(&self, idx: NodeIndex) -> bool {
        matches!(self.kind(idx), NodeKind::ClassPrivateMethod { .. })
    }

    pub fn ident_name(&self, idx: NodeIndex) -> Option<&str> {
        match self.kind(idx) {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    pub fn private_name_of(&self, idx: NodeIndex) -> Option<&str> {
        match self.kind(idx) {
            NodeKind::PrivateName { name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_node_is_deep() {
        let mut arena = NodeArena::new();
        let obj = arena.ident("obj");
        let member = arena.member(obj, "prop");
        let copy = arena.clone_node(member);
        assert_ne!(member, copy);
        let (NodeKind::Member { object: o1, .. }, NodeKind::Member { object: o2, .. }) =
            (arena.kind(member), arena.kind(copy))
        else {
            panic!("expected member expressions");
        };
        assert_ne!(o1, o2);
    }

    #[test]
    fn test_predicates() {
        let mut arena = NodeArena::new();
        let sup = arena.super_expr();
        let this = arena.this_expr();
        assert!(arena.is_super(sup));
        assert!(arena.is_this_expression(this));
        assert!(!arena.is_member_expression(this));
    }
}
