//! JavaScript printer for the arena AST.
//!
//! The transform's output is the rewritten tree; this printer exists so the
//! test suites can assert on emitted shapes and so a host can inspect what
//! the pass produced. It is not a code generator: no source maps, no
//! comment preservation, no formatting fidelity beyond stable indentation.

use crate::ast::{MethodKind, NodeArena, NodeIndex, NodeKind};

pub struct Printer<'a> {
    arena: &'a NodeArena,
    output: String,
    indent_level: u32,
}

/// Print the subtree rooted at `idx`.
pub fn print(arena: &NodeArena, idx: NodeIndex) -> String {
    let mut printer = Printer::new(arena);
    printer.emit_node(idx);
    printer.finish()
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        Printer {
            arena,
            output: String::with_capacity(1024),
            indent_level: 0,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_line(&mut self) {
        self.output.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
    }

    fn kind(&self, idx: NodeIndex) -> &'a NodeKind {
        self.arena.kind(idx)
    }

    /// Expressions that need parentheses when they appear as the object of
    /// a member access, a call/new callee, or a sequence element.
    fn needs_parens_as_operand(&self, idx: NodeIndex) -> bool {
        matches!(
            self.kind(idx),
            NodeKind::Seq { .. }
                | NodeKind::Assign { .. }
                | NodeKind::Cond { .. }
                | NodeKind::Arrow { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Unary { .. }
                | NodeKind::FunctionExpr { .. }
                | NodeKind::Class { .. }
                | NodeKind::New { .. }
        )
    }

    fn emit_operand(&mut self, idx: NodeIndex) {
        if self.needs_parens_as_operand(idx) {
            self.write("(");
            self.emit_node(idx);
            self.write(")");
        } else {
            self.emit_node(idx);
        }
    }

    fn emit_list(&mut self, items: &[NodeIndex]) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_node(item);
        }
    }

    fn emit_stmts(&mut self, stmts: &[NodeIndex]) {
        for &stmt in stmts {
            self.write_indent();
            self.emit_node(stmt);
            self.write_line();
        }
    }

    fn emit_block_body(&mut self, stmts: &[NodeIndex]) {
        self.write("{");
        self.write_line();
        self.indent_level += 1;
        self.emit_stmts(stmts);
        self.indent_level -= 1;
        self.write_indent();
        self.write("}");
    }

    fn emit_method(
        &mut self,
        key: NodeIndex,
        kind: MethodKind,
        params: &[NodeIndex],
        body: &[NodeIndex],
        is_static: bool,
        computed: bool,
    ) {
        if is_static {
            self.write("static ");
        }
        match kind {
            MethodKind::Get => self.write("get "),
            MethodKind::Set => self.write("set "),
            MethodKind::Method | MethodKind::Constructor => {}
        }
        if computed {
            self.write("[");
            self.emit_node(key);
            self.write("]");
        } else {
            self.emit_node(key);
        }
        self.write("(");
        self.emit_list(params);
        self.write(") ");
        self.emit_block_body(body);
    }

    pub fn emit_node(&mut self, idx: NodeIndex) {
        match self.kind(idx) {
            NodeKind::Ident { name } => self.write(name),
            NodeKind::PrivateName { name } => {
                self.write("#");
                self.write(name);
            }
            NodeKind::This => self.write("this"),
            NodeKind::Super => self.write("super"),
            NodeKind::NumberLit { text } => self.write(text),
            NodeKind::StringLit { value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                self.write("\"");
                self.write(&escaped);
                self.write("\"");
            }
            NodeKind::BoolLit { value } => self.write(if *value { "true" } else { "false" }),
            NodeKind::NullLit => self.write("null"),
            NodeKind::Void0 => self.write("void 0"),
            NodeKind::ArrayLit { elements } | NodeKind::ArrayPattern { elements } => {
                self.write("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    if let Some(e) = element {
                        self.emit_node(*e);
                    }
                }
                self.write("]");
            }
            NodeKind::ObjectLit { props } | NodeKind::ObjectPattern { props } => {
                self.write("{ ");
                let props = props.clone();
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_node(*prop);
                }
                self.write(" }");
            }
            NodeKind::ObjectProp {
                key,
                value,
                computed,
            } => {
                if *computed {
                    self.write("[");
                    self.emit_node(*key);
                    self.write("]");
                } else {
                    self.emit_node(*key);
                }
                self.write(": ");
                self.emit_node(*value);
            }
            NodeKind::Member {
                object,
                property,
                computed,
            } => {
                self.emit_operand(*object);
                if *computed {
                    self.write("[");
                    self.emit_node(*property);
                    self.write("]");
                } else {
                    self.write(".");
                    self.emit_node(*property);
                }
            }
            NodeKind::Call { callee, args } => {
                let args = args.clone();
                self.emit_operand(*callee);
                self.write("(");
                self.emit_list(&args);
                self.write(")");
            }
            NodeKind::New { callee, args } => {
                let args = args.clone();
                self.write("new ");
                self.emit_operand(*callee);
                self.write("(");
                self.emit_list(&args);
                self.write(")");
            }
            NodeKind::Assign { op, target, value } => {
                let op = op.clone();
                self.emit_node(*target);
                self.write(" ");
                self.write(&op);
                self.write(" ");
                self.emit_node(*value);
            }
            NodeKind::Seq { exprs } => {
                let exprs = exprs.clone();
                self.write("(");
                self.emit_list(&exprs);
                self.write(")");
            }
            NodeKind::Cond { test, cons, alt } => {
                self.emit_operand(*test);
                self.write(" ? ");
                self.emit_node(*cons);
                self.write(" : ");
                self.emit_node(*alt);
            }
            NodeKind::Unary { op, arg } => {
                let op = op.clone();
                self.write(&op);
                if op.chars().last().is_some_and(|c| c.is_ascii_alphabetic()) {
                    self.write(" ");
                }
                self.emit_operand(*arg);
            }
            NodeKind::Update { op, prefix, arg } => {
                let op = op.clone();
                if *prefix {
                    self.write(&op);
                    self.emit_operand(*arg);
                } else {
                    self.emit_operand(*arg);
                    self.write(&op);
                }
            }
            NodeKind::Binary { op, left, right } => {
                let op = op.clone();
                self.emit_operand(*left);
                self.write(" ");
                self.write(&op);
                self.write(" ");
                self.emit_operand(*right);
            }
            NodeKind::Arrow { params, body } => {
                let params = params.clone();
                let body = *body;
                if params.len() == 1 && matches!(self.kind(params[0]), NodeKind::Ident { .. }) {
                    self.emit_node(params[0]);
                } else {
                    self.write("(");
                    self.emit_list(&params);
                    self.write(")");
                }
                self.write(" => ");
                if matches!(self.kind(body), NodeKind::Block { .. }) {
                    let NodeKind::Block { stmts } = self.kind(body) else {
                        unreachable!()
                    };
                    let stmts = stmts.clone();
                    self.emit_block_body(&stmts);
                } else if matches!(
                    self.kind(body),
                    NodeKind::Seq { .. } | NodeKind::Assign { .. } | NodeKind::ObjectLit { .. }
                ) {
                    self.write("(");
                    self.emit_node(body);
                    self.write(")");
                } else {
                    self.emit_node(body);
                }
            }
            NodeKind::FunctionExpr { id, params, body } => {
                let id = *id;
                let params = params.clone();
                let body = body.clone();
                self.write("function ");
                if let Some(id) = id {
                    self.emit_node(id);
                }
                self.write("(");
                self.emit_list(&params);
                self.write(") ");
                self.emit_block_body(&body);
            }
            NodeKind::RestElement { arg } | NodeKind::Spread { arg } => {
                self.write("...");
                self.emit_node(*arg);
            }
            NodeKind::AssignPattern { left, right } => {
                self.emit_node(*left);
                self.write(" = ");
                self.emit_node(*right);
            }
            NodeKind::ExprStmt { expr } => {
                let expr = *expr;
                // Expression statements beginning with `class`, `function`,
                // or `{` must be parenthesized to stay expressions.
                let needs_parens = matches!(
                    self.kind(expr),
                    NodeKind::Class { .. } | NodeKind::FunctionExpr { .. }
                ) || matches!(
                    self.kind(expr),
                    NodeKind::Assign { target, .. }
                        if matches!(self.kind(*target), NodeKind::ObjectPattern { .. })
                );
                if needs_parens {
                    self.write("(");
                    self.emit_node(expr);
                    self.write(")");
                } else {
                    self.emit_node(expr);
                }
                self.write(";");
            }
            NodeKind::VarDecl { kind, declarators } => {
                let declarators = declarators.clone();
                self.write(kind.as_str());
                self.write(" ");
                self.emit_list(&declarators);
                self.write(";");
            }
            NodeKind::VarDeclarator { name, init } => {
                self.emit_node(*name);
                if let Some(init) = init {
                    let init = *init;
                    self.write(" = ");
                    self.emit_node(init);
                }
            }
            NodeKind::Return { arg } => {
                self.write("return");
                if let Some(arg) = arg {
                    let arg = *arg;
                    self.write(" ");
                    self.emit_node(arg);
                }
                self.write(";");
            }
            NodeKind::Block { stmts } => {
                let stmts = stmts.clone();
                self.emit_block_body(&stmts);
            }
            NodeKind::If { test, cons, alt } => {
                let (test, cons, alt) = (*test, *cons, *alt);
                self.write("if (");
                self.emit_node(test);
                self.write(") ");
                self.emit_node(cons);
                if let Some(alt) = alt {
                    self.write(" else ");
                    self.emit_node(alt);
                }
            }
            NodeKind::ForOf { left, right, body } => {
                let (left, right, body) = (*left, *right, *body);
                self.write("for (");
                match self.kind(left) {
                    NodeKind::VarDecl { kind, declarators } => {
                        let declarators = declarators.clone();
                        self.write(kind.as_str());
                        self.write(" ");
                        self.emit_list(&declarators);
                    }
                    _ => self.emit_node(left),
                }
                self.write(" of ");
                self.emit_node(right);
                self.write(") ");
                self.emit_node(body);
            }
            NodeKind::ExportNamed {
                declaration,
                specifiers,
            } => {
                let (declaration, specifiers) = (*declaration, specifiers.clone());
                self.write("export ");
                if let Some(decl) = declaration {
                    self.emit_node(decl);
                } else {
                    self.write("{ ");
                    self.emit_list(&specifiers);
                    self.write(" };");
                }
            }
            NodeKind::ExportSpecifier { local, exported } => {
                let (local, exported) = (*local, *exported);
                self.emit_node(local);
                let same = match (self.kind(local), self.kind(exported)) {
                    (NodeKind::Ident { name: a }, NodeKind::Ident { name: b }) => a == b,
                    _ => false,
                };
                if !same {
                    self.write(" as ");
                    self.emit_node(exported);
                }
            }
            NodeKind::ExportDefault { declaration } => {
                let declaration = *declaration;
                self.write("export default ");
                self.emit_node(declaration);
                if !matches!(
                    self.kind(declaration),
                    NodeKind::Class { .. } | NodeKind::FunctionExpr { .. }
                ) {
                    self.write(";");
                }
            }
            NodeKind::Program { stmts } => {
                let stmts = stmts.clone();
                for &stmt in &stmts {
                    self.emit_node(stmt);
                    self.write_line();
                }
            }
            NodeKind::Class {
                id,
                super_class,
                decorators,
                body,
                ..
            } => {
                let (id, super_class, decorators, body) =
                    (*id, *super_class, decorators.clone(), body.clone());
                for &dec in &decorators {
                    self.emit_node(dec);
                    self.write_line();
                    self.write_indent();
                }
                self.write("class");
                if let Some(id) = id {
                    self.write(" ");
                    self.emit_node(id);
                }
                if let Some(sup) = super_class {
                    self.write(" extends ");
                    self.emit_operand(sup);
                }
                self.write(" {");
                self.write_line();
                self.indent_level += 1;
                for &member in &body {
                    if matches!(
                        self.kind(member),
                        NodeKind::TypeOnlyMember | NodeKind::IndexSignature
                    ) {
                        continue;
                    }
                    self.write_indent();
                    self.emit_node(member);
                    self.write_line();
                }
                self.indent_level -= 1;
                self.write_indent();
                self.write("}");
            }
            NodeKind::Decorator { expr } => {
                self.write("@");
                self.emit_node(*expr);
            }
            NodeKind::ClassMethod {
                key,
                kind,
                params,
                body,
                is_static,
                computed,
                ..
            } => {
                let (key, kind, params, body, is_static, computed) = (
                    *key,
                    *kind,
                    params.clone(),
                    body.clone(),
                    *is_static,
                    *computed,
                );
                self.emit_method(key, kind, &params, &body, is_static, computed);
            }
            NodeKind::ClassPrivateMethod {
                key,
                kind,
                params,
                body,
                is_static,
                ..
            } => {
                let (key, kind, params, body, is_static) =
                    (*key, *kind, params.clone(), body.clone(), *is_static);
                self.emit_method(key, kind, &params, &body, is_static, false);
            }
            NodeKind::ClassField {
                key,
                value,
                is_static,
                computed,
                ..
            } => {
                let (key, value, is_static, computed) = (*key, *value, *is_static, *computed);
                if is_static {
                    self.write("static ");
                }
                if computed {
                    self.write("[");
                    self.emit_node(key);
                    self.write("]");
                } else {
                    self.emit_node(key);
                }
                if let Some(value) = value {
                    self.write(" = ");
                    self.emit_node(value);
                }
                self.write(";");
            }
            NodeKind::ClassPrivateField {
                key,
                value,
                is_static,
                ..
            } => {
                let (key, value, is_static) = (*key, *value, *is_static);
                if is_static {
                    self.write("static ");
                }
                self.emit_node(key);
                if let Some(value) = value {
                    self.write(" = ");
                    self.emit_node(value);
                }
                self.write(";");
            }
            NodeKind::ClassAccessor {
                key,
                value,
                is_static,
                computed,
                ..
            } => {
                let (key, value, is_static, computed) = (*key, *value, *is_static, *computed);
                if is_static {
                    self.write("static ");
                }
                self.write("accessor ");
                if computed {
                    self.write("[");
                    self.emit_node(key);
                    self.write("]");
                } else {
                    self.emit_node(key);
                }
                if let Some(value) = value {
                    self.write(" = ");
                    self.emit_node(value);
                }
                self.write(";");
            }
            NodeKind::StaticBlock { body } => {
                let body = body.clone();
                self.write("static ");
                self.emit_block_body(&body);
            }
            NodeKind::TypeOnlyMember | NodeKind::IndexSignature => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VarKind;

    #[test]
    fn test_print_member_call() {
        let mut arena = NodeArena::new();
        let obj = arena.ident("console");
        let callee = arena.member(obj, "log");
        let arg = arena.string("hi");
        let call = arena.call(callee, vec![arg]);
        assert_eq!(print(&arena, call), "console.log(\"hi\")");
    }

    #[test]
    fn test_print_brand_check_arrow() {
        let mut arena = NodeArena::new();
        let param = arena.ident("_");
        let pn = arena.private_name("m");
        let arg = arena.ident("_");
        let test = arena.binary("in", pn, arg);
        let arrow = arena.arrow(vec![param], test);
        assert_eq!(print(&arena, arrow), "_ => #m in _");
    }

    #[test]
    fn test_print_object_pattern_assignment_statement() {
        let mut arena = NodeArena::new();
        let key_e = arena.ident("e");
        let local = arena.ident("_init_x");
        let arr = arena.array_pattern(vec![local]);
        let prop = arena.object_prop(key_e, arr);
        let pattern = arena.object_pattern(vec![prop]);
        let callee = arena.ident("_applyDecs2305");
        let call = arena.call(callee, vec![]);
        let assign = arena.assign(pattern, call);
        let stmt = arena.expr_stmt(assign);
        assert_eq!(
            print(&arena, stmt),
            "({ e: [_init_x] } = _applyDecs2305());"
        );
    }

    #[test]
    fn test_print_let_declaration() {
        let mut arena = NodeArena::new();
        let decl = arena.var_decl(VarKind::Let, &["B"]);
        assert_eq!(print(&arena, decl), "let B;");
    }

    #[test]
    fn test_print_static_block_in_class() {
        let mut arena = NodeArena::new();
        let callee = arena.ident("_initClass");
        let call = arena.call(callee, vec![]);
        let stmt = arena.expr_stmt(call);
        let block = arena.static_block(vec![stmt]);
        let id = arena.ident("A");
        let class = arena.alloc(
            NodeKind::Class {
                id: Some(id),
                super_class: None,
                decorators: vec![],
                body: vec![block],
                is_expression: false,
            },
            crate::span::Span::dummy(),
        );
        let printed = print(&arena, class);
        assert!(printed.contains("class A {"));
        assert!(printed.contains("static {"));
        assert!(printed.contains("_initClass();"));
    }
}
