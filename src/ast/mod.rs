//! AST node types and `NodeArena` storage.
//!
//! The tree is stored as an arena of nodes addressed by stable `NodeIndex`
//! handles. Children are referenced by index, never by pointer, so the
//! transform can rewrite a node in place (overwrite its kind at the same
//! index) without touching any parent. Sharing an identifier between two
//! emission sites is done by cloning the identifier node, never by aliasing.
//!
//! Node kinds form one tagged enum covering the JavaScript constructs the
//! decorator lowering consumes and emits: expressions, statements, patterns,
//! and the class-element variants (field, private field, method, private
//! method, accessor field, static block, type-only member, index signature).

pub mod factory;

use crate::span::Span;

/// Stable handle to a node in a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Method kinds, constructor included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

/// `var` / `let` / `const`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// A single AST node: a kind plus the span it originated from.
/// Synthesized nodes carry [`Span::dummy`].
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// The tagged node variant. Children are `NodeIndex` handles into the
/// owning arena.
#[derive(Clone, Debug)]
pub enum NodeKind {
    // =========================================================================
    // Identifiers and keywords
    // =========================================================================
    /// Identifier: `foo`, `_initProto`
    Ident { name: String },

    /// Private name: `#m` (stored without the sigil)
    PrivateName { name: String },

    /// `this`
    This,

    /// `super`
    Super,

    // =========================================================================
    // Literals
    // =========================================================================
    /// Numeric literal, kept as written: `42`, `3.14`
    NumberLit { text: String },

    /// String literal (cooked value)
    StringLit { value: String },

    BoolLit { value: bool },

    NullLit,

    /// `void 0`
    Void0,

    // =========================================================================
    // Expressions
    // =========================================================================
    /// Array literal; `None` elements are holes.
    ArrayLit { elements: Vec<Option<NodeIndex>> },

    /// Object literal of [`NodeKind::ObjectProp`] entries.
    ObjectLit { props: Vec<NodeIndex> },

    /// A property inside an object literal or object pattern.
    ObjectProp {
        key: NodeIndex,
        value: NodeIndex,
        computed: bool,
    },

    /// `object.property`, `object[property]`, `object.#property`
    Member {
        object: NodeIndex,
        property: NodeIndex,
        computed: bool,
    },

    Call {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
    },

    New {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
    },

    /// Assignment expression; `op` is the full operator text (`"="`,
    /// `"&&="`, `"??="`, `"+="`, ...).
    Assign {
        op: String,
        target: NodeIndex,
        value: NodeIndex,
    },

    /// Comma sequence `(a, b, c)`.
    Seq { exprs: Vec<NodeIndex> },

    Cond {
        test: NodeIndex,
        cons: NodeIndex,
        alt: NodeIndex,
    },

    /// Prefix unary (`!x`, `void x`, `typeof x`).
    Unary { op: String, arg: NodeIndex },

    /// `++x` / `x--` and friends.
    Update {
        op: String,
        prefix: bool,
        arg: NodeIndex,
    },

    /// Binary expression, including `in` for brand checks.
    Binary {
        op: String,
        left: NodeIndex,
        right: NodeIndex,
    },

    /// `...arg` in a call or array literal.
    Spread { arg: NodeIndex },

    /// Arrow function. `body` is either an expression or a `Block`.
    Arrow {
        params: Vec<NodeIndex>,
        body: NodeIndex,
    },

    /// Function expression.
    FunctionExpr {
        id: Option<NodeIndex>,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
    },

    // =========================================================================
    // Patterns
    // =========================================================================
    /// `[a, , b]` destructuring target; `None` elements are holes.
    ArrayPattern { elements: Vec<Option<NodeIndex>> },

    /// `{ e: [..], c: [..] }` destructuring target of `ObjectProp` entries.
    ObjectPattern { props: Vec<NodeIndex> },

    RestElement { arg: NodeIndex },

    /// `left = right` default inside a pattern or parameter list.
    AssignPattern { left: NodeIndex, right: NodeIndex },

    // =========================================================================
    // Statements
    // =========================================================================
    ExprStmt { expr: NodeIndex },

    VarDecl {
        kind: VarKind,
        declarators: Vec<NodeIndex>,
    },

    VarDeclarator {
        name: NodeIndex,
        init: Option<NodeIndex>,
    },

    Return { arg: Option<NodeIndex> },

    Block { stmts: Vec<NodeIndex> },

    If {
        test: NodeIndex,
        cons: NodeIndex,
        alt: Option<NodeIndex>,
    },

    /// `for (left of right) body`
    ForOf {
        left: NodeIndex,
        right: NodeIndex,
        body: NodeIndex,
    },

    /// `export { a as b }` (no declaration) or `export <declaration>`.
    ExportNamed {
        declaration: Option<NodeIndex>,
        specifiers: Vec<NodeIndex>,
    },

    ExportSpecifier {
        local: NodeIndex,
        exported: NodeIndex,
    },

    ExportDefault { declaration: NodeIndex },

    /// Top-level container.
    Program { stmts: Vec<NodeIndex> },

    // =========================================================================
    // Classes
    // =========================================================================
    Class {
        id: Option<NodeIndex>,
        super_class: Option<NodeIndex>,
        decorators: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        /// Declarations bind a name in the enclosing scope; expressions
        /// produce a value.
        is_expression: bool,
    },

    Decorator { expr: NodeIndex },

    ClassMethod {
        key: NodeIndex,
        kind: MethodKind,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        is_static: bool,
        computed: bool,
        decorators: Vec<NodeIndex>,
    },

    ClassPrivateMethod {
        key: NodeIndex,
        kind: MethodKind,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        is_static: bool,
        decorators: Vec<NodeIndex>,
    },

    ClassField {
        key: NodeIndex,
        value: Option<NodeIndex>,
        is_static: bool,
        computed: bool,
        decorators: Vec<NodeIndex>,
    },

    ClassPrivateField {
        key: NodeIndex,
        value: Option<NodeIndex>,
        is_static: bool,
        decorators: Vec<NodeIndex>,
    },

    /// `accessor` field; the key may be a private name.
    ClassAccessor {
        key: NodeIndex,
        value: Option<NodeIndex>,
        is_static: bool,
        computed: bool,
        decorators: Vec<NodeIndex>,
    },

    StaticBlock { body: Vec<NodeIndex> },

    /// Type-only member (`declare` field, abstract signature). Skipped by
    /// the pass, erased by a later pass.
    TypeOnlyMember,

    /// Index signature. Skipped by the pass.
    IndexSignature,
}

/// Arena storage for [`Node`]s.
///
/// Indices are stable for the lifetime of the arena; nodes are never moved
/// or removed, only overwritten in place.
#[derive(Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena::default()
    }

    /// Pre-allocate for roughly `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        idx
    }

    #[inline]
    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.index()]
    }

    #[inline]
    pub fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.nodes[idx.index()].kind
    }

    #[inline]
    pub fn span(&self, idx: NodeIndex) -> Span {
        self.nodes[idx.index()].span
    }

    /// Overwrite the node at `idx` in place, keeping its span.
    pub fn replace_kind(&mut self, idx: NodeIndex, kind: NodeKind) {
        self.nodes[idx.index()].kind = kind;
    }

    /// Move the node at `idx` to a fresh index and return the new handle.
    /// The original slot is left untouched; callers overwrite it next.
    pub fn hoist(&mut self, idx: NodeIndex) -> NodeIndex {
        let node = self.nodes[idx.index()].clone();
        let fresh = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        fresh
    }

    /// Direct children of a node, in source order. Used by the generic
    /// walkers (rename, scope crawl, forbidden-write scan).
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.push_children(idx, &mut out);
        out
    }

    pub fn push_children(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        fn opt(out: &mut Vec<NodeIndex>, x: &Option<NodeIndex>) {
            if let Some(i) = x {
                out.push(*i);
            }
        }
        match self.kind(idx) {
            NodeKind::Ident { .. }
            | NodeKind::PrivateName { .. }
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::NumberLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::Void0
            | NodeKind::TypeOnlyMember
            | NodeKind::IndexSignature => {}
            NodeKind::ArrayLit { elements } | NodeKind::ArrayPattern { elements } => {
                for e in elements {
                    opt(out, e);
                }
            }
            NodeKind::ObjectLit { props } | NodeKind::ObjectPattern { props } => {
                out.extend(props.iter().copied());
            }
            NodeKind::ObjectProp { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::Member {
                object, property, ..
            } => {
                out.push(*object);
                out.push(*property);
            }
            NodeKind::Call { callee, args } | NodeKind::New { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Seq { exprs } => out.extend(exprs.iter().copied()),
            NodeKind::Cond { test, cons, alt } => {
                out.push(*test);
                out.push(*cons);
                out.push(*alt);
            }
            NodeKind::Unary { arg, .. }
            | NodeKind::Update { arg, .. }
            | NodeKind::Spread { arg } => out.push(*arg),
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Arrow { params, body } => {
                out.extend(params.iter().copied());
                out.push(*body);
            }
            NodeKind::FunctionExpr { id, params, body } => {
                opt(out, id);
                out.extend(params.iter().copied());
                out.extend(body.iter().copied());
            }
            NodeKind::RestElement { arg } => out.push(*arg),
            NodeKind::AssignPattern { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::ExprStmt { expr } => out.push(*expr),
            NodeKind::VarDecl { declarators, .. } => out.extend(declarators.iter().copied()),
            NodeKind::VarDeclarator { name, init } => {
                out.push(*name);
                opt(out, init);
            }
            NodeKind::Return { arg } => opt(out, arg),
            NodeKind::Block { stmts } | NodeKind::Program { stmts } => {
                out.extend(stmts.iter().copied());
            }
            NodeKind::If { test, cons, alt } => {
                out.push(*test);
                out.push(*cons);
                opt(out, alt);
            }
            NodeKind::ForOf { left, right, body } => {
                out.push(*left);
                out.push(*right);
                out.push(*body);
            }
            NodeKind::ExportNamed {
                declaration,
                specifiers,
            } => {
                opt(out, declaration);
                out.extend(specifiers.iter().copied());
            }
            NodeKind::ExportSpecifier { local, exported } => {
                out.push(*local);
                out.push(*exported);
            }
            NodeKind::ExportDefault { declaration } => out.push(*declaration),
            NodeKind::Class {
                id,
                super_class,
                decorators,
                body,
                ..
            } => {
                out.extend(decorators.iter().copied());
                opt(out, id);
                opt(out, super_class);
                out.extend(body.iter().copied());
            }
            NodeKind::Decorator { expr } => out.push(*expr),
            NodeKind::ClassMethod {
                key,
                params,
                body,
                decorators,
                ..
            }
            | NodeKind::ClassPrivateMethod {
                key,
                params,
                body,
                decorators,
                ..
            } => {
                out.extend(decorators.iter().copied());
                out.push(*key);
                out.extend(params.iter().copied());
                out.extend(body.iter().copied());
            }
            NodeKind::ClassField {
                key,
                value,
                decorators,
                ..
            }
            | NodeKind::ClassPrivateField {
                key,
                value,
                decorators,
                ..
            }
            | NodeKind::ClassAccessor {
                key,
                value,
                decorators,
                ..
            } => {
                out.extend(decorators.iter().copied());
                out.push(*key);
                opt(out, value);
            }
            NodeKind::StaticBlock { body } => out.extend(body.iter().copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_replace_in_place() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(
            NodeKind::Ident {
                name: "x".to_string(),
            },
            Span::new(0, 1),
        );
        assert_eq!(arena.len(), 1);
        arena.replace_kind(id, NodeKind::This);
        assert!(matches!(arena.kind(id), NodeKind::This));
        // span survives the overwrite
        assert_eq!(arena.span(id), Span::new(0, 1));
    }

    #[test]
    fn test_hoist_copies_to_fresh_index() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(
            NodeKind::Ident {
                name: "x".to_string(),
            },
            Span::dummy(),
        );
        let moved = arena.hoist(id);
        assert_ne!(id, moved);
        match (arena.kind(id), arena.kind(moved)) {
            (NodeKind::Ident { name: a }, NodeKind::Ident { name: b }) => assert_eq!(a, b),
            _ => panic!("both slots should hold the identifier"),
        }
    }

    #[test]
    fn test_children_order_decorators_first() {
        let mut arena = NodeArena::new();
        let dec_expr = arena.alloc(
            NodeKind::Ident {
                name: "dec".to_string(),
            },
            Span::dummy(),
        );
        let dec = arena.alloc(NodeKind::Decorator { expr: dec_expr }, Span::dummy());
        let key = arena.alloc(
            NodeKind::Ident {
                name: "x".to_string(),
            },
            Span::dummy(),
        );
        let field = arena.alloc(
            NodeKind::ClassField {
                key,
                value: None,
                is_static: false,
                computed: false,
                decorators: vec![dec],
            },
            Span::dummy(),
        );
        assert_eq!(arena.children(field), vec![dec, key]);
    }
}
