//! End-to-end tests for the decorator lowering: build a program through
//! the factory, run the pass, assert on the printed output.

use super::*;
use crate::ast::{MethodKind, NodeArena, NodeIndex, NodeKind, VarKind};
use crate::diagnostics::{codes, Diagnostic};
use crate::printer::print;
use crate::scope::Scope;
use crate::span::Span;

// =============================================================================
// Builders
// =============================================================================

fn decorator(arena: &mut NodeArena, name: &str) -> NodeIndex {
    let expr = arena.ident(name);
    arena.alloc(NodeKind::Decorator { expr }, Span::dummy())
}

fn declare(arena: &mut NodeArena, names: &[&str]) -> NodeIndex {
    arena.var_decl(VarKind::Let, names)
}

fn field(
    arena: &mut NodeArena,
    name: &str,
    value: Option<NodeIndex>,
    is_static: bool,
    decorators: Vec<NodeIndex>,
) -> NodeIndex {
    let key = arena.ident(name);
    arena.alloc(
        NodeKind::ClassField {
            key,
            value,
            is_static,
            computed: false,
            decorators,
        },
        Span::dummy(),
    )
}

fn method(
    arena: &mut NodeArena,
    name: &str,
    is_static: bool,
    decorators: Vec<NodeIndex>,
) -> NodeIndex {
    let key = arena.ident(name);
    arena.alloc(
        NodeKind::ClassMethod {
            key,
            kind: MethodKind::Method,
            params: vec![],
            body: vec![],
            is_static,
            computed: false,
            decorators,
        },
        Span::dummy(),
    )
}

fn accessor(
    arena: &mut NodeArena,
    name: &str,
    value: Option<NodeIndex>,
    decorators: Vec<NodeIndex>,
) -> NodeIndex {
    let key = arena.ident(name);
    arena.alloc(
        NodeKind::ClassAccessor {
            key,
            value,
            is_static: false,
            computed: false,
            decorators,
        },
        Span::dummy(),
    )
}

fn class_decl(
    arena: &mut NodeArena,
    name: &str,
    decorators: Vec<NodeIndex>,
    body: Vec<NodeIndex>,
) -> NodeIndex {
    let id = arena.ident(name);
    arena.alloc(
        NodeKind::Class {
            id: Some(id),
            super_class: None,
            decorators,
            body,
            is_expression: false,
        },
        Span::dummy(),
    )
}

fn class_decl_extends(
    arena: &mut NodeArena,
    name: &str,
    super_name: &str,
    decorators: Vec<NodeIndex>,
    body: Vec<NodeIndex>,
) -> NodeIndex {
    let id = arena.ident(name);
    let sup = arena.ident(super_name);
    arena.alloc(
        NodeKind::Class {
            id: Some(id),
            super_class: Some(sup),
            decorators,
            body,
            is_expression: false,
        },
        Span::dummy(),
    )
}

fn program_of(arena: &mut NodeArena, stmts: Vec<NodeIndex>) -> NodeIndex {
    arena.alloc(NodeKind::Program { stmts }, Span::dummy())
}

fn try_lower_with(
    arena: &mut NodeArena,
    program: NodeIndex,
    options: &DecoratorOptions,
) -> Result<String, Diagnostic> {
    let mut scope = Scope::for_program(arena, program);
    let mut pass = DecoratorLowering::new(options)?;
    pass.transform_program(arena, &mut scope, program)?;
    Ok(print(arena, program))
}

fn lower_with(arena: &mut NodeArena, program: NodeIndex, options: &DecoratorOptions) -> String {
    try_lower_with(arena, program, options).expect("transform should succeed")
}

fn lower(arena: &mut NodeArena, program: NodeIndex) -> String {
    lower_with(arena, program, &DecoratorOptions::default())
}

fn options_for(version: &str) -> DecoratorOptions {
    DecoratorOptions {
        version: version.to_string(),
        ..Default::default()
    }
}

/// Walk the tree from `root` and fail on any surviving decorator node.
fn assert_no_decorators(arena: &NodeArena, root: NodeIndex) {
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        assert!(
            !matches!(arena.kind(idx), NodeKind::Decorator { .. }),
            "decorator node survived the pass"
        );
        match arena.kind(idx) {
            NodeKind::Class { decorators, .. } => {
                assert!(decorators.is_empty(), "class kept its decorator list")
            }
            NodeKind::ClassMethod { decorators, .. }
            | NodeKind::ClassPrivateMethod { decorators, .. }
            | NodeKind::ClassField { decorators, .. }
            | NodeKind::ClassPrivateField { decorators, .. }
            | NodeKind::ClassAccessor { decorators, .. } => {
                assert!(decorators.is_empty(), "member kept its decorator list")
            }
            _ => {}
        }
        stack.extend(arena.children(idx));
    }
}

// =============================================================================
// Scenario 1: single field decorator
// =============================================================================

#[test]
fn test_single_field_decorator() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let f = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![f]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(out.contains("let _init_x;"), "missing local declaration: {out}");
    assert!(
        out.contains("[_init_x] = _applyDecs2305(this, [[dec, 0, \"x\"]], []).e;"),
        "unexpected decoration call: {out}"
    );
    assert!(out.contains("x = _init_x(this, 1);"), "field initializer: {out}");
    assert!(out.contains("static {"), "decoration must run in a static block: {out}");
    assert_no_decorators(&arena, program);
}

// =============================================================================
// Scenario 2: class decorator with a static member
// =============================================================================

#[test]
fn test_class_decorator_with_static_member() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", true, vec![]);
    let class = class_decl(&mut arena, "B", vec![d], vec![m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(out.contains("let B;"), "binding must be hoisted: {out}");
    assert!(
        out.contains("[_B, _initClass] = _applyDecs2305(this, [], [dec], 0).c;"),
        "class decoration call: {out}"
    );
    assert!(
        out.contains("B = new (class extends _identity {"),
        "static hoisting wrapper: {out}"
    );
    assert!(out.contains("static m() {"), "moved static member: {out}");
    assert!(out.contains("super(_B);"), "wrapper constructor super: {out}");
    assert!(out.contains("_initClass();"), "class-init call: {out}");
    // The original class keeps its name for `toString`.
    assert!(out.contains("class B {"), "name preservation: {out}");
    assert_no_decorators(&arena, program);
}

#[test]
fn test_class_decorator_without_statics_elides_wrapper() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", false, vec![]);
    let class = class_decl(&mut arena, "B", vec![d], vec![m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(!out.contains("_identity"), "no wrapper without statics: {out}");
    // The class-init thunk runs from a trailing static block instead.
    assert!(out.contains("_initClass();"), "trailing class-init: {out}");
    assert!(out.contains("B = (class B {"), "class expression bound: {out}");
    assert!(out.contains("}, _B);"), "class value flows through the local: {out}");
}

// =============================================================================
// Scenario 3: accessor desugaring (undecorated)
// =============================================================================

#[test]
fn test_undecorated_accessor_desugars() {
    let mut arena = NodeArena::new();
    let three = arena.number("3");
    let a = accessor(&mut arena, "p", Some(three), vec![]);
    let class = class_decl(&mut arena, "C", vec![], vec![a]);
    let program = program_of(&mut arena, vec![class]);

    let out = lower(&mut arena, program);
    assert!(out.contains("#_p = 3;"), "private storage: {out}");
    assert!(out.contains("get p() {"), "getter proxy: {out}");
    assert!(out.contains("return this.#_p;"), "getter body: {out}");
    assert!(out.contains("set p(v) {"), "setter proxy: {out}");
    assert!(out.contains("this.#_p = v;"), "setter body: {out}");
    // No decoration machinery for a plain accessor.
    assert!(!out.contains("_applyDecs"), "no helper call expected: {out}");
}

#[test]
fn test_decorated_accessor() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let a = accessor(&mut arena, "x", Some(one), vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![a]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("[_init_x, _initProto] = _applyDecs2305(this, [[dec, 1, \"x\"]], []).e;"),
        "accessor decoration: {out}"
    );
    // Proto-init threads through the storage initializer's receiver.
    assert!(
        out.contains("#_x = _init_x(_initProto(this), 1);"),
        "storage init with threaded proto-init: {out}"
    );
    assert!(out.contains("get x() {"), "getter survives: {out}");
    assert!(out.contains("return this.#_x;"), "getter proxies storage: {out}");
}

// =============================================================================
// Scenario 4: decorated private method is read-only
// =============================================================================

#[test]
fn test_write_to_decorated_private_method_is_fatal() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let pm_key = arena.private_name("m");
    let pm = arena.alloc(
        NodeKind::ClassPrivateMethod {
            key: pm_key,
            kind: MethodKind::Method,
            params: vec![],
            body: vec![],
            is_static: false,
            decorators: vec![d],
        },
        Span::dummy(),
    );
    // set() { this.#m = 0; }
    let this = arena.this_expr();
    let target = arena.member_private(this, "m");
    let zero = arena.number("0");
    let assign = arena.assign(target, zero);
    let stmt = arena.expr_stmt(assign);
    let set_key = arena.ident("set");
    let setter = arena.class_method(set_key, MethodKind::Method, vec![], vec![stmt], false);
    let class = class_decl(&mut arena, "D", vec![], vec![pm, setter]);
    let program = program_of(&mut arena, vec![decs, class]);

    let err = try_lower_with(&mut arena, program, &DecoratorOptions::default())
        .expect_err("write to decorated private method must fail");
    assert_eq!(err.code, codes::DECORATED_PRIVATE_METHOD_WRITE);
    assert!(err.message_text.contains("#m"), "message names the method: {err}");
}

#[test]
fn test_decorated_private_method_shape() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let pm_key = arena.private_name("m");
    let pm = arena.alloc(
        NodeKind::ClassPrivateMethod {
            key: pm_key,
            kind: MethodKind::Method,
            params: vec![],
            body: vec![],
            is_static: false,
            decorators: vec![d],
        },
        Span::dummy(),
    );
    let class = class_decl(&mut arena, "D", vec![], vec![pm]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    // The method becomes a private field holding the call thunk; the
    // extracted body rides in the decoration tuple.
    assert!(
        out.contains("[[dec, 2, \"#m\", function () {"),
        "extracted private method: {out}"
    );
    assert!(
        out.contains("#m = (_initProto(this), _call_m);"),
        "call-thunk field with threaded proto-init: {out}"
    );
    // Brand check for the decorated instance private element.
    assert!(out.contains("_ => #m in _"), "brand check: {out}");
}

// =============================================================================
// Scenario 5: constructor-threaded proto-init
// =============================================================================

#[test]
fn test_proto_init_threads_into_super_call() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec", "F"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", false, vec![d]);
    // constructor(x) { super(x); this.y = 1; }
    let sup = arena.super_expr();
    let x_arg = arena.ident("x");
    let super_call = arena.call(sup, vec![x_arg]);
    let super_stmt = arena.expr_stmt(super_call);
    let this = arena.this_expr();
    let y = arena.member(this, "y");
    let one = arena.number("1");
    let y_assign = arena.assign(y, one);
    let y_stmt = arena.expr_stmt(y_assign);
    let ctor_key = arena.ident("constructor");
    let x_param = arena.ident("x");
    let ctor = arena.class_method(
        ctor_key,
        MethodKind::Constructor,
        vec![x_param],
        vec![super_stmt, y_stmt],
        false,
    );
    let class = class_decl_extends(&mut arena, "E", "F", vec![], vec![m, ctor]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("_initProto(super(x));"),
        "super call must be wrapped: {out}"
    );
    assert!(out.contains("this.y = 1;"), "rest of constructor survives: {out}");
    assert!(
        out.contains("[_initProto] = _applyDecs2305(this, [[dec, 2, \"m\"]], [], 0, void 0, F).e;"),
        "method decoration with superclass pass-through: {out}"
    );
}

#[test]
fn test_proto_init_synthesizes_constructor() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(out.contains("constructor() {"), "synthesized constructor: {out}");
    assert!(out.contains("_initProto(this);"), "proto-init call: {out}");
}

// =============================================================================
// Scenario 6: computed decorated field with an effectful key
// =============================================================================

#[test]
fn test_computed_decorated_field_memoizes_key() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec", "f", "v"]);
    let d = decorator(&mut arena, "dec");
    let f_ref = arena.ident("f");
    let key = arena.call(f_ref, vec![]);
    let v_ref = arena.ident("v");
    let member = arena.alloc(
        NodeKind::ClassField {
            key,
            value: Some(v_ref),
            is_static: false,
            computed: true,
            decorators: vec![d],
        },
        Span::dummy(),
    );
    let class = class_decl(&mut arena, "G", vec![], vec![member]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("_computedKey = _toPropertyKey(f());"),
        "key memoized before the class: {out}"
    );
    assert!(
        out.contains("[[dec, 0, _computedKey]]"),
        "memoized key in the decoration name slot: {out}"
    );
    assert!(
        out.contains("[_computedKey] = _init_computedKey(this, v);"),
        "memoized key as the field key: {out}"
    );
    let memo_at = out.find("_toPropertyKey").expect("memo present");
    let class_at = out.find("class G").expect("class present");
    assert!(memo_at < class_at, "memo must precede the class: {out}");
}

// =============================================================================
// Ordering, flags, memoization
// =============================================================================

#[test]
fn test_decoration_array_bucket_order() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    // Source order chosen against the bucket order on purpose.
    let d1 = decorator(&mut arena, "dec");
    let if_field = field(&mut arena, "ifield", None, false, vec![d1]);
    let d2 = decorator(&mut arena, "dec");
    let sf_field = field(&mut arena, "sfield", None, true, vec![d2]);
    let d3 = decorator(&mut arena, "dec");
    let im = method(&mut arena, "im", false, vec![d3]);
    let d4 = decorator(&mut arena, "dec");
    let sm = method(&mut arena, "sm", true, vec![d4]);
    let class = class_decl(&mut arena, "A", vec![], vec![if_field, sf_field, im, sm]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    // Static non-fields, instance non-fields, static fields, instance fields.
    assert!(
        out.contains("[[dec, 10, \"sm\"], [dec, 2, \"im\"], [dec, 8, \"sfield\"], [dec, 0, \"ifield\"]]"),
        "bucket order and flags: {out}"
    );
}

#[test]
fn test_effectful_decorator_expression_is_memoized() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["f"]);
    let f_ref = arena.ident("f");
    let call = arena.call(f_ref, vec![]);
    let d = arena.alloc(NodeKind::Decorator { expr: call }, Span::dummy());
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(out.contains("_f = f();"), "decorator memoized: {out}");
    assert!(out.contains("[[_f, 0, \"x\"]]"), "memoized reference used: {out}");
}

#[test]
fn test_member_decorator_receiver_pairs() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["obj"]);
    let obj = arena.ident("obj");
    let expr = arena.member(obj, "dec");
    let d = arena.alloc(NodeKind::Decorator { expr }, Span::dummy());
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    // Receiver pairs flip bit 4 of the flag.
    assert!(
        out.contains("[[obj, obj.dec], 16, \"x\"]"),
        "receiver pair encoding: {out}"
    );
}

// =============================================================================
// Version divergence
// =============================================================================

#[test]
fn test_2021_12_flat_destructuring() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d1 = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d1]);
    let d2 = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", false, vec![d2]);
    let class = class_decl(&mut arena, "A", vec![], vec![x, m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower_with(&mut arena, program, &options_for("2021-12"));
    assert!(
        out.contains("[_init_x, _initProto] = _applyDecs(this, [[dec, 2, \"m\"], [dec, 0, \"x\"]], []);"),
        "flat array shape without .e/.c: {out}"
    );
    assert!(!out.contains(".e;"), "no record access in 2021-12: {out}");
}

#[test]
fn test_2022_03_uses_record_helper_when_available() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower_with(&mut arena, program, &options_for("2022-03"));
    assert!(out.contains("_applyDecs2203R("), "record helper preferred: {out}");
    assert!(out.contains(").e;"), "record shape: {out}");
}

#[test]
fn test_2022_03_falls_back_to_flat_helper() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let program = program_of(&mut arena, vec![decs, class]);

    let mut options = options_for("2022-03");
    options.apply_decs_2203_r_available = false;
    let out = lower_with(&mut arena, program, &options);
    assert!(out.contains("_applyDecs2203("), "flat fallback helper: {out}");
    assert!(!out.contains(").e;"), "no record access: {out}");
}

#[test]
fn test_2023_01_brand_check_without_receivers() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let key = arena.private_name("p");
    let one = arena.number("1");
    let p = arena.alloc(
        NodeKind::ClassPrivateField {
            key,
            value: Some(one),
            is_static: false,
            decorators: vec![d],
        },
        Span::dummy(),
    );
    let class = class_decl(&mut arena, "A", vec![], vec![p]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower_with(&mut arena, program, &options_for("2023-01"));
    assert!(
        out.contains("_applyDecs2301(this, [[dec, 0, \"#p\"]], [], _ => #p in _)"),
        "brand check as the fourth argument: {out}"
    );
}

// =============================================================================
// Named evaluation and exports
// =============================================================================

#[test]
fn test_named_evaluation_from_variable_initializer() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let y = field(&mut arena, "y", Some(one), false, vec![d]);
    let class = arena.alloc(
        NodeKind::Class {
            id: None,
            super_class: None,
            decorators: vec![],
            body: vec![y],
            is_expression: true,
        },
        Span::dummy(),
    );
    let x_id = arena.ident("x");
    let declarator = arena.alloc(
        NodeKind::VarDeclarator {
            name: x_id,
            init: Some(class),
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
    let program = program_of(&mut arena, vec![decs, decl]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("_applyDecs2305(_setFunctionName(this, \"x\")"),
        "inferred name bound through setFunctionName: {out}"
    );
}

#[test]
fn test_export_named_declaration_splits() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let export = arena.alloc(
        NodeKind::ExportNamed {
            declaration: Some(class),
            specifiers: vec![],
        },
        Span::dummy(),
    );
    let program = program_of(&mut arena, vec![decs, export]);

    let out = lower(&mut arena, program);
    assert!(out.contains("class A {"), "declaration stays: {out}");
    assert!(out.contains("export { A };"), "trailing specifier export: {out}");
    assert!(!out.contains("export class"), "export wrapper removed: {out}");
}

#[test]
fn test_export_default_decorated_class_splits() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", true, vec![]);
    let class = class_decl(&mut arena, "B", vec![d], vec![m]);
    let export = arena.alloc(NodeKind::ExportDefault { declaration: class }, Span::dummy());
    let program = program_of(&mut arena, vec![decs, export]);

    let out = lower(&mut arena, program);
    assert!(out.contains("let B;"), "hoisted binding: {out}");
    assert!(out.contains("export { B as default };"), "default alias: {out}");
}

#[test]
fn test_export_default_anonymous_gets_synthetic_name() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = arena.alloc(
        NodeKind::Class {
            id: None,
            super_class: None,
            decorators: vec![],
            body: vec![x],
            is_expression: false,
        },
        Span::dummy(),
    );
    let export = arena.alloc(NodeKind::ExportDefault { declaration: class }, Span::dummy());
    let program = program_of(&mut arena, vec![decs, export]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("_setFunctionName(this, \"default\")"),
        "synthetic name: {out}"
    );
    assert!(out.contains("export { _default as default };"), "export alias: {out}");
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_undecorated_class_is_untouched() {
    let mut arena = NodeArena::new();
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![]);
    let m = method(&mut arena, "m", false, vec![]);
    let class = class_decl(&mut arena, "A", vec![], vec![x, m]);
    let program = program_of(&mut arena, vec![class]);
    let before = print(&arena, program);

    let out = lower(&mut arena, program);
    assert_eq!(before, out, "lowering an undecorated class must be the identity");
}

#[test]
fn test_idempotent_on_own_output() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![x]);
    let program = program_of(&mut arena, vec![decs, class]);

    let first = lower(&mut arena, program);
    // A fresh pass over the output must change nothing.
    let second = lower(&mut arena, program);
    assert_eq!(first, second, "pass must be a no-op on its own output");
}

#[test]
fn test_decorator_elimination_everywhere() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let cd = decorator(&mut arena, "dec");
    let d1 = decorator(&mut arena, "dec");
    let one = arena.number("1");
    let x = field(&mut arena, "x", Some(one), false, vec![d1]);
    let d2 = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", false, vec![d2]);
    let d3 = decorator(&mut arena, "dec");
    let two = arena.number("2");
    let a = accessor(&mut arena, "p", Some(two), vec![d3]);
    let sm = method(&mut arena, "s", true, vec![]);
    let class = class_decl(&mut arena, "A", vec![cd], vec![x, m, a, sm]);
    let program = program_of(&mut arena, vec![decs, class]);

    lower(&mut arena, program);
    assert_no_decorators(&arena, program);
}

#[test]
fn test_static_init_called_after_decoration() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", true, vec![d]);
    let class = class_decl(&mut arena, "A", vec![], vec![m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("[_initStatic] = _applyDecs2305(this, [[dec, 10, \"m\"]], []).e;"),
        "static method decoration: {out}"
    );
    assert!(out.contains("_initStatic(this);"), "static-init call: {out}");
    let apply_at = out.find("_applyDecs2305").expect("helper call");
    let init_at = out.find("_initStatic(this);").expect("init call");
    assert!(apply_at < init_at, "decoration precedes static-init: {out}");
}

// =============================================================================
// Super rewriting in extracted private methods
// =============================================================================

fn super_call_class(arena: &mut NodeArena) -> NodeIndex {
    // class E extends F { @dec #m() { return super.go(1); } }
    let d = decorator(arena, "dec");
    let sup = arena.super_expr();
    let go = arena.member(sup, "go");
    let one = arena.number("1");
    let call = arena.call(go, vec![one]);
    let ret = arena.ret(Some(call));
    let key = arena.private_name("m");
    let pm = arena.alloc(
        NodeKind::ClassPrivateMethod {
            key,
            kind: MethodKind::Method,
            params: vec![],
            body: vec![ret],
            is_static: false,
            decorators: vec![d],
        },
        Span::dummy(),
    );
    class_decl_extends(arena, "E", "F", vec![], vec![pm])
}

#[test]
fn test_constant_super_references_superclass_directly() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec", "F"]);
    let class = super_call_class(&mut arena);
    let program = program_of(&mut arena, vec![decs, class]);

    let options = DecoratorOptions {
        constant_super: Some(true),
        ..Default::default()
    };
    let out = lower_with(&mut arena, program, &options);
    assert!(
        out.contains("F.prototype.go.call(this, 1)"),
        "direct superclass reference with receiver kept: {out}"
    );
}

#[test]
fn test_dynamic_super_goes_through_get_prototype_of() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec", "F"]);
    let class = super_call_class(&mut arena);
    let program = program_of(&mut arena, vec![decs, class]);

    let out = lower(&mut arena, program);
    assert!(
        out.contains("Object.getPrototypeOf(E.prototype).go.call(this, 1)"),
        "prototype discovered dynamically: {out}"
    );
}

#[test]
fn test_loose_option_seeds_constant_super() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec", "F"]);
    let class = super_call_class(&mut arena);
    let program = program_of(&mut arena, vec![decs, class]);

    // Deprecated `loose` turns the assumption on; an explicit assumption
    // would win over it.
    let options = DecoratorOptions {
        loose: true,
        ..Default::default()
    };
    let out = lower_with(&mut arena, program, &options);
    assert!(
        out.contains("F.prototype.go.call(this, 1)"),
        "loose defaults constantSuper on: {out}"
    );
}

#[test]
fn test_helpers_tracked() {
    let mut arena = NodeArena::new();
    let decs = declare(&mut arena, &["dec"]);
    let d = decorator(&mut arena, "dec");
    let m = method(&mut arena, "m", true, vec![]);
    let class = class_decl(&mut arena, "B", vec![d], vec![m]);
    let program = program_of(&mut arena, vec![decs, class]);

    let mut scope = Scope::for_program(&arena, program);
    let mut pass = DecoratorLowering::new(&DecoratorOptions::default()).expect("valid options");
    pass.transform_program(&mut arena, &mut scope, program)
        .expect("transform should succeed");
    assert!(pass.helpers().apply_decs_2305);
    assert!(pass.helpers().identity, "wrapper base helper tracked");
    assert!(!pass.helpers().apply_decs, "legacy helper untouched");
}
