//! Per-class lowering: element survey, auto-accessor desugar, decorator
//! extraction, and emission.
//!
//! One `ClassLowering` handles one class. The phases run strictly in
//! order over the member list, accumulating decoration records and
//! memoization assignments, and finish by assembling the `applyDecs*`
//! call inside a fresh leading static block. Class-level decorators
//! additionally hoist the static members into an `extends identity`
//! wrapper so that static initializers observe the decorated class.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::ast::{MethodKind, NodeArena, NodeIndex, NodeKind, VarKind};
use crate::diagnostics::Diagnostic;
use crate::scope::Scope;
use crate::span::Span;

use super::decorators::{DecoratorVersion, NameRef, VersionPolicy};
use super::decorators_validate::check_private_method_writes;
use super::helpers::HelpersNeeded;

/// Element kinds in the decoration tuple encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Field = 0,
    Accessor = 1,
    Method = 2,
    Getter = 3,
    Setter = 4,
}

/// The name slot of a decoration tuple: a string literal for identifier
/// and private keys, or a memoized computed-key local.
#[derive(Clone, Debug)]
enum DecName {
    Str(String),
    /// Template node, cloned at each use site.
    Node(NodeIndex),
}

/// One decorated element, created during extraction and consumed exactly
/// once when the decoration array is assembled.
struct DecoratorInfo {
    kind: ElementKind,
    is_static: bool,
    name: DecName,
    /// Decorator expressions, possibly rewritten to memoized locals.
    decorators: Vec<NodeIndex>,
    /// Parallel receivers for member-expression decorators ("2023-05" only).
    decorators_this: Vec<Option<NodeIndex>>,
    /// Extracted callables for private elements (1 for methods and
    /// getters/setters, 2 for private accessors).
    private_methods: Vec<NodeIndex>,
    /// Names of the locals the destructured runtime result writes.
    locals: Vec<String>,
}

/// What the lowering produced.
pub(crate) enum Lowered {
    /// Nothing on this class concerns the pass.
    Untouched,
    /// The class node was rewritten in place; no statement splice needed.
    InPlace,
    /// Declaration context: these statements replace the class statement.
    /// `binding` names the identifier the class value is reachable under,
    /// for the export-splitting visitor.
    Statements {
        stmts: Vec<NodeIndex>,
        binding: Option<String>,
    },
}

pub(crate) struct ClassLowering<'a> {
    arena: &'a mut NodeArena,
    scope: &'a mut Scope,
    helpers: &'a mut HelpersNeeded,
    version: DecoratorVersion,
    policy: VersionPolicy,
    constant_super: bool,
    class: NodeIndex,
    name_hint: Option<NameRef>,

    // class shape
    id_name: Option<String>,
    had_original_id: bool,
    super_class: Option<NodeIndex>,
    is_expression: bool,

    // working state
    class_ref: Option<String>,
    class_id_local: Option<String>,
    class_init_local: Option<String>,
    proto_init_local: Option<String>,
    static_init_local: Option<String>,
    dec_infos: Vec<DecoratorInfo>,
    class_dec_entries: Vec<(Option<NodeIndex>, NodeIndex)>,
    class_dec_memos: Vec<NodeIndex>,
    element_memos: Vec<NodeIndex>,
    new_body: Vec<NodeIndex>,
    private_names: FxHashSet<String>,
    decorated_private_methods: FxHashSet<String>,
    last_instance_private: Option<String>,
    /// Generated members that must never be hoisted out of the class
    /// (accessor proxies close over private storage).
    pinned_members: FxHashSet<NodeIndex>,
    needs_proto_init: bool,
    needs_static_init: bool,
    has_class_decs: bool,
}

impl<'a> ClassLowering<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        arena: &'a mut NodeArena,
        scope: &'a mut Scope,
        helpers: &'a mut HelpersNeeded,
        version: DecoratorVersion,
        policy: VersionPolicy,
        constant_super: bool,
        class: NodeIndex,
        name_hint: Option<NameRef>,
    ) -> Self {
        ClassLowering {
            arena,
            scope,
            helpers,
            version,
            policy,
            constant_super,
            class,
            name_hint,
            id_name: None,
            had_original_id: false,
            super_class: None,
            is_expression: false,
            class_ref: None,
            class_id_local: None,
            class_init_local: None,
            proto_init_local: None,
            static_init_local: None,
            dec_infos: Vec::new(),
            class_dec_entries: Vec::new(),
            class_dec_memos: Vec::new(),
            element_memos: Vec::new(),
            new_body: Vec::new(),
            private_names: FxHashSet::default(),
            decorated_private_methods: FxHashSet::default(),
            last_instance_private: None,
            pinned_members: FxHashSet::default(),
            needs_proto_init: false,
            needs_static_init: false,
            has_class_decs: false,
        }
    }

    pub(crate) fn run(mut self) -> Result<Lowered, Diagnostic> {
        let NodeKind::Class {
            id,
            super_class,
            decorators,
            body,
            is_expression,
        } = self.arena.kind(self.class).clone()
        else {
            return Ok(Lowered::Untouched);
        };

        self.id_name = id.and_then(|i| self.arena.ident_name(i).map(str::to_string));
        self.had_original_id = self.id_name.is_some();
        self.super_class = super_class;
        self.is_expression = is_expression;
        self.has_class_decs = !decorators.is_empty();

        let has_element_decs = body
            .iter()
            .any(|&m| !member_decorators(self.arena, m).is_empty());
        let has_accessors = body
            .iter()
            .any(|&m| matches!(self.arena.kind(m), NodeKind::ClassAccessor { .. }));

        if !self.has_class_decs && !has_element_decs && !has_accessors {
            return Ok(Lowered::Untouched);
        }

        debug!(
            name = self.id_name.as_deref().unwrap_or("<anonymous>"),
            version = self.version.as_str(),
            class_decorated = self.has_class_decs,
            "lowering decorated class"
        );

        // Private names already in use; fresh storage names must avoid them.
        for &m in &body {
            if let Some(name) = member_private_name(self.arena, m) {
                self.private_names.insert(name);
            }
        }

        // P1: binding rewrite. A class-decorated class gets a fresh local
        // holding the decorated result; internal uses of the original name
        // are renamed to it, while the class keeps its own id for `name`
        // and `toString`.
        if self.has_class_decs {
            let hint = self
                .id_name
                .clone()
                .or_else(|| match &self.name_hint {
                    Some(NameRef::Str(s)) if is_identifier_name(s) => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| "decorated_class".to_string());
            let local = self.scope.generate_declared_uid(&hint);
            if let Some(original) = self.id_name.clone() {
                self.scope
                    .rename_inside(self.arena, self.class, &original, &local);
            }
            self.class_ref = Some(local.clone());
            self.class_id_local = Some(local);
            self.class_init_local = Some(self.scope.generate_declared_uid("initClass"));
            self.process_class_decorators(&decorators);
        } else if let Some(name) = self.id_name.clone() {
            self.class_ref = Some(name);
        }

        // P2-P4 over the members, in source order.
        for m in body {
            self.process_member(m)?;
        }

        if !self.has_class_decs && self.dec_infos.is_empty() {
            // Accessor desugar only: write the body back and stop.
            self.write_back_class(false);
            return Ok(if self.element_memos.is_empty() {
                Lowered::InPlace
            } else {
                self.finish_without_decorations()
            });
        }

        // P5: emission.
        if self.needs_proto_init {
            self.proto_init_local = Some(self.scope.generate_declared_uid("initProto"));
        }
        if self.needs_static_init {
            self.static_init_local = Some(self.scope.generate_declared_uid("initStatic"));
        }
        self.thread_proto_init();

        let result = if self.has_class_decs {
            self.emit_with_class_decorators()
        } else {
            self.emit_elements_only()
        };

        // P6: validation over everything the class turned into.
        match &result {
            Lowered::Statements { stmts, .. } => {
                for &s in stmts {
                    check_private_method_writes(self.arena, s, &self.decorated_private_methods)?;
                }
            }
            _ => {
                check_private_method_writes(self.arena, self.class, &self.decorated_private_methods)?;
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Small builders
    // =========================================================================

    fn ident(&mut self, name: &str) -> NodeIndex {
        self.arena.ident(name)
    }

    fn this(&mut self) -> NodeIndex {
        self.arena.this_expr()
    }

    fn num(&mut self, n: u32) -> NodeIndex {
        self.arena.number(&n.to_string())
    }

    /// The identifier used for internal references to the class, creating
    /// one if the class has none.
    fn ensure_class_ref(&mut self) -> String {
        if let Some(name) = &self.class_ref {
            return name.clone();
        }
        let name = self.scope.generate_uid("Class");
        self.class_ref = Some(name.clone());
        if self.id_name.is_none() {
            self.id_name = Some(name.clone());
        }
        name
    }

    fn fresh_private_name(&mut self, base: &str) -> String {
        let base = base.trim_start_matches('_');
        let base = if base.is_empty() { "computedKey" } else { base };
        let mut i = 0u32;
        loop {
            let candidate = if i == 0 {
                format!("_{base}")
            } else {
                format!("_{base}{}", i + 1)
            };
            if !self.private_names.contains(&candidate) {
                self.private_names.insert(candidate.clone());
                return candidate;
            }
            i += 1;
        }
    }

    fn name_node(&mut self, name: &DecName) -> NodeIndex {
        match name {
            DecName::Str(s) => self.arena.string(s),
            DecName::Node(idx) => self.arena.clone_node(*idx),
        }
    }

    /// Memoize `expr` (already in the tree at `expr`): the original node is
    /// hoisted into an assignment pushed onto `out`, and the slot is
    /// rewritten to the fresh local.
    fn memoise_in_place(&mut self, expr: NodeIndex, out_is_class: bool) -> String {
        let hoisted = self.arena.hoist(expr);
        let local = {
            let hint = hint_for(self.arena, hoisted);
            self.scope.generate_declared_uid(&hint)
        };
        let target = self.ident(&local);
        let assign = self.arena.assign(target, hoisted);
        if out_is_class {
            self.class_dec_memos.push(assign);
        } else {
            self.element_memos.push(assign);
        }
        self.arena.replace_kind(
            expr,
            NodeKind::Ident {
                name: local.clone(),
            },
        );
        local
    }

    // =========================================================================
    // Decorator extraction (P4)
    // =========================================================================

    /// Prepare one decorator list: memoize unstable expressions in place and
    /// record receivers for member-expression decorators.
    fn process_decorator_list(
        &mut self,
        decorators: &[NodeIndex],
        for_class: bool,
    ) -> (Vec<NodeIndex>, Vec<Option<NodeIndex>>) {
        let mut refs = Vec::with_capacity(decorators.len());
        let mut receivers = Vec::with_capacity(decorators.len());
        for &d in decorators {
            let expr = match self.arena.kind(d) {
                NodeKind::Decorator { expr } => *expr,
                _ => d,
            };
            let receiver = match self.arena.kind(expr).clone() {
                NodeKind::Member { object, .. } => {
                    if self.arena.is_super(object) || self.arena.is_this_expression(object) {
                        // `@super.x` / `@this.x`: the receiver is the
                        // enclosing `this`; the object itself stays.
                        if self.policy.track_this {
                            Some(self.this())
                        } else {
                            None
                        }
                    } else if self.scope.is_static(self.arena, object) {
                        if self.policy.track_this {
                            Some(self.arena.clone_node(object))
                        } else {
                            None
                        }
                    } else {
                        let local = self.memoise_in_place(object, for_class);
                        trace!(local = %local, "memoized decorator receiver");
                        if self.policy.track_this {
                            Some(self.ident(&local))
                        } else {
                            None
                        }
                    }
                }
                _ => {
                    if !self.scope.is_static(self.arena, expr) {
                        let local = self.memoise_in_place(expr, for_class);
                        trace!(local = %local, "memoized decorator expression");
                    }
                    None
                }
            };
            refs.push(expr);
            receivers.push(receiver);
        }
        (refs, receivers)
    }

    fn process_class_decorators(&mut self, decorators: &[NodeIndex]) {
        let (refs, receivers) = self.process_decorator_list(decorators, true);
        self.class_dec_entries = receivers.into_iter().zip(refs).collect();
    }

    /// Resolve an element key into (decoration name, rewritten key, computed)
    /// memoizing effectful computed keys through `toPropertyKey`.
    fn resolve_key(
        &mut self,
        key: NodeIndex,
        computed: bool,
        private: bool,
    ) -> (DecName, NodeIndex, bool) {
        if private {
            debug_assert!(!computed, "private names are never computed");
            let name = self
                .arena
                .private_name_of(key)
                .expect("private key")
                .to_string();
            return (DecName::Str(format!("#{name}")), key, false);
        }
        if !computed {
            let name = match self.arena.kind(key) {
                NodeKind::Ident { name } => name.clone(),
                NodeKind::StringLit { value } => value.clone(),
                NodeKind::NumberLit { text } => text.clone(),
                _ => String::new(),
            };
            return (DecName::Str(name), key, false);
        }
        if self.scope.is_static(self.arena, key) {
            return (DecName::Node(key), key, true);
        }
        // Effectful computed key: evaluate `toPropertyKey(key)` once.
        self.helpers.to_property_key = true;
        let hoisted = self.arena.hoist(key);
        let local = self.scope.generate_declared_uid("computedKey");
        let callee = self.ident("_toPropertyKey");
        let call = self.arena.call(callee, vec![hoisted]);
        let target = self.ident(&local);
        let assign = self.arena.assign(target, call);
        self.element_memos.push(assign);
        self.arena.replace_kind(
            key,
            NodeKind::Ident {
                name: local.clone(),
            },
        );
        (DecName::Node(key), key, true)
    }

    fn mark_element_init(&mut self, is_static: bool) {
        if is_static {
            self.needs_static_init = true;
        } else {
            self.needs_proto_init = true;
        }
    }

    fn track_instance_private(&mut self, name: &str, is_static: bool) {
        if !is_static {
            self.last_instance_private = Some(name.to_string());
        }
    }

    // =========================================================================
    // Member processing (P2-P4)
    // =========================================================================

    fn process_member(&mut self, m: NodeIndex) -> Result<(), Diagnostic> {
        match self.arena.kind(m).clone() {
            NodeKind::ClassAccessor {
                key,
                value,
                is_static,
                computed,
                decorators,
            } => self.lower_accessor(key, value, is_static, computed, &decorators),
            NodeKind::ClassField {
                key,
                value,
                is_static,
                computed,
                decorators,
            } => self.lower_field(m, key, value, is_static, computed, &decorators, false),
            NodeKind::ClassPrivateField {
                key,
                value,
                is_static,
                decorators,
            } => self.lower_field(m, key, value, is_static, false, &decorators, true),
            NodeKind::ClassMethod {
                key,
                kind,
                params,
                body,
                is_static,
                computed,
                decorators,
            } => {
                if decorators.is_empty() {
                    self.new_body.push(m);
                    return Ok(());
                }
                let (refs, receivers) = self.process_decorator_list(&decorators, false);
                let (name, new_key, new_computed) = self.resolve_key(key, computed, false);
                let element_kind = match kind {
                    MethodKind::Get => ElementKind::Getter,
                    MethodKind::Set => ElementKind::Setter,
                    _ => ElementKind::Method,
                };
                self.mark_element_init(is_static);
                self.dec_infos.push(DecoratorInfo {
                    kind: element_kind,
                    is_static,
                    name,
                    decorators: refs,
                    decorators_this: receivers,
                    private_methods: Vec::new(),
                    locals: Vec::new(),
                });
                self.arena.replace_kind(
                    m,
                    NodeKind::ClassMethod {
                        key: new_key,
                        kind,
                        params,
                        body,
                        is_static,
                        computed: new_computed,
                        decorators: Vec::new(),
                    },
                );
                self.new_body.push(m);
                Ok(())
            }
            NodeKind::ClassPrivateMethod {
                key,
                kind,
                params,
                body,
                is_static,
                decorators,
            } => {
                if decorators.is_empty() {
                    self.new_body.push(m);
                    return Ok(());
                }
                self.lower_private_method(m, key, kind, params, body, is_static, &decorators)
            }
            _ => {
                // Static blocks, type-only members, and index signatures
                // pass through untouched here.
                self.new_body.push(m);
                Ok(())
            }
        }
    }

    fn lower_field(
        &mut self,
        m: NodeIndex,
        key: NodeIndex,
        value: Option<NodeIndex>,
        is_static: bool,
        computed: bool,
        decorators: &[NodeIndex],
        private: bool,
    ) -> Result<(), Diagnostic> {
        if decorators.is_empty() {
            self.new_body.push(m);
            return Ok(());
        }
        let (refs, receivers) = self.process_decorator_list(decorators, false);
        let (name, new_key, new_computed) = self.resolve_key(key, computed, private);

        let base = match &name {
            DecName::Str(s) => s.trim_start_matches('#').to_string(),
            DecName::Node(_) => "computedKey".to_string(),
        };
        let init_local = self.scope.generate_declared_uid(&format!("init_{base}"));

        // x = 1  ->  x = _init_x(this, 1)
        let callee = self.ident(&init_local);
        let this = self.this();
        let mut args = vec![this];
        if let Some(v) = value {
            args.push(v);
        }
        let init_call = self.arena.call(callee, args);

        if private {
            let pname = self
                .arena
                .private_name_of(new_key)
                .expect("private key")
                .to_string();
            self.track_instance_private(&pname, is_static);
            self.arena.replace_kind(
                m,
                NodeKind::ClassPrivateField {
                    key: new_key,
                    value: Some(init_call),
                    is_static,
                    decorators: Vec::new(),
                },
            );
        } else {
            self.arena.replace_kind(
                m,
                NodeKind::ClassField {
                    key: new_key,
                    value: Some(init_call),
                    is_static,
                    computed: new_computed,
                    decorators: Vec::new(),
                },
            );
        }
        self.new_body.push(m);

        self.dec_infos.push(DecoratorInfo {
            kind: ElementKind::Field,
            is_static,
            name,
            decorators: refs,
            decorators_this: receivers,
            private_methods: Vec::new(),
            locals: vec![init_local],
        });
        Ok(())
    }

    /// P3: `accessor p = v` becomes private storage plus a get/set pair,
    /// decorated or not.
    fn lower_accessor(
        &mut self,
        key: NodeIndex,
        value: Option<NodeIndex>,
        is_static: bool,
        computed: bool,
        decorators: &[NodeIndex],
    ) -> Result<(), Diagnostic> {
        let private = matches!(self.arena.kind(key), NodeKind::PrivateName { .. });
        let decorated = !decorators.is_empty();
        let (refs, receivers) = if decorated {
            self.process_decorator_list(decorators, false)
        } else {
            (Vec::new(), Vec::new())
        };
        let (name, new_key, new_computed) = self.resolve_key(key, computed, private);

        let base = match &name {
            DecName::Str(s) => s.trim_start_matches('#').to_string(),
            DecName::Node(_) => "computedKey".to_string(),
        };
        let storage = self.fresh_private_name(&base);

        // 2023-05 reads static accessor storage through the class binding
        // rather than `this`.
        let use_class_receiver = is_static && self.policy.track_this;
        let class_ref = if use_class_receiver {
            Some(self.ensure_class_ref())
        } else {
            None
        };

        // Storage field.
        let storage_value = if decorated {
            let init_local = self.scope.generate_declared_uid(&format!("init_{base}"));
            let callee = self.ident(&init_local);
            let this = self.this();
            let mut args = vec![this];
            if let Some(v) = value {
                args.push(v);
            }
            let call = self.arena.call(callee, args);

            let mut locals = vec![init_local];
            let mut private_methods = Vec::new();
            if private {
                let get_local = self.scope.generate_declared_uid(&format!("get_{base}"));
                let set_local = self.scope.generate_declared_uid(&format!("set_{base}"));
                // function () { return this.#storage; }
                let this2 = self.this();
                let read = self.arena.member_private(this2, &storage);
                let ret = self.arena.ret(Some(read));
                private_methods.push(self.arena.function_expr(vec![], vec![ret]));
                // function (v) { this.#storage = v; }
                let v_param = self.ident("v");
                let this3 = self.this();
                let target = self.arena.member_private(this3, &storage);
                let v_ref = self.ident("v");
                let assign = self.arena.assign(target, v_ref);
                let assign_stmt = self.arena.expr_stmt(assign);
                private_methods.push(self.arena.function_expr(vec![v_param], vec![assign_stmt]));
                locals.push(get_local);
                locals.push(set_local);
            }

            if let DecName::Str(s) = &name {
                if let Some(p) = s.strip_prefix('#') {
                    self.track_instance_private(p, is_static);
                }
            }
            self.mark_element_init(is_static);
            self.dec_infos.push(DecoratorInfo {
                kind: ElementKind::Accessor,
                is_static,
                name: name.clone(),
                decorators: refs,
                decorators_this: receivers,
                private_methods,
                locals,
            });
            Some(call)
        } else {
            value
        };

        let storage_key = self.arena.private_name(&storage);
        let storage_field = self.arena.alloc(
            NodeKind::ClassPrivateField {
                key: storage_key,
                value: storage_value,
                is_static,
                decorators: Vec::new(),
            },
            Span::dummy(),
        );
        self.new_body.push(storage_field);

        // Get/set pair. A decorated private accessor delegates to the
        // destructured thunks; everything else proxies the storage field.
        let delegated = decorated && private;
        let (getter, setter) = if delegated {
            let info = self.dec_infos.last().expect("accessor info just pushed");
            let get_local = info.locals[1].clone();
            let set_local = info.locals[2].clone();
            let g_callee = self.ident(&get_local);
            let g_this = self.this();
            let g_call = self.arena.call(g_callee, vec![g_this]);
            let g_ret = self.arena.ret(Some(g_call));
            let g_key = self.arena.clone_node(new_key);
            let getter = self.arena.alloc(
                NodeKind::ClassPrivateMethod {
                    key: g_key,
                    kind: MethodKind::Get,
                    params: vec![],
                    body: vec![g_ret],
                    is_static,
                    decorators: Vec::new(),
                },
                Span::dummy(),
            );
            let s_callee = self.ident(&set_local);
            let s_this = self.this();
            let s_v = self.ident("v");
            let s_call = self.arena.call(s_callee, vec![s_this, s_v]);
            let s_stmt = self.arena.expr_stmt(s_call);
            let s_key = self.arena.clone_node(new_key);
            let s_param = self.ident("v");
            let setter = self.arena.alloc(
                NodeKind::ClassPrivateMethod {
                    key: s_key,
                    kind: MethodKind::Set,
                    params: vec![s_param],
                    body: vec![s_stmt],
                    is_static,
                    decorators: Vec::new(),
                },
                Span::dummy(),
            );
            (getter, setter)
        } else {
            let g_recv = match &class_ref {
                Some(name) => self.ident(name),
                None => self.this(),
            };
            let g_read = self.arena.member_private(g_recv, &storage);
            let g_ret = self.arena.ret(Some(g_read));
            let g_key = self.arena.clone_node(new_key);
            let getter = self.make_accessor_proxy(g_key, MethodKind::Get, vec![], vec![g_ret], is_static, new_computed, private);
            let s_recv = match &class_ref {
                Some(name) => self.ident(name),
                None => self.this(),
            };
            let s_target = self.arena.member_private(s_recv, &storage);
            let s_v = self.ident("v");
            let s_assign = self.arena.assign(s_target, s_v);
            let s_stmt = self.arena.expr_stmt(s_assign);
            let s_key = self.arena.clone_node(new_key);
            let s_param = self.ident("v");
            let setter = self.make_accessor_proxy(
                s_key,
                MethodKind::Set,
                vec![s_param],
                vec![s_stmt],
                is_static,
                new_computed,
                private,
            );
            (getter, setter)
        };
        self.pinned_members.insert(storage_field);
        self.pinned_members.insert(getter);
        self.pinned_members.insert(setter);
        self.new_body.push(getter);
        self.new_body.push(setter);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn make_accessor_proxy(
        &mut self,
        key: NodeIndex,
        kind: MethodKind,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        is_static: bool,
        computed: bool,
        private: bool,
    ) -> NodeIndex {
        let node = if private {
            NodeKind::ClassPrivateMethod {
                key,
                kind,
                params,
                body,
                is_static,
                decorators: Vec::new(),
            }
        } else {
            NodeKind::ClassMethod {
                key,
                kind,
                params,
                body,
                is_static,
                computed,
                decorators: Vec::new(),
            }
        };
        self.arena.alloc(node, Span::dummy())
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_private_method(
        &mut self,
        m: NodeIndex,
        key: NodeIndex,
        kind: MethodKind,
        params: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        is_static: bool,
        decorators: &[NodeIndex],
    ) -> Result<(), Diagnostic> {
        let name = self
            .arena
            .private_name_of(key)
            .expect("private method key")
            .to_string();
        let (refs, receivers) = self.process_decorator_list(decorators, false);
        self.mark_element_init(is_static);
        self.track_instance_private(&name, is_static);

        // The runtime receives the original body as a plain function; any
        // `super` inside no longer has a home and is rewritten against the
        // class reference.
        let extracted = self.arena.function_expr(params, body);
        if self.super_class.is_some() {
            self.rewrite_super_in(extracted, is_static);
        }

        match kind {
            MethodKind::Get | MethodKind::Set => {
                let prefix = if kind == MethodKind::Get { "get" } else { "set" };
                let local = self.scope.generate_declared_uid(&format!("{prefix}_{name}"));
                let (params, body) = if kind == MethodKind::Get {
                    let callee = self.ident(&local);
                    let this = self.this();
                    let call = self.arena.call(callee, vec![this]);
                    let ret = self.arena.ret(Some(call));
                    (vec![], vec![ret])
                } else {
                    let callee = self.ident(&local);
                    let this = self.this();
                    let v_ref = self.ident("v");
                    let call = self.arena.call(callee, vec![this, v_ref]);
                    let stmt = self.arena.expr_stmt(call);
                    let v_param = self.ident("v");
                    (vec![v_param], vec![stmt])
                };
                self.arena.replace_kind(
                    m,
                    NodeKind::ClassPrivateMethod {
                        key,
                        kind,
                        params,
                        body,
                        is_static,
                        decorators: Vec::new(),
                    },
                );
                self.new_body.push(m);
                self.dec_infos.push(DecoratorInfo {
                    kind: if kind == MethodKind::Get {
                        ElementKind::Getter
                    } else {
                        ElementKind::Setter
                    },
                    is_static,
                    name: DecName::Str(format!("#{name}")),
                    decorators: refs,
                    decorators_this: receivers,
                    private_methods: vec![extracted],
                    locals: vec![local],
                });
            }
            _ => {
                // #m() {}  ->  #m = _call_m;  (the thunk the runtime built)
                let local = self.scope.generate_declared_uid(&format!("call_{name}"));
                let value = self.ident(&local);
                self.arena.replace_kind(
                    m,
                    NodeKind::ClassPrivateField {
                        key,
                        value: Some(value),
                        is_static,
                        decorators: Vec::new(),
                    },
                );
                self.new_body.push(m);
                self.decorated_private_methods.insert(name.clone());
                self.dec_infos.push(DecoratorInfo {
                    kind: ElementKind::Method,
                    is_static,
                    name: DecName::Str(format!("#{name}")),
                    decorators: refs,
                    decorators_this: receivers,
                    private_methods: vec![extracted],
                    locals: vec![local],
                });
            }
        }
        Ok(())
    }

    /// Rewrite `super.x` references inside an extracted method body against
    /// the class reference. With the `constantSuper` assumption the
    /// superclass expression is referenced directly; otherwise the
    /// prototype is discovered through `Object.getPrototypeOf`. Method
    /// calls keep their receiver: `super.m(x)` becomes `....m.call(this, x)`.
    fn rewrite_super_in(&mut self, root: NodeIndex, is_static: bool) {
        let mut refs = Vec::new();
        collect_super_refs(self.arena, root, &mut refs);
        for r in refs {
            let NodeKind::Member { object, .. } = self.arena.kind(r.member).clone() else {
                continue;
            };
            let new_object = if self.constant_super {
                let sup = self.super_class.expect("super rewrite requires a superclass");
                let sup_ref = self.arena.clone_node(sup);
                if is_static {
                    sup_ref
                } else {
                    self.arena.member(sup_ref, "prototype")
                }
            } else {
                let class_ref = self.ensure_class_ref();
                let cls = self.ident(&class_ref);
                let target = if is_static {
                    cls
                } else {
                    self.arena.member(cls, "prototype")
                };
                let object_global = self.ident("Object");
                let gpo = self.arena.member(object_global, "getPrototypeOf");
                self.arena.call(gpo, vec![target])
            };
            let kind = self.arena.kind(new_object).clone();
            self.arena.replace_kind(object, kind);

            if let Some(call) = r.call {
                let NodeKind::Call { args, .. } = self.arena.kind(call).clone() else {
                    continue;
                };
                let new_callee = self.arena.member(r.member, "call");
                let this = self.this();
                let mut new_args = vec![this];
                new_args.extend(args);
                self.arena.replace_kind(
                    call,
                    NodeKind::Call {
                        callee: new_callee,
                        args: new_args,
                    },
                );
            }
        }
    }

    // =========================================================================
    // Emission (P5)
    // =========================================================================

    fn bucket(info: &DecoratorInfo) -> u8 {
        match (info.is_static, info.kind == ElementKind::Field) {
            (true, false) => 0,
            (false, false) => 1,
            (true, true) => 2,
            (false, true) => 3,
        }
    }

    /// Build the decoration array and the ordered element-local names.
    fn build_element_decorations(&mut self) -> (NodeIndex, Vec<String>) {
        let mut infos = std::mem::take(&mut self.dec_infos);
        infos.sort_by_key(Self::bucket);

        let mut tuples = Vec::with_capacity(infos.len());
        let mut locals = Vec::new();
        for info in infos {
            let has_this =
                self.policy.track_this && info.decorators_this.iter().any(|r| r.is_some());
            let decs_node = if has_this {
                let mut pairs = Vec::with_capacity(info.decorators.len() * 2);
                for (dec, recv) in info.decorators.iter().zip(&info.decorators_this) {
                    pairs.push(match recv {
                        Some(r) => *r,
                        None => self.arena.void_0(),
                    });
                    pairs.push(*dec);
                }
                self.arena.array(pairs)
            } else if info.decorators.len() == 1 {
                info.decorators[0]
            } else {
                self.arena.array(info.decorators.clone())
            };
            let flag = self.version.encode_flag(info.kind, info.is_static, has_this);
            let flag_node = self.num(flag);
            let name_node = self.name_node(&info.name);
            let mut tuple = vec![decs_node, flag_node, name_node];
            tuple.extend(info.private_methods.iter().copied());
            tuples.push(self.arena.array(tuple));
            locals.extend(info.locals);
        }
        if let Some(p) = self.proto_init_local.clone() {
            locals.push(p);
        }
        if let Some(s) = self.static_init_local.clone() {
            locals.push(s);
        }
        (self.arena.array(tuples), locals)
    }

    fn build_class_decorations(&mut self) -> (NodeIndex, bool) {
        let entries = std::mem::take(&mut self.class_dec_entries);
        let has_this = self.policy.track_this && entries.iter().any(|(r, _)| r.is_some());
        let node = if has_this {
            let mut pairs = Vec::with_capacity(entries.len() * 2);
            for (recv, dec) in entries {
                pairs.push(match recv {
                    Some(r) => r,
                    None => self.arena.void_0(),
                });
                pairs.push(dec);
            }
            self.arena.array(pairs)
        } else {
            let decs: Vec<NodeIndex> = entries.into_iter().map(|(_, d)| d).collect();
            self.arena.array(decs)
        };
        (node, has_this)
    }

    fn mark_helper(&mut self) {
        match self.policy.helper {
            "_applyDecs" => self.helpers.apply_decs = true,
            "_applyDecs2203" => self.helpers.apply_decs_2203 = true,
            "_applyDecs2203R" => self.helpers.apply_decs_2203_r = true,
            "_applyDecs2301" => self.helpers.apply_decs_2301 = true,
            _ => self.helpers.apply_decs_2305 = true,
        }
    }

    /// The first argument of the helper call: `this`, or
    /// `setFunctionName(this, name)` when an inferred name must bind.
    fn this_arg(&mut self) -> NodeIndex {
        let this = self.this();
        if !self.policy.set_function_name || self.had_original_id {
            return this;
        }
        let name_node = match self.name_hint.clone() {
            Some(NameRef::Str(s)) => self.arena.string(&s),
            Some(NameRef::Node(idx)) => self.arena.clone_node(idx),
            None => return this,
        };
        self.helpers.set_function_name = true;
        let callee = self.ident("_setFunctionName");
        self.arena.call(callee, vec![this, name_node])
    }

    fn brand_check(&mut self) -> Option<NodeIndex> {
        if !self.policy.brand_check {
            return None;
        }
        let name = self.last_instance_private.clone()?;
        let param = self.ident("_");
        let pn = self.arena.private_name(&name);
        let arg = self.ident("_");
        let test = self.arena.binary("in", pn, arg);
        Some(self.arena.arrow(vec![param], test))
    }

    /// Memoized (or direct) superclass argument for "2023-05".
    fn super_arg(&mut self) -> Option<NodeIndex> {
        if !self.policy.emit_super {
            return None;
        }
        let sup = self.super_class?;
        if self.scope.is_static(self.arena, sup) {
            return Some(self.arena.clone_node(sup));
        }
        let local = self.memoise_in_place(sup, false);
        Some(self.ident(&local))
    }

    /// Assemble the `applyDecs*` call and the destructuring assignment,
    /// returning the statement that goes in the leading static block.
    fn build_apply_stmt(&mut self) -> NodeIndex {
        let (element_decs, element_locals) = self.build_element_decorations();
        let (class_decs, class_decs_have_this) = self.build_class_decorations();
        self.mark_helper();

        let this_arg = self.this_arg();
        let mut args = vec![this_arg, element_decs, class_decs];

        if self.policy.track_this {
            let brand = self.brand_check();
            let sup = self.super_arg();
            if self.has_class_decs || brand.is_some() || sup.is_some() {
                args.push(self.num(u32::from(class_decs_have_this)));
            }
            match (brand, sup) {
                (b, Some(s)) => {
                    args.push(b.unwrap_or_else(|| self.arena.void_0()));
                    args.push(s);
                }
                (Some(b), None) => args.push(b),
                (None, None) => {}
            }
        } else if self.policy.brand_check {
            if let Some(b) = self.brand_check() {
                args.push(b);
            }
        }

        let callee = self.ident(self.policy.helper);
        let call = self.arena.call(callee, args);

        let class_locals: Vec<String> = if self.has_class_decs {
            vec![
                self.class_id_local.clone().expect("class id local"),
                self.class_init_local.clone().expect("class init local"),
            ]
        } else {
            Vec::new()
        };

        let assign = if self.policy.record_shape {
            let elem_idents: Vec<NodeIndex> =
                element_locals.iter().map(|n| self.arena.ident(n)).collect();
            let class_idents: Vec<NodeIndex> =
                class_locals.iter().map(|n| self.arena.ident(n)).collect();
            match (elem_idents.is_empty(), class_idents.is_empty()) {
                (false, true) => {
                    let pattern = self.arena.array_pattern(elem_idents);
                    let source = self.arena.member(call, "e");
                    self.arena.assign(pattern, source)
                }
                (true, false) => {
                    let pattern = self.arena.array_pattern(class_idents);
                    let source = self.arena.member(call, "c");
                    self.arena.assign(pattern, source)
                }
                _ => {
                    let e_key = self.ident("e");
                    let e_pat = self.arena.array_pattern(elem_idents);
                    let e_prop = self.arena.object_prop(e_key, e_pat);
                    let c_key = self.ident("c");
                    let c_pat = self.arena.array_pattern(class_idents);
                    let c_prop = self.arena.object_prop(c_key, c_pat);
                    let pattern = self.arena.object_pattern(vec![e_prop, c_prop]);
                    self.arena.assign(pattern, call)
                }
            }
        } else {
            // Legacy flat shape: one array pattern over both local groups.
            let all: Vec<NodeIndex> = element_locals
                .iter()
                .chain(class_locals.iter())
                .map(|n| self.arena.ident(n))
                .collect();
            let pattern = self.arena.array_pattern(all);
            self.arena.assign(pattern, call)
        };
        self.arena.expr_stmt(assign)
    }

    fn decoration_static_block(&mut self) -> NodeIndex {
        let apply = self.build_apply_stmt();
        let mut stmts = vec![apply];
        if let Some(s) = self.static_init_local.clone() {
            let callee = self.ident(&s);
            let this = self.this();
            let call = self.arena.call(callee, vec![this]);
            stmts.push(self.arena.expr_stmt(call));
        }
        self.arena.static_block(stmts)
    }

    /// Thread the proto-init call into the first instance field initializer,
    /// the constructor, or a synthesized constructor.
    fn thread_proto_init(&mut self) {
        let Some(proto) = self.proto_init_local.clone() else {
            return;
        };

        // First non-static field (accessor storage included).
        let body = self.new_body.clone();
        for m in body {
            match self.arena.kind(m).clone() {
                NodeKind::ClassField {
                    key,
                    value,
                    is_static: false,
                    computed,
                    decorators,
                } => {
                    let value = Some(self.threaded_value(&proto, value));
                    self.arena.replace_kind(
                        m,
                        NodeKind::ClassField {
                            key,
                            value,
                            is_static: false,
                            computed,
                            decorators,
                        },
                    );
                    return;
                }
                NodeKind::ClassPrivateField {
                    key,
                    value,
                    is_static: false,
                    decorators,
                } => {
                    let value = Some(self.threaded_value(&proto, value));
                    self.arena.replace_kind(
                        m,
                        NodeKind::ClassPrivateField {
                            key,
                            value,
                            is_static: false,
                            decorators,
                        },
                    );
                    return;
                }
                _ => {}
            }
        }

        // No instance field: use the constructor.
        let ctor = self.new_body.iter().copied().find(|&m| {
            matches!(
                self.arena.kind(m),
                NodeKind::ClassMethod {
                    kind: MethodKind::Constructor,
                    ..
                }
            )
        });
        if let Some(ctor) = ctor {
            let NodeKind::ClassMethod {
                key,
                kind,
                params,
                mut body,
                is_static,
                computed,
                decorators,
            } = self.arena.kind(ctor).clone()
            else {
                unreachable!("constructor shape checked above");
            };
            if self.super_class.is_some() {
                // super(x)  ->  _initProto(super(x))
                let mut super_call = None;
                for &stmt in &body {
                    if let Some(found) = find_super_call(self.arena, stmt) {
                        super_call = Some(found);
                        break;
                    }
                }
                if let Some(call) = super_call {
                    let hoisted = self.arena.hoist(call);
                    let callee = self.ident(&proto);
                    self.arena
                        .replace_kind(call, NodeKind::Call { callee, args: vec![hoisted] });
                }
            } else {
                let callee = self.ident(&proto);
                let this = self.this();
                let call = self.arena.call(callee, vec![this]);
                let stmt = self.arena.expr_stmt(call);
                body.insert(0, stmt);
                self.arena.replace_kind(
                    ctor,
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
            return;
        }

        // No field, no constructor: synthesize one.
        let ctor_key = self.ident("constructor");
        let (params, body) = if self.super_class.is_some() {
            let args_param = self.ident("args");
            let rest = self
                .arena
                .alloc(NodeKind::RestElement { arg: args_param }, Span::dummy());
            let sup = self.arena.super_expr();
            let args_ref = self.ident("args");
            let spread = self.arena.alloc(NodeKind::Spread { arg: args_ref }, Span::dummy());
            let super_call = self.arena.call(sup, vec![spread]);
            let callee = self.ident(&proto);
            let wrapped = self.arena.call(callee, vec![super_call]);
            let stmt = self.arena.expr_stmt(wrapped);
            (vec![rest], vec![stmt])
        } else {
            let callee = self.ident(&proto);
            let this = self.this();
            let call = self.arena.call(callee, vec![this]);
            let stmt = self.arena.expr_stmt(call);
            (vec![], vec![stmt])
        };
        let ctor = self
            .arena
            .class_method(ctor_key, MethodKind::Constructor, params, body, false);
        self.new_body.push(ctor);
    }

    fn threaded_value(&mut self, proto: &str, value: Option<NodeIndex>) -> NodeIndex {
        match value {
            // `x = _init_x(this, v)` threads through the receiver:
            // `x = _init_x(_initProto(this), v)`.
            Some(v) if is_init_call(self.arena, v) => {
                let NodeKind::Call { args, .. } = self.arena.kind(v).clone() else {
                    unreachable!("is_init_call checked the shape");
                };
                let receiver = args[0];
                let inner_this = self.this();
                let callee = self.ident(proto);
                self.arena.replace_kind(
                    receiver,
                    NodeKind::Call {
                        callee,
                        args: vec![inner_this],
                    },
                );
                v
            }
            Some(v) => {
                let callee = self.ident(proto);
                let this = self.this();
                let call = self.arena.call(callee, vec![this]);
                self.arena.seq(vec![call, v])
            }
            None => {
                let callee = self.ident(proto);
                let this = self.this();
                let call = self.arena.call(callee, vec![this]);
                let undef = self.arena.void_0();
                self.arena.seq(vec![call, undef])
            }
        }
    }

    /// Write the final member list (and id/superclass) back into the class
    /// node. All decorators on the class and its members are gone by now.
    fn write_back_class(&mut self, as_expression: bool) {
        let id = self.id_name.clone().map(|n| self.arena.ident(&n));
        let body = std::mem::take(&mut self.new_body);
        self.arena.replace_kind(
            self.class,
            NodeKind::Class {
                id,
                super_class: self.super_class,
                decorators: Vec::new(),
                body,
                is_expression: as_expression || self.is_expression,
            },
        );
    }

    /// Accessor-only classes with memoized computed keys still splice their
    /// memo assignments in front.
    fn finish_without_decorations(&mut self) -> Lowered {
        let memos = std::mem::take(&mut self.element_memos);
        if self.is_expression {
            let inner = self.arena.hoist(self.class);
            let mut exprs = memos;
            exprs.push(inner);
            self.arena.replace_kind(self.class, NodeKind::Seq { exprs });
            Lowered::InPlace
        } else {
            let mut stmts: Vec<NodeIndex> =
                memos.into_iter().map(|m| self.arena.expr_stmt(m)).collect();
            stmts.push(self.class);
            Lowered::Statements {
                stmts,
                binding: self.id_name.clone(),
            }
        }
    }

    /// Element decorations without class decorators: the class keeps its
    /// position; a leading static block performs the decoration.
    fn emit_elements_only(&mut self) -> Lowered {
        let block = self.decoration_static_block();
        self.new_body.insert(0, block);
        self.write_back_class(false);

        let memos: Vec<NodeIndex> = std::mem::take(&mut self.element_memos);
        if self.is_expression {
            if memos.is_empty() {
                return Lowered::InPlace;
            }
            let inner = self.arena.hoist(self.class);
            let mut exprs = memos;
            exprs.push(inner);
            self.arena.replace_kind(self.class, NodeKind::Seq { exprs });
            Lowered::InPlace
        } else {
            if memos.is_empty() {
                return Lowered::InPlace;
            }
            let mut stmts: Vec<NodeIndex> =
                memos.into_iter().map(|m| self.arena.expr_stmt(m)).collect();
            stmts.push(self.class);
            Lowered::Statements {
                stmts,
                binding: self.id_name.clone(),
            }
        }
    }

    /// Class decorators replace the binding, so the class becomes an
    /// expression. Static members and blocks are hoisted into a wrapper
    /// `class extends identity` whose constructor runs the moved static
    /// blocks and then the class-init thunk.
    fn emit_with_class_decorators(&mut self) -> Lowered {
        let class_id_local = self.class_id_local.clone().expect("class id local");
        let class_init_local = self.class_init_local.clone().expect("class init local");

        // Hoist movable statics out of the body. Private members and the
        // accessor machinery stay: they close over class-scoped state.
        let mut moved_members = Vec::new();
        let mut moved_blocks = Vec::new();
        let mut remaining = Vec::new();
        for &m in &self.new_body {
            let movable = !self.pinned_members.contains(&m);
            match self.arena.kind(m) {
                NodeKind::StaticBlock { .. } => moved_blocks.push(m),
                NodeKind::ClassMethod { is_static: true, .. }
                | NodeKind::ClassField { is_static: true, .. }
                    if movable =>
                {
                    moved_members.push(m)
                }
                _ => remaining.push(m),
            }
        }
        self.new_body = remaining;

        let block = self.decoration_static_block();
        self.new_body.insert(0, block);

        let has_statics = !moved_members.is_empty() || !moved_blocks.is_empty();
        if !has_statics {
            // No wrapper needed: run the class-init thunk in a trailing
            // static block instead.
            let callee = self.ident(&class_init_local);
            let call = self.arena.call(callee, vec![]);
            let stmt = self.arena.expr_stmt(call);
            let trailing = self.arena.static_block(vec![stmt]);
            self.new_body.push(trailing);
        }

        self.write_back_class(true);
        let inner_class = self.arena.hoist(self.class);

        let core_expr = if has_statics {
            self.helpers.identity = true;
            let inner_stmt = self.arena.expr_stmt(inner_class);
            let eval_block = self.arena.static_block(vec![inner_stmt]);

            // constructor() { super(_B); <static block IIFEs>; _initClass(); }
            let sup = self.arena.super_expr();
            let id_ref = self.ident(&class_id_local);
            let super_call = self.arena.call(sup, vec![id_ref]);
            let mut ctor_body = vec![self.arena.expr_stmt(super_call)];
            for block in moved_blocks {
                let NodeKind::StaticBlock { body } = self.arena.kind(block).clone() else {
                    continue;
                };
                let block_body = self.arena.block(body);
                let iife_fn = self.arena.arrow(vec![], block_body);
                let iife = self.arena.call(iife_fn, vec![]);
                ctor_body.push(self.arena.expr_stmt(iife));
            }
            let init_callee = self.ident(&class_init_local);
            let init_call = self.arena.call(init_callee, vec![]);
            ctor_body.push(self.arena.expr_stmt(init_call));
            let ctor_key = self.ident("constructor");
            let ctor =
                self.arena
                    .class_method(ctor_key, MethodKind::Constructor, vec![], ctor_body, false);

            let mut wrapper_body = vec![eval_block];
            wrapper_body.extend(moved_members);
            wrapper_body.push(ctor);

            let identity_ref = self.ident("_identity");
            let wrapper = self.arena.alloc(
                NodeKind::Class {
                    id: None,
                    super_class: Some(identity_ref),
                    decorators: Vec::new(),
                    body: wrapper_body,
                    is_expression: true,
                },
                Span::dummy(),
            );
            let new_arg = self.ident(&class_id_local);
            self.arena.new_expr(wrapper, vec![new_arg])
        } else {
            // (class B { ... }, _B)
            let id_ref = self.ident(&class_id_local);
            self.arena.seq(vec![inner_class, id_ref])
        };

        let mut memos = std::mem::take(&mut self.class_dec_memos);
        memos.extend(std::mem::take(&mut self.element_memos));

        if self.is_expression {
            let mut exprs = memos;
            exprs.push(core_expr);
            let kind = if exprs.len() == 1 {
                self.arena.kind(core_expr).clone()
            } else {
                NodeKind::Seq { exprs }
            };
            self.arena.replace_kind(self.class, kind);
            Lowered::InPlace
        } else {
            let original_name = self.id_name.clone().unwrap_or_else(|| class_id_local.clone());
            let mut stmts = Vec::new();
            let hoist = self.arena.var_decl(VarKind::Let, &[original_name.as_str()]);
            stmts.push(hoist);
            for m in memos {
                stmts.push(self.arena.expr_stmt(m));
            }
            let target = self.ident(&original_name);
            let assign = self.arena.assign(target, core_expr);
            stmts.push(self.arena.expr_stmt(assign));
            Lowered::Statements {
                stmts,
                binding: Some(original_name),
            }
        }
    }
}

// =============================================================================
// Tree queries
// =============================================================================

fn member_decorators(arena: &NodeArena, m: NodeIndex) -> Vec<NodeIndex> {
    match arena.kind(m) {
        NodeKind::ClassMethod { decorators, .. }
        | NodeKind::ClassPrivateMethod { decorators, .. }
        | NodeKind::ClassField { decorators, .. }
        | NodeKind::ClassPrivateField { decorators, .. }
        | NodeKind::ClassAccessor { decorators, .. } => decorators.clone(),
        _ => Vec::new(),
    }
}

fn member_private_name(arena: &NodeArena, m: NodeIndex) -> Option<String> {
    let key = match arena.kind(m) {
        NodeKind::ClassPrivateMethod { key, .. } | NodeKind::ClassPrivateField { key, .. } => *key,
        NodeKind::ClassAccessor { key, .. } => *key,
        _ => return None,
    };
    arena.private_name_of(key).map(str::to_string)
}

fn is_identifier_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn hint_for(arena: &NodeArena, node: NodeIndex) -> String {
    match arena.kind(node) {
        NodeKind::Ident { name } => name.clone(),
        NodeKind::Member { property, .. } => hint_for(arena, *property),
        NodeKind::Call { callee, .. } => hint_for(arena, *callee),
        _ => "dec".to_string(),
    }
}

fn is_init_call(arena: &NodeArena, v: NodeIndex) -> bool {
    match arena.kind(v) {
        NodeKind::Call { callee, args } => {
            !args.is_empty()
                && matches!(arena.kind(args[0]), NodeKind::This)
                && matches!(arena.kind(*callee), NodeKind::Ident { .. })
        }
        _ => false,
    }
}

/// Find the first `super(...)` call under `idx`, without descending into
/// nested functions or classes.
fn find_super_call(arena: &NodeArena, idx: NodeIndex) -> Option<NodeIndex> {
    match arena.kind(idx) {
        NodeKind::Call { callee, .. } if arena.is_super(*callee) => return Some(idx),
        NodeKind::FunctionExpr { .. } | NodeKind::Class { .. } => return None,
        _ => {}
    }
    for child in arena.children(idx) {
        if let Some(found) = find_super_call(arena, child) {
            return Some(found);
        }
    }
    None
}

struct SuperRef {
    member: NodeIndex,
    /// Set when the member is the callee of a call, which must keep its
    /// `this` receiver.
    call: Option<NodeIndex>,
}

/// Collect `super.x` member expressions and `super.m(...)` calls, skipping
/// nested functions and classes which keep their own `super` binding rules.
fn collect_super_refs(arena: &NodeArena, idx: NodeIndex, out: &mut Vec<SuperRef>) {
    match arena.kind(idx) {
        NodeKind::Call { callee, args } => {
            if let NodeKind::Member { object, .. } = arena.kind(*callee) {
                if arena.is_super(*object) {
                    out.push(SuperRef {
                        member: *callee,
                        call: Some(idx),
                    });
                    for &a in args {
                        collect_super_refs(arena, a, out);
                    }
                    return;
                }
            }
        }
        NodeKind::Member { object, .. } if arena.is_super(*object) => {
            out.push(SuperRef {
                member: idx,
                call: None,
            });
            return;
        }
        NodeKind::FunctionExpr { .. } | NodeKind::Class { .. } => return,
        _ => {}
    }
    for child in arena.children(idx) {
        collect_super_refs(arena, child, out);
    }
}
