//! Runtime helpers for the decorator lowering.
//!
//! These are the helper functions the rewritten program calls at runtime.
//! The pass itself never evaluates a decorator; it only arranges the
//! program so that one of these helpers will. Each proposal revision has its
//! own `applyDecs` variant; the tuple and flag encoding expected by a
//! variant is fixed and matches what the emission phase produces.

/// Helper code for identity (class-decorator static hoisting wrapper base)
pub const IDENTITY_HELPER: &str = r#"var _identity = function (x) {
    return x;
};"#;

/// Helper code for toPropertyKey (computed key memoization)
pub const TO_PROPERTY_KEY_HELPER: &str = r#"var _toPropertyKey = function (t) {
    if (typeof t === "symbol") return t;
    var i = t && typeof t === "object" && typeof t[Symbol.toPrimitive] === "function"
        ? t[Symbol.toPrimitive]("string")
        : t;
    return typeof i === "symbol" ? i : String(i);
};"#;

/// Helper code for setFunctionName (named evaluation of anonymous classes)
pub const SET_FUNCTION_NAME_HELPER: &str = r#"var _setFunctionName = function (e, t, n) {
    typeof t === "symbol" && (t = t.description ? "[" + t.description + "]" : "");
    try {
        Object.defineProperty(e, "name", { configurable: true, value: n ? n + " " + t : t });
    } catch (e) {}
    return e;
};"#;

/// Helper code for applyDecs ("2021-12" revision; flat array return shape,
/// static elements encoded by adding 5 to the kind)
pub const APPLY_DECS_HELPER: &str = r#"var _applyDecs = function (targetClass, memberDecs, classDecs) {
    var ret = [];
    var protoInitializers = [];
    var staticInitializers = [];
    function applyMemberDec(base, decInfo) {
        var decs = decInfo[0], flag = decInfo[1], name = decInfo[2];
        var isStatic = flag >= 5;
        var kind = isStatic ? flag - 5 : flag;
        var inits = isStatic ? staticInitializers : protoInitializers;
        var value = kind === 0 ? void 0
            : kind === 2 && decInfo.length > 3 ? decInfo[3]
            : Object.getOwnPropertyDescriptor(base, name);
        if (!Array.isArray(decs)) decs = [decs];
        var init;
        for (var i = decs.length - 1; i >= 0; i--) {
            var ctx = { kind: ["field", "accessor", "method", "getter", "setter"][kind],
                name: name, static: isStatic, private: typeof name === "string" && name.charCodeAt(0) === 35,
                addInitializer: function (fn) { inits.push(fn); } };
            var result = decs[i].call(void 0, value, ctx);
            if (result !== void 0) {
                if (kind === 0) init = result;
                else value = result;
            }
        }
        if (kind === 0) ret.push(init ? function (instance, v) { return init.call(instance, v); } : function (instance, v) { return v; });
        else if (kind === 2 && decInfo.length > 3) ret.push(value);
    }
    for (var i = 0; i < memberDecs.length; i++) applyMemberDec(targetClass, memberDecs[i]);
    ret.push(function (instance) {
        for (var i = 0; i < protoInitializers.length; i++) protoInitializers[i].call(instance);
        return instance;
    });
    ret.push(function (cls) {
        for (var i = 0; i < staticInitializers.length; i++) staticInitializers[i].call(cls);
        return cls;
    });
    if (classDecs.length > 0) {
        var newClass = targetClass;
        var classInits = [];
        for (var i = classDecs.length - 1; i >= 0; i--) {
            var result = classDecs[i].call(void 0, newClass, { kind: "class", name: newClass.name,
                addInitializer: function (fn) { classInits.push(fn); } });
            if (result !== void 0) newClass = result;
        }
        ret.push(newClass, function () {
            for (var i = 0; i < classInits.length; i++) classInits[i].call(newClass);
        });
    }
    return ret;
};"#;

/// Helper code for applyDecs2203 ("2022-03" revision; flat array shape)
pub const APPLY_DECS_2203_HELPER: &str = r#"var _applyDecs2203 = function (targetClass, memberDecs, classDecs) {
    return _applyDecs(targetClass, memberDecs, classDecs);
};"#;

/// Helper code for applyDecs2203R ("2022-03" revision with the record
/// return shape { e, c })
pub const APPLY_DECS_2203_R_HELPER: &str = r#"var _applyDecs2203R = function (targetClass, memberDecs, classDecs) {
    var flat = _applyDecs(targetClass, memberDecs, classDecs);
    var split = classDecs.length > 0 ? flat.length - 2 : flat.length;
    return { e: flat.slice(0, split), c: flat.slice(split) };
};"#;

/// Helper code for applyDecs2301 ("2023-01" revision; record shape plus an
/// instance brand check used for decorated private elements)
pub const APPLY_DECS_2301_HELPER: &str = r#"var _applyDecs2301 = function (targetClass, memberDecs, classDecs, instanceBrandCheck) {
    var hasPrivateBrand = instanceBrandCheck || function (instance) { return instance instanceof targetClass; };
    var flat = _applyDecs(targetClass, memberDecs, classDecs, hasPrivateBrand);
    var split = classDecs.length > 0 ? flat.length - 2 : flat.length;
    return { e: flat.slice(0, split), c: flat.slice(split) };
};"#;

/// Helper code for applyDecs2305 ("2023-05" revision; bit-encoded flags,
/// optional per-decorator receivers, superclass pass-through)
pub const APPLY_DECS_2305_HELPER: &str = r#"var _applyDecs2305 = function (targetClass, memberDecs, classDecs, classDecsHaveThis, instanceBrandCheck, parentClass) {
    var e = [];
    var protoInitializers = [];
    var staticInitializers = [];
    var hasPrivateBrand = instanceBrandCheck || function (instance) { return instance instanceof targetClass; };
    function applyDec(decs, flag, name, extras) {
        var kind = flag & 7;
        var isStatic = !!(flag & 8);
        var hasThis = !!(flag & 16);
        var base = isStatic ? targetClass : targetClass.prototype;
        var inits = isStatic ? staticInitializers : protoInitializers;
        var list = hasThis || Array.isArray(decs) ? decs : [void 0, decs];
        if (!hasThis && Array.isArray(decs)) {
            list = [];
            for (var i = 0; i < decs.length; i++) list.push(void 0, decs[i]);
        }
        var value = kind === 0 ? void 0
            : extras.length ? extras
            : Object.getOwnPropertyDescriptor(base, name);
        var init;
        for (var i = list.length - 2; i >= 0; i -= 2) {
            var receiver = list[i], dec = list[i + 1];
            var ctx = { kind: ["field", "accessor", "method", "getter", "setter"][kind],
                name: name, static: isStatic, private: typeof name === "string" && name.charCodeAt(0) === 35,
                access: { has: hasPrivateBrand },
                addInitializer: function (fn) { inits.push(fn); } };
            var result = dec.call(receiver, value, ctx);
            if (result !== void 0) {
                if (kind === 0) init = result;
                else value = result;
            }
        }
        if (kind === 0 || kind === 1) {
            e.push(init ? function (instance, v) { return init.call(instance, v); } : function (instance, v) { return v; });
            if (kind === 1 && extras.length) e.push(value[0], value[1]);
        } else if (kind >= 2 && extras.length) e.push(value);
    }
    for (var i = 0; i < memberDecs.length; i++) {
        var info = memberDecs[i];
        applyDec(info[0], info[1], info[2], info.slice(3));
    }
    if (protoInitializers.length || memberDecs.length) {
        e.push(function (instance) {
            for (var i = 0; i < protoInitializers.length; i++) protoInitializers[i].call(instance);
            return instance;
        });
    }
    if (staticInitializers.length) {
        e.push(function (cls) {
            for (var i = 0; i < staticInitializers.length; i++) staticInitializers[i].call(cls);
            return cls;
        });
    }
    var c = [];
    if (classDecs.length > 0) {
        var newClass = targetClass;
        var classInits = [];
        var list = classDecs;
        if (!classDecsHaveThis) {
            list = [];
            for (var i = 0; i < classDecs.length; i++) list.push(void 0, classDecs[i]);
        }
        for (var i = list.length - 2; i >= 0; i -= 2) {
            var result = list[i + 1].call(list[i], newClass, { kind: "class", name: newClass.name,
                addInitializer: function (fn) { classInits.push(fn); } });
            if (result !== void 0) newClass = result;
        }
        c = [newClass, function () {
            for (var i = 0; i < classInits.length; i++) classInits[i].call(newClass);
        }];
    }
    return { e: e, c: c };
};"#;

/// Tracks which helper functions the pass referenced while rewriting.
#[derive(Default, Clone, Debug)]
pub struct HelpersNeeded {
    pub apply_decs: bool,
    pub apply_decs_2203: bool,
    pub apply_decs_2203_r: bool,
    pub apply_decs_2301: bool,
    pub apply_decs_2305: bool,
    pub set_function_name: bool,
    pub to_property_key: bool,
    pub identity: bool,
}

impl HelpersNeeded {
    pub fn any(&self) -> bool {
        self.apply_decs
            || self.apply_decs_2203
            || self.apply_decs_2203_r
            || self.apply_decs_2301
            || self.apply_decs_2305
            || self.set_function_name
            || self.to_property_key
            || self.identity
    }
}

/// Generate helper code for the needed helpers.
pub fn emit_helpers(helpers: &HelpersNeeded) -> String {
    let mut output = String::new();

    // Order matters - some helpers depend on others
    if helpers.identity {
        output.push_str(IDENTITY_HELPER);
        output.push('\n');
    }
    if helpers.to_property_key {
        output.push_str(TO_PROPERTY_KEY_HELPER);
        output.push('\n');
    }
    if helpers.set_function_name {
        output.push_str(SET_FUNCTION_NAME_HELPER);
        output.push('\n');
    }
    if helpers.apply_decs || helpers.apply_decs_2203 || helpers.apply_decs_2203_r || helpers.apply_decs_2301 {
        output.push_str(APPLY_DECS_HELPER);
        output.push('\n');
    }
    if helpers.apply_decs_2203 {
        output.push_str(APPLY_DECS_2203_HELPER);
        output.push('\n');
    }
    if helpers.apply_decs_2203_r {
        output.push_str(APPLY_DECS_2203_R_HELPER);
        output.push('\n');
    }
    if helpers.apply_decs_2301 {
        output.push_str(APPLY_DECS_2301_HELPER);
        output.push('\n');
    }
    if helpers.apply_decs_2305 {
        output.push_str(APPLY_DECS_2305_HELPER);
        output.push('\n');
    }

    output
}
