//! Class decorator lowering.
//!
//! This module rewrites class declarations and expressions carrying
//! proposed-decorator syntax into equivalent programs that use only
//! baseline class features plus a small fixed set of runtime helpers
//! (`applyDecs*`, `setFunctionName`, `toPropertyKey`, `identity`).
//!
//! # Architecture
//!
//! The pass mutates the AST in place, one class at a time, through six
//! sequenced phases:
//!
//! 1. **Entry & binding rewrite** - a decorated class declaration becomes an
//!    expression bound to a fresh local; the original name survives as the
//!    class's own id so `Class.name` and `toString` are unchanged.
//! 2. **Element survey** - classify each body member; run named evaluation
//!    on decorated property initializers.
//! 3. **Auto-accessor desugar** - every `accessor` field (decorated or not)
//!    becomes a private storage field plus a get/set pair.
//! 4. **Decorator extraction** - memoize unstable decorator expressions,
//!    build per-element decoration records, allocate initializer locals.
//! 5. **Emission** - assemble the `applyDecs*` call, its destructuring
//!    pattern, the class-init/proto-init call sites, and the static-member
//!    hoisting wrapper for class decorators.
//! 6. **Validation** - reject writes to decorated private methods.
//!
//! Four proposal revisions are supported ("2021-12", "2022-03", "2023-01",
//! "2023-05"); they diverge only in helper name, flag encoding, decorator
//! receiver tracking, and superclass pass-through.

pub mod decorators;
pub mod decorators_class;
pub mod decorators_validate;
pub mod helpers;
