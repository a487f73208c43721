//! Decorator lowering for JavaScript/TypeScript classes.
//!
//! This crate rewrites classes carrying proposed-decorator syntax into
//! equivalent programs that use only baseline class features plus a small
//! fixed set of runtime helpers. Four proposal revisions are supported:
//! "2021-12", "2022-03", "2023-01", and "2023-05".
//!
//! ```text
//! class A { @dec x = 1; }
//! ```
//! becomes (version "2023-05"):
//! ```text
//! let _init_x;
//! class A {
//!     static {
//!         [_init_x] = _applyDecs2305(this, [[dec, 0, "x"]], []).e;
//!     }
//!     x = _init_x(this, 1);
//! }
//! ```
//!
//! The crate provides:
//! - An arena-stored AST (`ast`) with factory constructors and deep clone
//! - Scope services (`scope`): fresh identifiers, rename, constancy
//! - The lowering pass itself (`transforms::decorators`)
//! - The runtime helper sources (`transforms::helpers`)
//! - A printer (`printer`) for inspecting rewritten trees

pub mod ast;
pub mod diagnostics;
pub mod printer;
pub mod scope;
pub mod span;
pub mod transforms;

pub use ast::{NodeArena, NodeIndex, NodeKind};
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use scope::Scope;
pub use span::Span;
pub use transforms::decorators::{DecoratorLowering, DecoratorOptions, DecoratorVersion};
pub use transforms::helpers::{emit_helpers, HelpersNeeded};
