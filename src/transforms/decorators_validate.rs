//! Write validation for decorated private methods.
//!
//! After a class has been rewritten, a decorated private method survives as
//! a private field holding the call thunk. The field must stay read-only:
//! any assignment, update, or destructuring write to `#m` is a fatal
//! diagnostic. Reads (calls, brand checks) are permitted.

use rustc_hash::FxHashSet;

use crate::ast::{NodeArena, NodeIndex, NodeKind};
use crate::diagnostics::{codes, Diagnostic};

/// Scan the finished subtree for writes to any of `method_names`
/// (names without the `#` sigil).
pub fn check_private_method_writes(
    arena: &NodeArena,
    root: NodeIndex,
    method_names: &FxHashSet<String>,
) -> Result<(), Diagnostic> {
    if method_names.is_empty() {
        return Ok(());
    }
    scan(arena, root, method_names)
}

fn scan(
    arena: &NodeArena,
    idx: NodeIndex,
    method_names: &FxHashSet<String>,
) -> Result<(), Diagnostic> {
    match arena.kind(idx) {
        NodeKind::Assign { target, value, .. } => {
            check_target(arena, *target, method_names)?;
            scan(arena, *value, method_names)?;
            return Ok(());
        }
        NodeKind::Update { arg, .. } => {
            check_target(arena, *arg, method_names)?;
            return Ok(());
        }
        NodeKind::ForOf { left, right, body } => {
            check_target(arena, *left, method_names)?;
            scan(arena, *right, method_names)?;
            scan(arena, *body, method_names)?;
            return Ok(());
        }
        _ => {}
    }
    for child in arena.children(idx) {
        scan(arena, child, method_names)?;
    }
    Ok(())
}

/// Walk a write-target position: a direct member write, or any pattern
/// that binds into one (array pattern element, rest element, object
/// pattern property value, default pattern left side).
fn check_target(
    arena: &NodeArena,
    target: NodeIndex,
    method_names: &FxHashSet<String>,
) -> Result<(), Diagnostic> {
    match arena.kind(target) {
        NodeKind::Member { property, .. } => {
            if let NodeKind::PrivateName { name } = arena.kind(*property) {
                if method_names.contains(name) {
                    return Err(write_error(arena, target, name));
                }
            }
            Ok(())
        }
        NodeKind::ArrayPattern { elements } => {
            for element in elements.iter().flatten() {
                check_target(arena, *element, method_names)?;
            }
            Ok(())
        }
        NodeKind::ObjectPattern { props } => {
            for &prop in props {
                check_target(arena, prop, method_names)?;
            }
            Ok(())
        }
        NodeKind::ObjectProp { value, .. } => check_target(arena, *value, method_names),
        NodeKind::RestElement { arg } => check_target(arena, *arg, method_names),
        NodeKind::AssignPattern { left, right } => {
            check_target(arena, *left, method_names)?;
            scan(arena, *right, method_names)
        }
        NodeKind::VarDecl { declarators, .. } => {
            for &d in declarators {
                check_target(arena, d, method_names)?;
            }
            Ok(())
        }
        NodeKind::VarDeclarator { name, .. } => check_target(arena, *name, method_names),
        _ => Ok(()),
    }
}

fn write_error(arena: &NodeArena, at: NodeIndex, name: &str) -> Diagnostic {
    Diagnostic::error(
        arena.span(at),
        format!("Decorated private methods are read-only, but `#{name}` is updated via this expression."),
        codes::DECORATED_PRIVATE_METHOD_WRITE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn names(list: &[&str]) -> FxHashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn private_member(arena: &mut NodeArena, name: &str) -> NodeIndex {
        let this = arena.this_expr();
        arena.member_private(this, name)
    }

    #[test]
    fn test_assignment_to_method_is_fatal() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "m");
        let value = arena.number("0");
        let assign = arena.assign(member, value);
        let stmt = arena.expr_stmt(assign);
        let err = check_private_method_writes(&arena, stmt, &names(&["m"]))
            .expect_err("write should be rejected");
        assert_eq!(err.code, codes::DECORATED_PRIVATE_METHOD_WRITE);
        assert!(err.message_text.contains("#m"));
    }

    #[test]
    fn test_update_is_fatal() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "m");
        let update = arena.alloc(
            NodeKind::Update {
                op: "++".to_string(),
                prefix: true,
                arg: member,
            },
            Span::dummy(),
        );
        let stmt = arena.expr_stmt(update);
        assert!(check_private_method_writes(&arena, stmt, &names(&["m"])).is_err());
    }

    #[test]
    fn test_for_of_binding_is_fatal() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "m");
        let iterable = arena.ident("xs");
        let body = arena.block(vec![]);
        let for_of = arena.alloc(
            NodeKind::ForOf {
                left: member,
                right: iterable,
                body,
            },
            Span::dummy(),
        );
        assert!(check_private_method_writes(&arena, for_of, &names(&["m"])).is_err());
    }

    #[test]
    fn test_rest_pattern_element_is_fatal() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "m");
        let rest = arena.alloc(NodeKind::RestElement { arg: member }, Span::dummy());
        let pattern = arena.alloc(
            NodeKind::ArrayPattern {
                elements: vec![Some(rest)],
            },
            Span::dummy(),
        );
        let value = arena.ident("xs");
        let assign = arena.assign(pattern, value);
        let stmt = arena.expr_stmt(assign);
        assert!(check_private_method_writes(&arena, stmt, &names(&["m"])).is_err());
    }

    #[test]
    fn test_reads_are_permitted() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "m");
        let call = arena.call(member, vec![]);
        let stmt = arena.expr_stmt(call);
        assert!(check_private_method_writes(&arena, stmt, &names(&["m"])).is_ok());
    }

    #[test]
    fn test_other_private_names_are_permitted() {
        let mut arena = NodeArena::new();
        let member = private_member(&mut arena, "other");
        let value = arena.number("1");
        let assign = arena.assign(member, value);
        let stmt = arena.expr_stmt(assign);
        assert!(check_private_method_writes(&arena, stmt, &names(&["m"])).is_ok());
    }
}
