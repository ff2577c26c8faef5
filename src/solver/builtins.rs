//! Evaluable predicates
//!
//! The small set of built-in goals the resolution engine evaluates directly
//! instead of scanning the clause list: unification, structural comparison,
//! and integer arithmetic. Negation as failure (`\+`) needs a sub-solve and
//! lives in the solver itself.
//!
//! Evaluation errors (unbound operand, non-numeric operand, division by
//! zero) are branch-local: the solver logs them and backtracks.

use crate::term::{Bindings, Term};

use super::unify::unify;

/// Error while evaluating a built-in goal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuiltinError {
    #[error("operand is not evaluable: {0}")]
    NotEvaluable(String),

    #[error("unbound variable in arithmetic expression")]
    UnboundOperand,

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in arithmetic expression")]
    Overflow,
}

/// Check whether a goal is handled by `eval`
pub fn is_builtin(name: &str, arity: usize) -> bool {
    matches!(
        (name, arity),
        ("true", 0)
            | ("fail", 0)
            | ("false", 0)
            | ("=", 2)
            | ("\\=", 2)
            | ("==", 2)
            | ("\\==", 2)
            | ("is", 2)
            | ("<", 2)
            | ("=<", 2)
            | (">", 2)
            | (">=", 2)
            | ("=:=", 2)
            | ("=\\=", 2)
    )
}

/// Evaluate a built-in goal against the current bindings
///
/// `Ok(true)` means the goal succeeded (possibly extending the bindings),
/// `Ok(false)` means it failed cleanly. The caller is responsible for
/// undoing bindings on backtrack via its choice-point marks.
pub fn eval(goal: &Term, bindings: &mut Bindings) -> Result<bool, BuiltinError> {
    match goal {
        Term::Atom(name) => match name.as_str() {
            "true" => Ok(true),
            "fail" | "false" => Ok(false),
            other => Err(BuiltinError::NotEvaluable(other.to_string())),
        },
        Term::Struct(name, args) if args.len() == 2 => {
            let (a, b) = (&args[0], &args[1]);
            match name.as_str() {
                "=" => Ok(unify(a, b, bindings)),
                "\\=" => {
                    let mark = bindings.mark();
                    let unified = unify(a, b, bindings);
                    bindings.undo_to(mark);
                    Ok(!unified)
                }
                "==" => Ok(bindings.resolve(a) == bindings.resolve(b)),
                "\\==" => Ok(bindings.resolve(a) != bindings.resolve(b)),
                "is" => {
                    let value = eval_arith(b, bindings)?;
                    Ok(unify(a, &Term::Int(value), bindings))
                }
                "<" => compare(a, b, bindings, |x, y| x < y),
                "=<" => compare(a, b, bindings, |x, y| x <= y),
                ">" => compare(a, b, bindings, |x, y| x > y),
                ">=" => compare(a, b, bindings, |x, y| x >= y),
                "=:=" => compare(a, b, bindings, |x, y| x == y),
                "=\\=" => compare(a, b, bindings, |x, y| x != y),
                other => Err(BuiltinError::NotEvaluable(other.to_string())),
            }
        }
        other => Err(BuiltinError::NotEvaluable(other.to_string())),
    }
}

fn compare(
    a: &Term,
    b: &Term,
    bindings: &Bindings,
    op: fn(i64, i64) -> bool,
) -> Result<bool, BuiltinError> {
    let x = eval_arith(a, bindings)?;
    let y = eval_arith(b, bindings)?;
    Ok(op(x, y))
}

/// Evaluate an arithmetic expression to an integer
pub fn eval_arith(term: &Term, bindings: &Bindings) -> Result<i64, BuiltinError> {
    match bindings.walk(term).clone() {
        Term::Int(n) => Ok(n),
        Term::Var(_) => Err(BuiltinError::UnboundOperand),
        Term::Atom(name) => Err(BuiltinError::NotEvaluable(name)),
        Term::Struct(op, args) => match (op.as_str(), args.len()) {
            ("-", 1) => {
                let x = eval_arith(&args[0], bindings)?;
                x.checked_neg().ok_or(BuiltinError::Overflow)
            }
            ("+", 2) => checked(&args, bindings, i64::checked_add),
            ("-", 2) => checked(&args, bindings, i64::checked_sub),
            ("*", 2) => checked(&args, bindings, i64::checked_mul),
            ("//", 2) => {
                let x = eval_arith(&args[0], bindings)?;
                let y = eval_arith(&args[1], bindings)?;
                if y == 0 {
                    return Err(BuiltinError::DivisionByZero);
                }
                x.checked_div(y).ok_or(BuiltinError::Overflow)
            }
            ("mod", 2) => {
                let x = eval_arith(&args[0], bindings)?;
                let y = eval_arith(&args[1], bindings)?;
                if y == 0 {
                    return Err(BuiltinError::DivisionByZero);
                }
                Ok(x.rem_euclid(y))
            }
            (other, arity) => Err(BuiltinError::NotEvaluable(format!("{}/{}", other, arity))),
        },
    }
}

fn checked(
    args: &[Term],
    bindings: &Bindings,
    op: fn(i64, i64) -> Option<i64>,
) -> Result<i64, BuiltinError> {
    let x = eval_arith(&args[0], bindings)?;
    let y = eval_arith(&args[1], bindings)?;
    op(x, y).ok_or(BuiltinError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_term;

    fn eval_text(src: &str) -> Result<bool, BuiltinError> {
        let goal = parse_term(src).unwrap();
        let mut bindings = Bindings::new();
        eval(&goal, &mut bindings)
    }

    #[test]
    fn test_true_and_fail() {
        assert_eq!(eval_text("true"), Ok(true));
        assert_eq!(eval_text("fail"), Ok(false));
        assert_eq!(eval_text("false"), Ok(false));
    }

    #[test]
    fn test_unify_builtin() {
        assert_eq!(eval_text("a = a"), Ok(true));
        assert_eq!(eval_text("a = b"), Ok(false));
        assert_eq!(eval_text("a \\= b"), Ok(true));
        assert_eq!(eval_text("a \\= a"), Ok(false));
    }

    #[test]
    fn test_not_unifiable_leaves_no_bindings() {
        let goal = parse_term("f(X) \\= f(a)").unwrap();
        let mut bindings = Bindings::new();
        // f(X) does unify with f(a), so \= fails, and the probe binding
        // must not survive
        assert_eq!(eval(&goal, &mut bindings), Ok(false));
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_structural_comparison() {
        assert_eq!(eval_text("f(a) == f(a)"), Ok(true));
        assert_eq!(eval_text("f(a) == f(b)"), Ok(false));
        assert_eq!(eval_text("f(a) \\== f(b)"), Ok(true));
    }

    #[test]
    fn test_is_evaluates() {
        let goal = parse_term("X is 2+3*4").unwrap();
        let mut bindings = Bindings::new();
        assert_eq!(eval(&goal, &mut bindings), Ok(true));
        let x = parse_term("X").unwrap();
        assert_eq!(bindings.resolve(&x), Term::int(14));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_text("1 < 2"), Ok(true));
        assert_eq!(eval_text("2 =< 1"), Ok(false));
        assert_eq!(eval_text("3 >= 3"), Ok(true));
        assert_eq!(eval_text("4 =:= 2+2"), Ok(true));
        assert_eq!(eval_text("4 =\\= 5"), Ok(true));
    }

    #[test]
    fn test_arith_errors() {
        assert_eq!(eval_text("X is foo"), Err(BuiltinError::NotEvaluable("foo".into())));
        assert_eq!(eval_text("X is Y+1"), Err(BuiltinError::UnboundOperand));
        assert_eq!(eval_text("X is 1//0"), Err(BuiltinError::DivisionByZero));
        assert_eq!(eval_text("1 < foo"), Err(BuiltinError::NotEvaluable("foo".into())));
    }

    #[test]
    fn test_mod_is_euclidean() {
        let goal = parse_term("X is -7 mod 3").unwrap();
        let mut bindings = Bindings::new();
        assert_eq!(eval(&goal, &mut bindings), Ok(true));
        assert_eq!(bindings.resolve(&parse_term("X").unwrap()), Term::int(2));
    }
}
