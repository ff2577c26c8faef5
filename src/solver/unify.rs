//! Unification over the binding environment
//!
//! Worklist formulation with occurs check. All bindings made by a failed
//! unification are rolled back before returning, so failure leaves the
//! environment exactly as it was.

use crate::term::{Bindings, Term, Variable};

/// Unify two terms, extending the environment on success
///
/// On failure the environment is restored to its state at entry.
pub fn unify(a: &Term, b: &Term, bindings: &mut Bindings) -> bool {
    let mark = bindings.mark();
    let mut stack = vec![(a.clone(), b.clone())];

    while let Some((x, y)) = stack.pop() {
        let x = bindings.walk(&x).clone();
        let y = bindings.walk(&y).clone();

        match (x, y) {
            (Term::Var(v1), Term::Var(v2)) if v1.id == v2.id => {}
            (Term::Var(v), t) | (t, Term::Var(v)) => {
                if occurs(&v, &t, bindings) {
                    bindings.undo_to(mark);
                    return false;
                }
                bindings.bind(&v, t);
            }
            (Term::Atom(a1), Term::Atom(a2)) => {
                if a1 != a2 {
                    bindings.undo_to(mark);
                    return false;
                }
            }
            (Term::Int(n1), Term::Int(n2)) => {
                if n1 != n2 {
                    bindings.undo_to(mark);
                    return false;
                }
            }
            (Term::Struct(f1, args1), Term::Struct(f2, args2)) => {
                if f1 != f2 || args1.len() != args2.len() {
                    bindings.undo_to(mark);
                    return false;
                }
                for pair in args1.into_iter().zip(args2) {
                    stack.push(pair);
                }
            }
            _ => {
                bindings.undo_to(mark);
                return false;
            }
        }
    }
    true
}

/// Occurs check: does the variable occur in the term, under the current
/// bindings?
fn occurs(var: &Variable, term: &Term, bindings: &Bindings) -> bool {
    match bindings.walk(term) {
        Term::Var(v) => v.id == var.id,
        Term::Struct(_, args) => args.iter().any(|a| occurs(var, a, bindings)),
        Term::Atom(_) | Term::Int(_) => false,
    }
}
