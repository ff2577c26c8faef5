//! Built-in library clauses
//!
//! A small set of list predicates every solver instance carries, prepended
//! to the theory's clause list. They never appear in theory serialization;
//! the library belongs to the engine, not to the policy.

use std::sync::OnceLock;

use crate::parser;
use crate::theory::Clause;

const LIBRARY_SRC: &str = r#"
member(X, [X|_]).
member(X, [_|T]) :- member(X, T).

append([], L, L).
append([H|T], L, [H|R]) :- append(T, L, R).

last([X], X).
last([_|T], X) :- last(T, X).
"#;

/// The library clauses, parsed once per process
pub fn library_clauses() -> &'static [Clause] {
    static CLAUSES: OnceLock<Vec<Clause>> = OnceLock::new();
    CLAUSES.get_or_init(|| {
        parser::parse_program(LIBRARY_SRC).expect("built-in library clauses parse")
    })
}
