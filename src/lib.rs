//! Lucon - logic-based usage-control policy decision engine
//!
//! Answers policy decision requests over data-flow routes: a declarative
//! policy (facts and rules over graph nodes) is loaded as a theory, a
//! candidate route is appended as facts, and an SLD-resolution query
//! enumerates every path the policy forbids. Each solution becomes a
//! reproducible counterexample; a route with none is valid.
//!
//! # Architecture
//!
//! - [`term`] - terms (atoms, integers, variables, structures) and the
//!   binding environment
//! - [`parser`] - the rule-language parser
//! - [`theory`] - immutable clause collections
//! - [`store`] - snapshot-on-read holder for the active policy
//! - [`solver`] - the resolution engine: unification, choice points, lazy
//!   solution enumeration
//! - [`verifier`] - route verification and counterexample extraction
//! - [`policy`] - label/rule value objects
//! - [`engine`] - the [`PolicyEngine`] facade
//!
//! # Example
//!
//! ```rust
//! use lucon::PolicyEngine;
//!
//! let engine = PolicyEngine::new();
//! engine
//!     .load_policy(
//!         "path(X, Y, [X, Y]) :- edge(X, Y), forbidden(X, Y). forbidden(a, b).",
//!     )
//!     .unwrap();
//!
//! let proof = engine
//!     .prove_invalid_route(Some("route1"), Some("entrynode(a). stmt(b). edge(a, b)."))
//!     .unwrap();
//! assert!(!proof.valid);
//! assert_eq!(proof.counter_examples[0].to_string(), "a -> b");
//! ```

pub mod engine;
pub mod error;
pub mod parser;
pub mod policy;
pub mod solver;
pub mod store;
pub mod term;
pub mod theory;
pub mod verifier;

// Re-export the main types
pub use crate::engine::PolicyEngine;
pub use crate::error::{ErrorCode, LuconError, LuconResult};
pub use crate::parser::{parse_program, parse_query, parse_term, ParseError};
pub use crate::policy::{LabelingRule, Rule};
pub use crate::solver::{Solution, SolveError, Solver, SolverConfig};
pub use crate::store::PolicyStore;
pub use crate::term::{Bindings, Term, Variable};
pub use crate::theory::{Clause, Theory};
pub use crate::verifier::{CounterExample, Proof, RouteVerifier, ROUTE_VERIFICATION_QUERY};
