//! Route verification
//!
//! Composes the active policy theory with route-derived facts (entry node,
//! statement nodes, edges) and runs the fixed path query in find-all mode.
//! Every solution is a path the policy's own rules classify as reachable
//! and non-compliant, so finding nothing means the route is valid: the
//! query locates violations, not valid paths.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::parser::ParseError;
use crate::solver::{Solver, SolverConfig};
use crate::term::Term;
use crate::theory::Theory;

/// The fixed verification query: an entry node X, a statement node Y, and a
/// path T from X to Y that the policy rules flag
pub const ROUTE_VERIFICATION_QUERY: &str = "entrynode(X), stmt(Y), path(X, Y, T).";

/// The query variable holding the path witness
const PATH_VAR: &str = "T";

/// A concrete violating path extracted from one solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterExample {
    /// The nodes of the violating path, in traversal order
    pub steps: Vec<String>,
}

impl CounterExample {
    /// Flatten a bound path term into steps
    ///
    /// List terms become one step per element; anything else becomes a
    /// single step.
    pub fn from_path_term(term: &Term) -> Self {
        let steps = match term.as_list() {
            Some((elements, tail)) => {
                let mut steps: Vec<String> =
                    elements.iter().map(|t| t.to_string()).collect();
                if let Some(tail) = tail {
                    steps.push(tail.to_string());
                }
                steps
            }
            None => vec![term.to_string()],
        };
        CounterExample { steps }
    }
}

impl std::fmt::Display for CounterExample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.steps.join(" -> "))
    }
}

/// The verdict for one route verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proof {
    /// Route identifier (empty if none was supplied)
    pub id: String,
    /// The query used to generate the proof
    pub query: String,
    /// True iff no counterexample was found
    pub valid: bool,
    /// Violating paths, in solution order
    pub counter_examples: Vec<CounterExample>,
}

impl Proof {
    fn trivially_valid(id: Option<&str>) -> Self {
        Proof {
            id: id.unwrap_or_default().to_string(),
            query: ROUTE_VERIFICATION_QUERY.to_string(),
            valid: true,
            counter_examples: Vec::new(),
        }
    }

    /// JSON form for inspection/transport
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"id":"{}","valid":{}}}"#, self.id, self.valid))
    }
}

/// Verifies routes against one policy snapshot
///
/// Holds an immutable snapshot of the policy theory; every verification
/// builds its own derived theory and solver, so the policy is never
/// mutated and calls can run concurrently.
#[derive(Debug)]
pub struct RouteVerifier {
    policy: Arc<Theory>,
    config: SolverConfig,
}

impl RouteVerifier {
    pub fn new(policy: Arc<Theory>, config: SolverConfig) -> Self {
        RouteVerifier { policy, config }
    }

    /// Prove a route invalid, or establish its validity
    ///
    /// Returns a `Proof` whose counterexamples are all the policy-violating
    /// paths through the route. With no route text there is nothing to
    /// violate, so the proof is trivially valid.
    ///
    /// Malformed route text is a `ParseError`, raised before any proof
    /// attempt. Failures during solving (step limit, deadline) are logged
    /// and degrade to a proof with no counterexamples: fail-open, by
    /// contract.
    pub fn prove_invalid_route(
        &self,
        id: Option<&str>,
        route: Option<&str>,
    ) -> Result<Proof, ParseError> {
        let mut proof = Proof::trivially_valid(id);
        let route = match route {
            Some(route) => route,
            None => return Ok(proof),
        };

        let route_theory = Theory::parse(route)?;
        let derived = self.policy.appended(&route_theory);
        debug!(
            id = proof.id,
            policy_clauses = self.policy.len(),
            route_clauses = route_theory.len(),
            "verifying route"
        );

        let mut solver = match Solver::for_query(&derived, ROUTE_VERIFICATION_QUERY, self.config.clone()) {
            Ok(solver) => solver,
            Err(err) => {
                error!(%err, "route verification query could not start");
                return Ok(proof);
            }
        };
        match solver.solve_all() {
            Ok(solutions) => {
                for solution in &solutions {
                    if let Some(path) = solution.var_value(PATH_VAR) {
                        proof
                            .counter_examples
                            .push(CounterExample::from_path_term(path));
                    }
                }
                proof.valid = proof.counter_examples.is_empty();
            }
            Err(err) => {
                // Fail-open: no proof produced, not a crash
                error!(%err, id = proof.id, "route verification solving failed");
            }
        }
        Ok(proof)
    }
}
