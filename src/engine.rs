//! Policy decision engine facade
//!
//! Ties the pieces together: the policy store, the resolution engine, and
//! the route verifier. One `PolicyEngine` serves a process; every query or
//! verification takes its own theory snapshot and solver, so calls can run
//! concurrently and a policy reload never corrupts in-flight work.

use tracing::{debug, trace};

use crate::error::LuconResult;
use crate::solver::{Solution, Solver, SolverConfig};
use crate::store::PolicyStore;
use crate::theory::Theory;
use crate::verifier::{Proof, RouteVerifier};

/// Usage-control policy decision engine
#[derive(Debug, Default)]
pub struct PolicyEngine {
    store: PolicyStore,
    config: SolverConfig,
}

impl PolicyEngine {
    /// Create an engine with an empty policy and default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom resolution limits
    pub fn with_config(config: SolverConfig) -> Self {
        PolicyEngine {
            store: PolicyStore::new(),
            config,
        }
    }

    /// Load a policy, replacing the active one wholesale
    pub fn load_policy(&self, source: &str) -> LuconResult<()> {
        let theory = Theory::parse(source)?;
        debug!(clauses = theory.len(), "loading policy theory");
        self.store.replace(theory);
        Ok(())
    }

    /// The active policy as rule-language text; round-trips with
    /// `load_policy`
    pub fn theory_text(&self) -> String {
        self.store.snapshot().to_string()
    }

    /// The active policy as structured JSON (inspection form)
    pub fn theory_json(&self) -> String {
        self.store.snapshot().to_json()
    }

    /// Run a query against the active policy
    ///
    /// `find_all` selects the enumeration mode: all solutions via
    /// backtracking, or just the first. An empty query returns an empty
    /// list without error.
    pub fn query(&self, query: &str, find_all: bool) -> LuconResult<Vec<Solution>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        debug!(query, find_all, "running query");
        let snapshot = self.store.snapshot();
        let mut solver = Solver::for_query(&snapshot, query, self.config.clone())?;
        let solutions = if find_all {
            solver.solve_all()?
        } else {
            solver.solve_first()?.into_iter().collect()
        };
        for solution in &solutions {
            trace!(%solution, "query solution");
        }
        Ok(solutions)
    }

    /// Verify a route against the active policy
    ///
    /// Returns a proof that is valid iff no path through the route violates
    /// the policy; otherwise the proof carries one counterexample per
    /// violating path. The active policy is never mutated.
    pub fn prove_invalid_route(
        &self,
        id: Option<&str>,
        route: Option<&str>,
    ) -> LuconResult<Proof> {
        let verifier = RouteVerifier::new(self.store.snapshot(), self.config.clone());
        Ok(verifier.prove_invalid_route(id, route)?)
    }
}
