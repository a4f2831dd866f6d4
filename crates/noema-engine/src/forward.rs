//! Forward chaining
//!
//! Explicit fixpoint pass over the rule set: enumerate every binding set
//! satisfying a rule's condition against the current KB, instantiate the
//! conclusion, and insert it as a derived fact with a provenance link.
//! Takes `&mut Session`, which statically rules out interleaving with an
//! in-flight proof call on the same session.

use crate::condition::prove_condition;
use crate::error::Result;
use crate::session::Session;
use crate::state::ProofState;
use noema_core::{Bindings, ProveOptions, Statement};
use tracing::{debug, info};

/// Round cap shielding pathological rule sets; a fixpoint normally lands
/// well before it.
const DEFAULT_MAX_ROUNDS: usize = 32;

/// Run forward chaining to fixpoint (or the round cap). Returns the ids
/// of all newly derived facts in derivation order.
pub(crate) fn run_forward_chain(
    session: &mut Session,
    max_rounds: Option<usize>,
) -> Result<Vec<u64>> {
    let rounds = max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS);
    let options = ProveOptions::default();
    let mut derived_ids = Vec::new();

    for round in 0..rounds {
        let mut pending: Vec<(Statement, String)> = Vec::new();
        let rules = session.rules().to_vec();
        for rule in &rules {
            let mut state = ProofState::new(&options);
            let solutions =
                prove_condition(session, &mut state, &rule.condition_tree, &Bindings::new(), 0)?;
            for solution in solutions {
                for leaf in rule.conclusion_leaves() {
                    let conclusion = leaf.substituted(&solution.bindings);
                    if !conclusion.is_ground() {
                        continue;
                    }
                    let tokens = conclusion.arg_tokens();
                    if session.kb().has_nary(&conclusion.operator, &tokens) {
                        continue;
                    }
                    if pending.iter().any(|(stmt, _)| *stmt == conclusion) {
                        continue;
                    }
                    debug!(round, rule = %rule.name, fact = %conclusion, "forward derive");
                    pending.push((conclusion, rule.name.clone()));
                }
            }
        }
        if pending.is_empty() {
            break;
        }
        for (statement, rule_name) in pending {
            let id = session.insert_derived_fact(&statement, &rule_name)?;
            derived_ids.push(id);
        }
    }

    info!(count = derived_ids.len(), "forward chaining complete");
    Ok(derived_ids)
}
