//! Property-based invariants
//!
//! Quantified properties of the engine: fact→query round trips,
//! closed/open-world duality, determinism across runs, and termination
//! under cyclic taxonomies.

use noema_core::{ProveOptions, QueryOptions, SessionConfig};
use noema_engine::{parse_statement, Session};
use proptest::prelude::*;

fn entity() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,6}"
}

fn operator() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "isA".to_string(),
        "partOf".to_string(),
        "likes".to_string(),
        "ownerOf".to_string(),
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// After `addFact(op a b)`, `query(op ?x b)` contains `{x: a}`.
    #[test]
    fn fact_query_round_trip(op in operator(), a in entity(), b in entity()) {
        prop_assume!(a != b);
        let mut session = Session::with_defaults();
        session
            .add_fact(&parse_statement(&format!("{op} {a} {b}")).unwrap())
            .unwrap();
        let pattern = parse_statement(&format!("{op} ?x {b}")).unwrap();
        let result = session.query(&pattern, &QueryOptions::default());
        prop_assert!(result
            .results
            .iter()
            .any(|m| m.bindings.get("x").map(String::as_str) == Some(a.as_str())));
    }

    /// CWA: whenever `prove(P)` fails, `prove(Not P)` succeeds, and the
    /// converse under OWA: `Not P` holds only with an explicit negation.
    #[test]
    fn closed_world_duality(op in operator(), a in entity(), b in entity(), present in any::<bool>()) {
        prop_assume!(a != b);
        let mut session = Session::with_defaults();
        if present {
            session
                .add_fact(&parse_statement(&format!("{op} {a} {b}")).unwrap())
                .unwrap();
        } else {
            // Keep the entity known without asserting the goal.
            session
                .add_fact(&parse_statement(&format!("seen {a} {b}")).unwrap())
                .unwrap();
        }
        let options = ProveOptions::default();
        let positive = session.prove(&parse_statement(&format!("{op} {a} {b}")).unwrap(), &options);
        let negative = session.prove(
            &parse_statement(&format!("Not ({op} {a} {b})")).unwrap(),
            &options,
        );
        prop_assert_eq!(positive.valid, present);
        prop_assert_eq!(negative.valid, !present);
    }

    /// Open world: `Not P` requires an explicit negation fact.
    #[test]
    fn open_world_requires_explicit_negation(op in operator(), a in entity(), b in entity()) {
        prop_assume!(a != b);
        let config = SessionConfig {
            closed_world_assumption: false,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config);
        session
            .add_fact(&parse_statement(&format!("seen {a} {b}")).unwrap())
            .unwrap();
        let options = ProveOptions::default();
        let goal = parse_statement(&format!("Not ({op} {a} {b})")).unwrap();
        prop_assert!(!session.prove(&goal, &options).valid);

        session
            .add_fact(&parse_statement(&format!("Not ({op} {a} {b})")).unwrap())
            .unwrap();
        prop_assert!(session.prove(&goal, &options).valid);
    }

    /// Identical calls return identical results, including step lists.
    #[test]
    fn prove_is_deterministic(
        op in operator(),
        entities in prop::collection::vec(entity(), 2..6),
        goal_index in 0usize..4,
    ) {
        let mut session = Session::with_defaults();
        for pair in entities.windows(2) {
            session
                .add_fact(&parse_statement(&format!("{op} {} {}", pair[0], pair[1])).unwrap())
                .unwrap();
        }
        let from = &entities[goal_index % entities.len()];
        let to = &entities[(goal_index + 1) % entities.len()];
        let goal = parse_statement(&format!("{op} {from} {to}")).unwrap();
        let options = ProveOptions::default();
        let first = session.prove(&goal, &options);
        let second = session.prove(&goal, &options);
        prop_assert_eq!(first, second);
    }

    /// Every call terminates inside its budgets, cycles included.
    #[test]
    fn cyclic_taxonomies_terminate(entities in prop::collection::vec(entity(), 2..5)) {
        let mut session = Session::with_defaults();
        // Close the loop: a → b → … → a.
        for index in 0..entities.len() {
            let from = &entities[index];
            let to = &entities[(index + 1) % entities.len()];
            if from != to {
                session
                    .add_fact(&parse_statement(&format!("isA {from} {to}")).unwrap())
                    .unwrap();
            }
        }
        let goal = parse_statement(&format!("isA {} Zzyzx", entities[0])).unwrap();
        let result = session.prove(&goal, &ProveOptions::default());
        prop_assert!(!result.valid);
        prop_assert!(result.reasoning_steps <= ProveOptions::default().max_steps);
    }
}
