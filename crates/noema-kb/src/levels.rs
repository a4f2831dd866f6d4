//! Constructivist level map
//!
//! Primitive concepts sit at level 0; a derived concept sits one above its
//! highest dependency. A fact's level is one above its highest concept. A
//! rule records the level of its conclusion concept and the highest level
//! among its premise concepts, which is what level-based pruning reads.

use crate::fact::FactMetadata;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Level assignments for concepts and facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelMap {
    concepts: HashMap<String, u32>,
    facts: HashMap<u64, u32>,
}

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of a concept; unseen concepts are primitives.
    pub fn concept_level(&self, token: &str) -> u32 {
        self.concepts.get(token).copied().unwrap_or(0)
    }

    pub fn fact_level(&self, fact_id: u64) -> Option<u32> {
        self.facts.get(&fact_id).copied()
    }

    /// Register a concept at a level, keeping the maximum seen.
    pub fn raise_concept(&mut self, token: &str, level: u32) {
        let entry = self.concepts.entry(token.to_string()).or_insert(level);
        if level > *entry {
            *entry = level;
        }
    }

    /// Record a fact: its level is one above its highest concept, and its
    /// argument concepts are registered as primitives if unseen.
    pub fn observe_fact(&mut self, fact_id: u64, metadata: &FactMetadata) -> u32 {
        let mut highest = self.concept_level(&metadata.operator);
        self.concepts
            .entry(metadata.operator.clone())
            .or_insert(0);
        for arg in &metadata.args {
            self.concepts.entry(arg.clone()).or_insert(0);
            highest = highest.max(self.concept_level(arg));
        }
        let level = highest + 1;
        self.facts.insert(fact_id, level);
        level
    }

    /// Record a rule: the conclusion concept is one above the highest
    /// premise concept. Returns `(conclusion_level, max_premise_level)`.
    pub fn observe_rule(&mut self, rule: &Rule) -> (u32, u32) {
        let mut max_premise = 0u32;
        for leaf in rule.condition_tree.leaves() {
            max_premise = max_premise.max(self.concept_level(&leaf.operator));
            for token in leaf.arg_tokens() {
                if !token.starts_with('?') {
                    max_premise = max_premise.max(self.concept_level(&token));
                }
            }
        }
        let conclusion_level = max_premise + 1;
        self.raise_concept(&rule.conclusion.operator, conclusion_level);
        (conclusion_level, max_premise)
    }

    /// Highest level assigned to any fact so far.
    pub fn max_fact_level(&self) -> u32 {
        self.facts.values().copied().max().unwrap_or(0)
    }

    /// Whether a rule survives level pruning for a goal at `goal_level`:
    /// a conclusion's premises must sit strictly below the goal. Rules
    /// without recorded levels survive unless pruning is strict.
    pub fn rule_within_level(rule: &Rule, goal_level: u32, strict: bool) -> bool {
        match rule.max_premise_level {
            Some(max_premise) => max_premise <= goal_level,
            None => !strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::Statement;

    #[test]
    fn facts_sit_one_above_their_concepts() {
        let mut levels = LevelMap::new();
        let meta = FactMetadata::from_statement(&Statement::binary("isA", "Rex", "Dog"));
        assert_eq!(levels.observe_fact(0, &meta), 1);
        assert_eq!(levels.concept_level("Rex"), 0);
    }

    #[test]
    fn rules_lift_their_conclusion_concept() {
        let mut levels = LevelMap::new();
        let rule = Rule::new(
            0,
            Statement::new("human", vec![noema_core::var("x")]),
            Statement::new("mortal", vec![noema_core::var("x")]),
        )
        .unwrap();
        let (conclusion_level, max_premise) = levels.observe_rule(&rule);
        assert_eq!(max_premise, 0);
        assert_eq!(conclusion_level, 1);
        assert_eq!(levels.concept_level("mortal"), 1);
    }
}
