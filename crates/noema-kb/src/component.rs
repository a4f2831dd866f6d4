//! ComponentKB: indexed fact storage
//!
//! Every fact appears in exactly one primary slot and one entry per
//! argument position ≤ 2. Lookup by operator alone is O(facts with that
//! operator). Unknown operators and arguments yield empty results, never
//! errors. Id lists are kept in insertion order so every enumeration is
//! deterministic.

use crate::fact::{Fact, FactMetadata};
use noema_core::Statement;
use noema_hdc::Vector;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// Indexed storage of ground facts, synonym classes included.
#[derive(Debug, Clone, Default)]
pub struct ComponentKb {
    facts: Vec<Fact>,
    by_operator: HashMap<String, Vec<u64>>,
    by_op_arg0: HashMap<(String, String), Vec<u64>>,
    by_op_arg1: HashMap<(String, String), Vec<u64>>,
    by_arg0: HashMap<String, Vec<u64>>,
    by_arg1: HashMap<String, Vec<u64>>,
    /// `Not` facts indexed by their expanded inner operator.
    negations: HashMap<String, Vec<u64>>,
    /// Bidirectional synonym adjacency. BTreeSet keeps walks deterministic.
    synonyms: HashMap<String, BTreeSet<String>>,
    canonicalization_enabled: bool,
}

impl ComponentKb {
    pub fn new(canonicalization_enabled: bool) -> Self {
        Self {
            canonicalization_enabled,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn canonicalization_enabled(&self) -> bool {
        self.canonicalization_enabled
    }

    /// All facts in insertion order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn fact(&self, id: u64) -> Option<&Fact> {
        self.facts.get(id as usize)
    }

    /// Insert a statement as a fact; assigns the next dense id.
    pub fn add_statement(&mut self, stmt: &Statement, vector: Option<Vector>) -> u64 {
        self.add_fact(FactMetadata::from_statement(stmt), vector)
    }

    /// Insert a fact built from metadata; assigns the next dense id.
    pub fn add_fact(&mut self, metadata: FactMetadata, vector: Option<Vector>) -> u64 {
        let id = self.facts.len() as u64;

        if metadata.operator == "synonym" && metadata.args.len() == 2 {
            self.register_synonym(&metadata.args[0], &metadata.args[1]);
        }

        self.by_operator
            .entry(metadata.operator.clone())
            .or_default()
            .push(id);
        if let Some(arg0) = metadata.args.first() {
            self.by_arg0.entry(arg0.clone()).or_default().push(id);
            self.by_op_arg0
                .entry((metadata.operator.clone(), arg0.clone()))
                .or_default()
                .push(id);
        }
        if let Some(arg1) = metadata.args.get(1) {
            self.by_arg1.entry(arg1.clone()).or_default().push(id);
            self.by_op_arg1
                .entry((metadata.operator.clone(), arg1.clone()))
                .or_default()
                .push(id);
        }
        if let Some(inner_op) = &metadata.inner_operator {
            self.negations.entry(inner_op.clone()).or_default().push(id);
        }

        debug!(id, fact = %metadata.statement(), "kb insert");
        self.facts.push(Fact {
            id,
            vector,
            metadata,
        });
        id
    }

    fn register_synonym(&mut self, a: &str, b: &str) {
        self.synonyms
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.synonyms
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    /// Transitive closure of the synonym relation; always contains the
    /// token itself, in BFS-from-token order.
    pub fn expand_synonyms(&self, token: &str) -> Vec<String> {
        let mut seen: Vec<String> = vec![token.to_string()];
        let mut queue: VecDeque<String> = VecDeque::from([token.to_string()]);
        while let Some(current) = queue.pop_front() {
            if let Some(neighbours) = self.synonyms.get(&current) {
                for neighbour in neighbours {
                    if !seen.iter().any(|s| s == neighbour) {
                        seen.push(neighbour.clone());
                        queue.push_back(neighbour.clone());
                    }
                }
            }
        }
        seen
    }

    /// Deterministic representative of a token's synonym class: the
    /// lexicographically smallest member. Identity when canonicalisation
    /// is disabled or the token has no synonyms.
    pub fn canonicalize_name(&self, token: &str) -> String {
        if !self.canonicalization_enabled {
            return token.to_string();
        }
        self.expand_synonyms(token)
            .into_iter()
            .min()
            .unwrap_or_else(|| token.to_string())
    }

    /// Token equality under canonicalisation.
    pub fn tokens_match(&self, a: &str, b: &str) -> bool {
        a == b || self.canonicalize_name(a) == self.canonicalize_name(b)
    }

    fn collect(&self, ids: &[u64]) -> Vec<&Fact> {
        ids.iter()
            .filter_map(|id| self.fact(*id))
            .collect()
    }

    fn merged<'a, I>(&self, lists: I) -> Vec<&Fact>
    where
        I: IntoIterator<Item = &'a Vec<u64>>,
    {
        let mut ids: Vec<u64> = lists.into_iter().flatten().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        self.collect(&ids)
    }

    /// Facts with the given operator, optionally including operator
    /// synonyms, in KB insertion order.
    pub fn find_by_operator(&self, operator: &str, expand_synonyms: bool) -> Vec<&Fact> {
        if !expand_synonyms {
            return self
                .by_operator
                .get(operator)
                .map(|ids| self.collect(ids))
                .unwrap_or_default();
        }
        let names = self.expand_synonyms(operator);
        self.merged(names.iter().filter_map(|name| self.by_operator.get(name)))
    }

    /// Facts `operator arg0 …`, expanding synonyms of both tokens.
    pub fn find_by_operator_and_arg0(
        &self,
        operator: &str,
        arg0: &str,
        expand_synonyms: bool,
    ) -> Vec<&Fact> {
        self.find_by_pair(&self.by_op_arg0, operator, arg0, expand_synonyms)
    }

    /// Facts `operator … arg1`, expanding synonyms of both tokens.
    pub fn find_by_operator_and_arg1(
        &self,
        operator: &str,
        arg1: &str,
        expand_synonyms: bool,
    ) -> Vec<&Fact> {
        self.find_by_pair(&self.by_op_arg1, operator, arg1, expand_synonyms)
    }

    fn find_by_pair(
        &self,
        index: &HashMap<(String, String), Vec<u64>>,
        operator: &str,
        arg: &str,
        expand_synonyms: bool,
    ) -> Vec<&Fact> {
        if !expand_synonyms {
            return index
                .get(&(operator.to_string(), arg.to_string()))
                .map(|ids| self.collect(ids))
                .unwrap_or_default();
        }
        let ops = self.expand_synonyms(operator);
        let args = self.expand_synonyms(arg);
        let mut lists = Vec::new();
        for op in &ops {
            for a in &args {
                if let Some(ids) = index.get(&(op.clone(), a.clone())) {
                    lists.push(ids);
                }
            }
        }
        self.merged(lists)
    }

    /// Facts whose first argument is the token.
    pub fn find_by_arg0(&self, arg0: &str) -> Vec<&Fact> {
        self.by_arg0
            .get(arg0)
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Facts whose second argument is the token.
    pub fn find_by_arg1(&self, arg1: &str) -> Vec<&Fact> {
        self.by_arg1
            .get(arg1)
            .map(|ids| self.collect(ids))
            .unwrap_or_default()
    }

    /// Exact n-ary membership under canonicalisation.
    pub fn has_nary(&self, operator: &str, args: &[String]) -> bool {
        self.find_exact(operator, args).is_some()
    }

    /// The stored fact matching `operator args…` under canonicalisation.
    pub fn find_exact(&self, operator: &str, args: &[String]) -> Option<&Fact> {
        let candidates = match args.first() {
            Some(arg0) => self.find_by_operator_and_arg0(operator, arg0, true),
            None => self.find_by_operator(operator, true),
        };
        candidates.into_iter().find(|fact| {
            fact.metadata.args.len() == args.len()
                && fact
                    .metadata
                    .args
                    .iter()
                    .zip(args)
                    .all(|(stored, wanted)| self.tokens_match(stored, wanted))
        })
    }

    /// The `Not` fact whose expanded inner form matches `operator args…`.
    pub fn find_negation(&self, operator: &str, args: &[String]) -> Option<&Fact> {
        let ids = self.negations.get(operator)?;
        self.collect(ids).into_iter().find(|fact| {
            fact.metadata
                .inner_args
                .as_ref()
                .is_some_and(|inner| {
                    inner.len() == args.len()
                        && inner
                            .iter()
                            .zip(args)
                            .all(|(stored, wanted)| self.tokens_match(stored, wanted))
                })
        })
    }

    /// True when the token appears anywhere in the KB as an argument.
    pub fn knows_entity(&self, token: &str) -> bool {
        self.expand_synonyms(token)
            .iter()
            .any(|name| self.by_arg0.contains_key(name) || self.by_arg1.contains_key(name))
    }

    /// Argument tokens seen in the KB minus internal markers, in first-seen
    /// order. The witness domain for existential negation-as-failure.
    pub fn entity_domain(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for fact in &self.facts {
            for arg in &fact.metadata.args {
                let internal = arg.starts_with(&['_', '?', '$', '@', '('][..]);
                if !internal && !out.iter().any(|seen| seen == arg) {
                    out.push(arg.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb_with(statements: &[Statement]) -> ComponentKb {
        let mut kb = ComponentKb::new(true);
        for stmt in statements {
            kb.add_statement(stmt, None);
        }
        kb
    }

    #[test]
    fn indexes_by_operator_and_args() {
        let kb = kb_with(&[
            Statement::binary("isA", "Rex", "Dog"),
            Statement::binary("isA", "Dog", "Mammal"),
            Statement::binary("can", "Bird", "Fly"),
        ]);
        assert_eq!(kb.find_by_operator("isA", true).len(), 2);
        assert_eq!(kb.find_by_operator_and_arg0("isA", "Rex", true).len(), 1);
        assert_eq!(kb.find_by_operator_and_arg1("isA", "Mammal", true).len(), 1);
        assert_eq!(kb.find_by_arg0("Rex").len(), 1);
        assert!(kb.find_by_operator("unknown", true).is_empty());
    }

    #[test]
    fn synonym_closure_is_transitive_and_reflexive() {
        let kb = kb_with(&[
            Statement::binary("synonym", "car", "auto"),
            Statement::binary("synonym", "auto", "vehicle"),
        ]);
        let expanded = kb.expand_synonyms("car");
        assert!(expanded.contains(&"car".to_string()));
        assert!(expanded.contains(&"auto".to_string()));
        assert!(expanded.contains(&"vehicle".to_string()));
        assert_eq!(kb.canonicalize_name("vehicle"), "auto");
        assert!(kb.tokens_match("car", "vehicle"));
    }

    #[test]
    fn synonym_lookup_reaches_equivalent_facts() {
        let kb = kb_with(&[
            Statement::binary("synonym", "car", "auto"),
            Statement::binary("owns", "Alice", "car"),
        ]);
        assert_eq!(kb.find_by_operator_and_arg1("owns", "auto", true).len(), 1);
        assert!(kb.find_by_operator_and_arg1("owns", "auto", false).is_empty());
    }

    #[test]
    fn negations_index_by_inner_operator() {
        let kb = kb_with(&[Statement::binary("can", "Penguin", "Fly").negated()]);
        let found = kb
            .find_negation("can", &["Penguin".into(), "Fly".into()])
            .expect("negation indexed");
        assert_eq!(found.metadata.operator, "Not");
        assert!(kb.find_negation("can", &["Bird".into(), "Fly".into()]).is_none());
    }

    #[test]
    fn entity_domain_skips_internal_tokens() {
        let kb = kb_with(&[
            Statement::binary("isA", "Rex", "Dog"),
            Statement::binary("marker", "_hidden", "Rex"),
        ]);
        let domain = kb.entity_domain();
        assert!(domain.contains(&"Rex".to_string()));
        assert!(domain.contains(&"Dog".to_string()));
        assert!(!domain.contains(&"_hidden".to_string()));
    }

    #[test]
    fn has_nary_respects_canonicalization() {
        let kb = kb_with(&[
            Statement::binary("synonym", "car", "auto"),
            Statement::binary("owns", "Alice", "car"),
        ]);
        assert!(kb.has_nary("owns", &["Alice".into(), "auto".into()]));
        assert!(!kb.has_nary("owns", &["Bob".into(), "auto".into()]));
    }
}
