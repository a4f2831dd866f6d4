//! Statement encoding
//!
//! A statement vector is the bundle of its operator bound to the operator
//! role plus each argument bound to its position role. Role atoms carry a
//! leading underscore so they stay out of decoded query answers.
//!
//! Under the exact strategy the encoding degenerates to the canonical
//! rendering of the statement, which keeps equality-based matching exact.

use crate::error::Result;
use crate::vector::Vector;
use crate::vocabulary::Vocabulary;
use noema_core::{HdcStrategy, Statement};

/// Role atom for the operator slot.
pub const OPERATOR_ROLE: &str = "_role_operator";

/// Role atom name for an argument position.
pub fn position_role(index: usize) -> String {
    format!("_role_arg{index}")
}

/// Encode a statement, memoising every atom in the vocabulary.
pub fn encode_statement(vocab: &mut Vocabulary, stmt: &Statement) -> Result<Vector> {
    if vocab.space().strategy() == HdcStrategy::Exact {
        // The vocabulary still learns the atoms for later decoding.
        vocab.get_or_create(&stmt.operator);
        for token in stmt.arg_tokens() {
            vocab.get_or_create(&token);
        }
        return Ok(Vector::Exact(canonical_form(stmt)));
    }
    let space = *vocab.space();
    let operator_role = vocab.get_or_create(OPERATOR_ROLE);
    let operator_atom = vocab.get_or_create(&stmt.operator);
    let mut parts = vec![space.bind(&operator_role, &operator_atom)?];
    for (index, token) in stmt.arg_tokens().iter().enumerate() {
        let role = vocab.get_or_create(&position_role(index));
        let atom = vocab.get_or_create(token);
        parts.push(space.bind(&role, &atom)?);
    }
    let refs: Vec<&Vector> = parts.iter().collect();
    space.bundle(&refs)
}

/// Pure variant for read-only callers: atom vectors are derived on the
/// fly (they are deterministic functions of the name), nothing is
/// memoised. Produces exactly the vector [`encode_statement`] would.
pub fn encode_statement_pure(space: &crate::space::VectorSpace, stmt: &Statement) -> Result<Vector> {
    if space.strategy() == HdcStrategy::Exact {
        return Ok(Vector::Exact(canonical_form(stmt)));
    }
    let operator_role = space.atom(OPERATOR_ROLE);
    let operator_atom = space.atom(&stmt.operator);
    let mut parts = vec![space.bind(&operator_role, &operator_atom)?];
    for (index, token) in stmt.arg_tokens().iter().enumerate() {
        let role = space.atom(&position_role(index));
        let atom = space.atom(token);
        parts.push(space.bind(&role, &atom)?);
    }
    let refs: Vec<&Vector> = parts.iter().collect();
    space.bundle(&refs)
}

/// Canonical text form used by the exact strategy: `op tok0 tok1 …`.
pub fn canonical_form(stmt: &Statement) -> String {
    let mut out = stmt.operator.clone();
    for token in stmt.arg_tokens() {
        out.push(' ');
        out.push_str(&token);
    }
    out
}

/// Recover the filler of one argument position from a statement (or
/// bundled-KB) vector: unbind the position role, then let the caller rank
/// vocabulary atoms against the result.
pub fn decode_position(vocab: &mut Vocabulary, encoded: &Vector, index: usize) -> Result<Vector> {
    let role = vocab.get_or_create(&position_role(index));
    vocab.space().unbind(encoded, &role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::VectorSpace;
    use noema_core::Statement;

    #[test]
    fn exact_encoding_is_canonical_text() {
        let mut vocab = Vocabulary::new(VectorSpace::new(HdcStrategy::Exact));
        let stmt = Statement::binary("isA", "Rex", "Dog");
        let encoded = encode_statement(&mut vocab, &stmt).unwrap();
        assert_eq!(encoded, Vector::Exact("isA Rex Dog".into()));
    }

    #[test]
    fn dense_encoding_decodes_argument_fillers() {
        let mut vocab = Vocabulary::new(VectorSpace::new(HdcStrategy::DenseBinary));
        let stmt = Statement::binary("isA", "Rex", "Dog");
        let encoded = encode_statement(&mut vocab, &stmt).unwrap();

        let decoded = decode_position(&mut vocab, &encoded, 0).unwrap();
        let hits = vocab.top_k_similar(&decoded, 3);
        assert!(hits.iter().any(|h| h.name == "Rex" && h.similarity > 0.1));
    }

    #[test]
    fn different_statements_encode_apart() {
        let mut vocab = Vocabulary::new(VectorSpace::new(HdcStrategy::DenseBinary));
        let a = encode_statement(&mut vocab, &Statement::binary("isA", "Rex", "Dog")).unwrap();
        let b = encode_statement(&mut vocab, &Statement::binary("can", "Bird", "Fly")).unwrap();
        assert!(vocab.space().similarity(&a, &b) < 0.5);
    }
}
