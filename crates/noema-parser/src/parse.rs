//! Recursive-descent parser over the token stream

use crate::lexer::{Lexer, Token, TokenKind};
use noema_core::{Statement, Term};
use thiserror::Error;

/// Result alias for parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse failures, all carrying the offending source line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected character {found:?} on line {line}")]
    UnexpectedChar { found: char, line: usize },

    #[error("Unterminated string on line {line}")]
    UnterminatedString { line: usize },

    #[error("Empty name after {sigil:?} on line {line}")]
    EmptyName { sigil: char, line: usize },

    #[error("Expected an operator on line {line}, found {found}")]
    ExpectedOperator { found: String, line: usize },

    #[error("Unbalanced ')' on line {line}")]
    UnbalancedClose { line: usize },

    #[error("Unclosed '(' opened on line {line}")]
    UnclosedParen { line: usize },
}

/// Parse a source into its statements.
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser { tokens, pos: 0 }.statements()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn statements(mut self) -> Result<Vec<Statement>> {
        let mut out = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().is_none() {
                return Ok(out);
            }
            out.push(self.statement(false)?);
        }
    }

    /// One statement: operator followed by terms. At top level a newline
    /// terminates the statement; inside parens the closing paren does.
    fn statement(&mut self, nested: bool) -> Result<Statement> {
        let (operator, line) = match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                line,
            }) => (name, line),
            Some(token) => {
                return Err(ParseError::ExpectedOperator {
                    found: describe(&token.kind),
                    line: token.line,
                })
            }
            None => {
                return Err(ParseError::ExpectedOperator {
                    found: "end of input".into(),
                    line: 0,
                })
            }
        };

        let mut args = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if nested {
                        return Err(ParseError::UnclosedParen { line });
                    }
                    return Ok(Statement::new(operator, args));
                }
                Some(TokenKind::Newline) => {
                    if nested {
                        // Compound arguments may span lines.
                        self.pos += 1;
                        continue;
                    }
                    self.pos += 1;
                    return Ok(Statement::new(operator, args));
                }
                Some(TokenKind::RParen) => {
                    if nested {
                        self.pos += 1;
                        return Ok(Statement::new(operator, args));
                    }
                    let bad_line = self.tokens[self.pos].line;
                    return Err(ParseError::UnbalancedClose { line: bad_line });
                }
                Some(_) => args.push(self.term()?),
            }
        }
    }

    fn term(&mut self) -> Result<Term> {
        let token = self
            .next()
            .expect("term() is only called with a token available");
        match token.kind {
            TokenKind::Ident(name) => Ok(Term::Identifier(name)),
            TokenKind::Literal(value) => Ok(Term::Literal(value)),
            TokenKind::Variable(name) => Ok(Term::Variable(name)),
            TokenKind::Reference(name) => Ok(Term::Reference(name)),
            TokenKind::LParen => {
                self.skip_newlines();
                Ok(Term::Compound(self.statement(true)?))
            }
            TokenKind::RParen => Err(ParseError::UnbalancedClose { line: token.line }),
            TokenKind::Newline => unreachable!("newline handled by statement()"),
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Newline)) {
            self.pos += 1;
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::Ident(name) => format!("identifier {name:?}"),
        TokenKind::Literal(value) => format!("literal {value:?}"),
        TokenKind::Variable(name) => format!("variable ?{name}"),
        TokenKind::Reference(name) => format!("reference ${name}"),
        TokenKind::Newline => "end of line".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ground_facts() {
        let statements = parse("isA Tweety Penguin\nisA Penguin Bird\n").unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].to_string(), "isA Tweety Penguin");
        assert!(statements[0].is_ground());
    }

    #[test]
    fn parses_nary_and_compound_negation() {
        let statements = parse("Not can Penguin Fly\nNot (can Penguin Fly)").unwrap();
        for stmt in &statements {
            assert_eq!(
                stmt.negation_inner().unwrap().to_string(),
                "can Penguin Fly"
            );
        }
    }

    #[test]
    fn parses_rules_with_variables() {
        let statements =
            parse("Implies (And (human ?x) (mortal ?x)) (subject ?x)").unwrap();
        assert_eq!(statements.len(), 1);
        let rule = &statements[0];
        assert_eq!(rule.operator, "Implies");
        assert_eq!(rule.args.len(), 2);
        assert_eq!(rule.variables(), vec!["x"]);
        assert_eq!(
            rule.to_string(),
            "Implies (And (human ?x) (mortal ?x)) (subject ?x)"
        );
    }

    #[test]
    fn compound_arguments_may_span_lines() {
        let source = "Implies (And (human ?x)\n    (mortal ?x))\n  (subject ?x)";
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].args.len(), 2);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let statements = parse("# header\n\nisA Rex Dog # trailing\n\n").unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn reports_unbalanced_close() {
        assert!(matches!(
            parse("can Tweety Fly)"),
            Err(ParseError::UnbalancedClose { line: 1 })
        ));
    }

    #[test]
    fn quoted_literals_and_numerals() {
        let statements = parse("hasLabel Rex \"good boy\"\nhasAge Rex 7").unwrap();
        assert_eq!(statements[0].args[1], Term::Literal("good boy".into()));
        assert_eq!(statements[1].args[1], Term::Literal("7".into()));
    }
}
