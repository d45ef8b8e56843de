//! Policy parser
//!
//! Recursive-descent parser from a token stream to `PolicyAst`.
//!
//! ```text
//! policy := 'policy' IDENT '{' header* clause* '}'
//! clause := 'clause' IDENT ('after' IDENT (',' IDENT)*)? ':' condition
//!           '->' action (',' action)* 'halt'? ';'?
//! condition := and_cond ('OR' and_cond)*
//! and_cond  := primary ('AND' primary)*
//! ```
//!
//! The parser fails fast: the first token that does not fit the grammar is
//! reported and nothing is recovered.

use crate::error::{ParseError, Result};
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};
use std::collections::BTreeMap;
use warden_core::ast::{
    Action, ActionKind, Category, Clause, Comparator, Condition, LogicalOperator, Mode, PolicyAst,
    PolicyMetadata,
};
use warden_core::Value;

/// Deepest parenthesised condition the parser accepts
pub const MAX_NESTING_DEPTH: usize = 128;

const HEADER_FIELDS: &str = "'version', 'mode', 'category', 'scope', 'depends_on' or 'clause'";

/// Parse the source of a single policy
pub fn parse_policy(source: &str) -> Result<PolicyAst> {
    let tokens = Lexer::tokenize(source)?;
    Parser::parse(tokens)
}

/// Parse a source carrying any number of policies
pub fn parse_policy_set(source: &str) -> Result<Vec<PolicyAst>> {
    let tokens = Lexer::tokenize(source)?;
    Parser::parse_set(tokens)
}

/// Recursive-descent parser over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let position = tokens.last().map(|t| t.position).unwrap_or_else(Position::start);
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse exactly one policy followed by end of input
    pub fn parse(tokens: Vec<Token>) -> Result<PolicyAst> {
        let mut parser = Parser::new(tokens);
        let policy = parser.parse_policy()?;
        parser.expect(TokenKind::Eof)?;
        Ok(policy)
    }

    /// Parse zero or more policies followed by end of input
    pub fn parse_set(tokens: Vec<Token>) -> Result<Vec<PolicyAst>> {
        let mut parser = Parser::new(tokens);
        let mut policies = Vec::new();
        while !parser.check(TokenKind::Eof) {
            policies.push(parser.parse_policy()?);
        }
        Ok(policies)
    }

    // ===== Token helpers =====

    fn cur(&self) -> &Token {
        // `new` guarantees a trailing Eof, and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.cur().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Ident)?.text)
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.cur();
        let found = match token.kind {
            TokenKind::Ident | TokenKind::Number => format!("{} '{}'", token.kind, token.text),
            TokenKind::String => format!("string {:?}", token.text),
            kind => kind.describe().to_string(),
        };
        ParseError::Unexpected {
            position: token.position,
            expected: expected.into(),
            found,
        }
    }

    // ===== Policy =====

    fn parse_policy(&mut self) -> Result<PolicyAst> {
        self.expect(TokenKind::Policy)?;
        let id = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut metadata = PolicyMetadata::new(id);
        let mut seen: Vec<String> = Vec::new();
        while self.check(TokenKind::Ident) {
            let position = self.cur().position;
            let field = self.cur().text.clone();
            if seen.contains(&field) {
                return Err(ParseError::DuplicateHeader { position, field });
            }
            self.parse_header(&mut metadata)?;
            seen.push(field);
        }

        let mut clauses = Vec::new();
        while self.check(TokenKind::Clause) {
            clauses.push(self.parse_clause()?);
        }

        if !self.check(TokenKind::RBrace) {
            let expected = if clauses.is_empty() {
                HEADER_FIELDS
            } else {
                "'clause' or '}'"
            };
            return Err(self.unexpected(expected));
        }
        self.advance();

        log::debug!(
            "parsed policy '{}' with {} clause(s)",
            metadata.id,
            clauses.len()
        );
        Ok(PolicyAst::new(metadata, clauses))
    }

    fn parse_header(&mut self, metadata: &mut PolicyMetadata) -> Result<()> {
        let field = self.cur().text.clone();
        match field.as_str() {
            "version" => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                metadata.version = match self.cur().kind {
                    TokenKind::String | TokenKind::Number | TokenKind::Ident => self.advance().text,
                    _ => return Err(self.unexpected("version string")),
                };
            }
            "mode" => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                metadata.mode = match Mode::from_keyword(&self.cur().text) {
                    Some(mode) if self.check(TokenKind::Ident) => {
                        self.advance();
                        mode
                    }
                    _ => return Err(self.unexpected("'MONITOR' or 'ENFORCE'")),
                };
            }
            "category" => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                metadata.category = match Category::from_keyword(&self.cur().text) {
                    Some(category) if self.check(TokenKind::Ident) => {
                        self.advance();
                        category
                    }
                    _ => {
                        return Err(self.unexpected(
                            "'SAFETY', 'PRIVACY', 'OPERATIONAL', 'ROUTING' or 'CUSTOM'",
                        ))
                    }
                };
            }
            "scope" => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                metadata.scope = self.parse_scope()?;
            }
            "depends_on" => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                metadata.depends_on = self.parse_ident_list()?;
            }
            _ => return Err(self.unexpected(HEADER_FIELDS)),
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_scope(&mut self) -> Result<BTreeMap<String, String>> {
        self.expect(TokenKind::LBrace)?;
        let mut scope = BTreeMap::new();
        if self.eat(TokenKind::RBrace) {
            return Ok(scope);
        }
        loop {
            let position = self.cur().position;
            let key = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.expect(TokenKind::String)?.text;
            if scope.insert(key.clone(), value).is_some() {
                return Err(ParseError::DuplicateHeader {
                    position,
                    field: format!("scope.{}", key),
                });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(scope)
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        if self.eat(TokenKind::RBracket) {
            return Ok(items);
        }
        loop {
            items.push(self.expect_ident()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(items)
    }

    // ===== Clause =====

    fn parse_clause(&mut self) -> Result<Clause> {
        self.expect(TokenKind::Clause)?;
        let id = self.expect_ident()?;

        let mut after = Vec::new();
        if self.eat(TokenKind::After) {
            loop {
                after.push(self.expect_ident()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::Colon)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Arrow)?;

        let mut actions = vec![self.parse_action()?];
        while self.eat(TokenKind::Comma) {
            actions.push(self.parse_action()?);
        }

        let halt = self.eat(TokenKind::Halt);
        self.eat(TokenKind::Semicolon);

        Ok(Clause {
            id,
            after,
            condition,
            actions,
            halt,
        })
    }

    fn parse_action(&mut self) -> Result<Action> {
        let kind = match ActionKind::from_keyword(&self.cur().text) {
            Some(kind) if self.check(TokenKind::Ident) => {
                self.advance();
                kind
            }
            _ => return Err(self.unexpected("'WARN', 'BLOCK', 'REQUIRE_APPROVAL' or 'ALLOW'")),
        };

        let detail = if self.eat(TokenKind::LParen) {
            let text = self.expect(TokenKind::String)?.text;
            self.expect(TokenKind::RParen)?;
            Some(text)
        } else {
            None
        };

        Ok(Action::of_kind(kind, detail))
    }

    // ===== Conditions =====

    fn parse_condition(&mut self) -> Result<Condition> {
        let first = self.parse_and_condition()?;
        if !self.check(TokenKind::Or) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.eat(TokenKind::Or) {
            operands.push(self.parse_and_condition()?);
        }
        Ok(Condition::Logical {
            operator: LogicalOperator::Or,
            operands,
        })
    }

    fn parse_and_condition(&mut self) -> Result<Condition> {
        let first = self.parse_primary()?;
        if !self.check(TokenKind::And) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.eat(TokenKind::And) {
            operands.push(self.parse_primary()?);
        }
        Ok(Condition::Logical {
            operator: LogicalOperator::And,
            operands,
        })
    }

    fn parse_primary(&mut self) -> Result<Condition> {
        match self.cur().kind {
            TokenKind::LParen => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::NestingTooDeep {
                        position: self.cur().position,
                        limit: MAX_NESTING_DEPTH,
                    });
                }
                self.advance();
                self.depth += 1;
                let inner = self.parse_condition();
                self.depth -= 1;
                let inner = inner?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Exists => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let metric = self.expect_ident()?;
                self.expect(TokenKind::RParen)?;
                Ok(Condition::Exists { metric })
            }
            TokenKind::True => {
                self.advance();
                Ok(Condition::Literal(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Condition::Literal(false))
            }
            TokenKind::Ident => {
                let metric = self.advance().text;
                let comparator = self.parse_comparator()?;
                let value = self.parse_literal()?;
                Ok(Condition::Predicate {
                    metric,
                    comparator,
                    value,
                })
            }
            _ => Err(self.unexpected("condition")),
        }
    }

    fn parse_comparator(&mut self) -> Result<Comparator> {
        let comparator = match self.cur().kind {
            TokenKind::EqEq => Comparator::Eq,
            TokenKind::NotEq => Comparator::Ne,
            TokenKind::Gt => Comparator::Gt,
            TokenKind::Ge => Comparator::Ge,
            TokenKind::Lt => Comparator::Lt,
            TokenKind::Le => Comparator::Le,
            _ => return Err(self.unexpected("comparator")),
        };
        self.advance();
        Ok(comparator)
    }

    fn parse_literal(&mut self) -> Result<Value> {
        match self.cur().kind {
            TokenKind::Number => {
                let token = self.advance();
                match token.text.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                    _ => Err(ParseError::InvalidNumber {
                        position: token.position,
                        text: token.text,
                    }),
                }
            }
            TokenKind::String => Ok(Value::String(self.advance().text)),
            TokenKind::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            _ => Err(self.unexpected("literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_policy() {
        let ast = parse_policy("policy p1 { mode: ENFORCE; clause c1: cost_usd > 100 -> BLOCK }")
            .unwrap();

        assert_eq!(ast.metadata.id, "p1");
        assert_eq!(ast.metadata.mode, Mode::Enforce);
        assert_eq!(ast.metadata.category, Category::Custom);
        assert_eq!(ast.clauses.len(), 1);

        let clause = &ast.clauses[0];
        assert_eq!(clause.id, "c1");
        assert_eq!(
            clause.condition,
            Condition::predicate("cost_usd", Comparator::Gt, Value::Number(100.0))
        );
        assert_eq!(clause.actions, vec![Action::Block { reason: None }]);
        assert!(!clause.halt);
    }

    #[test]
    fn test_parse_all_headers() {
        let source = r#"
            policy payments_guard {
                version: "2.1";
                mode: MONITOR;
                category: SAFETY;
                scope: { resource: "payments", region: "eu" };
                depends_on: [base, audit];
            }
        "#;
        let ast = parse_policy(source).unwrap();
        let meta = &ast.metadata;
        assert_eq!(meta.version, "2.1");
        assert_eq!(meta.mode, Mode::Monitor);
        assert_eq!(meta.category, Category::Safety);
        assert_eq!(meta.scope.get("resource").map(String::as_str), Some("payments"));
        assert_eq!(meta.scope.len(), 2);
        assert_eq!(meta.depends_on, vec!["base", "audit"]);
        assert!(ast.clauses.is_empty());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse_policy("policy p { clause c: a > 1 OR b > 2 AND c > 3 -> WARN }").unwrap();
        let expected = Condition::or(vec![
            Condition::predicate("a", Comparator::Gt, Value::Number(1.0)),
            Condition::and(vec![
                Condition::predicate("b", Comparator::Gt, Value::Number(2.0)),
                Condition::predicate("c", Comparator::Gt, Value::Number(3.0)),
            ]),
        ]);
        assert_eq!(ast.clauses[0].condition, expected);
    }

    #[test]
    fn test_chains_flatten_and_parens_nest() {
        let ast = parse_policy(
            "policy p { clause c: a > 1 AND b > 2 AND (c > 3 OR exists(d)) -> WARN }",
        )
        .unwrap();
        match &ast.clauses[0].condition {
            Condition::Logical { operator, operands } => {
                assert_eq!(*operator, LogicalOperator::And);
                assert_eq!(operands.len(), 3);
                assert!(matches!(
                    operands[2],
                    Condition::Logical {
                        operator: LogicalOperator::Or,
                        ..
                    }
                ));
            }
            other => panic!("Expected logical condition, got {:?}", other),
        }
    }

    #[test]
    fn test_clause_extras() {
        let source = r#"
            policy p {
                clause first: true -> ALLOW("default");
                clause second after first: region == "eu" -> WARN("eu traffic"), REQUIRE_APPROVAL halt;
            }
        "#;
        let ast = parse_policy(source).unwrap();
        assert_eq!(ast.clauses[0].condition, Condition::Literal(true));
        assert_eq!(
            ast.clauses[0].actions,
            vec![Action::Allow {
                reason: Some("default".to_string())
            }]
        );

        let second = &ast.clauses[1];
        assert_eq!(second.after, vec!["first"]);
        assert!(second.halt);
        assert_eq!(second.actions.len(), 2);
        assert_eq!(second.actions[1].kind(), ActionKind::RequireApproval);
    }

    #[test]
    fn test_literal_kinds() {
        let ast = parse_policy(
            r#"policy p { clause c: flagged == true AND score <= -0.5 AND name != "x" -> WARN }"#,
        )
        .unwrap();
        match &ast.clauses[0].condition {
            Condition::Logical { operands, .. } => {
                assert_eq!(
                    operands[0],
                    Condition::predicate("flagged", Comparator::Eq, Value::Bool(true))
                );
                assert_eq!(
                    operands[1],
                    Condition::predicate("score", Comparator::Le, Value::Number(-0.5))
                );
                assert_eq!(
                    operands[2],
                    Condition::predicate("name", Comparator::Ne, Value::from("x"))
                );
            }
            other => panic!("Expected logical condition, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_arrow_reports_position() {
        let err = parse_policy("policy p {\n  clause c: cost > 1 BLOCK\n}").unwrap_err();
        match err {
            ParseError::Unexpected {
                position,
                expected,
                found,
            } => {
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 22);
                assert_eq!(expected, "'->'");
                assert_eq!(found, "identifier 'BLOCK'");
            }
            other => panic!("Expected unexpected-token error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = parse_policy("policy p { mode: ENFORCE; mode: MONITOR; }").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateHeader { ref field, .. } if field == "mode"));
    }

    #[test]
    fn test_unknown_header_rejected() {
        let err = parse_policy("policy p { owner: \"me\"; }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = parse_policy("policy p { clause c: a > 1 -> DENY }").unwrap_err();
        assert!(err.to_string().contains("'BLOCK'"));
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = parse_policy("policy p { clause c: a > 1 -> WARN(\"oops) }").unwrap_err();
        assert!(matches!(err, ParseError::Lex(_)));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_policy("policy p { } policy q { }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { ref expected, .. } if expected == "end of input"));
    }

    #[test]
    fn test_parse_set() {
        let policies = parse_policy_set("policy a { } policy b { category: ROUTING; }").unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].metadata.category, Category::Routing);
        assert!(parse_policy_set("# nothing here").unwrap().is_empty());
    }

    #[test]
    fn test_parser_accepts_stream_without_eof() {
        let tokens = vec![
            Token::new(TokenKind::Policy, "policy", Position::start()),
            Token::new(TokenKind::Ident, "p", Position::new(7, 1, 8)),
            Token::new(TokenKind::LBrace, "{", Position::new(9, 1, 10)),
            Token::new(TokenKind::RBrace, "}", Position::new(10, 1, 11)),
        ];
        let ast = Parser::parse(tokens).unwrap();
        assert_eq!(ast.metadata.id, "p");
        assert!(Parser::parse(Vec::new()).is_err());
    }
}
