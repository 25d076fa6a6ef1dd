use super::ast::{Atom, Block, Expression, Function, Operator, Program};
use crate::error::ParseError;
use crate::lexer::{Scanner, Token, TokenKind};
use std::mem::discriminant;

/// Parenthesized atoms nested deeper than this are rejected so that
/// recursion in the parser, the lowering pass and `Drop` stays bounded.
pub const MAX_NESTING: usize = 256;

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse source text into a [`Program`], consuming the whole input.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = Scanner::new(source).scan_tokens();
    Parser::new(tokens).parse()
}

/// Recursive descent parser for the minifn grammar.
///
/// ```text
/// atom      := integer | identifier | '(' mulExpr ')'
/// mulExpr   := atom (('*' | '/') atom)*
/// addExpr   := mulExpr (('+' | '-') mulExpr)*
/// block     := '{' addExpr '}'
/// function  := 'fn' identifier '(' (identifier (',' identifier)*)? ')' block
/// program   := function* EOF
/// ```
///
/// Every alternative that is tried and rejected is recorded against the
/// token where it was tried. Errors are reported at the furthest such token
/// together with everything that would have been accepted there.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Furthest token index at which an alternative was rejected
    furthest: usize,
    /// Alternatives rejected at `furthest`
    expected: Vec<&'static str>,
    nesting: usize,
}

impl Parser {
    /// Creates a new parser over a token stream ending in `Eof`
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let (offset, line, column) = tokens
                .last()
                .map(|t| (t.offset + t.lexeme.len(), t.line, t.column + t.lexeme.chars().count()))
                .unwrap_or((0, 1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), offset, line, column));
        }
        Parser {
            tokens,
            current: 0,
            furthest: 0,
            expected: Vec::new(),
            nesting: 0,
        }
    }

    /// Parses the tokens into an AST
    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut functions = Vec::new();

        while self.check(&TokenKind::Fn, "`fn`") {
            functions.push(self.parse_function()?);
        }

        if !self.check(&TokenKind::Eof, "end of input") {
            return Err(self.error());
        }

        tracing::debug!(functions = functions.len(), "parsed program");
        Ok(Program { functions })
    }

    /// function := 'fn' identifier '(' paramList? ')' block
    fn parse_function(&mut self) -> ParseResult<Function> {
        self.consume(&TokenKind::Fn, "`fn`")?;
        let name = self.expect_identifier()?;
        self.consume(&TokenKind::LeftParen, "`(`")?;

        let mut params = Vec::new();
        if let Some(first) = self.match_identifier() {
            params.push(first);
            while self.match_token(&TokenKind::Comma, "`,`") {
                params.push(self.expect_identifier()?);
            }
        }
        self.consume(&TokenKind::RightParen, "`)`")?;

        let body = self.parse_block()?;
        tracing::trace!(name = %name, params = params.len(), "parsed function");

        Ok(Function { name, params, body })
    }

    /// block := '{' addExpr '}'
    fn parse_block(&mut self) -> ParseResult<Block> {
        self.consume(&TokenKind::LeftBrace, "`{`")?;
        let ret = self.parse_add_expr()?;
        self.consume(&TokenKind::RightBrace, "`}`")?;
        Ok(Block { ret })
    }

    /// addExpr := mulExpr (('+' | '-') mulExpr)*
    fn parse_add_expr(&mut self) -> ParseResult<Expression> {
        let first = self.parse_mul_expr()?;
        let mut rest = Vec::new();

        loop {
            let op = if self.match_token(&TokenKind::Plus, "`+`") {
                Operator::Add
            } else if self.match_token(&TokenKind::Minus, "`-`") {
                Operator::Sub
            } else {
                break;
            };
            rest.push((op, self.parse_mul_expr()?));
        }

        Ok(Expression::additive(first, rest))
    }

    /// mulExpr := atom (('*' | '/') atom)*
    fn parse_mul_expr(&mut self) -> ParseResult<Expression> {
        let first = self.parse_atom()?;
        let mut rest = Vec::new();

        loop {
            let op = if self.match_token(&TokenKind::Star, "`*`") {
                Operator::Mul
            } else if self.match_token(&TokenKind::Slash, "`/`") {
                Operator::Div
            } else {
                break;
            };
            rest.push((op, self.parse_atom()?));
        }

        Ok(Expression::multiplicative(first, rest))
    }

    /// atom := integer | var | '(' mulExpr ')'
    fn parse_atom(&mut self) -> ParseResult<Atom> {
        match self.peek().kind.clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Atom::IntegerLiteral(n))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Atom::VariableRef(name))
            }
            TokenKind::LeftParen => {
                if self.nesting >= MAX_NESTING {
                    let token = self.peek();
                    return Err(ParseError::custom(
                        token.offset,
                        token.line,
                        token.column,
                        "`(`",
                        format!("expression nested more than {} levels deep", MAX_NESTING),
                    ));
                }
                self.advance();
                self.nesting += 1;
                let inner = self.parse_mul_expr();
                self.nesting -= 1;
                let inner = inner?;
                self.consume(&TokenKind::RightParen, "`)`")?;
                Ok(Atom::NestedExpression(Box::new(inner)))
            }
            _ => {
                self.record("integer");
                self.record("identifier");
                self.record("`(`");
                Err(self.error())
            }
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) {
        if !matches!(self.peek().kind, TokenKind::Eof) {
            self.current += 1;
        }
    }

    /// Remember that `label` was tried and rejected at the current token
    fn record(&mut self, label: &'static str) {
        if self.current > self.furthest {
            self.furthest = self.current;
            self.expected.clear();
        }
        if self.current == self.furthest && !self.expected.contains(&label) {
            self.expected.push(label);
        }
    }

    /// Test the current token's kind, recording `label` on mismatch
    fn check(&mut self, kind: &TokenKind, label: &'static str) -> bool {
        if discriminant(&self.peek().kind) == discriminant(kind) {
            true
        } else {
            self.record(label);
            false
        }
    }

    fn match_token(&mut self, kind: &TokenKind, label: &'static str) -> bool {
        if self.check(kind, label) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, label: &'static str) -> ParseResult<()> {
        if self.match_token(kind, label) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn match_identifier(&mut self) -> Option<String> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            self.record("identifier");
            None
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        self.match_identifier().ok_or_else(|| self.error())
    }

    /// Error at the furthest point reached
    fn error(&self) -> ParseError {
        let token = &self.tokens[self.furthest];
        let err = ParseError::expected(
            token.offset,
            token.line,
            token.column,
            self.expected.iter().map(|s| s.to_string()).collect(),
            token.kind.describe(),
        );
        match &token.kind {
            // Only worth a dedicated message where a literal could have gone
            TokenKind::Overflow(digits) if self.expected.contains(&"integer") => ParseError {
                message: format!("integer literal `{}` does not fit in a 64-bit integer", digits),
                ..err
            },
            _ => err,
        }
    }
}
