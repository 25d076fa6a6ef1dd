use super::token::{Token, TokenKind};

/// Scanner for minifn source text.
///
/// Scanning never fails: characters outside the token set and oversized
/// integer literals become [`TokenKind::Unknown`] and [`TokenKind::Overflow`]
/// tokens, and the parser reports them only if it actually reaches them. That
/// keeps syntax errors at the furthest point the grammar got to, as if the
/// token rules were part of the grammar itself.
pub struct Scanner {
    /// Source as (byte offset, char) pairs
    source: Vec<(usize, char)>,
    /// Total byte length of the source
    len: usize,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line where the current token started
    start_line: usize,
    /// Column where the current token started
    start_column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.char_indices().collect(),
            len: source.len(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scans all tokens from source code; the last token is always `Eof`
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.len,
            self.line,
            self.column,
        ));

        tracing::trace!(count = self.tokens.len(), "scanned tokens");
        std::mem::take(&mut self.tokens)
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),

            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),

            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            other => self.add_token(TokenKind::Unknown(other)),
        }
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let text = self.lexeme();
        let kind = match text.parse::<i64>() {
            Ok(value) => TokenKind::Integer(value),
            Err(_) => TokenKind::Overflow(text),
        };
        self.add_token(kind);
    }

    fn scan_identifier_or_keyword(&mut self) {
        // Maximal munch: `fnx` is one identifier, never `fn` followed by `x`
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current].1;
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current].1
        }
    }

    fn byte_offset(&self, index: usize) -> usize {
        self.source.get(index).map(|(offset, _)| *offset).unwrap_or(self.len)
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current]
            .iter()
            .map(|(_, c)| *c)
            .collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        let offset = self.byte_offset(self.start);
        self.tokens.push(Token::new(
            kind,
            lexeme,
            offset,
            self.start_line,
            self.start_column,
        ));
    }
}
