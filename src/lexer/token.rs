use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Byte offset of the first character
    pub offset: usize,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, offset: usize, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            offset,
            line,
            column,
        }
    }
}

/// All possible token types in minifn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Digit run too large for an `i64`; the parser reports it when reached
    Overflow(String),

    // Identifiers
    /// Identifier: letter or `_`, then letters, digits or `_`
    Identifier(String),

    // Keywords
    /// FN keyword
    Fn,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Star operator (*)
    Star,
    /// Slash operator (/)
    Slash,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Comma delimiter
    Comma,

    // Special
    /// Character outside the token set; the parser reports it when reached
    Unknown(char),
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(self, TokenKind::Fn)
    }

    /// Get keyword from a complete identifier-shaped word
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "fn" => Some(TokenKind::Fn),
            _ => None,
        }
    }

    /// Human-readable description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Integer(n) => format!("integer `{}`", n),
            TokenKind::Overflow(digits) => format!("integer `{}`", digits),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Unknown(c) => format!("unexpected character `{}`", c.escape_debug()),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Overflow(digits) => write!(f, "{}", digits),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            TokenKind::Fn => write!(f, "fn"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Unknown(c) => write!(f, "{}", c),
            TokenKind::Eof => Ok(()),
        }
    }
}
