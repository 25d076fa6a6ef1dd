//! Error types for minifn
//!
//! Each pipeline stage has its own error type so callers can match on the
//! stage that failed; [`Error`] wraps all of them for the [`crate::compiler`]
//! driver.

use thiserror::Error;

/// Syntax error produced by the parser.
///
/// **Triggered by:** source text that does not match the grammar, unconsumed
/// input after the last function, characters outside the token set, or an
/// integer literal that does not fit in an `i64`.
/// **Example:** `fn f( {1}` (missing `)` before the block)
///
/// The position is the furthest point the parser reached across every
/// alternative it tried, so it points at the offending token rather than at
/// the start of the enclosing production.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Syntax error at line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Byte offset into the source
    pub position: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
    /// What the grammar would have accepted at `position`
    pub expected: Vec<String>,
    /// Description of what was actually found
    pub found: String,
    /// Rendered description
    pub message: String,
}

impl ParseError {
    /// Build an "expected X, found Y" error
    pub fn expected(
        position: usize,
        line: usize,
        column: usize,
        expected: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        let found = found.into();
        let message = format!("expected {}, found {}", join_alternatives(&expected), found);
        ParseError {
            position,
            line,
            column,
            expected,
            found,
            message,
        }
    }

    /// Build an error with a free-form message and no expectation set
    pub fn custom(
        position: usize,
        line: usize,
        column: usize,
        found: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            position,
            line,
            column,
            expected: Vec::new(),
            found: found.into(),
            message: message.into(),
        }
    }
}

/// `a`, `a or b`, `a, b or c`
fn join_alternatives(items: &[String]) -> String {
    match items {
        [] => "nothing".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

/// Error raised by a target IR builder.
///
/// These indicate misuse of the builder (emitting without a position,
/// emitting after a terminator) rather than problems in the source program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// An emit call was made before `position_at_end`
    #[error("Builder is not positioned at a basic block")]
    NotPositioned,

    /// Handle does not refer to a live function
    #[error("Unknown function handle #{0}")]
    UnknownFunction(usize),

    /// Handle does not refer to a block of the function
    #[error("Unknown basic block #{block} in function #{function}")]
    UnknownBlock {
        /// Function handle index
        function: usize,
        /// Block index within the function
        block: usize,
    },

    /// Parameter index past the end of the parameter list
    #[error("Parameter index {index} out of range for function with {count} parameters")]
    ParamOutOfRange {
        /// Requested index
        index: usize,
        /// Declared parameter count
        count: usize,
    },

    /// Instruction appended after the block's return
    #[error("Basic block `{0}` already ends in a terminator")]
    BlockTerminated(String),
}

/// Semantic error produced while lowering the AST to IR.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    /// Reference to a name that is not a parameter of the enclosing function
    ///
    /// **Example:** `fn f(x) { x + z }`
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Division whose operands are both compile-time constants and whose
    /// divisor is zero
    ///
    /// **Example:** `fn f() { 4 / 0 }`
    /// Divisions involving a parameter are left to the target's runtime.
    #[error("Division by constant zero")]
    DivisionByZeroLiteral,

    /// The same name appears twice in one parameter list
    ///
    /// **Example:** `fn f(x, x) { x }`
    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    /// Two functions in one program share a name
    #[error("Duplicate function: {0}")]
    DuplicateFunction(String),

    /// The target IR builder rejected an operation
    #[error("IR builder error: {0}")]
    Builder(#[from] BuilderError),

    /// One or more functions of a program failed to lower
    #[error("{} function(s) failed to lower: {}", .0.len(), join_function_errors(.0))]
    Functions(Vec<FunctionError>),
}

impl LowerError {
    /// Flatten program-level errors into `(function, error)` pairs.
    ///
    /// A function-level error yields itself with no function name.
    pub fn flatten(&self) -> Vec<(Option<&str>, &LowerError)> {
        match self {
            LowerError::Functions(errors) => errors
                .iter()
                .map(|e| (Some(e.function.as_str()), &e.error))
                .collect(),
            other => vec![(None, other)],
        }
    }
}

fn join_function_errors(errors: &[FunctionError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A lowering failure attributed to one function of the program
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("in function `{function}`: {error}")]
pub struct FunctionError {
    /// Name of the function that failed
    pub function: String,
    /// The failure
    pub error: LowerError,
}

/// Runtime error raised by the IR interpreter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// No function with this name in the module
    #[error("Undefined function: {0}")]
    UndefinedFunction(String),

    /// Wrong number of arguments
    #[error("Function {function} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Function name
        function: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Integer division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// `i64::MIN / -1`
    #[error("Integer overflow in division")]
    DivisionOverflow,

    /// A register was read before any instruction wrote it
    #[error("Read of undefined register %{0}")]
    UndefinedRegister(u32),

    /// Execution fell off the end of the function
    #[error("Function {0} has no return")]
    MissingReturn(String),
}

/// minifn errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Source text did not match the grammar
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// AST could not be lowered
    #[error(transparent)]
    Lower(#[from] LowerError),

    /// Interpreter failure
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Driver-level failure (export, options)
    #[error("Compiler error: {0}")]
    CompilerError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The input itself is invalid; retrying cannot help
    Fatal,
    /// The module is fine but this particular run failed (e.g. bad arguments)
    Recoverable,
}

impl Error {
    /// Create a compiler error with a message
    pub fn compiler(msg: impl Into<String>) -> Self {
        Error::CompilerError(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Parse(_) | Error::Lower(_) | Error::CompilerError(_) => ErrorSeverity::Fatal,
            Error::Exec(_) => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for minifn operations
pub type Result<T> = std::result::Result<T, Error>;
