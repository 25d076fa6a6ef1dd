use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete minifn program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Program {
    /// Function definitions in declaration order
    pub functions: Vec<Function>,
}

impl Program {
    /// First function with the given name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Function definition: `fn name(a, b) { expr }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Parameter names in declared order
    pub params: Vec<String>,
    /// Function body
    pub body: Block,
}

/// Function body: exactly one return expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Expression whose value the function returns
    pub ret: Expression,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Integer division (/)
    Div,
}

impl Operator {
    /// Source character for this operator
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    /// `*` and `/` bind tighter than `+` and `-`
    pub fn is_multiplicative(&self) -> bool {
        matches!(self, Operator::Mul | Operator::Div)
    }
}

/// Smallest expression unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Atom {
    /// Integer literal
    IntegerLiteral(i64),
    /// Reference to a parameter
    VariableRef(String),
    /// Sub-expression, owned through a box to break the Atom/Expression cycle
    NestedExpression(Box<Expression>),
}

/// Operator applied to the running value with its right-hand operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// The operator
    pub op: Operator,
    /// Right-hand operand
    pub operand: Atom,
}

/// `first` followed by operations folded left to right.
///
/// The parser produces two shapes. A multiplicative expression only uses
/// `*` and `/` on plain atoms. An additive expression only uses `+` and `-`,
/// and `first` and every operand are multiplicative expressions wrapped in
/// [`Atom::NestedExpression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Initial value
    pub first: Atom,
    /// Operations applied in order
    pub rest: Vec<Operation>,
}

impl Expression {
    /// Expression consisting of a single atom
    pub fn atom(atom: Atom) -> Self {
        Expression {
            first: atom,
            rest: Vec::new(),
        }
    }

    /// `atom (op atom)*` with `*` and `/`
    pub fn multiplicative(first: Atom, rest: Vec<(Operator, Atom)>) -> Self {
        debug_assert!(rest.iter().all(|(op, _)| op.is_multiplicative()));
        Expression {
            first,
            rest: rest
                .into_iter()
                .map(|(op, operand)| Operation { op, operand })
                .collect(),
        }
    }

    /// `mulExpr (op mulExpr)*` with `+` and `-`
    pub fn additive(first: Expression, rest: Vec<(Operator, Expression)>) -> Self {
        debug_assert!(rest.iter().all(|(op, _)| !op.is_multiplicative()));
        Expression {
            first: Atom::NestedExpression(Box::new(first)),
            rest: rest
                .into_iter()
                .map(|(op, operand)| Operation {
                    op,
                    operand: Atom::NestedExpression(Box::new(operand)),
                })
                .collect(),
        }
    }

    /// Every atom of this expression, `first` then each operand
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|op| &op.operand))
    }

    /// Deepest chain of nested expressions below this one
    pub fn depth(&self) -> usize {
        self.atoms()
            .map(|atom| match atom {
                Atom::NestedExpression(inner) => 1 + inner.depth(),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// True when no variable is referenced anywhere inside
    pub fn is_constant(&self) -> bool {
        self.atoms().all(|atom| match atom {
            Atom::IntegerLiteral(_) => true,
            Atom::VariableRef(_) => false,
            Atom::NestedExpression(inner) => inner.is_constant(),
        })
    }
}

// Rendering back to source. Nested atoms are parenthesized only inside a
// multiplicative expression; at the additive level they are the implicit
// multiplicative operands, so printing then re-parsing gives the same tree.

fn fmt_mul_atom(atom: &Atom, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match atom {
        Atom::IntegerLiteral(n) => write!(f, "{}", n),
        Atom::VariableRef(name) => write!(f, "{}", name),
        Atom::NestedExpression(inner) => {
            write!(f, "(")?;
            fmt_multiplicative(inner, f)?;
            write!(f, ")")
        }
    }
}

fn fmt_multiplicative(expr: &Expression, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt_mul_atom(&expr.first, f)?;
    for operation in &expr.rest {
        write!(f, " {} ", operation.op.symbol())?;
        fmt_mul_atom(&operation.operand, f)?;
    }
    Ok(())
}

fn fmt_add_operand(atom: &Atom, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match atom {
        Atom::NestedExpression(inner) => fmt_multiplicative(inner, f),
        other => fmt_mul_atom(other, f),
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_mul_atom(self, f)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Renders as a block-level (additive) expression
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_add_operand(&self.first, f)?;
        for operation in &self.rest {
            write!(f, " {} ", operation.op)?;
            fmt_add_operand(&operation.operand, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} }}", self.ret)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}({}) {}", self.name, self.params.join(", "), self.body)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Atom {
        Atom::IntegerLiteral(n)
    }

    fn var(name: &str) -> Atom {
        Atom::VariableRef(name.to_string())
    }

    #[test]
    fn test_additive_wraps_operands() {
        let expr = Expression::additive(
            Expression::atom(int(1)),
            vec![(
                Operator::Add,
                Expression::multiplicative(int(2), vec![(Operator::Mul, int(3))]),
            )],
        );

        assert!(matches!(expr.first, Atom::NestedExpression(_)));
        assert!(matches!(expr.rest[0].operand, Atom::NestedExpression(_)));
        assert_eq!(expr.to_string(), "1 + 2 * 3");
    }

    #[test]
    fn test_parenthesized_nesting_prints_parens() {
        let inner = Expression::multiplicative(var("a"), vec![(Operator::Mul, var("b"))]);
        let mul = Expression::multiplicative(
            var("x"),
            vec![(Operator::Div, Atom::NestedExpression(Box::new(inner)))],
        );
        let expr = Expression::additive(mul, vec![]);
        assert_eq!(expr.to_string(), "x / (a * b)");
    }

    #[test]
    fn test_depth_and_constness() {
        let leaf = Expression::multiplicative(int(4), vec![(Operator::Div, int(2))]);
        let expr = Expression::additive(leaf, vec![(Operator::Sub, Expression::atom(var("n")))]);

        assert_eq!(expr.depth(), 1);
        assert!(!expr.is_constant());
        assert!(Expression::atom(int(7)).is_constant());
        assert_eq!(Expression::atom(int(7)).depth(), 0);
    }

    #[test]
    fn test_function_display() {
        let function = Function {
            name: "add".to_string(),
            params: vec!["x".to_string(), "y".to_string()],
            body: Block {
                ret: Expression::additive(
                    Expression::atom(var("x")),
                    vec![(Operator::Add, Expression::atom(var("y")))],
                ),
            },
        };
        assert_eq!(function.to_string(), "fn add(x, y) { x + y }");

        let program = Program {
            functions: vec![function.clone(), function],
        };
        assert_eq!(program.to_string().lines().count(), 2);
        assert!(program.function("add").is_some());
        assert!(program.function("sub").is_none());
    }
}
