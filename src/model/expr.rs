//! Algebraic expressions for driven dimensions.
//!
//! Parametric builds do not bake numbers into sketches; they bind dimensions
//! to expressions over the user parameter table, such as `param_E/20` or
//! `abs((param_A - param_A1 - param_terminalThickness)/2)`. When a parameter
//! changes, re-evaluating the bound expressions is what moves the geometry.
//!
//! The grammar is deliberately small: `+ - * /`, unary minus, parentheses,
//! numeric literals (internal centimetre unit) and the functions `abs`,
//! `min`, `max`. Identifiers resolve through a caller-supplied lookup so the
//! parameter table can layer cycle detection on top.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing or evaluating a dimension expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A character the grammar does not know.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// Byte position in the source text.
        position: usize,
        /// The offending character.
        ch: char,
    },

    /// The expression ended mid-construct.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A token that cannot start or continue the current construct.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Byte position in the source text.
        position: usize,
        /// Text of the offending token.
        token: String,
    },

    /// An identifier with no value in the evaluation context.
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier {
        /// The unresolved identifier.
        name: String,
    },

    /// A call to a function the grammar does not provide.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// The unresolved function name.
        name: String,
    },

    /// A function called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    WrongArity {
        /// Function name.
        name: String,
        /// Number of arguments the function takes.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// Parameter expressions refer back to themselves.
    #[error("parameter '{name}' participates in an expression cycle")]
    Cycle {
        /// The parameter where the cycle was detected.
        name: String,
    },
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

/// A built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Func {
    /// Absolute value, one argument.
    Abs,
    /// Minimum of two arguments.
    Min,
    /// Maximum of two arguments.
    Max,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Self::Abs),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    const fn arity(self) -> usize {
        match self {
            Self::Abs => 1,
            Self::Min | Self::Max => 2,
        }
    }
}

/// A parsed dimension expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A numeric literal in the internal unit.
    Number(f64),
    /// A reference to a parameter.
    Ident(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A function call.
    Call {
        /// The function.
        func: Func,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parses an expression from its textual form.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let mut parser = Parser::new(source)?;
        let expr = parser.expression()?;
        parser.expect_end()?;
        Ok(expr)
    }

    /// Evaluates the expression, resolving identifiers through `lookup`.
    pub fn eval(
        &self,
        lookup: &mut dyn FnMut(&str) -> Result<f64, ExprError>,
    ) -> Result<f64, ExprError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Ident(name) => lookup(name),
            Self::Neg(inner) => Ok(-inner.eval(lookup)?),
            Self::Binary { op, lhs, rhs } => {
                let left = lhs.eval(lookup)?;
                let right = rhs.eval(lookup)?;
                Ok(match op {
                    BinOp::Add => left + right,
                    BinOp::Sub => left - right,
                    BinOp::Mul => left * right,
                    BinOp::Div => left / right,
                })
            }
            Self::Call { func, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.eval(lookup)?);
                }
                Ok(match func {
                    Func::Abs => values[0].abs(),
                    Func::Min => values[0].min(values[1]),
                    Func::Max => values[0].max(values[1]),
                })
            }
        }
    }

    /// Collects every identifier the expression references.
    #[must_use]
    pub fn identifiers(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Number(_) => {}
            Self::Ident(name) => {
                out.insert(name.clone());
            }
            Self::Neg(inner) => inner.collect_identifiers(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Ident(s) => s.clone(),
            Self::Plus => "+".to_string(),
            Self::Minus => "-".to_string(),
            Self::Star => "*".to_string(),
            Self::Slash => "/".to_string(),
            Self::LeftParen => "(".to_string(),
            Self::RightParen => ")".to_string(),
            Self::Comma => ",".to_string(),
        }
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, ExprError> {
        Ok(Self {
            tokens: tokenize(source)?,
            cursor: 0,
        })
    }

    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        while let Some((_, tok)) = self.peek() {
            let op = match tok {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.cursor += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        while let Some((_, tok)) = self.peek() {
            let op = match tok {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.cursor += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some((_, Token::Minus))) {
            self.cursor += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some((_, Token::Number(value))) => Ok(Expr::Number(value)),
            Some((_, Token::Ident(name))) => {
                if matches!(self.peek(), Some((_, Token::LeftParen))) {
                    self.cursor += 1;
                    let func = Func::from_name(&name)
                        .ok_or(ExprError::UnknownFunction { name: name.clone() })?;
                    let args = self.arguments()?;
                    if args.len() != func.arity() {
                        return Err(ExprError::WrongArity {
                            name,
                            expected: func.arity(),
                            got: args.len(),
                        });
                    }
                    Ok(Expr::Call { func, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some((_, Token::LeftParen)) => {
                let inner = self.expression()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some((position, tok)) => Err(ExprError::UnexpectedToken {
                position,
                token: tok.describe(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = vec![self.expression()?];
        while matches!(self.peek(), Some((_, Token::Comma))) {
            self.cursor += 1;
            args.push(self.expression()?);
        }
        self.expect(&Token::RightParen)?;
        Ok(args)
    }

    fn expect(&mut self, wanted: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some((_, ref tok)) if tok == wanted => Ok(()),
            Some((position, tok)) => Err(ExprError::UnexpectedToken {
                position,
                token: tok.describe(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expect_end(&mut self) -> Result<(), ExprError> {
        match self.advance() {
            None => Ok(()),
            Some((position, tok)) => Err(ExprError::UnexpectedToken {
                position,
                token: tok.describe(),
            }),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LeftParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RightParen));
                i += 1;
            }
            ',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let raw = &source[start..i];
                let value = raw.parse::<f64>().map_err(|_| ExprError::UnexpectedToken {
                    position: start,
                    token: raw.to_string(),
                })?;
                tokens.push((start, Token::Number(value)));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(source[start..i].to_string())));
            }
            other => {
                // Non-ASCII starts never match an arm above, so `i` is
                // always on a character boundary here.
                let ch = source[i..].chars().next().unwrap_or(other);
                return Err(ExprError::UnexpectedChar { position: i, ch });
            }
        }
    }
    Ok(tokens)
}
