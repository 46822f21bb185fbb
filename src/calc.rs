//! Integer arithmetic expressions, parsed with the expression builder.
//!
//! # Grammar
//! ```raw
//! expr ::= expr ('+' | '-') expr      -- left-associative, loosest
//!        | expr ('*' | '/' | '%') expr -- left-associative
//!        | '-' expr
//!        | expr '^' expr              -- right-associative, tightest
//!        | INT
//!        | VAR
//!        | '(' expr ')'
//! ```
//!
//! White space and Haskell-style comments (`--` and `{- -}`) may appear
//! between any two tokens.

use std::{collections::HashMap, fmt::Display};

use num_traits::{checked_pow, CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Num, ToPrimitive};
use parsekit::{
    combinator::eof,
    expr::{build_recursive_expression_parser, Assoc, Operator},
    language::LanguageDef,
    token::TokenParser,
    Parser, Text,
};
use thiserror::Error;

/// The numeric types an [`Expr`] can be evaluated in.
pub trait Integer:
    Num
    + CheckedAdd
    + CheckedSub
    + CheckedMul
    + CheckedDiv
    + ToPrimitive
    + From<u8>
    + From<i64>
    + PartialOrd
    + Clone
    + Display
    + Send
    + Sync
    + 'static
{
}

impl<N> Integer for N where
    N: Num
        + CheckedAdd
        + CheckedSub
        + CheckedMul
        + CheckedDiv
        + ToPrimitive
        + From<u8>
        + From<i64>
        + PartialOrd
        + Clone
        + Display
        + Send
        + Sync
        + 'static
{
}

/// An arithmetic expression.
///
/// The [`Display`] implementation on this type produces a lisp-style
/// s-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<N> {
    /// An integer literal.
    Int(N),
    /// A variable name.
    Var(String),
    /// Unary negation.
    Neg(Box<Self>),
    /// Addition.
    Add(Box<Self>, Box<Self>),
    /// Subtraction.
    Sub(Box<Self>, Box<Self>),
    /// Multiplication.
    Mul(Box<Self>, Box<Self>),
    /// Truncating division.
    Div(Box<Self>, Box<Self>),
    /// The remainder of truncating division.
    Rem(Box<Self>, Box<Self>),
    /// Exponentiation.
    Pow(Box<Self>, Box<Self>),
}

impl<N: Display> Display for Expr<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Int(int) => write!(f, "{int}"),
            Expr::Var(var) => write!(f, "{var}"),
            Expr::Neg(inner) => write!(f, "(- {inner})"),
            Expr::Add(lhs, rhs) => write!(f, "(+ {lhs} {rhs})"),
            Expr::Sub(lhs, rhs) => write!(f, "(- {lhs} {rhs})"),
            Expr::Mul(lhs, rhs) => write!(f, "(* {lhs} {rhs})"),
            Expr::Div(lhs, rhs) => write!(f, "(/ {lhs} {rhs})"),
            Expr::Rem(lhs, rhs) => write!(f, "(% {lhs} {rhs})"),
            Expr::Pow(lhs, rhs) => write!(f, "(^ {lhs} {rhs})"),
        }
    }
}

/// An error raised while evaluating an [`Expr`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A variable had no binding.
    #[error("the variable `{0}` is not bound")]
    UnboundVariable(String),
    /// The right operand of `/` or `%` was zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A result did not fit in the numeric type.
    #[error("arithmetic overflow")]
    Overflow,
    /// The right operand of `^` was negative.
    #[error("negative exponent")]
    NegativeExponent,
}

impl<N: Integer> Expr<N> {
    /// Evaluates `self`, looking variables up in `bindings`.
    pub fn eval(&self, bindings: &HashMap<String, N>) -> Result<N, EvalError> {
        match self {
            Expr::Int(int) => Ok(int.clone()),
            Expr::Var(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnboundVariable(name.clone())),
            Expr::Neg(inner) => N::zero()
                .checked_sub(&inner.eval(bindings)?)
                .ok_or(EvalError::Overflow),
            Expr::Add(lhs, rhs) => lhs
                .eval(bindings)?
                .checked_add(&rhs.eval(bindings)?)
                .ok_or(EvalError::Overflow),
            Expr::Sub(lhs, rhs) => lhs
                .eval(bindings)?
                .checked_sub(&rhs.eval(bindings)?)
                .ok_or(EvalError::Overflow),
            Expr::Mul(lhs, rhs) => lhs
                .eval(bindings)?
                .checked_mul(&rhs.eval(bindings)?)
                .ok_or(EvalError::Overflow),
            Expr::Div(lhs, rhs) => divide(lhs.eval(bindings)?, rhs.eval(bindings)?),
            Expr::Rem(lhs, rhs) => {
                let (lhs, rhs) = (lhs.eval(bindings)?, rhs.eval(bindings)?);
                let quotient = divide(lhs.clone(), rhs.clone())?;
                quotient
                    .checked_mul(&rhs)
                    .and_then(|product| lhs.checked_sub(&product))
                    .ok_or(EvalError::Overflow)
            }
            Expr::Pow(lhs, rhs) => {
                let exponent = rhs.eval(bindings)?;
                if exponent < N::zero() {
                    return Err(EvalError::NegativeExponent);
                }

                let exponent = exponent.to_usize().ok_or(EvalError::Overflow)?;
                checked_pow(lhs.eval(bindings)?, exponent).ok_or(EvalError::Overflow)
            }
        }
    }
}

/// Divides `lhs` by `rhs`, truncating towards zero.
fn divide<N: Integer>(lhs: N, rhs: N) -> Result<N, EvalError> {
    if rhs.is_zero() {
        return Err(EvalError::DivisionByZero);
    }

    lhs.checked_div(&rhs).ok_or(EvalError::Overflow)
}

/// Builds a parser for a complete expression, including leading white
/// space.
pub fn expr_parser<N: Integer>() -> Parser<Text, (), Expr<N>> {
    let lexer = TokenParser::new(LanguageDef::haskell_style());

    let binary = |op: &str, f: fn(Box<Expr<N>>, Box<Expr<N>>) -> Expr<N>, assoc| {
        Operator::infix(
            lexer.symbol(op),
            move |lhs: Expr<N>, rhs: Expr<N>| f(Box::new(lhs), Box::new(rhs)),
            assoc,
        )
    };

    let table = vec![
        vec![binary("^", Expr::Pow, Assoc::Right)],
        vec![Operator::prefix(lexer.symbol("-"), |inner: Expr<N>| {
            Expr::Neg(Box::new(inner))
        })],
        vec![
            binary("*", Expr::Mul, Assoc::Left),
            binary("/", Expr::Div, Assoc::Left),
            binary("%", Expr::Rem, Assoc::Left),
        ],
        vec![
            binary("+", Expr::Add, Assoc::Left),
            binary("-", Expr::Sub, Assoc::Left),
        ],
    ];

    let term_lexer = lexer.clone();
    let expr = build_recursive_expression_parser(table, move |expr| {
        term_lexer
            .parens(expr)
            .or(term_lexer.natural_of::<N>().map(Expr::Int))
            .or(term_lexer.identifier().map(Expr::Var))
            .label("expression")
    });

    lexer.white_space().then(expr).skip(eof())
}

/// Parses `source` (named `name` in errors) as an expression.
pub fn parse<N: Integer>(name: &str, source: &str) -> Result<Expr<N>, parsekit::ParseError> {
    expr_parser().parse(name, source)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;

    fn eval(source: &str) -> Result<i64, EvalError> {
        let bindings = HashMap::from([("x".to_owned(), 5), ("y".to_owned(), -2)]);
        parse::<i64>("test", source).unwrap().eval(&bindings)
    }

    #[test]
    fn parenthesised_subtraction_evaluates_to_zero() {
        assert_eq!(eval("3-(1+2)"), Ok(0));
    }

    #[test]
    fn s_expressions_show_structure() {
        let expr = parse::<i64>("test", "1 + 2 * x ^ 2 ^ 3 - -y").unwrap();
        assert_eq!(expr.to_string(), "(- (+ 1 (* 2 (^ x (^ 2 3)))) (- y))");
    }

    #[test]
    fn evaluation_is_correct() {
        assert_eq!(eval("x * (x - 1) / 2"), Ok(10));
        assert_eq!(eval("-7 % 3"), Ok(-1));
        assert_eq!(eval("7 % -3"), Ok(1));
        assert_eq!(eval("2 ^ 10"), Ok(1024));
        assert_eq!(eval("-2 ^ 2"), Ok(-4));
        assert_eq!(eval("2 * -3"), Ok(-6));
        assert_eq!(eval("  {- comment -} x -- trailing\n + y"), Ok(3));
    }

    #[test]
    fn evaluation_errors_are_reported() {
        assert_eq!(eval("1 / (x - 5)"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("z + 1"), Err(EvalError::UnboundVariable("z".into())));
        assert_eq!(eval("2 ^ y"), Err(EvalError::NegativeExponent));
        assert_eq!(eval("2 ^ 64"), Err(EvalError::Overflow));
        assert_eq!(eval("9223372036854775807 + 1"), Err(EvalError::Overflow));
    }

    #[test]
    fn bigint_evaluation_does_not_overflow() {
        let expr = parse::<BigInt>("test", "2 ^ 64").unwrap();
        let value = expr.eval(&HashMap::new()).unwrap();
        assert_eq!(value.to_string(), "18446744073709551616");
    }

    #[test]
    fn syntax_errors_are_positioned() {
        let error = parse::<i64>("test", "1 + * 2").unwrap_err();
        dbg!(&error);
        assert_eq!(error.position().column(), 5);
        assert!(error
            .messages()
            .contains(&parsekit::Message::Expected("expression".into())));

        assert!(parse::<i64>("test", "(1 + 2").is_err());
        assert!(parse::<i64>("test", "1 2").is_err());
    }
}
