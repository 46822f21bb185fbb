//! An operator-precedence expression parser builder.
//!
//! An [`OperatorTable`] lists precedence levels from the tightest-binding to
//! the loosest. [`build_expression_parser`] wraps the term parser in one layer
//! per level, so each level's operands are expressions of the levels above.

use std::sync::Arc;

use crate::{
    combinator::{choice, many},
    parser::{attempt, fail, pure, pure_with, Parser},
    stream::Stream,
};

/// A binary operator function produced by an infix operator parser.
pub type BinaryFn<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// A unary operator function produced by a prefix or postfix operator parser.
pub type UnaryFn<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// The associativity of an infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// `a op b op c` is an error.
    None,
    /// `a op b op c` means `(a op b) op c`.
    Left,
    /// `a op b op c` means `a op (b op c)`.
    Right,
}

impl Assoc {
    /// The word used in ambiguity errors.
    fn describe(self) -> &'static str {
        match self {
            Assoc::None => "non",
            Assoc::Left => "left",
            Assoc::Right => "right",
        }
    }
}

/// A single entry in an [`OperatorTable`].
pub enum Operator<S, U, T> {
    /// A binary operator with the given associativity.
    Infix(Parser<S, U, BinaryFn<T>>, Assoc),
    /// A unary operator in front of its operand.
    Prefix(Parser<S, U, UnaryFn<T>>),
    /// A unary operator after its operand.
    Postfix(Parser<S, U, UnaryFn<T>>),
}

impl<S, U, T> Operator<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    /// An infix operator recognised by `op` and applying `f`.
    pub fn infix<V, F>(op: Parser<S, U, V>, f: F, assoc: Assoc) -> Self
    where
        V: 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let f: BinaryFn<T> = Arc::new(f);
        Operator::Infix(op.map(move |_| Arc::clone(&f)), assoc)
    }

    /// A prefix operator recognised by `op` and applying `f`.
    pub fn prefix<V, F>(op: Parser<S, U, V>, f: F) -> Self
    where
        V: 'static,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        let f: UnaryFn<T> = Arc::new(f);
        Operator::Prefix(op.map(move |_| Arc::clone(&f)))
    }

    /// A postfix operator recognised by `op` and applying `f`.
    pub fn postfix<V, F>(op: Parser<S, U, V>, f: F) -> Self
    where
        V: 'static,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        let f: UnaryFn<T> = Arc::new(f);
        Operator::Postfix(op.map(move |_| Arc::clone(&f)))
    }
}

/// Precedence levels, tightest-binding first.
pub type OperatorTable<S, U, T> = Vec<Vec<Operator<S, U, T>>>;

/// Builds an expression parser from `table` around `term`.
///
/// Prefix and postfix operators apply at most once per operand. Mixing
/// infix operators of different associativity on one level, or chaining a
/// non-associative operator, fails with an "ambiguous use" message.
pub fn build_expression_parser<S, U, T>(
    table: OperatorTable<S, U, T>,
    term: Parser<S, U, T>,
) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    table
        .into_iter()
        .fold(term, |term, operators| Level::new(term, operators).parser())
}

/// Builds an expression parser whose term may refer to the expression
/// itself, e.g. for parenthesised sub-expressions.
pub fn build_recursive_expression_parser<S, U, T, F>(
    table: OperatorTable<S, U, T>,
    term: F,
) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
    F: FnOnce(Parser<S, U, T>) -> Parser<S, U, T>,
{
    crate::combinator::recursive(move |expr| build_expression_parser(table, term(expr)))
}

/// One precedence level, split by operator kind.
struct Level<S, U, T> {
    /// An operand with its optional prefix and postfix operators applied.
    term: Parser<S, U, T>,
    /// Any right-associative operator.
    right: Parser<S, U, BinaryFn<T>>,
    /// Any left-associative operator.
    left: Parser<S, U, BinaryFn<T>>,
    /// Any non-associative operator.
    non: Parser<S, U, BinaryFn<T>>,
    /// Fails if a right-associative operator follows.
    ambiguous_right: Parser<S, U, T>,
    /// Fails if a left-associative operator follows.
    ambiguous_left: Parser<S, U, T>,
    /// Fails if a non-associative operator follows.
    ambiguous_non: Parser<S, U, T>,
}

impl<S, U, T> Level<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Splits `operators` by kind and wraps `term` in the prefix and postfix
    /// operators of this level.
    fn new(term: Parser<S, U, T>, operators: Vec<Operator<S, U, T>>) -> Arc<Self> {
        let mut right = Vec::new();
        let mut left = Vec::new();
        let mut non = Vec::new();
        let mut prefix = Vec::new();
        let mut postfix = Vec::new();

        for operator in operators {
            match operator {
                Operator::Infix(op, Assoc::Right) => right.push(op),
                Operator::Infix(op, Assoc::Left) => left.push(op),
                Operator::Infix(op, Assoc::None) => non.push(op),
                Operator::Prefix(op) => prefix.push(op),
                Operator::Postfix(op) => postfix.push(op),
            }
        }

        let identity = || pure_with(|| Arc::new(|x: T| x) as UnaryFn<T>);
        let prefix = choice(prefix).label("").or(identity());
        let postfix = choice(postfix).label("").or(identity());
        let term = prefix
            .pair(term)
            .pair(postfix)
            .map(|((pre, x), post)| post(pre(x)));

        let right = choice(right);
        let left = choice(left);
        let non = choice(non);

        Arc::new(Self {
            term,
            ambiguous_right: ambiguous(Assoc::Right, right.clone()),
            ambiguous_left: ambiguous(Assoc::Left, left.clone()),
            ambiguous_non: ambiguous(Assoc::None, non.clone()),
            right,
            left,
            non,
        })
    }

    /// The parser for a whole level.
    fn parser(self: Arc<Self>) -> Parser<S, U, T> {
        self.term.clone().and_then(move |x| {
            self.right_assoc(x.clone())
                .or(self.left_assoc(x.clone()))
                .or(self.non_assoc(x.clone()))
                .or(pure(x))
                .label("operator")
        })
    }

    /// `x` followed by one or more right-associative applications.
    ///
    /// The operands are collected first and folded from the right, so long
    /// chains do not nest parsers.
    fn right_assoc(self: &Arc<Self>, x: T) -> Parser<S, U, T> {
        let level = Arc::clone(self);
        let step = self.right.clone().pair(self.term.clone());
        step.clone()
            .zip_with(many(step), move |first, rest| {
                let mut operands = std::iter::once(first).chain(rest).rev();
                match operands.next() {
                    None => x.clone(),
                    Some((f_last, last)) => {
                        let (f, right) = operands
                            .fold((f_last, last), |(f_next, acc), (f, y)| (f, f_next(y, acc)));
                        f(x.clone(), right)
                    }
                }
            })
            .and_then(move |x| level.trailing(Assoc::Right, x))
            .or(self.ambiguous_left.clone())
            .or(self.ambiguous_non.clone())
    }

    /// `x` followed by one or more left-associative applications.
    fn left_assoc(self: &Arc<Self>, x: T) -> Parser<S, U, T> {
        let level = Arc::clone(self);
        let step = self.left.clone().pair(self.term.clone());
        step.clone()
            .zip_with(many(step), move |(f, y), rest| {
                rest.into_iter()
                    .fold(f(x.clone(), y), |acc, (g, z)| g(acc, z))
            })
            .and_then(move |x| level.trailing(Assoc::Left, x))
            .or(self.ambiguous_right.clone())
            .or(self.ambiguous_non.clone())
    }

    /// Accepts the end of an `assoc` chain ending in `x`, failing if an
    /// operator of a conflicting associativity follows.
    fn trailing(&self, assoc: Assoc, x: T) -> Parser<S, U, T> {
        let conflicts = match assoc {
            Assoc::Right => [self.ambiguous_left.clone(), self.ambiguous_non.clone()],
            Assoc::Left | Assoc::None => [self.ambiguous_right.clone(), self.ambiguous_non.clone()],
        };
        choice(conflicts).or(pure(x))
    }

    /// `x` followed by exactly one non-associative application.
    fn non_assoc(self: &Arc<Self>, x: T) -> Parser<S, U, T> {
        let level = Arc::clone(self);
        self.non
            .clone()
            .pair(self.term.clone())
            .and_then(move |(f, y)| {
                level
                    .ambiguous_right
                    .clone()
                    .or(level.ambiguous_left.clone())
                    .or(level.ambiguous_non.clone())
                    .or(pure(f(x.clone(), y)))
            })
    }
}

/// Fails without consuming input if `op` matches, reporting an ambiguous
/// use of an operator with associativity `assoc`.
fn ambiguous<S, U, T, V>(assoc: Assoc, op: Parser<S, U, V>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    attempt(op.then(fail(format!(
        "ambiguous use of a {} associative operator",
        assoc.describe()
    ))))
}
