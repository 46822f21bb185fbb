//! Permutation parsers: a fixed set of parsers matched in any order.

use std::sync::Arc;

use crate::{
    combinator::choice,
    parser::{pure, pure_with, Parser},
    stream::Stream,
};

/// One member of a [`Permutation`].
struct Element<S, U, T> {
    /// Recognises the member.
    parser: Parser<S, U, T>,
    /// Stands in for the member if it does not occur.
    default: Option<T>,
}

/// A set of parsers that may occur in any order, each at most once.
///
/// The combined parser yields the results in declaration order, however the
/// members were ordered in the input:
///
/// ```
/// use parsekit::{character::char, perm::Permutation, stream::Text};
///
/// let p = Permutation::<Text, (), char>::new()
///     .required(char('a'))
///     .required(char('b'))
///     .optional(char('c'), '-')
///     .build();
/// assert_eq!(p.parse("", "ba").unwrap(), vec!['a', 'b', '-']);
/// ```
pub struct Permutation<S, U, T> {
    /// The members, in declaration order.
    elements: Vec<Element<S, U, T>>,
}

impl<S, U, T> Default for Permutation<S, U, T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<S, U, T> Permutation<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// An empty permutation, which accepts the empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member that must occur.
    pub fn required(mut self, parser: Parser<S, U, T>) -> Self {
        self.elements.push(Element {
            parser,
            default: None,
        });
        self
    }

    /// Adds a member that may be absent, in which case `default` is used.
    pub fn optional(mut self, parser: Parser<S, U, T>, default: T) -> Self {
        self.elements.push(Element {
            parser,
            default: Some(default),
        });
        self
    }

    /// Builds a parser accepting the members in any order.
    pub fn build(self) -> Parser<S, U, Vec<T>> {
        self.build_with(None)
    }

    /// Builds a parser accepting the members in any order, separated by
    /// `sep`.
    pub fn build_separated<V: 'static>(self, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>> {
        self.build_with(Some(sep.map(|_| ())))
    }

    /// Builds the parser, with an optional separator.
    fn build_with(self, sep: Option<Parser<S, U, ()>>) -> Parser<S, U, Vec<T>> {
        let elements: Arc<[Element<S, U, T>]> = self.elements.into();
        let remaining = (0..elements.len()).collect();

        step(&elements, remaining, sep, true).map(|mut found| {
            found.sort_by_key(|(index, _)| *index);
            found.into_iter().map(|(_, value)| value).collect()
        })
    }
}

/// Parses the members listed in `remaining`, returning each result with
/// its declaration index.
///
/// When every remaining member has a default, the defaults are accepted in
/// place of the rest of the permutation.
fn step<S, U, T>(
    elements: &Arc<[Element<S, U, T>]>,
    remaining: Vec<usize>,
    sep: Option<Parser<S, U, ()>>,
    first: bool,
) -> Parser<S, U, Vec<(usize, T)>>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    if remaining.is_empty() {
        return pure_with(Vec::new);
    }

    let branches = remaining.iter().map(|&index| {
        let rest: Vec<usize> = remaining.iter().copied().filter(|&i| i != index).collect();
        let elements_ref = Arc::clone(elements);
        let sep = sep.clone();

        elements[index].parser.clone().and_then(move |value| {
            step(&elements_ref, rest.clone(), sep.clone(), false).map(move |mut found| {
                found.push((index, value.clone()));
                found
            })
        })
    });

    let mut parser = choice(branches.collect::<Vec<_>>());
    if let (false, Some(sep)) = (first, &sep) {
        parser = sep.clone().then(parser);
    }

    let defaults: Option<Vec<(usize, T)>> = remaining
        .iter()
        .map(|&i| elements[i].default.clone().map(|value| (i, value)))
        .collect();

    match defaults {
        Some(defaults) => parser.or(pure(defaults)),
        None => parser,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        character::{char, digit, string},
        combinator::{eof, many1},
        error::Message,
        stream::Text,
    };

    use super::*;

    type P<T> = Parser<Text, (), T>;

    fn abc() -> P<String> {
        Permutation::new()
            .required(char('a'))
            .required(char('b'))
            .required(char('c'))
            .build()
            .map(|chars| chars.into_iter().collect())
    }

    #[test]
    fn any_order_yields_declaration_order() {
        let p = abc().skip(eof());
        for input in ["abc", "acb", "bac", "bca", "cab", "cba"] {
            assert_eq!(p.parse("t", input).unwrap(), "abc");
        }
    }

    #[test]
    fn missing_required_member_fails() {
        let error = abc().parse("t", "ab").unwrap_err();
        assert_eq!(error.position().column(), 3);
        assert!(error.messages().contains(&Message::Expected("\"c\"".into())));

        assert!(abc().parse("t", "aab").is_err());
    }

    #[test]
    fn defaults_stand_in_for_absent_members() {
        let p: P<Vec<char>> = Permutation::new()
            .optional(char('x'), '-')
            .required(char('a'))
            .optional(char('y'), '_')
            .build()
            .skip(eof());
        assert_eq!(p.parse("t", "a").unwrap(), vec!['-', 'a', '_']);
        assert_eq!(p.parse("t", "ya").unwrap(), vec!['-', 'a', 'y']);
        assert_eq!(p.parse("t", "axy").unwrap(), vec!['x', 'a', 'y']);
        assert!(p.parse("t", "xy").is_err());
    }

    #[test]
    fn members_may_be_separated() {
        let p: P<Vec<String>> = Permutation::new()
            .required(string("key"))
            .required(many1(digit()).map(|ds| ds.into_iter().collect()))
            .optional(string("flag"), String::new())
            .build_separated(char(','))
            .skip(eof());
        assert_eq!(p.parse("t", "42,key").unwrap(), vec!["key", "42", ""]);
        assert_eq!(p.parse("t", "flag,42,key").unwrap(), vec!["key", "42", "flag"]);
        assert!(p.parse("t", "42key").is_err());
    }

    #[test]
    fn empty_permutation_accepts_nothing() {
        let p: P<Vec<char>> = Permutation::new().build();
        assert!(p.parse("t", "").unwrap().is_empty());
    }
}
