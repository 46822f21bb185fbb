//! Repetition and sequencing combinators derived from the parser core.
//!
//! Every repetition in this module is driven by [`many_accum`], which treats
//! a repeated parser that succeeds without consuming input as a programming
//! error and panics rather than looping forever.

use std::{
    any::Any,
    fmt::Debug,
    sync::{Arc, OnceLock},
};

use tracing::error;

use crate::{
    character::show_char,
    error::{Message, ParseError},
    parser::{any_token, empty, pure, pure_with, Parser},
    state::{Consumed, Reply, State},
    stream::Stream,
};

/// Runs `parser` zero or more times, folding each result into an
/// accumulator that starts at `init()`.
///
/// The loop stops at the first failure that did not consume input. A failure
/// after consuming input is propagated as-is.
///
/// # Panics
/// Panics when `parser` succeeds without consuming input, since the loop
/// would otherwise never terminate.
pub fn many_accum<S, U, T, A, I, F>(parser: Parser<S, U, T>, init: I, combine: F) -> Parser<S, U, A>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    A: 'static,
    I: Fn() -> A + Send + Sync + 'static,
    F: Fn(A, T) -> A + Send + Sync + 'static,
{
    Parser::new(move |mut state: State<S, U>| {
        let mut acc = init();
        let mut consumed = false;

        loop {
            match parser.parse_state(state.clone()) {
                Consumed::Consumed(Reply::Ok(value, next, _)) => {
                    acc = combine(acc, value);
                    state = next;
                    consumed = true;
                }
                Consumed::Consumed(Reply::Error(error)) => {
                    return Consumed::Consumed(Reply::Error(error))
                }
                Consumed::Empty(Reply::Ok(..)) => {
                    error!(position = %state.position, "repeated parser accepted empty input");
                    panic!("combinator 'many' is applied to a parser that accepts an empty string")
                }
                Consumed::Empty(Reply::Error(error)) => {
                    return Consumed::tagged(consumed, Reply::Ok(acc, state, error))
                }
            }
        }
    })
}

/// Runs `parser` zero or more times, collecting the results.
pub fn many<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    many_accum(parser, Vec::new, |mut items, item| {
        items.push(item);
        items
    })
}

/// Runs `parser` one or more times, collecting the results.
pub fn many1<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parser.clone().zip_with(many(parser), prepend)
}

/// Runs `parser` zero or more times, discarding the results.
pub fn skip_many<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    many_accum(parser, || (), |(), _| ())
}

/// Runs `parser` one or more times, discarding the results.
pub fn skip_many1<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parser.clone().then(skip_many(parser))
}

/// Puts `first` in front of `rest`.
fn prepend<T>(first: T, rest: Vec<T>) -> Vec<T> {
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest);
    items
}

/// Parses zero or more `parser`s separated by `sep`.
pub fn sep_by<S, U, T, V>(parser: Parser<S, U, T>, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    sep_by1(parser, sep).or(pure_with(Vec::new))
}

/// Parses one or more `parser`s separated by `sep`.
pub fn sep_by1<S, U, T, V>(parser: Parser<S, U, T>, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    parser.clone().zip_with(many(sep.then(parser)), prepend)
}

/// Parses zero or more `parser`s, each followed by `sep`.
pub fn end_by<S, U, T, V>(parser: Parser<S, U, T>, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    many(parser.skip(sep))
}

/// Parses one or more `parser`s, each followed by `sep`.
pub fn end_by1<S, U, T, V>(parser: Parser<S, U, T>, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    many1(parser.skip(sep))
}

/// Parses zero or more `parser`s separated by `sep`, with an optional
/// trailing `sep`.
pub fn sep_end_by<S, U, T, V>(parser: Parser<S, U, T>, sep: Parser<S, U, V>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    sep_end_by1(parser, sep).or(pure_with(Vec::new))
}

/// Parses one or more `parser`s separated by `sep`, with an optional
/// trailing `sep`.
///
/// # Panics
/// Panics when `sep` and `parser` both succeed without consuming input.
pub fn sep_end_by1<S, U, T, V>(
    parser: Parser<S, U, T>,
    sep: Parser<S, U, V>,
) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    V: 'static,
{
    Parser::new(move |state: State<S, U>| {
        let (first, mut state, mut error, mut consumed) = match parser.parse_state(state) {
            Consumed::Consumed(Reply::Ok(item, next, error)) => (item, next, error, true),
            Consumed::Empty(Reply::Ok(item, next, error)) => (item, next, error, false),
            failure => return failure.map(|reply| reply.map(|item| vec![item])),
        };
        let mut items = vec![first];

        loop {
            let (after_sep, sep_error, sep_consumed) = match sep.parse_state(state.clone()) {
                Consumed::Consumed(Reply::Ok(_, next, sep_error)) => (next, sep_error, true),
                Consumed::Empty(Reply::Ok(_, next, sep_error)) => {
                    (next, error.merge(sep_error), false)
                }
                Consumed::Consumed(Reply::Error(sep_error)) => {
                    return Consumed::Consumed(Reply::Error(sep_error))
                }
                Consumed::Empty(Reply::Error(sep_error)) => {
                    return Consumed::tagged(consumed, Reply::Ok(items, state, error.merge(sep_error)))
                }
            };
            consumed |= sep_consumed;

            match parser.parse_state(after_sep.clone()) {
                Consumed::Consumed(Reply::Ok(item, next, next_error)) => {
                    items.push(item);
                    state = next;
                    error = next_error;
                    consumed = true;
                }
                Consumed::Empty(Reply::Ok(item, next, next_error)) => {
                    if !sep_consumed {
                        error!(position = %state.position, "separated parsers accepted empty input");
                        panic!("combinator 'sep_end_by' is applied to parsers that accept an empty string")
                    }
                    items.push(item);
                    state = next;
                    error = sep_error.merge(next_error);
                }
                Consumed::Consumed(Reply::Error(next_error)) => {
                    return Consumed::Consumed(Reply::Error(next_error))
                }
                Consumed::Empty(Reply::Error(next_error)) => {
                    return Consumed::tagged(
                        consumed,
                        Reply::Ok(items, after_sep, sep_error.merge(next_error)),
                    )
                }
            }
        }
    })
}

/// Runs `parser` exactly `n` times.
pub fn count<S, U, T>(n: usize, parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    (0..n).fold(pure_with(Vec::new), |acc, _| {
        acc.zip_with(parser.clone(), |mut items, item| {
            items.push(item);
            items
        })
    })
}

/// Parses `open`, then `parser`, then `close`, returning the result of
/// `parser`.
pub fn between<S, U, O, C, T>(
    open: Parser<S, U, O>,
    close: Parser<S, U, C>,
    parser: Parser<S, U, T>,
) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    O: 'static,
    C: 'static,
    T: 'static,
{
    open.then(parser).skip(close)
}

/// Runs `parser`, or returns `default` if it fails without consuming.
pub fn option<S, U, T>(default: T, parser: Parser<S, U, T>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    parser.or(pure(default))
}

/// Runs `parser`, returning `None` if it fails without consuming.
pub fn option_maybe<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, Option<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parser.map(Some).or(pure_with(|| None))
}

/// Runs `parser` if possible and discards its result.
pub fn optional<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parser.map(|_| ()).or(pure(()))
}

/// Tries each parser in order, as with [`Parser::or`]. An empty list fails
/// with an unknown error.
pub fn choice<S, U, T>(parsers: impl IntoIterator<Item = Parser<S, U, T>>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parsers.into_iter().reduce(Parser::or).unwrap_or_else(empty)
}

/// Parses one or more `parser`s separated by `op`, combining them
/// left-associatively with the functions returned by `op`.
pub fn chainl1<S, U, T, F>(parser: Parser<S, U, T>, op: Parser<S, U, F>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    F: Fn(T, T) -> T + 'static,
{
    parser
        .clone()
        .zip_with(many(op.pair(parser)), |first, rest| {
            rest.into_iter().fold(first, |acc, (f, item)| f(acc, item))
        })
}

/// Parses one or more `parser`s separated by `op`, combining them
/// right-associatively with the functions returned by `op`.
pub fn chainr1<S, U, T, F>(parser: Parser<S, U, T>, op: Parser<S, U, F>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    F: Fn(T, T) -> T + 'static,
{
    parser
        .clone()
        .zip_with(many(op.pair(parser)), |first, rest| {
            let mut rest = rest.into_iter().rev();
            match rest.next() {
                None => first,
                Some(last) => {
                    let (f, right) =
                        rest.fold(last, |(f_next, acc), (f, item)| (f, f_next(item, acc)));
                    f(first, right)
                }
            }
        })
}

/// Like [`chainl1`], but returns `default` when there is no operand.
pub fn chainl<S, U, T, F>(parser: Parser<S, U, T>, op: Parser<S, U, F>, default: T) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + 'static,
{
    chainl1(parser, op).or(pure(default))
}

/// Like [`chainr1`], but returns `default` when there is no operand.
pub fn chainr<S, U, T, F>(parser: Parser<S, U, T>, op: Parser<S, U, F>, default: T) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + 'static,
{
    chainr1(parser, op).or(pure(default))
}

/// Succeeds without consuming input only if `parser` fails.
///
/// This is the longest-match guard: `string("let").skip(not_followed_by(alpha_num()))`
/// accepts the keyword but not the prefix of `letter`. The error names the
/// value `parser` accepted and points at where it started.
pub fn not_followed_by<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
    T: Debug + 'static,
{
    Parser::new(move |state: State<S, U>| match parser.parse_state(state.clone()) {
        Consumed::Consumed(Reply::Ok(value, ..)) | Consumed::Empty(Reply::Ok(value, ..)) => {
            let message = Message::Unexpected(describe_value(&value));
            Consumed::Empty(Reply::Error(ParseError::new_message(state.position, message)))
        }
        Consumed::Consumed(Reply::Error(_)) | Consumed::Empty(Reply::Error(_)) => {
            let error = ParseError::new_unknown(state.position.clone());
            Consumed::Empty(Reply::Ok((), state, error))
        }
    })
}

/// Describes `value` for an error message, quoting chars the way the
/// character parsers do.
fn describe_value<T: Debug + 'static>(value: &T) -> String {
    match (value as &dyn Any).downcast_ref::<char>() {
        Some(&c) => show_char(c),
        None => format!("{value:?}"),
    }
}

/// Succeeds only at the end of the input.
pub fn eof<S, U>() -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
{
    not_followed_by(any_token()).label("end of input")
}

/// Runs `parser` zero or more times until `end` succeeds, returning the
/// results of `parser`.
///
/// `end` is tried first at every step, so `parser` never sees the input
/// `end` accepts.
///
/// # Panics
/// Panics when `parser` succeeds without consuming input where `end` fails.
pub fn many_till<S, U, T, E>(parser: Parser<S, U, T>, end: Parser<S, U, E>) -> Parser<S, U, Vec<T>>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    E: 'static,
{
    Parser::new(move |mut state: State<S, U>| {
        let mut items = Vec::new();
        let mut consumed = false;
        let mut error = ParseError::new_unknown(state.position.clone());

        loop {
            let end_error = match end.parse_state(state.clone()) {
                Consumed::Consumed(Reply::Ok(_, next, end_error)) => {
                    return Consumed::Consumed(Reply::Ok(items, next, end_error))
                }
                Consumed::Empty(Reply::Ok(_, next, end_error)) => {
                    return Consumed::tagged(consumed, Reply::Ok(items, next, error.merge(end_error)))
                }
                Consumed::Consumed(Reply::Error(end_error)) => {
                    return Consumed::Consumed(Reply::Error(end_error))
                }
                Consumed::Empty(Reply::Error(end_error)) => error.merge(end_error),
            };

            match parser.parse_state(state.clone()) {
                Consumed::Consumed(Reply::Ok(item, next, next_error)) => {
                    items.push(item);
                    state = next;
                    error = next_error;
                    consumed = true;
                }
                Consumed::Empty(Reply::Ok(..)) => {
                    error!(position = %state.position, "repeated parser accepted empty input");
                    panic!("combinator 'many_till' is applied to a parser that accepts an empty string")
                }
                Consumed::Consumed(Reply::Error(next_error)) => {
                    return Consumed::Consumed(Reply::Error(next_error))
                }
                Consumed::Empty(Reply::Error(next_error)) => {
                    return Consumed::tagged(consumed, Reply::Error(end_error.merge(next_error)))
                }
            }
        }
    })
}

/// Builds a self-referential parser.
///
/// `f` receives a handle standing for the parser being defined and returns
/// its definition. The handle only holds a weak reference to the definition,
/// so the returned parser must be kept alive while the handle is in use.
///
/// ```
/// use parsekit::{character::char, combinator::{many, recursive}, stream::Text};
///
/// // balanced parentheses, counting the pairs
/// let nested = recursive(|nested| {
///     many(char::<Text, ()>('(').then(nested).skip(char(')'))).map(|inner| {
///         inner.iter().map(|n: &usize| n + 1).sum::<usize>()
///     })
/// });
/// assert_eq!(nested.parse("", "(()())").unwrap(), 3);
/// ```
///
/// # Panics
/// The handle panics if it runs before `f` has returned, or after the
/// returned parser has been dropped.
pub fn recursive<S, U, T, F>(f: F) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    F: FnOnce(Parser<S, U, T>) -> Parser<S, U, T>,
{
    let cell: Arc<OnceLock<Parser<S, U, T>>> = Arc::new(OnceLock::new());
    let weak = Arc::downgrade(&cell);

    let handle = Parser::new(move |state| match weak.upgrade() {
        Some(cell) => match cell.get() {
            Some(parser) => parser.parse_state(state),
            None => panic!("recursive parser was run before its definition was complete"),
        },
        None => panic!("recursive parser was run after its definition was dropped"),
    });

    if cell.set(f(handle)).is_err() {
        unreachable!("recursive parser cell was set twice");
    }

    Parser::new(move |state| match cell.get() {
        Some(parser) => parser.parse_state(state),
        None => panic!("recursive parser was run before its definition was complete"),
    })
}
