//! The [`Parser`] value, its primitives and its core combinators.
//!
//! # Model
//! A [`Parser<S, U, T>`] is a function from a [`State`] over the stream `S`
//! with user state `U` to an [`Outcome`] producing a `T`. Parsers are
//! immutable values; combinators build new parsers that close over their
//! operands, and cloning a parser only bumps a reference count.
//!
//! # Choice
//! [`Parser::or`] is predictive: the second branch runs only if the first
//! failed without consuming input. Wrap the first branch in [`attempt`] to
//! opt into backtracking:
//!
//! ```
//! use parsekit::{character::string, parser::attempt, stream::Text};
//!
//! let keyword = attempt(string::<Text, ()>("let")).or(string("lambda"));
//! assert_eq!(keyword.parse("", "lambda").unwrap(), "lambda");
//! ```

use std::{fmt::Debug, ops::BitOr, sync::Arc};

use tracing::{debug, trace, trace_span};

use crate::{
    error::{Message, ParseError},
    pos::SourcePos,
    state::{Consumed, Outcome, Reply, State},
    stream::Stream,
};

/// The type-erased parse function wrapped by a [`Parser`].
type ParseFn<S, U, T> = dyn Fn(State<S, U>) -> Outcome<S, U, T> + Send + Sync;

/// A parser over the stream `S` with user state `U`, producing a `T`.
pub struct Parser<S, U, T> {
    /// The parse function.
    run: Arc<ParseFn<S, U, T>>,
}

impl<S, U, T> Clone for Parser<S, U, T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<S, U, T> Debug for Parser<S, U, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

/// Continues a sequence whose first half succeeded with `consumed` and the
/// trailing error `error`, given the `next` outcome of the second half.
fn sequence<S, U, V>(
    consumed: bool,
    error: ParseError,
    next: Outcome<S, U, V>,
) -> Outcome<S, U, V> {
    match next {
        Consumed::Empty(reply) => Consumed::tagged(consumed, reply.merge_error(error)),
        consumed_reply => consumed_reply,
    }
}

impl<S, U, T> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    /// Wraps a raw parse function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(State<S, U>) -> Outcome<S, U, T> + Send + Sync + 'static,
    {
        Self { run: Arc::new(f) }
    }

    /// Runs this parser on `state`, returning the raw outcome.
    pub fn parse_state(&self, state: State<S, U>) -> Outcome<S, U, T> {
        (self.run)(state)
    }

    /// Runs this parser on `state`, returning the result and the final state.
    pub fn run_state(&self, state: State<S, U>) -> Result<(T, State<S, U>), ParseError> {
        match self.parse_state(state).into_inner() {
            Reply::Ok(value, state, _) => Ok((value, state)),
            Reply::Error(error) => Err(error),
        }
    }

    /// Runs this parser on `input`, naming the source `name` in positions.
    ///
    /// This does not require the whole input to be consumed; sequence the
    /// parser with [`eof`](crate::combinator::eof) for that.
    pub fn run(&self, user: U, name: &str, input: impl Into<S>) -> Result<T, ParseError> {
        let span = trace_span!("parse", source = name);
        let _enter = span.enter();

        let state = State::new(input.into(), SourcePos::new(name), user);
        match self.run_state(state) {
            Ok((value, state)) => {
                trace!(position = %state.position, "parse succeeded");
                Ok(value)
            }
            Err(error) => {
                debug!(%error, "parse failed");
                Err(error)
            }
        }
    }

    /// Applies `f` to the result of this parser.
    pub fn map<V, F>(self, f: F) -> Parser<S, U, V>
    where
        V: 'static,
        F: Fn(T) -> V + Send + Sync + 'static,
    {
        Parser::new(move |state| self.parse_state(state).map(|reply| reply.map(&f)))
    }

    /// Runs this parser, then the parser computed by `f` from its result.
    ///
    /// If the second parser consumes nothing, the trailing error of the first
    /// is merged into its outcome, so expectations from both sides survive.
    pub fn and_then<V, F>(self, f: F) -> Parser<S, U, V>
    where
        V: 'static,
        F: Fn(T) -> Parser<S, U, V> + Send + Sync + 'static,
    {
        Parser::new(move |state| match self.parse_state(state) {
            Consumed::Consumed(Reply::Ok(value, next, error)) => {
                sequence(true, error, f(value).parse_state(next))
            }
            Consumed::Empty(Reply::Ok(value, next, error)) => {
                sequence(false, error, f(value).parse_state(next))
            }
            Consumed::Consumed(Reply::Error(error)) => Consumed::Consumed(Reply::Error(error)),
            Consumed::Empty(Reply::Error(error)) => Consumed::Empty(Reply::Error(error)),
        })
    }

    /// Runs this parser and then `other`, combining both results with `f`.
    pub fn zip_with<V, W, F>(self, other: Parser<S, U, V>, f: F) -> Parser<S, U, W>
    where
        V: 'static,
        W: 'static,
        F: Fn(T, V) -> W + Send + Sync + 'static,
    {
        Parser::new(move |state| match self.parse_state(state) {
            Consumed::Consumed(Reply::Ok(left, next, error)) => sequence(
                true,
                error,
                other.parse_state(next).map(|reply| reply.map(|right| f(left, right))),
            ),
            Consumed::Empty(Reply::Ok(left, next, error)) => sequence(
                false,
                error,
                other.parse_state(next).map(|reply| reply.map(|right| f(left, right))),
            ),
            Consumed::Consumed(Reply::Error(error)) => Consumed::Consumed(Reply::Error(error)),
            Consumed::Empty(Reply::Error(error)) => Consumed::Empty(Reply::Error(error)),
        })
    }

    /// Runs this parser and then `other`, returning both results.
    pub fn pair<V: 'static>(self, other: Parser<S, U, V>) -> Parser<S, U, (T, V)> {
        self.zip_with(other, |left, right| (left, right))
    }

    /// Runs this parser and then `other`, keeping the result of `other`.
    pub fn then<V: 'static>(self, other: Parser<S, U, V>) -> Parser<S, U, V> {
        self.zip_with(other, |_, right| right)
    }

    /// Runs this parser and then `other`, keeping the result of this parser.
    pub fn skip<V: 'static>(self, other: Parser<S, U, V>) -> Parser<S, U, T> {
        self.zip_with(other, |left, _| left)
    }

    /// Predictive choice: runs `other` on the original state only if this
    /// parser failed without consuming input.
    pub fn or(self, other: Parser<S, U, T>) -> Parser<S, U, T> {
        Parser::new(move |state: State<S, U>| match self.parse_state(state.clone()) {
            Consumed::Empty(Reply::Error(error)) => match other.parse_state(state) {
                Consumed::Empty(reply) => Consumed::Empty(reply.merge_error(error)),
                consumed => consumed,
            },
            outcome => outcome,
        })
    }

    /// Replaces the expected messages of a non-consuming failure with
    /// `Expected(name)`. See [`Parser::labels`].
    pub fn label(self, name: impl Into<String>) -> Parser<S, U, T> {
        self.labels(vec![name.into()])
    }

    /// Replaces the expected messages with one `Expected` per name whenever
    /// this parser does not consume input.
    ///
    /// The trailing error of a non-consuming success is relabelled too,
    /// unless it is unknown. Consuming outcomes are left untouched.
    pub fn labels(self, names: Vec<String>) -> Parser<S, U, T> {
        let names: Arc<[String]> = names.into();
        Parser::new(move |state| match self.parse_state(state) {
            Consumed::Empty(Reply::Error(mut error)) => {
                error.set_expected(&names[..]);
                Consumed::Empty(Reply::Error(error))
            }
            Consumed::Empty(Reply::Ok(value, next, mut error)) => {
                if !error.is_unknown() {
                    error.set_expected(&names[..]);
                }
                Consumed::Empty(Reply::Ok(value, next, error))
            }
            consumed => consumed,
        })
    }
}

impl<S, U, T> BitOr for Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    type Output = Parser<S, U, T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<S, T> Parser<S, (), T>
where
    S: Stream,
    T: 'static,
{
    /// Runs a parser that has no user state. See [`Parser::run`].
    pub fn parse(&self, name: &str, input: impl Into<S>) -> Result<T, ParseError> {
        self.run((), name, input)
    }
}

/// Runs `parser` with user state `user` on `input`.
pub fn run<S, U, T>(
    parser: &Parser<S, U, T>,
    user: U,
    name: &str,
    input: impl Into<S>,
) -> Result<T, ParseError>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    parser.run(user, name, input)
}

/// Reclassifies a consuming failure of `parser` as non-consuming, so that an
/// enclosing [`Parser::or`] still tries its alternative.
pub fn attempt<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    Parser::new(move |state| match parser.parse_state(state) {
        Consumed::Consumed(Reply::Error(error)) => Consumed::Empty(Reply::Error(error)),
        outcome => outcome,
    })
}

/// Runs `parser` without consuming input on success.
///
/// A failure keeps its consumed tag; wrap the argument in [`attempt`] to
/// make a failing look-ahead non-consuming as well.
pub fn look_ahead<S, U, T>(parser: Parser<S, U, T>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    Parser::new(move |state: State<S, U>| match parser.parse_state(state.clone()) {
        Consumed::Consumed(Reply::Ok(value, ..)) | Consumed::Empty(Reply::Ok(value, ..)) => {
            let error = ParseError::new_unknown(state.position.clone());
            Consumed::Empty(Reply::Ok(value, state, error))
        }
        failure => failure,
    })
}

/// Succeeds with `value` without consuming input.
pub fn pure<S, U, T>(value: T) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: Clone + Send + Sync + 'static,
{
    pure_with(move || value.clone())
}

/// Succeeds with the value produced by `make` without consuming input.
pub fn pure_with<S, U, T, F>(make: F) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let error = ParseError::new_unknown(state.position.clone());
        Consumed::Empty(Reply::Ok(make(), state, error))
    })
}

/// Fails without consuming input, reporting [`Message::Generic`].
pub fn fail<S, U, T>(message: impl Into<String>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    fail_with(Message::Generic(message.into()))
}

/// Fails without consuming input, reporting [`Message::Unexpected`].
pub fn unexpected<S, U, T>(message: impl Into<String>) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    fail_with(Message::Unexpected(message.into()))
}

/// Fails without consuming input and without any message.
pub fn empty<S, U, T>() -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    Parser::new(|state: State<S, U>| {
        Consumed::Empty(Reply::Error(ParseError::new_unknown(state.position)))
    })
}

/// Fails without consuming input with the single message `message`.
fn fail_with<S, U, T>(message: Message) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
{
    Parser::new(move |state: State<S, U>| {
        Consumed::Empty(Reply::Error(ParseError::new_message(
            state.position,
            message.clone(),
        )))
    })
}

/// Accepts a single token for which `test` returns a value.
///
/// At the end of input this fails with an empty [`Message::SysUnexpected`];
/// on a rejected token it fails with `describe(token)`. Both failures are
/// non-consuming. On success the position is advanced by `next_position`,
/// which sees the old position, the token and the remaining stream.
pub fn token_prim<S, U, T, D, P, F>(describe: D, next_position: P, test: F) -> Parser<S, U, T>
where
    S: Stream,
    U: Clone + 'static,
    T: 'static,
    D: Fn(&S::Token) -> String + Send + Sync + 'static,
    P: Fn(&SourcePos, &S::Token, &S) -> SourcePos + Send + Sync + 'static,
    F: Fn(&S::Token) -> Option<T> + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let Some((token, rest)) = state.input.uncons() else {
            return Consumed::Empty(Reply::Error(ParseError::new_unexpected(
                state.position,
                "",
            )));
        };

        match test(&token) {
            Some(value) => {
                let position = next_position(&state.position, &token, &rest);
                let error = ParseError::new_unknown(position.clone());
                Consumed::Consumed(Reply::Ok(
                    value,
                    State::new(rest, position, state.user),
                    error,
                ))
            }
            None => Consumed::Empty(Reply::Error(ParseError::new_unexpected(
                state.position,
                describe(&token),
            ))),
        }
    })
}

/// Accepts exactly the token sequence `expected`.
///
/// Failures carry `Expected(describe(expected))` and are reported at the
/// starting position. Once the first token has matched, the outcome counts
/// as consuming even if a later token fails; wrap the parser in [`attempt`]
/// to roll back. An empty `expected` succeeds without consuming.
pub fn tokens_prim<S, U, D, P>(
    describe: D,
    next_position: P,
    expected: Vec<S::Token>,
) -> Parser<S, U, Vec<S::Token>>
where
    S: Stream,
    S::Token: PartialEq + Send + Sync,
    U: Clone + 'static,
    D: Fn(&[S::Token]) -> String + Send + Sync + 'static,
    P: Fn(&SourcePos, &[S::Token]) -> SourcePos + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let error_at = |found: Option<&S::Token>| {
            let found = found.map(|t| describe(std::slice::from_ref(t)));
            let mut error =
                ParseError::new_unexpected(state.position.clone(), found.unwrap_or_default());
            error.set_message(Message::Expected(describe(&expected)));
            error
        };

        let mut input = state.input.clone();
        for (index, want) in expected.iter().enumerate() {
            let consumed = index > 0;
            match input.uncons() {
                Some((token, rest)) if &token == want => input = rest,
                Some((token, _)) => {
                    return Consumed::tagged(consumed, Reply::Error(error_at(Some(&token))))
                }
                None => return Consumed::tagged(consumed, Reply::Error(error_at(None))),
            }
        }

        let position = next_position(&state.position, &expected);
        let error = ParseError::new_unknown(position.clone());
        Consumed::tagged(
            !expected.is_empty(),
            Reply::Ok(
                expected.clone(),
                State::new(input, position, state.user.clone()),
                error,
            ),
        )
    })
}

/// Accepts any single token for which `predicate` holds, advancing the
/// position with [`Stream::update_position`].
pub fn satisfy_token<S, U, F>(predicate: F) -> Parser<S, U, S::Token>
where
    S: Stream,
    U: Clone + 'static,
    F: Fn(&S::Token) -> bool + Send + Sync + 'static,
{
    token_prim(
        |token: &S::Token| format!("{token:?}"),
        |position: &SourcePos, token: &S::Token, _: &S| S::update_position(position, token),
        move |token: &S::Token| predicate(token).then(|| token.clone()),
    )
}

/// Accepts the single token `expected`.
pub fn token_eq<S, U>(expected: S::Token) -> Parser<S, U, S::Token>
where
    S: Stream,
    S::Token: PartialEq + Send + Sync,
    U: Clone + 'static,
{
    let label = format!("{expected:?}");
    satisfy_token(move |token: &S::Token| token == &expected).label(label)
}

/// Accepts any single token.
pub fn any_token<S, U>() -> Parser<S, U, S::Token>
where
    S: Stream,
    U: Clone + 'static,
{
    satisfy_token(|_: &S::Token| true)
}

/// Returns the current position without consuming input.
pub fn get_position<S, U>() -> Parser<S, U, SourcePos>
where
    S: Stream,
    U: Clone + 'static,
{
    get_parser_state().map(|state| state.position)
}

/// Returns the remaining input without consuming it.
pub fn get_input<S, U>() -> Parser<S, U, S>
where
    S: Stream,
    U: Clone + 'static,
{
    get_parser_state().map(|state| state.input)
}

/// Returns the user state.
pub fn get_state<S, U>() -> Parser<S, U, U>
where
    S: Stream,
    U: Clone + 'static,
{
    get_parser_state().map(|state| state.user)
}

/// Returns a copy of the whole parser state.
pub fn get_parser_state<S, U>() -> Parser<S, U, State<S, U>>
where
    S: Stream,
    U: Clone + 'static,
{
    update_parser_state(|state| state)
}

/// Replaces the current position with `position`.
pub fn set_position<S, U>(position: SourcePos) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
{
    update_parser_state(move |state| State {
        position: position.clone(),
        ..state
    })
    .map(|_| ())
}

/// Replaces the remaining input with `input`.
pub fn set_input<S, U>(input: S) -> Parser<S, U, ()>
where
    S: Stream + Send + Sync,
    U: Clone + 'static,
{
    update_parser_state(move |state| State {
        input: input.clone(),
        ..state
    })
    .map(|_| ())
}

/// Replaces the user state with `user`.
pub fn put_state<S, U>(user: U) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + Send + Sync + 'static,
{
    update_state(move |_| user.clone())
}

/// Applies `f` to the user state.
pub fn update_state<S, U, F>(f: F) -> Parser<S, U, ()>
where
    S: Stream,
    U: Clone + 'static,
    F: Fn(U) -> U + Send + Sync + 'static,
{
    update_parser_state(move |state: State<S, U>| State {
        user: f(state.user),
        ..state
    })
    .map(|_| ())
}

/// Applies `f` to the parser state and returns the new state, without
/// consuming input.
pub fn update_parser_state<S, U, F>(f: F) -> Parser<S, U, State<S, U>>
where
    S: Stream,
    U: Clone + 'static,
    F: Fn(State<S, U>) -> State<S, U> + Send + Sync + 'static,
{
    Parser::new(move |state: State<S, U>| {
        let next = f(state);
        let error = ParseError::new_unknown(next.position.clone());
        Consumed::Empty(Reply::Ok(next.clone(), next, error))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        character::{char, digit, letter, string},
        stream::{Text, Tokens},
    };

    use super::*;

    type P<T> = Parser<Text, (), T>;

    fn initial(input: &str) -> State<Text, ()> {
        State::new(Text::from(input), SourcePos::new("test"), ())
    }

    /// A parser that consumes one char and then fails.
    fn consume_then_fail() -> P<char> {
        char('a').then(fail("no"))
    }

    #[test]
    fn token_prim_reports_end_of_input() {
        let outcome = letter::<Text, ()>().parse_state(initial(""));
        assert!(!outcome.is_consumed());
        let reply = outcome.into_inner();
        assert!(reply.error().messages().contains(&Message::SysUnexpected(String::new())));
    }

    #[test]
    fn token_prim_consumes_on_success() {
        let outcome = letter::<Text, ()>().parse_state(initial("ab"));
        assert!(outcome.is_consumed());
        match outcome.into_inner() {
            Reply::Ok(c, state, error) => {
                assert_eq!(c, 'a');
                assert_eq!(state.input.as_str(), "b");
                assert_eq!(state.position.column(), 2);
                assert!(error.is_unknown());
            }
            Reply::Error(error) => panic!("unexpected failure: {error}"),
        }
    }

    #[test]
    fn tokens_prim_is_consuming_after_first_match() {
        let outcome = string::<Text, ()>("let").parse_state(initial("lex"));
        assert!(outcome.is_consumed());
        let error = outcome.into_inner().error().clone();
        assert_eq!(error.position().column(), 1);
        assert!(error.messages().contains(&Message::Expected("\"let\"".into())));
        assert!(error.messages().contains(&Message::SysUnexpected("\"x\"".into())));

        let outcome = string::<Text, ()>("let").parse_state(initial("xyz"));
        assert!(!outcome.is_consumed());

        let outcome = string::<Text, ()>("let").parse_state(initial("le"));
        assert!(outcome.is_consumed());
        assert!(outcome
            .into_inner()
            .error()
            .messages()
            .contains(&Message::SysUnexpected(String::new())));
    }

    #[test]
    fn or_never_runs_second_branch_after_consumption() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let second: P<char> = Parser::new(move |state| {
            counter.fetch_add(1, Ordering::SeqCst);
            char('a').parse_state(state)
        });

        let parser = consume_then_fail().or(second.clone());
        assert!(parser.parse("test", "ab").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let parser = attempt(consume_then_fail()).or(second);
        assert_eq!(parser.parse("test", "ab").unwrap(), 'a');
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn or_never_runs_second_branch_after_empty_success() {
        let parser: P<char> = pure('x').or(char('a'));
        assert_eq!(parser.parse("test", "a").unwrap(), 'x');
    }

    #[test]
    fn or_merges_expectations() {
        let parser: P<char> = char('a') | char('b') | digit();
        let error = parser.parse("test", "z").unwrap_err();
        dbg!(&error);
        assert_eq!(
            error.to_string(),
            "\"test\" (line 1, column 1):\nunexpected \"z\"\nexpecting \"a\", \"b\" or digit"
        );
    }

    #[test]
    fn and_then_merges_trailing_error() {
        // `many` leaves a trailing error that should show up next to the
        // expectation of the following parser
        let parser: P<char> =
            crate::combinator::many(digit()).and_then(|_| char::<Text, ()>(';'));
        let error = parser.parse("test", "12x").unwrap_err();
        assert_eq!(error.position().column(), 3);
        assert!(error.messages().contains(&Message::Expected("digit".into())));
        assert!(error.messages().contains(&Message::Expected("\";\"".into())));
    }

    #[test]
    fn look_ahead_does_not_consume() {
        let parser: P<(String, String)> =
            look_ahead(string("ab")).pair(string("abc"));
        assert_eq!(
            parser.parse("test", "abc").unwrap(),
            ("ab".to_owned(), "abc".to_owned())
        );

        let outcome = look_ahead(consume_then_fail()).parse_state(initial("ab"));
        assert!(outcome.is_consumed());
        let outcome = look_ahead(attempt(consume_then_fail())).parse_state(initial("ab"));
        assert!(!outcome.is_consumed());
    }

    #[test]
    fn label_only_affects_empty_failures() {
        let parser: P<char> = digit().label("number");
        let error = parser.parse("test", "x").unwrap_err();
        assert_eq!(
            error.messages(),
            &[
                Message::SysUnexpected("\"x\"".into()),
                Message::Expected("number".into())
            ]
        );

        let parser: P<char> = consume_then_fail().label("thing");
        let error = parser.parse("test", "ab").unwrap_err();
        assert!(!error.messages().contains(&Message::Expected("thing".into())));
    }

    #[test]
    fn fail_unexpected_and_empty_do_not_consume() {
        let outcome = fail::<Text, (), ()>("boom").parse_state(initial("x"));
        assert!(!outcome.is_consumed());
        assert_eq!(outcome.into_inner().error().messages(), &[Message::Generic("boom".into())]);

        let outcome = unexpected::<Text, (), ()>("thing").parse_state(initial("x"));
        assert_eq!(
            outcome.into_inner().error().messages(),
            &[Message::Unexpected("thing".into())]
        );

        let outcome = empty::<Text, (), ()>().parse_state(initial("x"));
        assert!(outcome.into_inner().error().is_unknown());
    }

    #[test]
    fn user_state_is_threaded() {
        let count_letter: Parser<Text, usize, char> =
            letter().skip(update_state(|n: usize| n + 1));
        let parser = crate::combinator::many(count_letter).then(get_state());
        assert_eq!(parser.run(0, "test", "abc1").unwrap(), 3);
        assert_eq!(parser.run(10, "test", "").unwrap(), 10);

        let parser: Parser<Text, usize, usize> = put_state(7).then(get_state());
        assert_eq!(parser.run(0, "test", "").unwrap(), 7);
    }

    #[test]
    fn position_and_input_access() {
        let parser: P<(SourcePos, Text)> =
            string("ab\n").then(get_position().pair(get_input()));
        let (pos, rest) = parser.parse("test", "ab\ncd").unwrap();
        assert_eq!((pos.line(), pos.column()), (2, 1));
        assert_eq!(rest.as_str(), "cd");

        let parser: P<SourcePos> =
            set_position(SourcePos::at("other", 40, 2)).then(get_position());
        assert_eq!(parser.parse("test", "").unwrap().line(), 40);

        let parser: P<SourcePos> = set_position(SourcePos::at("other", 1, 0))
            .then(crate::character::tab())
            .then(get_position());
        assert_eq!(parser.parse("test", "\t").unwrap().column(), 9);

        let parser: P<char> = set_input(Text::from("z")).then(letter());
        assert_eq!(parser.parse("test", "1").unwrap(), 'z');
    }

    #[test]
    fn token_streams_are_supported() {
        #[derive(Debug, Clone, PartialEq)]
        enum Tok {
            Num(i64),
            Plus,
        }

        let num: Parser<Tokens<Tok>, (), i64> = token_prim(
            |t: &Tok| format!("{t:?}"),
            |pos: &SourcePos, _: &Tok, _: &Tokens<Tok>| pos.next_column(),
            |t: &Tok| match t {
                Tok::Num(n) => Some(*n),
                Tok::Plus => None,
            },
        );
        let sum = num
            .clone()
            .skip(token_eq(Tok::Plus))
            .zip_with(num, |a, b| a + b);

        let tokens = vec![Tok::Num(2), Tok::Plus, Tok::Num(40)];
        assert_eq!(sum.parse("tokens", tokens).unwrap(), 42);

        let error = sum
            .parse("tokens", vec![Tok::Num(2), Tok::Num(3)])
            .unwrap_err();
        assert_eq!(error.position().column(), 2);
        assert!(error.messages().contains(&Message::Expected("Plus".into())));

        let any: Parser<Tokens<Tok>, (), Tok> = any_token();
        assert_eq!(any.parse("tokens", vec![Tok::Plus]).unwrap(), Tok::Plus);
    }

    #[test]
    fn parsers_are_shareable_across_threads() {
        let parser: P<String> = string("hello");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let parser = parser.clone();
                std::thread::spawn(move || parser.parse("thread", "hello world"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "hello");
        }
    }
}
