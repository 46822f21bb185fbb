//! The parser state and the two-level outcome of running a parser.
//!
//! Every parse attempt answers two independent questions: did it advance the
//! input ([`Consumed`]), and did it succeed ([`Reply`])? Choice only falls
//! through to an alternative when the first branch failed *without*
//! consuming, which is what keeps the engine predictive.

use crate::{error::ParseError, pos::SourcePos};

/// The state threaded through a parse: the remaining input, the current
/// position and a caller-chosen auxiliary value.
#[derive(Debug, Clone, PartialEq)]
pub struct State<S, U> {
    /// The unconsumed input.
    pub input: S,
    /// The position of the first unconsumed token.
    pub position: SourcePos,
    /// The user state.
    pub user: U,
}

impl<S, U> State<S, U> {
    /// Constructs a new [`State`].
    pub fn new(input: S, position: SourcePos, user: U) -> Self {
        Self {
            input,
            position,
            user,
        }
    }
}

/// Whether a parse attempt advanced the input.
#[derive(Debug, Clone, PartialEq)]
pub enum Consumed<R> {
    /// At least one token was consumed.
    Consumed(R),
    /// No input was consumed.
    Empty(R),
}

impl<R> Consumed<R> {
    /// Returns `true` for [`Consumed::Consumed`].
    pub fn is_consumed(&self) -> bool {
        matches!(self, Consumed::Consumed(_))
    }

    /// Discards the tag.
    pub fn into_inner(self) -> R {
        match self {
            Consumed::Consumed(inner) | Consumed::Empty(inner) => inner,
        }
    }

    /// Applies `f` to the wrapped value, keeping the tag.
    pub fn map<Q, F>(self, f: F) -> Consumed<Q>
    where
        F: FnOnce(R) -> Q,
    {
        match self {
            Consumed::Consumed(inner) => Consumed::Consumed(f(inner)),
            Consumed::Empty(inner) => Consumed::Empty(f(inner)),
        }
    }

    /// Wraps `inner` with [`Consumed::Consumed`] if `consumed`, else with
    /// [`Consumed::Empty`].
    pub fn tagged(consumed: bool, inner: R) -> Self {
        if consumed {
            Consumed::Consumed(inner)
        } else {
            Consumed::Empty(inner)
        }
    }
}

/// The success or failure of a parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<S, U, T> {
    /// A result, the state after it, and the error that would have been
    /// reported had parsing stopped here.
    Ok(T, State<S, U>, ParseError),
    /// A failure.
    Error(ParseError),
}

impl<S, U, T> Reply<S, U, T> {
    /// Returns `true` for [`Reply::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(..))
    }

    /// The error of a failed reply, or the trailing error of a successful one.
    pub fn error(&self) -> &ParseError {
        match self {
            Reply::Ok(_, _, error) | Reply::Error(error) => error,
        }
    }

    /// Applies `f` to a successful result.
    pub fn map<V, F>(self, f: F) -> Reply<S, U, V>
    where
        F: FnOnce(T) -> V,
    {
        match self {
            Reply::Ok(value, state, error) => Reply::Ok(f(value), state, error),
            Reply::Error(error) => Reply::Error(error),
        }
    }

    /// Merges `earlier` in front of the error carried by this reply.
    pub fn merge_error(self, earlier: ParseError) -> Self {
        match self {
            Reply::Ok(value, state, error) => Reply::Ok(value, state, earlier.merge(error)),
            Reply::Error(error) => Reply::Error(earlier.merge(error)),
        }
    }
}

/// The full outcome of running a parser.
pub type Outcome<S, U, T> = Consumed<Reply<S, U, T>>;

#[cfg(test)]
mod tests {
    use crate::error::Message;

    use super::*;

    #[test]
    fn consumed_tag_survives_map() {
        let outcome: Consumed<u8> = Consumed::tagged(true, 3);
        assert_eq!(outcome.map(|n| n * 2), Consumed::Consumed(6));
        assert_eq!(Consumed::tagged(false, 'a').into_inner(), 'a');
    }

    #[test]
    fn reply_merge_error_puts_earlier_first() {
        let pos = SourcePos::new("r");
        let earlier = ParseError::new_message(pos.clone(), Message::Expected("a".into()));
        let later = ParseError::new_message(pos, Message::Expected("b".into()));

        let reply: Reply<(), (), ()> = Reply::Error(later).merge_error(earlier);
        let texts: Vec<_> = reply.error().messages().iter().map(Message::text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
