//! Input streams.
//!
//! A [`Stream`] is anything with a poppable front element. Backtracking never
//! rewinds a stream: a combinator that may need to retry simply keeps a clone
//! of the earlier stream value, so cloning must be cheap. Both streams in this
//! module share their backing storage and only copy an offset.

use std::{fmt::Debug, sync::Arc};

use crate::pos::SourcePos;

/// A cheaply clonable sequence of tokens.
pub trait Stream: Clone + 'static {
    /// The type of the elements of this stream.
    type Token: Clone + Debug + 'static;

    /// Splits off the first token, returning it together with the rest of
    /// the stream, or `None` at the end of the input.
    fn uncons(&self) -> Option<(Self::Token, Self)>;

    /// Returns `true` if no tokens remain.
    fn is_empty(&self) -> bool {
        self.uncons().is_none()
    }

    /// Returns the position reached after consuming `token` at `position`.
    ///
    /// By default every token advances the column by one, so positions in
    /// token streams report the 1-based token index.
    fn update_position(position: &SourcePos, _token: &Self::Token) -> SourcePos {
        position.next_column()
    }
}

/// A stream of `char`s backed by shared text.
#[derive(Clone, PartialEq, Eq)]
pub struct Text {
    /// The complete source text.
    source: Arc<str>,
    /// The byte offset of the first unconsumed char.
    offset: usize,
}

impl Text {
    /// Constructs a [`Text`] positioned at the start of `source`.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            offset: 0,
        }
    }

    /// The unconsumed part of the text.
    pub fn as_str(&self) -> &str {
        &self.source[self.offset..]
    }

    /// The byte offset of the first unconsumed char.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Stream for Text {
    type Token = char;

    fn uncons(&self) -> Option<(char, Self)> {
        let c = self.as_str().chars().next()?;
        Some((
            c,
            Self {
                source: Arc::clone(&self.source),
                offset: self.offset + c.len_utf8(),
            },
        ))
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.source.len()
    }

    fn update_position(position: &SourcePos, token: &char) -> SourcePos {
        position.update_char(*token)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Text").field(&self.as_str()).finish()
    }
}

/// A stream over a shared array of tokens.
pub struct Tokens<T> {
    /// The complete token array.
    items: Arc<[T]>,
    /// The index of the first unconsumed token.
    index: usize,
}

impl<T> Tokens<T> {
    /// The unconsumed tokens.
    pub fn as_slice(&self) -> &[T] {
        &self.items[self.index..]
    }

    /// The index of the first unconsumed token.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Tokens<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            index: self.index,
        }
    }
}

impl<T: Clone + Debug + 'static> Stream for Tokens<T> {
    type Token = T;

    fn uncons(&self) -> Option<(T, Self)> {
        let head = self.items.get(self.index)?.clone();
        Some((
            head,
            Self {
                items: Arc::clone(&self.items),
                index: self.index + 1,
            },
        ))
    }

    fn is_empty(&self) -> bool {
        self.index >= self.items.len()
    }
}

impl<T> From<Vec<T>> for Tokens<T> {
    fn from(value: Vec<T>) -> Self {
        Self {
            items: value.into(),
            index: 0,
        }
    }
}

impl<T: Clone> From<&[T]> for Tokens<T> {
    fn from(value: &[T]) -> Self {
        Self {
            items: value.into(),
            index: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for Tokens<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Debug> Debug for Tokens<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Tokens").field(&self.as_slice()).finish()
    }
}
