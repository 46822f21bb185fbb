//! Predictive parser combinators with Parsec-style error reporting.
//!
//! A [`Parser`](parser::Parser) is an immutable, cheaply clonable value. Parsers are
//! combined with the methods on [`Parser`](parser::Parser) and the free functions in
//! [`parser`], [`combinator`] and [`character`]; the [`expr`], [`token`] and [`perm`]
//! modules build whole grammars on top of those.
//!
//! Choice is predictive: an alternative is only tried if the previous branches failed without
//! consuming input, and [`attempt`](parser::attempt) opts back into backtracking. Errors from
//! every alternative tried at the furthest position are merged, so a failed parse reports
//! everything that would have been accepted there.
//!
//! ```
//! use parsekit::{
//!     character::{char, digit},
//!     combinator::{eof, many1, sep_by},
//!     stream::Text,
//! };
//!
//! let number = many1(digit::<Text, ()>()).map(|ds| ds.into_iter().collect::<String>());
//! let list = sep_by(number, char(',')).skip(eof());
//! assert_eq!(list.parse("", "1,22,333").unwrap(), vec!["1", "22", "333"]);
//!
//! let error = list.parse("list", "1,x").unwrap_err();
//! assert_eq!(error.to_string(), "\"list\" (line 1, column 3):\nunexpected \"x\"\nexpecting digit");
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

extern crate static_assertions as sa;

pub mod character;
pub mod combinator;
pub mod error;
pub mod expr;
pub mod language;
pub mod locale;
pub mod parser;
pub mod perm;
pub mod pos;
pub mod state;
pub mod stream;
pub mod token;

pub use error::{Message, ParseError};
pub use parser::Parser;
pub use pos::SourcePos;
pub use stream::{Stream, Text, Tokens};

sa::assert_impl_all!(parser::Parser<Text, (), char>: Send, Sync, Clone);
sa::assert_impl_all!(token::TokenParser<Text, ()>: Send, Sync, Clone);
sa::assert_impl_all!(ParseError: std::error::Error, Send, Sync);
sa::assert_impl_all!(SourcePos: Ord, Send, Sync);
