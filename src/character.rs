//! Parsers over streams of `char`s.
//!
//! Classification follows the standard `char` predicates (Unicode-aware for
//! letters, case and white space; ASCII for the digit classes).

use crate::{
    combinator::{skip_many, skip_many1},
    parser::{tokens_prim, token_prim, Parser},
    pos::SourcePos,
    stream::Stream,
};

/// Describes a single char the way errors quote it, e.g. `"x"`.
pub(crate) fn show_char(c: char) -> String {
    format!("{:?}", c.to_string())
}

/// Accepts any char for which `predicate` holds.
pub fn satisfy<S, U, F>(predicate: F) -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    token_prim(
        |c: &char| show_char(*c),
        |position: &SourcePos, c: &char, _: &S| position.update_char(*c),
        move |c: &char| predicate(*c).then_some(*c),
    )
}

/// Accepts the char `c`.
pub fn char<S, U>(c: char) -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(move |x| x == c).label(show_char(c))
}

/// Accepts any char contained in `set`.
pub fn one_of<S, U>(set: &str) -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let set = set.to_owned();
    satisfy(move |c| set.contains(c))
}

/// Accepts any char not contained in `set`.
pub fn none_of<S, U>(set: &str) -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let set = set.to_owned();
    satisfy(move |c| !set.contains(c))
}

/// Accepts exactly `text`.
///
/// Like every multi-token primitive this counts as consuming as soon as the
/// first char matched, so `string("let")` on `"lex"` is a consuming failure.
pub fn string<S, U>(text: &str) -> Parser<S, U, String>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    tokens_prim(
        |chars: &[char]| format!("{:?}", chars.iter().collect::<String>()),
        |position: &SourcePos, chars: &[char]| position.update_chars(chars),
        text.chars().collect(),
    )
    .map(|chars| chars.into_iter().collect())
}

/// Accepts any char.
pub fn any_char<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(|_| true)
}

/// Accepts a white space char.
pub fn space<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(char::is_whitespace).label("space")
}

/// Skips zero or more white space chars.
pub fn spaces<S, U>() -> Parser<S, U, ()>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    skip_many(space()).label("white space")
}

/// Skips one or more white space chars.
pub fn spaces1<S, U>() -> Parser<S, U, ()>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    skip_many1(space()).label("white space")
}

/// Accepts a line feed.
pub fn newline<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    char('\n').label("lf new-line")
}

/// Accepts a carriage return followed by a line feed, returning `'\n'`.
pub fn crlf<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    char('\r').then(char('\n')).label("crlf new-line")
}

/// Accepts either line ending, returning `'\n'`.
pub fn end_of_line<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    newline().or(crlf()).label("new-line")
}

/// Accepts a tab.
pub fn tab<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    char('\t').label("tab")
}

/// Accepts an uppercase letter.
pub fn upper<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(char::is_uppercase).label("uppercase letter")
}

/// Accepts a lowercase letter.
pub fn lower<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(char::is_lowercase).label("lowercase letter")
}

/// Accepts a letter.
pub fn letter<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(char::is_alphabetic).label("letter")
}

/// Accepts a letter or a digit.
pub fn alpha_num<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(char::is_alphanumeric).label("letter or digit")
}

/// Accepts a decimal digit.
pub fn digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(|c| c.is_ascii_digit()).label("digit")
}

/// Accepts a hexadecimal digit.
pub fn hex_digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(|c| c.is_ascii_hexdigit()).label("hexadecimal digit")
}

/// Accepts an octal digit.
pub fn oct_digit<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    satisfy(|c| c.is_digit(8)).label("octal digit")
}
