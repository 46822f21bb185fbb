//! A lexer generated from a [`LanguageDef`].
//!
//! Every parser handed out by a [`TokenParser`] except [`TokenParser::decimal`],
//! [`TokenParser::hexadecimal`] and [`TokenParser::octal`] is a *lexeme*: it
//! skips the white space and comments that follow it. A complete grammar
//! therefore skips leading white space once and then only combines lexemes.
//!
//! ```
//! use parsekit::{language::LanguageDef, stream::Text, token::TokenParser};
//!
//! let lexer = TokenParser::<Text, ()>::new(LanguageDef::java_style());
//! let call = lexer.identifier().pair(lexer.parens(lexer.comma_sep(lexer.integer())));
//! let (name, args) = call.parse("", "max (1, /* two */ 2,-3)").unwrap();
//! assert_eq!(name, "max");
//! assert_eq!(args, vec![1, 2, -3]);
//! ```

use std::{collections::HashSet, ops::Neg, sync::Arc};

use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Num};

use crate::{
    character::{
        char, digit, hex_digit, none_of, oct_digit, one_of, satisfy, space, string,
    },
    combinator::{
        between, choice, many, many1, not_followed_by, option, option_maybe, sep_by,
        sep_by1, skip_many, skip_many1,
    },
    language::LanguageDef,
    parser::{attempt, fail, pure, pure_with, unexpected, Parser},
    state::{Consumed, Reply},
    stream::Stream,
};

/// A numeric literal that may be either integral or fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// An integer literal.
    Integer(i64),
    /// A literal with a fraction or an exponent.
    Float(f64),
}

/// The mnemonic escapes, e.g. `\n`.
const MNEMONIC_ESCAPES: [(char, char); 10] = [
    ('a', '\x07'),
    ('b', '\x08'),
    ('f', '\x0c'),
    ('n', '\n'),
    ('r', '\r'),
    ('t', '\t'),
    ('v', '\x0b'),
    ('\\', '\\'),
    ('"', '"'),
    ('\'', '\''),
];

/// The ASCII control-code escapes, e.g. `\NUL`. Three-letter codes come
/// first so that `\SOH` is not read as `\SO` followed by `H`.
const ASCII_ESCAPES: [(&str, char); 34] = [
    ("NUL", '\x00'),
    ("SOH", '\x01'),
    ("STX", '\x02'),
    ("ETX", '\x03'),
    ("EOT", '\x04'),
    ("ENQ", '\x05'),
    ("ACK", '\x06'),
    ("BEL", '\x07'),
    ("DLE", '\x10'),
    ("DC1", '\x11'),
    ("DC2", '\x12'),
    ("DC3", '\x13'),
    ("DC4", '\x14'),
    ("NAK", '\x15'),
    ("SYN", '\x16'),
    ("ETB", '\x17'),
    ("CAN", '\x18'),
    ("SUB", '\x1a'),
    ("ESC", '\x1b'),
    ("DEL", '\x7f'),
    ("BS", '\x08'),
    ("HT", '\t'),
    ("LF", '\n'),
    ("VT", '\x0b'),
    ("FF", '\x0c'),
    ("CR", '\r'),
    ("SO", '\x0e'),
    ("SI", '\x0f'),
    ("EM", '\x19'),
    ("FS", '\x1c'),
    ("GS", '\x1d'),
    ("RS", '\x1e'),
    ("US", '\x1f'),
    ("SP", ' '),
];

/// The characters allowed after `^` in a control escape, in code order.
const CONTROL_CHARS: &str = "@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_";

/// The largest code point a numeric escape may denote.
const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Lexeme parsers for one language.
pub struct TokenParser<S, U> {
    /// The language being lexed.
    language: Arc<LanguageDef<S, U>>,
    /// The reserved names, lowercased if matching is case-insensitive.
    reserved_names: Arc<HashSet<String>>,
    /// Skips white space and comments.
    white_space: Parser<S, U, ()>,
    /// The escape codes following a backslash.
    escape_code: Parser<S, U, char>,
}

impl<S, U> Clone for TokenParser<S, U> {
    fn clone(&self) -> Self {
        Self {
            language: Arc::clone(&self.language),
            reserved_names: Arc::clone(&self.reserved_names),
            white_space: self.white_space.clone(),
            escape_code: self.escape_code.clone(),
        }
    }
}

impl<S, U> TokenParser<S, U>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    /// Builds the lexer for `language`.
    pub fn new(language: LanguageDef<S, U>) -> Self {
        let reserved_names = language
            .reserved_names
            .iter()
            .map(|name| match language.case_sensitive {
                true => name.clone(),
                false => name.to_lowercase(),
            })
            .collect();

        Self {
            white_space: white_space(&language),
            escape_code: language.char_escape.clone().unwrap_or_else(escape_code),
            reserved_names: Arc::new(reserved_names),
            language: Arc::new(language),
        }
    }

    /// The language this lexer was built from.
    pub fn language(&self) -> &LanguageDef<S, U> {
        &self.language
    }

    /// Skips zero or more white space characters and comments.
    pub fn white_space(&self) -> Parser<S, U, ()> {
        self.white_space.clone()
    }

    /// Runs `parser` and then skips trailing white space.
    pub fn lexeme<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, T> {
        parser.skip(self.white_space())
    }

    /// Accepts the literal `name`.
    pub fn symbol(&self, name: &str) -> Parser<S, U, String> {
        self.lexeme(string(name))
    }

    /// Returns `true` if `name` is a reserved name of the language.
    pub fn is_reserved_name(&self, name: &str) -> bool {
        match self.language.case_sensitive {
            true => self.reserved_names.contains(name),
            false => self.reserved_names.contains(&name.to_lowercase()),
        }
    }

    /// Accepts an identifier that is not a reserved name.
    pub fn identifier(&self) -> Parser<S, U, String> {
        let lexer = self.clone();
        let ident = self
            .language
            .ident_start
            .clone()
            .zip_with(many(self.language.ident_letter.clone()), prepend_char)
            .label("identifier");

        self.lexeme(attempt(ident.and_then(move |name| {
            match lexer.is_reserved_name(&name) {
                true => unexpected(format!("reserved word {name}")),
                false => pure(name),
            }
        })))
    }

    /// Accepts the reserved name `name`, but not as a prefix of a longer
    /// identifier.
    pub fn reserved(&self, name: &str) -> Parser<S, U, ()> {
        let guard = not_followed_by(self.language.ident_letter.clone())
            .label(format!("end of {name:?}"));
        self.lexeme(attempt(self.case_string(name).then(guard)))
    }

    /// Accepts `name`, ignoring the case of letters if the language is
    /// case-insensitive.
    fn case_string(&self, name: &str) -> Parser<S, U, String> {
        if self.language.case_sensitive {
            return string(name);
        }

        let label = format!("{name:?}");
        let owned = name.to_owned();
        name.chars()
            .fold(pure(()), |acc, c| {
                let single = match c.is_alphabetic() {
                    true => {
                        let lower = c.to_lowercase().next().unwrap_or(c);
                        let upper = c.to_uppercase().next().unwrap_or(c);
                        char(lower).or(char(upper))
                    }
                    false => char(c),
                };
                acc.skip(single.label(label.clone()))
            })
            .map(move |()| owned.clone())
    }

    /// Accepts an operator that is not a reserved operator.
    pub fn operator(&self) -> Parser<S, U, String> {
        let reserved: HashSet<String> = self.language.reserved_op_names.iter().cloned().collect();
        let oper = self
            .language
            .op_start
            .clone()
            .zip_with(many(self.language.op_letter.clone()), prepend_char)
            .label("operator");

        self.lexeme(attempt(oper.and_then(move |name| {
            match reserved.contains(&name) {
                true => unexpected(format!("reserved operator {name}")),
                false => pure(name),
            }
        })))
    }

    /// Accepts the reserved operator `name`, but not as a prefix of a
    /// longer operator.
    pub fn reserved_op(&self, name: &str) -> Parser<S, U, ()> {
        let guard =
            not_followed_by(self.language.op_letter.clone()).label(format!("end of {name:?}"));
        self.lexeme(attempt(string(name).then(guard)))
    }

    /// Accepts a character literal such as `'a'` or `'\n'`.
    pub fn char_literal(&self) -> Parser<S, U, char> {
        let letter = satisfy(|c| c != '\'' && c != '\\' && c > '\x1a');
        let escape = char('\\').then(self.escape_code.clone());
        let character = letter.or(escape).label("literal character");

        self.lexeme(between(
            char('\''),
            char('\'').label("end of character"),
            character,
        ))
        .label("character")
    }

    /// Accepts a string literal such as `"a\tb"`, decoding its escapes.
    ///
    /// A backslash followed by white space and another backslash is a gap
    /// and, like the empty escape `\&`, contributes nothing.
    pub fn string_literal(&self) -> Parser<S, U, String> {
        let letter = satisfy(|c| c != '"' && c != '\\' && c > '\x1a').map(Some);
        let gap = many1(space())
            .then(char('\\').label("end of string gap"))
            .map(|_| None);
        let empty = char('&').map(|_| None);
        let escape = char('\\').then(gap.or(empty).or(self.escape_code.clone().map(Some)));
        let string_char = letter.or(escape).label("string character");

        self.lexeme(
            between(
                char('"'),
                char('"').label("end of string"),
                many(string_char),
            )
            .map(|chars| chars.into_iter().flatten().collect()),
        )
        .label("literal string")
    }

    /// Accepts a non-negative integer in decimal, or in hexadecimal or octal
    /// after `0x` or `0o`.
    pub fn natural(&self) -> Parser<S, U, i64> {
        self.natural_of()
    }

    /// Like [`TokenParser::natural`], for any checked numeric type.
    pub fn natural_of<N>(&self) -> Parser<S, U, N>
    where
        N: Num + CheckedAdd + CheckedSub + CheckedMul + From<u8> + Clone + Send + Sync + 'static,
    {
        self.lexeme(natural_digits().and_then(|(base, digits)| from_digits(base, &digits, false)))
            .label("natural")
    }

    /// Accepts an optionally signed integer.
    pub fn integer(&self) -> Parser<S, U, i64> {
        self.integer_of()
    }

    /// Like [`TokenParser::integer`], for any checked numeric type.
    pub fn integer_of<N>(&self) -> Parser<S, U, N>
    where
        N: Num
            + CheckedAdd
            + CheckedSub
            + CheckedMul
            + Neg<Output = N>
            + From<u8>
            + Clone
            + Send
            + Sync
            + 'static,
    {
        self.lexeme(
            self.lexeme(sign())
                .pair(natural_digits())
                .and_then(|(negative, (base, digits))| from_digits(base, &digits, negative)),
        )
        .label("integer")
    }

    /// Accepts an unsigned literal with a fraction, an exponent or both.
    pub fn float(&self) -> Parser<S, U, f64> {
        self.lexeme(floating()).label("float")
    }

    /// Accepts an integer-shaped literal and decodes it as a float, so that
    /// literals too large for an integer type still parse.
    pub fn integer_as_float(&self) -> Parser<S, U, f64> {
        self.lexeme(
            self.lexeme(sign())
                .pair(natural_digits())
                .map(|(negative, (base, digits))| {
                    let magnitude = match base {
                        10 => digits
                            .iter()
                            .collect::<String>()
                            .parse()
                            .unwrap_or(f64::INFINITY),
                        _ => digits.iter().fold(0.0, |acc, c| {
                            acc * f64::from(base) + f64::from(c.to_digit(base).unwrap_or(0))
                        }),
                    };
                    match negative {
                        true => -magnitude,
                        false => magnitude,
                    }
                }),
        )
        .label("integer")
    }

    /// Accepts an unsigned integer or float literal.
    pub fn natural_or_float(&self) -> Parser<S, U, Number> {
        self.lexeme(natural_or_float()).label("number")
    }

    /// Accepts an optionally signed float, or failing that an optionally
    /// signed integer.
    pub fn number(&self) -> Parser<S, U, Number> {
        let float = attempt(
            self.lexeme(sign())
                .pair(floating())
                .map(|(negative, value)| if negative { -value } else { value }),
        );
        self.lexeme(float)
            .map(Number::Float)
            .or(self.integer().map(Number::Integer))
            .label("number")
    }

    /// Accepts a decimal digit sequence, without skipping white space.
    pub fn decimal(&self) -> Parser<S, U, i64> {
        digits_in(10).and_then(|digits| from_digits(10, &digits, false))
    }

    /// Accepts `x` or `X` followed by hexadecimal digits, without skipping
    /// white space.
    pub fn hexadecimal(&self) -> Parser<S, U, i64> {
        one_of("xX")
            .then(digits_in(16))
            .and_then(|digits| from_digits(16, &digits, false))
    }

    /// Accepts `o` or `O` followed by octal digits, without skipping white
    /// space.
    pub fn octal(&self) -> Parser<S, U, i64> {
        one_of("oO")
            .then(digits_in(8))
            .and_then(|digits| from_digits(8, &digits, false))
    }

    /// `(` `parser` `)`
    pub fn parens<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, T> {
        between(self.symbol("("), self.symbol(")"), parser)
    }

    /// `{` `parser` `}`
    pub fn braces<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, T> {
        between(self.symbol("{"), self.symbol("}"), parser)
    }

    /// `<` `parser` `>`
    pub fn angles<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, T> {
        between(self.symbol("<"), self.symbol(">"), parser)
    }

    /// `[` `parser` `]`
    pub fn brackets<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, T> {
        between(self.symbol("["), self.symbol("]"), parser)
    }

    /// Accepts `;`.
    pub fn semi(&self) -> Parser<S, U, String> {
        self.symbol(";")
    }

    /// Accepts `,`.
    pub fn comma(&self) -> Parser<S, U, String> {
        self.symbol(",")
    }

    /// Accepts `:`.
    pub fn colon(&self) -> Parser<S, U, String> {
        self.symbol(":")
    }

    /// Accepts `.`.
    pub fn dot(&self) -> Parser<S, U, String> {
        self.symbol(".")
    }

    /// Zero or more `parser`s separated by `;`.
    pub fn semi_sep<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>> {
        sep_by(parser, self.semi())
    }

    /// One or more `parser`s separated by `;`.
    pub fn semi_sep1<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>> {
        sep_by1(parser, self.semi())
    }

    /// Zero or more `parser`s separated by `,`.
    pub fn comma_sep<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>> {
        sep_by(parser, self.comma())
    }

    /// One or more `parser`s separated by `,`.
    pub fn comma_sep1<T: 'static>(&self, parser: Parser<S, U, T>) -> Parser<S, U, Vec<T>> {
        sep_by1(parser, self.comma())
    }
}

/// Puts `first` in front of `rest`.
fn prepend_char(first: char, rest: Vec<char>) -> String {
    std::iter::once(first).chain(rest).collect()
}

/// Builds the white space skipper of `language`.
fn white_space<S, U>(language: &LanguageDef<S, U>) -> Parser<S, U, ()>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let mut alternatives = vec![skip_many1(satisfy(char::is_whitespace))];

    if !language.comment_line.is_empty() {
        let line_comment = attempt(string(&language.comment_line))
            .then(skip_many(satisfy(|c| c != '\n')));
        alternatives.push(line_comment);
    }

    if !language.comment_start.is_empty() {
        alternatives.push(block_comment(
            &language.comment_start,
            &language.comment_end,
            language.nested_comments,
        ));
    }

    skip_many(choice(alternatives).label(""))
}

/// One step through the inside of a block comment.
#[derive(Debug, Clone, Copy)]
enum CommentStep {
    /// A nested comment opened.
    Open,
    /// The innermost open comment closed.
    Close,
    /// Comment text was skipped.
    Text,
}

/// Skips a block comment delimited by `start` and `end`, including any
/// comments nested inside it if `nested`.
///
/// Nesting is tracked with a depth counter, so neither the nesting depth
/// nor the length of the comment grows the stack.
fn block_comment<S, U>(start: &str, end: &str, nested: bool) -> Parser<S, U, ()>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let mut delimiters = String::new();
    for c in end.chars().chain(start.chars()) {
        if !delimiters.contains(c) {
            delimiters.push(c);
        }
    }

    let open = attempt(string::<S, U>(start)).map(|_| CommentStep::Open);
    let close = attempt(string::<S, U>(end)).map(|_| CommentStep::Close);

    let mut alternatives = vec![close];
    if nested {
        alternatives.push(open.clone());
    }
    alternatives.push(skip_many1(none_of(&delimiters)).map(|()| CommentStep::Text));
    alternatives.push(one_of(&delimiters).map(|_| CommentStep::Text));
    let step = choice(alternatives).label("end of comment");

    Parser::new(move |state| {
        let (mut state, mut error) = match open.parse_state(state) {
            Consumed::Consumed(Reply::Ok(_, next, error))
            | Consumed::Empty(Reply::Ok(_, next, error)) => (next, error),
            Consumed::Consumed(Reply::Error(error)) => {
                return Consumed::Consumed(Reply::Error(error))
            }
            Consumed::Empty(Reply::Error(error)) => return Consumed::Empty(Reply::Error(error)),
        };

        let mut depth = 1usize;
        loop {
            match step.parse_state(state.clone()) {
                Consumed::Consumed(Reply::Ok(step, next, next_error))
                | Consumed::Empty(Reply::Ok(step, next, next_error)) => {
                    state = next;
                    error = next_error;
                    match step {
                        CommentStep::Open => depth += 1,
                        CommentStep::Close => depth -= 1,
                        CommentStep::Text => {}
                    }

                    if depth == 0 {
                        return Consumed::Consumed(Reply::Ok((), state, error));
                    }
                }
                Consumed::Consumed(Reply::Error(next_error)) => {
                    return Consumed::Consumed(Reply::Error(next_error))
                }
                Consumed::Empty(Reply::Error(next_error)) => {
                    return Consumed::Consumed(Reply::Error(error.merge(next_error)))
                }
            }
        }
    })
}

/// Parses an optional sign, returning `true` for `-`.
fn sign<S, U>() -> Parser<S, U, bool>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    char('-')
        .map(|_| true)
        .or(char('+').map(|_| false))
        .or(pure(false))
}

/// Parses one or more digits in `base`.
fn digits_in<S, U>(base: u32) -> Parser<S, U, Vec<char>>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    match base {
        16 => many1(hex_digit()),
        8 => many1(oct_digit()),
        _ => many1(digit()),
    }
}

/// Parses the digits of a natural number together with their base.
fn natural_digits<S, U>() -> Parser<S, U, (u32, Vec<char>)>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let hex = one_of("xX").then(digits_in(16)).map(|ds| (16, ds));
    let oct = one_of("oO").then(digits_in(8)).map(|ds| (8, ds));
    let dec = || digits_in(10).map(|ds| (10, ds));

    let zero_number = char('0')
        .then(hex.or(oct).or(dec()).or(pure_with(|| (10, vec!['0']))))
        .label("");
    zero_number.or(dec())
}

/// Converts `digits` in `base` to a number, failing if it does not fit.
fn from_digits<S, U, N>(base: u32, digits: &[char], negative: bool) -> Parser<S, U, N>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
    N: Num + CheckedAdd + CheckedSub + CheckedMul + From<u8> + Clone + Send + Sync + 'static,
{
    let radix = <N as From<u8>>::from(base as u8);
    let value = digits.iter().try_fold(N::zero(), |acc, c| {
        let digit = <N as From<u8>>::from(c.to_digit(base)? as u8);
        let acc = acc.checked_mul(&radix)?;
        match negative {
            true => acc.checked_sub(&digit),
            false => acc.checked_add(&digit),
        }
    });

    match value {
        Some(value) => pure(value),
        None => fail("integer literal is too large"),
    }
}

/// Parses the fraction and exponent of a float, returning them as text.
fn fraction_exponent<S, U>() -> Parser<S, U, String>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let fraction = char('.')
        .then(many1(digit()).label("fraction"))
        .map(|ds| std::iter::once('.').chain(ds).collect::<String>())
        .label("fraction");
    let exponent = || {
        one_of("eE")
            .then(option_maybe(one_of("+-")))
            .pair(many1(digit()).label("exponent"))
            .map(|(sign, ds)| {
                let sign = sign.map(String::from).unwrap_or_default();
                format!("e{sign}{}", ds.into_iter().collect::<String>())
            })
            .label("exponent")
    };

    fraction
        .pair(option(String::new(), exponent()))
        .map(|(fraction, exponent)| fraction + &exponent)
        .or(exponent())
}

/// Reads `text` as a float.
fn read_float<S, U>(text: &str) -> Parser<S, U, f64>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    match text.parse() {
        Ok(value) => pure(value),
        Err(_) => fail(format!("invalid float literal {text}")),
    }
}

/// Parses an unsigned float with a mandatory fraction or exponent.
fn floating<S, U>() -> Parser<S, U, f64>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    digits_in(10)
        .map(|ds| ds.into_iter().collect::<String>())
        .pair(fraction_exponent())
        .and_then(|(whole, rest)| read_float(&(whole + &rest)))
}

/// Parses an unsigned integer or float, as in `natural_or_float`.
fn natural_or_float<S, U>() -> Parser<S, U, Number>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let fract_float = |whole: String| {
        fraction_exponent::<S, U>()
            .and_then(move |rest| read_float(&format!("{whole}{rest}")))
            .map(Number::Float)
    };
    let decimal_float = move || {
        digits_in::<S, U>(10).and_then(move |digits| {
            let whole: String = digits.iter().collect();
            from_digits(10, &digits, false)
                .map(Number::Integer)
                .and_then(move |n| option(n, fract_float(whole.clone())))
        })
    };

    let prefixed = one_of("xX")
        .then(digits_in(16))
        .map(|ds| (16, ds))
        .or(one_of("oO").then(digits_in(8)).map(|ds| (8, ds)))
        .and_then(|(base, digits)| from_digits(base, &digits, false).map(Number::Integer));

    let zero = char('0').then(
        prefixed
            .or(decimal_float())
            .or(fract_float("0".into()))
            .or(pure(Number::Integer(0))),
    );
    zero.or(decimal_float())
}

/// The built-in escape codes following a backslash.
fn escape_code<S, U>() -> Parser<S, U, char>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    let mnemonic = choice(
        MNEMONIC_ESCAPES
            .iter()
            .map(|&(code, value)| char(code).map(move |_| value)),
    );

    let numeric = digits_in(10)
        .map(|ds| (10, ds))
        .or(char('o').then(digits_in(8)).map(|ds| (8, ds)))
        .or(char('x').then(digits_in(16)).map(|ds| (16, ds)))
        .and_then(|(base, digits)| {
            let code = digits
                .iter()
                .try_fold(0u32, |acc, c| acc.checked_mul(base)?.checked_add(c.to_digit(base)?));
            match code.filter(|&code| code <= MAX_CODE_POINT).and_then(char::from_u32) {
                Some(c) => pure(c),
                None => fail("invalid escape sequence"),
            }
        });

    let ascii = choice(
        ASCII_ESCAPES
            .iter()
            .map(|&(code, value)| attempt(string(code)).map(move |_| value)),
    );

    let control = char('^').then(one_of(CONTROL_CHARS).map(|c| {
        let code = u32::from(c) - u32::from('@');
        char::from_u32(code).unwrap_or('\0')
    }));

    mnemonic
        .or(numeric)
        .or(ascii)
        .or(control)
        .label("escape code")
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use crate::{combinator::eof, error::Message, stream::Text};

    use super::*;

    type P<T> = Parser<Text, (), T>;

    fn haskell() -> TokenParser<Text, ()> {
        TokenParser::new(LanguageDef::haskell().with_reserved_names(["let", "in"]))
    }

    fn java() -> TokenParser<Text, ()> {
        TokenParser::new(LanguageDef::java_style().with_reserved_names(["class", "while"]))
    }

    fn full<T: 'static>(lexer: &TokenParser<Text, ()>, parser: P<T>) -> P<T> {
        lexer.white_space().then(parser).skip(eof())
    }

    #[test]
    fn number_distinguishes_integers_and_floats() {
        let lexer = haskell();
        let number = full(&lexer, lexer.number());
        assert_eq!(number.parse("t", "1234").unwrap(), Number::Integer(1234));
        assert_eq!(number.parse("t", "1234.0").unwrap(), Number::Float(1234.0));
        assert_eq!(number.parse("t", "0x1f").unwrap(), Number::Integer(31));
        assert_eq!(number.parse("t", "-2.5e2").unwrap(), Number::Float(-250.0));
        assert_eq!(number.parse("t", "-7").unwrap(), Number::Integer(-7));
    }

    #[test]
    fn natural_or_float_is_correct() {
        let lexer = haskell();
        let p = full(&lexer, lexer.natural_or_float());
        assert_eq!(p.parse("t", "0").unwrap(), Number::Integer(0));
        assert_eq!(p.parse("t", "0.5").unwrap(), Number::Float(0.5));
        assert_eq!(p.parse("t", "0o17").unwrap(), Number::Integer(15));
        assert_eq!(p.parse("t", "1e3").unwrap(), Number::Float(1000.0));
        assert_eq!(p.parse("t", "42").unwrap(), Number::Integer(42));
        assert!(p.parse("t", "1.").is_err());
    }

    #[test]
    fn naturals_in_every_base() {
        let lexer = haskell();
        let p = full(&lexer, lexer.natural());
        assert_eq!(p.parse("t", "0").unwrap(), 0);
        assert_eq!(p.parse("t", "0xFF").unwrap(), 255);
        assert_eq!(p.parse("t", "0o777").unwrap(), 511);
        assert_eq!(p.parse("t", "007").unwrap(), 7);
        assert_eq!(p.parse("t", "12  ").unwrap(), 12);

        assert_eq!(lexer.decimal().parse("t", "99").unwrap(), 99);
        assert_eq!(lexer.hexadecimal().parse("t", "x1A").unwrap(), 26);
        assert_eq!(lexer.octal().parse("t", "o10").unwrap(), 8);
    }

    #[test]
    fn integer_overflow_is_a_parse_error() {
        let lexer = haskell();
        let error = lexer.integer().parse("t", "99999999999999999999").unwrap_err();
        assert!(error
            .messages()
            .contains(&Message::Generic("integer literal is too large".into())));

        assert_eq!(
            lexer.integer().parse("t", "-9223372036854775808").unwrap(),
            i64::MIN
        );

        let big: P<BigInt> = lexer.integer_of();
        assert_eq!(
            big.parse("t", "-99999999999999999999").unwrap(),
            "-99999999999999999999".parse::<BigInt>().unwrap()
        );

        let float = lexer.integer_as_float();
        assert_eq!(float.parse("t", "99999999999999999999").unwrap(), 1e20);
        assert_eq!(float.parse("t", "- 0x10").unwrap(), -16.0);
    }

    #[test]
    fn float_requires_fraction_or_exponent() {
        let lexer = haskell();
        assert_eq!(lexer.float().parse("t", "3.25").unwrap(), 3.25);
        assert_eq!(lexer.float().parse("t", "5E-1").unwrap(), 0.5);
        assert!(lexer.float().parse("t", "3").is_err());
    }

    #[test]
    fn identifier_rejects_reserved_words() {
        let lexer = haskell();
        assert_eq!(lexer.identifier().parse("t", "letter").unwrap(), "letter");
        assert_eq!(lexer.identifier().parse("t", "x_1' ").unwrap(), "x_1'");

        let error = lexer.identifier().parse("t", "let").unwrap_err();
        assert!(error
            .messages()
            .contains(&Message::Unexpected("reserved word let".into())));
        // reported where the identifier ends
        assert_eq!(
            error.to_string(),
            "\"t\" (line 1, column 4):\nunexpected reserved word let\nexpecting letter or digit"
        );
    }

    #[test]
    fn reserved_is_longest_match() {
        let lexer = haskell();
        let p = lexer.reserved("let").then(lexer.identifier());
        assert_eq!(p.parse("t", "let x").unwrap(), "x");

        let error = lexer.reserved("let").parse("t", "lets").unwrap_err();
        assert!(error
            .messages()
            .contains(&Message::Expected("end of \"let\"".into())));
    }

    #[test]
    fn case_insensitive_reserved_names() {
        let lexer = java();
        assert!(lexer.reserved("while").parse("t", "WHILE").is_ok());
        assert!(lexer.reserved("while").parse("t", "wHiLe (").is_ok());
        assert!(lexer.identifier().parse("t", "Class").is_err());
        assert!(lexer.is_reserved_name("CLASS"));
        assert!(!haskell().is_reserved_name("LET"));
    }

    #[test]
    fn operators_and_reserved_operators() {
        let lexer = haskell();
        assert_eq!(lexer.operator().parse("t", ">>= x").unwrap(), ">>=");

        let error = lexer.operator().parse("t", "->").unwrap_err();
        assert!(error
            .messages()
            .contains(&Message::Unexpected("reserved operator ->".into())));

        assert!(lexer.reserved_op("=").parse("t", "= 1").is_ok());
        assert!(lexer.reserved_op("=").parse("t", "== 1").is_err());
    }

    #[test]
    fn white_space_skips_comments() {
        let lexer = haskell();
        let p = full(&lexer, lexer.identifier());
        assert_eq!(p.parse("t", "  -- note\n x -- trailing").unwrap(), "x");
        assert_eq!(p.parse("t", "{- a {- nested -} b -} x {--}").unwrap(), "x");
        assert!(p.parse("t", "{- open {- -} x").is_err());

        let lexer = java();
        let p = full(&lexer, lexer.identifier());
        assert_eq!(p.parse("t", "/* a */ // b\n\tx /***/").unwrap(), "x");
    }

    #[test]
    fn flat_comments_do_not_nest() {
        let language = LanguageDef {
            nested_comments: false,
            ..LanguageDef::java_style()
        };
        let lexer: TokenParser<Text, ()> = TokenParser::new(language);
        let p = full(&lexer, lexer.identifier());
        assert_eq!(p.parse("t", "/* /* */ x").unwrap(), "x");
    }

    #[test]
    fn long_and_deep_comments_are_skipped() {
        let lexer = java();
        let p = full(&lexer, lexer.identifier());
        let banner = format!("/*{}*/x", "* ".repeat(50_000));
        assert_eq!(p.parse("t", banner).unwrap(), "x");

        let lexer = haskell();
        let p = full(&lexer, lexer.identifier());
        let deep = format!("{}{}x", "{-".repeat(10_000), "-}".repeat(10_000));
        assert_eq!(p.parse("t", deep).unwrap(), "x");
        let unclosed = format!("{}{}x", "{-".repeat(10_000), "-}".repeat(9_999));
        assert!(p.parse("t", unclosed).is_err());
    }

    #[test]
    fn char_literals_decode_escapes() {
        let lexer = haskell();
        let p = lexer.char_literal();
        assert_eq!(p.parse("t", "'a'").unwrap(), 'a');
        assert_eq!(p.parse("t", "'\\n'").unwrap(), '\n');
        assert_eq!(p.parse("t", "'\\''").unwrap(), '\'');
        assert_eq!(p.parse("t", "'\\65'").unwrap(), 'A');
        assert_eq!(p.parse("t", "'\\x41'").unwrap(), 'A');
        assert_eq!(p.parse("t", "'\\o101'").unwrap(), 'A');
        assert_eq!(p.parse("t", "'\\NUL'").unwrap(), '\0');
        assert_eq!(p.parse("t", "'\\SOH'").unwrap(), '\x01');
        assert_eq!(p.parse("t", "'\\SO'").unwrap(), '\x0e');
        assert_eq!(p.parse("t", "'\\DEL'").unwrap(), '\x7f');
        assert_eq!(p.parse("t", "'\\^@'").unwrap(), '\0');
        assert_eq!(p.parse("t", "'\\^A'").unwrap(), '\x01');
        assert_eq!(p.parse("t", "'\\^_'").unwrap(), '\x1f');
        assert!(p.parse("t", "'\\1114112'").is_err());
        assert!(p.parse("t", "'ab'").is_err());
    }

    #[test]
    fn string_literals_decode_gaps_and_empty_escapes() {
        let lexer = haskell();
        let p = lexer.string_literal();
        assert_eq!(p.parse("t", "\"a\\tb\"").unwrap(), "a\tb");
        assert_eq!(p.parse("t", "\"ab\\   \n   \\cd\"").unwrap(), "abcd");
        assert_eq!(p.parse("t", "\"\\SO\\&H\"").unwrap(), "\x0eH");
        assert_eq!(p.parse("t", "\"\\1234\\&5\"").unwrap(), "\u{4d2}5");

        let error = p.parse("t", "\"open").unwrap_err();
        assert!(error
            .messages()
            .contains(&Message::Expected("end of string".into())));
    }

    #[test]
    fn custom_escape_replaces_builtin_table() {
        let language = LanguageDef {
            char_escape: Some(char('e').map(|_| '\x1b')),
            ..LanguageDef::haskell_style()
        };
        let lexer: TokenParser<Text, ()> = TokenParser::new(language);
        assert_eq!(lexer.char_literal().parse("t", "'\\e'").unwrap(), '\x1b');
        assert!(lexer.char_literal().parse("t", "'\\n'").is_err());
    }

    #[test]
    fn bracketing_and_separators() {
        let lexer = java();
        let list = full(&lexer, lexer.brackets(lexer.comma_sep(lexer.natural())));
        assert_eq!(list.parse("t", "[ 1 , 2,3 ]").unwrap(), vec![1, 2, 3]);
        assert_eq!(list.parse("t", "[]").unwrap(), Vec::<i64>::new());

        let block = full(&lexer, lexer.braces(lexer.semi_sep1(lexer.identifier())));
        assert_eq!(block.parse("t", "{ a; b }").unwrap(), vec!["a", "b"]);
        assert!(block.parse("t", "{}").is_err());

        let generic = full(&lexer, lexer.angles(lexer.comma_sep1(lexer.identifier())));
        assert_eq!(generic.parse("t", "<K, V>").unwrap(), vec!["K", "V"]);

        let path = full(&lexer, lexer.semi_sep(lexer.identifier().skip(lexer.colon())));
        assert_eq!(path.parse("t", "a:;b:").unwrap(), vec!["a", "b"]);

        let dotted = full(&lexer, sep_by1(lexer.identifier(), lexer.dot()));
        assert_eq!(dotted.parse("t", "std . io").unwrap(), vec!["std", "io"]);
    }

    #[test]
    fn lexemes_track_positions() {
        let lexer = haskell();
        let p = lexer
            .symbol("(")
            .then(crate::parser::get_position())
            .skip(lexer.identifier());
        let pos = p.parse("t", "(\n\t x").unwrap();
        assert_eq!((pos.line(), pos.column()), (2, 10));
    }
}
