//! Language definitions consumed by [`TokenParser`](crate::token::TokenParser).

use crate::{
    character::{alpha_num, char, letter, one_of},
    parser::Parser,
    stream::Stream,
};

/// The characters that may appear in an operator in the predefined styles.
pub const OPERATOR_CHARS: &str = ":!#$%&*+./<=>?@\\^|-~";

/// The lexical structure of a language.
///
/// An empty comment marker disables that kind of comment.
pub struct LanguageDef<S, U> {
    /// Opens a block comment, e.g. `/*`.
    pub comment_start: String,
    /// Closes a block comment, e.g. `*/`.
    pub comment_end: String,
    /// Starts a comment running to the end of the line, e.g. `//`.
    pub comment_line: String,
    /// Whether block comments nest.
    pub nested_comments: bool,
    /// Accepts the first character of an identifier.
    pub ident_start: Parser<S, U, char>,
    /// Accepts the remaining characters of an identifier.
    pub ident_letter: Parser<S, U, char>,
    /// Accepts the first character of an operator.
    pub op_start: Parser<S, U, char>,
    /// Accepts the remaining characters of an operator.
    pub op_letter: Parser<S, U, char>,
    /// Identifiers that are keywords.
    pub reserved_names: Vec<String>,
    /// Operators that are reserved symbols.
    pub reserved_op_names: Vec<String>,
    /// Whether reserved names are matched case-sensitively.
    pub case_sensitive: bool,
    /// Replaces the built-in escape codes of character and string literals.
    pub char_escape: Option<Parser<S, U, char>>,
}

impl<S, U> Clone for LanguageDef<S, U> {
    fn clone(&self) -> Self {
        Self {
            comment_start: self.comment_start.clone(),
            comment_end: self.comment_end.clone(),
            comment_line: self.comment_line.clone(),
            nested_comments: self.nested_comments,
            ident_start: self.ident_start.clone(),
            ident_letter: self.ident_letter.clone(),
            op_start: self.op_start.clone(),
            op_letter: self.op_letter.clone(),
            reserved_names: self.reserved_names.clone(),
            reserved_op_names: self.reserved_op_names.clone(),
            case_sensitive: self.case_sensitive,
            char_escape: self.char_escape.clone(),
        }
    }
}

impl<S, U> std::fmt::Debug for LanguageDef<S, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageDef")
            .field("comment_start", &self.comment_start)
            .field("comment_end", &self.comment_end)
            .field("comment_line", &self.comment_line)
            .field("nested_comments", &self.nested_comments)
            .field("reserved_names", &self.reserved_names)
            .field("reserved_op_names", &self.reserved_op_names)
            .field("case_sensitive", &self.case_sensitive)
            .finish_non_exhaustive()
    }
}

impl<S, U> LanguageDef<S, U>
where
    S: Stream<Token = char>,
    U: Clone + 'static,
{
    /// A language without comments or reserved words, whose identifiers
    /// are letters, digits, `_` and `'` (not starting with a digit or `'`).
    pub fn empty() -> Self {
        Self {
            comment_start: String::new(),
            comment_end: String::new(),
            comment_line: String::new(),
            nested_comments: true,
            ident_start: letter().or(char('_')),
            ident_letter: alpha_num().or(one_of("_'")),
            op_start: one_of(OPERATOR_CHARS),
            op_letter: one_of(OPERATOR_CHARS),
            reserved_names: Vec::new(),
            reserved_op_names: Vec::new(),
            case_sensitive: true,
            char_escape: None,
        }
    }

    /// Java-like comments (`/* */`, `//`), case-insensitive reserved names.
    pub fn java_style() -> Self {
        Self {
            comment_start: "/*".into(),
            comment_end: "*/".into(),
            comment_line: "//".into(),
            nested_comments: true,
            ident_start: letter(),
            case_sensitive: false,
            ..Self::empty()
        }
    }

    /// Haskell-like comments (`{- -}`, `--`), case-sensitive reserved names.
    pub fn haskell_style() -> Self {
        Self {
            comment_start: "{-".into(),
            comment_end: "-}".into(),
            comment_line: "--".into(),
            nested_comments: true,
            ident_start: letter(),
            case_sensitive: true,
            ..Self::empty()
        }
    }

    /// The lexical structure of Haskell 98.
    pub fn haskell() -> Self {
        Self::haskell_style()
            .with_reserved_names([
                "let", "in", "case", "of", "if", "then", "else", "data", "type", "class",
                "default", "deriving", "do", "import", "infix", "infixl", "infixr", "instance",
                "module", "newtype", "where", "primitive",
            ])
            .with_reserved_op_names(["::", "..", "=", "\\", "|", "<-", "->", "@", "~", "=>"])
    }

    /// Replaces the reserved names.
    pub fn with_reserved_names<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            reserved_names: names.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Replaces the reserved operator names.
    pub fn with_reserved_op_names<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            reserved_op_names: names.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}
