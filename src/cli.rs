//! The command-line interface for `parsekit`.
//!
//! Usage (as with any other [`argh`] interface) involves first invoking [`argh::from_env()`], and
//! then processing the resulting data (in this case an instance of [`Cli`]).

#![allow(clippy::missing_docs_in_private_items)]

use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context};
use argh::FromArgs;
use num_bigint::BigInt;
use parsekit::{
    character::one_of,
    combinator::{choice, eof, many},
    language::LanguageDef,
    parser::get_position,
    token::{Number, TokenParser},
    Parser, SourcePos, Text,
};
use tracing::{debug, info};

use crate::calc::{self, Integer};

/// A demonstration driver for the parsekit combinator library.
#[derive(Debug, Clone, FromArgs)]
pub struct Cli {
    #[argh(subcommand)]
    cmd: CliSubCommand,
}

impl Cli {
    /// Consumes `self` and processes the given subcommand.
    pub fn handle(self) -> anyhow::Result<()> {
        match self.cmd {
            CliSubCommand::Calc(args) => match args.bigint {
                true => args.run::<BigInt>(),
                false => args.run::<i64>(),
            },
            CliSubCommand::Lex(args) => args.run(),
        }
    }
}

/// The set of the distinct subcommands available to be passed to the [`Cli`].
#[derive(Debug, Clone, FromArgs)]
#[argh(subcommand)]
enum CliSubCommand {
    Calc(Calc),
    Lex(Lex),
}

/// Parses an arithmetic expression, prints it as an s-expression and evaluates it.
#[derive(Debug, Clone, FromArgs)]
#[argh(subcommand, name = "calc")]
struct Calc {
    /// define a set of variable bindings via a comma-separated list
    /// (e.g. {{ x: 2, y: -1 }}), where the empty set is given by {{}}
    #[argh(option, long = "let", short = 'l')]
    bindings: Option<Bindings>,

    /// use arbitrary-precision integers during evaluation
    #[argh(switch)]
    bigint: bool,

    /// the expression to evaluate, instead of reading it from a file
    #[argh(option, short = 'e')]
    expr: Option<String>,

    /// a path to a file containing the expression
    #[argh(positional)]
    file: Option<PathBuf>,
}

impl Calc {
    /// Consumes `self` and evaluates the given expression.
    fn run<N: Integer>(self) -> anyhow::Result<()> {
        let (name, source) = match (self.expr, &self.file) {
            (Some(expr), None) => ("<expr>".to_owned(), expr),
            (None, Some(file)) => (file.display().to_string(), read_source(file)?),
            (Some(_), Some(_)) => return Err(anyhow!("pass either --expr or FILE, not both")),
            (None, None) => return Err(anyhow!("no expression given; pass --expr or FILE")),
        };

        let expr = calc::parse::<N>(&name, &source)?;
        println!("{expr}");

        let bindings: HashMap<String, N> = self
            .bindings
            .map(|bindings| {
                bindings
                    .map
                    .into_iter()
                    .map(|(key, value)| (key, N::from(value)))
                    .collect()
            })
            .unwrap_or_default();

        let value = expr.eval(&bindings)?;
        info!(%name, "evaluated expression");
        println!("{value}");
        Ok(())
    }
}

/// Tokenizes a file and prints one token per line.
#[derive(Debug, Clone, FromArgs)]
#[argh(subcommand, name = "lex")]
struct Lex {
    /// the lexical conventions to use, either `java` or `haskell`
    #[argh(option, default = "Style::Haskell")]
    style: Style,

    /// a path to the file to tokenize
    #[argh(positional)]
    file: PathBuf,
}

impl Lex {
    /// Consumes `self` and prints the tokens of the given file.
    fn run(self) -> anyhow::Result<()> {
        let source = read_source(&self.file)?;
        let lexer = TokenParser::new(self.style.language());
        let tokens = tokenizer(&lexer).parse(&self.file.display().to_string(), source)?;

        info!(count = tokens.len(), style = ?self.style, "tokenized file");
        for (position, lexeme) in tokens {
            println!("{}:{} {lexeme}", position.line(), position.column());
        }
        Ok(())
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    debug!(path = %path.display(), "reading source");
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

/// The lexical conventions accepted by the `lex` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Java,
    Haskell,
}

impl Style {
    fn language(self) -> LanguageDef<Text, ()> {
        match self {
            Style::Java => LanguageDef::java_style()
                .with_reserved_names([
                    "class", "else", "for", "if", "new", "null", "return", "static", "void",
                    "while",
                ])
                .with_reserved_op_names(["=", "==", "!", "&&", "||"]),
            Style::Haskell => LanguageDef::haskell(),
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Style::Java),
            "haskell" => Ok(Style::Haskell),
            other => Err(format!("unknown style `{other}`, expected `java` or `haskell`")),
        }
    }
}

/// A single token recognised by the `lex` subcommand.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Identifier(String),
    Reserved(String),
    Operator(String),
    ReservedOp(String),
    Number(Number),
    Char(char),
    String(String),
    Punctuation(char),
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lexeme::Identifier(name) => write!(f, "identifier {name}"),
            Lexeme::Reserved(name) => write!(f, "reserved {name}"),
            Lexeme::Operator(name) => write!(f, "operator {name}"),
            Lexeme::ReservedOp(name) => write!(f, "reserved-op {name}"),
            Lexeme::Number(Number::Integer(int)) => write!(f, "number {int}"),
            Lexeme::Number(Number::Float(float)) => write!(f, "number {float:?}"),
            Lexeme::Char(c) => write!(f, "char {c:?}"),
            Lexeme::String(s) => write!(f, "string {s:?}"),
            Lexeme::Punctuation(c) => write!(f, "punctuation {c}"),
        }
    }
}

/// Builds a parser for a whole file of tokens, each paired with its starting position.
fn tokenizer(lexer: &TokenParser<Text, ()>) -> Parser<Text, (), Vec<(SourcePos, Lexeme)>> {
    let reserved = lexer.language().reserved_names.iter().map(|name| {
        let lexeme = Lexeme::Reserved(name.clone());
        lexer.reserved(name).map(move |()| lexeme.clone())
    });

    let reserved_op = lexer.language().reserved_op_names.iter().map(|name| {
        let lexeme = Lexeme::ReservedOp(name.clone());
        lexer.reserved_op(name).map(move |()| lexeme.clone())
    });

    let token = choice([
        lexer.identifier().map(Lexeme::Identifier),
        choice(reserved.collect::<Vec<_>>()),
        lexer.operator().map(Lexeme::Operator),
        choice(reserved_op.collect::<Vec<_>>()),
        lexer.natural_or_float().map(Lexeme::Number),
        lexer.char_literal().map(Lexeme::Char),
        lexer.string_literal().map(Lexeme::String),
        lexer.lexeme(one_of("()[]{};,`")).map(Lexeme::Punctuation),
    ]);

    lexer
        .white_space()
        .then(many(get_position().pair(token)))
        .skip(eof())
}

/// A set of name-value pairs that can be optionally provided to `calc`,
/// binding the variables of the expression.
#[derive(Debug, Clone)]
struct Bindings {
    /// The actual key-value pairs, mapping names to their bound values.
    map: HashMap<String, i64>,
}

impl FromStr for Bindings {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lexer = TokenParser::new(LanguageDef::<Text, ()>::empty());
        let binding = lexer
            .identifier()
            .label("name")
            .skip(lexer.colon())
            .pair(lexer.integer());

        lexer
            .white_space()
            .then(lexer.braces(lexer.comma_sep(binding)))
            .skip(eof())
            .parse("--let", s)
            .map(|pairs| Bindings {
                map: pairs.into_iter().collect(),
            })
            .map_err(|err| format!("\n{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_bindings_parser() {
        let input = "{ X: 2,    \t\nY :3, \t\n\r Z   :\n -4  \t}";
        let bindings = Bindings::from_str(input).unwrap();
        assert_eq!(bindings.map.get("X"), Some(&2));
        assert_eq!(bindings.map.get("Y"), Some(&3));
        assert_eq!(bindings.map.get("Z"), Some(&-4));

        assert!(Bindings::from_str("{}").unwrap().map.is_empty());
    }

    #[test]
    fn malformed_bindings_are_rejected() {
        let err = Bindings::from_str("{ x 1 }").unwrap_err();
        dbg!(&err);
        assert!(err.contains("\":\""));

        assert!(Bindings::from_str("{ x: 1,, y: 2 }").is_err());
        assert!(Bindings::from_str("{ x: 1 } trailing").is_err());
    }

    #[test]
    fn styles_parse_from_names() {
        assert_eq!("java".parse::<Style>(), Ok(Style::Java));
        assert_eq!("haskell".parse::<Style>(), Ok(Style::Haskell));
        assert!("cobol".parse::<Style>().is_err());
    }

    #[test]
    fn haskell_tokens_are_classified() {
        let lexer = TokenParser::new(Style::Haskell.language());
        let source = "let f x = x + 0x1F -- comment\nin f 'a' \"s\\n\" 2.5e1 (x)";
        let tokens = tokenizer(&lexer).parse("t", source).unwrap();

        let rendered: Vec<String> = tokens
            .iter()
            .map(|(position, lexeme)| format!("{}:{} {lexeme}", position.line(), position.column()))
            .collect();

        assert_eq!(
            rendered,
            vec![
                "1:1 reserved let",
                "1:5 identifier f",
                "1:7 identifier x",
                "1:9 reserved-op =",
                "1:11 identifier x",
                "1:13 operator +",
                "1:15 number 31",
                "2:1 reserved in",
                "2:4 identifier f",
                "2:6 char 'a'",
                "2:10 string \"s\\n\"",
                "2:16 number 25.0",
                "2:22 punctuation (",
                "2:23 identifier x",
                "2:24 punctuation )",
            ]
        );
    }

    #[test]
    fn java_reserved_names_ignore_case() {
        let lexer = TokenParser::new(Style::Java.language());
        let tokens = tokenizer(&lexer)
            .parse("t", "WHILE (done == null) /* wait */ return;")
            .unwrap();
        let lexemes: Vec<Lexeme> = tokens.into_iter().map(|(_, lexeme)| lexeme).collect();

        assert_eq!(
            lexemes,
            vec![
                Lexeme::Reserved("while".into()),
                Lexeme::Punctuation('('),
                Lexeme::Identifier("done".into()),
                Lexeme::ReservedOp("==".into()),
                Lexeme::Reserved("null".into()),
                Lexeme::Punctuation(')'),
                Lexeme::Reserved("return".into()),
                Lexeme::Punctuation(';'),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let lexer = TokenParser::new(Style::Haskell.language());
        assert!(tokenizer(&lexer).parse("t", "x = \"open").is_err());
    }
}
