//! Parse errors: a position plus an ordered set of classified messages.
//!
//! # Merging
//! Errors produced by alternative branches are combined with
//! [`ParseError::merge`]. The error at the strictly later position wins
//! outright; at equal positions the message sets are unioned, keeping the
//! order in which messages were first seen. An error without messages never
//! displaces one that has some.
//!
//! # Rendering
//! [`ParseError::render`] produces the position header followed by at most
//! one `unexpected` line, at most one `expecting` line and one line per
//! generic message, e.g.
//!
//! ```text
//! "input" (line 1, column 3):
//! unexpected "x"
//! expecting digit, "." or end of input
//! ```

use thiserror::Error;

use crate::{locale::Localizer, pos::SourcePos};

/// A single classified diagnostic message.
///
/// Equality is by kind and text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    /// An unexpected token, reported by the engine itself. The empty string
    /// stands for the end of the input.
    SysUnexpected(String),
    /// An unexpected item, reported by user code (see [`crate::parser::unexpected`]).
    Unexpected(String),
    /// Something that would have been accepted at this position.
    Expected(String),
    /// Any other message (see [`crate::parser::fail`]).
    Generic(String),
}

impl Message {
    /// The text carried by this message.
    pub fn text(&self) -> &str {
        match self {
            Message::SysUnexpected(text)
            | Message::Unexpected(text)
            | Message::Expected(text)
            | Message::Generic(text) => text,
        }
    }

    /// Returns `true` if `self` and `other` have the same kind.
    pub fn same_kind(&self, other: &Message) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", show_error(.position, .messages, &Localizer::identity()))]
pub struct ParseError {
    /// Where the error occurred.
    position: SourcePos,
    /// The messages, in insertion order and without duplicates.
    messages: Vec<Message>,
}

impl ParseError {
    /// An error carrying no information at `position`.
    pub fn new_unknown(position: SourcePos) -> Self {
        Self {
            position,
            messages: Vec::new(),
        }
    }

    /// An error at `position` carrying the single `message`.
    pub fn new_message(position: SourcePos, message: Message) -> Self {
        Self {
            position,
            messages: vec![message],
        }
    }

    /// An engine-generated "unexpected `label`" error at `position`.
    pub fn new_unexpected(position: SourcePos, label: impl Into<String>) -> Self {
        Self::new_message(position, Message::SysUnexpected(label.into()))
    }

    /// Where this error occurred.
    pub fn position(&self) -> &SourcePos {
        &self.position
    }

    /// The messages carried by this error.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns `true` if this error carries no messages.
    pub fn is_unknown(&self) -> bool {
        self.messages.is_empty()
    }

    /// Moves this error to `position`.
    pub fn set_position(&mut self, position: SourcePos) {
        self.position = position;
    }

    /// Appends `message` unless an equal message is already present.
    pub fn add_message(&mut self, message: Message) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Removes every message of the same kind as `message`, then adds it.
    pub fn set_message(&mut self, message: Message) {
        self.messages.retain(|m| !m.same_kind(&message));
        self.messages.push(message);
    }

    /// Replaces the expected messages with one [`Message::Expected`] per
    /// label. An empty `labels` installs the hidden label `""`.
    pub fn set_expected<L: AsRef<str>>(&mut self, labels: &[L]) {
        match labels.split_first() {
            None => self.set_message(Message::Expected(String::new())),
            Some((first, rest)) => {
                self.set_message(Message::Expected(first.as_ref().to_owned()));
                for label in rest {
                    self.add_message(Message::Expected(label.as_ref().to_owned()));
                }
            }
        }
    }

    /// Merges two errors (see the [module documentation](self)).
    pub fn merge(mut self, other: ParseError) -> ParseError {
        if other.is_unknown() && !self.is_unknown() {
            return self;
        }

        if self.is_unknown() && !other.is_unknown() {
            return other;
        }

        match self.position.cmp(&other.position) {
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Equal => {
                for message in other.messages {
                    self.add_message(message);
                }
                self
            }
        }
    }

    /// Renders this error, translating the fixed phrases and the expected
    /// labels with `localizer`.
    pub fn render(&self, localizer: &Localizer) -> String {
        show_error(&self.position, &self.messages, localizer)
    }
}

/// Renders a position header followed by the message lines.
fn show_error(position: &SourcePos, messages: &[Message], localizer: &Localizer) -> String {
    let mut out = format!("{position}:");
    for line in show_messages(messages, localizer) {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

/// Renders `messages` as a list of lines.
fn show_messages(messages: &[Message], localizer: &Localizer) -> Vec<String> {
    if messages.is_empty() {
        return vec![localizer.translate("unknown parse error")];
    }

    let mut lines = Vec::new();
    let unexpected = localizer.translate("unexpected");

    let user_unexpected = messages.iter().find_map(|m| match m {
        Message::Unexpected(text) if !text.is_empty() => Some(text),
        _ => None,
    });
    let sys_unexpected = messages.iter().find_map(|m| match m {
        Message::SysUnexpected(text) => Some(text),
        _ => None,
    });

    match (user_unexpected, sys_unexpected) {
        (Some(text), _) => lines.push(format!("{unexpected} {text}")),
        (None, Some(text)) if text.is_empty() => lines.push(format!(
            "{unexpected} {}",
            localizer.translate("end of input")
        )),
        (None, Some(text)) => lines.push(format!("{unexpected} {text}")),
        (None, None) => {}
    }

    let expected = clean(messages.iter().filter_map(|m| match m {
        Message::Expected(text) => Some(localizer.translate(text)),
        _ => None,
    }));
    if !expected.is_empty() {
        lines.push(format!(
            "{} {}",
            localizer.translate("expecting"),
            commas_or(&expected, &localizer.translate("or"))
        ));
    }

    lines.extend(clean(messages.iter().filter_map(|m| match m {
        Message::Generic(text) => Some(text.clone()),
        _ => None,
    })));

    lines
}

/// Drops empty strings and duplicates, keeping first occurrences.
fn clean(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Joins `items` as `a, b or c`.
fn commas_or(items: &[String], or: &str) -> String {
    match items.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, init)) => format!("{} {or} {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn pos(column: usize) -> SourcePos {
        SourcePos::at("input", 1, column)
    }

    #[test]
    fn unknown_error_renders_as_unknown() {
        let error = ParseError::new_unknown(pos(1));
        assert_eq!(error.to_string(), "\"input\" (line 1, column 1):\nunknown parse error");
    }

    #[test]
    fn render_is_correct() {
        let mut error = ParseError::new_unexpected(pos(3), "\"x\"");
        error.add_message(Message::Expected("digit".into()));
        error.add_message(Message::Expected("\".\"".into()));
        error.add_message(Message::Expected("digit".into()));
        error.add_message(Message::Expected("end of input".into()));
        error.add_message(Message::Generic("bad number".into()));
        error.add_message(Message::Generic("really bad".into()));

        assert_eq!(
            error.to_string(),
            "\"input\" (line 1, column 3):\n\
             unexpected \"x\"\n\
             expecting digit, \".\" or end of input\n\
             bad number\n\
             really bad"
        );
    }

    #[test]
    fn user_unexpected_takes_precedence() {
        let mut error = ParseError::new_unexpected(pos(1), "");
        error.add_message(Message::Unexpected("reserved word let".into()));
        assert_eq!(
            error.to_string(),
            "\"input\" (line 1, column 1):\nunexpected reserved word let"
        );
    }

    #[test]
    fn empty_sys_unexpected_is_end_of_input() {
        let mut error = ParseError::new_unexpected(pos(1), "");
        error.set_expected(&["letter"]);
        assert_eq!(
            error.to_string(),
            "\"input\" (line 1, column 1):\nunexpected end of input\nexpecting letter"
        );
    }

    #[test]
    fn hidden_labels_are_not_rendered() {
        let mut error = ParseError::new_unexpected(pos(1), "\"x\"");
        error.set_expected::<&str>(&[]);
        assert_eq!(error.to_string(), "\"input\" (line 1, column 1):\nunexpected \"x\"");
    }

    #[test]
    fn set_expected_replaces_only_expected_messages() {
        let mut error = ParseError::new_unexpected(pos(1), "\"x\"");
        error.add_message(Message::Expected("a".into()));
        error.add_message(Message::Expected("b".into()));
        error.set_expected(&["number", "name"]);
        assert_eq!(
            error.messages(),
            &[
                Message::SysUnexpected("\"x\"".into()),
                Message::Expected("number".into()),
                Message::Expected("name".into()),
            ]
        );
    }

    #[test]
    fn render_uses_localizer() {
        let localizer = Localizer::from_table([
            ("unexpected", "inattendu"),
            ("expecting", "attendu"),
            ("or", "ou"),
            ("digit", "chiffre"),
            ("end of input", "fin de l'entrée"),
        ]);
        let mut error = ParseError::new_unexpected(pos(2), "");
        error.set_expected(&["digit", "letter"]);
        assert_eq!(
            error.render(&localizer),
            "\"input\" (line 1, column 2):\ninattendu fin de l'entrée\nattendu chiffre ou letter"
        );
    }

    #[test]
    fn merge_prefers_later_position() {
        let early = ParseError::new_message(pos(2), Message::Expected("a".into()));
        let late = ParseError::new_message(pos(5), Message::Expected("b".into()));
        assert_eq!(early.clone().merge(late.clone()), late);
        assert_eq!(late.clone().merge(early), late);
    }

    #[test]
    fn merge_unions_at_equal_positions() {
        let mut left = ParseError::new_unexpected(pos(2), "\"x\"");
        left.add_message(Message::Expected("a".into()));
        let mut right = ParseError::new_unexpected(pos(2), "\"x\"");
        right.add_message(Message::Expected("b".into()));

        let merged = left.merge(right);
        assert_eq!(
            merged.messages(),
            &[
                Message::SysUnexpected("\"x\"".into()),
                Message::Expected("a".into()),
                Message::Expected("b".into()),
            ]
        );
    }

    #[test]
    fn merge_keeps_informative_error() {
        let unknown = ParseError::new_unknown(pos(9));
        let known = ParseError::new_message(pos(1), Message::Generic("boom".into()));
        assert_eq!(unknown.clone().merge(known.clone()), known);
        assert_eq!(known.clone().merge(unknown), known);
    }

    proptest! {
        #[test]
        fn merge_follows_position_rule(a in 1usize..50, b in 1usize..50) {
            let left = ParseError::new_message(pos(a), Message::Expected("left".into()));
            let right = ParseError::new_message(pos(b), Message::Expected("right".into()));
            let merged = left.merge(right);

            let texts: Vec<_> = merged.messages().iter().map(Message::text).collect();
            match a.cmp(&b) {
                std::cmp::Ordering::Less => prop_assert_eq!(texts, vec!["right"]),
                std::cmp::Ordering::Greater => prop_assert_eq!(texts, vec!["left"]),
                std::cmp::Ordering::Equal => prop_assert_eq!(texts, vec!["left", "right"]),
            }
        }
    }
}
