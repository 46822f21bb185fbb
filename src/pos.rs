//! Source positions and their tab-aware advancement.

use std::{cmp::Ordering, fmt::Display, sync::Arc};

/// The width of a tab stop, in columns.
pub const TAB_WIDTH: usize = 8;

/// A position in some named source, given as a 1-based line and column.
///
/// The name is shared, so cloning a [`SourcePos`] never copies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePos {
    /// The name of the source (usually a file name); may be empty.
    name: Arc<str>,
    /// The line number, starting at 1.
    line: usize,
    /// The column number, starting at 1.
    column: usize,
}

impl SourcePos {
    /// Returns the position of the first character in the source called `name`.
    pub fn new(name: &str) -> Self {
        Self::at(name, 1, 1)
    }

    /// Returns the position at `line` and `column` in the source called `name`.
    ///
    /// Lines and columns start at 1; a zero is raised to 1.
    pub fn at(name: &str, line: usize, column: usize) -> Self {
        Self {
            name: Arc::from(name),
            line: line.max(1),
            column: column.max(1),
        }
    }

    /// The name of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The 1-based column number.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Returns a copy of `self` with the line set to `line` (at least 1).
    pub fn with_line(&self, line: usize) -> Self {
        Self {
            line: line.max(1),
            ..self.clone()
        }
    }

    /// Returns a copy of `self` with the column set to `column` (at least 1).
    pub fn with_column(&self, column: usize) -> Self {
        Self {
            column: column.max(1),
            ..self.clone()
        }
    }

    /// Returns the position one column to the right of `self`.
    pub fn next_column(&self) -> Self {
        self.with_column(self.column + 1)
    }

    /// Returns the position reached after consuming `c` at `self`.
    ///
    /// A newline moves to the first column of the next line, a tab moves to
    /// the next tab stop, and anything else moves one column right. A carriage
    /// return is an ordinary character, so `"\r\n"` counts as one line break.
    pub fn update_char(&self, c: char) -> Self {
        match c {
            '\n' => Self {
                name: Arc::clone(&self.name),
                line: self.line + 1,
                column: 1,
            },
            '\t' => self.with_column(((self.column - 1) / TAB_WIDTH + 1) * TAB_WIDTH + 1),
            _ => self.next_column(),
        }
    }

    /// Returns the position reached after consuming every char in `chars`.
    pub fn update_chars<'a>(&self, chars: impl IntoIterator<Item = &'a char>) -> Self {
        chars
            .into_iter()
            .fold(self.clone(), |pos, c| pos.update_char(*c))
    }

    /// Returns the position reached after consuming `text`.
    pub fn update_str(&self, text: &str) -> Self {
        text.chars().fold(self.clone(), |pos, c| pos.update_char(c))
    }
}

impl PartialOrd for SourcePos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{:?} ", self.name())?;
        }

        write!(f, "(line {}, column {})", self.line, self.column)
    }
}
