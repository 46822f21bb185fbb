//! Translation of the fixed phrases used when rendering parse errors.

use std::{collections::HashMap, sync::Arc};

/// A `&str -> String` translation applied to diagnostic text when a
/// [`ParseError`](crate::error::ParseError) is rendered.
///
/// It is consulted for the fixed phrases (`"unexpected"`, `"expecting"`,
/// `"or"`, `"end of input"`, `"unknown parse error"`) and for every expected
/// label, such as `"digit"` or `"white space"`. The default is the identity.
#[derive(Clone)]
pub struct Localizer {
    /// The translation function.
    translate: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl Localizer {
    /// Constructs a [`Localizer`] from an arbitrary translation function.
    pub fn new<F>(translate: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            translate: Arc::new(translate),
        }
    }

    /// The identity localizer.
    pub fn identity() -> Self {
        Self::new(str::to_owned)
    }

    /// Constructs a [`Localizer`] from a lookup table; phrases missing from
    /// the table are left untouched.
    pub fn from_table<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let table: HashMap<String, String> = entries
            .into_iter()
            .map(|(from, to)| (from.to_owned(), to.to_owned()))
            .collect();

        Self::new(move |text| {
            table
                .get(text)
                .cloned()
                .unwrap_or_else(|| text.to_owned())
        })
    }

    /// Translates `text`.
    pub fn translate(&self, text: &str) -> String {
        (self.translate)(text)
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer").finish_non_exhaustive()
    }
}
