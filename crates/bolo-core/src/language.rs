//! Language catalog and code resolution.
//!
//! The fallback list is the named default used whenever the service's
//! catalog cannot be fetched.

use crate::types::LanguageOption;

/// Language active before the user picks one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Built-in languages used when the `/languages` endpoint is unavailable.
pub const FALLBACK_LANGUAGES: [(&str, &str); 6] = [
    ("en", "English"),
    ("hi", "Hindi"),
    ("ta", "Tamil"),
    ("bn", "Bengali"),
    ("pa", "Punjabi"),
    ("mr", "Marathi"),
];

/// The fallback list as owned options.
pub fn fallback_languages() -> Vec<LanguageOption> {
    FALLBACK_LANGUAGES
        .iter()
        .map(|(code, name)| LanguageOption::new(*code, *name))
        .collect()
}

/// Ordered set of language options, unique by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageCatalog {
    options: Vec<LanguageOption>,
}

impl LanguageCatalog {
    /// Build a catalog, keeping the first occurrence of each code.
    pub fn new(options: impl IntoIterator<Item = LanguageOption>) -> Self {
        let mut catalog = Self::default();
        for option in options {
            catalog.insert(option);
        }
        catalog
    }

    pub fn fallback() -> Self {
        Self::new(fallback_languages())
    }

    /// Insert an option; returns `false` if the code was already present.
    pub fn insert(&mut self, option: LanguageOption) -> bool {
        if self.contains(&option.code) {
            return false;
        }
        self.options.push(option);
        true
    }

    pub fn contains(&self, code: &str) -> bool {
        self.options.iter().any(|o| o.code == code)
    }

    pub fn get(&self, code: &str) -> Option<&LanguageOption> {
        self.options.iter().find(|o| o.code == code)
    }

    pub fn options(&self) -> &[LanguageOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Resolve free-form user input to a language code.
///
/// Accepts a code (`"hi"`), a name (`"Hindi"`), or a partial name
/// (`"hin"`), case-insensitively. Empty or unknown input resolves to
/// [`DEFAULT_LANGUAGE`].
pub fn resolve_language_code(input: &str, catalog: &LanguageCatalog) -> String {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }

    if let Some(option) = catalog.options().iter().find(|o| o.code == needle) {
        return option.code.clone();
    }

    if let Some(option) = catalog
        .options()
        .iter()
        .find(|o| o.name.to_lowercase() == needle)
    {
        return option.code.clone();
    }

    catalog
        .options()
        .iter()
        .find(|o| {
            let name = o.name.to_lowercase();
            name.contains(&needle) || needle.contains(&name)
        })
        .map(|o| o.code.clone())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
