//! Active language and the catalog it is chosen from.

use std::sync::Mutex;

use bolo_client::ChatService;
use bolo_core::language::{resolve_language_code, LanguageCatalog, DEFAULT_LANGUAGE};
use bolo_core::types::LanguageOption;

use crate::error::ChatError;

#[derive(Debug)]
struct Selection {
    catalog: LanguageCatalog,
    active: String,
}

/// Holds the language catalog and the active code.
///
/// A change applies to the next outgoing message and the next capture;
/// turns already in the log keep the language they were sent in.
#[derive(Debug)]
pub struct LanguageSelector {
    fallback: Vec<LanguageOption>,
    selection: Mutex<Selection>,
}

impl Default for LanguageSelector {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE, bolo_core::language::fallback_languages())
    }
}

impl LanguageSelector {
    /// Start from the `fallback` catalog with `default` active.
    pub fn new(default: &str, fallback: Vec<LanguageOption>) -> Self {
        let catalog = LanguageCatalog::new(fallback.iter().cloned());
        let active = if catalog.contains(default) {
            default.to_string()
        } else {
            tracing::warn!(language = %default, "Default language not in catalog, using {}", DEFAULT_LANGUAGE);
            DEFAULT_LANGUAGE.to_string()
        };
        Self {
            fallback,
            selection: Mutex::new(Selection { catalog, active }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Selection> {
        match self.selection.lock() {
            Ok(selection) => selection,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetch the catalog from the service, falling back to the built-in list
    /// when the fetch fails or returns nothing. Returns the catalog size.
    pub async fn load(&self, service: &dyn ChatService) -> usize {
        let catalog = match service.languages().await {
            Ok(options) if !options.is_empty() => {
                tracing::info!(count = options.len(), "Languages loaded");
                LanguageCatalog::new(options)
            }
            Ok(_) => {
                tracing::warn!("Service returned no languages, using fallback list");
                LanguageCatalog::new(self.fallback.iter().cloned())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Language fetch failed, using fallback list");
                LanguageCatalog::new(self.fallback.iter().cloned())
            }
        };

        let mut selection = self.lock();
        if !catalog.contains(&selection.active) {
            tracing::warn!(
                language = %selection.active,
                "Active language not offered by the service, keeping it"
            );
        }
        selection.catalog = catalog;
        selection.catalog.len()
    }

    /// Make `code` the active language.
    pub fn select(&self, code: &str) -> Result<(), ChatError> {
        let code = code.trim();
        let mut selection = self.lock();
        if !selection.catalog.contains(code) {
            return Err(ChatError::UnknownLanguage(code.to_string()));
        }
        if selection.active != code {
            tracing::info!(from = %selection.active, to = %code, "Language changed");
            selection.active = code.to_string();
        }
        Ok(())
    }

    /// Select by code, name, or partial name. Unmatched input selects the
    /// default language. Returns the selected code.
    pub fn select_fuzzy(&self, input: &str) -> Result<String, ChatError> {
        let code = {
            let selection = self.lock();
            resolve_language_code(input, &selection.catalog)
        };
        self.select(&code)?;
        Ok(code)
    }

    pub fn active(&self) -> String {
        self.lock().active.clone()
    }

    pub fn options(&self) -> Vec<LanguageOption> {
        self.lock().catalog.options().to_vec()
    }

    /// Display name of the active language, or its code if unnamed.
    pub fn active_name(&self) -> String {
        let selection = self.lock();
        selection
            .catalog
            .get(&selection.active)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| selection.active.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bolo_client::MockChatService;
    use bolo_core::language::fallback_languages;

    #[tokio::test]
    async fn test_failed_fetch_uses_six_entry_fallback() {
        let selector = LanguageSelector::default();
        let service = MockChatService::new().failing_languages();

        assert_eq!(selector.load(&service).await, 6);
        let options = selector.options();
        assert_eq!(options, fallback_languages());
        assert!(options.contains(&LanguageOption::new("en", "English")));
        assert_eq!(selector.active(), "en");
    }

    #[tokio::test]
    async fn test_empty_fetch_uses_fallback() {
        let selector = LanguageSelector::default();
        let service = MockChatService::new().with_languages(vec![]);
        assert_eq!(selector.load(&service).await, 6);
    }

    #[tokio::test]
    async fn test_service_catalog_replaces_fallback() {
        let selector = LanguageSelector::default();
        let service = MockChatService::new().with_languages(vec![
            LanguageOption::new("en", "English"),
            LanguageOption::new("te", "Telugu"),
            LanguageOption::new("te", "Telugu (duplicate)"),
        ]);

        assert_eq!(selector.load(&service).await, 2);
        selector.select("te").unwrap();
        assert_eq!(selector.active(), "te");
        assert_eq!(selector.active_name(), "Telugu");
        assert!(matches!(
            selector.select("hi"),
            Err(ChatError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_select_rejects_unknown_code() {
        let selector = LanguageSelector::default();
        match selector.select("xx") {
            Err(ChatError::UnknownLanguage(code)) => assert_eq!(code, "xx"),
            other => panic!("Expected UnknownLanguage, got {:?}", other),
        }
        assert_eq!(selector.active(), "en");
    }

    #[test]
    fn test_select_fuzzy() {
        let selector = LanguageSelector::default();
        assert_eq!(selector.select_fuzzy("Tamil").unwrap(), "ta");
        assert_eq!(selector.select_fuzzy("beng").unwrap(), "bn");
        assert_eq!(selector.select_fuzzy("mr").unwrap(), "mr");
        assert_eq!(selector.select_fuzzy("klingon").unwrap(), "en");
        assert_eq!(selector.active(), "en");
    }

    #[test]
    fn test_unknown_default_falls_back_to_english() {
        let selector = LanguageSelector::new("xx", fallback_languages());
        assert_eq!(selector.active(), "en");
    }
}
