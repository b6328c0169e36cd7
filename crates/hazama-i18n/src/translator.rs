//! Translator chains and the active-translator handle.
//!
//! A [`Translator`] is an ordered stack of catalogs: the catalog installed
//! last is consulted first, so a toolkit catalog installed after the
//! application catalog can override it. Lookups that no catalog resolves
//! return the source text.
//!
//! [`ActiveTranslator`] is the handle the UI bootstrap owns and passes to
//! rendering components. Switching locale replaces the whole translator in
//! one atomic swap; readers holding a snapshot keep using the old one.

use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::Catalog;

/// Ordered set of installed catalogs.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    catalogs: Vec<Arc<Catalog>>,
}

impl Translator {
    /// A translator with no catalogs: every lookup returns the source text.
    #[must_use]
    pub fn untranslated() -> Self {
        Self::default()
    }

    /// Install a catalog with priority over those already installed.
    pub fn install(&mut self, catalog: impl Into<Arc<Catalog>>) {
        self.catalogs.push(catalog.into());
    }

    /// Builder form of [`Translator::install`].
    #[must_use]
    pub fn with_catalog(mut self, catalog: impl Into<Arc<Catalog>>) -> Self {
        self.install(catalog);
        self
    }

    /// Installed catalogs, highest priority first.
    pub fn catalogs(&self) -> impl Iterator<Item = &Catalog> {
        self.catalogs.iter().rev().map(Arc::as_ref)
    }

    /// Number of installed catalogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Language of the highest-priority catalog that declares one.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.catalogs().find_map(Catalog::language)
    }

    /// Translate `text` within `context`.
    #[must_use]
    pub fn translate<'a>(&'a self, context: &str, text: &'a str) -> &'a str {
        self.catalogs()
            .find_map(|c| c.find(context, text))
            .unwrap_or(text)
    }

    /// Translate with a disambiguation comment.
    #[must_use]
    pub fn translate_disambiguated<'a>(
        &'a self,
        context: &str,
        text: &'a str,
        comment: &str,
    ) -> &'a str {
        self.catalogs()
            .find_map(|c| c.find_disambiguated(context, text, comment))
            .unwrap_or(text)
    }

    /// Translate a plural message for `count`.
    #[must_use]
    pub fn translate_numerus<'a>(&'a self, context: &str, text: &'a str, count: i64) -> &'a str {
        self.catalogs()
            .find_map(|c| c.find_numerus(context, text, count))
            .unwrap_or(text)
    }
}

/// Shared, swappable reference to the current translator.
///
/// Cloning the handle shares the same slot.
#[derive(Debug, Clone)]
pub struct ActiveTranslator {
    slot: Arc<RwLock<Arc<Translator>>>,
}

impl Default for ActiveTranslator {
    fn default() -> Self {
        Self::new(Translator::untranslated())
    }
}

impl ActiveTranslator {
    #[must_use]
    pub fn new(translator: Translator) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(translator))),
        }
    }

    /// Snapshot of the current translator.
    #[must_use]
    pub fn current(&self) -> Arc<Translator> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new translator, returning the previous one.
    pub fn replace(&self, translator: Translator) -> Arc<Translator> {
        let next = Arc::new(translator);
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Translate through the current translator.
    #[must_use]
    pub fn tr(&self, context: &str, text: &str) -> String {
        self.current().translate(context, text).to_owned()
    }
}
