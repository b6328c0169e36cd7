#![forbid(unsafe_code)]

//! Translation catalogs for Hazama.
//!
//! Loads Qt Linguist translation sources (`.ts`) into immutable lookup
//! tables keyed by `(context, source text)`, chains catalogs the way an
//! application installs several translators, and resolves which catalogs
//! to load from the user's locale settings.
//!
//! Lookups never fail: a missing or obsolete translation resolves to the
//! source text itself.

pub mod catalog;
pub mod error;
pub mod loader;
pub mod plural;
pub mod settings;
pub mod translator;
mod ts;

pub use catalog::{Catalog, CatalogStats, Context, ContextStats, Entry, Header, Location, Status};
pub use error::I18nError;
pub use loader::{application_catalog_path, candidate_names, load_translator};
pub use plural::PluralRule;
pub use settings::LocaleSettings;
pub use translator::{ActiveTranslator, Translator};
