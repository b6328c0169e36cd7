//! Command execution.
//!
//! Each command returns its stdout text so callers (and tests) decide where
//! it goes.

use std::fmt::Write as _;
use std::path::PathBuf;

use hazama_i18n::{
    Catalog, ContextStats, I18nError, LocaleSettings, Translator, application_catalog_path,
    load_translator,
};
use tracing::{debug, warn};

use crate::cli::{Command, Opts};

/// Errors reported by the binary before exiting with status 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No catalog exists for the language in the language directory.
    NoCatalog { lang: String, dir: PathBuf },
    /// The catalog or settings file could not be loaded.
    Load(I18nError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCatalog { lang, dir } => {
                write!(f, "no catalog for {lang} in {}", dir.display())
            }
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::NoCatalog { .. } => None,
        }
    }
}

impl From<I18nError> for CommandError {
    fn from(err: I18nError) -> Self {
        Self::Load(err)
    }
}

/// Run the selected command.
///
/// # Errors
///
/// `lookup` only fails on an unreadable settings file; the other commands
/// also fail when the catalog is missing or malformed.
pub fn run(opts: &Opts) -> Result<String, CommandError> {
    match &opts.command {
        Command::Lookup {
            context,
            text,
            comment,
            count,
        } => {
            let translator = translator(opts)?;
            let translated = match (count, comment) {
                (Some(n), _) => translator.translate_numerus(context, text, *n),
                (None, Some(comment)) => {
                    translator.translate_disambiguated(context, text, comment)
                }
                (None, None) => translator.translate(context, text),
            };
            Ok(format!("{translated}\n"))
        }
        Command::Stats => Ok(render_stats(&catalog(opts)?)),
        Command::Contexts => Ok(render_contexts(&catalog(opts)?)),
        Command::Check => {
            let catalog = catalog(opts)?;
            let stats = catalog.stats();
            Ok(format!(
                "ok: {} contexts, {} entries ({} obsolete)\n",
                stats.contexts.len(),
                catalog.len(),
                stats.totals.obsolete
            ))
        }
    }
}

/// Settings from the config file with command-line overrides applied.
///
/// # Errors
///
/// Fails if the config file exists but cannot be read or parsed.
pub fn settings(opts: &Opts) -> Result<LocaleSettings, CommandError> {
    let mut settings = LocaleSettings::load(&opts.config)?;
    if let Some(lang) = &opts.lang {
        settings = settings.with_lang(lang.clone());
    }
    if let Some(dir) = &opts.lang_dir {
        settings = settings.with_lang_dir(dir.clone());
    }
    if let Some(dir) = &opts.toolkit_dir {
        settings = settings.with_toolkit_dir(dir.clone());
    }
    debug!(
        lang = %settings.lang,
        lang_dir = %settings.lang_dir.display(),
        "resolved locale settings"
    );
    Ok(settings)
}

/// Translator for lookups. An unusable explicit file degrades to source text.
fn translator(opts: &Opts) -> Result<Translator, CommandError> {
    let Some(path) = &opts.file else {
        return Ok(load_translator(&settings(opts)?));
    };
    match Catalog::load_file(path) {
        Ok(catalog) => Ok(Translator::untranslated().with_catalog(catalog)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "showing source strings");
            Ok(Translator::untranslated())
        }
    }
}

/// The single catalog inspected by `stats`, `contexts` and `check`.
fn catalog(opts: &Opts) -> Result<Catalog, CommandError> {
    let path = match &opts.file {
        Some(path) => path.clone(),
        None => {
            let settings = settings(opts)?;
            application_catalog_path(&settings).ok_or_else(|| CommandError::NoCatalog {
                lang: settings.lang.clone(),
                dir: settings.lang_dir.clone(),
            })?
        }
    };
    Ok(Catalog::load_file(path)?)
}

fn stats_row(out: &mut String, name: &str, stats: &ContextStats) {
    let _ = writeln!(
        out,
        "{name:<20} {:>6} {:>8} {:>10} {:>5} {:>6.1}%",
        stats.active, stats.obsolete, stats.unfinished, stats.empty, stats.completion_percent
    );
}

/// Coverage table, one row per context plus a total row.
#[must_use]
pub fn render_stats(catalog: &Catalog) -> String {
    let stats = catalog.stats();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "language: {}",
        stats.language.as_deref().unwrap_or("unknown")
    );
    let _ = writeln!(
        out,
        "{:<20} {:>6} {:>8} {:>10} {:>5} {:>7}",
        "context", "active", "obsolete", "unfinished", "empty", "done"
    );
    for ctx in &stats.contexts {
        stats_row(&mut out, &ctx.context, ctx);
    }
    stats_row(&mut out, "total", &stats.totals);
    out
}

/// Context names with their entry counts, in catalog order.
#[must_use]
pub fn render_contexts(catalog: &Catalog) -> String {
    catalog.contexts().fold(String::new(), |mut out, ctx| {
        let _ = writeln!(out, "{}\t{}", ctx.name(), ctx.len());
        out
    })
}
