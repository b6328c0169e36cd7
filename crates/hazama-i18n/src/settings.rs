//! Locale settings read from the application's `config.ini`.
//!
//! Only the `lang` key of the `[Main]` section matters here. A missing
//! file or key means English, which needs no catalog. Keys match without
//! regard to ASCII case (`Lang=` works); section names are exact.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use crate::error::I18nError;

/// Language used when nothing is configured.
pub const DEFAULT_LANG: &str = "en";

/// Directory holding the application catalogs, relative to the working directory.
pub const DEFAULT_LANG_DIR: &str = "lang";

/// Which catalogs to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    /// Language tag, e.g. `"zh_CN"`.
    pub lang: String,
    /// Directory searched for `<lang>.ts` (and `qt_<lang>.ts` as a fallback).
    pub lang_dir: PathBuf,
    /// Directory searched first for the toolkit catalog `qt_<lang>.ts`.
    pub toolkit_dir: Option<PathBuf>,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.into(),
            lang_dir: PathBuf::from(DEFAULT_LANG_DIR),
            toolkit_dir: None,
        }
    }
}

impl LocaleSettings {
    /// Read settings from the contents of a `config.ini`.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::Config`] if the text is not valid INI.
    pub fn from_ini_str(text: &str) -> Result<Self, I18nError> {
        let ini = Ini::load_from_str(text).map_err(|e| I18nError::Config(e.to_string()))?;
        let mut settings = Self::default();
        if let Some(lang) = ini
            .section(Some("Main"))
            .and_then(|main| {
                main.iter()
                    .filter(|(key, _)| key.eq_ignore_ascii_case("lang"))
                    .map(|(_, value)| value)
                    .last()
            })
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
        {
            settings.lang = lang.to_owned();
        }
        Ok(settings)
    }

    /// Read settings from a `config.ini` file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::Io`] if the file exists but cannot be read and
    /// [`I18nError::Config`] if it is not valid INI.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, I18nError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ini_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using default locale");
                Ok(Self::default())
            }
            Err(err) => Err(I18nError::io(path, &err)),
        }
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    #[must_use]
    pub fn with_lang_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lang_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_toolkit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolkit_dir = Some(dir.into());
        self
    }
}
