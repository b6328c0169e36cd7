//! Resolve and load the catalogs for the configured language.
//!
//! Two catalogs are installed: the application's own `<lang>.ts` from the
//! language directory, then the toolkit's `qt_<lang>.ts` (searched in the
//! toolkit directory, then the language directory). Loading never fails; a
//! catalog that is missing or malformed is skipped and its strings show
//! untranslated.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::settings::LocaleSettings;
use crate::translator::Translator;

/// Prefix of the toolkit catalog name.
pub const TOOLKIT_PREFIX: &str = "qt_";

/// File extension of translation sources.
pub const CATALOG_EXTENSION: &str = "ts";

/// Base names tried for `name`, most specific first.
///
/// `"zh_CN"` yields `["zh_CN", "zh"]`; each `_`, `-` or `.` separated
/// suffix is stripped in turn.
#[must_use]
pub fn candidate_names(name: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = name.trim();
    while !current.is_empty() {
        names.push(current.to_owned());
        match current.rfind(['_', '-', '.']) {
            Some(idx) => current = &current[..idx],
            None => break,
        }
    }
    names
}

/// Load the first catalog found for `name` under `dir`.
fn load_first(dir: &Path, name: &str) -> Option<Catalog> {
    for candidate in candidate_names(name) {
        let path = dir.join(format!("{candidate}.{CATALOG_EXTENSION}"));
        match Catalog::load_file(&path) {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    entries = catalog.len(),
                    "installed translation catalog"
                );
                return Some(catalog);
            }
            Err(err) if err.is_not_found() => {
                debug!(path = %path.display(), "no translation catalog");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unusable translation catalog");
            }
        }
    }
    None
}

/// Build the translator for `settings`.
///
/// Falls back to [`Translator::untranslated`] when nothing can be loaded.
#[must_use]
pub fn load_translator(settings: &LocaleSettings) -> Translator {
    info!(lang = %settings.lang, "set translation");
    let mut translator = Translator::untranslated();

    if let Some(catalog) = load_first(&settings.lang_dir, &settings.lang) {
        translator.install(catalog);
    }

    let toolkit_name = format!("{TOOLKIT_PREFIX}{}", settings.lang);
    let toolkit = settings
        .toolkit_dir
        .as_deref()
        .and_then(|dir| load_first(dir, &toolkit_name))
        .or_else(|| load_first(&settings.lang_dir, &toolkit_name));
    if let Some(catalog) = toolkit {
        translator.install(catalog);
    }

    if translator.is_empty() {
        debug!(lang = %settings.lang, "no catalogs loaded, showing source strings");
    }
    translator
}

/// Path of the application catalog for `settings`, if one exists on disk.
#[must_use]
pub fn application_catalog_path(settings: &LocaleSettings) -> Option<PathBuf> {
    candidate_names(&settings.lang)
        .into_iter()
        .map(|name| settings.lang_dir.join(format!("{name}.{CATALOG_EXTENSION}")))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const APP_TS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.0" language="zh">
<context>
    <name>SearchBox</name>
    <message>
        <source>Search</source>
        <translation>搜索</translation>
    </message>
</context>
<context>
    <name>Dialog</name>
    <message>
        <source>Cancel</source>
        <translation>取消</translation>
    </message>
</context>
</TS>
"#;

    const QT_TS: &str = r#"<TS version="2.0" language="zh_CN">
<context>
    <name>Dialog</name>
    <message>
        <source>Cancel</source>
        <translation>取消(&amp;C)</translation>
    </message>
</context>
</TS>
"#;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn candidates() {
        assert_eq!(candidate_names("zh_CN"), vec!["zh_CN", "zh"]);
        assert_eq!(candidate_names("qt_zh_CN"), vec!["qt_zh_CN", "qt_zh", "qt"]);
        assert_eq!(candidate_names("en"), vec!["en"]);
        assert_eq!(candidate_names("pt-BR.utf8"), vec!["pt-BR.utf8", "pt-BR", "pt"]);
        assert!(candidate_names("").is_empty());
    }

    #[test]
    #[traced_test]
    fn loads_application_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "zh_CN.ts", APP_TS);

        let settings = LocaleSettings::default()
            .with_lang("zh_CN")
            .with_lang_dir(dir.path());
        let tr = load_translator(&settings);
        assert_eq!(tr.len(), 1);
        assert_eq!(tr.translate("SearchBox", "Search"), "搜索");
        assert!(logs_contain("set translation"));
        assert!(logs_contain("installed translation catalog"));
    }

    #[test]
    fn falls_back_to_language_without_region() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "zh.ts", APP_TS);

        let settings = LocaleSettings::default()
            .with_lang("zh_CN")
            .with_lang_dir(dir.path());
        assert_eq!(load_translator(&settings).translate("SearchBox", "Search"), "搜索");
        assert_eq!(
            application_catalog_path(&settings),
            Some(dir.path().join("zh.ts"))
        );
    }

    #[test]
    fn toolkit_catalog_overrides_application() {
        let lang = tempfile::tempdir().unwrap();
        let toolkit = tempfile::tempdir().unwrap();
        write(lang.path(), "zh_CN.ts", APP_TS);
        write(toolkit.path(), "qt_zh_CN.ts", QT_TS);

        let settings = LocaleSettings::default()
            .with_lang("zh_CN")
            .with_lang_dir(lang.path())
            .with_toolkit_dir(toolkit.path());
        let tr = load_translator(&settings);
        assert_eq!(tr.len(), 2);
        assert_eq!(tr.translate("Dialog", "Cancel"), "取消(&C)");
        assert_eq!(tr.translate("SearchBox", "Search"), "搜索");
    }

    #[test]
    fn toolkit_catalog_found_in_lang_dir() {
        let lang = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        write(lang.path(), "qt_zh_CN.ts", QT_TS);

        let settings = LocaleSettings::default()
            .with_lang("zh_CN")
            .with_lang_dir(lang.path())
            .with_toolkit_dir(empty.path());
        let tr = load_translator(&settings);
        assert_eq!(tr.len(), 1);
        assert_eq!(tr.translate("Dialog", "Cancel"), "取消(&C)");
    }

    #[test]
    fn missing_catalog_is_untranslated() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LocaleSettings::default().with_lang_dir(dir.path());
        let tr = load_translator(&settings);
        assert!(tr.is_empty());
        assert_eq!(tr.translate("SearchBox", "Search"), "Search");
        assert_eq!(application_catalog_path(&settings), None);
    }

    #[test]
    #[traced_test]
    fn malformed_catalog_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "zh_CN.ts", "<TS><context><message>");
        write(dir.path(), "zh.ts", APP_TS);

        let settings = LocaleSettings::default()
            .with_lang("zh_CN")
            .with_lang_dir(dir.path());
        let tr = load_translator(&settings);
        // The broken regional file is skipped and the generic one used
        assert_eq!(tr.translate("SearchBox", "Search"), "搜索");
        assert!(logs_contain("skipping unusable translation catalog"));
    }
}
