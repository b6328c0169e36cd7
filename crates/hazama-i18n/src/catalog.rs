//! Translation catalog loaded from a Qt Linguist source.
//!
//! # Invariants
//!
//! 1. **Lookup never fails**: every `lookup*` call returns either a stored
//!    translation or the source text it was given.
//!
//! 2. **Obsolete entries are inert**: an entry marked obsolete (or vanished)
//!    is kept for inspection but never returned by a lookup, even when no
//!    active entry shares its key.
//!
//! 3. **Last active wins**: when several active entries share a key, the
//!    one loaded last is used.
//!
//! 4. **Thread safety**: `Catalog` is `Send + Sync` (all data is immutable
//!    after construction).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing key | `(context, source)` not in catalog | Source text returned |
//! | Obsolete key | Only obsolete entries match | Source text returned |
//! | Empty translation | Active entry with no text | Empty string returned |
//! | Malformed file | Parse failure at load | `I18nError::MalformedResource` |

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::I18nError;
use crate::plural::PluralRule;

/// Whether an entry is current or superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Current translation, eligible for lookup.
    #[default]
    Active,
    /// Historical translation kept by the tooling; ignored by lookup.
    Obsolete,
}

/// Where a message was extracted from. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: Option<u32>,
}

/// One source-text/translation pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    context: String,
    source: String,
    comment: Option<String>,
    translation: String,
    numerus_forms: Vec<String>,
    status: Status,
    unfinished: bool,
    utf8: bool,
    location: Option<Location>,
}

impl Entry {
    /// Create an active entry.
    #[must_use]
    pub fn new(
        context: impl Into<String>,
        source: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
            comment: None,
            translation: translation.into(),
            numerus_forms: Vec::new(),
            status: Status::Active,
            unfinished: false,
            utf8: false,
            location: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Attach a disambiguation comment. An empty comment means none.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.is_empty()).then_some(comment);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach plural forms. The first form doubles as the plain translation
    /// when none was given.
    #[must_use]
    pub fn with_numerus_forms(mut self, forms: Vec<String>) -> Self {
        if self.translation.is_empty()
            && let Some(first) = forms.first()
        {
            self.translation = first.clone();
        }
        self.numerus_forms = forms;
        self
    }

    #[must_use]
    pub fn with_unfinished(mut self, unfinished: bool) -> Self {
        self.unfinished = unfinished;
        self
    }

    #[must_use]
    pub fn with_utf8(mut self, utf8: bool) -> Self {
        self.utf8 = utf8;
        self
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }

    #[must_use]
    pub fn numerus_forms(&self) -> &[String] {
        &self.numerus_forms
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Translation was marked unfinished by the translator.
    #[must_use]
    pub fn is_unfinished(&self) -> bool {
        self.unfinished
    }

    /// Source text is itself non-Latin and used verbatim as the key.
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    fn disambiguation(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    fn has_text(&self) -> bool {
        !self.translation.is_empty() || self.numerus_forms.iter().any(|f| !f.is_empty())
    }
}

/// All entries for one UI context, in load order.
#[derive(Debug, Clone)]
pub struct Context {
    name: String,
    entries: Vec<Entry>,
    // source -> [(disambiguation, entry index)] of the last active entry per key
    active: HashMap<String, Vec<(String, usize)>>,
}

impl Context {
    fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::new(),
            active: HashMap::new(),
        }
    }

    fn push(&mut self, entry: Entry) {
        let idx = self.entries.len();
        if entry.is_active() {
            let slots = self.active.entry(entry.source.clone()).or_default();
            let comment = entry.disambiguation();
            match slots.iter_mut().find(|(c, _)| c == comment) {
                Some(slot) => slot.1 = idx,
                None => slots.push((comment.to_owned(), idx)),
            }
        }
        self.entries.push(entry);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The active entry for `(source, comment)`, if any.
    ///
    /// An empty `comment` selects the entry without disambiguation.
    #[must_use]
    pub fn find(&self, source: &str, comment: &str) -> Option<&Entry> {
        self.active
            .get(source)?
            .iter()
            .find(|(c, _)| c == comment)
            .and_then(|&(_, idx)| self.entries.get(idx))
    }
}

/// Attributes of the resource root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Format version (`"2.0"`, `"2.1"`).
    pub version: Option<String>,
    /// Target language (e.g. `"zh"`, `"zh_CN"`).
    pub language: Option<String>,
    /// Language of the source texts, when declared.
    pub source_language: Option<String>,
}

/// Immutable translation table for one language.
///
/// # Example
///
/// ```
/// use hazama_i18n::Catalog;
///
/// let catalog = Catalog::from_ts_str(r#"<TS version="2.0" language="zh">
///   <context>
///     <name>SearchBox</name>
///     <message>
///       <source>Search</source>
///       <translation>搜索</translation>
///     </message>
///   </context>
/// </TS>"#).unwrap();
///
/// assert_eq!(catalog.lookup("SearchBox", "Search"), "搜索");
/// assert_eq!(catalog.lookup("SearchBox", "Clear"), "Clear");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    header: Header,
    contexts: Vec<Context>,
    by_name: HashMap<String, usize>,
    plural_rule: PluralRule,
}

impl Catalog {
    /// Create an empty catalog with the given header.
    #[must_use]
    pub fn new(header: Header) -> Self {
        let plural_rule = header
            .language
            .as_deref()
            .map(PluralRule::for_language)
            .unwrap_or_default();
        Self {
            header,
            contexts: Vec::new(),
            by_name: HashMap::new(),
            plural_rule,
        }
    }

    /// Build a catalog from entries in load order.
    #[must_use]
    pub fn from_entries(header: Header, entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut catalog = Self::new(header);
        for entry in entries {
            catalog.push(entry);
        }
        catalog
    }

    /// Parse a `.ts` document.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MalformedResource`] when the document is not a
    /// well-formed translation source.
    pub fn from_ts_str(input: &str) -> Result<Self, I18nError> {
        crate::ts::parse(input)
    }

    /// Parse a `.ts` document from raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MalformedResource`] on invalid UTF-8 or a
    /// malformed document.
    pub fn from_ts_bytes(bytes: &[u8]) -> Result<Self, I18nError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            I18nError::malformed(e.valid_up_to() as u64, "input is not valid UTF-8")
        })?;
        Self::from_ts_str(text)
    }

    /// Parse a `.ts` document from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::Io`] if reading fails, otherwise as
    /// [`Catalog::from_ts_bytes`].
    pub fn from_ts_reader<R: Read>(mut reader: R) -> Result<Self, I18nError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| I18nError::io("<reader>", &e))?;
        Self::from_ts_bytes(&bytes)
    }

    /// Load and parse a `.ts` file.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::Io`] if the file cannot be read, otherwise as
    /// [`Catalog::from_ts_bytes`].
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, I18nError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| I18nError::io(path, &e))?;
        Self::from_ts_bytes(&bytes)
    }

    /// Register a context so it is listed even if it holds no messages.
    pub(crate) fn ensure_context(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let idx = self.contexts.len();
        self.contexts.push(Context::new(name.to_owned()));
        self.by_name.insert(name.to_owned(), idx);
        idx
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        let idx = self.ensure_context(&entry.context);
        self.contexts[idx].push(entry);
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Target language declared by the resource.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.header.language.as_deref()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.header.version.as_deref()
    }

    #[must_use]
    pub fn source_language(&self) -> Option<&str> {
        self.header.source_language.as_deref()
    }

    /// Plural rule derived from the target language.
    #[must_use]
    pub fn plural_rule(&self) -> PluralRule {
        self.plural_rule
    }

    /// Contexts in the order they first appeared.
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.by_name
            .get(name)
            .and_then(|&idx| self.contexts.get(idx))
    }

    /// Every entry, obsolete ones included.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.contexts.iter().flat_map(|c| c.entries.iter())
    }

    /// Total number of entries, obsolete ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.iter().map(Context::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.iter().all(Context::is_empty)
    }

    fn find_entry(&self, context: &str, source: &str, comment: &str) -> Option<&Entry> {
        self.context(context)?.find(source, comment)
    }

    /// Stored translation for `(context, source)` without fallback.
    #[must_use]
    pub fn find(&self, context: &str, source: &str) -> Option<&str> {
        self.find_entry(context, source, "")
            .map(Entry::translation)
    }

    /// Stored translation with disambiguation, without fallback.
    ///
    /// Tries the exact `comment` first, then the undisambiguated entry.
    #[must_use]
    pub fn find_disambiguated(&self, context: &str, source: &str, comment: &str) -> Option<&str> {
        if !comment.is_empty()
            && let Some(entry) = self.find_entry(context, source, comment)
        {
            return Some(entry.translation());
        }
        self.find(context, source)
    }

    /// Stored plural form for `count`, without fallback.
    ///
    /// Entries without plural forms yield their plain translation. A form
    /// index past the stored forms selects the last form.
    #[must_use]
    pub fn find_numerus(&self, context: &str, source: &str, count: i64) -> Option<&str> {
        let entry = self.find_entry(context, source, "")?;
        let forms = entry.numerus_forms();
        if forms.is_empty() {
            return Some(entry.translation());
        }
        let idx = self.plural_rule.form_index(count);
        forms.get(idx).or_else(|| forms.last()).map(String::as_str)
    }

    /// Translate `source` within `context`, falling back to `source`.
    #[must_use]
    pub fn lookup<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.find(context, source).unwrap_or(source)
    }

    /// Translate with a disambiguation comment, falling back to `source`.
    #[must_use]
    pub fn lookup_disambiguated<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
    ) -> &'a str {
        self.find_disambiguated(context, source, comment)
            .unwrap_or(source)
    }

    /// Translate a plural message for `count`, falling back to `source`.
    ///
    /// Placeholders such as `%n` are left untouched.
    #[must_use]
    pub fn lookup_numerus<'a>(&'a self, context: &str, source: &'a str, count: i64) -> &'a str {
        self.find_numerus(context, source, count)
            .unwrap_or(source)
    }

    /// Per-context and total translation counts.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let mut totals = ContextStats::named("");
        let contexts = self
            .contexts
            .iter()
            .map(|ctx| {
                let mut stats = ContextStats::named(&ctx.name);
                for entry in &ctx.entries {
                    stats.record(entry);
                    totals.record(entry);
                }
                stats.finish();
                stats
            })
            .collect();
        totals.finish();

        CatalogStats {
            language: self.header.language.clone(),
            contexts,
            totals,
        }
    }
}

/// Translation counts for a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    /// Target language of the catalog.
    pub language: Option<String>,
    /// Per-context counts, in catalog order.
    pub contexts: Vec<ContextStats>,
    /// Counts across all contexts (`context` is empty).
    pub totals: ContextStats,
}

/// Translation counts for one context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextStats {
    pub context: String,
    /// Active entries.
    pub active: usize,
    /// Obsolete entries.
    pub obsolete: usize,
    /// Active entries marked unfinished.
    pub unfinished: usize,
    /// Active entries with no translation text.
    pub empty: usize,
    /// Active entries that are finished and non-empty.
    pub translated: usize,
    /// `translated / active` as a percentage (100 when nothing is active).
    pub completion_percent: f32,
}

impl ContextStats {
    fn named(name: &str) -> Self {
        Self {
            context: name.to_owned(),
            ..Self::default()
        }
    }

    fn record(&mut self, entry: &Entry) {
        if !entry.is_active() {
            self.obsolete += 1;
            return;
        }
        self.active += 1;
        let has_text = entry.has_text();
        if entry.is_unfinished() {
            self.unfinished += 1;
        }
        if !has_text {
            self.empty += 1;
        }
        if has_text && !entry.is_unfinished() {
            self.translated += 1;
        }
    }

    fn finish(&mut self) {
        self.completion_percent = if self.active == 0 {
            100.0
        } else {
            (self.translated as f32 / self.active as f32) * 100.0
        };
    }
}
