//! Plural form selection for numerus messages.
//!
//! A numerus message stores one translation per plural form of the target
//! language. The rule maps a count to the index of the form to use, with
//! the same language families Qt Linguist groups forms by.

/// Plural family of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluralRule {
    /// One form for every count (Chinese, Japanese, Korean, ...).
    Single,
    /// `1` vs. everything else (English, German, Spanish, ...).
    #[default]
    OneOther,
    /// `0` and `1` vs. everything else (French, Brazilian Portuguese).
    French,
    /// one / few / many by last digits (Russian, Ukrainian, ...).
    Slavic,
    /// `1` / few by last digits / many.
    Polish,
    /// `1` / `2..=4` / everything else (Czech, Slovak).
    Czech,
}

impl PluralRule {
    /// Classify a language tag such as `"zh_CN"`, `"pt-BR"` or `"ru"`.
    ///
    /// Unknown languages use [`PluralRule::OneOther`].
    #[must_use]
    pub fn for_language(tag: &str) -> Self {
        let lower = tag.trim().to_ascii_lowercase().replace('-', "_");
        if lower == "pt_br" {
            return Self::French;
        }
        let primary = lower.split('_').next().unwrap_or("");
        match primary {
            "zh" | "ja" | "ko" | "vi" | "th" | "id" | "ms" | "tr" | "fa" | "ka" | "lo" | "my"
            | "km" => Self::Single,
            "fr" => Self::French,
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::Slavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::Czech,
            _ => Self::OneOther,
        }
    }

    /// Number of plural forms the family uses.
    #[must_use]
    pub fn form_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::OneOther | Self::French => 2,
            Self::Slavic | Self::Polish | Self::Czech => 3,
        }
    }

    /// Index of the plural form to use for `count`.
    #[must_use]
    pub fn form_index(self, count: i64) -> usize {
        let n = count.unsigned_abs();
        let mod10 = n % 10;
        let mod100 = n % 100;
        let few_digits = (2..=4).contains(&mod10) && !(12..=14).contains(&mod100);
        match self {
            Self::Single => 0,
            Self::OneOther => usize::from(n != 1),
            Self::French => usize::from(n > 1),
            Self::Slavic => {
                if mod10 == 1 && mod100 != 11 {
                    0
                } else if few_digits {
                    1
                } else {
                    2
                }
            }
            Self::Polish => {
                if n == 1 {
                    0
                } else if few_digits {
                    1
                } else {
                    2
                }
            }
            Self::Czech => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
        }
    }
}
