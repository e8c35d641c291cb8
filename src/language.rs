//! Target languages for headline translation.
//!
//! The table below is the single source of truth for which languages the
//! reader offers; a `Language` can only be built from one of its entries.

/// Metadata for a selectable language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Two-letter uppercase ISO 639-1 code, as the translation API expects it
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Flag shown on the language button
    pub flag: &'static str,
}

const LANGUAGES: &[LanguageConfig] = &[
    LanguageConfig { code: "EN", name: "English", flag: "🇺🇸" },
    LanguageConfig { code: "ES", name: "Spanish", flag: "🇪🇸" },
    LanguageConfig { code: "FR", name: "French", flag: "🇫🇷" },
    LanguageConfig { code: "DE", name: "German", flag: "🇩🇪" },
    LanguageConfig { code: "IT", name: "Italian", flag: "🇮🇹" },
    LanguageConfig { code: "PT", name: "Portuguese", flag: "🇵🇹" },
    LanguageConfig { code: "NL", name: "Dutch", flag: "🇳🇱" },
    LanguageConfig { code: "PL", name: "Polish", flag: "🇵🇱" },
    LanguageConfig { code: "RU", name: "Russian", flag: "🇷🇺" },
    LanguageConfig { code: "JA", name: "Japanese", flag: "🇯🇵" },
    LanguageConfig { code: "ZH", name: "Chinese", flag: "🇨🇳" },
    LanguageConfig { code: "KO", name: "Korean", flag: "🇰🇷" },
    LanguageConfig { code: "AR", name: "Arabic", flag: "🇸🇦" },
    LanguageConfig { code: "TR", name: "Turkish", flag: "🇹🇷" },
    LanguageConfig { code: "CS", name: "Czech", flag: "🇨🇿" },
    LanguageConfig { code: "DA", name: "Danish", flag: "🇩🇰" },
    LanguageConfig { code: "EL", name: "Greek", flag: "🇬🇷" },
    LanguageConfig { code: "FI", name: "Finnish", flag: "🇫🇮" },
    LanguageConfig { code: "SV", name: "Swedish", flag: "🇸🇪" },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown language code: '{0}'")]
pub struct LanguageError(pub String);

/// A validated translation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    code: &'static str,
}

impl Language {
    /// Headlines arrive from the search API in English.
    pub const ENGLISH: Language = Language { code: "EN" };

    /// Look up a language by code, ignoring case (`"fr"` and `"FR"` are the same).
    pub fn from_code(code: &str) -> Result<Language, LanguageError> {
        let wanted = code.trim().to_ascii_uppercase();
        LANGUAGES
            .iter()
            .find(|lang| lang.code == wanted)
            .map(|lang| Language { code: lang.code })
            .ok_or_else(|| LanguageError(code.to_string()))
    }

    pub fn all() -> impl Iterator<Item = Language> {
        LANGUAGES.iter().map(|lang| Language { code: lang.code })
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn config(&self) -> &'static LanguageConfig {
        LANGUAGES
            .iter()
            .find(|lang| lang.code == self.code)
            .expect("Language is always built from the table")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn flag(&self) -> &'static str {
        self.config().flag
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

impl std::str::FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
    }
}
