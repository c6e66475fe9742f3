use std::fmt;

use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language utilities for ISO language code handling
///
/// This module provides the [`LanguageTag`] used to tag subtitles and videos,
/// plus functions for validating, normalizing and matching ISO 639-1 (2-letter)
/// and ISO 639-2 (3-letter) language codes.
///
/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"), // French
    ("ger", "deu"), // German
    ("dut", "nld"), // Dutch
    ("gre", "ell"), // Greek
    ("chi", "zho"), // Chinese
    ("cze", "ces"), // Czech
    ("ice", "isl"), // Icelandic
    ("alb", "sqi"), // Albanian
    ("arm", "hye"), // Armenian
    ("baq", "eus"), // Basque
    ("bur", "mya"), // Burmese
    ("per", "fas"), // Persian
    ("geo", "kat"), // Georgian
    ("may", "msa"), // Malay
    ("mac", "mkd"), // Macedonian
    ("rum", "ron"), // Romanian
    ("slo", "slk"), // Slovak
    ("wel", "cym"), // Welsh
];

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    // If it's a 2-letter code, convert to 3-letter
    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    }
    // If it's already a 3-letter code, ensure it's ISO 639-2/T
    else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // Check if it's an ISO 639-2/B code that needs converting
        if let Some((_, part2t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized_code) {
            return Ok((*part2t).to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(n1), Ok(n2)) => n1 == n2,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Rendering scheme for a language code in file suffixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCodeScheme {
    /// ISO 639-1 two-letter code, falling back to 639-2/T when none exists
    #[default]
    Alpha2,
    /// ISO 639-2/T three-letter code
    Alpha3,
    /// ISO 639-2/B bibliographic three-letter code
    Alpha3B,
    /// English display name
    Name,
}

/// A language with optional country and script qualifiers
///
/// The code is stored normalized to ISO 639-2/T. Country is ISO 3166-1
/// alpha-2 (upper case), script is ISO 15924 (title case, e.g. `Latn`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag {
    alpha3: String,
    country: Option<String>,
    script: Option<String>,
}

impl LanguageTag {
    /// Create a tag from a 2- or 3-letter ISO 639 code
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(LanguageTag {
            alpha3: normalize_to_part2t(code)?,
            country: None,
            script: None,
        })
    }

    /// Parse an IETF-style tag: `lang`, `lang-COUNTRY`, `lang-Script`, `lang-Script-COUNTRY`
    pub fn from_ietf(tag: &str) -> Result<Self> {
        let mut parts = tag.split('-');
        let code = parts
            .next()
            .ok_or_else(|| anyhow!("Empty language tag"))?;
        let mut lang = Self::from_code(code)?;

        for part in parts {
            match part.len() {
                2 => lang.country = Some(part.to_uppercase()),
                4 => {
                    let mut script = part.to_lowercase();
                    if let Some(first) = script.get_mut(..1) {
                        first.make_ascii_uppercase();
                    }
                    lang.script = Some(script);
                }
                _ => return Err(anyhow!("Invalid language tag part: {}", part)),
            }
        }

        Ok(lang)
    }

    /// Set the country qualifier
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_uppercase());
        self
    }

    /// Set the script qualifier
    pub fn with_script(mut self, script: &str) -> Self {
        self.script = Some(script.to_string());
        self
    }

    /// ISO 639-2/T code
    pub fn alpha3(&self) -> &str {
        &self.alpha3
    }

    /// ISO 639-2/B code (same as alpha3 unless a bibliographic variant exists)
    pub fn alpha3b(&self) -> &str {
        PART2B_TO_PART2T
            .iter()
            .find(|(_, t)| *t == self.alpha3)
            .map(|(b, _)| *b)
            .unwrap_or(&self.alpha3)
    }

    /// ISO 639-1 code, if one exists for this language
    pub fn alpha2(&self) -> Option<&'static str> {
        Language::from_639_3(&self.alpha3).and_then(|l| l.to_639_1())
    }

    /// English display name
    pub fn name(&self) -> String {
        Language::from_639_3(&self.alpha3)
            .map(|l| l.to_name().to_string())
            .unwrap_or_else(|| self.alpha3.clone())
    }

    /// Country qualifier, if any
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Script qualifier, if any
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Whether both tags denote the same base language, ignoring qualifiers
    pub fn same_language(&self, other: &LanguageTag) -> bool {
        self.alpha3 == other.alpha3
    }

    /// Render the code under the given scheme, without qualifiers
    pub fn code(&self, scheme: LanguageCodeScheme) -> String {
        match scheme {
            LanguageCodeScheme::Alpha2 => self
                .alpha2()
                .map(str::to_string)
                .unwrap_or_else(|| self.alpha3.clone()),
            LanguageCodeScheme::Alpha3 => self.alpha3.clone(),
            LanguageCodeScheme::Alpha3B => self.alpha3b().to_string(),
            LanguageCodeScheme::Name => self.name(),
        }
    }

    /// Render the code with `-COUNTRY` and `-Script` qualifiers appended
    pub fn code_with_qualifiers(&self, scheme: LanguageCodeScheme) -> String {
        let mut out = self.code(scheme);
        if let Some(country) = &self.country {
            out.push('-');
            out.push_str(country);
        }
        if let Some(script) = &self.script {
            out.push('-');
            out.push_str(script);
        }
        out
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_with_qualifiers(LanguageCodeScheme::Alpha2))
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        LanguageTag::from_ietf(s)
    }
}

/// Strip a trailing or leading `pattern` token from a dot-separated code
///
/// Returns the shortened string and whether a token was removed. Used to peel
/// `[hi]`/`[fo]` style markers off subtitle filename suffixes.
pub fn trim_suffix_token<'a>(code: &'a str, tokens: &[&str], sep: char) -> (String, bool) {
    let parts: Vec<&'a str> = code.split(sep).filter(|p| !p.is_empty()).collect();

    for (i, part) in parts.iter().enumerate() {
        if tokens.iter().any(|t| t.eq_ignore_ascii_case(part)) {
            let rest: Vec<&str> = parts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| *p)
                .collect();
            return (rest.join(&sep.to_string()), true);
        }
    }

    (parts.join(&sep.to_string()), false)
}
