use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "fr")]
    Fr,
}

impl Locale {
    /// Parse a locale tag such as `fr`, `fr-CA` or `en_US`.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_lowercase();
        match primary.as_str() {
            "fr" => Some(Locale::Fr),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// Pick the locale from an `Accept-Language` header value.
    ///
    /// Only the first language range is considered; anything that is not
    /// French falls back to English.
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .next()
            .map(|first| first.split(';').next().unwrap_or(""))
            .and_then(Locale::parse)
            .unwrap_or_default()
    }

    pub fn pick<'a>(&self, en: &'a str, fr: &'a str) -> &'a str {
        match self {
            Locale::En => en,
            Locale::Fr => fr,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Fr => write!(f, "fr"),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Locale::parse(&value).ok_or_else(|| format!("Invalid locale: {}", value))
    }
}
