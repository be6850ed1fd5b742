// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "pt";

// Extrator de idioma, lido do Accept-Language
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn is_english(&self) -> bool {
        self.0 == "en"
    }

    pub fn from_header(value: &str) -> Self {
        accept_language::parse(value)
            .first()
            // "pt-BR" -> "pt", "en" -> "en"
            .map(|tag| tag.split('-').next().unwrap_or(tag.as_str()).to_lowercase())
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_language_of_first_tag() {
        assert_eq!(Locale::from_header("en-US,en;q=0.9,pt;q=0.8").0, "en");
        assert_eq!(Locale::from_header("pt-BR").0, "pt");
    }

    #[test]
    fn falls_back_to_portuguese() {
        assert_eq!(Locale::from_header("").0, "pt");
    }
}
