use crate::{Result, ScanLayoutError};

/// Language used when a requested code is not supported.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Recognition languages offered to callers, with display names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("spa", "Spanish"),
    ("fra", "French"),
    ("deu", "German"),
    ("ita", "Italian"),
    ("por", "Portuguese"),
    ("rus", "Russian"),
    ("chi_sim", "Chinese (Simplified)"),
    ("jpn", "Japanese"),
    ("ara", "Arabic"),
    ("hin", "Hindi"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Accepts a single code or `+`-joined codes, each of which must be supported.
pub fn validate_language(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(ScanLayoutError::validation("Language code is empty"));
    }

    for part in code.split('+') {
        if language_name(part).is_none() {
            return Err(ScanLayoutError::validation(format!(
                "Language code '{}' is not supported",
                part
            )));
        }
    }
    Ok(())
}

/// The code itself when valid, otherwise [`DEFAULT_LANGUAGE`].
pub fn resolve_language(code: &str) -> &str {
    match validate_language(code) {
        Ok(()) => code,
        Err(_) => {
            tracing::warn!(requested = code, fallback = DEFAULT_LANGUAGE, "Unsupported language, falling back");
            DEFAULT_LANGUAGE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language_valid() {
        assert!(validate_language("eng").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(validate_language("hin").is_ok());
    }

    #[test]
    fn test_validate_language_multiple() {
        assert!(validate_language("eng+fra").is_ok());
        assert!(validate_language("eng+fra+deu").is_ok());
        assert!(validate_language("eng+klingon").is_err());
    }

    #[test]
    fn test_validate_language_invalid() {
        let err = validate_language("xyz").unwrap_err();
        assert!(matches!(err, ScanLayoutError::Validation { .. }));
        assert!(validate_language("").is_err());
        assert!(validate_language("eng+").is_err());
    }

    #[test]
    fn test_resolve_language_falls_back() {
        assert_eq!(resolve_language("deu"), "deu");
        assert_eq!(resolve_language("tlh"), "eng");
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("jpn"), Some("Japanese"));
        assert_eq!(language_name("kor"), None);
    }
}
