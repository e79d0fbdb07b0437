use unicode_normalization::UnicodeNormalization;

/// Outcome of cleaning raw OCR output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Candidate(String),
    Unusable,
}

/// Anything shorter than this after cleaning is noise, not a card name.
const MIN_CANDIDATE_LEN: usize = 3;

/// Clean raw OCR output into a candidate card name.
///
/// Only the first line is considered. Text is NFKC-folded (OCR engines
/// occasionally emit fullwidth forms), then every character that is not a
/// Latin letter, whitespace, comma, or apostrophe is stripped, and the
/// result is trimmed. Case is preserved; lookup is case-insensitive by
/// contract of the lookup service.
pub fn normalize(raw: &str) -> Normalized {
    let first_line = raw.lines().next().unwrap_or("");
    let folded: String = first_line.nfkc().collect();
    let cleaned: String = folded
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == ',' || *c == '\'')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().count() < MIN_CANDIDATE_LEN {
        Normalized::Unusable
    } else {
        Normalized::Candidate(cleaned.to_string())
    }
}
