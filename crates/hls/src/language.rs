//! Language tag normalization.

/// ISO 639-2 (bibliographic and terminology) to ISO 639-1
const ISO_639_2_TO_1: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("bul", "bg"),
    ("cat", "ca"),
    ("ces", "cs"),
    ("chi", "zh"),
    ("cze", "cs"),
    ("dan", "da"),
    ("deu", "de"),
    ("dut", "nl"),
    ("ell", "el"),
    ("eng", "en"),
    ("est", "et"),
    ("fas", "fa"),
    ("fin", "fi"),
    ("fra", "fr"),
    ("fre", "fr"),
    ("ger", "de"),
    ("gre", "el"),
    ("heb", "he"),
    ("hin", "hi"),
    ("hrv", "hr"),
    ("hun", "hu"),
    ("ind", "id"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("lav", "lv"),
    ("lit", "lt"),
    ("may", "ms"),
    ("msa", "ms"),
    ("nld", "nl"),
    ("nor", "no"),
    ("per", "fa"),
    ("pol", "pl"),
    ("por", "pt"),
    ("ron", "ro"),
    ("rum", "ro"),
    ("rus", "ru"),
    ("slk", "sk"),
    ("slo", "sk"),
    ("slv", "sl"),
    ("spa", "es"),
    ("srp", "sr"),
    ("swe", "sv"),
    ("tha", "th"),
    ("tur", "tr"),
    ("ukr", "uk"),
    ("vie", "vi"),
    ("zho", "zh"),
];

/// Language used when nothing is declared
pub const UNDETERMINED: &str = "und";

/// Normalize a language tag: lower-case primary subtag, mapped from three
/// letters to two where a mapping exists, upper-case region.
///
/// `eng` becomes `en`, `por-br` becomes `pt-BR`, unknown codes pass through.
pub fn normalize(language: &str) -> String {
    let language = language.trim();
    if language.is_empty() {
        return UNDETERMINED.to_string();
    }

    let mut parts = language.splitn(2, ['-', '_']);
    let primary = parts.next().unwrap_or_default().to_ascii_lowercase();
    let primary = ISO_639_2_TO_1
        .binary_search_by(|(three, _)| three.cmp(&primary.as_str()))
        .map(|idx| ISO_639_2_TO_1[idx].1.to_string())
        .unwrap_or(primary);

    match parts.next() {
        Some(region) if !region.is_empty() => format!("{primary}-{}", region.to_ascii_uppercase()),
        _ => primary,
    }
}
