//! 2-letter → ISO 639-2/B 3-letter language code mapping
//!
//! The entry editor stores 2-letter codes; the archive expects bibliographic
//! 3-letter codes. Codes with no mapping fall back to `und` (undetermined)
//! so a text in an unlisted language is archived rather than dropped.

/// Marker for languages the mapping table does not know.
pub const UNDETERMINED: &str = "und";

/// Codes the editor offers, in bibliographic (639-2/B) form where the
/// bibliographic and terminological codes differ (ger, fre, ...).
const ISO_639_MAP: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("cs", "cze"),
    ("da", "dan"),
    ("de", "ger"),
    ("el", "gre"),
    ("en", "eng"),
    ("es", "spa"),
    ("fa", "per"),
    ("fi", "fin"),
    ("fr", "fre"),
    ("he", "heb"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("ko", "kor"),
    ("nl", "dut"),
    ("no", "nor"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "rum"),
    ("ru", "rus"),
    ("sk", "slo"),
    ("sl", "slv"),
    ("sr", "srp"),
    ("sv", "swe"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("zh", "chi"),
];

/// Map a 2-letter code to its 3-letter form, `und` when unknown.
///
/// Input is trimmed and lowercased; region subtags (`en-US`) are reduced to
/// the primary subtag before lookup.
pub fn to_iso639_2(code: &str) -> &'static str {
    let normalized = code.trim().to_ascii_lowercase();
    let primary = normalized.split(['-', '_']).next().unwrap_or("");

    ISO_639_MAP
        .iter()
        .find(|(two, _)| *two == primary)
        .map(|(_, three)| *three)
        .unwrap_or(UNDETERMINED)
}

/// True when the code maps to a real (non-`und`) 3-letter code.
pub fn is_recognized(code: &str) -> bool {
    to_iso639_2(code) != UNDETERMINED
}

/// True when `three` is a 3-letter code this table can produce, excluding
/// the undetermined marker. Used by the thesis schema's language rule.
pub fn is_recognized_iso639_2(three: &str) -> bool {
    ISO_639_MAP.iter().any(|(_, t)| *t == three)
}
