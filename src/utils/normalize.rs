// src/utils/normalize.rs

//! String folding shared by the crawler and the matching engine.
//!
//! `normalize` is the single comparison form: two inputs that differ only in
//! case, spacing, underscores, percent-encoding or quote style normalize to
//! the same string.

/// Quote characters folded to a plain apostrophe.
const QUOTE_VARIANTS: [char; 8] = [
    '\u{2018}', // ‘
    '\u{2019}', // ’
    '\u{201B}', // ‛
    '\u{02BC}', // ʼ
    '\u{2032}', // ′
    '\u{00B4}', // ´
    '`',
    '\u{FF07}', // ＇
];

/// Fold a string into its canonical comparison form.
///
/// Percent-decodes (to a fixed point), folds quote variants to `'`, treats
/// `_` as a space, collapses whitespace, trims and lowercases.
/// `normalize(&normalize(s)) == normalize(s)` for every input.
pub fn normalize(s: &str) -> String {
    let decoded = percent_decode_fully(s);

    let folded: String = decoded
        .chars()
        .map(|c| {
            if QUOTE_VARIANTS.contains(&c) {
                '\''
            } else if c == '_' {
                ' '
            } else {
                c
            }
        })
        .collect();

    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize optional input; absent input becomes the empty string.
pub fn normalize_opt(s: Option<&str>) -> String {
    s.map(normalize).unwrap_or_default()
}

/// Derive a dataset identifier from a page title or entity name.
///
/// `"Angler's Fish"` becomes `anglers_fish`.
pub fn slug(title: &str) -> String {
    normalize(title)
        .replace('\'', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Decode percent-encoding until nothing changes.
///
/// Each successful decode that changes the string makes it shorter, so this
/// terminates. Input that does not decode to UTF-8 is returned as-is.
fn percent_decode_fully(s: &str) -> String {
    let mut current = s.to_string();
    while current.contains('%') {
        match urlencoding::decode(&current) {
            Ok(decoded) if decoded != current => current = decoded.into_owned(),
            _ => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(normalize("  Abyssal   Enchant \t"), "abyssal enchant");
        assert_eq!(normalize("ABYSSAL"), normalize("abyssal"));
    }

    #[test]
    fn test_quote_variants_unify() {
        let expected = "angler's fish";
        assert_eq!(normalize("Angler’s Fish"), expected);
        assert_eq!(normalize("Angler‘s Fish"), expected);
        assert_eq!(normalize("Angler`s Fish"), expected);
        assert_eq!(normalize("Angler's Fish"), expected);
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(normalize("Angler%27s_Fish"), "angler's fish");
        assert_eq!(normalize("Great%2520White"), "great white");
    }

    #[test]
    fn test_invalid_percent_sequence_is_kept() {
        assert_eq!(normalize("100%"), "100%");
        assert_eq!(normalize("bad %FF byte"), "bad %ff byte");
    }

    #[test]
    fn test_underscores_are_spaces() {
        assert_eq!(normalize("abyssal_enchant"), "abyssal enchant");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "Abyssal",
            "  Great   WHITE_shark ",
            "Angler’s%20Fish",
            "%2541",
            "%41%FF",
            "C$/kg",
            "Ünïcödé Fish",
            "`quoted`",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_absent_input() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some(" X ")), "x");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Angler's Fish"), "anglers_fish");
        assert_eq!(slug("  Great White Shark "), "great_white_shark");
        assert_eq!(slug("Song of the Deep"), "song_of_the_deep");
        assert_eq!(slug(&slug("Angler’s Fish")), slug("Angler’s Fish"));
    }
}
