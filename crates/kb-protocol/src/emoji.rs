//! Emoji key canonicalization (§9).
//!
//! The picker and the reaction store must agree on a single canonical id for
//! a given emoji, regardless of which of several equivalent spellings a
//! service sent: raw Unicode with or without the variation selector
//! U+FE0F, Slack shortcodes (`+1`, `thumbsup`), and colon-wrapped forms
//! (`:+1:`, `:thumbsup:`).

const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Shortcode aliases that map to the same canonical id as their Unicode
/// glyph. Kept intentionally small; this is not a full emoji database.
const SHORTCODE_ALIASES: &[(&str, &str)] = &[
    ("+1", "\u{1F44D}"),
    ("thumbsup", "\u{1F44D}"),
    ("-1", "\u{1F44E}"),
    ("thumbsdown", "\u{1F44E}"),
    ("heart", "\u{2764}"),
    ("joy", "\u{1F602}"),
    ("fire", "\u{1F525}"),
    ("eyes", "\u{1F440}"),
    ("tada", "\u{1F389}"),
    ("rocket", "\u{1F680}"),
];

/// Normalize an arbitrary reaction key to a canonical id.
///
/// Strips a surrounding `:colon:` wrapper, strips the variation selector,
/// then maps known shortcodes to their Unicode glyph. Unknown shortcodes
/// and already-canonical glyphs pass through unchanged (minus the
/// variation selector).
#[must_use]
pub fn canonicalize(key: &str) -> String {
    let unwrapped = key
        .strip_prefix(':')
        .and_then(|s| s.strip_suffix(':'))
        .unwrap_or(key);

    let stripped: String = unwrapped.chars().filter(|&c| c != VARIATION_SELECTOR_16).collect();

    for (alias, canonical) in SHORTCODE_ALIASES {
        if stripped == *alias {
            return (*canonical).to_owned();
        }
    }
    stripped
}
