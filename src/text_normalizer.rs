//! # Text Normalizer
//!
//! Canonicalises pasted or scraped recipe text before it reaches the line
//! parser: Unicode vulgar fractions become ASCII `n/d`, and the line-ending and
//! space variants that copy/paste drags in are folded to plain `\n` and ` `.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref FRACTION_GLYPH: Regex =
        Regex::new(r"([0-9])?([¼½¾⅐⅑⅒⅓⅔⅕⅖⅗⅘⅙⅚⅛⅜⅝⅞])").expect("fraction glyph pattern should be valid");
}

/// Maps a vulgar-fraction code point to its ASCII form.
fn fraction_text(glyph: char) -> Option<&'static str> {
    let text = match glyph {
        '¼' => "1/4",
        '½' => "1/2",
        '¾' => "3/4",
        '⅐' => "1/7",
        '⅑' => "1/9",
        '⅒' => "1/10",
        '⅓' => "1/3",
        '⅔' => "2/3",
        '⅕' => "1/5",
        '⅖' => "2/5",
        '⅗' => "3/5",
        '⅘' => "4/5",
        '⅙' => "1/6",
        '⅚' => "5/6",
        '⅛' => "1/8",
        '⅜' => "3/8",
        '⅝' => "5/8",
        '⅞' => "7/8",
        _ => return None,
    };
    Some(text)
}

/// Replaces fraction glyphs with `n/d`, inserting a space after a directly
/// preceding digit so `1½` reads as the mixed number `1 1/2`.
pub fn normalize_fractions(text: &str) -> String {
    FRACTION_GLYPH
        .replace_all(text, |caps: &Captures| {
            let glyph = caps[2].chars().next().unwrap_or_default();
            let fraction = fraction_text(glyph).unwrap_or(&caps[2]);
            match caps.get(1) {
                Some(digit) => format!("{} {}", digit.as_str(), fraction),
                None => fraction.to_string(),
            }
        })
        .into_owned()
}

/// Full normalization: line endings, space variants, fraction slash, then
/// fraction glyphs. Idempotent.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                folded.push('\n');
            }
            '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{202F}' => folded.push(' '),
            '\u{2044}' => folded.push('/'),
            _ => folded.push(c),
        }
    }
    normalize_fractions(&folded)
}
