//! Dialpad character maps: which characters participate in matching and
//! which keypad digit they map to.

use unicode_normalization::char::{decompose_canonical, is_combining_mark};

/// Per-script mapping from characters to dialpad digits.
///
/// All three operations are total over their documented domain: callers
/// filter with `is_matchable` before relying on `to_digit`, and `to_digit`
/// returns unmapped input unchanged.
pub trait CharacterMap: Send + Sync {
    /// True if `ch` is a digit 0-9 or a letter with a keypad mapping.
    fn is_matchable(&self, ch: char) -> bool;

    /// Strips diacritics to the base lowercase letter ('Ü' -> 'u');
    /// identity for characters without an accent.
    fn normalize(&self, ch: char) -> char;

    /// Maps a matchable character to its keypad digit; digits map to
    /// themselves.
    fn to_digit(&self, ch: char) -> char;
}

/// Remove combining marks by canonical decomposition, then lowercase.
fn fold_char(ch: char) -> char {
    let mut base = None;
    decompose_canonical(ch, |c| {
        if base.is_none() && !is_combining_mark(c) {
            base = Some(c);
        }
    });
    let base = base.unwrap_or(ch);
    base.to_lowercase().next().unwrap_or(base)
}

fn latin_digit(ch: char) -> char {
    match ch {
        'a'..='c' => '2',
        'd'..='f' => '3',
        'g'..='i' => '4',
        'j'..='l' => '5',
        'm'..='o' => '6',
        'p'..='s' => '7',
        't'..='v' => '8',
        'w'..='z' => '9',
        d if d.is_ascii_digit() => d,
        other => other,
    }
}

/// Standard 12-key layout over a-z.
pub struct LatinCharacterMap;

impl CharacterMap for LatinCharacterMap {
    fn is_matchable(&self, ch: char) -> bool {
        let c = fold_char(ch);
        c.is_ascii_digit() || c.is_ascii_lowercase()
    }

    fn normalize(&self, ch: char) -> char {
        fold_char(ch)
    }

    fn to_digit(&self, ch: char) -> char {
        latin_digit(fold_char(ch))
    }
}

/// Russian 10-key layout; falls back to the latin table for ASCII letters
/// so mixed-script contact lists stay searchable.
pub struct CyrillicCharacterMap;

fn cyrillic_digit(ch: char) -> char {
    match ch {
        'а'..='г' => '2',
        'д'..='з' | 'ё' => '3',
        'и'..='л' => '4',
        'м'..='п' => '5',
        'р'..='у' => '6',
        'ф'..='ч' => '7',
        'ш'..='ы' => '8',
        'ь'..='я' => '9',
        other => latin_digit(other),
    }
}

impl CharacterMap for CyrillicCharacterMap {
    fn is_matchable(&self, ch: char) -> bool {
        let c = fold_char(ch);
        c.is_ascii_digit() || c.is_ascii_lowercase() || matches!(c, 'а'..='я' | 'ё')
    }

    fn normalize(&self, ch: char) -> char {
        fold_char(ch)
    }

    fn to_digit(&self, ch: char) -> char {
        cyrillic_digit(fold_char(ch))
    }
}
