//! Generates the numeric prefix strings stored for a contact name. Any
//! prefix of any generated string is a valid lookup key for the contact.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::charmap::CharacterMap;

/// How many leading name tokens may be abbreviated to their initial.
pub const FIRST_TOKENS_FOR_INITIALS: usize = 2;
/// How many trailing name tokens may be abbreviated to their initial.
pub const LAST_TOKENS_FOR_INITIALS: usize = 2;

pub struct NamePrefixGenerator {
    map: Arc<dyn CharacterMap>,
}

impl NamePrefixGenerator {
    pub fn new(map: Arc<dyn CharacterMap>) -> Self {
        Self { map }
    }

    /// Splits `name` into maximal runs of matchable characters and returns
    /// each run digit-mapped, in order. Separator runs (spaces,
    /// punctuation, unmapped scripts) are discarded entirely.
    pub fn index_tokens(&self, name: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in name.chars() {
            if self.map.is_matchable(ch) {
                current.push(self.map.to_digit(self.map.normalize(ch)));
            } else if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }

    /// The full set of indexable digit strings for `name`:
    ///
    /// 1. the concatenations of the first N tokens for N = 1..=len, which
    ///    cover typing the name left to right;
    /// 2. initials combinations: tokens within the first
    ///    `FIRST_TOKENS_FOR_INITIALS` or last `LAST_TOKENS_FOR_INITIALS`
    ///    positions may be abbreviated to their first digit, each initial
    ///    prepended to either the final token or a previously built
    ///    combination. Middle tokens never contribute initials, so "Albert
    ///    Ben Charles Daniel Ed Foster" is reachable as "ABF" or "ABEF"
    ///    but not through a Charles or Daniel initial.
    ///
    /// An empty name yields an empty set; the contact stays reachable by
    /// number only.
    pub fn prefixes(&self, name: &str) -> BTreeSet<String> {
        let tokens = self.index_tokens(name);
        let mut out = BTreeSet::new();
        let n = tokens.len();
        if n == 0 {
            return out;
        }

        let mut acc = String::new();
        for token in &tokens {
            acc.push_str(token);
            out.insert(acc.clone());
        }

        if n > 1 {
            let last_window = n.saturating_sub(LAST_TOKENS_FOR_INITIALS);
            let eligible: Vec<usize> = (0..n - 1)
                .filter(|&i| i < FIRST_TOKENS_FOR_INITIALS || i >= last_window)
                .collect();
            let tail = &tokens[n - 1];
            let mut combos: Vec<String> = Vec::new();
            for &i in eligible.iter().rev() {
                let Some(initial) = tokens[i].chars().next() else {
                    continue;
                };
                let mut grown = Vec::with_capacity(combos.len() + 1);
                grown.push(format!("{initial}{tail}"));
                for combo in &combos {
                    grown.push(format!("{initial}{combo}"));
                }
                combos.extend(grown);
            }
            out.extend(combos);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charmap::LatinCharacterMap;

    fn generator() -> NamePrefixGenerator {
        NamePrefixGenerator::new(Arc::new(LatinCharacterMap))
    }

    fn digits(s: &str) -> String {
        let map = LatinCharacterMap;
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| map.to_digit(c))
            .collect()
    }

    #[test]
    fn test_index_tokens_splits_on_punctuation() {
        let g = generator();
        assert_eq!(g.index_tokens("Jo O'Brien"), vec!["56", "6", "27436"]);
        assert_eq!(g.index_tokens("  Fred  Smith "), vec!["3733", "76484"]);
        assert!(g.index_tokens("").is_empty());
        assert!(g.index_tokens(" -- ").is_empty());
    }

    #[test]
    fn test_prefixes_two_token_name() {
        let g = generator();
        let set = g.prefixes("Fred Smith");
        assert!(set.contains(&digits("fred")));
        assert!(set.contains(&digits("fredsmith")));
        assert!(set.contains(&digits("fsmith")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_prefixes_six_token_name_initials() {
        let g = generator();
        let set = g.prefixes("Albert Ben Charles Daniel Ed Foster");
        // Left-to-right concatenations.
        assert!(set.contains(&digits("albert")));
        assert!(set.contains(&digits("albertben")));
        assert!(set.contains(&digits("albertbencharlesdanieledfoster")));
        // Initials over the first-2 / last-2 windows.
        for combo in [
            "efoster", "bfoster", "befoster", "afoster", "aefoster", "abfoster", "abefoster",
        ] {
            assert!(set.contains(&digits(combo)), "missing {combo}");
        }
        // 6 concatenations + 5 combinations: 'a' and 'b' share digit '2',
        // so afoster/bfoster and aefoster/befoster each fold to one entry.
        assert_eq!(set.len(), 11);
    }

    #[test]
    fn test_middle_tokens_never_contribute_initials() {
        let g = generator();
        // Initials map to distinct digits: a=2 m=6 t=8 w=9 r=7 s=7.
        let set = g.prefixes("Alice Mary Tom Walter Ruth Sam");
        // Tom and Walter are middle tokens; no combination may start with
        // their digits.
        assert!(!set.iter().any(|p| p.starts_with('8')));
        assert!(!set.iter().any(|p| p.starts_with('9')));
        // But the eligible windows are all present.
        assert!(set.contains(&digits("rsam")));
        assert!(set.contains(&digits("amrsam")));
    }

    #[test]
    fn test_empty_name() {
        let g = generator();
        assert!(g.prefixes("").is_empty());
        assert!(g.prefixes("...").is_empty());
    }

    #[test]
    fn test_three_token_name() {
        let g = generator();
        let set = g.prefixes("John Fitzgerald Kennedy");
        assert!(set.contains(&digits("jfkennedy")));
        assert!(set.contains(&digits("jkennedy")));
        assert!(set.contains(&digits("fkennedy")));
    }
}
