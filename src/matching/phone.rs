//! Phone number normalization and country-code / area-code aware
//! tokenization for the prefix index.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

use crate::charmap::CharacterMap;
use crate::models::PhoneNumberTokens;

/// ITU country calling codes, 1-3 digits.
static COUNTRY_CODES: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn country_codes() -> &'static HashSet<&'static str> {
    COUNTRY_CODES.get_or_init(|| {
        [
            "1", "7", "20", "27", "30", "31", "32", "33", "34", "36", "39", "40", "41", "43",
            "44", "45", "46", "47", "48", "49", "51", "52", "53", "54", "55", "56", "57", "58",
            "60", "61", "62", "63", "64", "65", "66", "81", "82", "84", "86", "90", "91", "92",
            "93", "94", "95", "98", "211", "212", "213", "216", "218", "220", "221", "222",
            "223", "224", "225", "226", "227", "228", "229", "230", "231", "232", "233", "234",
            "235", "236", "237", "238", "239", "240", "241", "242", "243", "244", "245", "246",
            "247", "248", "249", "250", "251", "252", "253", "254", "255", "256", "257", "258",
            "260", "261", "262", "263", "264", "265", "266", "267", "268", "269", "290", "291",
            "297", "298", "299", "350", "351", "352", "353", "354", "355", "356", "357", "358",
            "359", "370", "371", "372", "373", "374", "375", "376", "377", "378", "379", "380",
            "381", "382", "383", "385", "386", "387", "389", "420", "421", "423", "500", "501",
            "502", "503", "504", "505", "506", "507", "508", "509", "590", "591", "592", "593",
            "594", "595", "596", "597", "598", "599", "670", "672", "673", "674", "675", "676",
            "677", "678", "679", "680", "681", "682", "683", "685", "686", "687", "688", "689",
            "690", "691", "692", "800", "808", "850", "852", "853", "855", "856", "870", "878",
            "880", "881", "882", "883", "886", "888", "960", "961", "962", "963", "964", "965",
            "966", "967", "968", "970", "971", "972", "973", "974", "975", "976", "977", "979",
            "992", "993", "994", "995", "996", "998",
        ]
        .into_iter()
        .collect()
    })
}

/// Splits raw phone numbers into the digit strings whose prefixes become
/// index entries, and detects country/area-code offsets for offset-retry
/// matching.
#[derive(Clone)]
pub struct PhoneNumberTokenizer {
    map: Arc<dyn CharacterMap>,
    nanp: bool,
}

impl PhoneNumberTokenizer {
    pub fn new(map: Arc<dyn CharacterMap>, nanp: bool) -> Self {
        Self { map, nanp }
    }

    /// A character that contributes a digit to the normalized number.
    /// Letters are not included: number matching is against typed numeric
    /// input only.
    pub fn numeric_digit(&self, ch: char) -> Option<char> {
        let c = self.map.normalize(ch);
        c.is_ascii_digit().then_some(c)
    }

    /// Digit-only remainder of `number` starting at char offset `offset`.
    pub fn normalize(&self, number: &str, offset: usize) -> String {
        number
            .chars()
            .skip(offset)
            .filter_map(|ch| self.numeric_digit(ch))
            .collect()
    }

    /// Detect country-code and NANP area-code offsets. Ambiguous offsets
    /// (a detected prefix whose digits cannot be located in the original
    /// string) degrade to `None`, never an error.
    pub fn parse(&self, number: &str) -> PhoneNumberTokens {
        let chars: Vec<char> = number.chars().collect();
        let mut tokens = PhoneNumberTokens::default();
        if chars.is_empty() {
            return tokens;
        }

        let digits = self.normalize(number, 0);

        if chars[0] == '+' {
            // Scan 1-3 characters after the '+' for a known calling code.
            for len in 1..=3usize {
                if 1 + len > chars.len() {
                    break;
                }
                let candidate: String = chars[1..1 + len].iter().collect();
                if !candidate.chars().all(|c| c.is_ascii_digit()) {
                    break;
                }
                if country_codes().contains(candidate.as_str()) {
                    tokens.country_code = Some(candidate);
                    tokens.country_code_offset = Some(1 + len);
                    break;
                }
            }
        } else if self.nanp && digits.len() == 11 && digits.starts_with('1') {
            // Leading 1 without '+' in a NANP region: the national number
            // starts at the second digit of the original string.
            tokens.country_code = Some("1".to_string());
            tokens.country_code_offset = self.nth_digit_offset(&chars, 1);
        }

        if self.nanp {
            let area: Option<&str> = if digits.len() == 10 {
                digits.get(0..3)
            } else if digits.len() == 11 && digits.starts_with('1') {
                digits.get(1..4)
            } else {
                None
            };
            if let Some(area) = area {
                // Best-effort: first contiguous occurrence of the area code
                // digits in the original string.
                let area_chars: Vec<char> = area.chars().collect();
                tokens.nanp_code_offset =
                    find_subsequence(&chars, &area_chars).map(|at| at + area_chars.len());
            }
        }

        tokens
    }

    /// Char offset of the `n`th (0-based) normalized digit.
    fn nth_digit_offset(&self, chars: &[char], n: usize) -> Option<usize> {
        chars
            .iter()
            .enumerate()
            .filter(|(_, ch)| self.numeric_digit(**ch).is_some())
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Digit strings whose prefixes identify this number: the full
    /// normalization plus, when detected, the variants with the country
    /// code and the NANP area code stripped. Empty input yields the empty
    /// set.
    pub fn tokens_for_indexing(&self, number: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if number.trim().is_empty() {
            return out;
        }
        let full = self.normalize(number, 0);
        if full.is_empty() {
            return out;
        }
        out.insert(full);
        let tokens = self.parse(number);
        for offset in [tokens.country_code_offset, tokens.nanp_code_offset]
            .into_iter()
            .flatten()
        {
            let stripped = self.normalize(number, offset);
            if !stripped.is_empty() {
                out.insert(stripped);
            }
        }
        out
    }
}

fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charmap::LatinCharacterMap;

    fn nanp_tokenizer() -> PhoneNumberTokenizer {
        PhoneNumberTokenizer::new(Arc::new(LatinCharacterMap), true)
    }

    fn plain_tokenizer() -> PhoneNumberTokenizer {
        PhoneNumberTokenizer::new(Arc::new(LatinCharacterMap), false)
    }

    #[test]
    fn test_normalize_strips_formatting() {
        let t = plain_tokenizer();
        assert_eq!(t.normalize("+1 (510) 555-1234", 0), "15105551234");
        assert_eq!(t.normalize("+1 (510) 555-1234", 2), "5105551234");
        assert_eq!(t.normalize("1-800-FLOWERS", 0), "1800");
    }

    #[test]
    fn test_parse_plus_country_code() {
        let t = nanp_tokenizer();
        let tokens = t.parse("+15105551234");
        assert_eq!(tokens.country_code.as_deref(), Some("1"));
        assert_eq!(tokens.country_code_offset, Some(2));
        assert_eq!(
            t.normalize("+15105551234", tokens.country_code_offset.unwrap()),
            "5105551234"
        );
        // Area code 510 sits at chars 2..5, so the local number starts at 5.
        assert_eq!(tokens.nanp_code_offset, Some(5));
        assert_eq!(t.normalize("+15105551234", 5), "5551234");
    }

    #[test]
    fn test_parse_three_digit_code() {
        let t = plain_tokenizer();
        let tokens = t.parse("+358 40 123 4567");
        assert_eq!(tokens.country_code.as_deref(), Some("358"));
        assert_eq!(tokens.country_code_offset, Some(4));
        assert_eq!(tokens.nanp_code_offset, None);
    }

    #[test]
    fn test_parse_bare_eleven_digit_nanp() {
        let t = nanp_tokenizer();
        let tokens = t.parse("1-510-555-1234");
        assert_eq!(tokens.country_code.as_deref(), Some("1"));
        // Second digit is the '5' at char index 2.
        assert_eq!(tokens.country_code_offset, Some(2));
        assert_eq!(tokens.nanp_code_offset, Some(5));
    }

    #[test]
    fn test_parse_ten_digit_formatted() {
        let t = nanp_tokenizer();
        let tokens = t.parse("(510) 555-1234");
        assert_eq!(tokens.country_code, None);
        // "510" starts at char 1, so the local number starts at 4.
        assert_eq!(tokens.nanp_code_offset, Some(4));
        assert_eq!(t.normalize("(510) 555-1234", 4), "5551234");
    }

    #[test]
    fn test_parse_unlocatable_area_code_degrades() {
        let t = nanp_tokenizer();
        // Ten digits but the area code never appears contiguously.
        let tokens = t.parse("5-1-0 555 1234");
        assert_eq!(tokens.nanp_code_offset, None);
    }

    #[test]
    fn test_parse_non_nanp_region() {
        let t = plain_tokenizer();
        let tokens = t.parse("1-510-555-1234");
        assert_eq!(tokens.country_code, None);
        assert_eq!(tokens.country_code_offset, None);
        assert_eq!(tokens.nanp_code_offset, None);
    }

    #[test]
    fn test_tokens_for_indexing() {
        let t = nanp_tokenizer();
        let tokens = t.tokens_for_indexing("+1-510-555-1234");
        let expected: BTreeSet<String> = ["15105551234", "5105551234", "5551234"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_tokens_for_indexing_empty() {
        let t = nanp_tokenizer();
        assert!(t.tokens_for_indexing("").is_empty());
        assert!(t.tokens_for_indexing("   ").is_empty());
        assert!(t.tokens_for_indexing("---").is_empty());
    }
}
