//! Authoritative matcher for a single dialpad query. The prefix index only
//! narrows candidates; every hit it returns is re-validated here, and the
//! highlight positions come from this walk.

use std::sync::Arc;

use crate::charmap::CharacterMap;
use crate::config::MatcherConfig;
use crate::matching::phone::PhoneNumberTokenizer;
use crate::models::MatchPosition;

/// One query, compiled against a character map. Construct once per lookup
/// and reuse across all candidates.
pub struct NameQueryMatcher {
    query: Vec<char>,
    match_empty_query: bool,
    map: Arc<dyn CharacterMap>,
    tokenizer: PhoneNumberTokenizer,
}

impl NameQueryMatcher {
    /// Non-digit characters in `query` are dropped; dialpad input is
    /// digits only.
    pub fn new(query: &str, config: &MatcherConfig) -> Self {
        let map = config.script.character_map();
        Self {
            query: query.chars().filter(char::is_ascii_digit).collect(),
            match_empty_query: config.match_empty_query,
            tokenizer: PhoneNumberTokenizer::new(Arc::clone(&map), config.nanp),
            map,
        }
    }

    /// The sanitized query digits, as stored-prefix lookup key.
    pub fn digits(&self) -> String {
        self.query.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Matches the query against a display name. `None` means no match;
    /// otherwise the returned positions cover every highlighted span.
    ///
    /// An empty query matches every name exactly when the configured
    /// empty-query policy says so, with a single empty position.
    pub fn match_name(&self, name: &str) -> Option<Vec<MatchPosition>> {
        if self.query.is_empty() {
            return self
                .match_empty_query
                .then(|| vec![MatchPosition::new(0, 0)]);
        }
        let chars: Vec<char> = name.chars().collect();
        let mut out = Vec::new();
        self.match_combination(&chars, 0, &self.query, &mut out)
            .then_some(out)
    }

    /// Walks `name` looking for the query either as a prefix of the
    /// token concatenation starting at some token, or as an initial plus
    /// a recursive match over the remaining tokens. A concatenation match
    /// found during the walk wins over an initials match found earlier.
    fn match_combination(
        &self,
        name: &[char],
        base: usize,
        query: &[char],
        out: &mut Vec<MatchPosition>,
    ) -> bool {
        if query.is_empty() || name.len() < query.len() {
            return false;
        }
        let mut query_at = 0usize;
        let mut separators = 0usize;
        let mut token_start = 0usize;
        let mut partial: Option<Vec<MatchPosition>> = None;

        let mut i = 0usize;
        while i < name.len() {
            let ch = name[i];
            if self.map.is_matchable(ch) {
                let digit = self.map.to_digit(self.map.normalize(ch));
                if digit == query[query_at] {
                    // An initial can only be consumed at a token head with
                    // nothing matched yet; keep the first such expansion.
                    if query_at == 0
                        && partial.is_none()
                        && query.len() > 1
                        && (i == 0 || !self.map.is_matchable(name[i - 1]))
                    {
                        let mut sub = vec![MatchPosition::new(base + i, base + i + 1)];
                        let next = next_token_start(&*self.map, name, i);
                        if next < name.len()
                            && self.match_combination(
                                &name[next..],
                                base + next,
                                &query[1..],
                                &mut sub,
                            )
                        {
                            partial = Some(sub);
                        }
                    }
                    query_at += 1;
                    if query_at == query.len() {
                        out.push(MatchPosition::new(
                            base + token_start,
                            base + token_start + query.len() + separators,
                        ));
                        return true;
                    }
                    i += 1;
                } else {
                    // Restart at the token after the one this attempt was
                    // anchored on; `i` may already be one or more tokens
                    // past the anchor.
                    i = next_token_start(&*self.map, name, token_start);
                    token_start = i;
                    query_at = 0;
                    separators = 0;
                }
            } else {
                if query_at == 0 {
                    token_start = i + 1;
                } else {
                    separators += 1;
                }
                i += 1;
            }
        }

        if let Some(positions) = partial {
            out.extend(positions);
            return true;
        }
        false
    }

    /// Matches the query against a raw phone number: first against the
    /// whole number, then retrying past the country code and past the
    /// NANP area code when those were detected.
    pub fn match_number(&self, number: &str) -> Option<MatchPosition> {
        if self.query.is_empty() {
            return None;
        }
        let chars: Vec<char> = number.chars().collect();
        if let Some(pos) = self.match_number_at(&chars, 0) {
            return Some(pos);
        }
        let tokens = self.tokenizer.parse(number);
        [tokens.country_code_offset, tokens.nanp_code_offset]
            .into_iter()
            .flatten()
            .find_map(|offset| self.match_number_at(&chars, offset))
    }

    /// Contiguous digit match starting at the first digit at or after
    /// `offset`. Separators before the first matched digit move the
    /// highlight start forward, except at position 0 where a leading
    /// separator stays inside the highlight; separators between matched
    /// digits are covered by it.
    fn match_number_at(&self, number: &[char], offset: usize) -> Option<MatchPosition> {
        if offset >= number.len() {
            return None;
        }
        let mut start = offset;
        let mut end = offset;
        let mut query_at = 0usize;
        for (i, &ch) in number.iter().enumerate().skip(offset) {
            if query_at == self.query.len() {
                break;
            }
            if let Some(digit) = self.tokenizer.numeric_digit(ch) {
                if digit != self.query[query_at] {
                    return None;
                }
                query_at += 1;
                end = i + 1;
            } else if query_at == 0 && start != 0 {
                start = i + 1;
            }
        }
        (query_at == self.query.len()).then(|| MatchPosition::new(start, end))
    }
}

fn next_token_start(map: &dyn CharacterMap, name: &[char], from: usize) -> usize {
    let mut i = from;
    while i < name.len() && map.is_matchable(name[i]) {
        i += 1;
    }
    while i < name.len() && !map.is_matchable(name[i]) {
        i += 1;
    }
    i
}
