//! Dialpad matching: phone number tokenization, name prefix generation,
//! per-query matching, and result ranking.

pub mod name_prefix;
pub mod phone;
pub mod query_matcher;
pub mod ranking;

pub use name_prefix::NamePrefixGenerator;
pub use phone::PhoneNumberTokenizer;
pub use query_matcher::NameQueryMatcher;
pub use ranking::compare_candidates;
