use serde::{Deserialize, Serialize};

/// One contact as reported by the external contact source. The engine never
/// mutates the source; a contact is re-read whenever the source reports it
/// updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub display_name: Option<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub lookup_key: Option<String>,
    #[serde(default)]
    pub photo_id: Option<i64>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub is_super_primary: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub in_visible_group: bool,
    /// Millis since epoch of the last call/use of this contact.
    #[serde(default)]
    pub last_time_used: i64,
    #[serde(default)]
    pub times_used: i64,
    /// Millis since epoch of the last source-side update; drives the
    /// incremental sync window.
    #[serde(default)]
    pub last_updated: i64,
}

/// Denormalized index entry: one row per (contact, number) pair, plus one
/// row for number-less contacts so they stay reachable by name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
    pub contact_id: i64,
    pub display_name: Option<String>,
    pub number: Option<String>,
    pub lookup_key: Option<String>,
    pub photo_id: Option<i64>,
    pub starred: bool,
    pub is_super_primary: bool,
    pub is_primary: bool,
    pub in_visible_group: bool,
    pub last_time_used: i64,
    pub times_used: i64,
    pub indexed_at: i64,
}

/// Half-open char range into a display name or formatted number, marking
/// the substring to highlight for the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPosition {
    pub start: usize,
    pub end: usize,
}

impl MatchPosition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Ephemeral parse of one phone number. Offsets are char offsets into the
/// original (unnormalized) string; `None` means the prefix was not detected
/// or could not be located, so 0 remains a real offset value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneNumberTokens {
    pub country_code: Option<String>,
    /// Offset just past the detected country calling code.
    pub country_code_offset: Option<usize>,
    /// Offset just past the detected NANP area code.
    pub nanp_code_offset: Option<usize>,
}

/// One ranked lookup result. Positions index into `display_name` /
/// `matched_number` respectively and are produced fresh per query.
#[derive(Debug, Clone)]
pub struct LookupHit {
    pub contact_id: i64,
    pub display_name: Option<String>,
    pub matched_number: Option<String>,
    pub lookup_key: Option<String>,
    pub photo_id: Option<i64>,
    pub name_positions: Vec<MatchPosition>,
    pub number_position: Option<MatchPosition>,
}
