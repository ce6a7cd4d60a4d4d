use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::charmap::{CharacterMap, CyrillicCharacterMap, LatinCharacterMap};
use crate::error::ConfigError;

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn to_url(&self) -> String {
        if self.path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}", self.path)
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("path", &self.path)
            .finish()
    }
}

/// Script family the device keypad maps letters with. Selected once at
/// configuration time; changing it requires a forced full reindex because
/// stored prefixes depend on the digit mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptFamily {
    Latin,
    Cyrillic,
}

impl ScriptFamily {
    pub fn character_map(self) -> Arc<dyn CharacterMap> {
        match self {
            ScriptFamily::Latin => Arc::new(LatinCharacterMap),
            ScriptFamily::Cyrillic => Arc::new(CyrillicCharacterMap),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Whether the SIM region follows the North American Numbering Plan.
    /// Changing this requires `start_update(force_full = true)`.
    pub nanp: bool,
    pub script: ScriptFamily,
    /// Policy for lookups with an empty query: true means every candidate
    /// matches at position (0, 0), false means an empty result list.
    pub match_empty_query: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            nanp: false,
            script: ScriptFamily::Latin,
            match_empty_query: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Emit a progress update every N contacts during a sync.
    pub progress_every: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            progress_every: 500,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            });
        }
        if self.indexer.progress_every == 0 {
            return Err(ConfigError::InvalidValue {
                field: "indexer.progress_every",
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}
