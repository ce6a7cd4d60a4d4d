//! Contact feeds. The engine never owns contact data; it pulls updated and
//! deleted contacts from a [`ContactSource`] during a sync.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Contact;

#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Contacts whose `last_updated` is strictly after `since` (millis
    /// since epoch).
    async fn updated_since(&self, since: i64) -> Result<Vec<Contact>>;

    /// Ids of contacts deleted strictly after `since`.
    async fn deleted_since(&self, since: i64) -> Result<Vec<i64>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedContact {
    pub id: i64,
    pub deleted_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactFile {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub deleted: Vec<DeletedContact>,
}

/// A contact feed backed by a JSON snapshot file.
pub struct JsonContactSource {
    file: ContactFile,
}

impl JsonContactSource {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read contact file {}", path.display()))?;
        let file: ContactFile = serde_json::from_str(&raw)
            .with_context(|| format!("malformed contact file {}", path.display()))?;
        Ok(Self { file })
    }

    pub fn from_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            file: ContactFile {
                contacts,
                deleted: Vec::new(),
            },
        }
    }

    pub fn new(file: ContactFile) -> Self {
        Self { file }
    }
}

#[async_trait]
impl ContactSource for JsonContactSource {
    async fn updated_since(&self, since: i64) -> Result<Vec<Contact>> {
        Ok(self
            .file
            .contacts
            .iter()
            .filter(|c| c.last_updated > since)
            .cloned()
            .collect())
    }

    async fn deleted_since(&self, since: i64) -> Result<Vec<i64>> {
        Ok(self
            .file
            .deleted
            .iter()
            .filter(|d| d.deleted_at > since)
            .map(|d| d.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: i64, last_updated: i64) -> Contact {
        Contact {
            id,
            display_name: Some(format!("c{id}")),
            numbers: Vec::new(),
            lookup_key: None,
            photo_id: None,
            starred: false,
            is_super_primary: false,
            is_primary: false,
            in_visible_group: false,
            last_time_used: 0,
            times_used: 0,
            last_updated,
        }
    }

    #[tokio::test]
    async fn test_updated_since_is_strict() {
        let source = JsonContactSource::from_contacts(vec![contact(1, 10), contact(2, 20)]);
        let updated = source.updated_since(10).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, 2);
    }

    #[tokio::test]
    async fn test_deleted_since() {
        let source = JsonContactSource::new(ContactFile {
            contacts: Vec::new(),
            deleted: vec![
                DeletedContact { id: 7, deleted_at: 5 },
                DeletedContact { id: 8, deleted_at: 15 },
            ],
        });
        assert_eq!(source.deleted_since(10).await.unwrap(), vec![8]);
        assert_eq!(source.deleted_since(0).await.unwrap(), vec![7, 8]);
    }
}
