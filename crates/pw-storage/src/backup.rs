//! Backup records.

use chrono::{DateTime, Utc};
use pw_core::Document;
use serde::{Deserialize, Serialize};

/// A point-in-time copy of a document, stored under its own key.
///
/// Serialized as the document's own fields plus `backedUpAt`. The storage
/// key is not part of the stored value; it is filled in when the record is
/// read back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    #[serde(skip)]
    pub key: String,
    #[serde(flatten)]
    pub document: Document,
    pub backed_up_at: DateTime<Utc>,
}

impl BackupRecord {
    pub fn new(key: impl Into<String>, document: Document, backed_up_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            document,
            backed_up_at,
        }
    }

    /// The part of the key after the backup prefix.
    pub fn suffix<'a>(&'a self, prefix: &str) -> &'a str {
        self.key.strip_prefix(prefix).unwrap_or(&self.key)
    }
}
