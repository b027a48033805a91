//! Storage seams for the authority and the vault.
//!
//! The persistence engine is outside this crate; these traits are the mapping
//! operations the protocol needs from it. [`MemoryStore`] and
//! [`MemoryUserRegistry`] keep everything in process.

mod memory;

pub use memory::{MemoryStore, MemoryUserRegistry};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::index::IndexStructure;
use crate::{RecordId, UserId};

/// A record as held by the vault. Immutable once published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRecord {
    pub pseudonym: String,
    /// The encrypted document. Opaque to the vault.
    pub document: Vec<u8>,
    pub index: IndexStructure,
}

impl StoredRecord {
    /// The record as a flat field map, in the layout a key-value backend
    /// persists it: `pseudonym`, `record` and one `index:...` field per entry.
    pub fn fields(&self) -> BTreeMap<String, Vec<u8>> {
        let mut fields = BTreeMap::new();
        fields.insert("pseudonym".to_string(), self.pseudonym.clone().into_bytes());
        fields.insert("record".to_string(), self.document.clone());
        for (key, entry) in self.index.entries() {
            fields.insert(key, entry.as_str().as_bytes().to_vec());
        }
        fields
    }
}

/// Serialized complementary trapdoors, keyed by user.
pub trait TrapdoorStore: Send + Sync {
    fn get_trapdoor(&self, user_id: UserId) -> Result<Option<Vec<u8>>>;

    /// Stores the trapdoor unless one already exists. Returns whether it was
    /// stored.
    fn insert_trapdoor(&self, user_id: UserId, trapdoor: Vec<u8>) -> Result<bool>;

    /// Returns whether a trapdoor was removed.
    fn remove_trapdoor(&self, user_id: UserId) -> Result<bool>;
}

pub trait RecordStore: Send + Sync {
    /// Allocates the next record id and makes the record visible under it.
    /// Both happen in one step: no reader sees the id before the record, and
    /// two concurrent calls never share an id.
    fn publish(&self, record: StoredRecord) -> Result<RecordId>;

    fn record(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>>;

    /// All published records, ordered by id.
    fn snapshot(&self) -> Result<Vec<(RecordId, Arc<StoredRecord>)>>;

    /// The last allocated record id, 0 before the first publish.
    fn record_counter(&self) -> Result<u64>;
}

/// The authority's bookkeeping of authorized and revoked users.
pub trait UserRegistry: Send + Sync {
    /// Adds the user to the authorized set and drops it from the revoked set.
    /// Returns false if the user was already authorized.
    fn authorize(&self, user_id: UserId) -> Result<bool>;

    /// Moves the user from the authorized set to the revoked set.
    fn revoke(&self, user_id: UserId) -> Result<()>;

    fn is_authorized(&self, user_id: UserId) -> Result<bool>;

    fn is_revoked(&self, user_id: UserId) -> Result<bool>;
}
