use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::Result;
use crate::{RecordId, UserId};

use super::{RecordStore, StoredRecord, TrapdoorStore, UserRegistry};

#[derive(Default)]
struct Records {
    counter: u64,
    entries: BTreeMap<RecordId, Arc<StoredRecord>>,
}

/// In-process vault storage.
#[derive(Default)]
pub struct MemoryStore {
    trapdoors: RwLock<HashMap<UserId, Vec<u8>>>,
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrapdoorStore for MemoryStore {
    fn get_trapdoor(&self, user_id: UserId) -> Result<Option<Vec<u8>>> {
        Ok(self.trapdoors.read().get(&user_id).cloned())
    }

    fn insert_trapdoor(&self, user_id: UserId, trapdoor: Vec<u8>) -> Result<bool> {
        let mut trapdoors = self.trapdoors.write();
        if trapdoors.contains_key(&user_id) {
            return Ok(false);
        }
        trapdoors.insert(user_id, trapdoor);
        Ok(true)
    }

    fn remove_trapdoor(&self, user_id: UserId) -> Result<bool> {
        Ok(self.trapdoors.write().remove(&user_id).is_some())
    }
}

impl RecordStore for MemoryStore {
    fn publish(&self, record: StoredRecord) -> Result<RecordId> {
        let mut records = self.records.write();
        records.counter += 1;
        let id = records.counter;
        records.entries.insert(id, Arc::new(record));
        Ok(id)
    }

    fn record(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>> {
        Ok(self.records.read().entries.get(&id).cloned())
    }

    fn snapshot(&self) -> Result<Vec<(RecordId, Arc<StoredRecord>)>> {
        Ok(self
            .records
            .read()
            .entries
            .iter()
            .map(|(id, record)| (*id, Arc::clone(record)))
            .collect())
    }

    fn record_counter(&self) -> Result<u64> {
        Ok(self.records.read().counter)
    }
}

#[derive(Default)]
struct UserSets {
    authorized: BTreeSet<UserId>,
    revoked: BTreeSet<UserId>,
}

/// In-process authority bookkeeping.
#[derive(Default)]
pub struct MemoryUserRegistry {
    users: RwLock<UserSets>,
}

impl MemoryUserRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRegistry for MemoryUserRegistry {
    fn authorize(&self, user_id: UserId) -> Result<bool> {
        let mut users = self.users.write();
        users.revoked.remove(&user_id);
        Ok(users.authorized.insert(user_id))
    }

    fn revoke(&self, user_id: UserId) -> Result<()> {
        let mut users = self.users.write();
        users.authorized.remove(&user_id);
        users.revoked.insert(user_id);
        Ok(())
    }

    fn is_authorized(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.read().authorized.contains(&user_id))
    }

    fn is_revoked(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.read().revoked.contains(&user_id))
    }
}
