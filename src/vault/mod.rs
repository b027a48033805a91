//! The vault: stores encrypted records and matches queries against them
//! without learning keywords.
//!
//! For a user `u` the vault only holds the complementary trapdoor
//! `comK = g^(x/xu)` (in G2). Pairing a query token `hs(w)^xu` with it gives
//! `e(hs(w), g)^x`, the same element the client derived when it indexed `w`.
//! Deleting `comK` revokes the user without touching stored records.

mod matching;

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_std::rand::RngCore;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::cipher::SymmetricKey;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::group::{from_bytes, h, pair, to_bytes};
use crate::index::IndexStructure;
use crate::protocol::{
    AddRequest, AddResponse, IndexRequest, SearchHit, SearchRequest, UserRegistration, VaultApi,
};
use crate::store::{MemoryStore, RecordStore, StoredRecord, TrapdoorStore};
use crate::token::random_token;
use crate::{RecordId, UserId};

use matching::{exact_match, fuzzy_matched_positions, parse_positions};

pub struct Vault<E: Pairing, S = MemoryStore> {
    store: S,
    config: Config,
    _engine: PhantomData<E>,
}

impl<E: Pairing> Vault<E, MemoryStore> {
    /// A vault backed by [`MemoryStore`] with the default configuration.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), Config::default())
    }
}

impl<E: Pairing, S: TrapdoorStore + RecordStore> Vault<E, S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config,
            _engine: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores the complementary trapdoor of a newly enrolled user. Returns
    /// false, leaving the existing trapdoor in place, if the user has one.
    #[instrument(skip(self, comp_key))]
    pub fn register_user(&self, user_id: UserId, comp_key: &E::G2Affine) -> Result<bool> {
        let stored = self.store.insert_trapdoor(user_id, to_bytes(comp_key)?)?;
        if stored {
            info!("trapdoor stored");
        } else {
            debug!("trapdoor already present");
        }
        Ok(stored)
    }

    fn trapdoor(&self, user_id: UserId) -> Result<E::G2Affine> {
        let bytes = self
            .store
            .get_trapdoor(user_id)?
            .ok_or(Error::NotAuthorized(user_id))?;
        from_bytes(&bytes)
    }

    /// Second step of index generation: pairs each blinded keyword hash with
    /// the user's trapdoor, preserving order.
    pub fn complete_index_request(
        &self,
        user_id: UserId,
        blinded: &[E::G1Affine],
    ) -> Result<Vec<PairingOutput<E>>> {
        let com_k = self.trapdoor(user_id)?;
        Ok(pair_all::<E>(com_k, blinded))
    }

    /// Publishes an encrypted record under a fresh id and pseudonym.
    ///
    /// Pseudonyms are random and not checked for uniqueness.
    pub fn store_record<R: RngCore>(
        &self,
        rng: &mut R,
        document: Vec<u8>,
        index: IndexStructure,
    ) -> Result<(RecordId, String)> {
        let pseudonym = random_token(rng, self.config.pseudonym_length);
        let record_id = self.store.publish(StoredRecord {
            pseudonym: pseudonym.clone(),
            document,
            index,
        })?;
        info!(record_id, "record published");
        Ok((record_id, pseudonym))
    }

    /// Raw lookup of a stored record, regardless of any user's access.
    pub fn record(&self, record_id: RecordId) -> Result<Option<Arc<StoredRecord>>> {
        self.store.record(record_id)
    }

    fn derive_keys(&self, com_k: E::G2Affine, tokens: &[E::G1Affine]) -> Result<Vec<SymmetricKey>> {
        tokens.iter().map(|t| h(&pair::<E>(*t, com_k))).collect()
    }

    /// Returns every record in which each query token matches at least one
    /// index entry.
    #[instrument(skip(self, tokens), fields(token_count = tokens.len()))]
    pub fn exact_search(&self, user_id: UserId, tokens: &[E::G1Affine]) -> Result<Vec<SearchHit>> {
        let com_k = self.trapdoor(user_id)?;
        let keys = self.derive_keys(com_k, tokens)?;

        let records = self.store.snapshot()?;
        let hits: Vec<SearchHit> = records
            .iter()
            .filter(|(id, record)| exact_match(&keys, &parse_positions(*id, &record.index)))
            .map(|(_, record)| hit(record))
            .collect();

        debug!(scanned = records.len(), hits = hits.len(), "exact search done");
        Ok(hits)
    }

    /// Returns every record with exactly `expected_keyword_count` keyword
    /// positions matched, each by a different query group.
    #[instrument(skip(self, token_groups), fields(group_count = token_groups.len()))]
    pub fn fuzzy_search(
        &self,
        user_id: UserId,
        token_groups: &[Vec<E::G1Affine>],
        expected_keyword_count: usize,
    ) -> Result<Vec<SearchHit>> {
        let com_k = self.trapdoor(user_id)?;
        let key_groups = token_groups
            .iter()
            .map(|tokens| self.derive_keys(com_k, tokens))
            .collect::<Result<Vec<_>>>()?;

        let records = self.store.snapshot()?;
        let hits: Vec<SearchHit> = records
            .iter()
            .filter(|(id, record)| {
                let matched =
                    fuzzy_matched_positions(&key_groups, &parse_positions(*id, &record.index));
                matched > 0 && matched == expected_keyword_count
            })
            .map(|(_, record)| hit(record))
            .collect();

        debug!(scanned = records.len(), hits = hits.len(), "fuzzy search done");
        Ok(hits)
    }

    /// Deletes the user's trapdoor. Stored records stay as they are.
    #[instrument(skip(self))]
    pub fn revoke_access(&self, user_id: UserId) -> Result<bool> {
        if !self.store.remove_trapdoor(user_id)? {
            return Err(Error::AlreadyRevokedOrUnknown(user_id));
        }
        info!("trapdoor deleted");
        Ok(true)
    }
}

fn pair_all<E: Pairing>(com_k: E::G2Affine, blinded: &[E::G1Affine]) -> Vec<PairingOutput<E>> {
    blinded.iter().map(|r| pair::<E>(*r, com_k)).collect()
}

fn hit(record: &StoredRecord) -> SearchHit {
    SearchHit {
        record: record.document.clone(),
        pseudonym: record.pseudonym.clone(),
    }
}

fn decode_tokens<E: Pairing>(tokens: &[Vec<u8>]) -> Result<Vec<E::G1Affine>> {
    tokens.iter().map(|t| from_bytes(t)).collect()
}

impl<E: Pairing, S: TrapdoorStore + RecordStore> VaultApi<E> for Vault<E, S> {
    fn generate_index(&self, request: &IndexRequest) -> Result<Vec<Vec<u8>>> {
        let com_k = self.trapdoor(request.user_id)?;
        let blinded = decode_tokens::<E>(&request.hashed_keywords)?;
        pair_all::<E>(com_k, &blinded).iter().map(to_bytes).collect()
    }

    fn add_record<R: RngCore>(&self, rng: &mut R, request: AddRequest) -> Result<AddResponse> {
        let (_, pseudonym) = self.store_record(rng, request.record.clone(), request.indices)?;
        Ok(AddResponse {
            pseudonym,
            record: request.record,
        })
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        if request.is_fuzzy {
            let groups = request
                .queries
                .iter()
                .map(|group| decode_tokens::<E>(group))
                .collect::<Result<Vec<_>>>()?;
            self.fuzzy_search(request.user_id, &groups, request.expected_keyword_count)
        } else {
            let tokens = match request.queries.first() {
                Some(group) => decode_tokens::<E>(group)?,
                None => Vec::new(),
            };
            self.exact_search(request.user_id, &tokens)
        }
    }
}

impl<E: Pairing, S: TrapdoorStore + RecordStore> UserRegistration for Vault<E, S> {
    fn add_user(&self, user_id: UserId, comp_key: &[u8]) -> Result<bool> {
        let comp_key: E::G2Affine = from_bytes(comp_key)?;
        self.register_user(user_id, &comp_key)
    }

    fn revoke(&self, user_id: UserId) -> Result<bool> {
        self.revoke_access(user_id)
    }
}
