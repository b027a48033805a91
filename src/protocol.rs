//! Messages and service seams between the authority, the clients and the vault.
//!
//! Group elements travel as their uncompressed canonical encoding. The
//! transport carrying these messages is not part of this crate; [`Vault`]
//! implements both service traits directly for in-process use.
//!
//! [`Vault`]: crate::vault::Vault

use ark_ec::pairing::Pairing;
use ark_std::rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::index::IndexStructure;
use crate::UserId;

/// A document as a map from field name to field value. The values are the
/// keywords a document is indexed under.
pub type DocumentFields = BTreeMap<String, String>;

/// First message of index generation: blinded keyword hashes (G1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub user_id: UserId,
    pub hashed_keywords: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRequest {
    /// The encrypted document.
    pub record: Vec<u8>,
    pub indices: IndexStructure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResponse {
    pub pseudonym: String,
    pub record: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub user_id: UserId,
    /// Query tokens (G1), one group per keyword for fuzzy search. Exact
    /// search reads the first group only.
    pub queries: Vec<Vec<Vec<u8>>>,
    pub is_fuzzy: bool,
    pub expected_keyword_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub record: Vec<u8>,
    pub pseudonym: String,
}

/// What the authority hands a client on enrollment: the query key `xu`, the
/// hashing seed `s` and the document key `e`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDetails {
    pub user_id: UserId,
    pub query_key: Vec<u8>,
    pub seed: Vec<u8>,
    pub encryption_key: [u8; 32],
}

impl std::fmt::Debug for SecurityDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityDetails")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// A client-side request for the pseudonym of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PseudonymRequest {
    pub data: DocumentFields,
    /// Names of the fields whose values are searched for.
    pub keywords: Vec<String>,
    pub is_fuzzy: bool,
}

/// The vault as seen by a client.
pub trait VaultApi<E: Pairing> {
    /// Applies the user's trapdoor to each blinded hash, returning GT
    /// elements in request order.
    fn generate_index(&self, request: &IndexRequest) -> Result<Vec<Vec<u8>>>;

    fn add_record<R: RngCore>(&self, rng: &mut R, request: AddRequest) -> Result<AddResponse>;

    fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

/// The vault as seen by the authority.
pub trait UserRegistration {
    /// Stores a complementary trapdoor. Returns false if the user already has
    /// one.
    fn add_user(&self, user_id: UserId, comp_key: &[u8]) -> Result<bool>;

    /// Deletes the user's trapdoor.
    fn revoke(&self, user_id: UserId) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_details_debug_is_redacted() {
        let details = SecurityDetails {
            user_id: 3,
            query_key: vec![9; 32],
            seed: vec![8; 16],
            encryption_key: [7; 32],
        };
        let debug = format!("{:?}", details);
        assert!(debug.contains("user_id: 3"));
        assert!(!debug.contains('9'));
    }

    #[test]
    fn test_search_request_json() {
        let request = SearchRequest {
            user_id: 1,
            queries: vec![vec![vec![1, 2]]],
            is_fuzzy: false,
            expected_keyword_count: 1,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(serde_json::from_str::<SearchRequest>(&json).unwrap(), request);
    }
}
