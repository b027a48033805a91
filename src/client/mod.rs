//! The data-holding client: builds encrypted indices and query tokens.
//!
//! Index generation is a two-message exchange with the vault. The client
//! blinds each keyword hash with a fresh scalar `b`, the vault pairs the
//! blinded hash with the user's trapdoor, and the client raises the result to
//! `xu/b`:
//!
//! ```text
//! e(hs(w)^b, g^(x/xu))^(xu/b) = e(hs(w), g)^x
//! ```
//!
//! A query token is the unblinded `hs(w)^xu`, which the vault pairs with the
//! same trapdoor to reach the same GT element.

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ff::Field;
use ark_std::rand::RngCore;
use tracing::{debug, info, instrument};

use crate::authority::{Enrollment, QueryKey};
use crate::cipher::SymmetricKey;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::group::{from_bytes, h, random_nonzero_scalar, to_bytes, KeywordHash, KeywordHasher};
use crate::index::{IndexEntry, IndexStructure};
use crate::protocol::{
    AddRequest, AddResponse, DocumentFields, IndexRequest, PseudonymRequest, SearchRequest,
    SecurityDetails, VaultApi,
};
use crate::token::random_token;
use crate::wildcard::expand_all;
use crate::UserId;

/// One-time blinding factors of an index request, in request order.
///
/// Handed back to [`Client::finish_index`] by value, so a set of factors
/// can only ever unblind one response.
pub struct Blinding<E: Pairing> {
    factors: Vec<E::ScalarField>,
}

impl<E: Pairing> Blinding<E> {
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// A decrypted search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Found {
    pub pseudonym: String,
    pub document: DocumentFields,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PseudonymOutcome {
    /// Nothing matched; the document was stored under this new pseudonym.
    Created(String),
    /// Documents already stored under the requested keyword values.
    Existing(Vec<Found>),
}

pub struct Client<E: KeywordHash> {
    user_id: UserId,
    xu: E::ScalarField,
    hasher: KeywordHasher<E>,
    encryption_key: SymmetricKey,
    config: Config,
}

impl<E: KeywordHash> Client<E> {
    pub fn new(
        user_id: UserId,
        query_key: &QueryKey<E>,
        encryption_key: SymmetricKey,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            user_id,
            xu: query_key.xu,
            hasher: KeywordHasher::new(&query_key.seed, config.hash_domain.as_bytes())?,
            encryption_key,
            config,
        })
    }

    pub fn from_enrollment(enrollment: &Enrollment<E>, config: Config) -> Result<Self> {
        Self::new(
            enrollment.user_id,
            &enrollment.query_key,
            enrollment.encryption_key.clone(),
            config,
        )
    }

    /// Builds a client from the serialized details the authority delivered.
    /// Details addressed to another user are rejected.
    pub fn from_security_details(
        user_id: UserId,
        details: &SecurityDetails,
        config: Config,
    ) -> Result<Self> {
        if details.user_id != user_id {
            return Err(Error::Protocol(format!(
                "security details addressed to user {}",
                details.user_id
            )));
        }
        let seed: PairingOutput<E> = from_bytes(&details.seed)?;
        let query_key = QueryKey {
            xu: from_bytes(&details.query_key)?,
            seed,
        };
        Self::new(
            user_id,
            &query_key,
            SymmetricKey::from_bytes(details.encryption_key),
            config,
        )
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// `hs(s, word)`.
    pub fn hash_keyword(&self, word: &str) -> Result<E::G1Affine> {
        self.hasher.hash(word)
    }

    /// First message of index generation: `hs(w)^b` for each word, each under
    /// a fresh `b`.
    pub fn blind_index_request<R: RngCore, S: AsRef<str>>(
        &self,
        rng: &mut R,
        words: &[S],
    ) -> Result<(IndexRequest, Blinding<E>)> {
        let mut factors = Vec::with_capacity(words.len());
        let mut hashed_keywords = Vec::with_capacity(words.len());
        for word in words {
            let b = random_nonzero_scalar::<E, _>(rng);
            let blinded: E::G1Affine = (self.hash_keyword(word.as_ref())? * b).into();
            hashed_keywords.push(to_bytes(&blinded)?);
            factors.push(b);
        }
        Ok((
            IndexRequest {
                user_id: self.user_id,
                hashed_keywords,
            },
            Blinding { factors },
        ))
    }

    /// Unblinds the vault's response into per-keyword keys and produces one
    /// index entry per word.
    pub fn finish_index<R: RngCore>(
        &self,
        rng: &mut R,
        blinding: Blinding<E>,
        responses: &[Vec<u8>],
    ) -> Result<Vec<IndexEntry>> {
        if responses.len() != blinding.len() {
            return Err(Error::Protocol(format!(
                "expected {} index responses, got {}",
                blinding.len(),
                responses.len()
            )));
        }

        blinding
            .factors
            .into_iter()
            .zip(responses)
            .map(|(b, response)| {
                let paired: PairingOutput<E> = from_bytes(response)?;
                let b_inv = b
                    .inverse()
                    .ok_or_else(|| Error::Protocol("blinding factor not invertible".into()))?;
                let key = h(&(paired * (self.xu * b_inv)))?;

                let token = random_token(rng, self.config.index_token_length);
                let ciphertext = key.encrypt(rng, token.as_bytes())?;
                Ok(IndexEntry::new(&token, &ciphertext))
            })
            .collect()
    }

    fn index_words<R: RngCore, V: VaultApi<E>, S: AsRef<str>>(
        &self,
        rng: &mut R,
        vault: &V,
        words: &[S],
    ) -> Result<Vec<IndexEntry>> {
        let (request, blinding) = self.blind_index_request(rng, words)?;
        let responses = vault.generate_index(&request)?;
        self.finish_index(rng, blinding, &responses)
    }

    /// Encrypts a document and builds its index over the values of the named
    /// keyword fields, in the given order. A fuzzy index holds the wildcard
    /// variants of each value. Other fields are encrypted but not indexed.
    #[instrument(level = "debug", skip_all, fields(user_id = self.user_id, fuzzy = fuzzy))]
    pub fn write<R: RngCore, V: VaultApi<E>, S: AsRef<str>>(
        &self,
        rng: &mut R,
        vault: &V,
        fields: &DocumentFields,
        keywords: &[S],
        fuzzy: bool,
    ) -> Result<(Vec<u8>, IndexStructure)> {
        let values = keyword_values(fields, keywords)?;

        let index = if fuzzy {
            let groups = expand_all(&values);
            let flat: Vec<&String> = groups.iter().flatten().collect();
            let mut entries = self.index_words(rng, vault, &flat)?.into_iter();
            let positions = groups
                .iter()
                .map(|group| entries.by_ref().take(group.len()).collect())
                .collect();
            IndexStructure::Fuzzy(positions)
        } else {
            IndexStructure::Exact(self.index_words(rng, vault, &values)?)
        };

        let document = self
            .encryption_key
            .encrypt(rng, &serde_json::to_vec(fields)?)?;
        debug!(keywords = values.len(), "document indexed");
        Ok((document, index))
    }

    fn query_token(&self, word: &str) -> Result<Vec<u8>> {
        let token: E::G1Affine = (self.hash_keyword(word)? * self.xu).into();
        to_bytes(&token)
    }

    /// Query tokens `hs(w)^xu`: a single group for exact search, one group of
    /// wildcard variants per keyword for fuzzy search.
    pub fn build_query<S: AsRef<str>>(&self, keywords: &[S], fuzzy: bool) -> Result<SearchRequest> {
        let queries = if fuzzy {
            expand_all(keywords)
                .iter()
                .map(|variants| {
                    variants
                        .iter()
                        .map(|v| self.query_token(v))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![keywords
                .iter()
                .map(|k| self.query_token(k.as_ref()))
                .collect::<Result<Vec<_>>>()?]
        };

        Ok(SearchRequest {
            user_id: self.user_id,
            queries,
            is_fuzzy: fuzzy,
            expected_keyword_count: keywords.len(),
        })
    }

    pub fn decrypt_document(&self, ciphertext: &[u8]) -> Result<DocumentFields> {
        let plaintext = self.encryption_key.decrypt(ciphertext)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Writes a document indexed under its keyword fields and stores it at
    /// the vault.
    #[instrument(level = "info", skip_all, fields(user_id = self.user_id, fuzzy = fuzzy))]
    pub fn add_record<R: RngCore, V: VaultApi<E>, S: AsRef<str>>(
        &self,
        rng: &mut R,
        vault: &V,
        fields: &DocumentFields,
        keywords: &[S],
        fuzzy: bool,
    ) -> Result<AddResponse> {
        let (record, indices) = self.write(rng, vault, fields, keywords, fuzzy)?;
        let response = vault.add_record(rng, AddRequest { record, indices })?;
        info!(pseudonym = %response.pseudonym, "record added");
        Ok(response)
    }

    /// Searches the vault and decrypts every hit.
    #[instrument(
        level = "info",
        skip_all,
        fields(user_id = self.user_id, keywords = keywords.len(), fuzzy = fuzzy)
    )]
    pub fn search_records<V: VaultApi<E>, S: AsRef<str>>(
        &self,
        vault: &V,
        keywords: &[S],
        fuzzy: bool,
    ) -> Result<Vec<Found>> {
        let hits = vault.search(&self.build_query(keywords, fuzzy)?)?;
        debug!(hits = hits.len(), "search answered");
        hits.into_iter()
            .map(|hit| {
                Ok(Found {
                    document: self.decrypt_document(&hit.record)?,
                    pseudonym: hit.pseudonym,
                })
            })
            .collect()
    }

    /// Looks a document up by the values of its keyword fields and stores it
    /// if nothing matches.
    pub fn request_pseudonym<R: RngCore, V: VaultApi<E>>(
        &self,
        rng: &mut R,
        vault: &V,
        request: &PseudonymRequest,
    ) -> Result<PseudonymOutcome> {
        let values = keyword_values(&request.data, &request.keywords)?;

        let found = self.search_records(vault, &values, request.is_fuzzy)?;
        if !found.is_empty() {
            return Ok(PseudonymOutcome::Existing(found));
        }
        let response = self.add_record(
            rng,
            vault,
            &request.data,
            &request.keywords,
            request.is_fuzzy,
        )?;
        Ok(PseudonymOutcome::Created(response.pseudonym))
    }
}

impl<E: KeywordHash> std::fmt::Debug for Client<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Values of the named fields, in the order of `names`.
fn keyword_values<'a, S: AsRef<str>>(
    fields: &'a DocumentFields,
    names: &[S],
) -> Result<Vec<&'a str>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            fields
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| Error::Protocol(format!("keyword field {name} missing")))
        })
        .collect()
}
