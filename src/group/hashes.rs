//! The two hash functions of the scheme.
//!
//! - `hs: S x W -> G1`, a keyed hash from keywords onto G1, keyed by the
//!   system seed `s`.
//! - `h: GT -> K`, which turns a pairing result into a symmetric key.

use ark_bls12_381::{g1, Bls12_381, G1Projective};
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurveBasedHasher;
use ark_ec::hashing::HashToCurve;
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ff::field_hashers::DefaultFieldHasher;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::cipher::{SymmetricKey, KEY_LEN};
use crate::error::{Error, Result};

use super::encoding::to_bytes;

/// A pairing engine whose G1 supports hashing arbitrary bytes onto the curve.
pub trait KeywordHash: Pairing {
    fn hash_to_g1(domain: &[u8], msg: &[u8]) -> Result<Self::G1Affine>;
}

type Bls12G1Hasher =
    MapToCurveBasedHasher<G1Projective, DefaultFieldHasher<Sha256, 128>, WBMap<g1::Config>>;

impl KeywordHash for Bls12_381 {
    fn hash_to_g1(domain: &[u8], msg: &[u8]) -> Result<Self::G1Affine> {
        let hasher = Bls12G1Hasher::new(domain).map_err(|_| Error::HashToCurve)?;
        hasher.hash(msg).map_err(|_| Error::HashToCurve)
    }
}

/// `h`: maps an element of GT to a symmetric key.
///
/// Equal elements give equal keys no matter how they were computed, which is
/// what lets the client and the vault arrive at the same key.
pub fn h<E: Pairing>(element: &PairingOutput<E>) -> Result<SymmetricKey> {
    let bytes = to_bytes(element)?;
    let digest = Sha256::digest(&bytes);
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest);
    Ok(SymmetricKey::from_bytes(key))
}

/// `hs`: the keyed keyword hash, for one-off use.
///
/// Prefer [`KeywordHasher`] when hashing many keywords under the same seed.
pub fn hs<E: KeywordHash>(
    seed: &PairingOutput<E>,
    domain: &[u8],
    word: &str,
) -> Result<E::G1Affine> {
    KeywordHasher::new(seed, domain)?.hash(word)
}

/// `hs` with the seed-derived HMAC key computed once.
#[derive(Clone)]
pub struct KeywordHasher<E: KeywordHash> {
    seed_key: SymmetricKey,
    domain: Vec<u8>,
    _engine: std::marker::PhantomData<E>,
}

impl<E: KeywordHash> KeywordHasher<E> {
    pub fn new(seed: &PairingOutput<E>, domain: &[u8]) -> Result<Self> {
        Ok(Self {
            seed_key: h(seed)?,
            domain: domain.to_vec(),
            _engine: std::marker::PhantomData,
        })
    }

    /// Hashes a keyword onto G1: HMAC-SHA256 under the seed key, then
    /// hash-to-curve.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ark_ec::pairing::Pairing;
    /// use ark_std::{test_rng, UniformRand};
    /// use searchable_vault::group::KeywordHasher;
    ///
    /// type E = ark_bls12_381::Bls12_381;
    ///
    /// let rng = &mut test_rng();
    /// let seed = E::pairing(
    ///     <E as Pairing>::G1::rand(rng),
    ///     <E as Pairing>::G2::rand(rng),
    /// );
    /// let hasher = KeywordHasher::<E>::new(&seed, b"domain").unwrap();
    /// assert_eq!(hasher.hash("Jeremy").unwrap(), hasher.hash("Jeremy").unwrap());
    /// assert_ne!(hasher.hash("Jeremy").unwrap(), hasher.hash("Herbst").unwrap());
    /// ```
    pub fn hash(&self, word: &str) -> Result<E::G1Affine> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.seed_key.as_bytes())
            .map_err(|_| Error::HashToCurve)?;
        mac.update(word.as_bytes());
        let keyed = mac.finalize().into_bytes();
        E::hash_to_g1(&self.domain, &keyed)
    }
}

#[cfg(test)]
mod tests {
    use ark_ec::pairing::Pairing;
    use ark_std::{test_rng, UniformRand};

    use super::*;
    use crate::config::DEFAULT_HASH_DOMAIN;

    type E = ark_bls12_381::Bls12_381;
    type G1 = <E as Pairing>::G1;
    type G2 = <E as Pairing>::G2;
    type Fr = <E as Pairing>::ScalarField;

    #[test]
    fn test_hs_deterministic_and_keyed() {
        let rng = &mut test_rng();
        let seed = E::pairing(G1::rand(rng), G2::rand(rng));
        let other_seed = E::pairing(G1::rand(rng), G2::rand(rng));
        let domain = DEFAULT_HASH_DOMAIN.as_bytes();

        let a = hs::<E>(&seed, domain, "Herbst").unwrap();
        assert_eq!(a, hs::<E>(&seed, domain, "Herbst").unwrap());
        assert_ne!(a, hs::<E>(&seed, domain, "herbst").unwrap());
        assert_ne!(a, hs::<E>(&other_seed, domain, "Herbst").unwrap());
        assert_ne!(a, hs::<E>(&seed, b"another-domain", "Herbst").unwrap());
    }

    #[test]
    fn test_h_equal_for_different_computation_paths() {
        let rng = &mut test_rng();
        let (a, b) = (G1::rand(rng), G2::rand(rng));
        let (r, s) = (Fr::rand(rng), Fr::rand(rng));

        // e(a^r, b^s) and e(a^(rs), b) reach the same element in GT.
        let t1 = E::pairing(a * r, b * s);
        let t2 = E::pairing(a * (r * s), b);
        assert_eq!(h(&t1).unwrap(), h(&t2).unwrap());
        assert_ne!(h(&t1).unwrap(), h(&E::pairing(a, b)).unwrap());
    }
}
