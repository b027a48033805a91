//! Pairing group primitives used by every role of the scheme.
//!
//! The scheme only relies on bilinearity of the pairing:
//! e(a^r, b) = e(a, b)^r = e(a, b^r). Keywords are hashed onto G1, user
//! trapdoors live in G2 and the shared per-keyword secret lives in GT.

pub mod encoding;
pub mod hashes;

pub use encoding::{from_bytes, to_bytes};
pub use hashes::{h, hs, KeywordHash, KeywordHasher};

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_std::rand::RngCore;
use ark_std::{UniformRand, Zero};

/// Computes the pairing e(a, b).
///
/// # Example
///
/// ```rust
/// use ark_ec::pairing::Pairing;
/// use ark_std::{test_rng, UniformRand};
/// use searchable_vault::group::pair;
///
/// type E = ark_bls12_381::Bls12_381;
/// type G1 = <E as Pairing>::G1Affine;
/// type G2 = <E as Pairing>::G2Affine;
/// type Fr = <E as Pairing>::ScalarField;
///
/// let rng = &mut test_rng();
/// let (a, b, r) = (G1::rand(rng), G2::rand(rng), Fr::rand(rng));
/// assert_eq!(pair::<E>((a * r).into(), b), pair::<E>(a, b) * r);
/// ```
pub fn pair<E: Pairing>(a: E::G1Affine, b: E::G2Affine) -> PairingOutput<E> {
    E::pairing(a, b)
}

/// Samples a scalar that is safe to invert.
pub(crate) fn random_nonzero_scalar<E: Pairing, R: RngCore>(rng: &mut R) -> E::ScalarField {
    loop {
        let s = E::ScalarField::rand(rng);
        if !s.is_zero() {
            return s;
        }
    }
}

#[cfg(test)]
mod tests {
    use ark_ec::pairing::Pairing;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use ark_std::UniformRand;
    use proptest::prelude::*;

    use super::*;

    type E = ark_bls12_381::Bls12_381;
    type G1 = <E as Pairing>::G1Affine;
    type G2 = <E as Pairing>::G2Affine;
    type Fr = <E as Pairing>::ScalarField;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_bilinearity(seed in any::<u64>()) {
            let rng = &mut StdRng::seed_from_u64(seed);
            let (a, b) = (G1::rand(rng), G2::rand(rng));
            let (r, s) = (Fr::rand(rng), Fr::rand(rng));

            let lhs = pair::<E>((a * r).into(), (b * s).into());
            prop_assert_eq!(lhs, pair::<E>(a, b) * (r * s));
            prop_assert_eq!(pair::<E>((a * r).into(), b), pair::<E>(a, (b * r).into()));
        }
    }

    #[test]
    fn test_random_nonzero_scalar() {
        let rng = &mut ark_std::test_rng();
        for _ in 0..16 {
            assert!(!random_nonzero_scalar::<E, _>(rng).is_zero());
        }
    }
}
