//! The trust authority: system setup, user enrollment and revocation.
//!
//! Setup samples the master scalar `x`, the document key `e` and the hashing
//! seed `s` once. Enrolling user `u` samples a query key `xu` and a fresh
//! generator `g` of G2, hands `(xu, s, e)` to the client and
//! `comK = g^(x/xu)` to the vault.

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ff::Field;
use ark_std::rand::RngCore;
use ark_std::UniformRand;
use sha2::{Digest, Sha256};
use std::ops::Mul;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::cipher::{SymmetricKey, KEY_LEN};
use crate::error::{Error, Result};
use crate::group::{random_nonzero_scalar, to_bytes};
use crate::protocol::{SecurityDetails, UserRegistration};
use crate::store::{MemoryUserRegistry, UserRegistry};
use crate::UserId;

/// System-wide secrets, fixed for the lifetime of the authority.
pub struct SystemParams<E: Pairing> {
    /// Master scalar `x`.
    pub x: E::ScalarField,
    /// Document key `e`.
    pub encryption_key: SymmetricKey,
    /// Hashing seed `s`, shared by every enrolled client.
    pub seed: PairingOutput<E>,
}

impl<E: Pairing> SystemParams<E> {
    pub fn rand<R: RngCore>(rng: &mut R) -> Result<Self> {
        let x = random_nonzero_scalar::<E, _>(rng);

        let key_source = to_bytes(&E::G2Affine::rand(rng))?;
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&Sha256::digest(&key_source));

        let seed = E::pairing(E::G1::rand(rng), E::G2::rand(rng));

        Ok(Self {
            x,
            encryption_key: SymmetricKey::from_bytes(key),
            seed,
        })
    }
}

/// The client's private search capability.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryKey<E: Pairing> {
    pub xu: E::ScalarField,
    pub seed: PairingOutput<E>,
}

/// Key material issued to a client on enrollment.
#[derive(Clone)]
pub struct Enrollment<E: Pairing> {
    pub user_id: UserId,
    pub query_key: QueryKey<E>,
    pub encryption_key: SymmetricKey,
}

impl<E: Pairing> std::fmt::Debug for Enrollment<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrollment")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl<E: Pairing> Enrollment<E> {
    /// Serializes the enrollment for delivery to the client.
    pub fn security_details(&self) -> Result<SecurityDetails> {
        Ok(SecurityDetails {
            user_id: self.user_id,
            query_key: to_bytes(&self.query_key.xu)?,
            seed: to_bytes(&self.query_key.seed)?,
            encryption_key: *self.encryption_key.as_bytes(),
        })
    }
}

enum State<E: Pairing> {
    Uninitialized,
    Ready(SystemParams<E>),
}

pub struct Authority<E: Pairing, V, U = MemoryUserRegistry> {
    state: State<E>,
    vault: Arc<V>,
    users: U,
}

impl<E: Pairing, V: UserRegistration> Authority<E, V, MemoryUserRegistry> {
    pub fn with_vault(vault: Arc<V>) -> Self {
        Self::new(vault, MemoryUserRegistry::new())
    }
}

impl<E: Pairing, V: UserRegistration, U: UserRegistry> Authority<E, V, U> {
    pub fn new(vault: Arc<V>, users: U) -> Self {
        Self {
            state: State::Uninitialized,
            vault,
            users,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    fn params(&self) -> Result<&SystemParams<E>> {
        match &self.state {
            State::Ready(params) => Ok(params),
            State::Uninitialized => Err(Error::NotSetUp),
        }
    }

    /// Generates the system parameters. Runs once: live parameters are never
    /// replaced.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use ark_std::test_rng;
    /// use searchable_vault::authority::Authority;
    /// use searchable_vault::vault::Vault;
    /// use searchable_vault::ErrorKind;
    ///
    /// type E = ark_bls12_381::Bls12_381;
    ///
    /// let rng = &mut test_rng();
    /// let vault = Arc::new(Vault::<E>::in_memory());
    /// let mut authority = Authority::<E, _>::with_vault(vault);
    /// authority.setup(rng).unwrap();
    /// assert_eq!(authority.setup(rng).unwrap_err().kind(), ErrorKind::AlreadySetUp);
    /// ```
    #[instrument(level = "info", skip_all)]
    pub fn setup<R: RngCore>(&mut self, rng: &mut R) -> Result<()> {
        if self.is_ready() {
            return Err(Error::AlreadySetUp);
        }
        self.state = State::Ready(SystemParams::rand(rng)?);
        info!("system parameters generated");
        Ok(())
    }

    /// Enrolls a user, registering its trapdoor with the vault.
    ///
    /// Nothing is recorded locally unless the vault stored the trapdoor, and
    /// the trapdoor is deleted again if the local registry then fails.
    #[instrument(level = "info", skip(self, rng))]
    pub fn enroll<R: RngCore>(&self, rng: &mut R, user_id: UserId) -> Result<Enrollment<E>> {
        let params = self.params()?;

        let xu = random_nonzero_scalar::<E, _>(rng);
        let xu_inv = xu
            .inverse()
            .ok_or_else(|| Error::Protocol("query key not invertible".into()))?;
        let g = E::G2::rand(rng);
        let com_k: E::G2Affine = g.mul(params.x * xu_inv).into();

        match self.vault.add_user(user_id, &to_bytes(&com_k)?) {
            Ok(true) => {}
            Ok(false) => return Err(Error::UserAlreadyEnrolled(user_id)),
            Err(e) => {
                return Err(Error::EnrollmentFailed {
                    user_id,
                    reason: e.to_string(),
                })
            }
        }

        if let Err(e) = self.users.authorize(user_id) {
            // Undo the vault registration.
            if let Err(error) = self.vault.revoke(user_id) {
                warn!(%error, "vault kept trapdoor of unregistered user");
            }
            return Err(e);
        }
        info!("user enrolled");

        Ok(Enrollment {
            user_id,
            query_key: QueryKey {
                xu,
                seed: params.seed,
            },
            encryption_key: params.encryption_key.clone(),
        })
    }

    /// Revokes a user's search capability.
    ///
    /// The local registry is updated first and keeps the revocation even if
    /// the vault then fails to delete the trapdoor.
    #[instrument(level = "info", skip(self))]
    pub fn revoke(&self, user_id: UserId) -> Result<()> {
        self.params()?;
        self.users.revoke(user_id)?;

        if let Err(error) = self.vault.revoke(user_id) {
            warn!(%error, "vault did not delete trapdoor");
            return Err(error);
        }
        info!("user revoked");
        Ok(())
    }
}
