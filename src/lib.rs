#![doc = include_str!("../README.md")]

pub mod authority;
pub mod cipher;
pub mod client;
pub mod config;
pub mod error;
pub mod group;
pub mod index;
pub mod protocol;
pub mod store;
pub mod token;
pub mod vault;
pub mod wildcard;

pub use authority::{Authority, Enrollment, QueryKey, SystemParams};
pub use client::{Client, Found, PseudonymOutcome};
pub use config::Config;
pub use error::{Error, ErrorKind, ErrorPayload, Result};
pub use vault::Vault;

/// Identifier of an enrolled user.
pub type UserId = u64;

/// Identifier the vault assigns to a stored record.
pub type RecordId = u64;
