//! Error types shared by the authority, the client and the vault.
//!
//! Error messages only ever carry identifiers and positions. Scalars, trapdoors
//! and symmetric keys never end up in an error value.

use serde::{Deserialize, Serialize};

use crate::{RecordId, UserId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No live trapdoor exists for the user.
    #[error("user {0} is not authorized")]
    NotAuthorized(UserId),

    #[error("user {0} is already enrolled")]
    UserAlreadyEnrolled(UserId),

    /// The vault could not store the trapdoor. No local state was changed.
    #[error("enrollment of user {user_id} failed: {reason}")]
    EnrollmentFailed { user_id: UserId, reason: String },

    #[error("user {0} has already been revoked or could not be found")]
    AlreadyRevokedOrUnknown(UserId),

    #[error("malformed index entry {position} in record {record_id}")]
    MalformedIndexEntry { record_id: RecordId, position: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("authority has not been set up")]
    NotSetUp,

    #[error("authority has already been set up")]
    AlreadySetUp,

    #[error("symmetric cipher failure: {0}")]
    Cipher(&'static str),

    #[error("keyword could not be hashed to the curve")]
    HashToCurve,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Coarse classification of an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotAuthorized,
    UserAlreadyEnrolled,
    EnrollmentFailed,
    AlreadyRevokedOrUnknown,
    MalformedIndexEntry,
    Serialization,
    NotSetUp,
    AlreadySetUp,
    Cipher,
    HashToCurve,
    Protocol,
    Config,
    Transport,
}

/// The structured error handed back across the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub detail: String,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Error::UserAlreadyEnrolled(_) => ErrorKind::UserAlreadyEnrolled,
            Error::EnrollmentFailed { .. } => ErrorKind::EnrollmentFailed,
            Error::AlreadyRevokedOrUnknown(_) => ErrorKind::AlreadyRevokedOrUnknown,
            Error::MalformedIndexEntry { .. } => ErrorKind::MalformedIndexEntry,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::NotSetUp => ErrorKind::NotSetUp,
            Error::AlreadySetUp => ErrorKind::AlreadySetUp,
            Error::Cipher(_) => ErrorKind::Cipher,
            Error::HashToCurve => ErrorKind::HashToCurve,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Config(_) => ErrorKind::Config,
            Error::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

impl From<ark_serialize::SerializationError> for Error {
    fn from(e: ark_serialize::SerializationError) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
