//! Canonical byte encoding of group elements and scalars.
//!
//! The uncompressed arkworks encoding is the wire form for every element that
//! crosses a role boundary. Decoding validates the element and rejects
//! trailing bytes.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::error::{Error, Result};

pub fn to_bytes<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(value.uncompressed_size());
    value.serialize_uncompressed(&mut bytes)?;
    Ok(bytes)
}

pub fn from_bytes<T: CanonicalDeserialize>(bytes: &[u8]) -> Result<T> {
    let mut reader = bytes;
    let value = T::deserialize_uncompressed(&mut reader)?;
    if !reader.is_empty() {
        return Err(Error::Serialization(format!(
            "{} trailing bytes after element",
            reader.len()
        )));
    }
    Ok(value)
}
