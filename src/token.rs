//! Random printable tokens: index plaintexts and record pseudonyms.

use ark_std::rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws `len` characters uniformly from `A-Z0-9`.
pub fn random_token<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
