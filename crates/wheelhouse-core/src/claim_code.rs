//! Claim code generation for won prizes.

use rand::Rng;

/// Code alphabet with the visually ambiguous characters (I, O, 0, 1) removed.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GROUPS: usize = 3;
const GROUP_LEN: usize = 3;

/// Generate a human-readable claim code in the form `XXX-XXX-XXX`.
///
/// Uniqueness is not guaranteed here; the winner table carries a unique
/// constraint on the code and the writer retries with a fresh code on
/// conflict.
pub fn generate_claim_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(GROUPS * GROUP_LEN + GROUPS - 1);
    for group in 0..GROUPS {
        if group > 0 {
            code.push('-');
        }
        for _ in 0..GROUP_LEN {
            let index = rng.random_range(0..ALPHABET.len());
            code.push(ALPHABET[index] as char);
        }
    }
    code
}
