use rand::Rng;
use std::future::Future;

use crate::error::Result;

pub const CODE_LEN: usize = 6;
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn sample_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Rejection-samples a 6-character alphanumeric code until `exists` reports
/// it free. The loop is unbounded; with a 36^6 code space, practical
/// exhaustion is negligible. There is no transactional isolation between
/// this check and the caller's insert, so two concurrent requests can both
/// win the same code.
pub async fn generate_unique_code<F, Fut>(exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    loop {
        let candidate = sample_code();
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
}
