//! Iterated SHA-256 password records.
//!
//! A record is `hex(H^(k+1)(password))` where `k` is drawn uniformly from
//! `1..=max_iterations` at encode time. `k` is not stored anywhere, so
//! validation walks every count up to the same bound until one matches.
//! This makes `max_iterations` a protocol constant shared by both sides:
//! lowering it after records have been written can lock users out.
//!
//! FIXME: the iteration count is never persisted and there is no salt.
//! Storing `k` (or moving to a salted KDF) would change the record format.

use rand::Rng;
use sha2::{Digest, Sha256};

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Highest bound the server accepts. A failed login walks the whole chain
/// while holding the database lock.
pub const ITERATION_CEILING: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// The hex string to persist.
    pub record: String,
    /// How many times the chain was applied before the final hash.
    /// Informational only.
    pub iterations: u32,
}

pub fn encode_password(password: &str, max_iterations: u32) -> Encoded {
    let iterations = rand::thread_rng().gen_range(1..=max_iterations.max(1));
    let record = encode_with_iterations(password, iterations);

    Encoded { record, iterations }
}

pub fn validate_password(attempt: &str, record: &str, max_iterations: u32) -> bool {
    let mut digest = Sha256::digest(attempt.as_bytes());

    for _ in 0..max_iterations {
        if finish(&digest) == record {
            return true;
        }
        digest = Sha256::digest(digest);
    }

    false
}

fn encode_with_iterations(password: &str, iterations: u32) -> String {
    let mut digest = Sha256::digest(password.as_bytes());
    for _ in 1..iterations {
        digest = Sha256::digest(digest);
    }

    finish(&digest)
}

/// Apply the final hash and hex encode it.
fn finish(digest: &[u8]) -> String {
    hex::encode(Sha256::digest(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::{Alphanumeric, DistString};

    fn random_password() -> String {
        let mut rng = rand::thread_rng();
        let len = rng.gen_range(1..40);
        Alphanumeric.sample_string(&mut rng, len)
    }

    #[test]
    fn record_is_double_hash_for_one_iteration() {
        let expected = hex::encode(Sha256::digest(Sha256::digest(b"pw")));
        assert_eq!(encode_with_iterations("pw", 1), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn every_encoding_validates() {
        for _ in 0..1000 {
            let password = random_password();
            let encoded = encode_password(&password, DEFAULT_MAX_ITERATIONS);

            assert!((1..=DEFAULT_MAX_ITERATIONS).contains(&encoded.iterations));
            assert!(validate_password(
                &password,
                &encoded.record,
                DEFAULT_MAX_ITERATIONS
            ));
        }
    }

    #[test]
    fn every_iteration_count_in_range_validates() {
        for iterations in 1..=DEFAULT_MAX_ITERATIONS {
            let record = encode_with_iterations("hunter2", iterations);
            assert!(validate_password("hunter2", &record, DEFAULT_MAX_ITERATIONS));
        }
    }

    #[test]
    fn wrong_password_is_rejected() {
        for _ in 0..100 {
            let password = random_password();
            let other = format!("{}x", password);
            let encoded = encode_password(&password, DEFAULT_MAX_ITERATIONS);

            assert!(!validate_password(&other, &encoded.record, DEFAULT_MAX_ITERATIONS));
        }
    }

    #[test]
    fn repeated_encodings_differ_but_both_validate() {
        let records: Vec<String> = (0..10)
            .map(|_| encode_password("pw", DEFAULT_MAX_ITERATIONS).record)
            .collect();

        assert!(records.iter().any(|record| record != &records[0]));
        for record in &records {
            assert!(validate_password("pw", record, DEFAULT_MAX_ITERATIONS));
        }
    }

    #[test]
    fn mismatched_bound_can_reject_correct_password() {
        let record = encode_with_iterations("pw", 80);

        assert!(validate_password("pw", &record, 100));
        assert!(validate_password("pw", &record, 80));
        assert!(!validate_password("pw", &record, 79));
        assert!(!validate_password("pw", &record, 10));
    }

    #[test]
    fn zero_bound_is_treated_as_one() {
        let encoded = encode_password("pw", 0);
        assert_eq!(encoded.iterations, 1);
        assert!(validate_password("pw", &encoded.record, 1));
        assert!(!validate_password("pw", &encoded.record, 0));
    }
}
