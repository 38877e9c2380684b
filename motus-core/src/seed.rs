use sha2::{Digest, Sha256};
use uuid::Uuid;

pub type Seed = u64;

/// Seeds stay below 2^53 so they survive a round-trip through any JSON
/// client and fit a signed 64-bit column.
pub const SEED_MASK: Seed = (1 << 53) - 1;

/// Derive a seed from an optional source string.
///
/// The same source always yields the same seed, which is what lets players
/// share a puzzle code. Without a source (or with an empty one) a random
/// UUID is hashed instead, so the result cannot be reproduced.
pub fn generate_seed(source: Option<&str>) -> Seed {
    match source.filter(|s| !s.is_empty()) {
        Some(source) => hash_seed(source),
        None => hash_seed(&Uuid::new_v4().to_string()),
    }
}

fn hash_seed(source: &str) -> Seed {
    let digest = Sha256::digest(source.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) & SEED_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_source_same_seed() {
        assert_eq!(generate_seed(Some("motus")), generate_seed(Some("motus")));
        assert_eq!(generate_seed(Some("42")), generate_seed(Some("42")));
        assert_ne!(generate_seed(Some("motus")), generate_seed(Some("Motus")));
    }

    #[test]
    fn test_seed_is_sha256_prefix() {
        // SHA-256("abc") = ba7816bf8f01cfea...
        let expected = 0xba7816bf8f01cfea_u64 & SEED_MASK;
        assert_eq!(generate_seed(Some("abc")), expected);
    }

    #[test]
    fn test_random_seeds_differ() {
        let first = generate_seed(None);
        let second = generate_seed(None);
        assert_ne!(first, second);
        assert!(first <= SEED_MASK);
        assert!(second <= SEED_MASK);
    }

    #[test]
    fn test_empty_source_is_random() {
        assert_ne!(generate_seed(Some("")), generate_seed(Some("")));
    }
}
