//! Result identifier derivation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of identifiers derived from an idempotency key.
pub const DERIVED_ID_LEN: usize = 16;

/// Derive the result identifier for an idempotency key.
///
/// Lowercase hex SHA-256 of the key, truncated to [`DERIVED_ID_LEN`] characters.
pub fn derive_request_id(idempotency_key: &str) -> String {
    let digest = Sha256::digest(idempotency_key.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(DERIVED_ID_LEN);
    id
}

/// Mint a fresh random identifier for a keyless request.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Identifier for a request: derived when a key is present, random otherwise.
pub fn request_id_for(idempotency_key: Option<&str>) -> String {
    match idempotency_key {
        Some(key) => derive_request_id(key),
        None => new_request_id(),
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_derived_id_is_deterministic(key in ".{1,64}") {
            let first = derive_request_id(&key);
            let second = derive_request_id(&key);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), DERIVED_ID_LEN);
            prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        #[test]
        fn prop_distinct_keys_rarely_collide(a in "[a-z0-9]{8,32}", b in "[a-z0-9]{8,32}") {
            prop_assume!(a != b);
            prop_assert_ne!(derive_request_id(&a), derive_request_id(&b));
        }
    }
}
