//! Resource identifier grammar.
//!
//! Identifiers are lowercase, hyphenated RFC 4122 UUIDs: 36 characters,
//! version nibble `1`-`5`, variant bits `10xx`. Braced, URN, simple and
//! uppercase forms are rejected even though they denote the same UUID.

use uuid::{Uuid, Variant};

/// Returns `true` if `identifier` is a valid resource identifier.
///
/// # Example
///
/// ```
/// use noma_core::identifier::is_valid;
///
/// assert!(is_valid("123e4567-e89b-42d3-a456-426614174000"));
/// assert!(!is_valid("not-a-uuid"));
/// assert!(!is_valid("123E4567-E89B-42D3-A456-426614174000"));
/// ```
#[must_use]
pub fn is_valid(identifier: &str) -> bool {
    parse(identifier).is_some()
}

/// Parses `identifier`, returning the UUID if it is a valid identifier.
#[must_use]
pub fn parse(identifier: &str) -> Option<Uuid> {
    if identifier.len() != 36 {
        return None;
    }

    let uuid = Uuid::try_parse(identifier).ok()?;

    // Canonical text form is lowercase hyphenated
    let mut buf = Uuid::encode_buffer();
    if uuid.hyphenated().encode_lower(&mut buf) != identifier {
        return None;
    }

    if uuid.get_variant() != Variant::RFC4122 {
        return None;
    }

    matches!(uuid.get_version_num(), 1..=5).then_some(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_v4() {
        assert!(is_valid("123e4567-e89b-42d3-a456-426614174000"));
        assert!(is_valid(&uuid::Builder::from_random_bytes([7; 16]).into_uuid().to_string()));
    }

    #[test]
    fn test_accepts_versions_one_to_five() {
        for version in 1..=5 {
            let id = format!("123e4567-e89b-{version}2d3-a456-426614174000");
            assert!(is_valid(&id), "{id}");
        }
    }

    #[test]
    fn test_rejects_other_versions() {
        assert!(!is_valid("123e4567-e89b-02d3-a456-426614174000"));
        assert!(!is_valid("123e4567-e89b-62d3-a456-426614174000"));
        assert!(!is_valid(&Uuid::now_v7().to_string()));
    }

    #[test]
    fn test_rejects_wrong_variant() {
        // variant nibble 0xxx / 110x / 111x
        assert!(!is_valid("123e4567-e89b-42d3-7456-426614174000"));
        assert!(!is_valid("123e4567-e89b-42d3-c456-426614174000"));
        assert!(!is_valid("123e4567-e89b-42d3-e456-426614174000"));
    }

    #[test]
    fn test_rejects_non_canonical_forms() {
        assert!(!is_valid("123E4567-E89B-42D3-A456-426614174000"));
        assert!(!is_valid("123e4567e89b42d3a456426614174000"));
        assert!(!is_valid("{123e4567-e89b-42d3-a456-426614174000}"));
        assert!(!is_valid("urn:uuid:123e4567-e89b-42d3-a456-426614174000"));
        assert!(!is_valid(" 123e4567-e89b-42d3-a456-42661417400"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(!is_valid(""));
        assert!(!is_valid("not-a-uuid"));
        assert!(!is_valid("123e4567-e89b-42d3-a456-42661417400g"));
    }

    proptest! {
        #[test]
        fn prop_random_v4_is_valid(bytes in any::<[u8; 16]>()) {
            let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
            prop_assert!(is_valid(&uuid.to_string()));
        }

        #[test]
        fn prop_short_strings_are_invalid(raw in "[0-9a-f-]{0,35}") {
            prop_assert!(!is_valid(&raw));
        }
    }
}
