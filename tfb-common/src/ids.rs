//! Derived user ids for people known only by name.
//!
//! Workday exports carry display names but no orgchart user ids. People
//! who never appear in an orgchart import still need a stable key for
//! manager feedback, so a deterministic id is derived from the name.

use sha1::{Digest, Sha1};

/// Prefix marking an id as name-derived rather than orgchart-assigned.
pub const DERIVED_ID_PREFIX: &str = "wd_";

/// Derive a stable user id from a display name.
///
/// The name is lowercased and trimmed before hashing, so
/// `"Robin Rollback"` and `" robin rollback "` map to the same id.
/// Returns `wd_` followed by the first 8 hex characters of the SHA-1
/// digest, e.g. `wd_a1b2c3d4`.
pub fn derived_user_id(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    let digest = Sha1::digest(normalized.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", DERIVED_ID_PREFIX, &hex[..8])
}

/// True when the id was produced by [`derived_user_id`].
pub fn is_derived_id(user_id: &str) -> bool {
    user_id.starts_with(DERIVED_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(derived_user_id("Robin Rollback"), derived_user_id("Robin Rollback"));
    }

    #[test]
    fn derived_ids_normalize_case_and_whitespace() {
        assert_eq!(
            derived_user_id("Robin Rollback"),
            derived_user_id("  robin rollback ")
        );
    }

    #[test]
    fn derived_ids_have_expected_shape() {
        let id = derived_user_id("Robin Rollback");
        assert!(id.starts_with("wd_"));
        assert_eq!(id.len(), 3 + 8);
        assert!(is_derived_id(&id));
        assert!(!is_derived_id("emp001"));
    }

    #[test]
    fn different_names_get_different_ids() {
        assert_ne!(derived_user_id("Robin Rollback"), derived_user_id("Larry Latency"));
    }
}
