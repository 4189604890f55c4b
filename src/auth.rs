//! Admin credential gate.

use constant_time_eq::constant_time_eq;

use crate::hash;

/// Guards the administrative routes.
///
/// Holds the stored digest of the admin secret, never the plaintext. A
/// supplied secret is digested and compared against it; there is no
/// session state, every admin request re-authorizes.
#[derive(Debug, Clone)]
pub struct AdminGate {
    digest: String,
}

impl AdminGate {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
        }
    }

    /// Returns true if `supplied` digests to the stored value. The
    /// comparison does not short-circuit on the first mismatching byte.
    pub fn authorize(&self, supplied: &str) -> bool {
        constant_time_eq(hash::digest(supplied).as_bytes(), self.digest.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_accepts_correct_secret() {
        let gate = AdminGate::new(hash::digest("swordfish"));
        assert!(gate.authorize("swordfish"));
    }

    #[test]
    fn test_authorize_rejects_wrong_and_empty() {
        let gate = AdminGate::new(hash::digest("swordfish"));
        assert!(!gate.authorize("Swordfish"));
        assert!(!gate.authorize(""));
    }

    #[test]
    fn test_authorize_rejects_raw_digest_as_secret() {
        // Supplying the stored digest itself must not pass; it gets
        // digested again like any other candidate.
        let stored = hash::digest("swordfish");
        let gate = AdminGate::new(stored.clone());
        assert!(!gate.authorize(&stored));
    }

    #[test]
    fn test_authorize_rejects_malformed_stored_digest() {
        // A stored value of the wrong length can never match, even
        // against a secret whose digest shares its prefix.
        let gate = AdminGate::new(&hash::digest("swordfish")[..16]);
        assert!(!gate.authorize("swordfish"));
    }
}
