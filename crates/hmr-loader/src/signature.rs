// SPDX-License-Identifier: Apache-2.0
//! Artifact signature verification (spec §4.B).
//!
//! The spec leaves the signature scheme unspecified; this crate defines the
//! seam as a trait so an embedding application can plug in whatever scheme
//! its build pipeline signs artifacts with (Ed25519, a KMS-backed scheme,
//! etc). [`Blake3KeyedVerifier`] is a self-contained default suitable for
//! closed deployments that trust a shared key rather than a PKI.

/// Verifies an artifact's signature against its declared descriptor.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` if `signature` is a valid signature of `artifact_bytes`.
    fn verify(&self, artifact_bytes: &[u8], signature: &[u8; 64]) -> bool;
}

/// Verifies signatures as a BLAKE3 keyed hash under a shared 32-byte key.
///
/// The "signature" is the 32-byte keyed hash left-padded into the 64-byte
/// descriptor field (high 32 bytes zero). This is not a substitute for
/// asymmetric signing in an adversarial build pipeline, only a concrete,
/// dependency-free default.
pub struct Blake3KeyedVerifier {
    key: [u8; 32],
}

impl Blake3KeyedVerifier {
    /// Creates a verifier trusting artifacts keyed with `key`.
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }
}

impl SignatureVerifier for Blake3KeyedVerifier {
    fn verify(&self, artifact_bytes: &[u8], signature: &[u8; 64]) -> bool {
        let digest = blake3::keyed_hash(&self.key, artifact_bytes);
        let mut expected = [0u8; 64];
        expected[..32].copy_from_slice(digest.as_bytes());
        &expected == signature
    }
}

/// Accepts every signature. Intended for tests and local development only.
#[derive(Clone, Copy, Default)]
pub struct NullVerifier;

impl SignatureVerifier for NullVerifier {
    fn verify(&self, _artifact_bytes: &[u8], _signature: &[u8; 64]) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_verifier_accepts_matching_signature() {
        let key = [7u8; 32];
        let verifier = Blake3KeyedVerifier::new(key);
        let bytes = b"artifact-bytes";
        let digest = blake3::keyed_hash(&key, bytes);
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(digest.as_bytes());
        assert!(verifier.verify(bytes, &sig));
    }

    #[test]
    fn keyed_verifier_rejects_tampered_bytes() {
        let key = [7u8; 32];
        let verifier = Blake3KeyedVerifier::new(key);
        let digest = blake3::keyed_hash(&key, b"original");
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(digest.as_bytes());
        assert!(!verifier.verify(b"tampered", &sig));
    }

    #[test]
    fn null_verifier_always_accepts() {
        assert!(NullVerifier.verify(b"anything", &[0u8; 64]));
    }
}
