//! Fallible draws from an injected cryptographic RNG.
//!
//! Every operation that needs randomness takes a `rand::TryCryptoRng` so tests
//! can inject a seeded generator. A failing source is surfaced as
//! `EntropySourceUnavailable`; there is no fallback to a weaker generator.

use rand::TryCryptoRng;

use crate::error::CryptoError;

/// Fill `dst` from `rng`.
pub fn fill<R: TryCryptoRng>(rng: &mut R, dst: &mut [u8]) -> Result<(), CryptoError> {
    rng.try_fill_bytes(dst).map_err(|e| {
        tracing::error!(error = %e, "secure random source failed");
        CryptoError::EntropySourceUnavailable(e.to_string())
    })
}

/// Draw `N` random bytes from `rng`.
pub fn random_array<const N: usize, R: TryCryptoRng>(rng: &mut R) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    fill(rng, &mut out)?;
    Ok(out)
}
