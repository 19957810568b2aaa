//! Randomness, clock and HMAC primitives used by the signed-request flow, via `ring`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn unix_timestamp(&self) -> i64;
}

/// Source of single-use request nonces.
pub trait NonceSource: Send + Sync {
    fn nonce(&self) -> Result<String, ring::error::Unspecified>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// 32 bytes from the system CSPRNG, base64url encoded without padding.
#[derive(Debug, Clone)]
pub struct SystemNonce {
    rng: SystemRandom,
}

impl Default for SystemNonce {
    fn default() -> Self {
        Self { rng: SystemRandom::new() }
    }
}

impl NonceSource for SystemNonce {
    fn nonce(&self) -> Result<String, ring::error::Unspecified> {
        let mut buf = [0u8; 32];
        self.rng.fill(&mut buf)?;
        Ok(URL_SAFE_NO_PAD.encode(buf))
    }
}

/// Fixed clock for deterministic signing in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }
}

/// Fixed nonce for deterministic signing in tests.
#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

impl NonceSource for FixedNonce {
    fn nonce(&self) -> Result<String, ring::error::Unspecified> {
        Ok(self.0.clone())
    }
}

/// HMAC-SHA1 of `data`, base64 encoded. OAuth 1.0a mandates SHA-1 here.
pub fn hmac_sha1_base64(key: &[u8], data: &[u8]) -> String {
    let s_key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    let tag = hmac::sign(&s_key, data);
    STANDARD.encode(tag.as_ref())
}
